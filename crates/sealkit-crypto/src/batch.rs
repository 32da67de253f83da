//! Batch sealing and opening of independent items
//!
//! Each input produces its own `Result` in the same position of the output
//! vector. A failing item never aborts the rest of the batch.

use rayon::prelude::*;

use crate::error::CryptoResult;
use crate::item::{encrypt_item, EncryptedItem};
use crate::keys::SymmetricKey;
use crate::stream::{seal, StreamEnvelope};

/// How a batch is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Execution {
    /// One item after another on the calling thread
    #[default]
    Sequential,
    /// Spread across the rayon global pool
    Parallel,
}

fn run<I, O, F>(inputs: &[I], execution: Execution, f: F) -> Vec<O>
where
    I: Sync,
    O: Send,
    F: Fn(&I) -> O + Sync + Send,
{
    match execution {
        Execution::Sequential => inputs.iter().map(f).collect(),
        Execution::Parallel => inputs.par_iter().map(f).collect(),
    }
}

/// Seal each plaintext as its own single-chunk stream envelope.
pub fn seal_many<T>(
    plaintexts: &[T],
    key: &SymmetricKey,
    execution: Execution,
) -> Vec<CryptoResult<StreamEnvelope>>
where
    T: AsRef<[u8]> + Sync,
{
    run(plaintexts, execution, |p| seal(p.as_ref(), key))
}

/// Open each stream envelope, isolating failures per item.
pub fn open_many(
    envelopes: &[StreamEnvelope],
    key: &SymmetricKey,
    execution: Execution,
) -> Vec<CryptoResult<Vec<u8>>> {
    let results = run(envelopes, execution, |e| e.open(key));
    BatchReport::from_results(&results).log("open_many");
    results
}

/// Two-tier encrypt each item under its own entity key.
pub fn encrypt_items<T>(
    contents: &[T],
    master: &SymmetricKey,
    execution: Execution,
) -> Vec<CryptoResult<EncryptedItem>>
where
    T: AsRef<[u8]> + Sync,
{
    run(contents, execution, |c| encrypt_item(c.as_ref(), master))
}

/// Decrypt each item, isolating failures per item.
pub fn decrypt_items(
    items: &[EncryptedItem],
    master: &SymmetricKey,
    execution: Execution,
) -> Vec<CryptoResult<Vec<u8>>> {
    let results = run(items, execution, |item| item.decrypt(master));
    BatchReport::from_results(&results).log("decrypt_items");
    results
}

/// Success/failure counts of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn from_results<T>(results: &[CryptoResult<T>]) -> Self {
        let failed = results.iter().filter(|r| r.is_err()).count();
        Self {
            succeeded: results.len() - failed,
            failed,
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    fn log(&self, operation: &str) {
        if self.failed > 0 {
            tracing::warn!(
                operation,
                succeeded = self.succeeded,
                failed = self.failed,
                "batch completed with failures"
            );
        } else {
            tracing::debug!(operation, succeeded = self.succeeded, "batch completed");
        }
    }
}
