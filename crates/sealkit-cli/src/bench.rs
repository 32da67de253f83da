//! Benchmark scenarios: time key derivation, encryption and decryption of
//! generated text and verify that every item comes back intact.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use secrecy::SecretString;
use std::time::{Duration, Instant};

use sealkit_core::config::BenchConfig;
use sealkit_core::types::{Phase, PhaseTiming, Scenario, ScenarioReport};
use sealkit_crypto::{
    decrypt_items, derive_symmetric_key_from_secret, encrypt_items, open_many, seal, seal_many,
    ArmoredItem, BatchReport, CryptoResult, EncryptedItem, Execution, StreamEnvelope,
};

use crate::corpus::Corpus;
use crate::memory::ProcessMemory;

/// Everything a scenario needs, passed in explicitly.
pub struct BenchRun<'a> {
    pub passphrase: &'a SecretString,
    pub config: &'a BenchConfig,
    pub show_progress: bool,
}

impl BenchRun<'_> {
    fn execution(&self) -> Execution {
        if self.config.parallel {
            Execution::Parallel
        } else {
            Execution::Sequential
        }
    }

    pub fn run(&self, scenario: Scenario) -> Result<ScenarioReport> {
        tracing::info!(
            %scenario,
            item_size = self.config.item_size,
            parallel = self.config.parallel,
            "starting scenario"
        );
        let mut report = match scenario {
            Scenario::Block => self.run_block(),
            Scenario::Chunks => self.run_chunks(),
            Scenario::Items => self.run_items(),
        }?;
        // every corpus and envelope buffer is dropped by now
        report.memory_settled = ProcessMemory::new().resident();

        for timing in &report.phases {
            tracing::info!(
                %scenario,
                phase = ?timing.phase,
                elapsed_ms = timing.elapsed.as_secs_f64() * 1000.0,
                bytes = timing.bytes,
                memory_before = timing.memory_before,
                memory_after = timing.memory_after,
                "phase complete"
            );
        }
        if report.failures > 0 {
            tracing::warn!(%scenario, failures = report.failures, "items failed verification");
        }
        Ok(report)
    }

    /// One large text sealed and opened as a single stream envelope.
    fn run_block(&self) -> Result<ScenarioReport> {
        let corpus = self.build_corpus(self.config.block_repeats);
        let text = corpus.joined();
        let bytes = text.len() as u64;

        let (key, init) = self.timed(Phase::Init, 0, || {
            derive_symmetric_key_from_secret(self.passphrase)
        });

        let (envelope, encrypt) = self.timed(Phase::Encrypt, bytes, || seal(text.as_bytes(), &key));
        let envelope = envelope.context("sealing block text")?;
        let envelope_bytes = envelope.wire_len() as u64;

        let (opened, decrypt) = self.timed(Phase::Decrypt, bytes, || envelope.open(&key));
        let failures = match opened {
            Ok(plaintext) if plaintext == text.as_bytes() => 0,
            Ok(_) => 1,
            Err(e) => {
                tracing::error!("block envelope failed to open: {e}");
                1
            }
        };

        Ok(ScenarioReport {
            scenario: Scenario::Block,
            items: 1,
            plaintext_bytes: bytes,
            envelope_bytes,
            failures,
            phases: vec![init, encrypt, decrypt],
            memory_settled: None,
        })
    }

    /// Every item sealed and opened as its own stream envelope.
    fn run_chunks(&self) -> Result<ScenarioReport> {
        let corpus = self.build_corpus(self.config.item_count);
        let items = corpus.items();
        let bytes = corpus.total_bytes();
        let execution = self.execution();

        let (key, init) = self.timed(Phase::Init, 0, || {
            derive_symmetric_key_from_secret(self.passphrase)
        });

        let (sealed, encrypt) =
            self.timed(Phase::Encrypt, bytes, || seal_many(&items, &key, execution));
        let seal_report = BatchReport::from_results(&sealed);
        let (sealed_idx, envelopes): (Vec<usize>, Vec<StreamEnvelope>) = surviving(sealed);
        let envelope_bytes: u64 = envelopes.iter().map(|e| e.wire_len() as u64).sum();

        let (opened, decrypt) =
            self.timed(Phase::Decrypt, bytes, || open_many(&envelopes, &key, execution));

        Ok(ScenarioReport {
            scenario: Scenario::Chunks,
            items: items.len(),
            plaintext_bytes: bytes,
            envelope_bytes,
            failures: seal_report.failed + count_mismatches(&items, &sealed_idx, &opened),
            phases: vec![init, encrypt, decrypt],
            memory_settled: None,
        })
    }

    /// Every item through two-tier entity-key wrapping, stored armored.
    fn run_items(&self) -> Result<ScenarioReport> {
        let corpus = self.build_corpus(self.config.item_count);
        let items = corpus.items();
        let bytes = corpus.total_bytes();
        let execution = self.execution();

        let (master, init) = self.timed(Phase::Init, 0, || {
            derive_symmetric_key_from_secret(self.passphrase)
        });

        let (armored, encrypt) = self.timed(Phase::Encrypt, bytes, || {
            encrypt_items(&items, &master, execution)
                .into_iter()
                .map(|r| r.map(|item| item.to_armored()))
                .collect::<Vec<_>>()
        });
        let encrypt_report = BatchReport::from_results(&armored);
        let (encrypted_idx, armored): (Vec<usize>, Vec<ArmoredItem>) = surviving(armored);
        let envelope_bytes: u64 = armored
            .iter()
            .map(|a| (a.encrypted_content.len() + a.encrypted_entity_key.len()) as u64)
            .sum();

        let (opened, decrypt) = self.timed(Phase::Decrypt, bytes, || {
            let decoded: Vec<CryptoResult<EncryptedItem>> =
                armored.iter().map(ArmoredItem::to_item).collect();
            let decode_report = BatchReport::from_results(&decoded);
            let (decoded_pos, parsed): (Vec<usize>, Vec<EncryptedItem>) = surviving(decoded);
            let opened = decrypt_items(&parsed, &master, execution);
            (decode_report.failed, decoded_pos, opened)
        });
        let (decode_failures, decoded_pos, opened) = opened;
        let decoded_idx: Vec<usize> = decoded_pos.iter().map(|&pos| encrypted_idx[pos]).collect();

        Ok(ScenarioReport {
            scenario: Scenario::Items,
            items: items.len(),
            plaintext_bytes: bytes,
            envelope_bytes,
            failures: encrypt_report.failed
                + decode_failures
                + count_mismatches(&items, &decoded_idx, &opened),
            phases: vec![init, encrypt, decrypt],
            memory_settled: None,
        })
    }

    fn build_corpus(&self, copies: usize) -> Corpus {
        let spinner = self.spinner("corpus");
        spinner.set_message(format!("{copies} x {} chars", self.config.item_size));
        let corpus = Corpus::generate(self.config.item_size, copies, self.config.seed);
        spinner.finish_and_clear();
        corpus
    }

    fn timed<T>(&self, phase: Phase, bytes: u64, f: impl FnOnce() -> T) -> (T, PhaseTiming) {
        let spinner = self.spinner(phase_label(phase));
        let mut memory = ProcessMemory::new();
        let memory_before = memory.resident();
        let start = Instant::now();
        let out = f();
        let elapsed = start.elapsed();
        let memory_after = memory.resident();
        spinner.finish_and_clear();
        (
            out,
            PhaseTiming {
                phase,
                elapsed,
                bytes,
                memory_before,
                memory_after,
            },
        )
    }

    fn spinner(&self, prefix: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{prefix:.bold} {spinner} {elapsed} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_prefix(prefix.to_string());
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    }
}

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Init => "init",
        Phase::Encrypt => "encrypt",
        Phase::Decrypt => "decrypt",
    }
}

/// Split results into the successful values and their input positions.
fn surviving<T>(results: Vec<CryptoResult<T>>) -> (Vec<usize>, Vec<T>) {
    results
        .into_iter()
        .enumerate()
        .filter_map(|(i, result)| result.ok().map(|value| (i, value)))
        .unzip()
}

/// Count outputs that failed or differ from their input. `outputs[k]` belongs
/// to `inputs[input_idx[k]]`; items dropped earlier in the pipeline are
/// counted by the caller.
fn count_mismatches(
    inputs: &[&str],
    input_idx: &[usize],
    outputs: &[CryptoResult<Vec<u8>>],
) -> usize {
    input_idx
        .iter()
        .zip(outputs)
        .filter(|(i, output)| match output {
            Ok(plaintext) => plaintext.as_slice() != inputs[**i].as_bytes(),
            Err(_) => true,
        })
        .count()
}

/// Human-readable report, one line per phase.
pub fn render_report(report: &ScenarioReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("scenario: {}\n", report.scenario));
    out.push_str(&format!("  items:      {}\n", report.items));
    out.push_str(&format!("  plaintext:  {}\n", fmt_bytes(report.plaintext_bytes)));
    out.push_str(&format!(
        "  envelopes:  {} (x{:.3})\n",
        fmt_bytes(report.envelope_bytes),
        report.expansion()
    ));
    for timing in &report.phases {
        let label = format!("{}:", phase_label(timing.phase));
        let ms = timing.elapsed.as_secs_f64() * 1000.0;
        let mut line = format!("  {label:<11} {ms:.2} ms");
        if let Some(rate) = timing.throughput_mib_s() {
            line.push_str(&format!("  ({rate:.1} MiB/s)"));
        }
        if let (Some(before), Some(after)) = (timing.memory_before, timing.memory_after) {
            line.push_str(&format!("  rss {} -> {}", fmt_bytes(before), fmt_bytes(after)));
        }
        out.push_str(&line);
        out.push('\n');
    }
    if let Some(settled) = report.memory_settled {
        out.push_str(&format!("  settled:    rss {}\n", fmt_bytes(settled)));
    }
    out.push_str(&format!("  failures:   {}\n", report.failures));
    out
}

/// Binary-prefixed size with one decimal, e.g. `3.0 MiB`.
pub fn fmt_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}
