//! Key derivation: passphrase → BLAKE3 → pad/truncate to the requested length
//!
//! This is a single fast hash, not a password KDF. It has no salt and no work
//! factor, so a captured envelope can be attacked by offline passphrase
//! guessing at hash speed. The hash-then-pad/truncate shape is kept for
//! behavioural parity only: keys are BLAKE3 output and are not interchangeable
//! with keys derived by libsodium's BLAKE2b `generichash`.

use std::sync::Once;

use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroize;

use crate::keys::SymmetricKey;
use crate::KEY_SIZE;

static WEAK_KDF_NOTICE: Once = Once::new();

/// A key of caller-chosen length derived from a passphrase. Zeroized on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct DerivedKey {
    bytes: Vec<u8>,
}

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Convert into a `SymmetricKey`; fails unless the length is `KEY_SIZE`.
    pub fn to_symmetric(&self) -> crate::CryptoResult<SymmetricKey> {
        SymmetricKey::try_from_slice(&self.bytes)
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("len", &self.bytes.len())
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Derive a `target_len`-byte key from a passphrase.
///
/// The passphrase is hashed with BLAKE3 (32 bytes). If the hash is exactly
/// `target_len` bytes it is used as is; a shorter hash is zero-padded on the
/// right, a longer one truncated to its first `target_len` bytes.
///
/// Total over all inputs: the empty passphrase hashes the empty input, and
/// `target_len == 0` yields an empty key.
pub fn derive_key(passphrase: &[u8], target_len: usize) -> DerivedKey {
    WEAK_KDF_NOTICE.call_once(|| {
        tracing::warn!(
            "deriving keys with a single unsalted BLAKE3 hash; passphrases are not stretched"
        );
    });

    let hashed = blake3::hash(passphrase);
    let hashed = hashed.as_bytes();

    if hashed.len() == target_len {
        return DerivedKey {
            bytes: hashed.to_vec(),
        };
    }

    let mut bytes = vec![0u8; target_len];
    let n = hashed.len().min(target_len);
    bytes[..n].copy_from_slice(&hashed[..n]);
    DerivedKey { bytes }
}

/// Derive the `KEY_SIZE` key used by every envelope operation.
pub fn derive_symmetric_key(passphrase: &[u8]) -> SymmetricKey {
    let derived = derive_key(passphrase, KEY_SIZE);
    let mut bytes = [0u8; KEY_SIZE];
    bytes.copy_from_slice(derived.as_bytes());
    let key = SymmetricKey::from_bytes(bytes);
    bytes.zeroize();
    key
}

/// Same as [`derive_symmetric_key`], for passphrases held as a `SecretString`.
pub fn derive_symmetric_key_from_secret(passphrase: &SecretString) -> SymmetricKey {
    derive_symmetric_key(passphrase.expose_secret().as_bytes())
}
