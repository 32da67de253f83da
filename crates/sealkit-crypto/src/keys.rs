//! Key types: caller-owned symmetric keys and per-item entity keys

use rand::RngCore;
use zeroize::Zeroize;

use crate::error::{CryptoError, CryptoResult};
use crate::KEY_SIZE;

/// A 256-bit symmetric key. Zeroized on drop.
///
/// Used directly by the stream and block framings, and as the master key
/// that wraps entity keys.
#[derive(Clone)]
pub struct SymmetricKey {
    bytes: [u8; KEY_SIZE],
}

impl SymmetricKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Build a key from a slice, failing unless it is exactly `KEY_SIZE` bytes.
    pub fn try_from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                len: bytes.len(),
                expected: KEY_SIZE,
            });
        }
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(bytes);
        Ok(Self::from_bytes(key))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// A per-item 256-bit key that encrypts one item's content.
#[derive(Clone)]
pub struct EntityKey {
    key: SymmetricKey,
}

impl EntityKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self {
            key: SymmetricKey::from_bytes(bytes),
        }
    }

    pub fn try_from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        SymmetricKey::try_from_slice(bytes).map(|key| Self { key })
    }

    pub fn as_key(&self) -> &SymmetricKey {
        &self.key
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        self.key.as_bytes()
    }
}

impl std::fmt::Debug for EntityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Generate a random 256-bit entity key.
pub fn generate_entity_key() -> EntityKey {
    let mut bytes = [0u8; KEY_SIZE];
    rand::thread_rng().fill_bytes(&mut bytes);
    let key = EntityKey::from_bytes(bytes);
    bytes.zeroize();
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_key_generation() {
        let k1 = generate_entity_key();
        let k2 = generate_entity_key();
        assert_ne!(k1.as_bytes(), k2.as_bytes(), "random keys must differ");
    }

    #[test]
    fn test_try_from_slice_rejects_wrong_length() {
        let err = SymmetricKey::try_from_slice(&[0u8; 31]).unwrap_err();
        assert_eq!(
            err,
            CryptoError::InvalidKeyLength {
                len: 31,
                expected: KEY_SIZE
            }
        );
        assert!(EntityKey::try_from_slice(&[0u8; 33]).is_err());
    }

    #[test]
    fn test_try_from_slice_accepts_key_size() {
        let key = SymmetricKey::try_from_slice(&[7u8; KEY_SIZE]).unwrap();
        assert_eq!(key.as_bytes(), &[7u8; KEY_SIZE]);
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = SymmetricKey::from_bytes([0xAB; KEY_SIZE]);
        let rendered = format!("{key:?}");
        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.contains("171"), "raw key bytes must not be printed");

        let entity = generate_entity_key();
        assert!(format!("{entity:?}").contains("REDACTED"));
    }
}
