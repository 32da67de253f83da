//! Two-tier item encryption: a fresh entity key per item, wrapped by the master key
//!
//! Both halves are block envelopes (see [`crate::block`]):
//! - `encrypted_content`    = seal_block(content, entity_key)
//! - `encrypted_entity_key` = seal_block(entity_key, master_key)
//!
//! Content can only be opened after the entity key has been recovered with
//! the master key.

use zeroize::Zeroize;

use crate::block::{open_block, seal_block};
use crate::error::CryptoResult;
use crate::keys::{generate_entity_key, EntityKey, SymmetricKey};

/// An item sealed under its own entity key, plus that key sealed under the master key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedItem {
    pub encrypted_content: Vec<u8>,
    pub encrypted_entity_key: Vec<u8>,
}

impl EncryptedItem {
    pub fn decrypt(&self, master: &SymmetricKey) -> CryptoResult<Vec<u8>> {
        decrypt_item(&self.encrypted_content, &self.encrypted_entity_key, master)
    }
}

/// Encrypt `content` under a freshly generated entity key.
///
/// The plaintext entity key never leaves this function.
pub fn encrypt_item(content: &[u8], master: &SymmetricKey) -> CryptoResult<EncryptedItem> {
    let entity_key = generate_entity_key();
    encrypt_item_with_key(content, &entity_key, master)
}

/// Encrypt `content` under a caller-supplied entity key, e.g. to re-encrypt
/// an edited item without rotating its key.
pub fn encrypt_item_with_key(
    content: &[u8],
    entity_key: &EntityKey,
    master: &SymmetricKey,
) -> CryptoResult<EncryptedItem> {
    let encrypted_content = seal_block(content, entity_key.as_key())?;
    let encrypted_entity_key = seal_block(entity_key.as_bytes(), master)?;

    Ok(EncryptedItem {
        encrypted_content,
        encrypted_entity_key,
    })
}

/// Recover an entity key by opening its envelope with the master key.
pub fn unwrap_entity_key(
    encrypted_entity_key: &[u8],
    master: &SymmetricKey,
) -> CryptoResult<EntityKey> {
    let mut raw = open_block(encrypted_entity_key, master)?;
    let entity_key = EntityKey::try_from_slice(&raw);
    raw.zeroize();
    entity_key
}

/// Decrypt an item: unwrap the entity key, then open the content with it.
///
/// Errors from either step are returned unchanged.
pub fn decrypt_item(
    encrypted_content: &[u8],
    encrypted_entity_key: &[u8],
    master: &SymmetricKey,
) -> CryptoResult<Vec<u8>> {
    let entity_key = unwrap_entity_key(encrypted_entity_key, master)?;
    open_block(encrypted_content, entity_key.as_key())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CryptoError;
    use crate::kdf::derive_symmetric_key;
    use crate::{KEY_SIZE, NONCE_SIZE, TAG_SIZE};

    #[test]
    fn test_item_roundtrip() {
        let master = derive_symmetric_key(b"mano");
        let item = encrypt_item(b"hello world", &master).unwrap();
        assert_eq!(item.decrypt(&master).unwrap(), b"hello world");
    }

    #[test]
    fn test_item_wrong_master() {
        let master = derive_symmetric_key(b"mano");
        let wrong = derive_symmetric_key(b"wrong");
        let item = encrypt_item(b"hello world", &master).unwrap();

        assert_eq!(item.decrypt(&wrong), Err(CryptoError::AuthenticationFailure));
    }

    #[test]
    fn test_wrapped_key_size() {
        let master = derive_symmetric_key(b"mano");
        let item = encrypt_item(b"x", &master).unwrap();

        // nonce (24) + key (32) + tag (16) = 72
        assert_eq!(item.encrypted_entity_key.len(), NONCE_SIZE + KEY_SIZE + TAG_SIZE);
    }

    #[test]
    fn test_entity_keys_independent() {
        let master = derive_symmetric_key(b"mano");
        let a = encrypt_item(b"same content", &master).unwrap();
        let b = encrypt_item(b"same content", &master).unwrap();

        let key_a = unwrap_entity_key(&a.encrypted_entity_key, &master).unwrap();
        let key_b = unwrap_entity_key(&b.encrypted_entity_key, &master).unwrap();
        assert_ne!(key_a.as_bytes(), key_b.as_bytes());
        assert_ne!(a, b);
    }

    #[test]
    fn test_content_needs_its_own_entity_key() {
        let master = derive_symmetric_key(b"mano");
        let a = encrypt_item(b"item a", &master).unwrap();
        let b = encrypt_item(b"item b", &master).unwrap();

        // b's wrapped key unwraps fine, but does not open a's content
        assert_eq!(
            decrypt_item(&a.encrypted_content, &b.encrypted_entity_key, &master),
            Err(CryptoError::AuthenticationFailure)
        );
    }

    #[test]
    fn test_content_not_openable_with_master() {
        let master = derive_symmetric_key(b"mano");
        let item = encrypt_item(b"hello world", &master).unwrap();

        assert_eq!(
            open_block(&item.encrypted_content, &master),
            Err(CryptoError::AuthenticationFailure)
        );
    }

    #[test]
    fn test_short_wrapped_key_propagates() {
        let master = derive_symmetric_key(b"mano");
        let item = encrypt_item(b"hello world", &master).unwrap();

        assert_eq!(
            decrypt_item(&item.encrypted_content, &[0u8; 8], &master),
            Err(CryptoError::ShortMessage {
                len: 8,
                min: NONCE_SIZE + TAG_SIZE
            })
        );
    }

    #[test]
    fn test_wrapped_value_of_wrong_length() {
        let master = derive_symmetric_key(b"mano");
        let not_a_key = seal_block(b"too short to be a key", &master).unwrap();

        assert_eq!(
            unwrap_entity_key(&not_a_key, &master).unwrap_err(),
            CryptoError::InvalidKeyLength {
                len: 21,
                expected: KEY_SIZE
            }
        );
    }

    #[test]
    fn test_encrypt_with_existing_key() {
        let master = derive_symmetric_key(b"mano");
        let entity_key = generate_entity_key();

        let item = encrypt_item_with_key(b"v2", &entity_key, &master).unwrap();
        let recovered = unwrap_entity_key(&item.encrypted_entity_key, &master).unwrap();

        assert_eq!(recovered.as_bytes(), entity_key.as_bytes());
        assert_eq!(item.decrypt(&master).unwrap(), b"v2");
    }
}
