//! Nonce-prepended single-block XChaCha20-Poly1305 envelopes
//!
//! Envelope format (binary):
//! ```text
//! [24 bytes: random nonce][N bytes: ciphertext][16 bytes: Poly1305 tag]
//! ```
//!
//! The nonce travels with the ciphertext, so every envelope can be stored or
//! transmitted on its own.

use chacha20poly1305::{
    aead::{Aead, AeadInPlace, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::RngCore;
use zeroize::Zeroize;

use crate::error::{CryptoError, CryptoResult};
use crate::keys::SymmetricKey;
use crate::{NONCE_SIZE, TAG_SIZE};

/// Seal `plaintext` under `key` with a fresh random nonce.
///
/// Returns: `[24-byte nonce][ciphertext][16-byte tag]`
pub fn seal_block(plaintext: &[u8], key: &SymmetricKey) -> CryptoResult<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = XNonce::from_slice(&nonce_bytes);

    let mut envelope = Vec::with_capacity(NONCE_SIZE + plaintext.len() + TAG_SIZE);
    envelope.extend_from_slice(&nonce_bytes);
    envelope.extend_from_slice(plaintext);

    let tag = match cipher.encrypt_in_place_detached(nonce, b"", &mut envelope[NONCE_SIZE..]) {
        Ok(tag) => tag,
        Err(_) => {
            envelope.zeroize();
            return Err(CryptoError::Encryption);
        }
    };
    envelope.extend_from_slice(&tag);

    tracing::trace!(
        plaintext_len = plaintext.len(),
        envelope_len = envelope.len(),
        "sealed block"
    );
    Ok(envelope)
}

/// Open an envelope produced by [`seal_block`].
///
/// Inputs shorter than `NONCE_SIZE + TAG_SIZE` are rejected with
/// `ShortMessage` before any decryption is attempted.
pub fn open_block(envelope: &[u8], key: &SymmetricKey) -> CryptoResult<Vec<u8>> {
    if envelope.len() < NONCE_SIZE + TAG_SIZE {
        return Err(CryptoError::ShortMessage {
            len: envelope.len(),
            min: NONCE_SIZE + TAG_SIZE,
        });
    }

    let (nonce_bytes, body) = envelope.split_at(NONCE_SIZE);
    let nonce = XNonce::from_slice(nonce_bytes);
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());

    cipher
        .decrypt(nonce, body)
        .map_err(|_| CryptoError::AuthenticationFailure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdf::derive_symmetric_key;
    use crate::keys::generate_entity_key;
    use proptest::prelude::*;

    #[test]
    fn test_seal_open_roundtrip() {
        let key = derive_symmetric_key(b"mano");
        let envelope = seal_block(b"hello world", &key).unwrap();
        let opened = open_block(&envelope, &key).unwrap();
        assert_eq!(opened, b"hello world");
    }

    #[test]
    fn test_seal_open_empty() {
        let key = derive_symmetric_key(b"mano");
        let envelope = seal_block(b"", &key).unwrap();
        assert_eq!(envelope.len(), NONCE_SIZE + TAG_SIZE);
        assert_eq!(open_block(&envelope, &key).unwrap(), b"");
    }

    #[test]
    fn test_open_wrong_key() {
        let key = derive_symmetric_key(b"mano");
        let wrong = derive_symmetric_key(b"wrong");

        let envelope = seal_block(b"hello world", &key).unwrap();
        assert_eq!(
            open_block(&envelope, &wrong),
            Err(CryptoError::AuthenticationFailure)
        );
    }

    #[test]
    fn test_envelope_size() {
        let key = generate_entity_key();
        let envelope = seal_block(&vec![0u8; 1000], key.as_key()).unwrap();

        // nonce (24) + plaintext (1000) + tag (16) = 1040
        assert_eq!(envelope.len(), NONCE_SIZE + 1000 + TAG_SIZE);
    }

    #[test]
    fn test_fresh_nonce_per_call() {
        let key = derive_symmetric_key(b"mano");
        let a = seal_block(b"same plaintext", &key).unwrap();
        let b = seal_block(b"same plaintext", &key).unwrap();

        assert_ne!(a[..NONCE_SIZE], b[..NONCE_SIZE], "nonces must differ");
        assert_ne!(a[NONCE_SIZE..], b[NONCE_SIZE..], "ciphertexts must differ");
    }

    #[test]
    fn test_short_message_rejected() {
        let key = derive_symmetric_key(b"mano");
        for len in [0, 1, NONCE_SIZE, NONCE_SIZE + TAG_SIZE - 1] {
            assert_eq!(
                open_block(&vec![0u8; len], &key),
                Err(CryptoError::ShortMessage {
                    len,
                    min: NONCE_SIZE + TAG_SIZE
                })
            );
        }
    }

    #[test]
    fn test_minimum_length_garbage_is_auth_failure() {
        let key = derive_symmetric_key(b"mano");
        assert_eq!(
            open_block(&[0u8; NONCE_SIZE + TAG_SIZE], &key),
            Err(CryptoError::AuthenticationFailure)
        );
    }

    #[test]
    fn test_tampered_nonce() {
        let key = derive_symmetric_key(b"mano");
        let mut envelope = seal_block(b"secret data", &key).unwrap();
        envelope[0] ^= 0x01;

        assert_eq!(
            open_block(&envelope, &key),
            Err(CryptoError::AuthenticationFailure)
        );
    }

    proptest! {
        #[test]
        fn roundtrip_arbitrary_plaintext(data in proptest::collection::vec(any::<u8>(), 0..=4096)) {
            let key = generate_entity_key();
            let envelope = seal_block(&data, key.as_key()).unwrap();
            prop_assert_eq!(open_block(&envelope, key.as_key()).unwrap(), data);
        }

        /// Flipping any single bit after the nonce must fail authentication
        #[test]
        fn any_bit_flip_is_detected(
            data in proptest::collection::vec(any::<u8>(), 0..=256),
            position in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            let key = generate_entity_key();
            let mut envelope = seal_block(&data, key.as_key()).unwrap();
            let idx = NONCE_SIZE + position.index(envelope.len() - NONCE_SIZE);
            envelope[idx] ^= 1 << bit;

            prop_assert_eq!(
                open_block(&envelope, key.as_key()),
                Err(CryptoError::AuthenticationFailure)
            );
        }
    }
}
