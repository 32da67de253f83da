//! sealkit-crypto: authenticated-encryption envelopes over XChaCha20-Poly1305
//!
//! Two framings are provided:
//!
//! ```text
//! Stream envelope:  header (24 bytes, random)  +  chunk = AEAD(tag_byte || message) || mac(16)
//! Block envelope:   nonce (24 bytes, random) || ciphertext || mac(16)
//! ```
//!
//! Key hierarchy for item encryption:
//! ```text
//! Master Key (256-bit, BLAKE3 of passphrase, padded/truncated to key size)
//!   └── Entity Key (per-item, 256-bit random, sealed as a block under the master key)
//!       └── Content (sealed as a block under the entity key)
//! ```

pub mod armor;
pub mod batch;
pub mod block;
pub mod error;
pub mod item;
pub mod kdf;
pub mod keys;
pub mod stream;

pub use armor::{decode_envelope, encode_envelope, ArmoredItem, ArmoredStream};
pub use batch::{decrypt_items, encrypt_items, open_many, seal_many, BatchReport, Execution};
pub use block::{open_block, seal_block};
pub use error::{CryptoError, CryptoResult};
pub use item::{decrypt_item, encrypt_item, encrypt_item_with_key, unwrap_entity_key, EncryptedItem};
pub use kdf::{derive_key, derive_symmetric_key, derive_symmetric_key_from_secret, DerivedKey};
pub use keys::{generate_entity_key, EntityKey, SymmetricKey};
pub use stream::{open, seal, StreamEnvelope, StreamHeader, StreamOpener, StreamSealer, StreamTag};

/// Size of a symmetric key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of an XChaCha20-Poly1305 nonce (192-bit)
pub const NONCE_SIZE: usize = 24;

/// Size of a Poly1305 authentication tag
pub const TAG_SIZE: usize = 16;

/// Size of a secret-stream header
pub const HEADER_SIZE: usize = 24;

/// Per-chunk overhead of a secret stream: one tag-marker byte plus the Poly1305 tag
pub const STREAM_ABYTES: usize = 1 + TAG_SIZE;

/// Natural output size of the passphrase hash (BLAKE3)
pub const HASH_SIZE: usize = blake3::OUT_LEN;
