//! Text-safe (base64) encoding of envelopes for storage or transport
//!
//! Uses the standard alphabet with padding. Items and streams serialize to
//! JSON objects whose fields are base64 strings.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, CryptoResult};
use crate::item::EncryptedItem;
use crate::stream::{StreamEnvelope, StreamHeader};

pub fn encode_envelope(envelope: &[u8]) -> String {
    STANDARD.encode(envelope)
}

pub fn decode_envelope(encoded: &str) -> CryptoResult<Vec<u8>> {
    STANDARD
        .decode(encoded.trim())
        .map_err(|e| CryptoError::Encoding(format!("base64 decode: {e}")))
}

/// An [`EncryptedItem`] with both envelopes base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmoredItem {
    pub encrypted_content: String,
    pub encrypted_entity_key: String,
}

impl ArmoredItem {
    pub fn to_item(&self) -> CryptoResult<EncryptedItem> {
        Ok(EncryptedItem {
            encrypted_content: decode_envelope(&self.encrypted_content)?,
            encrypted_entity_key: decode_envelope(&self.encrypted_entity_key)?,
        })
    }

    pub fn to_json(&self) -> CryptoResult<String> {
        serde_json::to_string(self)
            .map_err(|e| CryptoError::Encoding(format!("item serialization: {e}")))
    }

    pub fn from_json(json: &str) -> CryptoResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| CryptoError::Encoding(format!("item deserialization: {e}")))
    }
}

impl EncryptedItem {
    pub fn to_armored(&self) -> ArmoredItem {
        ArmoredItem {
            encrypted_content: encode_envelope(&self.encrypted_content),
            encrypted_entity_key: encode_envelope(&self.encrypted_entity_key),
        }
    }
}

/// A [`StreamEnvelope`] with header and ciphertext base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmoredStream {
    pub header: String,
    pub ciphertext: String,
}

impl ArmoredStream {
    pub fn to_envelope(&self) -> CryptoResult<StreamEnvelope> {
        let header = StreamHeader::try_from_slice(&decode_envelope(&self.header)?)?;
        Ok(StreamEnvelope {
            header,
            ciphertext: decode_envelope(&self.ciphertext)?,
        })
    }

    pub fn to_json(&self) -> CryptoResult<String> {
        serde_json::to_string(self)
            .map_err(|e| CryptoError::Encoding(format!("stream serialization: {e}")))
    }

    pub fn from_json(json: &str) -> CryptoResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| CryptoError::Encoding(format!("stream deserialization: {e}")))
    }
}

impl StreamEnvelope {
    pub fn to_armored(&self) -> ArmoredStream {
        ArmoredStream {
            header: encode_envelope(self.header.as_bytes()),
            ciphertext: encode_envelope(&self.ciphertext),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{open_block, seal_block};
    use crate::item::encrypt_item;
    use crate::kdf::derive_symmetric_key;
    use crate::stream::seal;

    #[test]
    fn test_block_armor_roundtrip() {
        let key = derive_symmetric_key(b"mano");
        let encoded = encode_envelope(&seal_block(b"hello world", &key).unwrap());

        let decoded = decode_envelope(&encoded).unwrap();
        assert_eq!(open_block(&decoded, &key).unwrap(), b"hello world");
    }

    #[test]
    fn test_decode_tolerates_trailing_newline() {
        let encoded = format!("{}\n", encode_envelope(b"abc"));
        assert_eq!(decode_envelope(&encoded).unwrap(), b"abc");
    }

    #[test]
    fn test_invalid_base64_rejected() {
        let err = decode_envelope("not*base64!").unwrap_err();
        assert!(matches!(err, CryptoError::Encoding(_)));
    }

    #[test]
    fn test_item_json_roundtrip() {
        let master = derive_symmetric_key(b"mano");
        let item = encrypt_item(b"hello world", &master).unwrap();

        let json = item.to_armored().to_json().unwrap();
        assert!(json.contains("encrypted_content"));

        let parsed = ArmoredItem::from_json(&json).unwrap().to_item().unwrap();
        assert_eq!(parsed, item);
        assert_eq!(parsed.decrypt(&master).unwrap(), b"hello world");
    }

    #[test]
    fn test_stream_json_roundtrip() {
        let key = derive_symmetric_key(b"mano");
        let envelope = seal(b"hello world", &key).unwrap();

        let json = envelope.to_armored().to_json().unwrap();
        let parsed = ArmoredStream::from_json(&json).unwrap().to_envelope().unwrap();

        assert_eq!(parsed, envelope);
        assert_eq!(parsed.open(&key).unwrap(), b"hello world");
    }

    #[test]
    fn test_stream_bad_header_length() {
        let armored = ArmoredStream {
            header: encode_envelope(&[0u8; 4]),
            ciphertext: encode_envelope(&[0u8; 32]),
        };
        assert!(matches!(
            armored.to_envelope(),
            Err(CryptoError::InvalidHeaderLength { len: 4, .. })
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            ArmoredItem::from_json("{\"encrypted_content\": 1}"),
            Err(CryptoError::Encoding(_))
        ));
    }
}
