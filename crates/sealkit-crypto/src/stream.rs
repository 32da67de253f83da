//! Secret-stream framing: a random header plus a sequence of tagged chunks
//!
//! ```text
//! header  = 24 random bytes (public, travels with the ciphertext)
//! nonce_i = header XOR (i as u64 little-endian, in the last 8 bytes)
//! chunk_i = XChaCha20-Poly1305(key, nonce_i, aad, tag_byte || message)
//! ```
//!
//! The tag byte is encrypted together with the message, so a chunk's role
//! (`Message` or `Final`) is authenticated. Binding the chunk counter into the
//! nonce makes reordered, dropped or replayed chunks fail authentication, and
//! requiring a `Final` chunk detects truncation.
//!
//! [`seal`] and [`open`] are the single-chunk form: one `Final` chunk per
//! envelope.

use chacha20poly1305::{
    aead::{AeadInPlace, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::RngCore;
use zeroize::Zeroize;

use crate::error::{CryptoError, CryptoResult};
use crate::keys::SymmetricKey;
use crate::{HEADER_SIZE, NONCE_SIZE, STREAM_ABYTES};

/// Role of a chunk within a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StreamTag {
    /// An ordinary chunk; more chunks follow.
    Message = 0,
    /// The last chunk of the stream.
    Final = 3,
}

impl StreamTag {
    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Message),
            3 => Some(Self::Final),
            _ => None,
        }
    }
}

/// Public per-stream parameters produced by [`StreamSealer::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHeader([u8; HEADER_SIZE]);

impl StreamHeader {
    pub fn from_bytes(bytes: [u8; HEADER_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn try_from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let bytes: [u8; HEADER_SIZE] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidHeaderLength {
                    len: bytes.len(),
                    expected: HEADER_SIZE,
                })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; HEADER_SIZE] {
        &self.0
    }

    fn chunk_nonce(&self, counter: u64) -> [u8; NONCE_SIZE] {
        let mut nonce = self.0;
        for (n, c) in nonce[NONCE_SIZE - 8..]
            .iter_mut()
            .zip(counter.to_le_bytes())
        {
            *n ^= c;
        }
        nonce
    }
}

/// A single-chunk stream envelope: header plus one `Final` chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEnvelope {
    pub header: StreamHeader,
    pub ciphertext: Vec<u8>,
}

impl StreamEnvelope {
    pub fn open(&self, key: &SymmetricKey) -> CryptoResult<Vec<u8>> {
        open(self.header.as_bytes(), &self.ciphertext, key)
    }

    /// Total bytes on the wire (header + ciphertext).
    pub fn wire_len(&self) -> usize {
        HEADER_SIZE + self.ciphertext.len()
    }
}

/// Push side of a secret stream.
pub struct StreamSealer {
    cipher: XChaCha20Poly1305,
    header: StreamHeader,
    counter: u64,
    finished: bool,
}

impl StreamSealer {
    /// Start a stream bound to `key` with a fresh random header.
    pub fn new(key: &SymmetricKey) -> (Self, StreamHeader) {
        let mut bytes = [0u8; HEADER_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        let header = StreamHeader(bytes);

        let sealer = Self {
            cipher: XChaCha20Poly1305::new(key.as_bytes().into()),
            header,
            counter: 0,
            finished: false,
        };
        (sealer, header)
    }

    pub fn header(&self) -> &StreamHeader {
        &self.header
    }

    /// Encrypt one chunk. Output is `message.len() + STREAM_ABYTES` bytes.
    ///
    /// Pushing after a `Final` chunk fails with `StreamFinished`.
    pub fn push(&mut self, message: &[u8], aad: &[u8], tag: StreamTag) -> CryptoResult<Vec<u8>> {
        if self.finished {
            return Err(CryptoError::StreamFinished);
        }
        if self.counter == u64::MAX {
            return Err(CryptoError::StreamExhausted);
        }

        let nonce = self.header.chunk_nonce(self.counter);

        let mut buffer = Vec::with_capacity(message.len() + STREAM_ABYTES);
        buffer.push(tag as u8);
        buffer.extend_from_slice(message);

        if self
            .cipher
            .encrypt_in_place(XNonce::from_slice(&nonce), aad, &mut buffer)
            .is_err()
        {
            buffer.zeroize();
            return Err(CryptoError::Encryption);
        }

        self.counter += 1;
        if tag == StreamTag::Final {
            self.finished = true;
        }
        Ok(buffer)
    }
}

/// Pull side of a secret stream.
pub struct StreamOpener {
    cipher: XChaCha20Poly1305,
    header: StreamHeader,
    counter: u64,
    finished: bool,
}

impl StreamOpener {
    pub fn new(header: &StreamHeader, key: &SymmetricKey) -> Self {
        Self {
            cipher: XChaCha20Poly1305::new(key.as_bytes().into()),
            header: *header,
            counter: 0,
            finished: false,
        }
    }

    /// Whether a `Final` chunk has been pulled.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Verify and decrypt the next chunk.
    ///
    /// A failed pull leaves the opener where it was, so the caller may retry
    /// with a different chunk.
    pub fn pull(&mut self, chunk: &[u8], aad: &[u8]) -> CryptoResult<(Vec<u8>, StreamTag)> {
        if self.finished {
            return Err(CryptoError::StreamFinished);
        }
        if chunk.len() < STREAM_ABYTES {
            return Err(CryptoError::ShortMessage {
                len: chunk.len(),
                min: STREAM_ABYTES,
            });
        }
        if self.counter == u64::MAX {
            return Err(CryptoError::StreamExhausted);
        }

        let nonce = self.header.chunk_nonce(self.counter);

        let mut buffer = chunk.to_vec();
        self.cipher
            .decrypt_in_place(XNonce::from_slice(&nonce), aad, &mut buffer)
            .map_err(|_| CryptoError::AuthenticationFailure)?;

        let Some(tag) = StreamTag::from_byte(buffer[0]) else {
            buffer.zeroize();
            return Err(CryptoError::AuthenticationFailure);
        };
        buffer.remove(0);

        self.counter += 1;
        if tag == StreamTag::Final {
            self.finished = true;
        }
        Ok((buffer, tag))
    }
}

/// Seal `plaintext` as a single `Final` chunk under a fresh header.
pub fn seal(plaintext: &[u8], key: &SymmetricKey) -> CryptoResult<StreamEnvelope> {
    let (mut sealer, header) = StreamSealer::new(key);
    let ciphertext = sealer.push(plaintext, &[], StreamTag::Final)?;

    tracing::trace!(
        plaintext_len = plaintext.len(),
        ciphertext_len = ciphertext.len(),
        "sealed stream envelope"
    );
    Ok(StreamEnvelope { header, ciphertext })
}

/// Open a single-chunk envelope produced by [`seal`].
///
/// Fails with `AuthenticationFailure` on a bad MAC (tampering, wrong key or
/// wrong header) and when the chunk is not tagged `Final`.
pub fn open(header: &[u8], ciphertext: &[u8], key: &SymmetricKey) -> CryptoResult<Vec<u8>> {
    let header = StreamHeader::try_from_slice(header)?;
    let mut opener = StreamOpener::new(&header, key);

    let (mut plaintext, tag) = opener.pull(ciphertext, &[])?;
    if tag != StreamTag::Final {
        plaintext.zeroize();
        return Err(CryptoError::AuthenticationFailure);
    }
    Ok(plaintext)
}
