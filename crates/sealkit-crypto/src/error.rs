use thiserror::Error;

pub type CryptoResult<T> = Result<T, CryptoError>;

/// Failure outcomes of envelope operations.
///
/// `ShortMessage` and `AuthenticationFailure` are the two outcomes an opener
/// must expect from untrusted input; the rest indicate misuse or malformed
/// transport encoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("short message: {len} bytes (minimum {min})")]
    ShortMessage { len: usize, min: usize },

    #[error("authentication failed: wrong key, wrong header/nonce, or corrupted data")]
    AuthenticationFailure,

    #[error("invalid key length: {len} bytes (expected {expected})")]
    InvalidKeyLength { len: usize, expected: usize },

    #[error("invalid stream header length: {len} bytes (expected {expected})")]
    InvalidHeaderLength { len: usize, expected: usize },

    #[error("stream already finished")]
    StreamFinished,

    #[error("stream chunk counter exhausted")]
    StreamExhausted,

    #[error("encryption failed: input too large for a single AEAD call")]
    Encryption,

    #[error("encoding error: {0}")]
    Encoding(String),
}
