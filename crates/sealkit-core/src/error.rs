use thiserror::Error;

pub type SealkitResult<T> = Result<T, SealkitError>;

#[derive(Debug, Error)]
pub enum SealkitError {
    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
