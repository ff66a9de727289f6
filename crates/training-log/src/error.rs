use thiserror::Error;

pub type Result<T> = std::result::Result<T, LogError>;

#[derive(Error, Debug)]
pub enum LogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode tensorboard event: {0}")]
    Encode(#[from] prost::EncodeError),
}
