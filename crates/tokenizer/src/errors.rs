use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serde_json error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("tokenizer error: {0}")]
    Tokenizer(#[from] tokenizers::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("special token '{token}' expected at id {expected}, found {}", describe_id(.actual))]
    SpecialTokenId {
        token: String,
        expected: u32,
        actual: Option<u32>,
    },

    #[error("artifact error: {0}")]
    Artifact(String),
}

fn describe_id(id: &Option<u32>) -> String {
    match id {
        Some(id) => format!("id {id}"),
        None => "no entry in the vocabulary".to_string(),
    }
}
