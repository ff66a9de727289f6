use std::fmt;

use indexed_dataset::DatasetError;
use parallel_corpus::CorpusError;

#[derive(Debug)]
pub enum PipelineError {
    Io(std::io::Error),
    ConfigFormat(String),
    Validation(Vec<String>),
    Corpus(CorpusError),
    Tokenizer(tokenizer::Error),
    Dataset(DatasetError),
}

impl PipelineError {
    pub fn validation(messages: Vec<String>) -> Self {
        Self::Validation(messages)
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Io(err) => write!(f, "I/O error: {}", err),
            PipelineError::ConfigFormat(err) => write!(f, "failed to parse config: {}", err),
            PipelineError::Validation(messages) => {
                write!(f, "invalid configuration: {}", messages.join("; "))
            }
            PipelineError::Corpus(err) => write!(f, "corpus preparation failed: {}", err),
            PipelineError::Tokenizer(err) => write!(f, "tokenizer failed: {}", err),
            PipelineError::Dataset(err) => write!(f, "binarization failed: {}", err),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Io(err) => Some(err),
            PipelineError::ConfigFormat(_) | PipelineError::Validation(_) => None,
            PipelineError::Corpus(err) => Some(err),
            PipelineError::Tokenizer(err) => Some(err),
            PipelineError::Dataset(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(value: std::io::Error) -> Self {
        PipelineError::Io(value)
    }
}

impl From<toml::de::Error> for PipelineError {
    fn from(value: toml::de::Error) -> Self {
        PipelineError::ConfigFormat(value.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(value: serde_json::Error) -> Self {
        PipelineError::ConfigFormat(value.to_string())
    }
}

impl From<CorpusError> for PipelineError {
    fn from(value: CorpusError) -> Self {
        PipelineError::Corpus(value)
    }
}

impl From<tokenizer::Error> for PipelineError {
    fn from(value: tokenizer::Error) -> Self {
        PipelineError::Tokenizer(value)
    }
}

impl From<DatasetError> for PipelineError {
    fn from(value: DatasetError) -> Self {
        PipelineError::Dataset(value)
    }
}
