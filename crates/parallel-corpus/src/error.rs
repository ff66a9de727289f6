use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CorpusError>;

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to set up HTTP client: {0}")]
    ClientSetup(#[source] reqwest::Error),

    #[error("failed to write download of {url} to {}: {source}", path.display())]
    Write {
        url: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to extract {}: {source}", archive.display())]
    Extract {
        archive: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("download/extraction failed for url {url} to path {}", path.display())]
    MissingAfterExtract { url: String, path: PathBuf },

    #[error("cannot open corpus file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid data source: {0}")]
    InvalidSource(String),
}

impl CorpusError {
    /// Whether the error came out of the filesystem rather than the network
    /// or the source description.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            CorpusError::Io(_)
                | CorpusError::Write { .. }
                | CorpusError::Extract { .. }
                | CorpusError::MissingAfterExtract { .. }
                | CorpusError::Open { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_setup_failure_is_not_tied_to_a_url() {
        let source = reqwest::blocking::Client::new()
            .get("no-scheme")
            .send()
            .unwrap_err();
        let err = CorpusError::ClientSetup(source);

        assert!(!err.is_io());
        let message = err.to_string();
        assert!(message.starts_with("failed to set up HTTP client: "), "{message}");
        assert!(!message.contains("<client setup>"));
    }
}
