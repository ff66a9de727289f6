use std::path::PathBuf;

use thiserror::Error;

use crate::element::ElementType;

pub type Result<T> = std::result::Result<T, DatasetError>;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{} is not an indexed dataset index (bad magic)", path.display())]
    BadMagic { path: PathBuf },

    #[error("unsupported index version {0}")]
    UnsupportedVersion(u64),

    #[error("unknown element type code {0}")]
    UnknownElementType(u64),

    #[error("index declares element size {declared} but {element} needs {expected}")]
    ElementSizeMismatch {
        element: ElementType,
        declared: u64,
        expected: usize,
    },

    #[error("value {value} does not fit element type {element}")]
    ValueOutOfRange { value: i64, element: ElementType },

    #[error("{}:{line}: cannot parse '{token}' as an integer", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        token: String,
    },

    #[error("record {index} out of bounds for dataset of {len} records")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("corrupt index: {0}")]
    Corrupt(String),
}
