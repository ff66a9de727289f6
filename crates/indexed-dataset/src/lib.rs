//! Fairseq-compatible "legacy" indexed datasets.
//!
//! A dataset is a pair of files sharing a prefix:
//!
//! * `<prefix>.bin` holds every record back to back, each element stored
//!   little-endian as the configured [`ElementType`] and shifted by one;
//! * `<prefix>.idx` starts with the magic `TNTIDX\0\0`, then `u64` version,
//!   element code, element size, record count and sizes count, followed by
//!   the `i64` arrays `dim_offsets`, `data_offsets` and `sizes`.
//!
//! [`IndexedDatasetBuilder`] writes a dataset append-only and
//! [`IndexedDataset`] reads records back by number.

mod binarize;
mod builder;
mod element;
mod error;
mod reader;

pub use binarize::{binarize_text_file, BinarizeSummary};
pub use builder::{data_file_path, index_file_path, IndexedDatasetBuilder, INDEX_MAGIC};
pub use element::ElementType;
pub use error::{DatasetError, Result};
pub use reader::IndexedDataset;
