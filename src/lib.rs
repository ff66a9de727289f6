//! WMT English-German data preparation.
//!
//! Downloads the raw parallel corpora, compiles them into one file per
//! language and split, trains (or reuses) a subword vocabulary, encodes every
//! line pair into id sequences and binarizes the result into indexed
//! datasets ready for translation training.

pub mod config;
pub mod encode;
pub mod error;
pub mod pipeline;

pub use config::{PipelineConfig, Split};
pub use encode::{encode_and_save_files, EncodeOutcome, EncodedFileSet};
pub use error::PipelineError;
pub use pipeline::{Pipeline, PipelineReport, SplitReport};
