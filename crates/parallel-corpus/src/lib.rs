//! Raw parallel corpus handling: fetching archives, locating the extracted
//! text files and compiling them into one file per language.

pub mod compile;
pub mod download;
pub mod error;
pub mod fetch;
pub mod lines;

// Re-export main types
pub use compile::{compile_files, CompileSummary, CompiledFileSet};
pub use download::{Downloader, HttpDownloader};
pub use error::{CorpusError, Result};
pub use fetch::{extract_tar_gz, find_file, DataSource, Fetcher, RawFileSet};
pub use lines::{ConcatStream, LineStream};
