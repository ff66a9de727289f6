use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::download::Downloader;
use crate::error::{CorpusError, Result};

/// Default directory depth searched for already-extracted files.
pub const DEFAULT_SEARCH_DEPTH: usize = 5;

const INCOMPLETE_SUFFIX: &str = ".incomplete";

/// One raw parallel corpus archive and the two files it must contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSource {
    pub url: String,
    pub input: String,
    pub target: String,
}

impl DataSource {
    pub fn new(url: impl Into<String>, input: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            input: input.into(),
            target: target.into(),
        }
    }

    /// File name the archive is stored under: the last path segment of the URL.
    pub fn archive_name(&self) -> Result<&str> {
        let without_query = self.url.split(['?', '#']).next().unwrap_or_default();
        match without_query.rsplit('/').next() {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(CorpusError::InvalidSource(format!(
                "url '{}' has no file name",
                self.url
            ))),
        }
    }
}

/// On-disk locations of extracted raw text, one input/target pair per source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFileSet {
    inputs: Vec<PathBuf>,
    targets: Vec<PathBuf>,
}

impl RawFileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, input: PathBuf, target: PathBuf) {
        self.inputs.push(input);
        self.targets.push(target);
    }

    pub fn inputs(&self) -> &[PathBuf] {
        &self.inputs
    }

    pub fn targets(&self) -> &[PathBuf] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// All input files followed by all target files.
    pub fn all_files(&self) -> Vec<PathBuf> {
        self.inputs.iter().chain(&self.targets).cloned().collect()
    }
}

impl FromIterator<(PathBuf, PathBuf)> for RawFileSet {
    fn from_iter<I: IntoIterator<Item = (PathBuf, PathBuf)>>(iter: I) -> Self {
        let mut set = RawFileSet::new();
        for (input, target) in iter {
            set.push(input, target);
        }
        set
    }
}

/// Downloads and extracts corpus archives into a raw directory, skipping
/// anything that is already there.
pub struct Fetcher<D> {
    raw_dir: PathBuf,
    downloader: D,
    search_depth: usize,
}

impl<D: Downloader> Fetcher<D> {
    pub fn new(raw_dir: impl Into<PathBuf>, downloader: D) -> Self {
        Self {
            raw_dir: raw_dir.into(),
            downloader,
            search_depth: DEFAULT_SEARCH_DEPTH,
        }
    }

    pub fn with_search_depth(mut self, depth: usize) -> Self {
        self.search_depth = depth;
        self
    }

    pub fn raw_dir(&self) -> &Path {
        &self.raw_dir
    }

    pub fn downloader(&self) -> &D {
        &self.downloader
    }

    /// Resolves every source to its extracted input/target files.
    pub fn raw_files(&self, sources: &[DataSource]) -> Result<RawFileSet> {
        if !self.raw_dir.exists() {
            log::info!("Creating directory {}", self.raw_dir.display());
            fs::create_dir_all(&self.raw_dir)?;
        }

        let mut raw_files = RawFileSet::new();
        for source in sources {
            let (input, target) = self.download_and_extract(source)?;
            raw_files.push(input, target);
        }
        Ok(raw_files)
    }

    pub fn download_and_extract(&self, source: &DataSource) -> Result<(PathBuf, PathBuf)> {
        if let Some(found) = self.find_pair(source) {
            log::info!("Already downloaded and extracted {}.", source.url);
            return Ok(found);
        }

        let archive = self.download_from_url(source)?;

        log::info!("Extracting {}.", archive.display());
        extract_tar_gz(&archive, &self.raw_dir)?;

        self.find_pair(source)
            .ok_or_else(|| CorpusError::MissingAfterExtract {
                url: source.url.clone(),
                path: self.raw_dir.clone(),
            })
    }

    /// Fetches the archive for `source` unless a file with the same name is
    /// already present in the raw directory, searched at depth 0.
    pub fn download_from_url(&self, source: &DataSource) -> Result<PathBuf> {
        let filename = source.archive_name()?;
        if let Some(found) = find_file(&self.raw_dir, filename, 0) {
            log::info!(
                "Already downloaded: {} (at {}).",
                source.url,
                found.display()
            );
            return Ok(found);
        }

        let archive = self.raw_dir.join(filename);
        let in_progress = self.raw_dir.join(format!("{filename}{INCOMPLETE_SUFFIX}"));
        log::info!("Downloading from {} to {}.", source.url, archive.display());

        let bytes = self.downloader.download(&source.url, &in_progress)?;
        fs::rename(&in_progress, &archive).map_err(|source_err| CorpusError::Write {
            url: source.url.clone(),
            path: archive.clone(),
            source: source_err,
        })?;
        log::info!("Downloaded {} bytes to {}.", bytes, archive.display());

        Ok(archive)
    }

    fn find_pair(&self, source: &DataSource) -> Option<(PathBuf, PathBuf)> {
        let input = find_file(&self.raw_dir, &source.input, self.search_depth)?;
        let target = find_file(&self.raw_dir, &source.target, self.search_depth)?;
        Some((input, target))
    }
}

/// Returns the path of `filename` if it is in `root` or in a directory at
/// most `max_depth + 2` levels below it. The shallowest match wins.
///
/// `max_depth` counts nesting below the first-level subdirectories, which
/// themselves sit at depth 0. Directories deeper than `max_depth` are still
/// searched but not descended into, so `max_depth = 0` covers `root/a/b/`.
pub fn find_file(root: &Path, filename: &str, max_depth: usize) -> Option<PathBuf> {
    WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth + 3)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name() == filename && entry.path().is_file())
        .min_by_key(|entry| entry.depth())
        .map(|entry| entry.into_path())
}

/// Unpacks a gzip-compressed tar archive into `dest`.
pub fn extract_tar_gz(archive: &Path, dest: &Path) -> Result<()> {
    let extract_err = |source| CorpusError::Extract {
        archive: archive.to_path_buf(),
        source,
    };

    let file = File::open(archive).map_err(extract_err)?;
    let mut tar = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    tar.unpack(dest).map_err(extract_err)
}
