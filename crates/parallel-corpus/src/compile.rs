use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::fetch::RawFileSet;
use crate::lines::ConcatStream;

pub const INPUT_EXTENSION: &str = "lang1";
pub const TARGET_EXTENSION: &str = "lang2";

/// One compiled file per language for a single split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledFileSet {
    pub input: PathBuf,
    pub target: PathBuf,
}

impl CompiledFileSet {
    /// `<dir>/<stem>.lang1` and `<dir>/<stem>.lang2`.
    pub fn at(dir: &Path, stem: &str) -> Self {
        Self {
            input: dir.join(format!("{stem}.{INPUT_EXTENSION}")),
            target: dir.join(format!("{stem}.{TARGET_EXTENSION}")),
        }
    }

    pub fn paths(&self) -> [&Path; 2] {
        [self.input.as_path(), self.target.as_path()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileSummary {
    pub files: CompiledFileSet,
    pub sources: usize,
    pub input_lines: usize,
    pub target_lines: usize,
}

/// Concatenates all raw input files into one file and all raw target files
/// into another, in source order, one trimmed line per input line.
///
/// Always rewrites the outputs; there is no cache check at this stage.
pub fn compile_files(data_dir: &Path, raw_files: &RawFileSet, stem: &str) -> Result<CompileSummary> {
    log::info!("Compiling files with tag {}.", stem);
    fs::create_dir_all(data_dir)?;

    let files = CompiledFileSet::at(data_dir, stem);
    let input_lines = write_concatenated(&files.input, raw_files.inputs())?;
    let target_lines = write_concatenated(&files.target, raw_files.targets())?;

    if input_lines != target_lines {
        log::warn!(
            "Compiled {} has {} lines but {} has {}; pairing will stop at the shorter file",
            files.input.display(),
            input_lines,
            files.target.display(),
            target_lines
        );
    }

    log::info!(
        "Compiled {} source(s): {} input lines, {} target lines",
        raw_files.len(),
        input_lines,
        target_lines
    );

    Ok(CompileSummary {
        files,
        sources: raw_files.len(),
        input_lines,
        target_lines,
    })
}

fn write_concatenated(output: &Path, sources: &[PathBuf]) -> Result<usize> {
    let mut writer = BufWriter::new(File::create(output)?);
    let mut lines = 0usize;

    for line in ConcatStream::new(sources.to_vec()) {
        let line = line?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        lines += 1;
    }

    writer.flush()?;
    Ok(lines)
}
