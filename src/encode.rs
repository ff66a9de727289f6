use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use parallel_corpus::{CompiledFileSet, LineStream};
use tokenizer::SubwordTokenizer;

use crate::error::PipelineError;

pub const SOURCE_EXTENSION: &str = "src";
pub const TARGET_EXTENSION: &str = "dst";
const INCOMPLETE_TAG: &str = "incomplete";

/// Whitespace-separated id files for one split, one example per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFileSet {
    pub source: PathBuf,
    pub target: PathBuf,
}

impl EncodedFileSet {
    /// `<dir>/<stem>.src` and `<dir>/<stem>.dst`.
    pub fn at(dir: &Path, stem: &str) -> Self {
        Self {
            source: dir.join(format!("{stem}.{SOURCE_EXTENSION}")),
            target: dir.join(format!("{stem}.{TARGET_EXTENSION}")),
        }
    }

    /// Temporary names written before the final rename.
    fn incomplete(dir: &Path, stem: &str) -> Self {
        Self::at(dir, &format!("{stem}.{INCOMPLETE_TAG}"))
    }

    pub fn exists(&self) -> bool {
        self.source.is_file() && self.target.is_file()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOutcome {
    pub files: EncodedFileSet,
    /// `None` when existing outputs were reused.
    pub examples: Option<usize>,
}

/// Encodes the compiled input and target files line by line in lockstep,
/// appending the eos id to every example.
///
/// Output goes to `<output_dir>/<stem>.src|.dst`. When both files already
/// exist nothing is read or written. Pairing stops at the shorter file.
pub fn encode_and_save_files<T: SubwordTokenizer + ?Sized>(
    tokenizer: &T,
    output_dir: &Path,
    compiled: &CompiledFileSet,
    stem: &str,
    progress_every: usize,
) -> Result<EncodeOutcome, PipelineError> {
    let files = EncodedFileSet::at(output_dir, stem);
    if files.exists() {
        log::info!("Files with tag {} already exist.", stem);
        return Ok(EncodeOutcome {
            files,
            examples: None,
        });
    }

    log::info!("Saving files with tag {}.", stem);
    fs::create_dir_all(output_dir)?;
    let temp = EncodedFileSet::incomplete(output_dir, stem);
    let mut source_writer = BufWriter::new(File::create(&temp.source)?);
    let mut target_writer = BufWriter::new(File::create(&temp.target)?);
    let eos = tokenizer.eos_id();
    let every = progress_every.max(1);

    let inputs = LineStream::open(&compiled.input)?;
    let targets = LineStream::open(&compiled.target)?;
    let mut examples = 0usize;
    for (input, target) in inputs.zip(targets) {
        if examples > 0 && examples % every == 0 {
            log::info!("\tSaving case {}.", examples);
        }
        write_ids(&mut source_writer, &tokenizer.encode_as_ids(&input?)?, eos)?;
        write_ids(&mut target_writer, &tokenizer.encode_as_ids(&target?)?, eos)?;
        examples += 1;
    }

    source_writer.flush()?;
    target_writer.flush()?;
    drop(source_writer);
    drop(target_writer);

    fs::rename(&temp.source, &files.source)?;
    fs::rename(&temp.target, &files.target)?;
    log::info!("Saved {} Examples", examples);

    Ok(EncodeOutcome {
        files,
        examples: Some(examples),
    })
}

fn write_ids(writer: &mut impl Write, ids: &[u32], eos: u32) -> std::io::Result<()> {
    for id in ids {
        write!(writer, "{id} ")?;
    }
    writeln!(writer, "{eos}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_space_joined_with_eos_last() {
        let mut out = Vec::new();
        write_ids(&mut out, &[5, 17], 1).unwrap();
        write_ids(&mut out, &[], 1).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "5 17 1\n1\n");
    }

    #[test]
    fn temporary_names_keep_the_extension_last() {
        let dir = Path::new("/data/utf8");
        let temp = EncodedFileSet::incomplete(dir, "wmt32k-encoded-train");
        assert_eq!(
            temp.source,
            dir.join("wmt32k-encoded-train.incomplete.src")
        );
        assert_eq!(
            temp.target,
            dir.join("wmt32k-encoded-train.incomplete.dst")
        );
    }
}
