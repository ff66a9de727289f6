use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::{CorpusError, Result};

/// Line iterator over one text file.
///
/// Yields each line with surrounding whitespace removed. Blank lines are kept
/// so that parallel files stay aligned line for line. Invalid UTF-8 is
/// replaced rather than rejected; some web-crawled corpora carry a few broken
/// bytes.
pub struct LineStream {
    reader: BufReader<File>,
    buffer: Vec<u8>,
}

impl LineStream {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| CorpusError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            reader: BufReader::new(file),
            buffer: Vec::new(),
        })
    }
}

impl Iterator for LineStream {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buffer.clear();
        match self.reader.read_until(b'\n', &mut self.buffer) {
            Ok(0) => None,
            Ok(_) => Some(Ok(String::from_utf8_lossy(&self.buffer).trim().to_string())),
            Err(err) => Some(Err(err)),
        }
    }
}

/// Sequential stream over several text files, one file at a time.
///
/// Unlike a best-effort corpus reader, a file that cannot be opened ends the
/// stream with an error: every raw file is expected to be present.
pub struct ConcatStream {
    files: Vec<PathBuf>,
    next_file: usize,
    current: Option<LineStream>,
}

impl ConcatStream {
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self {
            files,
            next_file: 0,
            current: None,
        }
    }

    pub fn file_paths(&self) -> &[PathBuf] {
        &self.files
    }

    fn advance_file(&mut self) -> Result<bool> {
        if self.next_file >= self.files.len() {
            return Ok(false);
        }

        let index = self.next_file;
        let path = &self.files[index];
        log::info!(
            "Reading file {} of {}: {}",
            index + 1,
            self.files.len(),
            path.display()
        );
        self.current = Some(LineStream::open(path)?);
        self.next_file += 1;
        Ok(true)
    }
}

impl Iterator for ConcatStream {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(stream) = self.current.as_mut() {
                match stream.next() {
                    Some(Ok(line)) => return Some(Ok(line)),
                    Some(Err(err)) => return Some(Err(err.into())),
                    None => {
                        self.current = None;
                        continue;
                    }
                }
            }

            match self.advance_file() {
                Ok(true) => continue,
                Ok(false) => return None,
                Err(err) => {
                    self.next_file = self.files.len();
                    return Some(Err(err));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn trims_lines_and_keeps_blank_ones() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "  hello world \r\n\n\tlast").unwrap();

        let lines: Vec<String> = LineStream::open(&path)
            .unwrap()
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(lines, vec!["hello world", "", "last"]);
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        fs::write(&path, b"ok\nbro\xffken\n").unwrap();

        let lines: Vec<String> = LineStream::open(&path)
            .unwrap()
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("bro"));
        assert!(lines[1].ends_with("ken"));
    }

    #[test]
    fn concatenates_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.txt");
        let second = dir.path().join("second.txt");
        fs::write(&first, "a\nb\n").unwrap();
        fs::write(&second, "c\n").unwrap();

        let lines: Vec<String> = ConcatStream::new(vec![first, second])
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(lines, vec!["a", "b", "c"]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("present.txt");
        fs::write(&present, "x\n").unwrap();

        let mut stream = ConcatStream::new(vec![present, dir.path().join("absent.txt")]);
        assert_eq!(stream.next().unwrap().unwrap(), "x");
        let err = stream.next().unwrap().unwrap_err();
        assert!(matches!(err, CorpusError::Open { .. }));
        assert!(stream.next().is_none());
    }
}
