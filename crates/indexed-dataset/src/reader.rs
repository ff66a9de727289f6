use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::builder::{data_file_path, index_file_path, INDEX_MAGIC, INDEX_VERSION};
use crate::element::ElementType;
use crate::error::{DatasetError, Result};

/// Random-access reader over a finalized `.idx`/`.bin` pair.
///
/// The index is held in memory; records are read from the data file on
/// demand and shifted back to their original values.
#[derive(Debug)]
pub struct IndexedDataset {
    data: File,
    prefix: PathBuf,
    element: ElementType,
    dim_offsets: Vec<i64>,
    data_offsets: Vec<i64>,
    sizes: Vec<i64>,
}

impl IndexedDataset {
    pub fn open(prefix: impl AsRef<Path>) -> Result<Self> {
        let prefix = prefix.as_ref().to_path_buf();
        let index_path = index_file_path(&prefix);
        let raw = fs::read(&index_path)?;
        let mut cursor = IndexCursor::new(&raw);

        if cursor.take(INDEX_MAGIC.len())? != INDEX_MAGIC {
            return Err(DatasetError::BadMagic { path: index_path });
        }
        let version = cursor.u64()?;
        if version != INDEX_VERSION {
            return Err(DatasetError::UnsupportedVersion(version));
        }
        let element = ElementType::from_code(cursor.u64()?)?;
        let declared = cursor.u64()?;
        if declared != element.size() as u64 {
            return Err(DatasetError::ElementSizeMismatch {
                element,
                declared,
                expected: element.size(),
            });
        }
        let count = cursor.u64()? as usize;
        let size_count = cursor.u64()? as usize;
        let offsets = count
            .checked_add(1)
            .ok_or_else(|| DatasetError::Corrupt(format!("record count {count}")))?;
        let dim_offsets = cursor.i64s(offsets)?;
        let data_offsets = cursor.i64s(offsets)?;
        let sizes = cursor.i64s(size_count)?;
        if !cursor.is_empty() {
            return Err(DatasetError::Corrupt(format!(
                "{} trailing bytes in {}",
                cursor.remaining(),
                index_path.display()
            )));
        }

        let data = File::open(data_file_path(&prefix))?;
        Ok(Self {
            data,
            prefix,
            element,
            dim_offsets,
            data_offsets,
            sizes,
        })
    }

    pub fn len(&self) -> usize {
        self.data_offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn element_type(&self) -> ElementType {
        self.element
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    /// Number of elements in record `index`.
    pub fn size(&self, index: usize) -> Result<usize> {
        self.check_index(index)?;
        let start = self.dim_offsets[index] as usize;
        let end = self.dim_offsets[index + 1] as usize;
        let dims = self
            .sizes
            .get(start..end)
            .ok_or_else(|| DatasetError::Corrupt(format!("dim offsets of record {index}")))?;
        Ok(dims.iter().product::<i64>() as usize)
    }

    pub fn get(&mut self, index: usize) -> Result<Vec<i64>> {
        let len = self.size(index)?;
        let width = self.element.size();
        let offset = self.data_offsets[index] as u64 * width as u64;

        let mut raw = vec![0u8; len * width];
        self.data.seek(SeekFrom::Start(offset))?;
        self.data.read_exact(&mut raw)?;

        Ok(raw
            .chunks_exact(width)
            .map(|chunk| self.element.read_le(chunk) - 1)
            .collect())
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.len() {
            Ok(())
        } else {
            Err(DatasetError::IndexOutOfBounds {
                index,
                len: self.len(),
            })
        }
    }
}

struct IndexCursor<'a> {
    bytes: &'a [u8],
}

impl<'a> IndexCursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.bytes.len() < n {
            return Err(DatasetError::Corrupt(format!(
                "index truncated: wanted {n} bytes, {} left",
                self.bytes.len()
            )));
        }
        let (head, tail) = self.bytes.split_at(n);
        self.bytes = tail;
        Ok(head)
    }

    fn u64(&mut self) -> Result<u64> {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(raw))
    }

    fn i64s(&mut self, count: usize) -> Result<Vec<i64>> {
        let bytes = count
            .checked_mul(8)
            .ok_or_else(|| DatasetError::Corrupt(format!("array of {count} entries")))?;
        Ok(self
            .take(bytes)?
            .chunks_exact(8)
            .map(|chunk| {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(chunk);
                i64::from_le_bytes(raw)
            })
            .collect())
    }

    fn remaining(&self) -> usize {
        self.bytes.len()
    }

    fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
