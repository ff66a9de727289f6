use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::element::ElementType;
use crate::error::{DatasetError, Result};

pub const INDEX_MAGIC: &[u8; 8] = b"TNTIDX\0\0";
pub const INDEX_VERSION: u64 = 1;

/// `<prefix>.bin`
pub fn data_file_path(prefix: &Path) -> PathBuf {
    with_suffix(prefix, "bin")
}

/// `<prefix>.idx`
pub fn index_file_path(prefix: &Path) -> PathBuf {
    with_suffix(prefix, "idx")
}

fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Append-only writer. Records go straight to the `.bin` file; offsets are
/// kept in memory until [`finalize`](Self::finalize) writes the `.idx`.
///
/// Elements are stored shifted by one, so a stored 1 reads back as 0.
pub struct IndexedDatasetBuilder {
    data: BufWriter<File>,
    data_path: PathBuf,
    element: ElementType,
    data_offsets: Vec<i64>,
    dim_offsets: Vec<i64>,
    sizes: Vec<i64>,
    scratch: Vec<u8>,
}

impl IndexedDatasetBuilder {
    /// Creates (or truncates) the data file at `data_path`.
    pub fn create(data_path: impl AsRef<Path>, element: ElementType) -> Result<Self> {
        let data_path = data_path.as_ref().to_path_buf();
        let file = File::create(&data_path)?;
        Ok(Self {
            data: BufWriter::new(file),
            data_path,
            element,
            data_offsets: vec![0],
            dim_offsets: vec![0],
            sizes: Vec::new(),
            scratch: Vec::new(),
        })
    }

    /// Appends one record. On error nothing is written for this record.
    pub fn add_item(&mut self, values: &[i64]) -> Result<()> {
        self.scratch.clear();
        let element = self.element;
        for &value in values {
            // Report the caller's value, not the shifted one.
            let out_of_range = || DatasetError::ValueOutOfRange { value, element };
            let stored = value.checked_add(1).ok_or_else(out_of_range)?;
            element
                .write_le(stored, &mut self.scratch)
                .map_err(|_| out_of_range())?;
        }
        self.data.write_all(&self.scratch)?;

        let last_data = self.data_offsets[self.data_offsets.len() - 1];
        let last_dim = self.dim_offsets[self.dim_offsets.len() - 1];
        self.data_offsets.push(last_data + values.len() as i64);
        self.sizes.push(values.len() as i64);
        self.dim_offsets.push(last_dim + 1);
        Ok(())
    }

    /// Records added so far.
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Flushes the data file and writes the index to `index_path`.
    pub fn finalize(mut self, index_path: impl AsRef<Path>) -> Result<()> {
        self.data.flush()?;

        let index_path = index_path.as_ref();
        let mut index = BufWriter::new(File::create(index_path)?);
        index.write_all(INDEX_MAGIC)?;
        write_u64(&mut index, INDEX_VERSION)?;
        write_u64(&mut index, self.element.code())?;
        write_u64(&mut index, self.element.size() as u64)?;
        write_u64(&mut index, (self.data_offsets.len() - 1) as u64)?;
        write_u64(&mut index, self.sizes.len() as u64)?;
        write_i64s(&mut index, &self.dim_offsets)?;
        write_i64s(&mut index, &self.data_offsets)?;
        write_i64s(&mut index, &self.sizes)?;
        index.flush()?;

        log::debug!(
            "Wrote {} records to {} / {}",
            self.sizes.len(),
            self.data_path.display(),
            index_path.display()
        );
        Ok(())
    }
}

fn write_u64(writer: &mut impl Write, value: u64) -> Result<()> {
    writer.write_all(&value.to_le_bytes())?;
    Ok(())
}

fn write_i64s(writer: &mut impl Write, values: &[i64]) -> Result<()> {
    for value in values {
        writer.write_all(&value.to_le_bytes())?;
    }
    Ok(())
}
