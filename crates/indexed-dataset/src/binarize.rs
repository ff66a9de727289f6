use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::builder::{data_file_path, index_file_path, IndexedDatasetBuilder};
use crate::element::ElementType;
use crate::error::{DatasetError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinarizeSummary {
    pub data_path: PathBuf,
    pub index_path: PathBuf,
    pub records: usize,
    pub elements: usize,
}

/// Turns a file of whitespace-separated integers into `<output_prefix>.bin`
/// and `<output_prefix>.idx`, one record per line. Existing outputs are
/// overwritten.
pub fn binarize_text_file(
    input: &Path,
    output_prefix: &Path,
    element: ElementType,
) -> Result<BinarizeSummary> {
    let data_path = data_file_path(output_prefix);
    let index_path = index_file_path(output_prefix);
    log::info!(
        "Binarizing {} into {}",
        input.display(),
        output_prefix.display()
    );

    let reader = BufReader::new(File::open(input)?);
    let mut builder = IndexedDatasetBuilder::create(&data_path, element)?;
    let mut values = Vec::new();
    let mut elements = 0usize;

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        values.clear();
        for token in line.split_whitespace() {
            let value = token.parse::<i64>().map_err(|_| DatasetError::Parse {
                path: input.to_path_buf(),
                line: number + 1,
                token: token.to_string(),
            })?;
            values.push(value);
        }
        builder.add_item(&values)?;
        elements += values.len();
    }

    let records = builder.len();
    builder.finalize(&index_path)?;
    log::info!("Binarized {} records ({} elements)", records, elements);

    Ok(BinarizeSummary {
        data_path,
        index_path,
        records,
        elements,
    })
}
