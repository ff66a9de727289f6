use std::fs;
use std::path::Path;

use indexed_dataset::{
    binarize_text_file, index_file_path, DatasetError, ElementType, IndexedDataset,
    IndexedDatasetBuilder, INDEX_MAGIC,
};

fn u64_at(bytes: &[u8], offset: usize) -> u64 {
    u64::from_le_bytes(bytes[offset..offset + 8].try_into().unwrap())
}

fn i64s_at(bytes: &[u8], offset: usize, count: usize) -> Vec<i64> {
    (0..count)
        .map(|i| {
            let start = offset + i * 8;
            i64::from_le_bytes(bytes[start..start + 8].try_into().unwrap())
        })
        .collect()
}

fn write_text(path: &Path, body: &str) {
    fs::write(path, body).unwrap();
}

#[test]
fn records_read_back_by_index() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("train.src");
    write_text(&input, "5 17 1\n\n3 3 3 3 1\n0 1\n");
    let prefix = dir.path().join("train.en-de.en");

    let summary = binarize_text_file(&input, &prefix, ElementType::I32).unwrap();
    assert_eq!(summary.records, 4);
    assert_eq!(summary.elements, 10);

    let mut dataset = IndexedDataset::open(&prefix).unwrap();
    assert_eq!(dataset.len(), 4);
    assert_eq!(dataset.element_type(), ElementType::I32);
    assert_eq!(dataset.get(0).unwrap(), vec![5, 17, 1]);
    assert_eq!(dataset.get(1).unwrap(), Vec::<i64>::new());
    assert_eq!(dataset.get(2).unwrap(), vec![3, 3, 3, 3, 1]);
    assert_eq!(dataset.get(3).unwrap(), vec![0, 1]);
    assert_eq!(dataset.size(2).unwrap(), 5);

    // Random access out of order.
    assert_eq!(dataset.get(0).unwrap(), vec![5, 17, 1]);

    assert!(matches!(
        dataset.get(4),
        Err(DatasetError::IndexOutOfBounds { index: 4, len: 4 })
    ));
}

#[test]
fn index_header_matches_layout() {
    let dir = tempfile::tempdir().unwrap();
    let bin = dir.path().join("ds.bin");
    let idx = dir.path().join("ds.idx");
    let mut builder = IndexedDatasetBuilder::create(&bin, ElementType::I32).unwrap();
    builder.add_item(&[7, 8]).unwrap();
    builder.add_item(&[9]).unwrap();
    builder.finalize(&idx).unwrap();

    let bytes = fs::read(&idx).unwrap();
    assert_eq!(&bytes[..8], INDEX_MAGIC);
    assert_eq!(u64_at(&bytes, 8), 1, "version");
    assert_eq!(u64_at(&bytes, 16), 4, "i32 code");
    assert_eq!(u64_at(&bytes, 24), 4, "element size");
    assert_eq!(u64_at(&bytes, 32), 2, "record count");
    assert_eq!(u64_at(&bytes, 40), 2, "sizes count");
    assert_eq!(i64s_at(&bytes, 48, 3), vec![0, 1, 2], "dim offsets");
    assert_eq!(i64s_at(&bytes, 72, 3), vec![0, 2, 3], "data offsets");
    assert_eq!(i64s_at(&bytes, 96, 2), vec![2, 1], "sizes");
    assert_eq!(bytes.len(), 112);

    let data = fs::read(&bin).unwrap();
    let stored: Vec<i32> = data
        .chunks_exact(4)
        .map(|chunk| i32::from_le_bytes(chunk.try_into().unwrap()))
        .collect();
    assert_eq!(stored, vec![8, 9, 10], "elements are stored one-based");
}

#[test]
fn out_of_range_values_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("ids.txt");
    write_text(&input, "1 2\n300 4\n");

    let err = binarize_text_file(&input, &dir.path().join("small"), ElementType::U8).unwrap_err();
    match err {
        DatasetError::ValueOutOfRange { value, element } => {
            assert_eq!(value, 300);
            assert_eq!(element, ElementType::U8);
        }
        other => panic!("unexpected error: {other}"),
    }

    let summary = binarize_text_file(&input, &dir.path().join("wide"), ElementType::I16).unwrap();
    assert_eq!(summary.records, 2);
}

#[test]
fn non_integer_tokens_name_their_line() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("ids.txt");
    write_text(&input, "1 2\n3 x 4\n");

    let err = binarize_text_file(&input, &dir.path().join("out"), ElementType::I32).unwrap_err();
    assert!(matches!(err, DatasetError::Parse { line: 2, ref token, .. } if token == "x"));
}

#[test]
fn rebuild_overwrites_previous_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("ids.txt");
    let prefix = dir.path().join("valid.en-de.de");

    write_text(&input, "1\n2\n3\n");
    binarize_text_file(&input, &prefix, ElementType::I32).unwrap();
    write_text(&input, "4 5\n");
    binarize_text_file(&input, &prefix, ElementType::I32).unwrap();

    let mut dataset = IndexedDataset::open(&prefix).unwrap();
    assert_eq!(dataset.len(), 1);
    assert_eq!(dataset.get(0).unwrap(), vec![4, 5]);
}

#[test]
fn open_rejects_foreign_index() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("bogus");
    fs::write(index_file_path(&prefix), b"MMIDIDX\0\0 and more bytes").unwrap();
    fs::write(dir.path().join("bogus.bin"), b"").unwrap();

    assert!(matches!(
        IndexedDataset::open(&prefix),
        Err(DatasetError::BadMagic { .. })
    ));
}
