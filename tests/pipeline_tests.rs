use std::cell::Cell;
use std::fs;
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use indexed_dataset::IndexedDataset;
use parallel_corpus::{CompiledFileSet, DataSource, Downloader};
use tokenizer::{SubwordModel, SubwordTokenizer};
use translate_data::{encode_and_save_files, Pipeline, PipelineConfig, PipelineError, Split};

/// Maps each whitespace-separated word to its length and counts calls.
struct WordLengthTokenizer {
    calls: Cell<usize>,
}

impl WordLengthTokenizer {
    fn new() -> Self {
        Self {
            calls: Cell::new(0),
        }
    }
}

impl SubwordTokenizer for WordLengthTokenizer {
    fn encode_as_ids(&self, line: &str) -> tokenizer::Result<Vec<u32>> {
        self.calls.set(self.calls.get() + 1);
        Ok(line.split_whitespace().map(|w| w.len() as u32 + 10).collect())
    }

    fn eos_id(&self) -> u32 {
        1
    }
}

fn compiled(dir: &Path, input: &str, target: &str) -> CompiledFileSet {
    let files = CompiledFileSet::at(dir, "wmt32k-compiled-train");
    fs::write(&files.input, input).unwrap();
    fs::write(&files.target, target).unwrap();
    files
}

#[test]
fn encoder_pairs_up_to_the_shorter_file() {
    let dir = tempfile::tempdir().unwrap();
    let files = compiled(dir.path(), "a bb\nccc\nd\ne\n", "xx\ny\n");
    let tokenizer = WordLengthTokenizer::new();
    let out = dir.path().join("utf8");

    let outcome =
        encode_and_save_files(&tokenizer, &out, &files, "wmt32k-encoded-train", 100_000).unwrap();

    assert_eq!(outcome.examples, Some(2));
    assert_eq!(
        fs::read_to_string(&outcome.files.source).unwrap(),
        "11 12 1\n13 1\n"
    );
    assert_eq!(fs::read_to_string(&outcome.files.target).unwrap(), "12 1\n11 1\n");
    assert!(!out.join("wmt32k-encoded-train.incomplete.src").exists());
    assert!(!out.join("wmt32k-encoded-train.incomplete.dst").exists());
}

#[test]
fn every_encoded_line_ends_with_eos() {
    let dir = tempfile::tempdir().unwrap();
    let files = compiled(dir.path(), "one two\n\n  three  \n", "eins\nzwei\ndrei vier\n");
    let tokenizer = WordLengthTokenizer::new();

    let outcome =
        encode_and_save_files(&tokenizer, dir.path(), &files, "encoded", 1).unwrap();
    assert_eq!(outcome.examples, Some(3));

    for path in [&outcome.files.source, &outcome.files.target] {
        let contents = fs::read_to_string(path).unwrap();
        for line in contents.lines() {
            assert_eq!(line.split(' ').last(), Some("1"), "{line:?}");
        }
    }
    let source = fs::read_to_string(&outcome.files.source).unwrap();
    assert_eq!(source.lines().nth(1), Some("1"), "blank line encodes to eos only");
}

#[test]
fn existing_outputs_are_returned_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let files = compiled(dir.path(), "a\n", "b\n");
    let tokenizer = WordLengthTokenizer::new();

    let first = encode_and_save_files(&tokenizer, dir.path(), &files, "encoded", 10).unwrap();
    let calls = tokenizer.calls.get();
    let before = fs::metadata(&first.files.source).unwrap().modified().unwrap();
    let contents = fs::read_to_string(&first.files.source).unwrap();

    fs::write(&files.input, "changed input\n").unwrap();
    let second = encode_and_save_files(&tokenizer, dir.path(), &files, "encoded", 10).unwrap();

    assert_eq!(second.examples, None);
    assert_eq!(second.files, first.files);
    assert_eq!(tokenizer.calls.get(), calls, "no encode calls on skip");
    assert_eq!(
        fs::metadata(&second.files.source).unwrap().modified().unwrap(),
        before
    );
    assert_eq!(fs::read_to_string(&second.files.source).unwrap(), contents);
}

#[test]
fn config_file_overrides_and_resolves_paths() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pipeline.toml");
    fs::write(
        &path,
        r#"
[paths]
data_dir = "data"

[vocab]
size = 4000

[[sources.eval]]
url = "http://example.org/test.tgz"
input = "test.en"
target = "test.de"
"#,
    )
    .unwrap();

    let config = PipelineConfig::load(&path).unwrap();
    assert_eq!(config.paths.data_dir, dir.path().join("data"));
    assert_eq!(config.paths.raw_dir, Path::new("/tmp/translate_ende_raw"));
    assert_eq!(config.vocab.size, 4000);
    assert_eq!(config.sources.train.len(), 3, "unset sections keep defaults");
    assert_eq!(config.sources.eval[0].input, "test.en");
}

#[test]
fn invalid_config_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pipeline.json");
    fs::write(&path, r#"{"encode": {"progress_every": 0}, "vocab": {"size": 5}}"#).unwrap();

    match PipelineConfig::load(&path) {
        Err(PipelineError::Validation(messages)) => assert_eq!(messages.len(), 2),
        other => panic!("expected validation error, got {other:?}"),
    }

    let yaml = dir.path().join("pipeline.yaml");
    fs::write(&yaml, "vocab: {}").unwrap();
    assert!(matches!(
        PipelineConfig::load(&yaml),
        Err(PipelineError::ConfigFormat(_))
    ));
}

/// Serves archives by URL file name from an in-memory table.
struct TableDownloader {
    archives: Vec<(String, Vec<u8>)>,
    calls: Cell<usize>,
}

impl Downloader for TableDownloader {
    fn download(&self, url: &str, dest: &Path) -> parallel_corpus::Result<u64> {
        self.calls.set(self.calls.get() + 1);
        let (_, bytes) = self
            .archives
            .iter()
            .find(|(name, _)| url.ends_with(name.as_str()))
            .ok_or_else(|| parallel_corpus::CorpusError::InvalidSource(url.to_string()))?;
        fs::write(dest, bytes)?;
        Ok(bytes.len() as u64)
    }
}

fn archive(entries: &[(&str, String)]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (path, contents) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, path, contents.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

fn sentences(prefix: &str, count: usize) -> String {
    (0..count)
        .map(|i| format!("{prefix} sentence number {i} about the session\n"))
        .collect()
}

#[test]
fn pipeline_runs_end_to_end_and_restarts_without_work() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = PipelineConfig::default();
    config.paths.data_dir = dir.path().join("data");
    config.paths.raw_dir = dir.path().join("raw");
    config.sources.train = vec![DataSource::new(
        "http://example.org/train.tgz",
        "corpus.en",
        "corpus.de",
    )];
    config.sources.eval = vec![DataSource::new(
        "http://example.org/dev.tgz",
        "newstest.en",
        "newstest.de",
    )];
    config.vocab.size = 300;
    config.vocab.min_frequency = 1;
    config.vocab.num_threads = Some(1);
    config.download.show_progress = false;
    config.validate().unwrap();

    let downloader = TableDownloader {
        archives: vec![
            (
                "train.tgz".to_string(),
                archive(&[
                    ("train/corpus.en", sentences("english", 12)),
                    ("train/corpus.de", sentences("deutsch", 12)),
                ]),
            ),
            (
                "dev.tgz".to_string(),
                archive(&[
                    ("dev/newstest.en", sentences("english", 3)),
                    ("dev/newstest.de", sentences("deutsch", 3)),
                ]),
            ),
        ],
        calls: Cell::new(0),
    };

    let pipeline = Pipeline::new(config.clone(), &downloader);
    let report = pipeline.run().unwrap();
    assert_eq!(downloader.calls.get(), 2);
    assert_eq!(report.vocab_file, config.vocab_file());
    assert!(report.vocab_file.is_file());

    let train = &report.splits[0];
    assert_eq!(train.split, Split::Train);
    assert_eq!(train.compiled.input_lines, 12);
    assert_eq!(train.encoded.examples, Some(12));
    assert_eq!(train.source_binary.records, 12);

    let (source_prefix, _) = config.binary_prefixes(Split::Eval);
    assert!(source_prefix.ends_with("valid.en-de.en"));
    let mut valid = IndexedDataset::open(&source_prefix).unwrap();
    assert_eq!(valid.len(), 3);

    let model = SubwordModel::from_file(&report.vocab_file).unwrap();
    let encoded = fs::read_to_string(config.encoded_files(Split::Eval).source).unwrap();
    let first_line: Vec<i64> = encoded
        .lines()
        .next()
        .unwrap()
        .split(' ')
        .map(|id| id.parse().unwrap())
        .collect();
    assert_eq!(valid.get(0).unwrap(), first_line);
    assert_eq!(*first_line.last().unwrap(), i64::from(model.eos_id()));

    let vocab_modified = fs::metadata(&report.vocab_file).unwrap().modified().unwrap();
    let again = Pipeline::new(config.clone(), &downloader).run().unwrap();
    assert_eq!(downloader.calls.get(), 2, "raw files are reused");
    assert_eq!(again.splits[0].encoded.examples, None, "encoded files are reused");
    assert_eq!(
        fs::metadata(&report.vocab_file).unwrap().modified().unwrap(),
        vocab_modified,
        "vocabulary is reused"
    );
}
