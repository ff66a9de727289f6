use std::{
    fs,
    path::{Path, PathBuf},
};

use indexed_dataset::ElementType;
use parallel_corpus::fetch::DEFAULT_SEARCH_DEPTH;
use parallel_corpus::{CompiledFileSet, DataSource};
use serde::{Deserialize, Serialize};
use tokenizer::{ArtifactsCfg, ByteLevelCfg, ModelCfg, SpecialTokensCfg, TrainingCfg};

use crate::encode::EncodedFileSet;
use crate::error::PipelineError;

pub const DEFAULT_DATA_DIR: &str = "/tmp/translate_ende";
pub const DEFAULT_RAW_DIR: &str = "/tmp/translate_ende_raw";
pub const DEFAULT_VOCAB_SIZE: usize = 33_708;
pub const DEFAULT_PROGRESS_EVERY: usize = 100_000;

/// The two dataset splits the pipeline produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Eval,
}

/// Every constant of the WMT en-de preparation run. The defaults reproduce
/// the WMT17 setup; a TOML or JSON file may override any part.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub naming: NamingConfig,
    #[serde(default)]
    pub vocab: VocabConfig,
    #[serde(default)]
    pub encode: EncodeConfig,
    #[serde(default)]
    pub binary: BinaryConfig,
    #[serde(default)]
    pub download: DownloadConfig,
}

impl PipelineConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let mut config: PipelineConfig = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&contents)?,
            Some("toml") | Some("tml") | None => toml::from_str(&contents)?,
            Some(other) => {
                return Err(PipelineError::ConfigFormat(format!(
                    "unsupported configuration extension '{}'",
                    other
                )));
            }
        };

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        config.apply_base_path(base_dir);
        config.validate()?;

        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        Self::from_path(path)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        let mut errors = Vec::new();

        if self.paths.data_dir.as_os_str().is_empty() {
            errors.push("paths.data_dir must not be empty".to_string());
        }

        if self.paths.raw_dir.as_os_str().is_empty() {
            errors.push("paths.raw_dir must not be empty".to_string());
        }

        if self.sources.train.is_empty() {
            errors.push("sources.train must not be empty".to_string());
        }

        if self.sources.eval.is_empty() {
            errors.push("sources.eval must not be empty".to_string());
        }

        for (field, sources) in [
            ("sources.train", &self.sources.train),
            ("sources.eval", &self.sources.eval),
        ] {
            for (index, source) in sources.iter().enumerate() {
                if source.archive_name().is_err() {
                    errors.push(format!(
                        "{field}[{index}].url '{}' has no file name",
                        source.url
                    ));
                }
                if source.input.is_empty() || source.target.is_empty() {
                    errors.push(format!(
                        "{field}[{index}] must name both input and target files"
                    ));
                }
            }
        }

        for (field, value) in [
            ("naming.problem", &self.naming.problem),
            ("naming.compile_tag", &self.naming.compile_tag),
            ("naming.encode_tag", &self.naming.encode_tag),
            ("naming.train_tag", &self.naming.train_tag),
            ("naming.eval_tag", &self.naming.eval_tag),
            ("binary.train_prefix", &self.binary.train_prefix),
            ("binary.eval_prefix", &self.binary.eval_prefix),
        ] {
            if value.is_empty() {
                errors.push(format!("{field} must not be empty"));
            }
        }

        if self.naming.train_tag == self.naming.eval_tag {
            errors.push("naming.train_tag and naming.eval_tag must differ".to_string());
        }

        if self.binary.source_suffix.is_empty()
            || self.binary.source_suffix == self.binary.target_suffix
        {
            errors.push(
                "binary.source_suffix must be non-empty and differ from binary.target_suffix"
                    .to_string(),
            );
        }

        let special_count = SpecialTokensCfg::default().ordered().len();
        if self.vocab.size < special_count + 256 {
            errors.push(format!(
                "vocab.size must be at least {} (special tokens plus the byte alphabet)",
                special_count + 256
            ));
        }

        if self.vocab.min_frequency == 0 {
            errors.push("vocab.min_frequency must be greater than 0".to_string());
        }

        if self.vocab.max_sentence_length == 0 {
            errors.push("vocab.max_sentence_length must be greater than 0".to_string());
        }

        if let Some(0) = self.vocab.num_threads {
            errors.push("vocab.num_threads must be greater than 0".to_string());
        }

        if self.encode.progress_every == 0 {
            errors.push("encode.progress_every must be greater than 0".to_string());
        }

        if !errors.is_empty() {
            return Err(PipelineError::validation(errors));
        }

        Ok(())
    }

    fn apply_base_path(&mut self, base: &Path) {
        absolutize_in_place(&mut self.paths.data_dir, base);
        absolutize_in_place(&mut self.paths.raw_dir, base);
        if let Some(path) = self.vocab.init_vocab_file.as_mut() {
            absolutize_in_place(path, base);
        }
    }

    pub fn sources(&self, split: Split) -> &[DataSource] {
        match split {
            Split::Train => &self.sources.train,
            Split::Eval => &self.sources.eval,
        }
    }

    pub fn split_tag(&self, split: Split) -> &str {
        match split {
            Split::Train => &self.naming.train_tag,
            Split::Eval => &self.naming.eval_tag,
        }
    }

    /// `<problem>-<compile_tag>-<split_tag>`, e.g. `wmt32k-compiled-train`.
    pub fn compile_stem(&self, split: Split) -> String {
        format!(
            "{}-{}-{}",
            self.naming.problem,
            self.naming.compile_tag,
            self.split_tag(split)
        )
    }

    pub fn compiled_files(&self, split: Split) -> CompiledFileSet {
        CompiledFileSet::at(&self.paths.data_dir, &self.compile_stem(split))
    }

    /// `<problem>-<encode_tag>-<split_tag>`, e.g. `wmt32k-encoded-dev`.
    pub fn encode_stem(&self, split: Split) -> String {
        format!(
            "{}-{}-{}",
            self.naming.problem,
            self.naming.encode_tag,
            self.split_tag(split)
        )
    }

    pub fn encoded_dir(&self) -> PathBuf {
        self.paths.data_dir.join(&self.naming.utf8_subdir)
    }

    pub fn encoded_files(&self, split: Split) -> EncodedFileSet {
        EncodedFileSet::at(&self.encoded_dir(), &self.encode_stem(split))
    }

    /// `<data_dir>/<binary prefix>.<suffix>` for source and target, without
    /// the `.bin`/`.idx` extension.
    pub fn binary_prefixes(&self, split: Split) -> (PathBuf, PathBuf) {
        let prefix = match split {
            Split::Train => &self.binary.train_prefix,
            Split::Eval => &self.binary.eval_prefix,
        };
        let dir = &self.paths.data_dir;
        (
            dir.join(format!("{prefix}.{}", self.binary.source_suffix)),
            dir.join(format!("{prefix}.{}", self.binary.target_suffix)),
        )
    }

    /// `vocab.ende.<size>`, the stem shared by the tokenizer artifact and
    /// its manifest.
    pub fn vocab_stem(&self) -> String {
        format!("{}.{}", self.vocab.file_prefix, self.vocab.size)
    }

    pub fn vocab_file(&self) -> PathBuf {
        self.paths
            .data_dir
            .join(format!("{}.json", self.vocab_stem()))
    }

    /// Tokenizer configuration for training on `inputs` and storing the
    /// artifact next to the data.
    pub fn tokenizer_config(&self, inputs: Vec<PathBuf>) -> tokenizer::Config {
        let stem = self.vocab_stem();
        let mut training = TrainingCfg::new(inputs);
        training.max_sentence_length = self.vocab.max_sentence_length;
        training.num_threads = self.vocab.num_threads;

        tokenizer::Config {
            model: ModelCfg {
                vocab_size: self.vocab.size,
                min_frequency: self.vocab.min_frequency,
                dropout: None,
                special_tokens: SpecialTokensCfg::default(),
            },
            pretokenizer: ByteLevelCfg::default(),
            training: Some(training),
            artifacts: ArtifactsCfg {
                dir: self.paths.data_dir.clone(),
                tokenizer_json: PathBuf::from(format!("{stem}.json")),
                manifest: Some(PathBuf::from(format!("{stem}.manifest.json"))),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_raw_dir")]
    pub raw_dir: PathBuf,
    /// Directory levels below `raw_dir` searched for extracted files.
    #[serde(default = "default_search_depth")]
    pub search_depth: usize,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            raw_dir: default_raw_dir(),
            search_depth: default_search_depth(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_train_sources")]
    pub train: Vec<DataSource>,
    #[serde(default = "default_eval_sources")]
    pub eval: Vec<DataSource>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            train: default_train_sources(),
            eval: default_eval_sources(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    pub problem: String,
    pub compile_tag: String,
    pub encode_tag: String,
    pub train_tag: String,
    /// WMT convention: evaluation data is tagged "dev".
    pub eval_tag: String,
    pub utf8_subdir: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            problem: "wmt32k".to_string(),
            compile_tag: "compiled".to_string(),
            encode_tag: "encoded".to_string(),
            train_tag: "train".to_string(),
            eval_tag: "dev".to_string(),
            utf8_subdir: "utf8".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabConfig {
    pub size: usize,
    pub file_prefix: String,
    /// Training lines longer than this many bytes are skipped.
    pub max_sentence_length: usize,
    pub min_frequency: u32,
    pub num_threads: Option<usize>,
    /// Existing `tokenizer.json` to use instead of training one.
    pub init_vocab_file: Option<PathBuf>,
}

impl Default for VocabConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_VOCAB_SIZE,
            file_prefix: "vocab.ende".to_string(),
            max_sentence_length: TrainingCfg::DEFAULT_MAX_SENTENCE_LENGTH,
            min_frequency: 2,
            num_threads: None,
            init_vocab_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeConfig {
    pub progress_every: usize,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            progress_every: DEFAULT_PROGRESS_EVERY,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BinaryConfig {
    pub train_prefix: String,
    pub eval_prefix: String,
    pub source_suffix: String,
    pub target_suffix: String,
    pub element_type: ElementType,
}

impl Default for BinaryConfig {
    fn default() -> Self {
        Self {
            train_prefix: "train.en-de".to_string(),
            eval_prefix: "valid.en-de".to_string(),
            source_suffix: "en".to_string(),
            target_suffix: "de".to_string(),
            element_type: ElementType::I32,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub show_progress: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            show_progress: true,
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

fn default_raw_dir() -> PathBuf {
    PathBuf::from(DEFAULT_RAW_DIR)
}

fn default_search_depth() -> usize {
    DEFAULT_SEARCH_DEPTH
}

fn default_train_sources() -> Vec<DataSource> {
    vec![
        DataSource::new(
            "http://data.statmt.org/wmt17/translation-task/training-parallel-nc-v12.tgz",
            "news-commentary-v12.de-en.en",
            "news-commentary-v12.de-en.de",
        ),
        DataSource::new(
            "http://www.statmt.org/wmt13/training-parallel-commoncrawl.tgz",
            "commoncrawl.de-en.en",
            "commoncrawl.de-en.de",
        ),
        DataSource::new(
            "http://www.statmt.org/wmt13/training-parallel-europarl-v7.tgz",
            "europarl-v7.de-en.en",
            "europarl-v7.de-en.de",
        ),
    ]
}

fn default_eval_sources() -> Vec<DataSource> {
    vec![DataSource::new(
        "http://data.statmt.org/wmt17/translation-task/dev.tgz",
        "newstest2013.en",
        "newstest2013.de",
    )]
}

fn absolutize_in_place(path: &mut PathBuf, base: &Path) {
    if path.is_relative() {
        *path = base.join(&*path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_reproduce_wmt17_setup() {
        let config = PipelineConfig::default();
        assert_eq!(config.sources.train.len(), 3);
        assert_eq!(config.sources.train[1].input, "commoncrawl.de-en.en");
        assert_eq!(config.sources.eval[0].target, "newstest2013.de");
        assert_eq!(config.vocab.size, 33_708);
        assert_eq!(config.vocab.max_sentence_length, 327_680);
        assert_eq!(config.paths.data_dir, PathBuf::from("/tmp/translate_ende"));
        assert_eq!(config.paths.search_depth, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn derived_names_follow_conventions() {
        let config = PipelineConfig::default();
        let data = PathBuf::from("/tmp/translate_ende");

        assert_eq!(
            config.compiled_files(Split::Train).input,
            data.join("wmt32k-compiled-train.lang1")
        );
        assert_eq!(
            config.encoded_files(Split::Eval).target,
            data.join("utf8").join("wmt32k-encoded-dev.dst")
        );
        assert_eq!(
            config.binary_prefixes(Split::Eval),
            (data.join("valid.en-de.en"), data.join("valid.en-de.de"))
        );
        assert_eq!(config.vocab_file(), data.join("vocab.ende.33708.json"));
    }

    #[test]
    fn validation_collects_every_problem() {
        let mut config = PipelineConfig::default();
        config.sources.eval.clear();
        config.vocab.size = 10;
        config.encode.progress_every = 0;
        config.naming.eval_tag = config.naming.train_tag.clone();

        match config.validate() {
            Err(PipelineError::Validation(messages)) => {
                assert_eq!(messages.len(), 4, "{messages:?}");
                assert!(messages.iter().any(|m| m.contains("sources.eval")));
                assert!(messages.iter().any(|m| m.contains("vocab.size")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn tokenizer_config_places_artifacts_in_data_dir() {
        let config = PipelineConfig::default();
        let cfg = config.tokenizer_config(vec![PathBuf::from("a.lang1")]);
        assert_eq!(cfg.model.vocab_size, 33_708);
        assert_eq!(cfg.artifacts.dir, PathBuf::from("/tmp/translate_ende"));
        assert_eq!(cfg.artifacts.tokenizer_json, PathBuf::from("vocab.ende.33708.json"));
        assert_eq!(
            cfg.artifacts.manifest,
            Some(PathBuf::from("vocab.ende.33708.manifest.json"))
        );
        assert_eq!(cfg.training.unwrap().max_sentence_length, 327_680);
    }
}
