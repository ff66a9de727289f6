use std::fs;
use std::path::{Path, PathBuf};

use indexed_dataset::{binarize_text_file, BinarizeSummary};
use parallel_corpus::{compile_files, CompileSummary, Downloader, Fetcher, RawFileSet};
use tokenizer::{SubwordModel, SubwordTokenizer};

use crate::config::{PipelineConfig, Split};
use crate::encode::{encode_and_save_files, EncodeOutcome};
use crate::error::PipelineError;

const STEPS: usize = 5;

/// Outputs of one split.
#[derive(Debug, Clone)]
pub struct SplitReport {
    pub split: Split,
    pub raw: RawFileSet,
    pub compiled: CompileSummary,
    pub encoded: EncodeOutcome,
    pub source_binary: BinarizeSummary,
    pub target_binary: BinarizeSummary,
}

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub vocab_file: PathBuf,
    pub vocab_size: usize,
    pub splits: Vec<SplitReport>,
}

/// Runs fetch, compile, vocabulary, encode and binarize in order for the
/// training and evaluation splits.
pub struct Pipeline<D> {
    config: PipelineConfig,
    fetcher: Fetcher<D>,
}

impl<D: Downloader> Pipeline<D> {
    pub fn new(config: PipelineConfig, downloader: D) -> Self {
        let fetcher = Fetcher::new(config.paths.raw_dir.clone(), downloader)
            .with_search_depth(config.paths.search_depth);
        Self { config, fetcher }
    }

    pub fn run(&self) -> Result<PipelineReport, PipelineError> {
        make_dir(&self.config.paths.data_dir)?;
        make_dir(&self.config.encoded_dir())?;

        step(1, "Downloading data from source");
        let train_raw = self.fetch(Split::Train)?;
        let eval_raw = self.fetch(Split::Eval)?;

        step(2, "Compiling training and evaluation data");
        let train_compiled = self.compile(Split::Train, &train_raw)?;
        let eval_compiled = self.compile(Split::Eval, &eval_raw)?;

        step(3, "Creating tokenizer and building vocabulary");
        let (tokenizer, vocab_file) = self.tokenizer(&train_compiled)?;

        step(4, "Preprocessing and saving data");
        let train_encoded = self.encode(&tokenizer, Split::Train)?;
        let eval_encoded = self.encode(&tokenizer, Split::Eval)?;

        step(5, "Binarizing encoded data");
        let mut splits = Vec::with_capacity(2);
        for (split, raw, compiled, encoded) in [
            (Split::Train, train_raw, train_compiled, train_encoded),
            (Split::Eval, eval_raw, eval_compiled, eval_encoded),
        ] {
            let (source_binary, target_binary) = self.binarize(split, &encoded)?;
            splits.push(SplitReport {
                split,
                raw,
                compiled,
                encoded,
                source_binary,
                target_binary,
            });
        }

        Ok(PipelineReport {
            vocab_file,
            vocab_size: tokenizer.vocab_size(),
            splits,
        })
    }

    pub fn fetch(&self, split: Split) -> Result<RawFileSet, PipelineError> {
        Ok(self.fetcher.raw_files(self.config.sources(split))?)
    }

    pub fn compile(&self, split: Split, raw: &RawFileSet) -> Result<CompileSummary, PipelineError> {
        Ok(compile_files(
            &self.config.paths.data_dir,
            raw,
            &self.config.compile_stem(split),
        )?)
    }

    /// Uses `vocab.init_vocab_file` when set, otherwise reuses a tokenizer
    /// trained from the same configuration or trains a new one on the
    /// compiled training text.
    pub fn tokenizer(
        &self,
        train: &CompileSummary,
    ) -> Result<(SubwordModel, PathBuf), PipelineError> {
        if let Some(path) = self.config.vocab.init_vocab_file.as_ref() {
            log::info!("Loading predefined vocabulary from {}", path.display());
            return Ok((SubwordModel::from_file(path)?, path.clone()));
        }

        let inputs = train.files.paths().iter().map(|p| p.to_path_buf()).collect();
        let cfg = self.config.tokenizer_config(inputs);
        let vocab_file = self.config.vocab_file();

        let model = if tokenizer::is_trained(&cfg)? {
            log::info!("Reusing vocabulary {}", vocab_file.display());
            tokenizer::load_subword(&cfg)?
        } else {
            tokenizer::train_subword(&cfg)?
        };
        log::info!(
            "Vocabulary has {} tokens (eos id {})",
            model.vocab_size(),
            model.eos_id()
        );
        Ok((model, vocab_file))
    }

    pub fn encode<T: SubwordTokenizer + ?Sized>(
        &self,
        tokenizer: &T,
        split: Split,
    ) -> Result<EncodeOutcome, PipelineError> {
        encode_and_save_files(
            tokenizer,
            &self.config.encoded_dir(),
            &self.config.compiled_files(split),
            &self.config.encode_stem(split),
            self.config.encode.progress_every,
        )
    }

    /// Always rebuilds both datasets of the split.
    pub fn binarize(
        &self,
        split: Split,
        encoded: &EncodeOutcome,
    ) -> Result<(BinarizeSummary, BinarizeSummary), PipelineError> {
        let (source_prefix, target_prefix) = self.config.binary_prefixes(split);
        let element = self.config.binary.element_type;
        let source = binarize_text_file(&encoded.files.source, &source_prefix, element)?;
        let target = binarize_text_file(&encoded.files.target, &target_prefix, element)?;
        Ok((source, target))
    }
}

fn step(index: usize, description: &str) {
    log::info!("Step {}/{}: {}", index, STEPS, description);
}

fn make_dir(path: &Path) -> Result<(), PipelineError> {
    if !path.exists() {
        log::info!("Creating directory {}", path.display());
        fs::create_dir_all(path)?;
    }
    Ok(())
}
