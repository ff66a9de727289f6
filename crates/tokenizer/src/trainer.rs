#![cfg(feature = "train")]

use crate::artifacts::{
    compute_config_hash, resolve_paths, save_tokenizer_json, sha256_of_file, write_manifest,
};
use crate::config::{Config, TrainingCfg};
use crate::errors::{Error, Result};
use crate::pretokenizer::{build_byte_level, build_byte_level_decoder};
use crate::types::ArtifactManifest;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tokenizers::models::bpe::{BpeTrainer, BPE};
use tokenizers::models::{ModelWrapper, TrainerWrapper};
use tokenizers::pre_tokenizers::byte_level::ByteLevel;
use tokenizers::tokenizer::AddedToken;
use tokenizers::Tokenizer;

const SHUFFLE_CHUNK_SIZE: usize = 2048;

/// Trains a byte-level BPE model on the configured corpora and writes the
/// tokenizer JSON (and manifest, when configured) under the artifact dir.
pub fn train_from_corpus(cfg: &Config) -> Result<Tokenizer> {
    let training_cfg = cfg.training.as_ref().ok_or(Error::InvalidConfig(
        "training section required when feature=\"train\"",
    ))?;

    for path in &training_cfg.inputs {
        if !path.is_file() {
            return Err(Error::Artifact(format!(
                "training input not found at {}",
                path.display()
            )));
        }
    }

    if let Some(num_threads) = training_cfg.num_threads {
        std::env::set_var("RAYON_NUM_THREADS", num_threads.to_string());
        tokenizers::utils::parallelism::set_parallelism(num_threads > 1);
    }

    log::info!(
        "Training subword vocabulary of size {} on {} file(s)",
        cfg.model.vocab_size,
        training_cfg.inputs.len()
    );

    let mut tokenizer = Tokenizer::new(BPE::default());
    tokenizer.with_pre_tokenizer(Some(build_byte_level(&cfg.pretokenizer)));
    tokenizer.with_decoder(Some(build_byte_level_decoder()));

    let special_tokens: Vec<AddedToken> = cfg
        .model
        .special_tokens
        .ordered()
        .into_iter()
        .map(|token| AddedToken::from(token.to_string(), true))
        .collect();

    let mut trainer: TrainerWrapper = BpeTrainer::builder()
        .vocab_size(cfg.model.vocab_size)
        .min_frequency(cfg.model.min_frequency.into())
        .show_progress(false)
        .special_tokens(special_tokens)
        .initial_alphabet(ByteLevel::alphabet())
        .build()
        .into();

    let mut corpus = CorpusIterator::new(training_cfg);
    tokenizer.train(&mut trainer, corpus.by_ref())?;

    if let Some(err) = corpus.take_error() {
        return Err(err);
    }
    log::debug!(
        "Trained on {} lines ({} skipped as longer than {} bytes)",
        corpus.produced,
        corpus.skipped_long,
        training_cfg.max_sentence_length
    );

    let mut model = match tokenizer.get_model() {
        ModelWrapper::BPE(bpe) => bpe.clone(),
        _ => unreachable!("trainer operates on BPE model"),
    };
    model.dropout = cfg.model.dropout;
    model.unk_token = Some(cfg.model.special_tokens.unk.clone());
    tokenizer.with_model(model);

    let paths = resolve_paths(&cfg.artifacts);
    if !cfg.artifacts.dir.exists() {
        std::fs::create_dir_all(&cfg.artifacts.dir)?;
    }
    save_tokenizer_json(&tokenizer, &paths.json)?;
    log::info!("Saved tokenizer to {}", paths.json.display());

    if let Some(manifest_path) = paths.manifest {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| Error::Artifact(format!("failed to compute timestamp: {e}")))?
            .as_secs();
        let manifest = ArtifactManifest {
            cfg_hash: compute_config_hash(cfg)?,
            tokenizer_sha256: sha256_of_file(&paths.json)?,
            created_at: format!("unix:{created_at}"),
            token_count: tokenizer.get_vocab_size(true),
        };
        write_manifest(&manifest_path, &manifest)?;
    }

    Ok(tokenizer)
}

/// Streams trimmed, non-empty lines from the training inputs, optionally
/// shuffling files and fixed-size chunks of lines with a seeded RNG.
struct CorpusIterator {
    files: VecDeque<PathBuf>,
    current: Option<BufReader<File>>,
    buffer: VecDeque<String>,
    rng: Option<StdRng>,
    max_lines: Option<usize>,
    max_sentence_length: usize,
    produced: usize,
    skipped_long: usize,
    error: Option<Error>,
}

impl CorpusIterator {
    fn new(cfg: &TrainingCfg) -> Self {
        let mut inputs = cfg.inputs.clone();
        let rng = if cfg.shuffle {
            let mut rng = StdRng::seed_from_u64(cfg.seed);
            inputs.shuffle(&mut rng);
            Some(rng)
        } else {
            None
        };

        Self {
            files: VecDeque::from(inputs),
            current: None,
            buffer: VecDeque::new(),
            rng,
            max_lines: cfg.max_lines,
            max_sentence_length: cfg.max_sentence_length,
            produced: 0,
            skipped_long: 0,
            error: None,
        }
    }

    fn take_error(&mut self) -> Option<Error> {
        self.error.take()
    }

    fn refill(&mut self) -> Result<bool> {
        while self.buffer.is_empty() {
            if self.should_finish() {
                return Ok(false);
            }

            if self.current.is_none() {
                let next = match self.files.pop_front() {
                    Some(path) => path,
                    None => return Ok(false),
                };
                log::debug!("Reading training input {}", next.display());
                self.current = Some(BufReader::new(File::open(&next)?));
            }
            let reader = match self.current.as_mut() {
                Some(reader) => reader,
                None => return Ok(false),
            };

            let mut batch = Vec::with_capacity(SHUFFLE_CHUNK_SIZE);
            let mut exhausted = false;
            while batch.len() < SHUFFLE_CHUNK_SIZE {
                let mut raw = Vec::new();
                if reader.read_until(b'\n', &mut raw)? == 0 {
                    exhausted = true;
                    break;
                }
                let line = String::from_utf8_lossy(&raw).trim().to_string();
                if line.is_empty() {
                    continue;
                }
                if line.len() > self.max_sentence_length {
                    self.skipped_long += 1;
                    continue;
                }

                batch.push(line);

                let limit_hit = self
                    .max_lines
                    .map_or(false, |limit| self.produced + batch.len() >= limit);
                if limit_hit {
                    break;
                }
            }
            if exhausted {
                self.current = None;
            }

            if let Some(rng) = self.rng.as_mut() {
                batch.shuffle(rng);
            }
            self.buffer.extend(batch);
        }

        Ok(true)
    }

    fn should_finish(&self) -> bool {
        match self.max_lines {
            Some(limit) => self.produced >= limit,
            None => false,
        }
    }
}

impl Iterator for CorpusIterator {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        if self.error.is_some() || self.should_finish() {
            return None;
        }

        match self.refill() {
            Ok(true) => {
                let line = self.buffer.pop_front()?;
                self.produced += 1;
                Some(line)
            }
            Ok(false) => None,
            Err(err) => {
                self.error = Some(err);
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .max_lines
            .map(|limit| limit.saturating_sub(self.produced));
        (0, remaining)
    }
}
