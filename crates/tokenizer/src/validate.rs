use crate::config::{Config, SpecialTokensCfg};
use crate::errors::{Error, Result};
use std::collections::HashSet;
use std::path::Path;
use tokenizers::Tokenizer;

/// Size of the byte-level alphabet every trained vocabulary starts from.
#[cfg(feature = "train")]
pub const BYTE_ALPHABET_SIZE: usize = 256;

pub fn validate_config(cfg: &Config) -> Result<()> {
    if cfg.model.vocab_size == 0 {
        return Err(Error::Validation(
            "model.vocab_size must be greater than zero".into(),
        ));
    }

    if cfg.model.min_frequency < 1 {
        return Err(Error::Validation(
            "model.min_frequency must be at least 1".into(),
        ));
    }

    if let Some(dropout) = cfg.model.dropout {
        if !(dropout > 0.0 && dropout <= 1.0) {
            return Err(Error::Validation(format!(
                "model.dropout must be in (0, 1], got {dropout}"
            )));
        }
    }

    let specials = cfg.model.special_tokens.ordered();
    let mut seen = HashSet::new();
    for token in &specials {
        if token.is_empty() {
            return Err(Error::Validation("special tokens must not be empty".into()));
        }
        if !seen.insert(*token) {
            return Err(Error::Validation(format!(
                "special token '{token}' appears multiple times"
            )));
        }
    }

    validate_training(cfg, specials.len())?;

    ensure_directory_creatable(cfg.artifacts.dir.as_path())
}

#[cfg(feature = "train")]
fn validate_training(cfg: &Config, special_count: usize) -> Result<()> {
    let Some(training) = cfg.training.as_ref() else {
        return Ok(());
    };

    let minimum = special_count + BYTE_ALPHABET_SIZE;
    if cfg.model.vocab_size < minimum {
        return Err(Error::Validation(format!(
            "model.vocab_size {} leaves no room for merges (minimum {minimum})",
            cfg.model.vocab_size
        )));
    }
    if training.inputs.is_empty() {
        return Err(Error::InvalidConfig(
            "training inputs must contain at least one path",
        ));
    }
    if training.max_sentence_length == 0 {
        return Err(Error::Validation(
            "training.max_sentence_length must be greater than zero".into(),
        ));
    }
    Ok(())
}

#[cfg(not(feature = "train"))]
fn validate_training(_cfg: &Config, _special_count: usize) -> Result<()> {
    Ok(())
}

pub fn validate_tokenizer(tok: &Tokenizer, cfg: &Config) -> Result<()> {
    validate_special_ids(tok, &cfg.model.special_tokens)?;

    let actual_size = tok.get_vocab_size(true);
    if actual_size > cfg.model.vocab_size {
        return Err(Error::Validation(format!(
            "tokenizer vocab size {actual_size} exceeds configured limit {}",
            cfg.model.vocab_size
        )));
    }

    Ok(())
}

/// Every special token must sit at its reserved id.
pub fn validate_special_ids(tok: &Tokenizer, specials: &SpecialTokensCfg) -> Result<()> {
    for (expected, token) in specials.ordered().into_iter().enumerate() {
        let expected = expected as u32;
        let actual = tok.token_to_id(token);
        if actual != Some(expected) {
            return Err(Error::SpecialTokenId {
                token: token.to_string(),
                expected,
                actual,
            });
        }
    }
    Ok(())
}

fn ensure_directory_creatable(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }

    if dir.exists() {
        return Err(Error::Validation(format!(
            "artifact directory path '{}' exists but is not a directory",
            dir.display()
        )));
    }

    // Missing ancestors are created along with the directory itself.
    let mut ancestor = dir.parent();
    while let Some(parent) = ancestor {
        if parent.as_os_str().is_empty() || parent.is_dir() {
            return Ok(());
        }
        if parent.exists() {
            return Err(Error::Validation(format!(
                "artifact directory ancestor '{}' is not a directory",
                parent.display()
            )));
        }
        ancestor = parent.parent();
    }

    Ok(())
}
