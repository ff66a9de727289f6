//! Subword vocabulary training and loading for the translation pipeline.
//!
//! The model is byte-level BPE built on the `tokenizers` crate: raw text is
//! split by a configurable byte-level pre-tokenizer and merged by a BPE model
//! whose alphabet covers every byte, so no input is unrepresentable.
//!
//! # Special tokens
//!
//! Special tokens are registered ahead of everything else in the order
//! pad, eos, unk and optionally bos, giving them ids 0, 1, 2 and 3. Both
//! training and loading reject a tokenizer whose layout differs.
//!
//! # Artifacts
//!
//! Training writes a single `tokenizer.json` and, when configured, a JSON
//! manifest holding a hash of the configuration and of the artifact. A later
//! run uses [`is_trained`] to reuse the artifact instead of retraining.
//!
//! # Training Feature
//!
//! Enabling the `train` feature unlocks [`train_subword`]. Otherwise only
//! artifact loading is available.

pub mod config;
pub mod errors;

mod artifacts;
mod bbpe;
mod pretokenizer;
mod subword;
mod types;
mod validate;
#[cfg(feature = "train")]
mod trainer;

#[cfg(feature = "train")]
pub use config::TrainingCfg;
pub use config::{ArtifactsCfg, ByteLevelCfg, Config, ModelCfg, SpecialTokensCfg};
pub use errors::{Error, Result};
pub use subword::{SubwordModel, SubwordTokenizer};
pub use types::ArtifactManifest;

/// Loads the tokenizer described by `cfg.artifacts`.
pub fn load_subword(cfg: &Config) -> Result<SubwordModel> {
    validate::validate_config(cfg)?;
    let tokenizer = bbpe::build_from_artifacts(cfg)?;
    validate::validate_tokenizer(&tokenizer, cfg)?;
    SubwordModel::new(tokenizer, &cfg.model.special_tokens)
}

#[cfg(feature = "train")]
pub fn train_subword(cfg: &Config) -> Result<SubwordModel> {
    validate::validate_config(cfg)?;
    let tokenizer = bbpe::train_and_build(cfg)?;
    validate::validate_tokenizer(&tokenizer, cfg)?;
    SubwordModel::new(tokenizer, &cfg.model.special_tokens)
}

/// Whether the artifact on disk was produced from exactly this configuration.
///
/// Requires a configured manifest; a missing or unreadable manifest, a
/// different config hash or a modified tokenizer file all count as untrained.
pub fn is_trained(cfg: &Config) -> Result<bool> {
    let paths = artifacts::resolve_paths(&cfg.artifacts);
    let Some(manifest_path) = paths.manifest else {
        return Ok(false);
    };
    if !paths.json.is_file() || !manifest_path.is_file() {
        return Ok(false);
    }

    let manifest = match artifacts::read_manifest(&manifest_path) {
        Ok(manifest) => manifest,
        Err(err) => {
            log::warn!(
                "Ignoring unreadable manifest {}: {err}",
                manifest_path.display()
            );
            return Ok(false);
        }
    };

    if manifest.cfg_hash != artifacts::compute_config_hash(cfg)? {
        log::debug!("Tokenizer config changed since {}", manifest.created_at);
        return Ok(false);
    }
    Ok(manifest.tokenizer_sha256 == artifacts::sha256_of_file(&paths.json)?)
}

/// Reads the manifest written next to a trained tokenizer.
pub fn read_manifest(cfg: &Config) -> Result<ArtifactManifest> {
    let paths = artifacts::resolve_paths(&cfg.artifacts);
    let manifest_path = paths
        .manifest
        .ok_or(Error::InvalidConfig("artifacts.manifest is not set"))?;
    artifacts::read_manifest(&manifest_path)
}
