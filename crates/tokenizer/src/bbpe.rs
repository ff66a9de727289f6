use crate::artifacts::{load_tokenizer_from_json, resolve_paths};
use crate::config::Config;
use crate::errors::Result;
use crate::pretokenizer::{build_byte_level, build_byte_level_decoder};
use tokenizers::models::ModelWrapper;
use tokenizers::Tokenizer;

pub fn build_from_artifacts(cfg: &Config) -> Result<Tokenizer> {
    let paths = resolve_paths(&cfg.artifacts);
    let mut tokenizer = load_tokenizer_from_json(&paths.json)?;

    if let ModelWrapper::BPE(bpe) = tokenizer.get_model() {
        let mut bpe = bpe.clone();
        bpe.dropout = cfg.model.dropout;
        tokenizer.with_model(bpe);
    }

    tokenizer.with_pre_tokenizer(Some(build_byte_level(&cfg.pretokenizer)));
    tokenizer.with_decoder(Some(build_byte_level_decoder()));

    ensure_send_sync(&tokenizer);

    Ok(tokenizer)
}

#[cfg(feature = "train")]
pub fn train_and_build(cfg: &Config) -> Result<Tokenizer> {
    let tokenizer = crate::trainer::train_from_corpus(cfg)?;
    ensure_send_sync(&tokenizer);
    Ok(tokenizer)
}

fn ensure_send_sync<T: Send + Sync>(_: &T) {}
