use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub model: ModelCfg,
    pub pretokenizer: ByteLevelCfg,
    #[cfg(feature = "train")]
    pub training: Option<TrainingCfg>,
    pub artifacts: ArtifactsCfg,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCfg {
    /// Target vocabulary size, special tokens included.
    pub vocab_size: usize,
    pub min_frequency: u32,
    pub dropout: Option<f32>,
    pub special_tokens: SpecialTokensCfg,
}

/// Reserved tokens. They are registered in the order pad, eos, unk, bos so
/// their ids are 0, 1, 2 and (when present) 3.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialTokensCfg {
    pub pad: String,
    pub eos: String,
    pub unk: String,
    #[serde(default)]
    pub bos: Option<String>,
}

impl Default for SpecialTokensCfg {
    fn default() -> Self {
        Self {
            pad: "<pad>".to_string(),
            eos: "</s>".to_string(),
            unk: "<unk>".to_string(),
            bos: None,
        }
    }
}

impl SpecialTokensCfg {
    pub fn ordered(&self) -> Vec<&str> {
        let mut tokens = vec![self.pad.as_str(), self.eos.as_str(), self.unk.as_str()];
        if let Some(bos) = self.bos.as_deref() {
            tokens.push(bos);
        }
        tokens
    }

    pub const PAD_ID: u32 = 0;
    pub const EOS_ID: u32 = 1;
    pub const UNK_ID: u32 = 2;
    pub const BOS_ID: u32 = 3;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ByteLevelCfg {
    pub add_prefix_space: bool,
    pub trim_offsets: bool,
    pub use_regex: bool,
}

impl Default for ByteLevelCfg {
    fn default() -> Self {
        Self {
            add_prefix_space: true,
            trim_offsets: true,
            use_regex: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactsCfg {
    pub dir: PathBuf,
    pub tokenizer_json: PathBuf,
    pub manifest: Option<PathBuf>,
}

#[cfg(feature = "train")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingCfg {
    pub inputs: Vec<PathBuf>,
    /// Lines longer than this many bytes are left out of training.
    pub max_sentence_length: usize,
    pub max_lines: Option<usize>,
    pub shuffle: bool,
    pub seed: u64,
    pub num_threads: Option<usize>,
}

#[cfg(feature = "train")]
impl TrainingCfg {
    pub const DEFAULT_MAX_SENTENCE_LENGTH: usize = 327_680;

    pub fn new(inputs: Vec<PathBuf>) -> Self {
        Self {
            inputs,
            max_sentence_length: Self::DEFAULT_MAX_SENTENCE_LENGTH,
            max_lines: None,
            shuffle: false,
            seed: 0,
            num_threads: None,
        }
    }
}
