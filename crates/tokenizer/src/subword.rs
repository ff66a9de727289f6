use crate::config::SpecialTokensCfg;
use crate::errors::{Error, Result};
use crate::validate::validate_special_ids;
use std::path::Path;
use tokenizers::Tokenizer;

/// What the encoding stage needs from a subword model.
pub trait SubwordTokenizer {
    /// Ids for `line`, without any special tokens added.
    fn encode_as_ids(&self, line: &str) -> Result<Vec<u32>>;

    /// Id appended after every encoded line.
    fn eos_id(&self) -> u32;
}

impl<T: SubwordTokenizer + ?Sized> SubwordTokenizer for &T {
    fn encode_as_ids(&self, line: &str) -> Result<Vec<u32>> {
        (**self).encode_as_ids(line)
    }

    fn eos_id(&self) -> u32 {
        (**self).eos_id()
    }
}

/// A loaded `tokenizers` model whose special tokens sit at their reserved ids.
#[derive(Clone)]
pub struct SubwordModel {
    inner: Tokenizer,
    eos_id: u32,
}

impl SubwordModel {
    /// Wraps `tokenizer` after checking the special token layout.
    pub fn new(tokenizer: Tokenizer, specials: &SpecialTokensCfg) -> Result<Self> {
        validate_special_ids(&tokenizer, specials)?;
        Ok(Self {
            inner: tokenizer,
            eos_id: SpecialTokensCfg::EOS_ID,
        })
    }

    /// Loads a `tokenizer.json` that uses the default special tokens.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        crate::artifacts::ensure_file(path, "tokenizer json not found at")?;
        let tokenizer = Tokenizer::from_file(path)?;
        Self::new(tokenizer, &SpecialTokensCfg::default())
    }

    pub fn decode_ids(&self, ids: &[u32]) -> Result<String> {
        self.inner.decode(ids, true).map_err(Error::from)
    }

    pub fn vocab_size(&self) -> usize {
        self.inner.get_vocab_size(true)
    }

    pub fn token_to_id(&self, token: &str) -> Option<u32> {
        self.inner.token_to_id(token)
    }

    pub fn inner(&self) -> &Tokenizer {
        &self.inner
    }
}

impl SubwordTokenizer for SubwordModel {
    fn encode_as_ids(&self, line: &str) -> Result<Vec<u32>> {
        let encoding = self.inner.encode(line, false)?;
        Ok(encoding.get_ids().to_vec())
    }

    fn eos_id(&self) -> u32 {
        self.eos_id
    }
}

impl std::fmt::Debug for SubwordModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubwordModel")
            .field("vocab_size", &self.vocab_size())
            .field("eos_id", &self.eos_id)
            .finish()
    }
}
