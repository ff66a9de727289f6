use crate::config::ByteLevelCfg;
use tokenizers::decoders::byte_level::ByteLevel as ByteLevelDecoder;
use tokenizers::pre_tokenizers::byte_level::ByteLevel;

pub fn build_byte_level(cfg: &ByteLevelCfg) -> ByteLevel {
    ByteLevel::new(cfg.add_prefix_space, cfg.trim_offsets, cfg.use_regex)
}

pub fn build_byte_level_decoder() -> ByteLevelDecoder {
    ByteLevelDecoder::default()
}
