use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Written next to a trained tokenizer so a later run can tell whether the
/// artifact on disk still matches its configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub cfg_hash: String,
    pub tokenizer_sha256: String,
    pub created_at: String,
    pub token_count: usize,
}

#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub json: PathBuf,
    pub manifest: Option<PathBuf>,
}
