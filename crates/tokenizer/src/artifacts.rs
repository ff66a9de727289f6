use crate::config::{ArtifactsCfg, Config};
use crate::errors::{Error, Result};
use crate::types::{ArtifactManifest, ArtifactPaths};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;

const TOKENIZER_JSON_ERR: &str = "tokenizer json not found at";
const MANIFEST_ERR: &str = "manifest not found at";

pub fn load_tokenizer_from_json(path: &Path) -> Result<Tokenizer> {
    ensure_file(path, TOKENIZER_JSON_ERR)?;
    Tokenizer::from_file(path).map_err(Error::from)
}

pub fn save_tokenizer_json(tok: &Tokenizer, path: &Path) -> Result<()> {
    create_parent(path)?;
    tok.save(path, false).map_err(Error::from)
}

pub fn write_manifest(manifest_path: &Path, manifest: &ArtifactManifest) -> Result<()> {
    create_parent(manifest_path)?;

    let file = File::create(manifest_path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, manifest)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

pub fn read_manifest(manifest_path: &Path) -> Result<ArtifactManifest> {
    ensure_file(manifest_path, MANIFEST_ERR)?;
    let file = File::open(manifest_path)?;
    let reader = BufReader::new(file);
    let manifest = serde_json::from_reader(reader)?;
    Ok(manifest)
}

/// Hash of the serialized configuration. Training inputs enter the hash by
/// path only; their contents are covered by the pipeline rebuilding them.
pub fn compute_config_hash(cfg: &Config) -> Result<String> {
    let cfg_bytes = serde_json::to_vec(cfg)?;
    let mut hasher = Sha256::new();
    hasher.update(&cfg_bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

pub fn sha256_of_file(path: &Path) -> Result<String> {
    ensure_file(path, "cannot hash missing file at")?;
    let mut hasher = Sha256::new();
    let mut reader = BufReader::new(File::open(path)?);
    let mut buffer = [0u8; 8 * 1024];

    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Joins relative artifact paths onto `cfg.dir`. Nothing is checked for
/// existence here.
pub fn resolve_paths(cfg: &ArtifactsCfg) -> ArtifactPaths {
    let dir = cfg.dir.as_path();
    ArtifactPaths {
        json: absolute_in_dir(dir, &cfg.tokenizer_json),
        manifest: cfg
            .manifest
            .as_deref()
            .map(|path| absolute_in_dir(dir, path)),
    }
}

pub fn absolute_in_dir(dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() || path.starts_with(dir) {
        path.to_path_buf()
    } else {
        dir.join(path)
    }
}

pub fn ensure_file(path: &Path, context: &str) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(Error::Artifact(format!("{context} {}", path.display())))
    }
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
