#![cfg(feature = "train")]

use std::fs;
use std::path::Path;

use serde_json::Value;
use tokenizer::errors::Result;
use tokenizer::{
    is_trained, load_subword, read_manifest, train_subword, ArtifactsCfg, ByteLevelCfg, Config,
    Error, ModelCfg, SpecialTokensCfg, SubwordModel, SubwordTokenizer, TrainingCfg,
};

const CORPUS: &str = "byte level test\nUnicode ☂ sample\n spaced input \nemoji 😊 alignment\n\
the quick brown fox jumps over the lazy dog\nder schnelle braune Fuchs springt über den faulen Hund\n";

const SAMPLE_INPUTS: [&str; 4] = [
    "byte level test",
    "Unicode ☂ sample",
    " spaced input ",
    "emoji 😊 alignment",
];

#[test]
fn save_and_reload_tokenizer_json() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let cfg = config_for_serialization(tmp.path())?;
    let trained = train_subword(&cfg)?;

    let tokenizer_path = tmp.path().join("vocab.json");
    assert!(tokenizer_path.is_file(), "tokenizer json should exist after training");

    let loaded = load_subword(&cfg)?;
    assert_models_equivalent(&trained, &loaded, &SAMPLE_INPUTS)?;

    let from_file = SubwordModel::from_file(&tokenizer_path)?;
    assert_models_equivalent(&trained, &from_file, &SAMPLE_INPUTS)?;

    Ok(())
}

#[test]
fn manifest_describes_the_artifact() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let cfg = config_for_serialization(tmp.path())?;
    let model = train_subword(&cfg)?;

    let raw = fs::read_to_string(tmp.path().join("vocab.manifest.json"))?;
    let value: Value = serde_json::from_str(&raw)?;
    for key in ["cfg_hash", "tokenizer_sha256", "created_at", "token_count"] {
        assert!(value.get(key).is_some(), "manifest missing {key}");
    }

    let manifest = read_manifest(&cfg)?;
    assert_eq!(manifest.token_count, model.vocab_size());
    assert_eq!(manifest.cfg_hash.len(), 64);
    assert!(manifest.created_at.starts_with("unix:"));

    Ok(())
}

#[test]
fn is_trained_tracks_config_and_artifact() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let cfg = config_for_serialization(tmp.path())?;
    assert!(!is_trained(&cfg)?);

    train_subword(&cfg)?;
    assert!(is_trained(&cfg)?);

    let mut resized = cfg.clone();
    resized.model.vocab_size += 10;
    assert!(!is_trained(&resized)?);

    let mut without_manifest = cfg.clone();
    without_manifest.artifacts.manifest = None;
    assert!(!is_trained(&without_manifest)?);

    let json_path = tmp.path().join("vocab.json");
    let mut contents = fs::read_to_string(&json_path)?;
    contents.push('\n');
    fs::write(&json_path, contents)?;
    assert!(!is_trained(&cfg)?);

    Ok(())
}

#[test]
fn load_rejects_a_different_special_layout() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let cfg = config_for_serialization(tmp.path())?;
    train_subword(&cfg)?;

    let mut swapped = cfg.clone();
    swapped.model.special_tokens = SpecialTokensCfg {
        pad: "<pad>".into(),
        eos: "<unk>".into(),
        unk: "</s>".into(),
        bos: None,
    };

    match load_subword(&swapped) {
        Err(Error::SpecialTokenId {
            token,
            expected,
            actual,
        }) => {
            assert_eq!(token, "<unk>");
            assert_eq!(expected, 1);
            assert_eq!(actual, Some(2));
        }
        other => panic!("expected special token error, got {other:?}"),
    }

    Ok(())
}

#[test]
fn missing_artifact_is_an_error() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let cfg = config_for_serialization(tmp.path())?;

    assert!(matches!(load_subword(&cfg), Err(Error::Artifact(_))));
    assert!(matches!(
        SubwordModel::from_file(tmp.path().join("absent.json")),
        Err(Error::Artifact(_))
    ));

    Ok(())
}

#[test]
fn undersized_vocabulary_is_rejected_before_training() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let mut cfg = config_for_serialization(tmp.path())?;
    cfg.model.vocab_size = 100;

    assert!(matches!(train_subword(&cfg), Err(Error::Validation(_))));
    assert!(!tmp.path().join("vocab.json").exists());

    Ok(())
}

fn assert_models_equivalent(
    left: &SubwordModel,
    right: &SubwordModel,
    samples: &[&str],
) -> Result<()> {
    assert_eq!(left.vocab_size(), right.vocab_size());
    for sample in samples {
        assert_eq!(
            left.encode_as_ids(sample)?,
            right.encode_as_ids(sample)?,
            "encodings differ for {sample:?}"
        );
    }
    Ok(())
}

fn config_for_serialization(tmp: &Path) -> Result<Config> {
    let corpus = tmp.join("corpus.txt");
    fs::write(&corpus, CORPUS)?;

    Ok(Config {
        model: ModelCfg {
            vocab_size: 290,
            min_frequency: 1,
            dropout: None,
            special_tokens: SpecialTokensCfg::default(),
        },
        pretokenizer: ByteLevelCfg::default(),
        training: Some(TrainingCfg {
            num_threads: Some(1),
            ..TrainingCfg::new(vec![corpus])
        }),
        artifacts: ArtifactsCfg {
            dir: tmp.to_path_buf(),
            tokenizer_json: "vocab.json".into(),
            manifest: Some("vocab.manifest.json".into()),
        },
    })
}
