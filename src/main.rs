use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use parallel_corpus::HttpDownloader;
use translate_data::{Pipeline, PipelineConfig};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Download and preprocess WMT17 en-de training and evaluation data",
    long_about = None
)]
struct Args {
    #[arg(
        long = "data_dir",
        visible_alias = "dd",
        value_name = "DIR",
        help = "Directory where the processed dataset is saved [default: /tmp/translate_ende]"
    )]
    data_dir: Option<PathBuf>,

    #[arg(
        long = "raw_dir",
        visible_alias = "rd",
        value_name = "DIR",
        help = "Directory where raw archives are downloaded and extracted [default: /tmp/translate_ende_raw]"
    )]
    raw_dir: Option<PathBuf>,

    #[arg(
        long,
        help = "Search for the vocabulary closest to the target size (not supported, ignored)"
    )]
    search: bool,

    #[arg(
        long = "init_vocab_file",
        value_name = "PATH",
        help = "Existing tokenizer.json to use instead of training a vocabulary"
    )]
    init_vocab_file: Option<PathBuf>,

    #[arg(
        short,
        long,
        value_name = "PATH",
        help = "Pipeline config file (TOML or JSON)"
    )]
    config: Option<PathBuf>,

    #[arg(long = "vocab_size", value_name = "N", help = "Target vocabulary size")]
    vocab_size: Option<usize>,

    #[arg(long, help = "Hide download progress bars")]
    no_progress: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run() {
        eprintln!("data preparation failed: {:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let mut config = match args.config.as_ref() {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    apply_args(&mut config, &args);
    config.validate()?;

    if args.search {
        log::warn!("--search is not supported and will be ignored");
    }

    let downloader = HttpDownloader::new()
        .context("failed to set up HTTP client")?
        .with_progress(config.download.show_progress);
    let pipeline = Pipeline::new(config, downloader);
    let report = pipeline.run()?;

    log::info!(
        "Vocabulary: {} ({} tokens)",
        report.vocab_file.display(),
        report.vocab_size
    );
    for split in &report.splits {
        log::info!(
            "{:?}: {} records -> {} / {}",
            split.split,
            split.source_binary.records,
            split.source_binary.data_path.display(),
            split.target_binary.data_path.display()
        );
    }
    Ok(())
}

fn apply_args(config: &mut PipelineConfig, args: &Args) {
    if let Some(dir) = args.data_dir.as_ref() {
        config.paths.data_dir = dir.clone();
    }
    if let Some(dir) = args.raw_dir.as_ref() {
        config.paths.raw_dir = dir.clone();
    }
    if let Some(path) = args.init_vocab_file.as_ref() {
        config.vocab.init_vocab_file = Some(path.clone());
    }
    if let Some(size) = args.vocab_size {
        config.vocab.size = size;
    }
    if args.no_progress {
        config.download.show_progress = false;
    }
}
