use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::error::{CorpusError, Result};

/// Network boundary used by the fetcher.
///
/// Implementations write the body of `url` to `dest` (creating or truncating
/// it) and return the number of bytes written. Renaming into place is the
/// caller's job.
pub trait Downloader {
    fn download(&self, url: &str, dest: &Path) -> Result<u64>;
}

impl<D: Downloader + ?Sized> Downloader for &D {
    fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        (**self).download(url, dest)
    }
}

/// Plain HTTP(S) GET downloader. No authentication, no retries.
pub struct HttpDownloader {
    client: reqwest::blocking::Client,
    show_progress: bool,
}

impl HttpDownloader {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("translate-data/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(30))
            .timeout(None::<Duration>)
            .build()
            .map_err(CorpusError::ClientSetup)?;
        Ok(Self {
            client,
            show_progress: true,
        })
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn progress_bar(&self, total: Option<u64>) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        match total {
            Some(len) => {
                let bar = ProgressBar::new(len);
                bar.set_style(
                    ProgressStyle::with_template(
                        "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({percent}%) eta {eta}",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
                );
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                bar.set_style(
                    ProgressStyle::with_template("{spinner:.green} {bytes} downloaded ({bytes_per_sec})")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                bar
            }
        }
    }
}

impl Downloader for HttpDownloader {
    fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        let http_err = |source| CorpusError::Http {
            url: url.to_string(),
            source,
        };
        let write_err = |source| CorpusError::Write {
            url: url.to_string(),
            path: dest.to_path_buf(),
            source,
        };

        let response = self
            .client
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(http_err)?;

        let bar = self.progress_bar(response.content_length());
        let file = File::create(dest).map_err(write_err)?;
        let mut writer = BufWriter::new(file);
        let mut reader = bar.wrap_read(response);

        let written = io::copy(&mut reader, &mut writer).map_err(write_err)?;
        writer.flush().map_err(write_err)?;
        bar.finish_and_clear();

        log::debug!("Downloaded {} bytes from {}", written, url);
        Ok(written)
    }
}
