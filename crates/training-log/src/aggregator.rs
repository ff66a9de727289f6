use std::path::PathBuf;
use std::time::Instant;

use crate::error::Result;
use crate::events::EventFileWriter;
use crate::meters::{Meter, MeterKind, MetricValue};

const EPOCH_KEY: &str = "epoch";

#[derive(Clone, Debug)]
pub struct AggregatorSettings {
    /// First field of every summary line.
    pub prefix: String,
    pub enable_stdout: bool,
    pub tensorboard_dir: Option<PathBuf>,
    pub tensorboard_flush_every_n: usize,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            prefix: "Transformer".to_string(),
            enable_stdout: true,
            tensorboard_dir: None,
            tensorboard_flush_every_n: 1,
        }
    }
}

impl AggregatorSettings {
    pub fn from_config(
        enable_stdout: bool,
        tensorboard_dir: Option<PathBuf>,
        flush_every: usize,
    ) -> Self {
        Self {
            enable_stdout,
            tensorboard_dir,
            tensorboard_flush_every_n: flush_every.max(1),
            ..Self::default()
        }
    }
}

/// Accumulates named metrics between flushes and renders one summary line
/// per flush:
///
/// ```text
/// Transformer | epoch 1 | step 200 | avg loss 2.000 | tokens/s 1234.000 | walltime 3.210 |
/// ```
///
/// Only meters updated since the previous flush appear in the line, and only
/// those are reset.
pub struct AggregatorBackend {
    settings: AggregatorSettings,
    metrics: Vec<(String, Vec<Meter>)>,
    flushed: bool,
    step: u64,
    epoch: f64,
    start_time: Instant,
    tensorboard: Option<EventFileWriter>,
}

impl AggregatorBackend {
    /// `specs` maps each metric name to the meters that track it; their
    /// order is the order of the summary line.
    pub fn new<S, I>(settings: AggregatorSettings, specs: I) -> Result<Self>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, Vec<MeterKind>)>,
    {
        let metrics = specs
            .into_iter()
            .map(|(name, kinds)| (name.into(), kinds.into_iter().map(Meter::new).collect()))
            .collect();
        let tensorboard = match settings.tensorboard_dir.as_ref() {
            Some(dir) => Some(EventFileWriter::create(
                dir,
                settings.tensorboard_flush_every_n,
            )?),
            None => None,
        };

        Ok(Self {
            settings,
            metrics,
            flushed: true,
            step: 0,
            epoch: 0.0,
            start_time: Instant::now(),
            tensorboard,
        })
    }

    pub fn log<K, V, I>(&mut self, step: u64, data: I)
    where
        K: AsRef<str>,
        V: Into<MetricValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.step = step;
        for (name, value) in data {
            let name = name.as_ref();
            let value = value.into();
            if name == EPOCH_KEY {
                self.epoch = value.amount();
            }
            let Some((_, meters)) = self.metrics.iter_mut().find(|(known, _)| known == name)
            else {
                continue;
            };
            self.flushed = false;
            for meter in meters {
                meter.update(value);
            }
        }
    }

    /// Accepted for interface compatibility; metadata is not aggregated.
    pub fn metadata(&mut self, _metric: &str, _metadata: &[(&str, &str)]) {}

    /// Restarts the rate clocks of `name`'s performance meters, e.g. after a
    /// pause that should not count against throughput.
    pub fn reset_performance(&mut self, name: &str) {
        if let Some((_, meters)) = self.metrics.iter_mut().find(|(known, _)| known == name) {
            for meter in meters
                .iter_mut()
                .filter(|meter| meter.kind() == MeterKind::Performance)
            {
                meter.reset();
            }
        }
    }

    /// Renders and emits the summary line, or returns `None` when nothing
    /// was logged since the last flush.
    pub fn flush(&mut self) -> Option<String> {
        if self.flushed {
            return None;
        }

        let mut line = format!(
            "{} | epoch {} | step {} |",
            self.settings.prefix, self.epoch, self.step
        );
        let step = self.step as i64;
        for (name, meters) in self.metrics.iter_mut() {
            for meter in meters.iter_mut().filter(|meter| meter.updated()) {
                let label = meter.label(name);
                let value = meter.value();
                line.push_str(&format!(" {label} {value:.3} |"));
                if let Some(writer) = self.tensorboard.as_mut() {
                    if let Err(err) = writer.write_scalar(&label, step, value) {
                        log::warn!("Dropping tensorboard scalar {label}: {err}");
                    }
                }
                meter.reset();
            }
        }
        line.push_str(&format!(
            " walltime {:.3} |",
            self.start_time.elapsed().as_secs_f64()
        ));
        self.flushed = true;

        if self.settings.enable_stdout {
            println!("{line}");
        }
        if let Some(writer) = self.tensorboard.as_mut() {
            if let Err(err) = writer.flush() {
                log::warn!("Failed to flush tensorboard events: {err}");
            }
        }
        Some(line)
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn epoch(&self) -> f64 {
        self.epoch
    }

    pub fn settings(&self) -> &AggregatorSettings {
        &self.settings
    }
}
