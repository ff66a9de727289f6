use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// One logged value. `Weighted` contributes `value` with weight `count`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Scalar(f64),
    Weighted { value: f64, count: f64 },
}

impl MetricValue {
    /// Weighted values count as `value * count` towards a rate.
    pub fn amount(self) -> f64 {
        match self {
            MetricValue::Scalar(value) => value,
            MetricValue::Weighted { value, count } => value * count,
        }
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        MetricValue::Scalar(value)
    }
}

impl From<u64> for MetricValue {
    fn from(value: u64) -> Self {
        MetricValue::Scalar(value as f64)
    }
}

impl From<(f64, f64)> for MetricValue {
    fn from((value, count): (f64, f64)) -> Self {
        MetricValue::Weighted { value, count }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeterKind {
    Average,
    Performance,
}

/// Running (optionally weighted) arithmetic mean.
#[derive(Debug, Clone, Default)]
pub struct AverageMeter {
    sum: f64,
    count: f64,
    updated: bool,
}

impl AverageMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, value: MetricValue) {
        let (value, count) = match value {
            MetricValue::Scalar(value) => (value, 1.0),
            MetricValue::Weighted { value, count } => (value, count),
        };
        self.updated = true;
        self.sum += value * count;
        self.count += count;
    }

    pub fn value(&self) -> f64 {
        if self.count == 0.0 {
            0.0
        } else {
            self.sum / self.count
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn updated(&self) -> bool {
        self.updated
    }
}

/// Amount accumulated per second of wall-clock time since the last reset.
#[derive(Debug, Clone)]
pub struct PerformanceMeter {
    start: Instant,
    total: f64,
    updated: bool,
}

impl Default for PerformanceMeter {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceMeter {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            total: 0.0,
            updated: false,
        }
    }

    pub fn update(&mut self, value: MetricValue) {
        self.updated = true;
        self.total += value.amount();
    }

    pub fn value(&self) -> f64 {
        self.rate_over(self.elapsed())
    }

    pub fn rate_over(&self, elapsed: Duration) -> f64 {
        let secs = elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total / secs
        } else {
            0.0
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn updated(&self) -> bool {
        self.updated
    }
}

#[derive(Debug, Clone)]
pub enum Meter {
    Average(AverageMeter),
    Performance(PerformanceMeter),
}

impl Meter {
    pub fn new(kind: MeterKind) -> Self {
        match kind {
            MeterKind::Average => Meter::Average(AverageMeter::new()),
            MeterKind::Performance => Meter::Performance(PerformanceMeter::new()),
        }
    }

    pub fn kind(&self) -> MeterKind {
        match self {
            Meter::Average(_) => MeterKind::Average,
            Meter::Performance(_) => MeterKind::Performance,
        }
    }

    pub fn update(&mut self, value: MetricValue) {
        match self {
            Meter::Average(meter) => meter.update(value),
            Meter::Performance(meter) => meter.update(value),
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            Meter::Average(meter) => meter.value(),
            Meter::Performance(meter) => meter.value(),
        }
    }

    pub fn reset(&mut self) {
        match self {
            Meter::Average(meter) => meter.reset(),
            Meter::Performance(meter) => meter.reset(),
        }
    }

    pub fn updated(&self) -> bool {
        match self {
            Meter::Average(meter) => meter.updated(),
            Meter::Performance(meter) => meter.updated(),
        }
    }

    /// Label used in the summary line.
    pub fn label(&self, name: &str) -> String {
        match self {
            Meter::Average(_) => format!("avg {name}"),
            Meter::Performance(_) => format!("{name}/s"),
        }
    }
}
