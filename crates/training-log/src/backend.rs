use crate::aggregator::AggregatorBackend;
use crate::meters::MetricValue;

/// A sink for step-indexed metric records.
pub trait LogBackend {
    fn log(&mut self, step: u64, data: &[(&str, MetricValue)]);

    fn metadata(&mut self, _metric: &str, _metadata: &[(&str, &str)]) {}

    fn flush(&mut self);
}

impl LogBackend for AggregatorBackend {
    fn log(&mut self, step: u64, data: &[(&str, MetricValue)]) {
        AggregatorBackend::log(self, step, data.iter().copied());
    }

    fn metadata(&mut self, metric: &str, metadata: &[(&str, &str)]) {
        AggregatorBackend::metadata(self, metric, metadata);
    }

    fn flush(&mut self) {
        AggregatorBackend::flush(self);
    }
}

/// Fans every call out to all registered backends, in registration order.
#[derive(Default)]
pub struct Logger {
    backends: Vec<Box<dyn LogBackend>>,
}

impl Logger {
    pub fn new(backends: Vec<Box<dyn LogBackend>>) -> Self {
        Self { backends }
    }

    pub fn push(&mut self, backend: Box<dyn LogBackend>) {
        self.backends.push(backend);
    }

    pub fn log(&mut self, step: u64, data: &[(&str, MetricValue)]) {
        for backend in &mut self.backends {
            backend.log(step, data);
        }
    }

    pub fn metadata(&mut self, metric: &str, metadata: &[(&str, &str)]) {
        for backend in &mut self.backends {
            backend.metadata(metric, metadata);
        }
    }

    pub fn flush(&mut self) {
        for backend in &mut self.backends {
            backend.flush();
        }
    }
}
