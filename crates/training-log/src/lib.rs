//! Metric aggregation for training runs.
//!
//! [`AggregatorBackend`] keeps running averages and throughput counters per
//! metric name and prints one summary line per flush, optionally mirroring
//! each value into a TensorBoard event file. [`Logger`] fans records out to
//! any number of [`LogBackend`]s.

mod aggregator;
mod backend;
mod error;
mod events;
mod meters;

pub use aggregator::{AggregatorBackend, AggregatorSettings};
pub use backend::{LogBackend, Logger};
pub use error::{LogError, Result};
pub use events::EventFileWriter;
pub use meters::{AverageMeter, Meter, MeterKind, MetricValue, PerformanceMeter};
