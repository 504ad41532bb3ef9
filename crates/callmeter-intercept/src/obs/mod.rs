//! Metrics transport: sink trait, enable switch, in-process registry, StatsD.

pub mod metrics;
pub mod sink;
pub mod statsd;

pub use metrics::{Registry, RegistrySnapshot, TimerSnapshot};
pub use sink::{MetricsSink, MetricsSwitch, NullSink, PendingSink};
pub use statsd::StatsdSink;
