//! Metrics transport seam and the process-wide enable switch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;

use callmeter_core::error::Result;

/// Fire-and-forget metrics transport.
pub trait MetricsSink: Send + Sync {
    /// Record one timing sample in milliseconds.
    fn timer(&self, name: &str, elapsed_ms: u64) -> Result<()>;
    /// Increment a counter by one.
    fn counter(&self, name: &str) -> Result<()>;
}

/// Drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl MetricsSink for NullSink {
    fn timer(&self, _name: &str, _elapsed_ms: u64) -> Result<()> {
        Ok(())
    }
    fn counter(&self, _name: &str) -> Result<()> {
        Ok(())
    }
}

/// Sink installed once, later (e.g. after a transport connects).
/// Samples arriving before installation are dropped.
#[derive(Default)]
pub struct PendingSink {
    inner: OnceCell<Arc<dyn MetricsSink>>,
}

impl PendingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if a sink was already installed.
    pub fn install(&self, sink: Arc<dyn MetricsSink>) -> bool {
        self.inner.set(sink).is_ok()
    }

    pub fn is_installed(&self) -> bool {
        self.inner.get().is_some()
    }
}

impl MetricsSink for PendingSink {
    fn timer(&self, name: &str, elapsed_ms: u64) -> Result<()> {
        match self.inner.get() {
            Some(s) => s.timer(name, elapsed_ms),
            None => Ok(()),
        }
    }
    fn counter(&self, name: &str) -> Result<()> {
        match self.inner.get() {
            Some(s) => s.counter(name),
            None => Ok(()),
        }
    }
}

/// Shared on/off gate for metric emission. Clones share state.
#[derive(Debug, Clone)]
pub struct MetricsSwitch {
    enabled: Arc<AtomicBool>,
}

impl Default for MetricsSwitch {
    fn default() -> Self {
        Self::new(true)
    }
}

impl MetricsSwitch {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(enabled)),
        }
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }
}
