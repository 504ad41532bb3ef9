//! In-process metrics registry.
//!
//! Stores counters and timer histograms keyed by the dotted metric name, backed
//! by `DashMap`. The name is rendered as a `metric` label because dotted names
//! are not valid exposition identifiers. Histogram buckets are fixed in
//! milliseconds.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::Serialize;

use callmeter_core::error::Result;

use super::MetricsSink;

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

// 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 5s
const BUCKETS_MS: [u64; 10] = [1, 5, 10, 25, 50, 100, 250, 500, 1_000, 5_000];

#[derive(Default)]
struct CounterVec {
    map: DashMap<String, AtomicU64>,
}

impl CounterVec {
    fn inc(&self, name: &str) {
        // Existing key: no allocation.
        if let Some(c) = self.map.get(name) {
            c.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.map
            .entry(name.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    fn get(&self, name: &str) -> u64 {
        self.map
            .get(name)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, family: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} counter", family);
        for r in self.map.iter() {
            let val = r.value().load(Ordering::Relaxed);
            let _ = writeln!(out, "{}{{metric=\"{}\"}} {}", family, escape_label(r.key()), val);
        }
    }
}

#[derive(Default)]
struct AtomicHistogram {
    count: AtomicU64,
    sum: AtomicU64,
    max: AtomicU64,
    buckets: [AtomicU64; BUCKETS_MS.len()],
}

impl AtomicHistogram {
    fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            count: self.count.load(Ordering::Relaxed),
            sum_ms: self.sum.load(Ordering::Relaxed),
            max_ms: self.max.load(Ordering::Relaxed),
        }
    }
}

#[derive(Default)]
struct TimerVec {
    map: DashMap<String, AtomicHistogram>,
}

impl TimerVec {
    fn observe(&self, name: &str, ms: u64) {
        let record = |hist: &AtomicHistogram| {
            hist.count.fetch_add(1, Ordering::Relaxed);
            hist.sum.fetch_add(ms, Ordering::Relaxed);
            hist.max.fetch_max(ms, Ordering::Relaxed);
            // Cumulative: every bucket at or above the sample.
            for (i, &b) in BUCKETS_MS.iter().enumerate() {
                if ms <= b {
                    hist.buckets[i].fetch_add(1, Ordering::Relaxed);
                }
            }
        };

        if let Some(h) = self.map.get(name) {
            record(h.value());
            return;
        }
        let h = self.map.entry(name.to_string()).or_default();
        record(h.value());
    }

    fn render(&self, family: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} histogram", family);
        for r in self.map.iter() {
            let hist = r.value();
            let label = format!("metric=\"{}\"", escape_label(r.key()));

            for (i, &le) in BUCKETS_MS.iter().enumerate() {
                let count = hist.buckets[i].load(Ordering::Relaxed);
                let _ = writeln!(out, "{}_bucket{{{},le=\"{}\"}} {}", family, label, le, count);
            }
            let count = hist.count.load(Ordering::Relaxed);
            let _ = writeln!(out, "{}_bucket{{{},le=\"+Inf\"}} {}", family, label, count);

            let sum = hist.sum.load(Ordering::Relaxed);
            let _ = writeln!(out, "{}_sum{{{}}} {}", family, label, sum);
            let _ = writeln!(out, "{}_count{{{}}} {}", family, label, count);
        }
    }
}

/// Point-in-time view of one timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimerSnapshot {
    pub count: u64,
    pub sum_ms: u64,
    pub max_ms: u64,
}

/// Point-in-time view of the whole registry (ordered by name).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistrySnapshot {
    pub counters: BTreeMap<String, u64>,
    pub timers: BTreeMap<String, TimerSnapshot>,
}

/// In-memory [`MetricsSink`].
#[derive(Default)]
pub struct Registry {
    counters: CounterVec,
    timers: TimerVec,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter_value(&self, name: &str) -> u64 {
        self.counters.get(name)
    }

    pub fn timer_snapshot(&self, name: &str) -> Option<TimerSnapshot> {
        self.timers.map.get(name).map(|h| h.value().snapshot())
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        let counters = self
            .counters
            .map
            .iter()
            .map(|r| (r.key().clone(), r.value().load(Ordering::Relaxed)))
            .collect();
        let timers = self
            .timers
            .map
            .iter()
            .map(|r| (r.key().clone(), r.value().snapshot()))
            .collect();
        RegistrySnapshot { counters, timers }
    }

    /// Render in text exposition format (timer unit: milliseconds).
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.counters.render("callmeter_calls_total", &mut out);
        self.timers.render("callmeter_call_duration_ms", &mut out);
        out
    }
}

impl MetricsSink for Registry {
    fn timer(&self, name: &str, elapsed_ms: u64) -> Result<()> {
        self.timers.observe(name, elapsed_ms);
        Ok(())
    }

    fn counter(&self, name: &str) -> Result<()> {
        self.counters.inc(name);
        Ok(())
    }
}
