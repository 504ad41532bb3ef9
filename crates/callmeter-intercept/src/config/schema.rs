use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use callmeter_core::error::{CallMeterError, Result};

use crate::retry::RetryPolicy;
use crate::selector::MeasuredRegistry;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CallMeterConfig {
    pub version: u32,

    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default)]
    pub metrics: MetricsSection,

    #[serde(default)]
    pub intercept: InterceptSection,

    #[serde(default)]
    pub retry: RetrySection,
}

impl CallMeterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(CallMeterError::UnsupportedVersion);
        }

        self.intercept.validate()?;
        self.retry.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// In-process registry, rendered on `/metrics`.
    #[default]
    Memory,
    /// StatsD over UDP.
    Statsd,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub sink: SinkKind,

    #[serde(default)]
    pub statsd: StatsdSection,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            enabled: true,
            sink: SinkKind::default(),
            statsd: StatsdSection::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatsdSection {
    #[serde(default = "default_statsd_addr")]
    pub addr: String,

    #[serde(default)]
    pub prefix: String,
}

impl Default for StatsdSection {
    fn default() -> Self {
        Self {
            addr: default_statsd_addr(),
            prefix: String::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InterceptSection {
    /// Method-name patterns, checked in order.
    #[serde(default)]
    pub regex_selector: Vec<String>,

    /// Methods always measured, per target type.
    #[serde(default)]
    pub measured: Vec<MeasuredTarget>,
}

impl InterceptSection {
    pub fn validate(&self) -> Result<()> {
        for p in &self.regex_selector {
            Regex::new(p).map_err(|e| {
                CallMeterError::BadConfig(format!("intercept.regex_selector entry {p:?}: {e}"))
            })?;
        }
        for t in &self.measured {
            if t.target.is_empty() {
                return Err(CallMeterError::BadConfig(
                    "intercept.measured.target must not be empty".into(),
                ));
            }
            if t.methods.iter().any(|m| m.is_empty()) {
                return Err(CallMeterError::BadConfig(format!(
                    "intercept.measured methods for {} must not be empty strings",
                    t.target
                )));
            }
        }
        Ok(())
    }

    pub fn registry(&self) -> MeasuredRegistry {
        let mut reg = MeasuredRegistry::new();
        for t in &self.measured {
            for m in &t.methods {
                reg.mark(&t.target, m);
            }
        }
        reg
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeasuredTarget {
    pub target: String,
    #[serde(default)]
    pub methods: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrySection {
    #[serde(default = "default_retry_delay_ms")]
    pub delay_ms: u64,

    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            delay_ms: default_retry_delay_ms(),
            max_attempts: None,
        }
    }
}

impl RetrySection {
    pub fn validate(&self) -> Result<()> {
        if !(10..=600000).contains(&self.delay_ms) {
            return Err(CallMeterError::BadConfig(
                "retry.delay_ms must be between 10 and 600000".into(),
            ));
        }
        if self.max_attempts == Some(0) {
            return Err(CallMeterError::BadConfig(
                "retry.max_attempts must be greater than 0 when set".into(),
            ));
        }
        Ok(())
    }

    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            delay: Duration::from_millis(self.delay_ms),
            max_attempts: self.max_attempts,
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_statsd_addr() -> String {
    "127.0.0.1:8125".into()
}
fn default_retry_delay_ms() -> u64 {
    1000
}
