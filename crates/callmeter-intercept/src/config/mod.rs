//! Config loader (strict parsing).

pub mod schema;

use std::fs;

use callmeter_core::error::{CallMeterError, Result};

pub use schema::{
    CallMeterConfig, InterceptSection, MeasuredTarget, MetricsSection, RetrySection, SinkKind,
    StatsdSection,
};

pub fn load_from_file(path: &str) -> Result<CallMeterConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| CallMeterError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<CallMeterConfig> {
    let cfg: CallMeterConfig = serde_yaml::from_str(s)
        .map_err(|e| CallMeterError::BadConfig(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
