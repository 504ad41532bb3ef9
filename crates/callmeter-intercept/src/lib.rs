//! callmeter interception layer.
//!
//! Wraps method calls with latency and outcome measurement and reports one
//! timer sample plus one counter increment per selected call:
//! - `selector`: which calls are measured (regex selectors, measured markers,
//!   process-lifetime decision cache)
//! - `intercept`: the call lifecycle and the metric-name hook
//! - `obs`: metrics sinks and the enable switch
//! - `context`: request header scope for caller identity
//! - `retry`: background retry loop
//!
//! `app_state`, `router` and `services` wire a small demo server around it.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod app_state;
pub mod config;
pub mod context;
pub mod intercept;
pub mod obs;
pub mod retry;
pub mod router;
pub mod selector;
pub mod services;

pub use intercept::{Interceptor, MethodId, MetricNamer};
pub use obs::{MetricsSink, MetricsSwitch};
