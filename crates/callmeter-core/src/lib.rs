//! callmeter core: metric naming primitives, caller identity, and error types.
//!
//! This crate holds the pure helpers shared by the interception layer: metric
//! name construction, sanitization, high-level status mapping and caller
//! identity resolution over a request header snapshot. It carries no runtime
//! or transport dependencies.
//!
//! # Lint guarantees
//! Panics, `unwrap`, and `expect` are denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! The only exemptions are the `Lazy` statics compiling literal patterns.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod headers;
pub mod naming;

/// Shared result type.
pub use error::{CallMeterError, Result};
pub use headers::{referring_service, RequestHeaders};
pub use naming::{highlevel_status, metric_name, sanitize, HighlevelStatus};
