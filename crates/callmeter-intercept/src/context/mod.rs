//! Request-scoped context shared across layers.
//!
//! Header snapshots live in a task-local scope so the metric-name strategy can
//! read the caller identity without threading headers through every call.

pub mod headers;

pub use headers::{capture_headers, current_referring_service, snapshot, sync_with_headers, with_headers};
