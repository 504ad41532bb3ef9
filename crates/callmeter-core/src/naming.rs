//! Metric name construction and sanitization.
//!
//! Names follow a fixed six-segment dotted layout:
//! `method-call.{caller}.{action}.{status}.undefined.undefined`
//! where the two trailing segments are reserved dimensions.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// First segment of every method-call metric.
pub const METHOD_CALL: &str = "method-call";

/// Placeholder for unknown or reserved segments.
pub const UNDEFINED: &str = "undefined";

#[allow(clippy::expect_used)]
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("literal pattern"));

#[allow(clippy::expect_used)]
static UNCLEAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z_\-0-9.]").expect("literal pattern"));

/// Outcome of a measured call, as it appears in metric names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HighlevelStatus {
    Success,
    Failure,
}

impl HighlevelStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            HighlevelStatus::Success => "Success",
            HighlevelStatus::Failure => "Failure",
        }
    }
}

impl fmt::Display for HighlevelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn highlevel_status(is_successful: bool) -> HighlevelStatus {
    if is_successful {
        HighlevelStatus::Success
    } else {
        HighlevelStatus::Failure
    }
}

/// Turn arbitrary text into a metric-name-safe token.
///
/// Whitespace runs become `_` and `/` becomes `-` before anything outside
/// `[a-zA-Z0-9_.-]` is stripped, so the substitutes survive the filter.
pub fn sanitize(input: &str) -> String {
    let s = WHITESPACE.replace_all(input, "_");
    let s = s.replace('/', "-");
    UNCLEAN.replace_all(&s, "").into_owned()
}

/// Build the dotted, lower-cased metric name for one call.
pub fn metric_name(exception_thrown: bool, caller: &str, action_name: &str) -> String {
    format!(
        "{}.{}.{}.{}.{}.{}",
        METHOD_CALL,
        caller,
        action_name,
        highlevel_status(!exception_thrown),
        UNDEFINED,
        UNDEFINED,
    )
    .to_lowercase()
}
