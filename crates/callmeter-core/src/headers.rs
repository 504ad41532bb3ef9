//! Caller identity resolution from request headers.
//!
//! The header source is an owned snapshot of the two headers that matter, so
//! the transport layer decides how to capture it (axum middleware, tests, ...).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::naming::UNDEFINED;

/// Custom header naming the upstream service.
pub const REFERRING_SERVICE_HEADER: &str = "ot-referringservice";

/// Standard user agent header.
pub const USER_AGENT_HEADER: &str = "user-agent";

/// Identity used when no header snapshot is reachable at all.
///
/// Same string as [`UNDEFINED`] on the wire; kept apart so callers can tell
/// "no request scope" from "headers present but unparseable".
pub const UNRESOLVED_SERVICE: &str = "undefined";

/// User agent captures are truncated to this many characters.
pub const MAX_USER_AGENT_LEN: usize = 60;

// Leading token up to the first whitespace, ':', '(' or '/'.
#[allow(clippy::expect_used)]
static LEADING_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(.+?)[\s:(/]").expect("literal pattern"));

/// Snapshot of the request headers used for caller identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestHeaders {
    pub referring_service: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_referring_service(mut self, v: impl Into<String>) -> Self {
        self.referring_service = Some(v.into());
        self
    }

    pub fn with_user_agent(mut self, v: impl Into<String>) -> Self {
        self.user_agent = Some(v.into());
        self
    }

    /// Build from raw name/value pairs. Names match case-insensitively and
    /// the first value of a repeated header wins.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut out = Self::default();
        for (k, v) in pairs {
            let k = k.as_ref();
            if k.eq_ignore_ascii_case(REFERRING_SERVICE_HEADER) {
                out.referring_service.get_or_insert_with(|| v.as_ref().to_string());
            } else if k.eq_ignore_ascii_case(USER_AGENT_HEADER) {
                out.user_agent.get_or_insert_with(|| v.as_ref().to_string());
            }
        }
        out
    }
}

fn leading_token(value: &str) -> Option<&str> {
    LEADING_TOKEN
        .captures(value)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Resolve the calling service from a header snapshot.
///
/// Order: custom referring-service header, then user agent, then `undefined`.
pub fn referring_service(headers: Option<&RequestHeaders>) -> String {
    let Some(headers) = headers else {
        return UNDEFINED.to_string();
    };

    if let Some(svc) = headers.referring_service.as_deref().filter(|s| !s.is_empty()) {
        return leading_token(svc).unwrap_or(svc).replace('.', "_");
    }

    let ua = headers.user_agent.as_deref().unwrap_or("");
    match leading_token(ua) {
        Some(tok) if !tok.is_empty() => tok
            .chars()
            .take(MAX_USER_AGENT_LEN)
            .collect::<String>()
            .replace('.', "_"),
        _ => UNDEFINED.to_string(),
    }
}
