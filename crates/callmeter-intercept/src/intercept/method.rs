use std::fmt;

/// Stable identity of an intercepted method (target type + method name).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodId {
    pub target: &'static str,
    pub method: &'static str,
}

impl MethodId {
    pub const fn new(target: &'static str, method: &'static str) -> Self {
        Self { target, method }
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.target, self.method)
    }
}
