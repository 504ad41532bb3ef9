//! Statically declared "measured" markers.
//!
//! Built once at setup (from config or code) and read-only afterwards.

use std::collections::{HashMap, HashSet};

use crate::intercept::MethodId;

/// Target type name -> methods explicitly marked as measured.
#[derive(Debug, Clone, Default)]
pub struct MeasuredRegistry {
    targets: HashMap<String, HashSet<String>>,
}

impl MeasuredRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `target::method` as always measured.
    pub fn mark(&mut self, target: &str, method: &str) -> &mut Self {
        self.targets
            .entry(target.to_string())
            .or_default()
            .insert(method.to_string());
        self
    }

    /// Builder form of [`mark`](Self::mark).
    pub fn with(mut self, target: &str, method: &str) -> Self {
        self.mark(target, method);
        self
    }

    /// Marker on the concrete method.
    pub fn is_measured(&self, id: &MethodId) -> bool {
        self.targets
            .get(id.target)
            .is_some_and(|m| m.contains(id.method))
    }

    /// Whether any method of `target` carries the marker.
    pub fn has_measured(&self, target: &str) -> bool {
        self.targets.get(target).is_some_and(|m| !m.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.targets.values().all(|m| m.is_empty())
    }
}
