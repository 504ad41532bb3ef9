use dashmap::DashMap;
use once_cell::sync::OnceCell;
use regex::Regex;

use callmeter_core::error::{CallMeterError, Result};

use super::registry::MeasuredRegistry;
use crate::intercept::MethodId;

/// Decides which calls get measured.
/// Construct once at setup, then share via Arc.
///
/// Two tiers:
/// 1. `intercept_all`, fixed on the first observed call: true only when no
///    regex selector is configured and the first call's target has no
///    measured method.
/// 2. Otherwise a per-method decision (regex on the bare method name OR a
///    marker on the method), computed once and cached for the process lifetime.
#[derive(Debug)]
pub struct Selector {
    patterns: Vec<Regex>,
    measured: MeasuredRegistry,
    intercept_all: OnceCell<bool>,
    scanned: DashMap<MethodId, bool>,
}

impl Selector {
    pub fn new(patterns: &[String], measured: MeasuredRegistry) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    CallMeterError::BadConfig(format!("invalid regex selector {p:?}: {e}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            patterns,
            measured,
            intercept_all: OnceCell::new(),
            scanned: DashMap::new(),
        })
    }

    pub fn can_intercept(&self, id: &MethodId) -> bool {
        if *self.intercept_all.get_or_init(|| self.intercept_all_methods(id)) {
            return true;
        }

        if let Some(hit) = self.scanned.get(id) {
            return *hit;
        }

        let decision = self.patterns.iter().any(|re| re.is_match(id.method))
            || self.measured.is_measured(id);

        // Racing threads compute the same value; first insert wins.
        let stored = *self.scanned.entry(*id).or_insert(decision);
        if stored {
            tracing::debug!(method = %id, "method selected for measurement");
        }
        stored
    }

    fn intercept_all_methods(&self, id: &MethodId) -> bool {
        if !self.patterns.is_empty() {
            return false;
        }
        !self.measured.has_measured(id.target)
    }

    /// Memoized tier-1 decision, if already fixed.
    pub fn intercepts_all(&self) -> Option<bool> {
        self.intercept_all.get().copied()
    }

    /// Cached tier-2 decision for `id`, if computed.
    pub fn cached(&self, id: &MethodId) -> Option<bool> {
        self.scanned.get(id).map(|r| *r.value())
    }

    pub fn cached_len(&self) -> usize {
        self.scanned.len()
    }
}
