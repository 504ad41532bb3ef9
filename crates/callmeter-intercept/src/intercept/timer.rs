use std::time::Instant;

use super::MethodId;

/// Running timer for one call. Returned by `start`, consumed by `stop`, so
/// nested or concurrent calls of the same method never share state.
#[derive(Debug)]
pub struct CallTimer {
    method: MethodId,
    started: Instant,
}

impl CallTimer {
    pub fn start(method: MethodId) -> Self {
        Self {
            method,
            started: Instant::now(),
        }
    }

    pub fn method(&self) -> MethodId {
        self.method
    }

    /// Elapsed whole milliseconds so far.
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Stop and return elapsed whole milliseconds.
    pub fn stop(self) -> u64 {
        self.elapsed_ms()
    }
}
