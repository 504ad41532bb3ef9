//! Top-level facade crate for callmeter.
//!
//! Re-exports the core helpers and the interception layer so users can depend on a single crate.

pub mod core {
    pub use callmeter_core::*;
}

pub mod intercept {
    pub use callmeter_intercept::*;
}
