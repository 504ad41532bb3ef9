//! Selection layer (regex selectors, measured markers, decision cache).
//!
//! Compiles selector configuration into lookup structures consulted on every
//! intercepted call.

pub mod engine;
pub mod registry;

pub use engine::Selector;
pub use registry::MeasuredRegistry;
