//! Built-in services.

pub mod demo;

pub use demo::DemoService;
