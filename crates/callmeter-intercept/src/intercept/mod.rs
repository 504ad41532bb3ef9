//! Call interception: method identity, scoped timers, metric naming hook.

pub mod interceptor;
pub mod method;
pub mod namer;
pub mod timer;

pub use interceptor::{Interceptor, InterceptorBuilder};
pub use method::MethodId;
pub use namer::{MethodCallNamer, MetricNamer};
pub use timer::CallTimer;
