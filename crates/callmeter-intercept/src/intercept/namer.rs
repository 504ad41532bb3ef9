use std::fmt;

use callmeter_core::naming::metric_name;

use super::MethodId;
use crate::context::current_referring_service;

/// Computes the metric name for a finished call.
///
/// `failure` is `None` when the call succeeded.
pub trait MetricNamer: Send + Sync {
    fn metric_name(&self, method: &MethodId, action: &str, failure: Option<&dyn fmt::Display>)
        -> String;
}

impl<F> MetricNamer for F
where
    F: Fn(&MethodId, &str, Option<&dyn fmt::Display>) -> String + Send + Sync,
{
    fn metric_name(
        &self,
        method: &MethodId,
        action: &str,
        failure: Option<&dyn fmt::Display>,
    ) -> String {
        self(method, action, failure)
    }
}

/// `method-call.{caller}.{action}.{status}.undefined.undefined`, with the
/// caller taken from the current request header scope.
#[derive(Debug, Clone, Copy, Default)]
pub struct MethodCallNamer;

impl MetricNamer for MethodCallNamer {
    fn metric_name(
        &self,
        _method: &MethodId,
        action: &str,
        failure: Option<&dyn fmt::Display>,
    ) -> String {
        metric_name(failure.is_some(), &current_referring_service(), action)
    }
}
