use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures_util::FutureExt;

use callmeter_core::error::Result;

use super::{CallTimer, MethodCallNamer, MethodId, MetricNamer};
use crate::obs::{MetricsSink, MetricsSwitch, NullSink};
use crate::selector::{MeasuredRegistry, Selector};

// Failure reported for a call that panicked instead of returning Err.
const PANICKED: &str = "panicked";

/// Wraps calls with latency + outcome measurement.
///
/// Callers always get the wrapped call's own result back; panics are
/// re-raised after the report.
pub struct Interceptor {
    selector: Selector,
    switch: MetricsSwitch,
    sink: Arc<dyn MetricsSink>,
    namer: Arc<dyn MetricNamer>,
}

impl Interceptor {
    pub fn builder() -> InterceptorBuilder {
        InterceptorBuilder::default()
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn switch(&self) -> &MetricsSwitch {
        &self.switch
    }

    /// Measure a synchronous call.
    pub fn intercept<T, E, F>(&self, id: MethodId, call: F) -> std::result::Result<T, E>
    where
        F: FnOnce() -> std::result::Result<T, E>,
        E: fmt::Display,
    {
        if !self.selector.can_intercept(&id) {
            return call();
        }

        let timer = CallTimer::start(id);
        match panic::catch_unwind(AssertUnwindSafe(call)) {
            Ok(out) => {
                self.stop_and_report(timer, out.as_ref().err().map(|e| e as &dyn fmt::Display));
                out
            }
            Err(payload) => {
                self.stop_and_report(timer, Some(&PANICKED));
                panic::resume_unwind(payload)
            }
        }
    }

    /// Measure an asynchronous call. Elapsed time covers the whole future,
    /// including time spent suspended.
    pub async fn intercept_async<T, E, Fut>(&self, id: MethodId, call: Fut) -> std::result::Result<T, E>
    where
        Fut: Future<Output = std::result::Result<T, E>>,
        E: fmt::Display,
    {
        if !self.selector.can_intercept(&id) {
            return call.await;
        }

        let timer = CallTimer::start(id);
        match AssertUnwindSafe(call).catch_unwind().await {
            Ok(out) => {
                self.stop_and_report(timer, out.as_ref().err().map(|e| e as &dyn fmt::Display));
                out
            }
            Err(payload) => {
                self.stop_and_report(timer, Some(&PANICKED));
                panic::resume_unwind(payload)
            }
        }
    }

    fn stop_and_report(&self, timer: CallTimer, failure: Option<&dyn fmt::Display>) {
        let id = timer.method();
        let elapsed_ms = timer.stop();

        if !self.switch.is_enabled() {
            return;
        }

        // Naming and transport run isolated: nothing raised here may replace
        // the call's own outcome.
        let reported = panic::catch_unwind(AssertUnwindSafe(|| {
            let action = id.method.to_lowercase();
            let name = self.namer.metric_name(&id, &action, failure);
            tracing::debug!(
                target: "callmeter",
                method = %id,
                metric = %name,
                elapsed_ms,
                failed = failure.is_some(),
                "call measured"
            );
            self.sink
                .timer(&name, elapsed_ms)
                .and_then(|_| self.sink.counter(&name))
        }));

        match reported {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(method = %id, code = e.code().as_str(), error = %e, "metric emission failed");
            }
            Err(_) => {
                tracing::warn!(method = %id, "metric emission panicked");
            }
        }
    }
}

/// Setup-time configuration for an [`Interceptor`].
pub struct InterceptorBuilder {
    regex_selector: Vec<String>,
    measured: MeasuredRegistry,
    switch: MetricsSwitch,
    sink: Arc<dyn MetricsSink>,
    namer: Arc<dyn MetricNamer>,
}

impl Default for InterceptorBuilder {
    fn default() -> Self {
        Self {
            regex_selector: Vec::new(),
            measured: MeasuredRegistry::new(),
            switch: MetricsSwitch::default(),
            sink: Arc::new(NullSink),
            namer: Arc::new(MethodCallNamer),
        }
    }
}

impl InterceptorBuilder {
    pub fn regex_selector<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.regex_selector = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn measured(mut self, measured: MeasuredRegistry) -> Self {
        self.measured = measured;
        self
    }

    pub fn switch(mut self, switch: MetricsSwitch) -> Self {
        self.switch = switch;
        self
    }

    pub fn sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn namer<N: MetricNamer + 'static>(mut self, namer: N) -> Self {
        self.namer = Arc::new(namer);
        self
    }

    /// Closure form of [`namer`](Self::namer).
    pub fn namer_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&MethodId, &str, Option<&dyn fmt::Display>) -> String + Send + Sync + 'static,
    {
        self.namer = Arc::new(f);
        self
    }

    /// Compiles selectors; fails on an invalid pattern.
    pub fn build(self) -> Result<Interceptor> {
        Ok(Interceptor {
            selector: Selector::new(&self.regex_selector, self.measured)?,
            switch: self.switch,
            sink: self.sink,
            namer: self.namer,
        })
    }
}
