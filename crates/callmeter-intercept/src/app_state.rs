//! Shared application state for the callmeter demo server.
//!
//! Builds the interceptor from config and picks the metrics sink. The StatsD
//! sink connects in the background; emission stays switched off until it does.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use callmeter_core::error::{CallMeterError, Result};

use crate::config::{CallMeterConfig, SinkKind};
use crate::intercept::Interceptor;
use crate::obs::{MetricsSink, MetricsSwitch, PendingSink, Registry, StatsdSink};
use crate::retry::{try_sleep_retry, RetryOutcome};
use crate::services::DemoService;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: CallMeterConfig,
    interceptor: Arc<Interceptor>,
    registry: Arc<Registry>,
    pending: Option<Arc<PendingSink>>,
    demo: DemoService,
}

impl AppState {
    /// Build application state.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub fn new(cfg: CallMeterConfig) -> Result<Self> {
        let registry = Arc::new(Registry::new());

        let (sink, pending, switch) = match cfg.metrics.sink {
            SinkKind::Memory => {
                let sink: Arc<dyn MetricsSink> = registry.clone();
                (sink, None, MetricsSwitch::new(cfg.metrics.enabled))
            }
            SinkKind::Statsd => {
                let pending = Arc::new(PendingSink::new());
                let sink: Arc<dyn MetricsSink> = pending.clone();
                (sink, Some(pending), MetricsSwitch::new(false))
            }
        };

        let interceptor = Interceptor::builder()
            .regex_selector(cfg.intercept.regex_selector.iter().cloned())
            .measured(cfg.intercept.registry())
            .switch(switch)
            .sink(sink)
            .build()?;
        let interceptor = Arc::new(interceptor);

        tracing::info!(
            sink = ?cfg.metrics.sink,
            enabled = cfg.metrics.enabled,
            selectors = cfg.intercept.regex_selector.len(),
            "interceptor ready"
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                demo: DemoService::new(Arc::clone(&interceptor)),
                cfg,
                interceptor,
                registry,
                pending,
            }),
        })
    }

    /// Connect the StatsD sink in the background (no-op for the memory sink).
    /// The switch is enabled once the sink is installed.
    pub fn start_transport(&self, cancel: CancellationToken) -> Option<JoinHandle<RetryOutcome>> {
        let pending = self.inner.pending.clone()?;
        let statsd = &self.inner.cfg.metrics.statsd;
        let addr = statsd.addr.clone();
        let prefix = statsd.prefix.clone();

        let switch = self.inner.interceptor.switch().clone();
        let enable = self.inner.cfg.metrics.enabled;

        let action = move || {
            let addr = addr.clone();
            let prefix = prefix.clone();
            let pending = Arc::clone(&pending);
            async move {
                let sink = tokio::task::spawn_blocking(move || StatsdSink::connect(&addr, &prefix))
                    .await
                    .map_err(|e| CallMeterError::Internal(format!("statsd connect task: {e}")))??;
                pending.install(Arc::new(sink));
                Ok::<(), CallMeterError>(())
            }
        };

        Some(try_sleep_retry(
            action,
            self.inner.cfg.retry.policy(),
            cancel,
            move || {
                if enable {
                    switch.enable();
                }
                tracing::info!(enabled = enable, "metrics transport installed");
            },
            |e: &CallMeterError| {
                tracing::warn!(error = %e, "statsd connect failed, retrying");
            },
        ))
    }

    pub fn cfg(&self) -> &CallMeterConfig {
        &self.inner.cfg
    }

    pub fn interceptor(&self) -> Arc<Interceptor> {
        Arc::clone(&self.inner.interceptor)
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.inner.registry)
    }

    pub fn demo(&self) -> &DemoService {
        &self.inner.demo
    }
}
