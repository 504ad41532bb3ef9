//! Call lifecycle: selection, timing, naming, emission isolation.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use callmeter_core::error::{CallMeterError, Result};
use callmeter_core::RequestHeaders;
use callmeter_intercept::context::{sync_with_headers, with_headers};
use callmeter_intercept::obs::Registry;
use callmeter_intercept::selector::MeasuredRegistry;
use callmeter_intercept::{Interceptor, MethodId, MetricsSink, MetricsSwitch};

const DO_WORK: MethodId = MethodId::new("Worker", "DoWork");
const GET_VALUE: MethodId = MethodId::new("Worker", "GetValue");
const SET_VALUE: MethodId = MethodId::new("Worker", "SetValue");

#[derive(Debug, Clone, PartialEq, Eq)]
enum Sample {
    Timer(String, u64),
    Counter(String),
}

#[derive(Default)]
struct RecordingSink {
    samples: Mutex<Vec<Sample>>,
}

impl RecordingSink {
    fn samples(&self) -> Vec<Sample> {
        self.samples.lock().unwrap().clone()
    }
}

impl MetricsSink for RecordingSink {
    fn timer(&self, name: &str, elapsed_ms: u64) -> Result<()> {
        self.samples.lock().unwrap().push(Sample::Timer(name.to_string(), elapsed_ms));
        Ok(())
    }
    fn counter(&self, name: &str) -> Result<()> {
        self.samples.lock().unwrap().push(Sample::Counter(name.to_string()));
        Ok(())
    }
}

struct FailingSink;

impl MetricsSink for FailingSink {
    fn timer(&self, _name: &str, _elapsed_ms: u64) -> Result<()> {
        Err(CallMeterError::Transport("collector down".into()))
    }
    fn counter(&self, _name: &str) -> Result<()> {
        Err(CallMeterError::Transport("collector down".into()))
    }
}

struct PanickingSink;

impl MetricsSink for PanickingSink {
    fn timer(&self, _name: &str, _elapsed_ms: u64) -> Result<()> {
        panic!("sink exploded");
    }
    fn counter(&self, _name: &str) -> Result<()> {
        panic!("sink exploded");
    }
}

#[derive(Debug, PartialEq, Eq)]
struct WorkError(&'static str);

impl fmt::Display for WorkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "work error: {}", self.0)
    }
}

fn svc_headers() -> RequestHeaders {
    RequestHeaders::new().with_referring_service("svc.a: extra")
}

fn recording(builder: callmeter_intercept::intercept::InterceptorBuilder) -> (Interceptor, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let ic = builder.sink(sink.clone()).build().unwrap();
    (ic, sink)
}

#[test]
fn success_emits_one_timer_and_one_counter() {
    let (ic, sink) = recording(Interceptor::builder());

    let out: std::result::Result<u32, WorkError> =
        sync_with_headers(svc_headers(), || ic.intercept(DO_WORK, || Ok(7)));
    assert_eq!(out, Ok(7));

    let name = "method-call.svc_a.dowork.success.undefined.undefined";
    let samples = sink.samples();
    assert_eq!(samples.len(), 2);
    assert!(matches!(&samples[0], Sample::Timer(n, _) if n == name));
    assert_eq!(samples[1], Sample::Counter(name.to_string()));
}

#[test]
fn failure_is_reported_and_returned_unchanged() {
    let (ic, sink) = recording(Interceptor::builder());

    let out: std::result::Result<(), WorkError> =
        sync_with_headers(svc_headers(), || ic.intercept(DO_WORK, || Err(WorkError("boom"))));
    assert_eq!(out, Err(WorkError("boom")));

    let name = "method-call.svc_a.dowork.failure.undefined.undefined";
    assert_eq!(
        sink.samples()
            .iter()
            .filter(|s| matches!(s, Sample::Timer(n, _) | Sample::Counter(n) if n == name))
            .count(),
        2
    );
}

#[test]
fn no_header_scope_resolves_undefined_caller() {
    let (ic, sink) = recording(Interceptor::builder());
    let _: std::result::Result<(), WorkError> = ic.intercept(DO_WORK, || Ok(()));

    assert_eq!(
        sink.samples()[1],
        Sample::Counter("method-call.undefined.dowork.success.undefined.undefined".into())
    );
}

#[test]
fn unselected_calls_emit_nothing() {
    let (ic, sink) = recording(Interceptor::builder().regex_selector(["^Get"]));

    let set: std::result::Result<&str, WorkError> = ic.intercept(SET_VALUE, || Ok("set"));
    assert_eq!(set, Ok("set"));
    assert!(sink.samples().is_empty());

    let get: std::result::Result<&str, WorkError> = ic.intercept(GET_VALUE, || Ok("get"));
    assert_eq!(get, Ok("get"));
    assert_eq!(sink.samples().len(), 2);
}

#[test]
fn measured_marker_selects_with_non_matching_selector() {
    let reg = MeasuredRegistry::new().with("Worker", "DoWork");
    let (ic, sink) = recording(Interceptor::builder().regex_selector(["^Get"]).measured(reg));

    let _: std::result::Result<(), WorkError> = ic.intercept(DO_WORK, || Ok(()));
    let _: std::result::Result<(), WorkError> = ic.intercept(SET_VALUE, || Ok(()));
    assert_eq!(sink.samples().len(), 2);
}

#[test]
fn disabled_switch_emits_nothing_and_keeps_results() {
    let switch = MetricsSwitch::new(false);
    let (ic, sink) = recording(Interceptor::builder().switch(switch.clone()));

    let ok: std::result::Result<u8, WorkError> = ic.intercept(DO_WORK, || Ok(1));
    let err: std::result::Result<u8, WorkError> = ic.intercept(DO_WORK, || Err(WorkError("x")));
    assert_eq!(ok, Ok(1));
    assert_eq!(err, Err(WorkError("x")));
    assert!(sink.samples().is_empty());

    switch.enable();
    let _: std::result::Result<u8, WorkError> = ic.intercept(DO_WORK, || Ok(1));
    assert_eq!(sink.samples().len(), 2);

    switch.disable();
    let _: std::result::Result<u8, WorkError> = ic.intercept(DO_WORK, || Ok(1));
    assert_eq!(sink.samples().len(), 2);
}

#[test]
fn elapsed_time_covers_the_call() {
    let (ic, sink) = recording(Interceptor::builder());
    let _: std::result::Result<(), WorkError> = ic.intercept(DO_WORK, || {
        thread::sleep(Duration::from_millis(20));
        Ok(())
    });

    match &sink.samples()[0] {
        Sample::Timer(_, ms) => assert!(*ms >= 20, "elapsed {ms}ms"),
        other => panic!("expected timer, got {other:?}"),
    }
}

#[test]
fn nested_same_method_calls_are_timed_independently() {
    let (ic, sink) = recording(Interceptor::builder());
    let out: std::result::Result<u32, WorkError> = ic.intercept(DO_WORK, || {
        let inner: std::result::Result<u32, WorkError> = ic.intercept(DO_WORK, || Ok(1));
        thread::sleep(Duration::from_millis(10));
        inner.map(|v| v + 1)
    });
    assert_eq!(out, Ok(2));

    let timers: Vec<u64> = sink
        .samples()
        .into_iter()
        .filter_map(|s| match s {
            Sample::Timer(_, ms) => Some(ms),
            Sample::Counter(_) => None,
        })
        .collect();
    assert_eq!(timers.len(), 2);
    // inner finishes first; outer includes the sleep
    assert!(timers[1] >= 10);
    assert!(timers[1] >= timers[0]);
}

#[test]
fn failing_sink_does_not_mask_outcome() {
    let ic = Interceptor::builder().sink(Arc::new(FailingSink)).build().unwrap();
    let ok: std::result::Result<u8, WorkError> = ic.intercept(DO_WORK, || Ok(3));
    let err: std::result::Result<u8, WorkError> = ic.intercept(DO_WORK, || Err(WorkError("e")));
    assert_eq!(ok, Ok(3));
    assert_eq!(err, Err(WorkError("e")));
}

#[test]
fn panicking_sink_does_not_mask_outcome() {
    let ic = Interceptor::builder().sink(Arc::new(PanickingSink)).build().unwrap();
    let ok: std::result::Result<u8, WorkError> = ic.intercept(DO_WORK, || Ok(3));
    assert_eq!(ok, Ok(3));
}

#[test]
fn panicking_call_is_reported_then_resumed() {
    let (ic, sink) = recording(Interceptor::builder());

    let caught = panic::catch_unwind(AssertUnwindSafe(|| {
        let _: std::result::Result<(), WorkError> = ic.intercept(DO_WORK, || panic!("call blew up"));
    }));
    assert!(caught.is_err());
    assert_eq!(
        sink.samples()[1],
        Sample::Counter("method-call.undefined.dowork.failure.undefined.undefined".into())
    );
}

#[test]
fn custom_namer_receives_action_and_failure() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_in = Arc::clone(&seen);
    let (ic, sink) = recording(Interceptor::builder().namer_fn(
        move |m: &MethodId, action: &str, failure: Option<&dyn fmt::Display>| {
            let failure = failure.map(|f| f.to_string());
            seen_in.lock().unwrap().push((action.to_string(), failure.clone()));
            format!("{}.{}.{}", m.target.to_lowercase(), action, if failure.is_some() { "err" } else { "ok" })
        },
    ));

    let _: std::result::Result<(), WorkError> = ic.intercept(GET_VALUE, || Err(WorkError("nope")));
    let _: std::result::Result<(), WorkError> = ic.intercept(GET_VALUE, || Ok(()));

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            ("getvalue".to_string(), Some("work error: nope".to_string())),
            ("getvalue".to_string(), None),
        ]
    );
    assert_eq!(sink.samples()[1], Sample::Counter("worker.getvalue.err".into()));
    assert_eq!(sink.samples()[3], Sample::Counter("worker.getvalue.ok".into()));
}

#[test]
fn registry_sink_accumulates() {
    let registry = Arc::new(Registry::new());
    let ic = Interceptor::builder().sink(registry.clone()).build().unwrap();

    for _ in 0..3 {
        let _: std::result::Result<(), WorkError> = ic.intercept(DO_WORK, || Ok(()));
    }
    let _: std::result::Result<(), WorkError> = ic.intercept(DO_WORK, || Err(WorkError("x")));

    let ok = "method-call.undefined.dowork.success.undefined.undefined";
    let failed = "method-call.undefined.dowork.failure.undefined.undefined";
    assert_eq!(registry.counter_value(ok), 3);
    assert_eq!(registry.counter_value(failed), 1);
    assert_eq!(registry.timer_snapshot(ok).unwrap().count, 3);

    let text = registry.render();
    assert!(text.contains("# TYPE callmeter_calls_total counter"));
    assert!(text.contains(&format!("callmeter_calls_total{{metric=\"{ok}\"}} 3")));
    assert!(text.contains(&format!("callmeter_call_duration_ms_count{{metric=\"{failed}\"}} 1")));

    let json = serde_json::to_value(registry.snapshot()).unwrap();
    assert_eq!(json["counters"][ok], 3);
    assert_eq!(json["timers"][failed]["count"], 1);
}

#[tokio::test]
async fn async_calls_are_measured_with_scoped_headers() {
    let (ic, sink) = recording(Interceptor::builder());

    let out: std::result::Result<&str, WorkError> = with_headers(
        RequestHeaders::new().with_user_agent("orders.api/3.1 (linux)"),
        ic.intercept_async(DO_WORK, async {
            tokio::time::sleep(Duration::from_millis(15)).await;
            Ok("done")
        }),
    )
    .await;
    assert_eq!(out, Ok("done"));

    let name = "method-call.orders_api.dowork.success.undefined.undefined";
    let samples = sink.samples();
    match &samples[0] {
        Sample::Timer(n, ms) => {
            assert_eq!(n, name);
            assert!(*ms >= 15, "elapsed {ms}ms");
        }
        other => panic!("expected timer, got {other:?}"),
    }
    assert_eq!(samples[1], Sample::Counter(name.into()));
}

#[tokio::test]
async fn async_failure_is_returned_unchanged() {
    let (ic, sink) = recording(Interceptor::builder().regex_selector(["Work$"]));
    let out: std::result::Result<(), WorkError> =
        ic.intercept_async(DO_WORK, async { Err(WorkError("late")) }).await;
    assert_eq!(out, Err(WorkError("late")));
    assert_eq!(
        sink.samples()[1],
        Sample::Counter("method-call.undefined.dowork.failure.undefined.undefined".into())
    );
}
