#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use callmeter_intercept::retry::{try_sleep_retry, RetryOutcome, RetryPolicy};
use tokio_util::sync::CancellationToken;

fn fast() -> RetryPolicy {
    RetryPolicy::fixed(Duration::from_millis(10))
}

#[tokio::test]
async fn retries_until_success() {
    let calls = Arc::new(AtomicU32::new(0));
    let failures = Arc::new(AtomicU32::new(0));
    let succeeded = Arc::new(AtomicU32::new(0));

    let c = Arc::clone(&calls);
    let f = Arc::clone(&failures);
    let s = Arc::clone(&succeeded);
    let handle = try_sleep_retry(
        move || {
            let n = c.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Err(format!("attempt {n} failed"))
                } else {
                    Ok(())
                }
            }
        },
        fast(),
        CancellationToken::new(),
        move || {
            s.fetch_add(1, Ordering::SeqCst);
        },
        move |_e: &String| {
            f.fetch_add(1, Ordering::SeqCst);
        },
    );

    let outcome = tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    assert_eq!(outcome, RetryOutcome::Succeeded { attempts: 3 });
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(failures.load(Ordering::SeqCst), 2);
    assert_eq!(succeeded.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failure_callback_panics_are_swallowed() {
    let calls = Arc::new(AtomicU32::new(0));
    let c = Arc::clone(&calls);
    let handle = try_sleep_retry(
        move || {
            let n = c.fetch_add(1, Ordering::SeqCst) + 1;
            async move { if n < 2 { Err("nope") } else { Ok(()) } }
        },
        fast(),
        CancellationToken::new(),
        || {},
        |_e: &&str| panic!("callback blew up"),
    );

    let outcome = tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    assert_eq!(outcome, RetryOutcome::Succeeded { attempts: 2 });
}

#[tokio::test]
async fn bounded_policy_exhausts() {
    let handle = try_sleep_retry(
        || async { Err::<(), _>("down") },
        fast().with_max_attempts(4),
        CancellationToken::new(),
        || panic!("must not succeed"),
        |_e: &&str| {},
    );

    let outcome = tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    assert_eq!(outcome, RetryOutcome::Exhausted { attempts: 4 });
}

#[tokio::test]
async fn cancellation_stops_unbounded_loop() {
    let cancel = CancellationToken::new();
    let calls = Arc::new(AtomicU32::new(0));
    let c = Arc::clone(&calls);

    let handle = try_sleep_retry(
        move || {
            c.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>("down") }
        },
        RetryPolicy::fixed(Duration::from_secs(60)),
        cancel.clone(),
        || {},
        |_e: &&str| {},
    );

    // first attempt runs immediately, then the loop sleeps
    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    let outcome = tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    assert_eq!(outcome, RetryOutcome::Cancelled { attempts: 1 });
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn default_policy_is_unbounded_one_second() {
    let p = RetryPolicy::default();
    assert_eq!(p.delay, Duration::from_secs(1));
    assert_eq!(p.max_attempts, None);
}
