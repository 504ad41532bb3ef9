use std::future::Future;

use axum::extract::Request;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use callmeter_core::headers::{referring_service, RequestHeaders, UNRESOLVED_SERVICE};

tokio::task_local! {
    static REQUEST_HEADERS: RequestHeaders;
}

/// Run `fut` with `headers` as the current request headers.
pub async fn with_headers<F: Future>(headers: RequestHeaders, fut: F) -> F::Output {
    REQUEST_HEADERS.scope(headers, fut).await
}

/// Synchronous form of [`with_headers`].
pub fn sync_with_headers<R>(headers: RequestHeaders, f: impl FnOnce() -> R) -> R {
    REQUEST_HEADERS.sync_scope(headers, f)
}

/// Caller identity for the current scope; [`UNRESOLVED_SERVICE`] outside one.
pub fn current_referring_service() -> String {
    REQUEST_HEADERS
        .try_with(|h| referring_service(Some(h)))
        .unwrap_or_else(|_| UNRESOLVED_SERVICE.to_string())
}

/// Snapshot the headers relevant to caller identity. Non-UTF-8 values are skipped.
pub fn snapshot(map: &HeaderMap) -> RequestHeaders {
    RequestHeaders::from_pairs(
        map.iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str(), v))),
    )
}

/// Axum middleware: expose request headers to measured calls made while
/// handling the request.
pub async fn capture_headers(req: Request, next: Next) -> Response {
    let headers = snapshot(req.headers());
    with_headers(headers, next.run(req)).await
}
