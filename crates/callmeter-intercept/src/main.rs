//! callmeter demo server
//!
//! - Loads `callmeter.yaml` (strict parsing + validate)
//! - Measures `/v1/call/:method` through the interceptor
//! - Serves the in-process registry on `/metrics`
//! - StatsD sink, when configured, connects through the retry loop

use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, EnvFilter};

use callmeter_intercept::{app_state, config, router};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cfg = config::load_from_file("callmeter.yaml").expect("config load failed");
    let listen: SocketAddr = cfg
        .listen
        .parse()
        .expect("listen must be a valid SocketAddr");

    let state = app_state::AppState::new(cfg).expect("app state init failed");
    let cancel = CancellationToken::new();
    let _transport = state.start_transport(cancel.clone());

    let app = router::build_router(state);

    tracing::info!(%listen, "callmeter starting");
    let listener = tokio::net::TcpListener::bind(listen).await.expect("failed to bind");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            cancel.cancel();
        })
        .await
        .expect("server failed");
}
