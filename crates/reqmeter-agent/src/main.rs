//! reqmeter agent demo binary.
//!
//! Serves a small instrumented HTTP app and reports its request metrics to
//! the configured ingestion endpoint.
//! - config path: `$REQMETER_CONFIG` (default `reqmeter.yaml`)
//! - log filter: `$RUST_LOG`

use std::net::SocketAddr;

use tracing_subscriber::{fmt, EnvFilter};

use reqmeter_agent::{config, router, Reporter};
use reqmeter_core::ReqMeterError;

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    if let Err(e) = run().await {
        tracing::error!(code = e.kind().as_str(), error = %e, "reqmeter-agent failed");
        std::process::exit(1);
    }
}

async fn run() -> reqmeter_core::Result<()> {
    let path = std::env::var("REQMETER_CONFIG").unwrap_or_else(|_| "reqmeter.yaml".into());
    let cfg = config::load_from_file(&path)?;
    let listen: SocketAddr = cfg.server.listen.parse().map_err(|e| {
        ReqMeterError::InvalidConfig(format!("server.listen must be a valid SocketAddr: {e}"))
    })?;

    let reporter = Reporter::new(cfg)?;
    reporter.start()?;

    let app = router::build_router(reporter.clone());

    tracing::info!(%listen, "reqmeter-agent starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| ReqMeterError::Internal(format!("bind failed: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("shutdown signal received"),
                Err(e) => {
                    // no signal source; serve until killed
                    tracing::warn!(error = %e, "ctrl-c handler unavailable");
                    std::future::pending::<()>().await;
                }
            }
        })
        .await
        .map_err(|e| ReqMeterError::Internal(format!("server failed: {e}")))?;

    reporter.shutdown().await
}
