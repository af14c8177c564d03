//! HTTP surface: route table, shared state and server lifecycle.

mod handlers;
mod response;

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::client::SmsSender;
use crate::config::{Config, Environment};
use crate::domain::{ApiKey, PhoneNumber, SenderId, Username};

pub use response::{ErrorBody, SendSuccess};

/// Name reported by the informational endpoints.
pub const SERVICE_NAME: &str = env!("CARGO_PKG_NAME");

/// Read-only state shared by every request.
pub struct AppState {
    sender: Arc<dyn SmsSender>,
    environment: Environment,
    username: Username,
    api_key: ApiKey,
    endpoint: String,
    port: u16,
    test_recipient: PhoneNumber,
    test_sender: SenderId,
    start_time: Instant,
}

impl AppState {
    /// `endpoint` is the vendor URL the sender posts to, shown by `/debug`.
    pub fn new(config: &Config, sender: Arc<dyn SmsSender>, endpoint: impl Into<String>) -> Self {
        Self {
            sender,
            environment: config.environment,
            username: config.username.clone(),
            api_key: config.api_key.clone(),
            endpoint: endpoint.into(),
            port: config.port,
            test_recipient: config.test_recipient.clone(),
            test_sender: config.test_sender.clone(),
            start_time: Instant::now(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Build the gateway router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::service_info).post(handlers::send_sms))
        .route("/health", get(handlers::health))
        .route("/debug", get(handlers::debug_info))
        .route("/test", post(handlers::send_test_sms))
        .route("/delivery", post(handlers::delivery_report))
        .fallback(handlers::not_found)
        .layer(CatchPanicLayer::custom(response::panic_response))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until Ctrl-C or SIGTERM, then drain in-flight requests.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "sms gateway listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => (),
        _ = terminate => (),
    }
    info!("shutdown signal received, draining requests");
}
