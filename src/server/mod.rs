//! HTTP server setup
//!
//! Two fixed endpoints behind CORS, a body limit, request logging and a
//! panic catcher. Every log line goes through the shared [`Logger`].

pub mod handlers;
pub mod middleware;

use crate::core::{Logger, Meta};
use axum::{http::Method, routing::get, Router};
use std::net::SocketAddr;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
};

/// Maximum accepted request body (10 MB)
pub const BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Application state injected into handlers
#[derive(Clone, Debug)]
pub struct AppState {
    pub logger: Logger,
    pub started: Instant,
}

impl AppState {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            started: Instant::now(),
        }
    }
}

/// Build the service router with all middleware layers
pub fn router(state: AppState) -> Router {
    let logger = state.logger.clone();
    let routes = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .with_state(state);

    with_middleware(routes, logger)
}

/// Wrap `router` in request logging, body limit, CORS and panic catching
pub fn with_middleware(router: Router, logger: Logger) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST]);

    router
        .layer(axum::middleware::from_fn_with_state(
            logger.clone(),
            middleware::log_request,
        ))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(cors)
        .layer(CatchPanicLayer::custom(middleware::panic_responder(logger)))
}

/// Serve until Ctrl-C, then finish in-flight requests
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    let logger = state.logger.clone();
    let app = router(state).into_make_service_with_connect_info::<SocketAddr>();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(logger))
        .await
}

async fn shutdown_signal(logger: Logger) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => logger.info_with("Shutdown signal received", "server", Meta::new()),
        Err(e) => {
            logger.error_with(
                "Failed to install Ctrl-C handler",
                "server",
                Meta::new().with_error("error", &e),
            );
            // Without a signal handler, run until the process is killed
            std::future::pending::<()>().await;
        }
    }
}
