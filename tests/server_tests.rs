//! HTTP shell tests, driving the router without a socket

#![cfg(feature = "server")]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    routing::get,
    Router,
};
use ema_cross_bot::prelude::*;
use ema_cross_bot::server::{self, AppState};
use http_body_util::BodyExt;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<LogEntry>>>);

impl Recorder {
    fn entries(&self) -> Vec<LogEntry> {
        self.0.lock().clone()
    }
}

impl Transport for Recorder {
    fn log(&mut self, entry: &LogEntry) -> Result<()> {
        self.0.lock().push(entry.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "recorder"
    }
}

fn app() -> (Router, Recorder) {
    let recorder = Recorder::default();
    let logger = Logger::builder()
        .transport(LogLevel::Info, recorder.clone())
        .build()
        .expect("Failed to build logger");
    (server::router(AppState::new(logger)), recorder)
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is JSON")
}

#[tokio::test]
async fn test_root_endpoint() {
    let (app, _recorder) = app();

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "20-50 EMA Cross Over Bot");
    assert_eq!(body["version"], "0.1");
    assert!(body["timestamp"].is_string());
    assert_eq!(
        body["endPoints"],
        json!({"rootEndpoint": "/", "healthCheck": "/health", "baseURL": "/api"})
    );
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _recorder) = app();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "UP");
    let uptime = body["uptime"].as_str().expect("uptime is a string");
    assert!(uptime.ends_with('s'));
    assert!(uptime.trim_end_matches('s').parse::<f64>().is_ok());
}

#[tokio::test]
async fn test_requests_are_logged() {
    let (app, recorder) = app();

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/health?symbol=BTCUSDT&fast=20")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"dryRun":true}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let entries = recorder.entries();
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.level, LogLevel::Info);
    assert_eq!(entry.message, "/health");
    assert_eq!(entry.module.as_deref(), Some("http"));

    let meta = entry.meta.to_json_value();
    assert_eq!(meta["method"], "GET");
    assert_eq!(meta["ip"], "unknown");
    assert_eq!(meta["query"], json!({"symbol": "BTCUSDT", "fast": "20"}));
    assert_eq!(meta["body"], json!({"dryRun": true}));
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let (app, recorder) = app();

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{oops"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let entries = recorder.entries();
    assert_eq!(entries[0].level, LogLevel::Warn);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let (app, _recorder) = app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/")
                .header(header::ORIGIN, "https://dashboard.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_panicking_handler_is_logged_and_answered() {
    let recorder = Recorder::default();
    let logger = Logger::builder()
        .transport(LogLevel::Info, recorder.clone())
        .build()
        .expect("Failed to build logger");

    let routes = Router::new().route(
        "/boom",
        get(|| async {
            if true {
                panic!("strategy exploded");
            }
            "unreachable"
        }),
    );
    let app = server::with_middleware(routes, logger);

    let response = app
        .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = json_body(response).await;
    assert_eq!(body, json!({"success": false, "message": "Internal Server Error"}));

    let errors: Vec<LogEntry> = recorder
        .entries()
        .into_iter()
        .filter(|e| e.level == LogLevel::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "Unhandled request error");
    assert_eq!(errors[0].module.as_deref(), Some("http"));
    assert_eq!(errors[0].meta.get("errorMsg"), Some(&MetaValue::from("strategy exploded")));
}
