//! Request logging and panic handling

use super::BODY_LIMIT;
use crate::core::{Logger, Meta, MetaValue};
use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::any::Any;
use std::net::SocketAddr;

/// Log every request as `info_with(path, "http", {ip, method, query, body})`
///
/// The body is buffered so it can be logged, then handed on unchanged.
pub async fn log_request(State(logger): State<Logger>, req: Request<Body>, next: Next) -> Response {
    let (parts, body) = req.into_parts();

    let bytes = match axum::body::to_bytes(body, BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(e) => {
            logger.warn_with(
                "Request body rejected",
                "http",
                Meta::new()
                    .with("path", parts.uri.path())
                    .with("error", e.to_string()),
            );
            return error_response(StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large");
        }
    };

    let body_meta = match parse_body(&parts.headers, &bytes) {
        Ok(value) => value,
        Err(e) => {
            logger.warn_with(
                "Malformed JSON body",
                "http",
                Meta::new()
                    .with("path", parts.uri.path())
                    .with("error", e.to_string()),
            );
            return error_response(StatusCode::BAD_REQUEST, "Bad Request");
        }
    };

    let ip = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    logger.info_with(
        parts.uri.path(),
        "http",
        Meta::new()
            .with("ip", ip)
            .with("method", parts.method.as_str())
            .with("query", parse_query(parts.uri.query()))
            .with("body", body_meta),
    );

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

/// Query string as a mapping; repeated keys keep the last value
pub fn parse_query(query: Option<&str>) -> Meta {
    query
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

/// Body as JSON or urlencoded form, by content type; anything else is `{}`
pub fn parse_body(headers: &HeaderMap, bytes: &Bytes) -> Result<MetaValue, serde_json::Error> {
    if bytes.is_empty() {
        return Ok(MetaValue::Map(Meta::new()));
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("application/json") || content_type.contains("+json") {
        let value: serde_json::Value = serde_json::from_slice(bytes)?;
        Ok(MetaValue::from(value))
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        let form: Meta = url::form_urlencoded::parse(bytes).into_owned().collect();
        Ok(MetaValue::Map(form))
    } else {
        Ok(MetaValue::Map(Meta::new()))
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}

/// Build the handler that turns a handler panic into a logged 500
pub fn panic_responder(logger: Logger) -> impl Fn(Box<dyn Any + Send + 'static>) -> Response + Clone {
    move |panic: Box<dyn Any + Send + 'static>| {
        let detail = if let Some(s) = panic.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic.downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        logger.error_with(
            "Unhandled request error",
            "http",
            Meta::new().with("errorMsg", detail),
        );
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    }
}
