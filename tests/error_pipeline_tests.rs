//! Integration tests for the error pipeline as seen through `App`
//!
//! Handler failures of every kind must come back as the uniform
//! `{status:"error", message, errorCode, errors?}` envelope with the right
//! HTTP status, and unclassified failures must reach the alert hook.

use expressive::common::RequestSnapshot;
use expressive::config::Env;
use expressive::dispatcher::{handler, HandlerRequest, HandlerResult};
use expressive::error::{ApiError, ErrorHandler, ErrorKind, HandlerError};
use expressive::openapi::HttpMethod;
use expressive::router::{RouteSink, Router};
use expressive::server::{parse_request, App, RawRequest, DEFAULT_MAX_BODY_BYTES};
use http::Method;
use serde_json::json;
use std::error::Error as StdError;
use std::fmt;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug)]
struct DiskFull;

impl fmt::Display for DiskFull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("no space left on device")
    }
}

impl StdError for DiskFull {}

#[derive(Debug)]
struct UploadFailed(DiskFull);

impl fmt::Display for UploadFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("upload failed")
    }
}

impl StdError for UploadFailed {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.0)
    }
}

fn failing_app(error_handler: ErrorHandler) -> App {
    let mut router = Router::new();
    router.register(
        HttpMethod::Get,
        "/missing",
        vec![handler(|_req: &mut HandlerRequest| -> HandlerResult {
            Err(ApiError::not_found().into())
        })],
    );
    router.register(
        HttpMethod::Post,
        "/upload",
        vec![handler(|_req: &mut HandlerRequest| -> HandlerResult {
            Err(UploadFailed(DiskFull).into())
        })],
    );
    router.register(
        HttpMethod::Get,
        "/boom",
        vec![handler(|_req: &mut HandlerRequest| -> HandlerResult {
            panic!("handler exploded")
        })],
    );
    router.register(
        HttpMethod::Post,
        "/echo",
        vec![handler(|_req: &mut HandlerRequest| -> HandlerResult {
            Err(ApiError::internal().into())
        })],
    );
    App::new(error_handler).mount(router)
}

#[test]
fn test_named_api_error_keeps_status_and_code() {
    let res = failing_app(ErrorHandler::new(Env::Dev)).call(HandlerRequest::new(Method::GET, "/missing"));
    assert_eq!(res.status, 404);
    assert_eq!(
        res.body,
        json!({"status": "error", "message": "Resource not found", "errorCode": "NOT_FOUND"})
    );
}

#[test]
fn test_unclassified_error_in_dev_carries_diagnostics() {
    let res = failing_app(ErrorHandler::new(Env::Dev)).call(HandlerRequest::new(Method::POST, "/upload"));
    assert_eq!(res.status, 500);
    assert_eq!(res.body["status"], "error");
    assert_eq!(res.body["errorCode"], "INTERNAL_ERROR");
    assert_eq!(res.body["message"], "Internal error");
    assert_eq!(res.body["errors"]["name"], "UploadFailed");
    assert_eq!(res.body["errors"]["message"], "upload failed");
    assert_eq!(res.body["errors"]["cause"], "no space left on device");
    assert!(res.body["errors"]["stack"].is_string());
}

#[test]
fn test_unclassified_error_in_prod_hides_diagnostics() {
    let res = failing_app(ErrorHandler::new(Env::Prod)).call(HandlerRequest::new(Method::POST, "/upload"));
    assert_eq!(res.status, 500);
    assert_eq!(
        res.body,
        json!({"status": "error", "message": "Internal error", "errorCode": "INTERNAL_ERROR"})
    );
}

#[test]
fn test_panicking_handler_renders_internal_error() {
    let res = failing_app(ErrorHandler::new(Env::Dev)).call(HandlerRequest::new(Method::GET, "/boom"));
    assert_eq!(res.status, 500);
    assert_eq!(res.body["errorCode"], "INTERNAL_ERROR");
    assert_eq!(res.body["errors"]["name"], "Panic");
    assert_eq!(res.body["errors"]["message"], "handler exploded");
}

#[test]
fn test_malformed_json_body_is_bad_request() {
    let raw = RawRequest {
        method: "POST".to_string(),
        url: "/echo".to_string(),
        headers: vec![("Content-Type".to_string(), "application/json".to_string())],
        body: b"{\"name\": ".to_vec(),
        remote_addr: None,
    };
    let parsed = parse_request(raw, DEFAULT_MAX_BODY_BYTES);
    let res = failing_app(ErrorHandler::new(Env::Dev)).handle(parsed.request, parsed.error);
    assert_eq!(res.status, 400);
    assert_eq!(
        res.body,
        json!({"status": "error", "message": "Invalid json format", "errorCode": "BAD_REQUEST"})
    );
}

#[test]
fn test_custom_classifier_takes_precedence() {
    let handler = ErrorHandler::new(Env::Prod).with_classifier(|err: &HandlerError| {
        err.is::<UploadFailed>()
            .then(|| ApiError::of(ErrorKind::FileTooBig).with_data(json!([{"field": "file"}])))
    });
    let res = failing_app(handler).call(HandlerRequest::new(Method::POST, "/upload"));
    assert_eq!(res.status, ErrorKind::FileTooBig.http_status_code());
    assert_eq!(res.body["errorCode"], ErrorKind::FileTooBig.code());
    assert_eq!(res.body["errors"], json!([{"field": "file"}]));
}

#[test]
fn test_alert_receives_unclassified_errors_only() {
    let (tx, rx) = mpsc::channel::<(String, RequestSnapshot)>();
    let tx = std::sync::Mutex::new(tx);
    let alert = move |err: &HandlerError, req: &RequestSnapshot| -> anyhow::Result<()> {
        tx.lock()
            .map_err(|_| anyhow::anyhow!("poisoned"))?
            .send((err.message(), req.clone()))?;
        Ok(())
    };
    let app = failing_app(ErrorHandler::new(Env::Prod).with_alert_handler(Arc::new(alert)));

    let res = app.call(HandlerRequest::new(Method::GET, "/missing"));
    assert_eq!(res.status, 404);
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());

    let res = app.call(HandlerRequest::new(Method::POST, "/upload?retry=1"));
    assert_eq!(res.status, 500);
    let (message, snapshot) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(message, "upload failed");
    assert_eq!(snapshot.method, "POST");
    assert_eq!(snapshot.path, "/upload");
    assert_eq!(snapshot.query.get("retry").map(String::as_str), Some("1"));
}
