use super::{ApiError, BodyParseError, HandlerError};
use crate::common::RequestSnapshot;
use crate::config::Env;
use crate::dispatcher::HandlerResponse;
use crate::response::ApiErrorResponse;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, warn};

/// Message used for malformed request bodies.
pub const INVALID_JSON_MESSAGE: &str = "Invalid json format";

/// Maps a recognizable error shape onto a taxonomy member.
///
/// Classifiers run in registration order before any built-in branch; the
/// first `Some` wins and is sent as-is.
pub trait ErrorClassifier: Send + Sync {
    fn classify(&self, error: &HandlerError) -> Option<ApiError>;
}

impl<F> ErrorClassifier for F
where
    F: Fn(&HandlerError) -> Option<ApiError> + Send + Sync,
{
    fn classify(&self, error: &HandlerError) -> Option<ApiError> {
        self(error)
    }
}

/// Notified of unclassified errors, off the response path.
///
/// A returned error is logged and otherwise ignored.
pub trait AlertHandler: Send + Sync {
    fn alert(&self, error: &HandlerError, request: &RequestSnapshot) -> anyhow::Result<()>;
}

impl<F> AlertHandler for F
where
    F: Fn(&HandlerError, &RequestSnapshot) -> anyhow::Result<()> + Send + Sync,
{
    fn alert(&self, error: &HandlerError, request: &RequestSnapshot) -> anyhow::Result<()> {
        self(error, request)
    }
}

/// Which branch an error was classified by, with the resulting error.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Custom(ApiError),
    MalformedBody(ApiError),
    Classified(ApiError),
    Unclassified(ApiError),
}

impl Classification {
    #[must_use]
    pub fn api_error(&self) -> &ApiError {
        match self {
            Classification::Custom(e)
            | Classification::MalformedBody(e)
            | Classification::Classified(e)
            | Classification::Unclassified(e) => e,
        }
    }

    #[must_use]
    pub fn into_api_error(self) -> ApiError {
        match self {
            Classification::Custom(e)
            | Classification::MalformedBody(e)
            | Classification::Classified(e)
            | Classification::Unclassified(e) => e,
        }
    }
}

/// Funnel turning any handler failure into one uniform JSON error response.
///
/// Branches, first match wins:
///
/// 1. a registered [`ErrorClassifier`] recognizes the error;
/// 2. the request body failed to parse ([`BodyParseError`]) → 400 `BAD_REQUEST`;
/// 3. the error already is an [`ApiError`] → unchanged;
/// 4. anything else → 500 `INTERNAL_ERROR`, with diagnostics attached outside
///    production and the alert handler (if any) notified on a detached thread.
#[derive(Clone)]
pub struct ErrorHandler {
    env: Env,
    classifiers: Vec<Arc<dyn ErrorClassifier>>,
    alert_handler: Option<Arc<dyn AlertHandler>>,
}

impl fmt::Debug for ErrorHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorHandler")
            .field("env", &self.env)
            .field("classifiers", &self.classifiers.len())
            .field("alert_handler", &self.alert_handler.is_some())
            .finish()
    }
}

impl ErrorHandler {
    #[must_use]
    pub fn new(env: Env) -> Self {
        Self {
            env,
            classifiers: Vec::new(),
            alert_handler: None,
        }
    }

    /// Append a classifier after those already registered.
    #[must_use]
    pub fn with_classifier<C: ErrorClassifier + 'static>(mut self, classifier: C) -> Self {
        self.classifiers.push(Arc::new(classifier));
        self
    }

    #[must_use]
    pub fn with_alert_handler(mut self, handler: Arc<dyn AlertHandler>) -> Self {
        self.alert_handler = Some(handler);
        self
    }

    #[must_use]
    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Pure classification step; no logging, no alerting.
    #[must_use]
    pub fn classify(&self, error: &HandlerError) -> Classification {
        if let Some(api_error) = self.classifiers.iter().find_map(|c| c.classify(error)) {
            return Classification::Custom(api_error);
        }
        if error.is::<BodyParseError>() {
            return Classification::MalformedBody(ApiError::with_message(
                super::ErrorKind::BadRequest,
                INVALID_JSON_MESSAGE,
            ));
        }
        if let Some(api_error) = error.downcast_ref::<ApiError>() {
            return Classification::Classified(api_error.clone());
        }
        let mut internal = ApiError::internal();
        if !self.env.is_prod() {
            match serde_json::to_value(error.diagnostics()) {
                Ok(data) => internal.set_data(data),
                Err(e) => warn!(error = %e, "Failed to serialize error diagnostics"),
            }
        }
        Classification::Unclassified(internal)
    }

    /// Classify `error`, log it, alert when unclassified, and render the response.
    pub fn handle(&self, error: HandlerError, request: RequestSnapshot) -> HandlerResponse {
        let classification = self.classify(&error);
        match &classification {
            Classification::Custom(api_error) => {
                let data = api_error.data().map(ToString::to_string).unwrap_or_default();
                error!(
                    method = %request.method,
                    path = %request.path,
                    code = %api_error.code(),
                    error = %error,
                    data = %data,
                    "Request failed (custom mapping)"
                );
            }
            Classification::MalformedBody(_) => {
                debug!(method = %request.method, path = %request.path, error = %error, "Malformed request body");
            }
            Classification::Classified(api_error) => {
                debug!(
                    method = %request.method,
                    path = %request.path,
                    status = api_error.http_status_code(),
                    code = %api_error.code(),
                    "Request failed"
                );
            }
            Classification::Unclassified(_) => {
                error!(
                    method = %request.method,
                    path = %request.path,
                    error_name = %error.name(),
                    error = %error,
                    stack = %error.stack(),
                    "Unhandled error"
                );
                if let Some(alert) = &self.alert_handler {
                    spawn_alert(Arc::clone(alert), error, request);
                }
            }
        }
        Self::render(classification.api_error())
    }

    /// `{status:"error", message, errorCode, errors?}` with the error's status.
    #[must_use]
    pub fn render(api_error: &ApiError) -> HandlerResponse {
        let body = ApiErrorResponse::from_api_error(api_error);
        match serde_json::to_value(&body) {
            Ok(json) => HandlerResponse::json(api_error.http_status_code(), json),
            Err(e) => {
                error!(error = %e, "Failed to serialize error response");
                HandlerResponse::json(
                    500,
                    serde_json::json!({
                        "status": "error",
                        "message": ApiError::internal().message(),
                        "errorCode": ApiError::internal().code(),
                    }),
                )
            }
        }
    }
}

fn spawn_alert(alert: Arc<dyn AlertHandler>, error: HandlerError, request: RequestSnapshot) {
    let spawned = thread::Builder::new()
        .name("error-alert".to_string())
        .spawn(move || {
            match panic::catch_unwind(AssertUnwindSafe(|| alert.alert(&error, &request))) {
                Ok(Ok(())) => debug!(path = %request.path, "Alert delivered"),
                Ok(Err(e)) => error!(path = %request.path, error = %e, "Alert handler failed"),
                Err(_) => error!(path = %request.path, "Alert handler panicked"),
            }
        });
    if let Err(e) = spawned {
        error!(error = %e, "Could not start alert thread");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::{json, Value};
    use std::sync::mpsc;
    use std::time::Duration;

    fn snapshot() -> RequestSnapshot {
        RequestSnapshot {
            method: "GET".into(),
            path: "/users/1".into(),
            query: Default::default(),
            user_id: Some("u-1".into()),
        }
    }

    #[test]
    fn test_classified_error_passes_through() {
        let handler = ErrorHandler::new(Env::Prod);
        let res = handler.handle(ApiError::not_found().into(), snapshot());
        assert_eq!(res.status, 404);
        assert_eq!(
            res.body,
            json!({"status": "error", "message": "Resource not found", "errorCode": "NOT_FOUND"})
        );
    }

    #[test]
    fn test_classifiers_run_first_in_order() {
        let handler = ErrorHandler::new(Env::Dev)
            .with_classifier(|e: &HandlerError| {
                e.message()
                    .contains("too large")
                    .then(|| ApiError::file_too_big().with_data(json!({"limit": "1mb"})))
            })
            .with_classifier(|_e: &HandlerError| Some(ApiError::forbidden()));

        let first = handler.classify(&HandlerError::msg("payload too large"));
        assert_eq!(
            first,
            Classification::Custom(ApiError::file_too_big().with_data(json!({"limit": "1mb"})))
        );
        let second = handler.classify(&ApiError::not_found().into());
        assert_eq!(second.api_error().kind(), Some(ErrorKind::Forbidden));
    }

    #[test]
    fn test_custom_mapping_renders_data_through_handle() {
        let handler = ErrorHandler::new(Env::Prod).with_classifier(|e: &HandlerError| {
            e.message()
                .contains("quota")
                .then(|| ApiError::too_many_requests().with_data(json!({"retryAfter": 30})))
        });
        let res = tracing::subscriber::with_default(
            crate::logging::console_subscriber("debug"),
            || handler.handle(HandlerError::msg("quota exceeded"), snapshot()),
        );
        assert_eq!(res.status, 429);
        assert_eq!(
            res.body,
            json!({
                "status": "error",
                "message": ApiError::too_many_requests().message(),
                "errorCode": "TOO_MANY_REQUESTS",
                "errors": {"retryAfter": 30}
            })
        );

        let bare = ErrorHandler::new(Env::Prod)
            .with_classifier(|_e: &HandlerError| Some(ApiError::forbidden()));
        let res = bare.handle(HandlerError::msg("nope"), snapshot());
        assert_eq!(res.status, 403);
        assert!(res.body.get("errors").is_none());
    }

    #[test]
    fn test_body_parse_error_is_bad_request() {
        let parse = serde_json::from_str::<Value>("{").unwrap_err();
        let err: HandlerError = BodyParseError::from(parse).into();
        let res = ErrorHandler::new(Env::Dev).handle(err, snapshot());
        assert_eq!(res.status, 400);
        assert_eq!(res.body["errorCode"], "BAD_REQUEST");
        assert_eq!(res.body["message"], INVALID_JSON_MESSAGE);
    }

    #[test]
    fn test_unclassified_outside_prod_carries_diagnostics() {
        let res = ErrorHandler::new(Env::Dev).handle(HandlerError::msg("db down"), snapshot());
        assert_eq!(res.status, 500);
        assert_eq!(res.body["errorCode"], "INTERNAL_ERROR");
        assert_eq!(res.body["message"], "Internal error");
        assert_eq!(res.body["errors"]["name"], "Error");
        assert_eq!(res.body["errors"]["message"], "db down");
        assert!(res.body["errors"].get("stack").is_some());
        assert!(res.body["errors"].get("cause").is_some());
    }

    #[test]
    fn test_unclassified_in_prod_hides_diagnostics() {
        let res = ErrorHandler::new(Env::Prod).handle(HandlerError::msg("db down"), snapshot());
        assert_eq!(res.status, 500);
        assert_eq!(
            res.body,
            json!({"status": "error", "message": "Internal error", "errorCode": "INTERNAL_ERROR"})
        );
    }

    #[test]
    fn test_alert_runs_off_thread_and_failures_are_swallowed() {
        let (tx, rx) = mpsc::channel();
        let tx = std::sync::Mutex::new(tx);
        let alert = move |e: &HandlerError, req: &RequestSnapshot| -> anyhow::Result<()> {
            let _ = tx
                .lock()
                .map(|tx| tx.send((e.message(), req.user_id.clone())));
            anyhow::bail!("pager offline")
        };
        let handler = ErrorHandler::new(Env::Prod).with_alert_handler(Arc::new(alert));
        let res = handler.handle(HandlerError::msg("db down"), snapshot());
        assert_eq!(res.status, 500);
        let (message, user) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(message, "db down");
        assert_eq!(user.as_deref(), Some("u-1"));
    }

    #[test]
    fn test_alert_not_called_for_classified_errors() {
        let (tx, rx) = mpsc::channel::<()>();
        let tx = std::sync::Mutex::new(tx);
        let alert = move |_e: &HandlerError, _req: &RequestSnapshot| -> anyhow::Result<()> {
            let _ = tx.lock().map(|tx| tx.send(()));
            Ok(())
        };
        let handler = ErrorHandler::new(Env::Dev).with_alert_handler(Arc::new(alert));
        handler.handle(ApiError::bad_request().into(), snapshot());
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }
}
