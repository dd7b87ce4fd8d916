//! Success and error wire envelopes.

use crate::dispatcher::HandlerResponse;
use crate::error::{ApiError, HandlerError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const STATUS_OK: &str = "ok";
pub const STATUS_ERROR: &str = "error";

/// `{status:"ok", result?}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T = Value> {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(result: T) -> Self {
        Self {
            status: STATUS_OK.to_string(),
            result: Some(result),
        }
    }

    pub fn empty() -> Self {
        Self {
            status: STATUS_OK.to_string(),
            result: None,
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// JSON response with the given HTTP status.
    pub fn into_response(self, status: u16) -> Result<HandlerResponse, HandlerError> {
        Ok(HandlerResponse::json(status, serde_json::to_value(self)?))
    }
}

/// `{status:"error", message, errorCode, errors?}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorResponse<T = Value> {
    pub status: String,
    pub message: String,
    #[serde(rename = "errorCode")]
    pub error_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<T>,
}

impl ApiErrorResponse<Value> {
    #[must_use]
    pub fn from_api_error(error: &ApiError) -> Self {
        Self {
            status: STATUS_ERROR.to_string(),
            message: error.message().to_string(),
            error_code: error.code().to_string(),
            errors: error.data().cloned(),
        }
    }
}
