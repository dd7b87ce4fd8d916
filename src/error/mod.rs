//! # Error Module
//!
//! The client-facing error taxonomy and the pipeline that renders failures.
//!
//! - [`ApiError`] / [`ErrorKind`] - classified errors with a pinned HTTP
//!   status and machine code
//! - [`HandlerError`] - whatever a handler fails with, converted by `?`
//! - [`ErrorHandler`] - classifies a [`HandlerError`] into exactly one
//!   [`ApiError`] and renders `{status:"error", message, errorCode, errors?}`

mod api_error;
mod body;
mod handler_error;
mod pipeline;

pub use api_error::{ApiError, ErrorKind};
pub use body::BodyParseError;
pub use handler_error::{ErrorDiagnostics, HandlerError};
pub use pipeline::{
    AlertHandler, Classification, ErrorClassifier, ErrorHandler, INVALID_JSON_MESSAGE,
};
