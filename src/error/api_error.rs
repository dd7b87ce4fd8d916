use serde_json::Value;
use std::fmt;

/// The named members of the error taxonomy.
///
/// Each kind pins an HTTP status, a stable machine code and a default
/// client-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Duplicate,
    BadRequest,
    SchemaValidation,
    FileTooBig,
    InvalidFileType,
    InvalidCredentials,
    Internal,
    TooManyRequests,
    Forbidden,
    TokenExpired,
    UserUnauthorized,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 12] = [
        ErrorKind::NotFound,
        ErrorKind::Duplicate,
        ErrorKind::BadRequest,
        ErrorKind::SchemaValidation,
        ErrorKind::FileTooBig,
        ErrorKind::InvalidFileType,
        ErrorKind::InvalidCredentials,
        ErrorKind::Internal,
        ErrorKind::TooManyRequests,
        ErrorKind::Forbidden,
        ErrorKind::TokenExpired,
        ErrorKind::UserUnauthorized,
    ];

    #[must_use]
    pub fn http_status_code(self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::Duplicate => 409,
            ErrorKind::BadRequest
            | ErrorKind::SchemaValidation
            | ErrorKind::FileTooBig
            | ErrorKind::InvalidFileType => 400,
            ErrorKind::InvalidCredentials | ErrorKind::TokenExpired | ErrorKind::UserUnauthorized => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::TooManyRequests => 429,
            ErrorKind::Internal => 500,
        }
    }

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Duplicate => "DUPLICATE_ENTRY",
            ErrorKind::BadRequest => "BAD_REQUEST",
            ErrorKind::SchemaValidation => "SCHEMA_VALIDATION_ERROR",
            ErrorKind::FileTooBig => "FILE_TOO_BIG",
            ErrorKind::InvalidFileType => "INVALID_FILE_TYPE",
            ErrorKind::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorKind::Internal => "INTERNAL_ERROR",
            ErrorKind::TooManyRequests => "TOO_MANY_REQUESTS",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::TokenExpired => "TOKEN_EXPIRED",
            ErrorKind::UserUnauthorized => "USER_UNAUTHORIZED",
        }
    }

    #[must_use]
    pub fn default_message(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "Resource not found",
            ErrorKind::Duplicate => "Duplicate entry",
            ErrorKind::BadRequest => "Bad request",
            ErrorKind::SchemaValidation => "Failed to validate Schema",
            ErrorKind::FileTooBig => "File too big",
            ErrorKind::InvalidFileType => "Invalid file type",
            ErrorKind::InvalidCredentials => "Invalid credentials",
            ErrorKind::Internal => "Internal error",
            ErrorKind::TooManyRequests => "Too many requests",
            ErrorKind::Forbidden => "Action not allowed",
            ErrorKind::TokenExpired => "Token Expired",
            ErrorKind::UserUnauthorized => "User unauthorized",
        }
    }

    /// Kind whose code is `code`, if it is one of the named members.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        ErrorKind::ALL.into_iter().find(|k| k.code() == code)
    }
}

/// A classified, client-safe error.
///
/// Message, status and code are fixed at construction; only `data` may be
/// attached afterwards.
///
/// ```
/// use expressive::error::ApiError;
/// use serde_json::json;
///
/// let err = ApiError::not_found().with_data(json!({ "id": 7 }));
/// assert_eq!(err.http_status_code(), 404);
/// assert_eq!(err.code(), "NOT_FOUND");
/// assert_eq!(err.message(), "Resource not found");
///
/// let invalid_id = ApiError::new("Invalid Id", 400, "INVALID_ID");
/// assert_eq!(invalid_id.kind(), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    message: String,
    http_status_code: u16,
    code: String,
    data: Option<Value>,
}

impl ApiError {
    /// Define an ad-hoc taxonomy member.
    pub fn new(message: impl Into<String>, http_status_code: u16, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            http_status_code,
            code: code.into(),
            data: None,
        }
    }

    /// Named member with its default message.
    #[must_use]
    pub fn of(kind: ErrorKind) -> Self {
        Self::new(kind.default_message(), kind.http_status_code(), kind.code())
    }

    /// Named member with a custom message; status and code stay pinned.
    pub fn with_message(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::new(message, kind.http_status_code(), kind.code())
    }

    #[must_use]
    pub fn not_found() -> Self {
        Self::of(ErrorKind::NotFound)
    }

    #[must_use]
    pub fn duplicate() -> Self {
        Self::of(ErrorKind::Duplicate)
    }

    #[must_use]
    pub fn bad_request() -> Self {
        Self::of(ErrorKind::BadRequest)
    }

    #[must_use]
    pub fn schema_validation() -> Self {
        Self::of(ErrorKind::SchemaValidation)
    }

    #[must_use]
    pub fn file_too_big() -> Self {
        Self::of(ErrorKind::FileTooBig)
    }

    #[must_use]
    pub fn invalid_file_type() -> Self {
        Self::of(ErrorKind::InvalidFileType)
    }

    #[must_use]
    pub fn invalid_credentials() -> Self {
        Self::of(ErrorKind::InvalidCredentials)
    }

    #[must_use]
    pub fn internal() -> Self {
        Self::of(ErrorKind::Internal)
    }

    #[must_use]
    pub fn too_many_requests() -> Self {
        Self::of(ErrorKind::TooManyRequests)
    }

    #[must_use]
    pub fn forbidden() -> Self {
        Self::of(ErrorKind::Forbidden)
    }

    #[must_use]
    pub fn token_expired() -> Self {
        Self::of(ErrorKind::TokenExpired)
    }

    #[must_use]
    pub fn user_unauthorized() -> Self {
        Self::of(ErrorKind::UserUnauthorized)
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        self.http_status_code
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Named kind matching this error's code, `None` for ad-hoc members.
    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        ErrorKind::from_code(&self.code)
    }

    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.http_status_code >= 500
    }

    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn set_data(&mut self, data: Value) {
        self.data = Some(data);
    }

    pub fn take_data(&mut self) -> Option<Value> {
        self.data.take()
    }
}

impl From<ErrorKind> for ApiError {
    fn from(kind: ErrorKind) -> Self {
        ApiError::of(kind)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.code, self.http_status_code, self.message)
    }
}

impl std::error::Error for ApiError {}
