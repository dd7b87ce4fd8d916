use std::fmt;

/// The request body could not be parsed as its declared content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyParseError {
    pub content_type: String,
    pub reason: String,
}

impl BodyParseError {
    pub fn new(content_type: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for BodyParseError {
    fn from(err: serde_json::Error) -> Self {
        BodyParseError::new("application/json", err.to_string())
    }
}

impl fmt::Display for BodyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed {} body: {}", self.content_type, self.reason)
    }
}

impl std::error::Error for BodyParseError {}
