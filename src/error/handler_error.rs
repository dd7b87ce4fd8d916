use serde::Serialize;
use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error as StdError;
use std::fmt;

enum Inner {
    Boxed(Box<dyn StdError + Send + Sync + 'static>),
    Anyhow(anyhow::Error),
}

/// Any failure raised by a handler.
///
/// Keeps the original error (so the pipeline can downcast it), the short type
/// name it was raised as, and a backtrace captured at conversion time
/// (honours `RUST_BACKTRACE`).
///
/// Every `std::error::Error + Send + Sync` converts with `?`. `HandlerError`
/// itself is deliberately not a `std::error::Error`, so that blanket
/// conversion stays coherent.
pub struct HandlerError {
    inner: Inner,
    name: String,
    backtrace: Backtrace,
}

/// Debug payload describing an unclassified error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDiagnostics {
    pub name: String,
    pub message: String,
    pub stack: String,
    pub cause: Option<String>,
}

#[derive(Debug)]
struct MessageError(String);

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for MessageError {}

fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

impl HandlerError {
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            name: short_type_name::<E>(),
            inner: Inner::Boxed(Box::new(error)),
            backtrace: Backtrace::capture(),
        }
    }

    /// Ad-hoc error carrying only a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            name: "Error".to_string(),
            inner: Inner::Boxed(Box::new(MessageError(message.into()))),
            backtrace: Backtrace::capture(),
        }
    }

    pub fn from_anyhow(error: anyhow::Error) -> Self {
        Self {
            name: "Error".to_string(),
            inner: Inner::Anyhow(error),
            backtrace: Backtrace::capture(),
        }
    }

    /// Wrap a payload caught by `catch_unwind`.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "handler panicked".to_string()
        };
        Self {
            name: "Panic".to_string(),
            inner: Inner::Boxed(Box::new(MessageError(message))),
            backtrace: Backtrace::capture(),
        }
    }

    /// Borrow the original error as `T`, looking through `anyhow` wrapping.
    #[must_use]
    pub fn downcast_ref<T>(&self) -> Option<&T>
    where
        T: StdError + Send + Sync + 'static,
    {
        match &self.inner {
            Inner::Boxed(e) => e.downcast_ref::<T>(),
            Inner::Anyhow(e) => e.downcast_ref::<T>(),
        }
    }

    #[must_use]
    pub fn is<T>(&self) -> bool
    where
        T: StdError + Send + Sync + 'static,
    {
        self.downcast_ref::<T>().is_some()
    }

    /// Short type name of the original error (`"Panic"` for panics).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn message(&self) -> String {
        match &self.inner {
            Inner::Boxed(e) => e.to_string(),
            Inner::Anyhow(e) => e.to_string(),
        }
    }

    /// Message of the underlying cause, if the error has one.
    #[must_use]
    pub fn cause(&self) -> Option<String> {
        match &self.inner {
            Inner::Boxed(e) => e.source().map(ToString::to_string),
            Inner::Anyhow(e) => e.chain().nth(1).map(ToString::to_string),
        }
    }

    /// `"<name>: <message>"` followed by the backtrace when one was captured.
    #[must_use]
    pub fn stack(&self) -> String {
        let head = format!("{}: {}", self.name, self.message());
        match self.backtrace.status() {
            BacktraceStatus::Captured => format!("{head}\n{}", self.backtrace),
            _ => head,
        }
    }

    #[must_use]
    pub fn diagnostics(&self) -> ErrorDiagnostics {
        ErrorDiagnostics {
            name: self.name.clone(),
            message: self.message(),
            stack: self.stack(),
            cause: self.cause(),
        }
    }
}

impl<E> From<E> for HandlerError
where
    E: StdError + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        HandlerError::new(error)
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Inner::Boxed(e) => fmt::Display::fmt(e, f),
            Inner::Anyhow(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl fmt::Debug for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerError")
            .field("name", &self.name)
            .field("message", &self.message())
            .field("cause", &self.cause())
            .finish()
    }
}
