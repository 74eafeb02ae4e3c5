use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or form key that caused the error (e.g., "request.operation", "image[]")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Stage that produced the error (e.g., "auth", "image_edit", "tts")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Stable classification of [`Error`], for callers rendering provider-agnostic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Auth,
    Validation,
    Serialization,
    UnsupportedCapability,
    Upstream,
    Transport,
    Configuration,
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "auth_error",
            Self::Validation => "validation_error",
            Self::Serialization => "serialization_error",
            Self::UnsupportedCapability => "unsupported_capability",
            Self::Upstream => "upstream_error",
            Self::Transport => "transport_error",
            Self::Configuration => "configuration_error",
            Self::Io => "io_error",
        }
    }
}

/// Unified error type for the channel adaptor.
///
/// Validation, serialization and auth failures are raised before any network
/// call is attempted. Upstream failures carry the vendor status and body and
/// are never retried here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Auth error: {message}{}", format_context(.context))]
    Auth {
        message: String,
        context: ErrorContext,
    },

    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    #[error("Serialization error: {message}{}", format_context(.context))]
    Serialization {
        message: String,
        context: ErrorContext,
    },

    #[error("Unsupported capability: {message}{}", format_context(.context))]
    UnsupportedCapability {
        message: String,
        context: ErrorContext,
    },

    #[error("Upstream error: HTTP {status}: {message}")]
    Upstream {
        status: u16,
        message: String,
        body: String,
    },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Network transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization {
            message: err.to_string(),
            context: ErrorContext::new(),
        }
    }
}

impl Error {
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::auth_with_context(msg, ErrorContext::new())
    }

    pub fn auth_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Auth {
            message: msg.into(),
            context,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::validation_with_context(msg, ErrorContext::new())
    }

    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::serialization_with_context(msg, ErrorContext::new())
    }

    pub fn serialization_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Serialization {
            message: msg.into(),
            context,
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::unsupported_with_context(msg, ErrorContext::new())
    }

    pub fn unsupported_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::UnsupportedCapability {
            message: msg.into(),
            context,
        }
    }

    /// The fixed failure for conversions this channel deliberately does not implement.
    pub fn not_implemented(what: &str) -> Self {
        Self::unsupported_with_context(
            "not implemented",
            ErrorContext::new().with_details(what.to_string()),
        )
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::configuration_with_context(msg, ErrorContext::new())
    }

    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn upstream(status: u16, message: impl Into<String>, body: impl Into<String>) -> Self {
        Error::Upstream {
            status,
            message: message.into(),
            body: body.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Auth { .. } => ErrorKind::Auth,
            Error::Validation { .. } => ErrorKind::Validation,
            Error::Serialization { .. } => ErrorKind::Serialization,
            Error::UnsupportedCapability { .. } => ErrorKind::UnsupportedCapability,
            Error::Upstream { .. } => ErrorKind::Upstream,
            Error::Configuration { .. } => ErrorKind::Configuration,
            Error::Transport(_) => ErrorKind::Transport,
            Error::Io(_) => ErrorKind::Io,
        }
    }

    /// HTTP status the relay should answer with.
    ///
    /// Upstream errors keep the vendor status; local failures map to a fixed code.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Upstream { status, .. } => *status,
            Error::Auth { .. } | Error::Validation { .. } | Error::Serialization { .. } => 400,
            Error::UnsupportedCapability { .. } => 501,
            Error::Transport(_) => 502,
            Error::Configuration { .. } | Error::Io(_) => 500,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Auth { context, .. }
            | Error::Validation { context, .. }
            | Error::Serialization { context, .. }
            | Error::UnsupportedCapability { context, .. }
            | Error::Configuration { context, .. } => Some(context),
            _ => None,
        }
    }
}
