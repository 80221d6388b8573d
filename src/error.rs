//! Error types for Enkel.

use thiserror::Error;

/// Library-level error type for Enkel operations.
#[derive(Error, Debug)]
pub enum EnkelError {
    #[error("Source {0} is not supported. Choose 'document' or 'wikipedia'.")]
    UnsupportedSource(String),

    #[error("No document has been uploaded")]
    NoDocumentUploaded,

    #[error("Expected exactly one uploaded document, found {0}")]
    MultipleDocumentsUploaded(usize),

    #[error("{service} API error: {message}")]
    ExternalApi {
        service: &'static str,
        message: String,
        /// Whether the call may succeed if repeated (rate limit, 5xx, connection).
        transient: bool,
    },

    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl EnkelError {
    /// Build an external API error.
    pub fn external(service: &'static str, message: impl Into<String>, transient: bool) -> Self {
        EnkelError::ExternalApi {
            service,
            message: message.into(),
            transient,
        }
    }

    /// Whether retrying the failed call could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            EnkelError::ExternalApi { transient, .. } => *transient,
            EnkelError::Http(e) => e.is_connect() || e.status().is_some_and(|s| s.is_server_error()),
            _ => false,
        }
    }

    /// Whether the error was caused by the request rather than by a backing service.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            EnkelError::UnsupportedSource(_)
                | EnkelError::NoDocumentUploaded
                | EnkelError::MultipleDocumentsUploaded(_)
                | EnkelError::Pdf(_)
                | EnkelError::InvalidInput(_)
        )
    }
}

/// Result type alias for Enkel operations.
pub type Result<T> = std::result::Result<T, EnkelError>;
