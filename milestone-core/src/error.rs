//! Error types for milestone extraction
//!
//! Handler-level failures are `HandlerError`; the dispatcher wraps them into
//! `ExtractionError` together with the path of the file being processed.
//! Single-record failures are `RecordError` and never leave their extractor.

use std::path::PathBuf;
use thiserror::Error;

/// Public error surface of the extraction entry points
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Input file does not exist
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// No handler claims the file
    #[error("Unsupported file format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    /// Schedule file recognised but no backend can read it
    #[error("No schedule backend available to read {}", path.display())]
    BackendUnavailable { path: PathBuf },

    /// A handler ran but could not produce usable structure
    #[error("Failed to extract milestones from {}: {source}", path.display())]
    ExtractionFailed {
        path: PathBuf,
        #[source]
        source: HandlerError,
    },
}

impl ExtractionError {
    /// Create a not found error
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create an unsupported format error
    pub fn unsupported(path: impl Into<PathBuf>) -> Self {
        Self::UnsupportedFormat { path: path.into() }
    }

    /// Wrap a handler failure with the file it happened on
    pub fn from_handler(path: impl Into<PathBuf>, source: HandlerError) -> Self {
        let path = path.into();
        match source {
            HandlerError::NoBackends => Self::BackendUnavailable { path },
            HandlerError::NotFound { .. } => Self::NotFound { path },
            source => Self::ExtractionFailed { path, source },
        }
    }

    /// Path of the file the error refers to
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::NotFound { path }
            | Self::UnsupportedFormat { path }
            | Self::BackendUnavailable { path }
            | Self::ExtractionFailed { path, .. } => path,
        }
    }
}

/// Failures raised by a document handler or schedule backend
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Malformed document: {message}")]
    Malformed { message: String },

    #[error("{backend} backend failed: {message}")]
    Backend { backend: String, message: String },

    #[error("No schedule backends are available")]
    NoBackends,

    #[error("All extraction methods failed for {}. Last error: {last}", path.display())]
    AllBackendsFailed { path: PathBuf, last: Box<HandlerError> },
}

impl HandlerError {
    /// Create a malformed document error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed { message: message.into() }
    }

    /// Create a backend failure
    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend { backend: backend.into(), message: message.into() }
    }
}

/// A single row, text block or task could not become a milestone
#[derive(Debug, Error)]
#[error("Record skipped: {reason}")]
pub struct RecordError {
    pub reason: String,
}

impl RecordError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

/// Result type for extraction entry points
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Result type for handlers and backends
pub type HandlerResult<T> = std::result::Result<T, HandlerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExtractionError::not_found("plans/roadmap.md");
        assert_eq!(err.to_string(), "File not found: plans/roadmap.md");

        let err = ExtractionError::unsupported("notes.txt");
        assert_eq!(err.to_string(), "Unsupported file format: notes.txt");
    }

    #[test]
    fn test_handler_error_wrapping() {
        let err = ExtractionError::from_handler("plan.mpp", HandlerError::NoBackends);
        assert!(matches!(err, ExtractionError::BackendUnavailable { .. }));

        let err = ExtractionError::from_handler("plan.md", HandlerError::malformed("bad table"));
        assert!(matches!(err, ExtractionError::ExtractionFailed { .. }));
        assert!(err.to_string().contains("plan.md"));
        assert!(err.to_string().contains("bad table"));
    }

    #[test]
    fn test_all_backends_failed_names_last_error() {
        let err = HandlerError::AllBackendsFailed {
            path: PathBuf::from("plan.mpp"),
            last: Box::new(HandlerError::backend("XML Conversion", "no export found")),
        };
        assert!(err.to_string().contains("XML Conversion backend failed: no export found"));
    }
}
