//! Error types for the form preparation pipeline.
//!
//! This module defines every error that can surface from rendering, detection,
//! weight resolution and field writing. Low-level collaborator errors pass
//! through unchanged; the only translation into the domain taxonomy happens
//! when the pipeline opens the input document (see [`Error::EncryptedDocument`]).

use std::path::PathBuf;

/// Result type alias for form preparation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by a [`Renderer`](crate::rendering::Renderer).
///
/// Renderers must keep the password-protected case distinguishable from
/// generic unreadable input so the pipeline can classify it.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The document cannot be opened without a password
    #[error("document requires a password")]
    PasswordRequired,

    /// The document could not be opened at all (corrupt, not a PDF, missing)
    #[error("unreadable document: {0}")]
    Unreadable(String),

    /// A single page failed to rasterize
    #[error("failed to render page {page}: {reason}")]
    Page {
        /// Zero-based page index
        page: usize,
        /// Reason for the failure
        reason: String,
    },

    /// The rendering backend itself could not be initialized
    #[error("rendering backend unavailable: {0}")]
    Backend(String),
}

/// Error types that can occur while preparing a form.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input document is password-protected.
    ///
    /// This is an expected failure; callers typically prompt for a password.
    #[error("Encrypted document: {} cannot be opened without a password", path.display())]
    EncryptedDocument {
        /// Path of the input document
        path: PathBuf,
    },

    /// Rendering collaborator failure (other than encryption)
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// The detection model produced a class id outside the backend's table
    #[error("Unknown class id {class_id} from {backend} detector")]
    UnknownClass {
        /// Raw class id returned by the model
        class_id: i64,
        /// Backend that produced it
        backend: &'static str,
    },

    /// A widget references a page the document does not have
    #[error("Page index {page} out of range (document has {page_count} pages)")]
    PageOutOfRange {
        /// Offending page index
        page: usize,
        /// Number of pages in the document
        page_count: usize,
    },

    /// A model returned a different number of per-image results than inputs
    #[error("Detection model returned {found} results for {expected} images")]
    BatchMismatch {
        /// Number of images submitted
        expected: usize,
        /// Number of result lists returned
        found: usize,
    },

    /// A field could not be placed at the requested geometry.
    ///
    /// This is the only error the pipeline treats as widget-local.
    #[error("Cannot place field '{name}': {reason}")]
    Placement {
        /// Field name
        name: String,
        /// Reason for the failure
        reason: String,
    },

    /// Model weights could not be resolved or downloaded
    #[error("Failed to resolve weights for {model}: {reason}")]
    WeightFetch {
        /// Requested model name
        model: String,
        /// Reason for the failure
        reason: String,
    },

    /// Weight file exists but cannot be loaded by the available runtime
    #[error("Unsupported weight format: {}", .0.display())]
    UnsupportedWeights(PathBuf),

    /// Detection model failed to load or run
    #[error("Model error: {0}")]
    Model(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Feature not compiled in
    #[error("Unsupported feature: {0}")]
    Unsupported(String),

    /// A form writer was used after `close`
    #[error("Form writer is closed")]
    WriterClosed,

    /// Malformed PDF structure encountered while writing fields
    #[error("Invalid PDF: {0}")]
    InvalidPdf(String),

    /// PDF object model error from the field writer
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// ONNX Runtime error
    #[cfg(feature = "onnx")]
    #[error("ONNX Runtime error: {0}")]
    Onnx(#[from] ort::Error),
}

impl Error {
    /// Whether this error concerns a single widget and should not abort the document.
    pub fn is_widget_local(&self) -> bool {
        matches!(self, Error::Placement { .. })
    }
}
