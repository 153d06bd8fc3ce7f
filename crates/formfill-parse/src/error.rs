//! Errors raised while reading, mutating or writing the object graph.
//!
//! [`BackendError`] is derived with [`thiserror`] and folds into the
//! engine-wide [`PdfError`] at the facade boundary.

use formfill_core::PdfError;
use thiserror::Error;

/// Failure inside a [`FormBackend`](crate::FormBackend) implementation.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The input could not be loaded as a PDF, or a required object
    /// (catalog, page, widget) is missing or malformed.
    #[error("malformed PDF: {0}")]
    Parse(String),

    /// Saving the document or encoding a content stream failed.
    #[error("cannot write PDF: {0}")]
    Encode(String),
}

impl From<BackendError> for PdfError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Parse(msg) => PdfError::ParseError(msg),
            BackendError::Encode(msg) => PdfError::EncodeError(msg),
        }
    }
}
