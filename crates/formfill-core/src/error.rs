//! Error types for formfill.
//!
//! Provides [`PdfError`] for both fatal errors (the document cannot be parsed
//! or encoded) and per-field errors, and [`FieldError`] which pairs a
//! per-field error with the field it was raised for so a batch fill can
//! report it without aborting.

use std::fmt;

/// Error types for form filling.
///
/// Structural variants ([`ParseError`](PdfError::ParseError),
/// [`EncodeError`](PdfError::EncodeError), [`IoError`](PdfError::IoError))
/// stop processing. Field-level variants are raised for a single element and
/// are collected rather than propagated during a batch fill; see
/// [`PdfError::is_field_level`].
#[derive(Debug, Clone, PartialEq)]
pub enum PdfError {
    /// The input bytes are not a usable PDF document.
    ParseError(String),
    /// The mutated document could not be serialized.
    EncodeError(String),
    /// I/O error reading PDF data.
    IoError(String),
    /// A widget's field type cannot be mapped to a fillable element.
    UnsupportedField {
        /// Fully-qualified field name.
        name: String,
        /// The raw `/FT` value (or a description of the field kind).
        field_type: String,
    },
    /// A render setting or option is out of range.
    InvalidConfig {
        /// Name of the offending setting (e.g. "font_size").
        setting: String,
        /// Why the value was rejected.
        reason: String,
    },
    /// A fill value does not match the element's type.
    TypeMismatch {
        /// Field name.
        name: String,
        /// What the element accepts.
        expected: String,
        /// What was supplied.
        found: String,
    },
    /// A fill value has the right type but cannot be applied
    /// (index out of range, text longer than `/MaxLen`).
    InvalidValue {
        /// Field name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },
    /// A configured resource limit was exceeded.
    ResourceLimitExceeded {
        /// Name of the limit that was exceeded (e.g., "max_input_bytes").
        limit_name: String,
        /// The configured limit value.
        limit_value: usize,
        /// The actual value that exceeded the limit.
        actual_value: usize,
    },
}

impl PdfError {
    /// Shorthand for an [`InvalidConfig`](PdfError::InvalidConfig) error.
    pub fn invalid_config(setting: impl Into<String>, reason: impl Into<String>) -> Self {
        PdfError::InvalidConfig {
            setting: setting.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error concerns a single field and can be isolated
    /// from the rest of a fill.
    pub fn is_field_level(&self) -> bool {
        matches!(
            self,
            PdfError::UnsupportedField { .. }
                | PdfError::TypeMismatch { .. }
                | PdfError::InvalidValue { .. }
        )
    }
}

impl fmt::Display for PdfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PdfError::ParseError(msg) => write!(f, "parse error: {msg}"),
            PdfError::EncodeError(msg) => write!(f, "encode error: {msg}"),
            PdfError::IoError(msg) => write!(f, "I/O error: {msg}"),
            PdfError::UnsupportedField { name, field_type } => {
                write!(f, "unsupported field '{name}': field type {field_type}")
            }
            PdfError::InvalidConfig { setting, reason } => {
                write!(f, "invalid config for {setting}: {reason}")
            }
            PdfError::TypeMismatch {
                name,
                expected,
                found,
            } => write!(
                f,
                "type mismatch for field '{name}': expected {expected}, found {found}"
            ),
            PdfError::InvalidValue { name, reason } => {
                write!(f, "invalid value for field '{name}': {reason}")
            }
            PdfError::ResourceLimitExceeded {
                limit_name,
                limit_value,
                actual_value,
            } => write!(
                f,
                "resource limit exceeded: {limit_name} (limit: {limit_value}, actual: {actual_value})"
            ),
        }
    }
}

impl std::error::Error for PdfError {}

impl From<std::io::Error> for PdfError {
    fn from(err: std::io::Error) -> Self {
        PdfError::IoError(err.to_string())
    }
}

/// A per-field error collected while discovering or filling fields.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    /// Name of the field the error was raised for.
    pub name: String,
    /// The underlying error.
    pub error: PdfError,
}

impl FieldError {
    pub fn new(name: impl Into<String>, error: PdfError) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.name, self.error)
    }
}
