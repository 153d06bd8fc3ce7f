//! Document-wide fill options.

use crate::geometry::Color;
use crate::render::{DEFAULT_FONT_NAME, DEFAULT_FONT_SIZE, DEFAULT_TEXT_WRAP_LENGTH};
use crate::{PdfError, RenderConfig, is_standard_font};

/// Options controlling how a document is filled.
///
/// The render settings (`font_size` through `text_wrap_length`) are the
/// global defaults copied into every text-like element when the document is
/// opened; changing an element afterwards never touches these values.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FillOptions {
    /// Write values into the fields themselves (default: true). When false,
    /// values are drawn onto the page and the widgets are flattened.
    pub simple_mode: bool,
    /// Keep filled fields editable in simple mode (default: false).
    pub editable: bool,
    /// Standard Type 1 font used for overlay text (default: Helvetica).
    pub font_name: String,
    /// Default font size in points (default: 12).
    pub font_size: f64,
    /// Default text color (default: black).
    pub font_color: Color,
    /// Default horizontal text offset from the widget origin (default: 0).
    pub text_x_offset: f64,
    /// Default vertical text offset from the widget origin (default: 0).
    pub text_y_offset: f64,
    /// Default maximum characters per line, 0 = no wrapping (default: 100).
    pub text_wrap_length: usize,
    /// When true, the first per-field error aborts the fill (default: false).
    pub strict_mode: bool,
    /// Maximum input PDF size in bytes (default: None = no limit).
    pub max_input_bytes: Option<usize>,
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            simple_mode: true,
            editable: false,
            font_name: DEFAULT_FONT_NAME.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            font_color: Color::black(),
            text_x_offset: 0.0,
            text_y_offset: 0.0,
            text_wrap_length: DEFAULT_TEXT_WRAP_LENGTH,
            strict_mode: false,
            max_input_bytes: None,
        }
    }
}

impl FillOptions {
    /// Options for drawing values onto the page instead of into the fields.
    pub fn non_simple() -> Self {
        Self {
            simple_mode: false,
            ..Self::default()
        }
    }

    /// The render configuration every text-like element starts with.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::InvalidConfig`] if a render default is out of range.
    pub fn render_config(&self) -> Result<RenderConfig, PdfError> {
        RenderConfig::new(
            self.font_size,
            self.font_color,
            self.text_x_offset,
            self.text_y_offset,
            self.text_wrap_length,
        )
    }

    /// Check every option, including the render defaults.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::InvalidConfig`] naming the first invalid option.
    pub fn validate(&self) -> Result<(), PdfError> {
        if !is_standard_font(&self.font_name) {
            return Err(PdfError::invalid_config(
                "font_name",
                format!("'{}' is not a standard Type 1 font", self.font_name),
            ));
        }
        self.render_config().map(|_| ())
    }
}
