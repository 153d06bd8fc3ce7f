//! Per-element render configuration.
//!
//! [`RenderConfig`] holds the settings used when drawing a text value in
//! non-simple mode. Every text-like element owns its own copy, seeded from
//! the document-wide [`FillOptions`](crate::FillOptions) when the document is
//! opened.

use crate::geometry::Color;
use crate::PdfError;

/// Default font for overlay text.
pub const DEFAULT_FONT_NAME: &str = "Helvetica";
/// Default font size in points.
pub const DEFAULT_FONT_SIZE: f64 = 12.0;
/// Default maximum characters per wrapped line.
pub const DEFAULT_TEXT_WRAP_LENGTH: usize = 100;
/// Leading as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f64 = 1.2;

/// Font used to draw check marks.
pub const CHECK_FONT_NAME: &str = "ZapfDingbats";
/// The ZapfDingbats code for the check mark glyph (a20, ✔).
pub const CHECK_GLYPH: &str = "4";
/// Advance width of [`CHECK_GLYPH`] as a fraction of the font size.
pub const CHECK_GLYPH_WIDTH: f64 = 0.846;
/// Ink height of [`CHECK_GLYPH`] above the baseline as a fraction of the font size.
pub const CHECK_GLYPH_HEIGHT: f64 = 0.705;
/// Check mark size relative to the shorter side of the widget.
pub const CHECK_SIZE_FACTOR: f64 = 0.8;

/// The 14 standard Type 1 fonts every conforming reader provides.
pub const STANDARD_FONTS: [&str; 14] = [
    "Courier",
    "Courier-Bold",
    "Courier-BoldOblique",
    "Courier-Oblique",
    "Helvetica",
    "Helvetica-Bold",
    "Helvetica-BoldOblique",
    "Helvetica-Oblique",
    "Symbol",
    "Times-Bold",
    "Times-BoldItalic",
    "Times-Italic",
    "Times-Roman",
    "ZapfDingbats",
];

/// Rendering settings for one text-like element.
///
/// Fields are validated on every assignment, so a `RenderConfig` is always
/// drawable.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "UncheckedRenderConfig"))]
pub struct RenderConfig {
    font_size: f64,
    font_color: Color,
    text_x_offset: f64,
    text_y_offset: f64,
    text_wrap_length: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            font_color: Color::black(),
            text_x_offset: 0.0,
            text_y_offset: 0.0,
            text_wrap_length: DEFAULT_TEXT_WRAP_LENGTH,
        }
    }
}

impl RenderConfig {
    /// Create a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::InvalidConfig`] if any setting is out of range.
    pub fn new(
        font_size: f64,
        font_color: Color,
        text_x_offset: f64,
        text_y_offset: f64,
        text_wrap_length: usize,
    ) -> Result<Self, PdfError> {
        let mut config = Self::default();
        config.set_font_size(font_size)?;
        config.set_font_color(font_color)?;
        config.set_text_x_offset(text_x_offset)?;
        config.set_text_y_offset(text_y_offset)?;
        config.set_text_wrap_length(text_wrap_length);
        Ok(config)
    }

    pub fn font_size(&self) -> f64 {
        self.font_size
    }

    pub fn font_color(&self) -> Color {
        self.font_color
    }

    pub fn text_x_offset(&self) -> f64 {
        self.text_x_offset
    }

    pub fn text_y_offset(&self) -> f64 {
        self.text_y_offset
    }

    /// Maximum characters per line; 0 disables wrapping.
    pub fn text_wrap_length(&self) -> usize {
        self.text_wrap_length
    }

    /// Vertical distance between consecutive wrapped lines.
    pub fn line_height(&self) -> f64 {
        self.font_size * LINE_HEIGHT_FACTOR
    }

    /// Set the font size in points. Must be finite and positive.
    pub fn set_font_size(&mut self, size: f64) -> Result<(), PdfError> {
        if !size.is_finite() || size <= 0.0 {
            return Err(PdfError::invalid_config(
                "font_size",
                format!("must be a positive number, got {size}"),
            ));
        }
        self.font_size = size;
        Ok(())
    }

    /// Set the fill color. Every channel must lie in [0, 1].
    pub fn set_font_color(&mut self, color: impl Into<Color>) -> Result<(), PdfError> {
        let color = color.into();
        if !color.is_valid() {
            return Err(PdfError::invalid_config(
                "font_color",
                format!(
                    "channels must be within [0, 1], got ({}, {}, {})",
                    color.r, color.g, color.b
                ),
            ));
        }
        self.font_color = color;
        Ok(())
    }

    pub fn set_text_x_offset(&mut self, offset: f64) -> Result<(), PdfError> {
        self.text_x_offset = finite_offset("text_x_offset", offset)?;
        Ok(())
    }

    pub fn set_text_y_offset(&mut self, offset: f64) -> Result<(), PdfError> {
        self.text_y_offset = finite_offset("text_y_offset", offset)?;
        Ok(())
    }

    pub fn set_text_wrap_length(&mut self, length: usize) {
        self.text_wrap_length = length;
    }
}

/// Deserialized settings, checked by [`RenderConfig::new`] before use.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct UncheckedRenderConfig {
    font_size: f64,
    font_color: Color,
    text_x_offset: f64,
    text_y_offset: f64,
    text_wrap_length: usize,
}

#[cfg(feature = "serde")]
impl TryFrom<UncheckedRenderConfig> for RenderConfig {
    type Error = PdfError;

    fn try_from(raw: UncheckedRenderConfig) -> Result<Self, PdfError> {
        Self::new(
            raw.font_size,
            raw.font_color,
            raw.text_x_offset,
            raw.text_y_offset,
            raw.text_wrap_length,
        )
    }
}

fn finite_offset(setting: &str, offset: f64) -> Result<f64, PdfError> {
    if offset.is_finite() {
        Ok(offset)
    } else {
        Err(PdfError::invalid_config(
            setting,
            format!("must be finite, got {offset}"),
        ))
    }
}

/// Whether `name` is one of the 14 standard Type 1 fonts.
pub fn is_standard_font(name: &str) -> bool {
    STANDARD_FONTS.contains(&name)
}
