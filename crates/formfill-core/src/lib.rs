//! formfill-core: Backend-independent data types and algorithms.
//!
//! This crate provides the element model, fill values, render configuration,
//! the fixed-width text wrapper and overlay planning used by formfill.
//! It knows nothing about the PDF object graph; the parse crate turns its
//! types into document mutations.

pub mod element;
pub mod error;
pub mod geometry;
pub mod options;
pub mod overlay;
pub mod render;
pub mod value;
pub mod wrap;

pub use element::{
    Classification, Element, ElementKind, ElementType, FieldFlags, ObjectHandle, WidgetRecord,
    WidgetRef,
};
pub use error::{FieldError, PdfError};
pub use geometry::{BBox, Color};
pub use options::FillOptions;
pub use overlay::{DrawOp, PageOverlay, draw_ops, plan_overlays};
pub use render::{
    CHECK_FONT_NAME, CHECK_GLYPH, CHECK_GLYPH_HEIGHT, CHECK_GLYPH_WIDTH, CHECK_SIZE_FACTOR,
    DEFAULT_FONT_NAME, DEFAULT_FONT_SIZE, DEFAULT_TEXT_WRAP_LENGTH, LINE_HEIGHT_FACTOR,
    RenderConfig, STANDARD_FONTS, is_standard_font,
};
pub use value::{FieldValue, FillData, ResolvedValue, fill_data};
pub use wrap::{TextLine, TextLines, wrap_text};
