//! formfill: fill the interactive form fields of a PDF document.
//!
//! This is the public API facade crate. It re-exports types from
//! formfill-core and uses formfill-parse for reading, mutating and writing
//! the PDF.
//!
//! # Architecture
//!
//! - **formfill-core**: Backend-independent element model, values, options and text layout
//! - **formfill-parse**: Widget discovery, field writing, overlays and flattening on lopdf
//! - **formfill** (this crate): [`Document`], which ties everything together
//!
//! # Example
//!
//! ```ignore
//! use formfill::{Document, FillOptions, fill_data};
//!
//! let mut doc = Document::open(&bytes, Some(FillOptions::non_simple()))?;
//! doc.element_mut("name").unwrap().set_font_size(20.0)?;
//! doc.fill(&fill_data([("name", "Jane Doe".into()), ("agree", true.into())]))?;
//! std::fs::write("filled.pdf", doc.stream())?;
//! ```

mod document;

pub use document::Document;
pub use formfill_core;
pub use formfill_core::{
    BBox, Color, Element, ElementKind, ElementType, FieldError, FieldValue, FillData, FillOptions,
    PdfError, RenderConfig, ResolvedValue, TextLine, WidgetRef, fill_data, wrap_text,
};
pub use formfill_parse;
