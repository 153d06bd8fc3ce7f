//! formfill-parse: PDF object graph access for form filling.
//!
//! This crate implements the document layer of formfill: discovering form
//! widgets, storing field values, drawing overlays into page content,
//! flattening and serialization. Operations go through the [`FormBackend`]
//! trait; [`LopdfBackend`] is the implementation on top of lopdf. It depends
//! on formfill-core for shared data types.

pub mod backend;
pub mod error;
mod flatten;
pub mod lopdf_backend;
mod overlay;
mod simple_fill;
mod widgets;

pub use backend::{Discovery, FormBackend};
pub use error::BackendError;
pub use formfill_core;
pub use lopdf_backend::{LopdfBackend, LopdfDocument};
