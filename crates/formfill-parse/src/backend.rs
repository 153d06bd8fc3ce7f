//! PDF form backend trait.
//!
//! Defines the [`FormBackend`] trait that abstracts every operation the
//! filler needs from the PDF object graph: discovering widgets, writing
//! field values, appending page content, flattening and serializing.

use formfill_core::{
    Element, FieldError, ObjectHandle, PageOverlay, PdfError, ResolvedValue, WidgetRecord,
    WidgetRef,
};

/// Result of walking a document's page annotations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Discovery {
    /// Fillable widgets in page order, then `/Annots` order.
    pub records: Vec<WidgetRecord>,
    /// Widgets that were skipped with an error worth reporting.
    pub warnings: Vec<FieldError>,
}

/// Trait abstracting the PDF operations used to fill a form.
///
/// # Associated Types
///
/// - `Document`: The parsed, mutable PDF document representation.
/// - `Error`: Backend-specific error type, convertible to [`PdfError`].
///
/// # Usage
///
/// ```ignore
/// let mut doc = MyBackend::open(pdf_bytes)?;
/// let discovery = MyBackend::widgets(&doc)?;
/// MyBackend::write_value(&mut doc, &element, &resolved)?;
/// MyBackend::set_need_appearances(&mut doc)?;
/// let bytes = MyBackend::encode(&mut doc)?;
/// ```
pub trait FormBackend {
    /// The parsed PDF document type.
    type Document;

    /// Backend-specific error type, convertible to [`PdfError`].
    type Error: std::error::Error + Into<PdfError>;

    /// Parse PDF bytes into a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes do not represent a usable PDF document.
    fn open(bytes: &[u8]) -> Result<Self::Document, Self::Error>;

    /// Return the number of pages in the document.
    fn page_count(doc: &Self::Document) -> usize;

    /// Walk every page's annotations and classify the widgets found.
    ///
    /// Widgets with an unknown field type are skipped and reported in
    /// [`Discovery::warnings`]; non-widget annotations and push buttons are
    /// skipped silently.
    ///
    /// # Errors
    ///
    /// Returns an error if the page tree itself cannot be read.
    fn widgets(doc: &Self::Document) -> Result<Discovery, Self::Error>;

    /// Store a checked value in the element's field and widget dictionaries.
    ///
    /// # Errors
    ///
    /// Returns an error if a field or widget object cannot be resolved.
    fn write_value(
        doc: &mut Self::Document,
        element: &Element,
        value: &ResolvedValue,
    ) -> Result<(), Self::Error>;

    /// Ask viewers to regenerate field appearances from the stored values.
    ///
    /// # Errors
    ///
    /// Returns an error if the document catalog cannot be resolved.
    fn set_need_appearances(doc: &mut Self::Document) -> Result<(), Self::Error>;

    /// Set the read-only flag on the given field dictionaries, keeping every
    /// flag they already have or inherit.
    ///
    /// # Errors
    ///
    /// Returns an error if a field object cannot be resolved.
    fn set_read_only(doc: &mut Self::Document, fields: &[ObjectHandle]) -> Result<(), Self::Error>;

    /// Draw `overlay` on top of its page's existing content.
    ///
    /// `text_font` names the standard font used for text instructions.
    ///
    /// # Errors
    ///
    /// Returns an error if the page does not exist or the content cannot be
    /// encoded.
    fn append_content(
        doc: &mut Self::Document,
        overlay: &PageOverlay,
        text_font: &str,
    ) -> Result<(), Self::Error>;

    /// Remove the given widgets from their pages and their fields from the
    /// interactive form, then drop objects nothing refers to any more.
    ///
    /// # Errors
    ///
    /// Returns an error if the page tree or catalog cannot be resolved.
    fn flatten_widgets(doc: &mut Self::Document, widgets: &[WidgetRef])
    -> Result<(), Self::Error>;

    /// Serialize the document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    fn encode(doc: &mut Self::Document) -> Result<Vec<u8>, Self::Error>;
}
