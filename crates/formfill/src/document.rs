//! Top-level form document type for opening, filling and serializing.

use formfill_core::{
    Element, FieldError, FillData, FillOptions, ObjectHandle, PdfError, ResolvedValue, WidgetRef,
    plan_overlays,
};
use formfill_parse::{FormBackend, LopdfBackend, LopdfDocument};
use indexmap::IndexMap;
use tracing::{debug, warn};

/// A PDF document opened for form filling.
///
/// Owns the parsed object graph, the discovered elements and the current
/// output bytes. Elements are discovered once, when the document is opened;
/// afterwards only their values and render configurations change.
///
/// # Example
///
/// ```ignore
/// let mut doc = Document::open(bytes, None)?;
/// doc.fill(&fill_data([("test", "test_1".into()), ("check", true.into())]))?;
/// let filled: &[u8] = doc.stream();
/// ```
pub struct Document {
    doc: LopdfDocument,
    elements: IndexMap<String, Element>,
    options: FillOptions,
    /// Per-field errors of the most recent fill.
    field_errors: Vec<FieldError>,
    /// Widgets skipped or not attached while discovering elements.
    discovery_warnings: Vec<FieldError>,
    /// Input bytes until the first fill, then the latest encoded output.
    stream: Vec<u8>,
    /// Whether the widgets have already been removed by a non-simple fill.
    flattened: bool,
}

impl Document {
    /// Open a PDF document from a file path.
    ///
    /// Convenience wrapper around [`Document::open`] that reads the file into
    /// memory first.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::IoError`] if the file cannot be read, or any error
    /// from [`Document::open`].
    #[cfg(feature = "std")]
    pub fn open_file(
        path: impl AsRef<std::path::Path>,
        options: Option<FillOptions>,
    ) -> Result<Self, PdfError> {
        let bytes = std::fs::read(path)?;
        Self::open(&bytes, options)
    }

    /// Open a PDF document from bytes and discover its form elements.
    ///
    /// Every text-like element starts with the render defaults of `options`
    /// (or [`FillOptions::default`]).
    ///
    /// # Errors
    ///
    /// - [`PdfError::ResourceLimitExceeded`] if the input exceeds
    ///   `max_input_bytes`.
    /// - [`PdfError::InvalidConfig`] if an option is out of range.
    /// - [`PdfError::ParseError`] if the bytes are not a usable PDF.
    pub fn open(bytes: &[u8], options: Option<FillOptions>) -> Result<Self, PdfError> {
        let options = options.unwrap_or_default();
        if let Some(max_bytes) = options.max_input_bytes {
            if bytes.len() > max_bytes {
                return Err(PdfError::ResourceLimitExceeded {
                    limit_name: "max_input_bytes".to_string(),
                    limit_value: max_bytes,
                    actual_value: bytes.len(),
                });
            }
        }
        options.validate()?;
        let defaults = options.render_config()?;

        let doc = LopdfBackend::open(bytes).map_err(PdfError::from)?;
        let discovery = LopdfBackend::widgets(&doc)?;

        let mut discovery_warnings = discovery.warnings;
        let mut elements: IndexMap<String, Element> = IndexMap::new();
        for record in &discovery.records {
            match elements.get_mut(&record.name) {
                Some(element) => {
                    if let Err(error) = element.attach_widget(record) {
                        warn!(name = %record.name, %error, "widget not attached to its element");
                        discovery_warnings.push(FieldError::new(record.name.clone(), error));
                    }
                }
                None => {
                    elements.insert(record.name.clone(), Element::new(record, &defaults));
                }
            }
        }
        debug!(
            pages = LopdfBackend::page_count(&doc),
            elements = elements.len(),
            warnings = discovery_warnings.len(),
            "opened form document"
        );

        Ok(Self {
            doc,
            elements,
            options,
            field_errors: Vec::new(),
            discovery_warnings,
            stream: bytes.to_vec(),
            flattened: false,
        })
    }

    /// All elements in discovery order, keyed by fully-qualified name.
    pub fn elements(&self) -> &IndexMap<String, Element> {
        &self.elements
    }

    pub fn element(&self, name: &str) -> Option<&Element> {
        self.elements.get(name)
    }

    /// Mutable access to one element, for adjusting its render configuration
    /// before a fill.
    pub fn element_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.elements.get_mut(name)
    }

    /// Fill the document with `data` and re-encode it.
    ///
    /// Names without an element are ignored. Elements missing from `data`
    /// keep their current value. A value an element rejects is recorded in
    /// [`field_errors`](Self::field_errors) and the rest of the batch still
    /// goes through, unless `strict_mode` is set.
    ///
    /// In simple mode the values are stored in the fields. Otherwise they
    /// are drawn onto the pages, and on the first fill every widget is
    /// flattened away.
    ///
    /// # Errors
    ///
    /// - The first per-field error in strict mode; nothing is changed then.
    /// - Structural errors from the backend, such as
    ///   [`PdfError::EncodeError`].
    pub fn fill(&mut self, data: &FillData) -> Result<&mut Self, PdfError> {
        self.field_errors.clear();

        let mut accepted = Vec::with_capacity(data.len());
        for (name, value) in data {
            let Some((index, _, element)) = self.elements.get_full(name) else {
                debug!(name = %name, "ignoring value for unknown field");
                continue;
            };
            match element.check_value(value) {
                Ok(_) => accepted.push((index, value.clone())),
                Err(error) => {
                    warn!(name = %name, %error, "skipping field");
                    if self.options.strict_mode || !error.is_field_level() {
                        return Err(error);
                    }
                    self.field_errors.push(FieldError::new(name.clone(), error));
                }
            }
        }

        let mut filled: Vec<(usize, ResolvedValue)> = Vec::with_capacity(accepted.len());
        for (index, value) in accepted {
            if let Some((_, element)) = self.elements.get_index_mut(index) {
                filled.push((index, element.assign(value)?));
            }
        }
        // Elements are written and painted in discovery order.
        filled.sort_by_key(|(index, _)| *index);

        if self.options.simple_mode {
            self.write_fields(&filled)?;
        } else {
            self.draw_overlays(&filled)?;
        }

        self.stream = LopdfBackend::encode(&mut self.doc)?;
        debug!(
            filled = filled.len(),
            errors = self.field_errors.len(),
            bytes = self.stream.len(),
            "filled form"
        );
        Ok(self)
    }

    fn write_fields(&mut self, filled: &[(usize, ResolvedValue)]) -> Result<(), PdfError> {
        for (index, value) in filled {
            if let Some((_, element)) = self.elements.get_index(*index) {
                LopdfBackend::write_value(&mut self.doc, element, value)?;
            }
        }
        LopdfBackend::set_need_appearances(&mut self.doc)?;

        if !self.options.editable {
            let mut fields: Vec<ObjectHandle> = Vec::new();
            for widget in self.elements.values().flat_map(Element::widgets) {
                if !fields.contains(&widget.field) {
                    fields.push(widget.field);
                }
            }
            LopdfBackend::set_read_only(&mut self.doc, &fields)?;
        }
        Ok(())
    }

    fn draw_overlays(&mut self, filled: &[(usize, ResolvedValue)]) -> Result<(), PdfError> {
        let overlays = plan_overlays(filled.iter().filter_map(|(index, value)| {
            self.elements
                .get_index(*index)
                .map(|(_, element)| (element, value))
        }));
        for overlay in &overlays {
            LopdfBackend::append_content(&mut self.doc, overlay, &self.options.font_name)?;
        }

        if !self.flattened {
            let widgets: Vec<WidgetRef> = self
                .elements
                .values()
                .flat_map(|element| element.widgets().iter().cloned())
                .collect();
            LopdfBackend::flatten_widgets(&mut self.doc, &widgets)?;
            self.flattened = true;
        }
        Ok(())
    }

    /// The current output bytes: the input until the first fill, then the
    /// result of the latest fill.
    pub fn stream(&self) -> &[u8] {
        &self.stream
    }

    pub fn into_stream(self) -> Vec<u8> {
        self.stream
    }

    /// Per-field errors of the most recent [`fill`](Self::fill).
    pub fn field_errors(&self) -> &[FieldError] {
        &self.field_errors
    }

    /// Widgets skipped while opening: unsupported field types and widgets
    /// whose type differs from the element already carrying their name.
    pub fn discovery_warnings(&self) -> &[FieldError] {
        &self.discovery_warnings
    }

    pub fn options(&self) -> &FillOptions {
        &self.options
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("doc", &self.doc)
            .field("elements", &self.elements.len())
            .field("simple_mode", &self.options.simple_mode)
            .field("stream_len", &self.stream.len())
            .finish_non_exhaustive()
    }
}
