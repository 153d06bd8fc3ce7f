//! lopdf-based form backend.
//!
//! Implements [`FormBackend`] using the [lopdf](https://crates.io/crates/lopdf)
//! crate for parsing, mutating and writing the PDF object graph. This is the
//! default backend for formfill.

use formfill_core::{Element, ObjectHandle, PageOverlay, ResolvedValue, WidgetRef};
use lopdf::{Dictionary, Object, ObjectId, StringFormat};

use crate::backend::{Discovery, FormBackend};
use crate::error::BackendError;
use crate::{flatten, overlay, simple_fill, widgets};

/// Maximum depth followed along `/Parent` and `/Kids` chains, so that
/// reference cycles in malformed files terminate.
pub(crate) const MAX_TREE_DEPTH: usize = 64;

/// A parsed PDF document backed by lopdf.
pub struct LopdfDocument {
    /// The underlying lopdf document.
    inner: lopdf::Document,
    /// Cached ordered list of page ObjectIds (indexed by 0-based page number).
    page_ids: Vec<ObjectId>,
}

impl LopdfDocument {
    /// Access the underlying lopdf document.
    pub fn inner(&self) -> &lopdf::Document {
        &self.inner
    }

    pub(crate) fn inner_mut(&mut self) -> &mut lopdf::Document {
        &mut self.inner
    }

    pub(crate) fn page_ids(&self) -> &[ObjectId] {
        &self.page_ids
    }

    /// Object ID of the page at a 0-based index.
    pub(crate) fn page_id(&self, index: usize) -> Result<ObjectId, BackendError> {
        self.page_ids.get(index).copied().ok_or_else(|| {
            BackendError::Parse(format!(
                "page index {index} out of range (0..{})",
                self.page_ids.len()
            ))
        })
    }
}

impl std::fmt::Debug for LopdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LopdfDocument")
            .field("page_count", &self.page_ids.len())
            .finish_non_exhaustive()
    }
}

/// The lopdf-based form backend.
///
/// # Example
///
/// ```ignore
/// use formfill_parse::{FormBackend, LopdfBackend};
///
/// let mut doc = LopdfBackend::open(pdf_bytes)?;
/// let discovery = LopdfBackend::widgets(&doc)?;
/// let bytes = LopdfBackend::encode(&mut doc)?;
/// ```
pub struct LopdfBackend;

/// Extract a [`BBox`](formfill_core::BBox) from a lopdf array of 4 numbers.
///
/// The corners may come in any order; the result is normalized.
pub(crate) fn extract_bbox_from_array(
    array: &[Object],
) -> Result<formfill_core::BBox, BackendError> {
    if array.len() != 4 {
        return Err(BackendError::Parse(format!(
            "expected 4-element array for rect, got {}",
            array.len()
        )));
    }
    let ax = object_to_f64(&array[0])?;
    let ay = object_to_f64(&array[1])?;
    let bx = object_to_f64(&array[2])?;
    let by = object_to_f64(&array[3])?;
    Ok(formfill_core::BBox::from_corners(ax, ay, bx, by))
}

/// Convert a lopdf numeric object (Integer or Real) to f64.
pub(crate) fn object_to_f64(obj: &Object) -> Result<f64, BackendError> {
    match obj {
        Object::Integer(i) => Ok(*i as f64),
        Object::Real(f) => Ok(*f as f64),
        _ => Err(BackendError::Parse(format!("expected number, got {obj:?}"))),
    }
}

/// Follow an indirect reference, returning the object itself otherwise.
///
/// Dangling references resolve to the reference object.
pub(crate) fn resolve_object<'a>(doc: &'a lopdf::Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

/// Look up a key in a dictionary, walking up the tree (via /Parent) if the
/// key is not found on the object itself.
///
/// Works for both the page tree and the field tree. Returns `None` if the
/// key is not found anywhere along the chain.
pub(crate) fn resolve_inherited<'a>(
    doc: &'a lopdf::Document,
    start: ObjectId,
    key: &[u8],
) -> Result<Option<&'a Object>, BackendError> {
    let mut current_id = start;
    for _ in 0..MAX_TREE_DEPTH {
        let dict = doc.get_dictionary(current_id).map_err(|e| {
            BackendError::Parse(format!("failed to get dictionary {current_id:?}: {e}"))
        })?;

        if let Ok(value) = dict.get(key) {
            return Ok(Some(value));
        }

        match dict.get(b"Parent") {
            Ok(parent_obj) => {
                current_id = parent_obj
                    .as_reference()
                    .map_err(|e| BackendError::Parse(format!("invalid /Parent reference: {e}")))?;
            }
            Err(_) => return Ok(None),
        }
    }
    Ok(None)
}

/// Decode a PDF text string: UTF-16BE when it starts with a BOM, otherwise
/// UTF-8 with a Latin-1 fallback.
pub(crate) fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let chars: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&chars)
    } else {
        match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            Err(_) => bytes.iter().map(|&b| b as char).collect(),
        }
    }
}

/// Encode text as a PDF text string object.
///
/// Text that PDFDocEncoding represents byte-for-byte (printable ASCII,
/// Latin-1 letters and common whitespace) is written as a literal string;
/// anything else as UTF-16BE with a byte order mark.
pub(crate) fn encode_pdf_string(text: &str) -> Object {
    let single_byte = text.chars().all(|c| {
        matches!(
            c,
            '\t' | '\n' | '\r' | ' '..='~' | '\u{A1}'..='\u{AC}' | '\u{AE}'..='\u{FF}'
        )
    });
    if single_byte {
        Object::String(text.chars().map(|c| c as u8).collect(), StringFormat::Literal)
    } else {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        Object::String(bytes, StringFormat::Hexadecimal)
    }
}

/// Read a text string (or name) entry from a dictionary.
pub(crate) fn extract_string_from_dict(
    doc: &lopdf::Document,
    dict: &Dictionary,
    key: &[u8],
) -> Option<String> {
    let obj = resolve_object(doc, dict.get(key).ok()?);
    match obj {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}

/// Object ID of the document catalog.
pub(crate) fn catalog_id(doc: &lopdf::Document) -> Result<ObjectId, BackendError> {
    doc.trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|e| BackendError::Parse(format!("missing or invalid /Root: {e}")))
}

/// The interactive form dictionary, if the catalog has one.
pub(crate) fn acroform(doc: &lopdf::Document) -> Option<&Dictionary> {
    let catalog = doc.get_dictionary(catalog_id(doc).ok()?).ok()?;
    resolve_object(doc, catalog.get(b"AcroForm").ok()?)
        .as_dict()
        .ok()
}

/// Mutable access to the interactive form dictionary, if the catalog has one.
pub(crate) fn acroform_mut(
    doc: &mut lopdf::Document,
) -> Result<Option<&mut Dictionary>, BackendError> {
    let root = catalog_id(doc)?;
    let catalog = doc
        .get_dictionary(root)
        .map_err(|e| BackendError::Parse(format!("failed to get catalog: {e}")))?;
    let referenced = match catalog.get(b"AcroForm") {
        Ok(Object::Reference(id)) => Some(*id),
        Ok(_) => None,
        Err(_) => return Ok(None),
    };
    let dict = match referenced {
        Some(id) => doc.get_dictionary_mut(id),
        None => doc
            .get_dictionary_mut(root)
            .and_then(|catalog| catalog.get_mut(b"AcroForm"))
            .and_then(|obj| obj.as_dict_mut()),
    };
    dict.map(Some)
        .map_err(|e| BackendError::Parse(format!("invalid /AcroForm: {e}")))
}

impl FormBackend for LopdfBackend {
    type Document = LopdfDocument;
    type Error = BackendError;

    fn open(bytes: &[u8]) -> Result<Self::Document, Self::Error> {
        let inner = lopdf::Document::load_mem(bytes)
            .map_err(|e| BackendError::Parse(format!("failed to parse PDF: {e}")))?;

        if inner.is_encrypted() {
            return Err(BackendError::Parse(
                "encrypted documents are not supported".to_string(),
            ));
        }

        // Cache page IDs in order (get_pages returns BTreeMap<u32, ObjectId> with 1-based keys)
        let page_ids: Vec<ObjectId> = inner.get_pages().values().copied().collect();

        Ok(LopdfDocument { inner, page_ids })
    }

    fn page_count(doc: &Self::Document) -> usize {
        doc.page_ids.len()
    }

    fn widgets(doc: &Self::Document) -> Result<Discovery, Self::Error> {
        widgets::discover_widgets(doc)
    }

    fn write_value(
        doc: &mut Self::Document,
        element: &Element,
        value: &ResolvedValue,
    ) -> Result<(), Self::Error> {
        simple_fill::write_value(doc, element, value)
    }

    fn set_need_appearances(doc: &mut Self::Document) -> Result<(), Self::Error> {
        simple_fill::set_need_appearances(doc)
    }

    fn set_read_only(doc: &mut Self::Document, fields: &[ObjectHandle]) -> Result<(), Self::Error> {
        simple_fill::set_read_only(doc, fields)
    }

    fn append_content(
        doc: &mut Self::Document,
        overlay: &PageOverlay,
        text_font: &str,
    ) -> Result<(), Self::Error> {
        overlay::append_overlay(doc, overlay, text_font)
    }

    fn flatten_widgets(
        doc: &mut Self::Document,
        widgets: &[WidgetRef],
    ) -> Result<(), Self::Error> {
        flatten::flatten_widgets(doc, widgets)
    }

    fn encode(doc: &mut Self::Document) -> Result<Vec<u8>, Self::Error> {
        let mut buf = Vec::new();
        doc.inner
            .save_to(&mut buf)
            .map_err(|e| BackendError::Encode(format!("failed to write PDF: {e}")))?;
        Ok(buf)
    }
}

/// Build a two-page AcroForm document covering every widget kind.
///
/// Page 0 `/Annots`, in order:
/// - `test`: text field merged with its widget
/// - `check`: check box, appearance states `Yes`/`Off`
/// - `group`: radio group with kids in states `A` and `B`
/// - `country`: combo box with export values `us`, `uk`
/// - `sig`: signature field
/// - `button`: push button
/// - `barcode`: field of unknown type `/Bc`
/// - a link annotation
/// - `person.name`: text field inheriting `/MaxLen 10` from `person`
///
/// Page 1 `/Annots`: a second `test` widget and `test_2`.
#[cfg(test)]
pub(crate) fn create_form_pdf() -> Vec<u8> {
    use lopdf::{Document, Stream, dictionary};

    fn text(s: &str) -> Object {
        Object::String(s.as_bytes().to_vec(), StringFormat::Literal)
    }

    fn rect(x0: i64, y0: i64, x1: i64, y1: i64) -> Object {
        vec![x0.into(), y0.into(), x1.into(), y1.into()].into()
    }

    let mut doc = Document::with_version("1.5");
    let pages_id: ObjectId = doc.new_object_id();
    let page0_id: ObjectId = doc.new_object_id();
    let page1_id: ObjectId = doc.new_object_id();
    let on = doc.add_object(Stream::new(Dictionary::new(), Vec::new()));
    let off = doc.add_object(Stream::new(Dictionary::new(), Vec::new()));

    let test = doc.add_object(dictionary! {
        "Type" => "Annot", "Subtype" => "Widget", "P" => page0_id,
        "FT" => "Tx", "T" => text("test"), "Rect" => rect(50, 700, 250, 720),
    });
    let check = doc.add_object(dictionary! {
        "Type" => "Annot", "Subtype" => "Widget", "P" => page0_id,
        "FT" => "Btn", "T" => text("check"), "Rect" => rect(50, 650, 70, 670),
        "V" => "Off", "AS" => "Off",
        "AP" => dictionary! { "N" => dictionary! { "Yes" => on, "Off" => off } },
    });
    let group = doc.new_object_id();
    let radio_a = doc.add_object(dictionary! {
        "Type" => "Annot", "Subtype" => "Widget", "P" => page0_id, "Parent" => group,
        "Rect" => rect(50, 600, 70, 620), "AS" => "Off",
        "AP" => dictionary! { "N" => dictionary! { "A" => on, "Off" => off } },
    });
    let radio_b = doc.add_object(dictionary! {
        "Type" => "Annot", "Subtype" => "Widget", "P" => page0_id, "Parent" => group,
        "Rect" => rect(80, 600, 100, 620), "AS" => "Off",
        "AP" => dictionary! { "N" => dictionary! { "Off" => off, "B" => on } },
    });
    doc.objects.insert(
        group,
        Object::Dictionary(dictionary! {
            "FT" => "Btn", "T" => text("group"), "Ff" => 49152,
            "Kids" => vec![radio_a.into(), radio_b.into()],
        }),
    );
    let country = doc.add_object(dictionary! {
        "Type" => "Annot", "Subtype" => "Widget", "P" => page0_id,
        "FT" => "Ch", "T" => text("country"), "Ff" => 131072, "Rect" => rect(50, 550, 250, 570),
        "Opt" => vec![
            vec![text("us"), text("United States")].into(),
            vec![text("uk"), text("United Kingdom")].into(),
        ],
    });
    let sig = doc.add_object(dictionary! {
        "Type" => "Annot", "Subtype" => "Widget", "P" => page0_id,
        "FT" => "Sig", "T" => text("sig"), "Rect" => rect(50, 500, 250, 520),
    });
    let button = doc.add_object(dictionary! {
        "Type" => "Annot", "Subtype" => "Widget", "P" => page0_id,
        "FT" => "Btn", "T" => text("button"), "Ff" => 65536, "Rect" => rect(300, 500, 350, 520),
    });
    let barcode = doc.add_object(dictionary! {
        "Type" => "Annot", "Subtype" => "Widget", "P" => page0_id,
        "FT" => "Bc", "T" => text("barcode"), "Rect" => rect(300, 550, 350, 570),
    });
    let link = doc.add_object(dictionary! {
        "Type" => "Annot", "Subtype" => "Link", "Rect" => rect(300, 700, 350, 720),
    });
    let person = doc.new_object_id();
    let person_name = doc.add_object(dictionary! {
        "Type" => "Annot", "Subtype" => "Widget", "P" => page0_id, "Parent" => person,
        "FT" => "Tx", "T" => text("name"), "Rect" => rect(250, 450, 50, 470),
    });
    doc.objects.insert(
        person,
        Object::Dictionary(dictionary! {
            "T" => text("person"), "MaxLen" => 10, "Kids" => vec![person_name.into()],
        }),
    );
    let test_dup = doc.add_object(dictionary! {
        "Type" => "Annot", "Subtype" => "Widget", "P" => page1_id,
        "FT" => "Tx", "T" => text("test"), "Rect" => rect(50, 700, 250, 720),
    });
    let test_2 = doc.add_object(dictionary! {
        "Type" => "Annot", "Subtype" => "Widget", "P" => page1_id,
        "FT" => "Tx", "T" => text("test_2"), "Rect" => rect(50, 650, 250, 670),
    });

    let content = doc.add_object(Stream::new(
        Dictionary::new(),
        b"BT /F1 12 Tf 72 760 Td (Application) Tj ET".to_vec(),
    ));
    let helvetica = doc.add_object(dictionary! {
        "Type" => "Font", "Subtype" => "Type1", "BaseFont" => "Helvetica",
    });
    doc.objects.insert(
        page0_id,
        Object::Dictionary(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content,
            "Annots" => vec![
                test.into(), check.into(), radio_a.into(), radio_b.into(), country.into(),
                sig.into(), button.into(), barcode.into(), link.into(), person_name.into(),
            ],
        }),
    );
    doc.objects.insert(
        page1_id,
        Object::Dictionary(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Annots" => vec![test_dup.into(), test_2.into()],
        }),
    );
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page0_id.into(), page1_id.into()],
            "Count" => 2,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => helvetica } },
        }),
    );
    let acroform = doc.add_object(dictionary! {
        "Fields" => vec![
            test.into(), check.into(), group.into(), country.into(), sig.into(),
            button.into(), barcode.into(), person.into(), test_dup.into(), test_2.into(),
        ],
    });
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
        "AcroForm" => acroform,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("failed to save test PDF");
    buf
}
