//! Widget discovery and classification.
//!
//! Walks each page's `/Annots` in page-tree order and turns every widget
//! annotation into a [`WidgetRecord`]. Field attributes that the PDF
//! format lets a field inherit (`/FT`, `/Ff`, `/Opt`, `/MaxLen`) are looked
//! up along the `/Parent` chain starting at the widget.

use std::collections::BTreeSet;

use formfill_core::{
    BBox, Classification, ElementType, FieldError, FieldFlags, ObjectHandle, PdfError,
    WidgetRecord,
};
use lopdf::{Dictionary, Object, ObjectId};
use tracing::{debug, warn};

use crate::backend::Discovery;
use crate::error::BackendError;
use crate::lopdf_backend::{
    LopdfDocument, MAX_TREE_DEPTH, decode_pdf_string, extract_bbox_from_array,
    extract_string_from_dict, resolve_inherited, resolve_object,
};

/// Appearance state that means "off" for every button.
const OFF_STATE: &[u8] = b"Off";
/// On-state assumed when a button has no normal appearance dictionary.
const DEFAULT_ON_STATE: &str = "Yes";

pub(crate) fn discover_widgets(doc: &LopdfDocument) -> Result<Discovery, BackendError> {
    let inner = doc.inner();
    let mut discovery = Discovery::default();
    let mut seen: BTreeSet<ObjectId> = BTreeSet::new();

    for (page_index, &page_id) in doc.page_ids().iter().enumerate() {
        let page = inner
            .get_dictionary(page_id)
            .map_err(|e| BackendError::Parse(format!("failed to get page dictionary: {e}")))?;
        let Ok(annots) = page.get(b"Annots") else {
            continue;
        };
        let Ok(annots) = resolve_object(inner, annots).as_array() else {
            debug!(page_index, "/Annots is not an array, skipping page");
            continue;
        };

        for annot in annots {
            let Object::Reference(widget_id) = annot else {
                debug!(page_index, "skipping direct annotation object");
                continue;
            };
            if !seen.insert(*widget_id) {
                continue;
            }
            match classify_widget(inner, *widget_id, page_index) {
                Ok(Some(record)) => {
                    debug!(
                        name = %record.name,
                        element_type = %record.element_type,
                        page_index,
                        "discovered widget"
                    );
                    discovery.records.push(record);
                }
                Ok(None) => {}
                Err(field_error) => {
                    warn!(page_index, "skipping widget: {field_error}");
                    discovery.warnings.push(field_error);
                }
            }
        }
    }

    debug!(
        widgets = discovery.records.len(),
        warnings = discovery.warnings.len(),
        "widget discovery finished"
    );
    Ok(discovery)
}

/// Classify one annotation.
///
/// `Ok(None)` means the annotation is not a fillable widget and is skipped
/// without a warning.
fn classify_widget(
    doc: &lopdf::Document,
    widget_id: ObjectId,
    page_index: usize,
) -> Result<Option<WidgetRecord>, FieldError> {
    let Ok(widget) = doc.get_dictionary(widget_id) else {
        debug!(?widget_id, "annotation is not a dictionary");
        return Ok(None);
    };
    let is_widget = matches!(
        widget.get(b"Subtype"),
        Ok(Object::Name(subtype)) if subtype.as_slice() == b"Widget"
    );
    if !is_widget {
        return Ok(None);
    }
    let Some(field_id) = find_field(doc, widget_id) else {
        debug!(?widget_id, "widget has no field name");
        return Ok(None);
    };
    let name = qualified_name(doc, field_id);
    if name.is_empty() {
        debug!(?widget_id, "widget has an empty field name");
        return Ok(None);
    }

    let field_type = match inherited(doc, widget_id, b"FT") {
        Some(Object::Name(ft)) => String::from_utf8_lossy(ft).into_owned(),
        _ => {
            debug!(%name, "widget has no field type");
            return Ok(None);
        }
    };
    let flags = match inherited(doc, widget_id, b"Ff") {
        Some(Object::Integer(bits)) => FieldFlags::from_bits_retain(*bits as u32),
        _ => FieldFlags::empty(),
    };

    let element_type = match ElementType::classify(&field_type, flags) {
        Classification::Element(element_type) => element_type,
        Classification::PushButton => {
            debug!(%name, "skipping push button");
            return Ok(None);
        }
        Classification::Unsupported(field_type) => {
            return Err(FieldError::new(
                name.clone(),
                PdfError::UnsupportedField { name, field_type },
            ));
        }
    };

    let bbox = widget
        .get(b"Rect")
        .ok()
        .and_then(|rect| resolve_object(doc, rect).as_array().ok())
        .and_then(|rect| extract_bbox_from_array(rect).ok())
        .unwrap_or_else(|| {
            debug!(%name, "widget has no usable /Rect");
            BBox::new(0.0, 0.0, 0.0, 0.0)
        });

    let on_state = matches!(element_type, ElementType::Checkbox | ElementType::Radio).then(|| {
        appearance_on_state(doc, widget).unwrap_or_else(|| DEFAULT_ON_STATE.to_string())
    });
    let options = if element_type == ElementType::Dropdown {
        inherited(doc, widget_id, b"Opt")
            .map(|opt| extract_field_options(doc, opt))
            .unwrap_or_default()
    } else {
        Vec::new()
    };
    let max_length = match (element_type, inherited(doc, widget_id, b"MaxLen")) {
        (ElementType::Text, Some(Object::Integer(n))) if *n >= 0 => Some(*n as usize),
        _ => None,
    };

    Ok(Some(WidgetRecord {
        name,
        element_type,
        widget: ObjectHandle::from(widget_id),
        field: ObjectHandle::from(field_id),
        page_index,
        bbox,
        flags,
        on_state,
        options,
        max_length,
    }))
}

/// Inherited field attribute with indirect references resolved.
fn inherited<'a>(doc: &'a lopdf::Document, start: ObjectId, key: &[u8]) -> Option<&'a Object> {
    resolve_inherited(doc, start, key)
        .ok()
        .flatten()
        .map(|obj| resolve_object(doc, obj))
}

/// The nearest dictionary in the `/Parent` chain that carries a partial
/// name `/T`, starting with the widget itself.
fn find_field(doc: &lopdf::Document, widget_id: ObjectId) -> Option<ObjectId> {
    let mut current = widget_id;
    for _ in 0..MAX_TREE_DEPTH {
        let dict = doc.get_dictionary(current).ok()?;
        if dict.has(b"T") {
            return Some(current);
        }
        current = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

/// Fully-qualified field name: partial names from the root down, joined
/// with `.`.
fn qualified_name(doc: &lopdf::Document, field_id: ObjectId) -> String {
    let mut parts = Vec::new();
    let mut current = Some(field_id);
    for _ in 0..MAX_TREE_DEPTH {
        let Some(id) = current else { break };
        let Ok(dict) = doc.get_dictionary(id) else {
            break;
        };
        if let Some(partial) = extract_string_from_dict(doc, dict, b"T") {
            parts.push(partial);
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }
    parts.reverse();
    parts.join(".")
}

/// First state name in the widget's normal appearance dictionary other
/// than `Off`.
fn appearance_on_state(doc: &lopdf::Document, widget: &Dictionary) -> Option<String> {
    let ap = resolve_object(doc, widget.get(b"AP").ok()?).as_dict().ok()?;
    let normal = resolve_object(doc, ap.get(b"N").ok()?).as_dict().ok()?;
    normal
        .iter()
        .map(|(state, _)| state)
        .find(|state| state.as_slice() != OFF_STATE)
        .map(|state| String::from_utf8_lossy(state).into_owned())
}

/// Export values from a choice field's `/Opt` array.
///
/// An entry is either a text string or an `[export display]` pair; for
/// pairs the export value is used.
fn extract_field_options(doc: &lopdf::Document, opt: &Object) -> Vec<String> {
    let Ok(items) = opt.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let value = match resolve_object(doc, item) {
                Object::Array(pair) => resolve_object(doc, pair.first()?),
                other => other,
            };
            match value {
                Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
                Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
                _ => None,
            }
        })
        .collect()
}
