//! Simple-mode writer: values go into the field dictionaries themselves.
//!
//! Text values are stored in `/V`; button states in `/V` on the field and
//! `/AS` on each widget. Appearance streams are left untouched and viewers
//! are asked to regenerate them through `/NeedAppearances`.

use formfill_core::{Element, FieldFlags, ObjectHandle, ResolvedValue, WidgetRef};
use lopdf::{Object, dictionary};
use tracing::debug;

use crate::error::BackendError;
use crate::lopdf_backend::{
    LopdfDocument, acroform_mut, catalog_id, encode_pdf_string, resolve_inherited,
};

const OFF_STATE: &str = "Off";

pub(crate) fn write_value(
    doc: &mut LopdfDocument,
    element: &Element,
    value: &ResolvedValue,
) -> Result<(), BackendError> {
    let widgets = element.widgets();
    let fields = distinct_fields(widgets);
    let inner = doc.inner_mut();

    match value {
        ResolvedValue::Text(text) => {
            for field in fields {
                set_entry(inner, field, "V", encode_pdf_string(text))?;
            }
        }
        ResolvedValue::Check(on) => {
            for widget in widgets {
                set_entry(inner, widget.widget, "AS", state_name(widget, *on))?;
            }
            for field in fields {
                let value = widgets
                    .iter()
                    .find(|w| w.field == field)
                    .map_or_else(off, |w| state_name(w, *on));
                set_entry(inner, field, "V", value)?;
            }
        }
        ResolvedValue::Select(selected) => {
            let chosen = selected.and_then(|index| widgets.get(index));
            for (index, widget) in widgets.iter().enumerate() {
                let on = *selected == Some(index);
                set_entry(inner, widget.widget, "AS", state_name(widget, on))?;
            }
            for field in fields {
                let value = match chosen {
                    Some(widget) if widget.field == field => state_name(widget, true),
                    _ => off(),
                };
                set_entry(inner, field, "V", value)?;
            }
        }
    }

    debug!(name = element.name(), "stored field value");
    Ok(())
}

/// Set `/NeedAppearances true` on the interactive form, creating the form
/// dictionary if the catalog has none.
pub(crate) fn set_need_appearances(doc: &mut LopdfDocument) -> Result<(), BackendError> {
    let inner = doc.inner_mut();
    if let Some(acroform) = acroform_mut(inner)? {
        acroform.set("NeedAppearances", true);
        return Ok(());
    }

    let acroform = inner.add_object(dictionary! {
        "Fields" => Vec::<Object>::new(),
        "NeedAppearances" => true,
    });
    let root = catalog_id(inner)?;
    inner
        .get_dictionary_mut(root)
        .map_err(|e| BackendError::Parse(format!("failed to get catalog: {e}")))?
        .set("AcroForm", acroform);
    debug!("created /AcroForm for /NeedAppearances");
    Ok(())
}

/// Add the read-only bit to each field's effective `/Ff`.
pub(crate) fn set_read_only(
    doc: &mut LopdfDocument,
    fields: &[ObjectHandle],
) -> Result<(), BackendError> {
    let inner = doc.inner_mut();
    for field in fields {
        let current = match resolve_inherited(inner, field.id(), b"Ff")? {
            Some(Object::Integer(bits)) => FieldFlags::from_bits_retain(*bits as u32),
            _ => FieldFlags::empty(),
        };
        let flags = current | FieldFlags::READ_ONLY;
        set_entry(inner, *field, "Ff", i64::from(flags.bits()))?;
    }
    Ok(())
}

/// Field dictionaries behind `widgets`, without duplicates, in widget order.
fn distinct_fields(widgets: &[WidgetRef]) -> Vec<ObjectHandle> {
    let mut fields: Vec<ObjectHandle> = Vec::with_capacity(widgets.len());
    for widget in widgets {
        if !fields.contains(&widget.field) {
            fields.push(widget.field);
        }
    }
    fields
}

fn state_name(widget: &WidgetRef, on: bool) -> Object {
    if on {
        Object::Name(widget.on_state.as_deref().unwrap_or("Yes").as_bytes().to_vec())
    } else {
        off()
    }
}

fn off() -> Object {
    Object::Name(OFF_STATE.as_bytes().to_vec())
}

fn set_entry(
    doc: &mut lopdf::Document,
    handle: ObjectHandle,
    key: &str,
    value: impl Into<Object>,
) -> Result<(), BackendError> {
    doc.get_dictionary_mut(handle.id())
        .map_err(|e| BackendError::Parse(format!("failed to get field {:?}: {e}", handle.id())))?
        .set(key, value);
    Ok(())
}
