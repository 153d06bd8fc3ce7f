//! Removal of filled widgets after their values have been drawn into the
//! page content.

use std::collections::BTreeSet;

use formfill_core::WidgetRef;
use lopdf::{Object, ObjectId};
use tracing::debug;

use crate::error::BackendError;
use crate::lopdf_backend::{
    LopdfDocument, MAX_TREE_DEPTH, acroform, acroform_mut, catalog_id, resolve_object,
};

pub(crate) fn flatten_widgets(
    doc: &mut LopdfDocument,
    widgets: &[WidgetRef],
) -> Result<(), BackendError> {
    if widgets.is_empty() {
        return Ok(());
    }
    let widget_ids: BTreeSet<ObjectId> = widgets.iter().map(|w| w.widget.id()).collect();
    let mut removed = widget_ids.clone();
    removed.extend(widgets.iter().map(|w| w.field.id()));

    let page_ids = doc.page_ids().to_vec();
    let inner = doc.inner_mut();
    for page_id in page_ids {
        remove_annots(inner, page_id, &widget_ids)?;
    }
    prune_form(inner, &removed)?;

    let pruned = inner.prune_objects();
    debug!(
        widgets = widget_ids.len(),
        pruned = pruned.len(),
        "flattened form widgets"
    );
    Ok(())
}

/// Drop references to `widgets` from the page's `/Annots`, removing the key
/// once nothing is left.
fn remove_annots(
    doc: &mut lopdf::Document,
    page_id: ObjectId,
    widgets: &BTreeSet<ObjectId>,
) -> Result<(), BackendError> {
    let annots = doc
        .get_dictionary(page_id)
        .map_err(|e| BackendError::Parse(format!("failed to get page {page_id:?}: {e}")))?
        .get(b"Annots")
        .ok()
        .cloned();

    let (array_id, items) = match annots {
        Some(Object::Reference(id)) => match doc.get_object(id) {
            Ok(Object::Array(items)) => (Some(id), items.clone()),
            _ => return Ok(()),
        },
        Some(Object::Array(items)) => (None, items),
        _ => return Ok(()),
    };

    let before = items.len();
    let kept: Vec<Object> = items
        .into_iter()
        .filter(|item| !matches!(item, Object::Reference(id) if widgets.contains(id)))
        .collect();
    if kept.len() == before {
        return Ok(());
    }

    match array_id {
        Some(id) if !kept.is_empty() => {
            doc.objects.insert(id, Object::Array(kept));
        }
        _ => {
            let page = doc
                .get_dictionary_mut(page_id)
                .map_err(|e| BackendError::Parse(format!("failed to get page {page_id:?}: {e}")))?;
            if kept.is_empty() {
                page.remove(b"Annots");
            } else {
                page.set("Annots", kept);
            }
        }
    }
    Ok(())
}

/// Remove flattened fields from the form's field tree, and the form itself
/// once it has no fields left.
fn prune_form(doc: &mut lopdf::Document, removed: &BTreeSet<ObjectId>) -> Result<(), BackendError> {
    let Some(form) = acroform(doc) else {
        return Ok(());
    };
    let fields: Vec<Object> = match form.get(b"Fields") {
        Ok(obj) => match resolve_object(doc, obj) {
            Object::Array(items) => items.clone(),
            _ => Vec::new(),
        },
        Err(_) => Vec::new(),
    };

    let kept: Vec<Object> = fields
        .into_iter()
        .filter(|field| keep_field(doc, field, removed, 0))
        .collect();

    if kept.is_empty() {
        let root = catalog_id(doc)?;
        doc.get_dictionary_mut(root)
            .map_err(|e| BackendError::Parse(format!("failed to get catalog: {e}")))?
            .remove(b"AcroForm");
        debug!("removed empty /AcroForm");
    } else if let Some(form) = acroform_mut(doc)? {
        form.set("Fields", kept);
    }
    Ok(())
}

/// Whether a field tree node survives, pruning its `/Kids` in place.
///
/// A node goes when it was removed itself or when every one of its kids
/// went. Dangling references go too.
fn keep_field(
    doc: &mut lopdf::Document,
    field: &Object,
    removed: &BTreeSet<ObjectId>,
    depth: usize,
) -> bool {
    let Object::Reference(id) = field else {
        return true;
    };
    if depth >= MAX_TREE_DEPTH {
        return true;
    }
    let kids = match doc.get_dictionary(*id) {
        Ok(dict) => match dict.get(b"Kids") {
            Ok(Object::Array(kids)) => Some(kids.clone()),
            _ => None,
        },
        Err(_) => return false,
    };
    let listed = removed.contains(id);

    let Some(kids) = kids else {
        return !listed;
    };
    let had_kids = !kids.is_empty();
    let kept: Vec<Object> = kids
        .into_iter()
        .filter(|kid| keep_field(doc, kid, removed, depth + 1))
        .collect();
    if kept.is_empty() && (listed || had_kids) {
        return false;
    }
    if let Ok(dict) = doc.get_dictionary_mut(*id) {
        dict.set("Kids", kept);
    }
    true
}
