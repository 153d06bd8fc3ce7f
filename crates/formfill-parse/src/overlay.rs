//! Page content overlay for non-simple mode.
//!
//! Each [`PageOverlay`] becomes one extra content stream appended to its
//! page. The page's existing content is wrapped in `q`/`Q` so that any
//! graphics state it leaves behind does not leak into the overlay.

use formfill_core::{CHECK_FONT_NAME, CHECK_GLYPH, Color, DrawOp, PageOverlay};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Object, ObjectId, Stream, StringFormat, dictionary};
use tracing::debug;

use crate::error::BackendError;
use crate::lopdf_backend::{LopdfDocument, resolve_inherited, resolve_object};

const TEXT_FONT_PREFIX: &str = "FormText";
const CHECK_FONT_PREFIX: &str = "FormCheck";
const WIN_ANSI_ENCODING: &str = "WinAnsiEncoding";

pub(crate) fn append_overlay(
    doc: &mut LopdfDocument,
    overlay: &PageOverlay,
    text_font: &str,
) -> Result<(), BackendError> {
    if overlay.ops.is_empty() {
        return Ok(());
    }
    let page_id = doc.page_id(overlay.page_index)?;
    let inner = doc.inner_mut();

    let mut resources = page_resources(inner, page_id)?;
    let mut fonts = match resources.get(b"Font") {
        Ok(obj) => resolve_object(inner, obj).as_dict().cloned().unwrap_or_default(),
        Err(_) => Dictionary::new(),
    };

    let has_text = overlay.ops.iter().any(|op| matches!(op, DrawOp::Text { .. }));
    let has_check = overlay.ops.iter().any(|op| matches!(op, DrawOp::CheckMark { .. }));
    let text_key = if has_text {
        register_font(inner, &mut fonts, text_font, true, TEXT_FONT_PREFIX)
    } else {
        Vec::new()
    };
    let check_key = if has_check {
        register_font(inner, &mut fonts, CHECK_FONT_NAME, false, CHECK_FONT_PREFIX)
    } else {
        Vec::new()
    };
    resources.set("Font", Object::Dictionary(fonts));

    let mut operations = Vec::with_capacity(overlay.ops.len() * 6);
    for op in &overlay.ops {
        match op {
            DrawOp::Text {
                font_size,
                color,
                x,
                y,
                text,
            } => push_text(
                &mut operations,
                &text_key,
                *font_size,
                *color,
                *x,
                *y,
                win_ansi(text),
            ),
            DrawOp::CheckMark { size, x, y } => push_text(
                &mut operations,
                &check_key,
                *size,
                Color::black(),
                *x,
                *y,
                CHECK_GLYPH.as_bytes().to_vec(),
            ),
        }
    }
    let bytes = Content { operations }
        .encode()
        .map_err(|e| BackendError::Encode(format!("failed to encode overlay content: {e}")))?;

    wrap_contents(inner, page_id, bytes)?;
    inner
        .get_dictionary_mut(page_id)
        .map_err(|e| BackendError::Parse(format!("failed to get page {page_id:?}: {e}")))?
        .set("Resources", Object::Dictionary(resources));

    debug!(
        page = overlay.page_index,
        ops = overlay.ops.len(),
        "appended overlay content"
    );
    Ok(())
}

fn push_text(
    operations: &mut Vec<Operation>,
    font_key: &[u8],
    size: f64,
    color: Color,
    x: f64,
    y: f64,
    text: Vec<u8>,
) {
    operations.push(Operation::new("BT", vec![]));
    operations.push(Operation::new(
        "Tf",
        vec![Object::Name(font_key.to_vec()), real(size)],
    ));
    operations.push(Operation::new(
        "rg",
        vec![real(color.r), real(color.g), real(color.b)],
    ));
    operations.push(Operation::new("Td", vec![real(x), real(y)]));
    operations.push(Operation::new(
        "Tj",
        vec![Object::String(text, StringFormat::Literal)],
    ));
    operations.push(Operation::new("ET", vec![]));
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

/// A copy of the page's effective resource dictionary.
fn page_resources(doc: &lopdf::Document, page_id: ObjectId) -> Result<Dictionary, BackendError> {
    match resolve_inherited(doc, page_id, b"Resources")? {
        Some(obj) => resolve_object(doc, obj)
            .as_dict()
            .cloned()
            .map_err(|_| BackendError::Parse("/Resources is not a dictionary".to_string())),
        None => Ok(Dictionary::new()),
    }
}

/// Resource key of a Type1 font with `base_font`, adding one if the page
/// has no matching entry.
///
/// Text fonts must carry `/WinAnsiEncoding`; symbol fonts must carry no
/// encoding at all. New keys never collide with existing ones.
fn register_font(
    doc: &mut lopdf::Document,
    fonts: &mut Dictionary,
    base_font: &str,
    win_ansi: bool,
    prefix: &str,
) -> Vec<u8> {
    for (key, value) in fonts.iter() {
        let Ok(font) = resolve_object(doc, value).as_dict() else {
            continue;
        };
        if font_matches(font, base_font, win_ansi) {
            return key.clone();
        }
    }

    let mut key = prefix.to_string();
    let mut suffix = 1;
    while fonts.has(key.as_bytes()) {
        key = format!("{prefix}{suffix}");
        suffix += 1;
    }

    let mut font = dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => Object::Name(base_font.as_bytes().to_vec()),
    };
    if win_ansi {
        font.set("Encoding", Object::Name(WIN_ANSI_ENCODING.as_bytes().to_vec()));
    }
    let id = doc.add_object(font);
    fonts.set(key.clone(), id);
    debug!(font = base_font, key = %key, "registered overlay font");
    key.into_bytes()
}

fn font_matches(font: &Dictionary, base_font: &str, win_ansi: bool) -> bool {
    let is_name = |key: &[u8], expected: &str| {
        matches!(font.get(key), Ok(Object::Name(name)) if name == expected.as_bytes())
    };
    if !is_name(b"Subtype", "Type1") || !is_name(b"BaseFont", base_font) {
        return false;
    }
    if win_ansi {
        is_name(b"Encoding", WIN_ANSI_ENCODING)
    } else {
        !font.has(b"Encoding")
    }
}

/// Replace the page's `/Contents` with `[q, existing..., Q overlay]`.
///
/// A page without content just gets the overlay stream.
fn wrap_contents(
    doc: &mut lopdf::Document,
    page_id: ObjectId,
    overlay: Vec<u8>,
) -> Result<(), BackendError> {
    let current = doc
        .get_dictionary(page_id)
        .map_err(|e| BackendError::Parse(format!("failed to get page {page_id:?}: {e}")))?
        .get(b"Contents")
        .ok()
        .cloned();

    let existing: Vec<Object> = match current {
        Some(Object::Reference(id)) => match doc.get_object(id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(id)],
        },
        Some(Object::Array(items)) => items,
        Some(Object::Stream(stream)) => vec![doc.add_object(stream).into()],
        _ => Vec::new(),
    };

    let contents: Vec<Object> = if existing.is_empty() {
        vec![doc.add_object(Stream::new(Dictionary::new(), overlay)).into()]
    } else {
        let save = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let mut restore = b"\nQ\n".to_vec();
        restore.extend_from_slice(&overlay);
        let restore = doc.add_object(Stream::new(Dictionary::new(), restore));

        let mut contents = Vec::with_capacity(existing.len() + 2);
        contents.push(save.into());
        contents.extend(existing);
        contents.push(restore.into());
        contents
    };

    doc.get_dictionary_mut(page_id)
        .map_err(|e| BackendError::Parse(format!("failed to get page {page_id:?}: {e}")))?
        .set("Contents", contents);
    Ok(())
}

/// Encode text for a font with `/WinAnsiEncoding`. Characters outside the
/// encoding become `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80,
            '\u{201A}' => 0x82,
            '\u{0192}' => 0x83,
            '\u{201E}' => 0x84,
            '\u{2026}' => 0x85,
            '\u{2020}' => 0x86,
            '\u{2021}' => 0x87,
            '\u{02C6}' => 0x88,
            '\u{2030}' => 0x89,
            '\u{0160}' => 0x8A,
            '\u{2039}' => 0x8B,
            '\u{0152}' => 0x8C,
            '\u{017D}' => 0x8E,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{02DC}' => 0x98,
            '\u{2122}' => 0x99,
            '\u{0161}' => 0x9A,
            '\u{203A}' => 0x9B,
            '\u{0153}' => 0x9C,
            '\u{017E}' => 0x9E,
            '\u{0178}' => 0x9F,
            '\u{80}'..='\u{9F}' => b'?',
            c if (c as u32) <= 0xFF => c as u8,
            _ => b'?',
        })
        .collect()
}
