//! Shared helpers for the fill integration tests.
//!
//! Builds a small AcroForm template with lopdf and reads filled output back
//! with lopdf.

#![allow(dead_code)]

use formfill::{FillData, fill_data};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Object, ObjectId, Stream, StringFormat, dictionary};

fn text(s: &str) -> Object {
    Object::String(s.as_bytes().to_vec(), StringFormat::Literal)
}

fn rect(x0: i64, y0: i64, x1: i64, y1: i64) -> Object {
    vec![x0.into(), y0.into(), x1.into(), y1.into()].into()
}

/// A two-page form.
///
/// Page 0: text `test` at (50, 700, 250, 720), check box `check` at
/// (50, 650, 70, 670), text `test_2` at (50, 600, 250, 620), check box
/// `check_2` at (50, 550, 70, 570). Page 1: text `test_3` and check box
/// `check_3` at the same places as `test` and `check`.
pub fn template_pdf() -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let page_ids = [doc.new_object_id(), doc.new_object_id()];
    let on = doc.add_object(Stream::new(Dictionary::new(), b"0 g".to_vec()));
    let off = doc.add_object(Stream::new(Dictionary::new(), Vec::new()));

    let text_field = |doc: &mut lopdf::Document, name: &str, page: ObjectId, y: i64| {
        doc.add_object(dictionary! {
            "Type" => "Annot", "Subtype" => "Widget", "P" => page,
            "FT" => "Tx", "T" => text(name), "Rect" => rect(50, y, 250, y + 20),
        })
    };
    let test = text_field(&mut doc, "test", page_ids[0], 700);
    let test_2 = text_field(&mut doc, "test_2", page_ids[0], 600);
    let test_3 = text_field(&mut doc, "test_3", page_ids[1], 700);

    let check_box = |doc: &mut lopdf::Document, name: &str, page: ObjectId, y: i64| {
        doc.add_object(dictionary! {
            "Type" => "Annot", "Subtype" => "Widget", "P" => page,
            "FT" => "Btn", "T" => text(name), "Rect" => rect(50, y, 70, y + 20),
            "V" => "Off", "AS" => "Off",
            "AP" => dictionary! { "N" => dictionary! { "Yes" => on, "Off" => off } },
        })
    };
    let check = check_box(&mut doc, "check", page_ids[0], 650);
    let check_2 = check_box(&mut doc, "check_2", page_ids[0], 550);
    let check_3 = check_box(&mut doc, "check_3", page_ids[1], 650);

    let helvetica = doc.add_object(dictionary! {
        "Type" => "Font", "Subtype" => "Type1", "BaseFont" => "Helvetica",
    });
    let content = doc.add_object(Stream::new(
        Dictionary::new(),
        b"BT /F1 14 Tf 50 750 Td (Application form) Tj ET".to_vec(),
    ));
    doc.objects.insert(
        page_ids[0],
        Object::Dictionary(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => helvetica } },
            "Annots" => vec![test.into(), check.into(), test_2.into(), check_2.into()],
        }),
    );
    doc.objects.insert(
        page_ids[1],
        Object::Dictionary(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Annots" => vec![test_3.into(), check_3.into()],
        }),
    );
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_ids[0].into(), page_ids[1].into()],
            "Count" => 2,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let acroform = doc.add_object(dictionary! {
        "Fields" => vec![
            test.into(), check.into(), test_2.into(), check_2.into(), test_3.into(), check_3.into(),
        ],
    });
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
        "AcroForm" => acroform,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("failed to save template PDF");
    buf
}

/// A two-page form mixing every fillable kind, with names reused across
/// pages.
///
/// Page 0, in `/Annots` order: text `name` (50, 700, 250, 720); radio group
/// `color` with kids in states `red` (50, 650, 70, 670) and `blue`
/// (100, 650, 120, 670); combo box `country` (50, 600, 250, 620) with export
/// values `us`, `uk`; `barcode` of the unknown type `/Bc`.
/// Page 1: a second, separate `name` text field at the same place; check
/// box `agree` (50, 650, 70, 670); a text widget also named `agree`.
pub fn mixed_pdf() -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let page_ids = [doc.new_object_id(), doc.new_object_id()];
    let on = doc.add_object(Stream::new(Dictionary::new(), b"0 g".to_vec()));
    let off = doc.add_object(Stream::new(Dictionary::new(), Vec::new()));

    let name = doc.add_object(dictionary! {
        "Type" => "Annot", "Subtype" => "Widget", "P" => page_ids[0],
        "FT" => "Tx", "T" => text("name"), "Rect" => rect(50, 700, 250, 720),
    });
    let color = doc.new_object_id();
    let radio = |doc: &mut lopdf::Document, state: &str, x: i64| {
        doc.add_object(dictionary! {
            "Type" => "Annot", "Subtype" => "Widget", "P" => page_ids[0], "Parent" => color,
            "Rect" => rect(x, 650, x + 20, 670), "AS" => "Off",
            "AP" => dictionary! { "N" => dictionary! { state => on, "Off" => off } },
        })
    };
    let red = radio(&mut doc, "red", 50);
    let blue = radio(&mut doc, "blue", 100);
    doc.objects.insert(
        color,
        Object::Dictionary(dictionary! {
            "FT" => "Btn", "T" => text("color"), "Ff" => 49152, "V" => "Off",
            "Kids" => vec![red.into(), blue.into()],
        }),
    );
    let country = doc.add_object(dictionary! {
        "Type" => "Annot", "Subtype" => "Widget", "P" => page_ids[0],
        "FT" => "Ch", "T" => text("country"), "Ff" => 131072, "Rect" => rect(50, 600, 250, 620),
        "Opt" => vec![
            vec![text("us"), text("United States")].into(),
            vec![text("uk"), text("United Kingdom")].into(),
        ],
    });
    let barcode = doc.add_object(dictionary! {
        "Type" => "Annot", "Subtype" => "Widget", "P" => page_ids[0],
        "FT" => "Bc", "T" => text("barcode"), "Rect" => rect(300, 700, 350, 720),
    });

    let name_again = doc.add_object(dictionary! {
        "Type" => "Annot", "Subtype" => "Widget", "P" => page_ids[1],
        "FT" => "Tx", "T" => text("name"), "Rect" => rect(50, 700, 250, 720),
    });
    let agree = doc.add_object(dictionary! {
        "Type" => "Annot", "Subtype" => "Widget", "P" => page_ids[1],
        "FT" => "Btn", "T" => text("agree"), "Rect" => rect(50, 650, 70, 670),
        "V" => "Off", "AS" => "Off",
        "AP" => dictionary! { "N" => dictionary! { "Yes" => on, "Off" => off } },
    });
    let agree_text = doc.add_object(dictionary! {
        "Type" => "Annot", "Subtype" => "Widget", "P" => page_ids[1],
        "FT" => "Tx", "T" => text("agree"), "Rect" => rect(100, 650, 250, 670),
    });

    doc.objects.insert(
        page_ids[0],
        Object::Dictionary(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Annots" => vec![name.into(), red.into(), blue.into(), country.into(), barcode.into()],
        }),
    );
    doc.objects.insert(
        page_ids[1],
        Object::Dictionary(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Annots" => vec![name_again.into(), agree.into(), agree_text.into()],
        }),
    );
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_ids[0].into(), page_ids[1].into()],
            "Count" => 2,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let acroform = doc.add_object(dictionary! {
        "Fields" => vec![
            name.into(), color.into(), country.into(), barcode.into(),
            name_again.into(), agree.into(), agree_text.into(),
        ],
    });
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
        "AcroForm" => acroform,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("failed to save mixed PDF");
    buf
}

/// The values every scenario fills in.
pub fn sample_data() -> FillData {
    fill_data([
        ("test", "test_1".into()),
        ("check", true.into()),
        ("test_2", "test_2".into()),
        ("check_2", false.into()),
        ("test_3", "test_3".into()),
        ("check_3", true.into()),
    ])
}

pub fn load(bytes: &[u8]) -> lopdf::Document {
    lopdf::Document::load_mem(bytes).expect("output is not a valid PDF")
}

pub fn page_id(doc: &lopdf::Document, page: usize) -> ObjectId {
    doc.get_pages().values().copied().nth(page).unwrap()
}

/// Decoded content stream operations of one page.
pub fn page_operations(bytes: &[u8], page: usize) -> Vec<Operation> {
    let doc = load(bytes);
    let content = doc.get_page_content(page_id(&doc, page)).unwrap();
    Content::decode(&content).unwrap().operations
}

/// Number of `/Annots` entries on a page (0 when the key is missing).
pub fn annot_count(bytes: &[u8], page: usize) -> usize {
    let doc = load(bytes);
    let page = doc.get_dictionary(page_id(&doc, page)).unwrap();
    match page.get(b"Annots") {
        Ok(Object::Array(items)) => items.len(),
        Ok(Object::Reference(id)) => doc.get_object(*id).unwrap().as_array().unwrap().len(),
        _ => 0,
    }
}

/// The interactive form dictionary of the output, if any.
pub fn acroform(doc: &lopdf::Document) -> Option<Dictionary> {
    let root = doc.trailer.get(b"Root").unwrap().as_reference().unwrap();
    let catalog = doc.get_dictionary(root).unwrap();
    match catalog.get(b"AcroForm").ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok().cloned(),
        Object::Dictionary(dict) => Some(dict.clone()),
        _ => None,
    }
}

/// The field dictionary whose `/T` is `name`.
pub fn field<'a>(doc: &'a lopdf::Document, name: &str) -> &'a Dictionary {
    doc.objects
        .values()
        .find_map(|obj| match obj {
            Object::Dictionary(dict) => match dict.get(b"T") {
                Ok(Object::String(t, _)) if t == name.as_bytes() => Some(dict),
                _ => None,
            },
            _ => None,
        })
        .unwrap_or_else(|| panic!("no field named {name}"))
}

/// Every field dictionary whose `/T` is `name`, in object order.
pub fn fields_named<'a>(doc: &'a lopdf::Document, name: &str) -> Vec<&'a Dictionary> {
    doc.objects
        .values()
        .filter_map(|obj| match obj {
            Object::Dictionary(dict) => match dict.get(b"T") {
                Ok(Object::String(t, _)) if t == name.as_bytes() => Some(dict),
                _ => None,
            },
            _ => None,
        })
        .collect()
}

/// `/AS` of each kid widget of the field named `name`.
pub fn kid_states(doc: &lopdf::Document, name: &str) -> Vec<String> {
    let kids = field(doc, name).get(b"Kids").unwrap().as_array().unwrap();
    kids.iter()
        .map(|kid| {
            let widget = doc.get_dictionary(kid.as_reference().unwrap()).unwrap();
            entry_text(widget, b"AS")
        })
        .collect()
}

/// A name or string entry as text.
pub fn entry_text(dict: &Dictionary, key: &[u8]) -> String {
    match dict.get(key).unwrap() {
        Object::Name(bytes) | Object::String(bytes, _) => String::from_utf8(bytes.clone()).unwrap(),
        other => panic!("expected name or string, got {other:?}"),
    }
}

pub fn entry_int(dict: &Dictionary, key: &[u8]) -> Option<i64> {
    match dict.get(key) {
        Ok(Object::Integer(i)) => Some(*i),
        _ => None,
    }
}

pub fn number(obj: &Object) -> f64 {
    match obj {
        Object::Integer(i) => *i as f64,
        Object::Real(f) => f64::from(*f),
        other => panic!("expected number, got {other:?}"),
    }
}

/// One text-showing block of an overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct Shown {
    pub font: String,
    pub size: f64,
    pub color: Option<[f64; 3]>,
    pub x: f64,
    pub y: f64,
    pub text: String,
}

/// Every `BT … Tj … ET` block of a page, in content order.
pub fn shown_text(bytes: &[u8], page: usize) -> Vec<Shown> {
    let mut shown = Vec::new();
    let mut current: Option<Shown> = None;
    for op in page_operations(bytes, page) {
        match op.operator.as_str() {
            "BT" => {
                current = Some(Shown {
                    font: String::new(),
                    size: 0.0,
                    color: None,
                    x: 0.0,
                    y: 0.0,
                    text: String::new(),
                })
            }
            "Tf" => {
                if let Some(s) = current.as_mut() {
                    if let Object::Name(name) = &op.operands[0] {
                        s.font = String::from_utf8(name.clone()).unwrap();
                    }
                    s.size = number(&op.operands[1]);
                }
            }
            "rg" => {
                if let Some(s) = current.as_mut() {
                    s.color = Some([
                        number(&op.operands[0]),
                        number(&op.operands[1]),
                        number(&op.operands[2]),
                    ]);
                }
            }
            "Td" => {
                if let Some(s) = current.as_mut() {
                    s.x = number(&op.operands[0]);
                    s.y = number(&op.operands[1]);
                }
            }
            "Tj" => {
                if let (Some(s), Object::String(bytes, _)) = (current.as_mut(), &op.operands[0]) {
                    s.text = String::from_utf8_lossy(bytes).into_owned();
                }
            }
            "ET" => shown.extend(current.take()),
            _ => {}
        }
    }
    shown
}

/// Overlay text blocks drawn in the form text font.
pub fn overlay_text(bytes: &[u8], page: usize) -> Vec<Shown> {
    shown_text(bytes, page)
        .into_iter()
        .filter(|s| s.font.starts_with("FormText"))
        .collect()
}

/// Overlay check marks drawn in the check font.
pub fn check_marks(bytes: &[u8], page: usize) -> Vec<Shown> {
    shown_text(bytes, page)
        .into_iter()
        .filter(|s| s.font.starts_with("FormCheck"))
        .collect()
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-3
}
