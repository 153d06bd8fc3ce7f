//! Integration tests for the Document fill pipeline.
//!
//! These tests exercise the full end-to-end pipeline:
//! PDF bytes → Document::open → fill → stream → re-parse with lopdf.

mod common;

use common::*;
use formfill::{Color, Document, ElementType, FieldValue, FillOptions, PdfError, fill_data};

fn open(options: FillOptions) -> Document {
    Document::open(&template_pdf(), Some(options)).unwrap()
}

fn filled(options: FillOptions) -> Vec<u8> {
    let mut doc = open(options);
    doc.fill(&sample_data()).unwrap();
    doc.into_stream()
}

// --- discovery ---

#[test]
fn elements_in_discovery_order() {
    let doc = open(FillOptions::default());
    let names: Vec<&str> = doc.elements().keys().map(String::as_str).collect();
    assert_eq!(
        names,
        ["test", "check", "test_2", "check_2", "test_3", "check_3"]
    );
    assert_eq!(doc.element("check").unwrap().element_type(), ElementType::Checkbox);
    assert_eq!(doc.element("test_3").unwrap().page_index(), 1);
    assert!(doc.element("test").unwrap().value().is_none());
}

#[test]
fn values_match_data_after_fill() {
    let data = sample_data();
    for options in [FillOptions::default(), FillOptions::non_simple()] {
        let mut doc = open(options);
        doc.fill(&data).unwrap();
        assert!(doc.field_errors().is_empty());
        for (name, value) in &data {
            assert_eq!(doc.element(name).unwrap().value(), Some(value));
        }
    }
}

// --- simple mode ---

#[test]
fn simple_mode_writes_field_values() {
    let bytes = filled(FillOptions::default());
    let doc = load(&bytes);

    assert_eq!(entry_text(field(&doc, "test"), b"V"), "test_1");
    assert_eq!(entry_text(field(&doc, "test_3"), b"V"), "test_3");
    assert_eq!(entry_text(field(&doc, "check"), b"V"), "Yes");
    assert_eq!(entry_text(field(&doc, "check"), b"AS"), "Yes");
    assert_eq!(entry_text(field(&doc, "check_2"), b"V"), "Off");
    assert_eq!(entry_text(field(&doc, "check_2"), b"AS"), "Off");

    let form = acroform(&doc).unwrap();
    assert!(matches!(
        form.get(b"NeedAppearances"),
        Ok(lopdf::Object::Boolean(true))
    ));
}

#[test]
fn simple_mode_marks_fields_read_only() {
    let bytes = filled(FillOptions::default());
    let doc = load(&bytes);
    for name in ["test", "check", "test_2", "check_2", "test_3", "check_3"] {
        assert_eq!(entry_int(field(&doc, name), b"Ff"), Some(1), "{name}");
    }
}

#[test]
fn simple_mode_editable_keeps_flags() {
    let options = FillOptions {
        editable: true,
        ..FillOptions::default()
    };
    let bytes = filled(options);
    let doc = load(&bytes);
    assert_eq!(entry_text(field(&doc, "test"), b"V"), "test_1");
    for name in ["test", "check", "test_2", "check_2", "test_3", "check_3"] {
        assert_eq!(entry_int(field(&doc, name), b"Ff"), None, "{name}");
    }
}

// --- mode boundary ---

#[test]
fn simple_mode_leaves_page_content_and_widgets() {
    let input = template_pdf();
    let bytes = filled(FillOptions::default());

    assert_eq!(page_operations(&bytes, 0).len(), page_operations(&input, 0).len());
    assert!(overlay_text(&bytes, 0).is_empty());
    assert_eq!(annot_count(&bytes, 0), 4);
    assert_eq!(annot_count(&bytes, 1), 2);
}

#[test]
fn non_simple_mode_draws_and_flattens() {
    let bytes = filled(FillOptions::non_simple());

    let texts: Vec<String> = overlay_text(&bytes, 0).into_iter().map(|s| s.text).collect();
    assert_eq!(texts, ["test_1", "test_2"]);
    let texts: Vec<String> = overlay_text(&bytes, 1).into_iter().map(|s| s.text).collect();
    assert_eq!(texts, ["test_3"]);
    assert_eq!(check_marks(&bytes, 0).len(), 1);
    assert_eq!(check_marks(&bytes, 1).len(), 1);

    assert_eq!(annot_count(&bytes, 0), 0);
    assert_eq!(annot_count(&bytes, 1), 0);
    assert!(acroform(&load(&bytes)).is_none());

    // The original page text is still there, before the overlay.
    let shown = shown_text(&bytes, 0);
    assert_eq!(shown[0].text, "Application form");
}

#[test]
fn non_simple_mode_ignores_editable() {
    let options = FillOptions {
        editable: true,
        ..FillOptions::non_simple()
    };
    let bytes = filled(options);
    assert_eq!(annot_count(&bytes, 0), 0);
    assert!(acroform(&load(&bytes)).is_none());
}

#[test]
fn flattened_output_has_no_elements() {
    let bytes = filled(FillOptions::non_simple());
    let reopened = Document::open(&bytes, None).unwrap();
    assert!(reopened.elements().is_empty());
}

// --- render configuration scenarios ---

#[test]
fn default_rendering() {
    let bytes = filled(FillOptions::non_simple());
    let test = &overlay_text(&bytes, 0)[0];
    assert!(approx(test.size, 12.0));
    assert_eq!(test.color, Some([0.0, 0.0, 0.0]));
    assert!(approx(test.x, 50.0));
    assert!(approx(test.y, 700.0));
}

#[test]
fn global_font_size_applies_to_text_only() {
    let options = FillOptions {
        font_size: 20.0,
        ..FillOptions::non_simple()
    };
    let doc = open(options.clone());
    for element in doc.elements().values() {
        match element.element_type() {
            ElementType::Text => {
                assert_eq!(element.render_config().unwrap().font_size(), 20.0);
            }
            _ => assert!(element.render_config().is_none()),
        }
    }

    let bytes = filled(options);
    for page in [0, 1] {
        for shown in overlay_text(&bytes, page) {
            assert!(approx(shown.size, 20.0), "{shown:?}");
        }
        // Check marks are sized by their widget: 20pt box * 0.8.
        for mark in check_marks(&bytes, page) {
            assert!(approx(mark.size, 16.0), "{mark:?}");
        }
    }
}

#[test]
fn global_font_color() {
    let options = FillOptions {
        font_color: Color::new(1.0, 0.0, 0.0),
        ..FillOptions::non_simple()
    };
    let bytes = filled(options);
    for shown in overlay_text(&bytes, 0) {
        assert_eq!(shown.color, Some([1.0, 0.0, 0.0]));
    }
    for mark in check_marks(&bytes, 0) {
        assert_eq!(mark.color, Some([0.0, 0.0, 0.0]));
    }
}

#[test]
fn global_offsets() {
    let options = FillOptions {
        text_x_offset: 100.0,
        text_y_offset: -100.0,
        ..FillOptions::non_simple()
    };
    let bytes = filled(options);
    let shown = overlay_text(&bytes, 0);
    assert!(approx(shown[0].x, 150.0) && approx(shown[0].y, 600.0));
    assert!(approx(shown[1].x, 150.0) && approx(shown[1].y, 500.0));
}

#[test]
fn global_wrap_length() {
    let options = FillOptions {
        text_wrap_length: 2,
        ..FillOptions::non_simple()
    };
    let bytes = filled(options);
    let shown = overlay_text(&bytes, 0);
    let texts: Vec<&str> = shown.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, ["te", "st", "_1", "te", "st", "_2"]);
    // 12pt font, 1.2 line height.
    assert!(approx(shown[1].y, 700.0 - 14.4));
    assert!(approx(shown[2].y, 700.0 - 28.8));
}

#[test]
fn wrapped_line_count_is_ceiling_of_length_over_width() {
    for (value, width) in [("abcdefg", 3usize), ("abcdef", 3), ("a", 5), ("abcdefghij", 1)] {
        let options = FillOptions {
            text_wrap_length: width,
            ..FillOptions::non_simple()
        };
        let mut doc = open(options);
        doc.fill(&fill_data([("test", value.into())])).unwrap();
        let lines = overlay_text(doc.stream(), 0).len();
        assert_eq!(lines, value.chars().count().div_ceil(width), "{value} / {width}");
    }
}

#[test]
fn customized_elements() {
    let mut doc = open(FillOptions::non_simple());
    {
        let test = doc.element_mut("test").unwrap();
        test.set_font_size(20.0).unwrap();
        test.set_font_color((1.0, 0.0, 0.0)).unwrap();
    }
    {
        let test_2 = doc.element_mut("test_2").unwrap();
        test_2.set_font_color((0.0, 1.0, 0.0)).unwrap();
        test_2.set_text_x_offset(50.0).unwrap();
        test_2.set_text_y_offset(-50.0).unwrap();
        test_2.set_text_wrap_length(1).unwrap();
    }
    doc.element_mut("test_3").unwrap().set_text_wrap_length(2).unwrap();
    doc.fill(&sample_data()).unwrap();
    let bytes = doc.stream();

    let page0 = overlay_text(bytes, 0);
    assert_eq!(page0[0].text, "test_1");
    assert!(approx(page0[0].size, 20.0));
    assert_eq!(page0[0].color, Some([1.0, 0.0, 0.0]));

    let test_2: Vec<_> = page0[1..].iter().collect();
    assert_eq!(test_2.len(), 6);
    for (i, line) in test_2.iter().enumerate() {
        assert_eq!(line.color, Some([0.0, 1.0, 0.0]));
        assert!(approx(line.x, 100.0));
        assert!(approx(line.y, 550.0 - i as f64 * 14.4));
    }

    let page1: Vec<String> = overlay_text(bytes, 1).into_iter().map(|s| s.text).collect();
    assert_eq!(page1, ["te", "st", "_3"]);
}

#[test]
fn element_settings_are_isolated() {
    let mut doc = open(FillOptions::default());
    doc.element_mut("test").unwrap().set_font_size(20.0).unwrap();

    assert_eq!(
        doc.element("test").unwrap().render_config().unwrap().font_size(),
        20.0
    );
    assert_eq!(
        doc.element("test_2").unwrap().render_config().unwrap().font_size(),
        12.0
    );
    assert_eq!(doc.options().font_size, 12.0);
}

#[test]
fn invalid_element_setting_is_rejected() {
    let mut doc = open(FillOptions::default());
    let test = doc.element_mut("test").unwrap();
    let err = test.set_font_size(-1.0).unwrap_err();
    assert!(matches!(err, PdfError::InvalidConfig { .. }));
    assert_eq!(test.render_config().unwrap().font_size(), 12.0);
    assert!(matches!(
        doc.element_mut("check").unwrap().set_font_size(20.0),
        Err(PdfError::InvalidConfig { .. })
    ));
}

// --- determinism and repeated fills ---

#[test]
fn identical_inputs_give_identical_bytes() {
    for options in [FillOptions::default(), FillOptions::non_simple()] {
        assert_eq!(filled(options.clone()), filled(options));
    }
}

#[test]
fn stream_is_input_until_filled() {
    let input = template_pdf();
    let doc = Document::open(&input, None).unwrap();
    assert_eq!(doc.stream(), input.as_slice());
}

#[test]
fn partial_fill_keeps_earlier_values() {
    let mut doc = open(FillOptions::default());
    doc.fill(&fill_data([("test", "first".into())])).unwrap();
    doc.fill(&fill_data([("check", true.into())])).unwrap();

    assert_eq!(
        doc.element("test").unwrap().value(),
        Some(&FieldValue::from("first"))
    );
    assert!(doc.element("test_2").unwrap().value().is_none());

    let out = load(doc.stream());
    assert_eq!(entry_text(field(&out, "test"), b"V"), "first");
    assert_eq!(entry_text(field(&out, "check"), b"V"), "Yes");
    assert!(field(&out, "test_2").get(b"V").is_err());
}

#[test]
fn simple_mode_refill_overwrites() {
    let mut doc = open(FillOptions::default());
    doc.fill(&fill_data([("test", "first".into())])).unwrap();
    doc.fill(&fill_data([("test", "second".into())])).unwrap();
    let out = load(doc.stream());
    assert_eq!(entry_text(field(&out, "test"), b"V"), "second");
}

#[test]
fn non_simple_refill_stacks_overlays() {
    let mut doc = open(FillOptions::non_simple());
    doc.fill(&fill_data([("test", "first".into())])).unwrap();
    doc.fill(&fill_data([("test_2", "second".into())])).unwrap();
    let texts: Vec<String> = overlay_text(doc.stream(), 0)
        .into_iter()
        .map(|s| s.text)
        .collect();
    assert_eq!(texts, ["first", "second"]);
}

#[test]
fn overlay_paints_in_discovery_order() {
    let forward = fill_data([("test", "first".into()), ("test_2", "second".into())]);
    let reversed = fill_data([("test_2", "second".into()), ("test", "first".into())]);
    let mut outputs = Vec::new();
    for data in [forward, reversed] {
        let mut doc = open(FillOptions::non_simple());
        doc.fill(&data).unwrap();
        let texts: Vec<String> = overlay_text(doc.stream(), 0)
            .into_iter()
            .map(|s| s.text)
            .collect();
        assert_eq!(texts, ["first", "second"]);
        outputs.push(doc.into_stream());
    }
    assert_eq!(outputs[0], outputs[1]);
}

// --- per-field errors ---

#[test]
fn type_mismatch_is_isolated() {
    let mut doc = open(FillOptions::default());
    let data = fill_data([
        ("test", true.into()),
        ("check", "yes".into()),
        ("test_2", "test_2".into()),
    ]);
    doc.fill(&data).unwrap();

    let errors = doc.field_errors();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].name, "test");
    assert!(matches!(errors[0].error, PdfError::TypeMismatch { .. }));
    assert_eq!(errors[1].name, "check");

    assert!(doc.element("test").unwrap().value().is_none());
    assert!(doc.element("check").unwrap().value().is_none());
    let out = load(doc.stream());
    assert_eq!(entry_text(field(&out, "test_2"), b"V"), "test_2");
    assert!(field(&out, "test").get(b"V").is_err());
}

#[test]
fn field_errors_reset_on_each_fill() {
    let mut doc = open(FillOptions::default());
    doc.fill(&fill_data([("test", true.into())])).unwrap();
    assert_eq!(doc.field_errors().len(), 1);
    doc.fill(&fill_data([("test", "ok".into())])).unwrap();
    assert!(doc.field_errors().is_empty());
}

#[test]
fn strict_mode_fails_without_changes() {
    let options = FillOptions {
        strict_mode: true,
        ..FillOptions::default()
    };
    let input = template_pdf();
    let mut doc = Document::open(&input, Some(options)).unwrap();
    let data = fill_data([("test", "test_1".into()), ("check", "yes".into())]);

    let err = doc.fill(&data).unwrap_err();
    assert!(matches!(err, PdfError::TypeMismatch { ref name, .. } if name == "check"));
    assert!(doc.element("test").unwrap().value().is_none());
    assert_eq!(doc.stream(), input.as_slice());
}

#[test]
fn unknown_names_are_ignored() {
    let mut doc = open(FillOptions::default());
    doc.fill(&fill_data([("missing", "x".into()), ("test", "test_1".into())]))
        .unwrap();
    assert!(doc.field_errors().is_empty());
    assert_eq!(
        doc.element("test").unwrap().value(),
        Some(&FieldValue::from("test_1"))
    );
}

#[test]
fn non_ascii_text_round_trips_in_simple_mode() {
    let mut doc = open(FillOptions::default());
    doc.fill(&fill_data([("test", "naïve 日本".into())])).unwrap();
    let out = load(doc.stream());
    match field(&out, "test").get(b"V").unwrap() {
        lopdf::Object::String(bytes, _) => {
            assert_eq!(&bytes[..2], &[0xFE, 0xFF]);
            let units: Vec<u16> = bytes[2..]
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect();
            assert_eq!(String::from_utf16(&units).unwrap(), "naïve 日本");
        }
        other => panic!("expected string, got {other:?}"),
    }
}
