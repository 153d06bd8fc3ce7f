//! Overlay planning for non-simple mode.
//!
//! Turns filled elements into backend-independent drawing instructions
//! grouped by page. The backend translates each [`DrawOp`] into content
//! stream operators and appends them to the page.

use crate::element::{Element, ElementKind, WidgetRef};
use crate::geometry::Color;
use crate::render::{CHECK_GLYPH_HEIGHT, CHECK_GLYPH_WIDTH, CHECK_SIZE_FACTOR};
use crate::value::ResolvedValue;
use crate::wrap::wrap_text;

/// One drawing instruction in page space.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// A line of text in the overlay text font; `(x, y)` is the baseline start.
    Text {
        font_size: f64,
        color: Color,
        x: f64,
        y: f64,
        text: String,
    },
    /// The check mark glyph in the check font; `(x, y)` is the baseline start.
    CheckMark { size: f64, x: f64, y: f64 },
}

/// All drawing instructions for one page, in element discovery order.
#[derive(Debug, Clone, PartialEq)]
pub struct PageOverlay {
    pub page_index: usize,
    pub ops: Vec<DrawOp>,
}

/// Drawing instructions for one element and its checked value.
///
/// Text is drawn into every widget of the element; a check mark goes into
/// every widget of a checked box, or into the selected radio widget.
pub fn draw_ops(element: &Element, value: &ResolvedValue) -> Vec<(usize, DrawOp)> {
    let mut ops = Vec::new();
    match (element.kind(), value) {
        (ElementKind::Text(config) | ElementKind::Dropdown(config), ResolvedValue::Text(text)) => {
            for widget in element.widgets() {
                let (x0, y0) = widget.bbox.origin();
                for line in wrap_text(text, config).filter(|line| !line.text.is_empty()) {
                    ops.push((
                        widget.page_index,
                        DrawOp::Text {
                            font_size: config.font_size(),
                            color: config.font_color(),
                            x: x0 + line.x,
                            y: y0 + line.y,
                            text: line.text.to_string(),
                        },
                    ));
                }
            }
        }
        (ElementKind::Checkbox, ResolvedValue::Check(true)) => {
            for widget in element.widgets() {
                ops.push((widget.page_index, check_mark(widget)));
            }
        }
        (ElementKind::Radio, ResolvedValue::Select(Some(index))) => {
            if let Some(widget) = element.widgets().get(*index) {
                ops.push((widget.page_index, check_mark(widget)));
            }
        }
        _ => {}
    }
    ops
}

/// A check mark centred in the widget and sized to its shorter side.
fn check_mark(widget: &WidgetRef) -> DrawOp {
    let bbox = widget.bbox;
    let size = bbox.width().min(bbox.height()) * CHECK_SIZE_FACTOR;
    DrawOp::CheckMark {
        size,
        x: bbox.x0 + (bbox.width() - size * CHECK_GLYPH_WIDTH) / 2.0,
        y: bbox.y0 + (bbox.height() - size * CHECK_GLYPH_HEIGHT) / 2.0,
    }
}

/// Group the drawing instructions of `items` by page.
///
/// Pages come out in ascending index order; within a page, instructions keep
/// the order of `items`. Pages without instructions are omitted.
pub fn plan_overlays<'a, I>(items: I) -> Vec<PageOverlay>
where
    I: IntoIterator<Item = (&'a Element, &'a ResolvedValue)>,
{
    let mut pages: Vec<PageOverlay> = Vec::new();
    for (element, value) in items {
        for (page_index, op) in draw_ops(element, value) {
            match pages.iter_mut().find(|p| p.page_index == page_index) {
                Some(page) => page.ops.push(op),
                None => pages.push(PageOverlay {
                    page_index,
                    ops: vec![op],
                }),
            }
        }
    }
    pages.sort_by_key(|p| p.page_index);
    pages
}
