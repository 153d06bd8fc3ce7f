//! Form elements discovered in a document.
//!
//! A widget annotation found on a page is described by a [`WidgetRecord`].
//! Records are grouped by fully-qualified field name into [`Element`]s, which
//! carry the caller's value and, for text-like elements, a mutable
//! [`RenderConfig`].

use std::fmt;

use bitflags::bitflags;

use crate::geometry::{BBox, Color};
use crate::value::{FieldValue, ResolvedValue};
use crate::{PdfError, RenderConfig};

bitflags! {
    /// Field flags from the `/Ff` entry (PDF 1.7 Tables 221, 226, 228, 230).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FieldFlags: u32 {
        /// Bit 1: the user may not change the value.
        const READ_ONLY = 1 << 0;
        /// Bit 2: a value is required before submitting.
        const REQUIRED = 1 << 1;
        /// Bit 3: not exported by submit-form actions.
        const NO_EXPORT = 1 << 2;
        /// Bit 13: text field accepts multiple lines.
        const MULTILINE = 1 << 12;
        /// Bit 15: radio group with exactly one button on at all times.
        const NO_TOGGLE_TO_OFF = 1 << 14;
        /// Bit 16: button field is a radio group.
        const RADIO = 1 << 15;
        /// Bit 17: button field is a push button.
        const PUSHBUTTON = 1 << 16;
        /// Bit 18: choice field is a combo box.
        const COMBO = 1 << 17;
    }
}

/// The kind of a fillable element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ElementType {
    /// Text field (`/FT /Tx`).
    Text,
    /// Check box (`/FT /Btn` without radio or push-button flags).
    Checkbox,
    /// Radio button group (`/FT /Btn` with the radio flag).
    Radio,
    /// Combo box or list box (`/FT /Ch`).
    Dropdown,
    /// Signature field (`/FT /Sig`).
    Signature,
}

/// Outcome of classifying a widget's field type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// A fillable element of the given type.
    Element(ElementType),
    /// A push button; it holds no value and is skipped.
    PushButton,
    /// A field type the engine does not know.
    Unsupported(String),
}

impl ElementType {
    /// Classify a field from its (inherited) `/FT` name and `/Ff` flags.
    pub fn classify(field_type: &str, flags: FieldFlags) -> Classification {
        match field_type {
            "Tx" => Classification::Element(Self::Text),
            "Btn" if flags.contains(FieldFlags::PUSHBUTTON) => Classification::PushButton,
            "Btn" if flags.contains(FieldFlags::RADIO) => Classification::Element(Self::Radio),
            "Btn" => Classification::Element(Self::Checkbox),
            "Ch" => Classification::Element(Self::Dropdown),
            "Sig" => Classification::Element(Self::Signature),
            other => Classification::Unsupported(other.to_string()),
        }
    }

    /// Whether values of this type are laid out as text.
    pub fn is_text_like(&self) -> bool {
        matches!(self, Self::Text | Self::Dropdown)
    }

    /// Human-readable description of the values this type accepts.
    fn accepts(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Checkbox => "bool",
            Self::Radio => "bool or index",
            Self::Dropdown => "text or index",
            Self::Signature => "nothing",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "Text"),
            Self::Checkbox => write!(f, "Checkbox"),
            Self::Radio => write!(f, "Radio"),
            Self::Dropdown => write!(f, "Dropdown"),
            Self::Signature => write!(f, "Signature"),
        }
    }
}

/// Handle to an object in the backend's object arena
/// (object number and generation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectHandle {
    pub number: u32,
    pub generation: u16,
}

impl ObjectHandle {
    pub fn new(number: u32, generation: u16) -> Self {
        Self { number, generation }
    }

    /// The `(number, generation)` pair.
    pub fn id(self) -> (u32, u16) {
        (self.number, self.generation)
    }
}

impl From<(u32, u16)> for ObjectHandle {
    fn from((number, generation): (u32, u16)) -> Self {
        Self { number, generation }
    }
}

/// One widget annotation as found while walking the pages.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetRecord {
    /// Fully-qualified field name (partial names joined with `.`).
    pub name: String,
    /// Classified element type.
    pub element_type: ElementType,
    /// The widget annotation object.
    pub widget: ObjectHandle,
    /// The field dictionary holding `/T` and `/V` (may equal `widget`).
    pub field: ObjectHandle,
    /// 0-based index of the page whose `/Annots` lists the widget.
    pub page_index: usize,
    /// Normalized `/Rect`.
    pub bbox: BBox,
    /// Inherited `/Ff` flags.
    pub flags: FieldFlags,
    /// Appearance state name that means "on" (buttons only).
    pub on_state: Option<String>,
    /// Export values from `/Opt` (choice fields only).
    pub options: Vec<String>,
    /// `/MaxLen` (text fields only).
    pub max_length: Option<usize>,
}

/// A widget belonging to an [`Element`].
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetRef {
    pub widget: ObjectHandle,
    pub field: ObjectHandle,
    pub page_index: usize,
    pub bbox: BBox,
    pub on_state: Option<String>,
}

impl From<&WidgetRecord> for WidgetRef {
    fn from(record: &WidgetRecord) -> Self {
        Self {
            widget: record.widget,
            field: record.field,
            page_index: record.page_index,
            bbox: record.bbox,
            on_state: record.on_state.clone(),
        }
    }
}

/// Element type together with its type-specific settings.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Text(RenderConfig),
    Checkbox,
    Radio,
    Dropdown(RenderConfig),
    Signature,
}

impl ElementKind {
    fn new(element_type: ElementType, defaults: &RenderConfig) -> Self {
        match element_type {
            ElementType::Text => Self::Text(defaults.clone()),
            ElementType::Checkbox => Self::Checkbox,
            ElementType::Radio => Self::Radio,
            ElementType::Dropdown => Self::Dropdown(defaults.clone()),
            ElementType::Signature => Self::Signature,
        }
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            Self::Text(_) => ElementType::Text,
            Self::Checkbox => ElementType::Checkbox,
            Self::Radio => ElementType::Radio,
            Self::Dropdown(_) => ElementType::Dropdown,
            Self::Signature => ElementType::Signature,
        }
    }
}

/// One logical form field.
///
/// Created once when the document is opened. Afterwards only the value and
/// the render configuration change.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    name: String,
    kind: ElementKind,
    value: Option<FieldValue>,
    /// Never empty; the first widget defines the element's geometry.
    widgets: Vec<WidgetRef>,
    options: Vec<String>,
    max_length: Option<usize>,
}

impl Element {
    /// Create an element from its first widget, copying `defaults` into
    /// the element's own render configuration.
    pub fn new(record: &WidgetRecord, defaults: &RenderConfig) -> Self {
        Self {
            name: record.name.clone(),
            kind: ElementKind::new(record.element_type, defaults),
            value: None,
            widgets: vec![WidgetRef::from(record)],
            options: record.options.clone(),
            max_length: record.max_length,
        }
    }

    /// Attach a further widget carrying the same name.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::TypeMismatch`] if the widget classifies as a
    /// different element type; the widget is not attached.
    pub fn attach_widget(&mut self, record: &WidgetRecord) -> Result<(), PdfError> {
        if record.element_type != self.element_type() {
            return Err(PdfError::TypeMismatch {
                name: self.name.clone(),
                expected: self.element_type().to_string(),
                found: record.element_type.to_string(),
            });
        }
        self.widgets.push(WidgetRef::from(record));
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn element_type(&self) -> ElementType {
        self.kind.element_type()
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    /// The last value assigned by a fill, if any.
    pub fn value(&self) -> Option<&FieldValue> {
        self.value.as_ref()
    }

    /// Page of the first widget.
    pub fn page_index(&self) -> usize {
        self.widgets[0].page_index
    }

    /// Rectangle of the first widget.
    pub fn bbox(&self) -> BBox {
        self.widgets[0].bbox
    }

    /// All widgets in discovery order.
    pub fn widgets(&self) -> &[WidgetRef] {
        &self.widgets
    }

    /// Choice options (dropdowns only).
    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    /// Render configuration of a text-like element.
    pub fn render_config(&self) -> Option<&RenderConfig> {
        match &self.kind {
            ElementKind::Text(config) | ElementKind::Dropdown(config) => Some(config),
            _ => None,
        }
    }

    /// Mutable render configuration of a text-like element.
    pub fn render_config_mut(&mut self) -> Option<&mut RenderConfig> {
        match &mut self.kind {
            ElementKind::Text(config) | ElementKind::Dropdown(config) => Some(config),
            _ => None,
        }
    }

    fn text_config_mut(&mut self, setting: &str) -> Result<&mut RenderConfig, PdfError> {
        let element_type = self.element_type();
        self.render_config_mut().ok_or_else(|| {
            PdfError::invalid_config(
                setting,
                format!("{element_type} elements have no text rendering settings"),
            )
        })
    }

    pub fn set_font_size(&mut self, size: f64) -> Result<(), PdfError> {
        self.text_config_mut("font_size")?.set_font_size(size)
    }

    pub fn set_font_color(&mut self, color: impl Into<Color>) -> Result<(), PdfError> {
        self.text_config_mut("font_color")?.set_font_color(color)
    }

    pub fn set_text_x_offset(&mut self, offset: f64) -> Result<(), PdfError> {
        self.text_config_mut("text_x_offset")?.set_text_x_offset(offset)
    }

    pub fn set_text_y_offset(&mut self, offset: f64) -> Result<(), PdfError> {
        self.text_config_mut("text_y_offset")?.set_text_y_offset(offset)
    }

    pub fn set_text_wrap_length(&mut self, length: usize) -> Result<(), PdfError> {
        self.text_config_mut("text_wrap_length")?
            .set_text_wrap_length(length);
        Ok(())
    }

    /// Check `value` against this element without storing it.
    ///
    /// # Errors
    ///
    /// - [`PdfError::TypeMismatch`] if the variant is not accepted.
    /// - [`PdfError::InvalidValue`] for an out-of-range index or text longer
    ///   than `/MaxLen`.
    /// - [`PdfError::UnsupportedField`] for signature fields.
    pub fn check_value(&self, value: &FieldValue) -> Result<ResolvedValue, PdfError> {
        match (&self.kind, value) {
            (ElementKind::Text(_), FieldValue::Text(text)) => {
                if let Some(max) = self.max_length {
                    let len = text.chars().count();
                    if len > max {
                        return Err(self.invalid_value(format!(
                            "{len} characters exceed the maximum length of {max}"
                        )));
                    }
                }
                Ok(ResolvedValue::Text(text.clone()))
            }
            (ElementKind::Dropdown(_), FieldValue::Text(text)) => {
                Ok(ResolvedValue::Text(text.clone()))
            }
            (ElementKind::Dropdown(_), FieldValue::Index(i)) => match self.options.get(*i) {
                Some(option) => Ok(ResolvedValue::Text(option.clone())),
                None => Err(self.invalid_value(format!(
                    "option index {i} out of range ({} options)",
                    self.options.len()
                ))),
            },
            (ElementKind::Checkbox, FieldValue::Bool(on)) => Ok(ResolvedValue::Check(*on)),
            (ElementKind::Radio, FieldValue::Bool(on)) => {
                Ok(ResolvedValue::Select(on.then_some(0)))
            }
            (ElementKind::Radio, FieldValue::Index(i)) => {
                if *i < self.widgets.len() {
                    Ok(ResolvedValue::Select(Some(*i)))
                } else {
                    Err(self.invalid_value(format!(
                        "button index {i} out of range ({} buttons)",
                        self.widgets.len()
                    )))
                }
            }
            (ElementKind::Signature, _) => Err(PdfError::UnsupportedField {
                name: self.name.clone(),
                field_type: "Sig".to_string(),
            }),
            (kind, value) => Err(PdfError::TypeMismatch {
                name: self.name.clone(),
                expected: kind.element_type().accepts().to_string(),
                found: value.kind_name().to_string(),
            }),
        }
    }

    /// Check and store `value`. On error the previous value is kept.
    pub fn assign(&mut self, value: FieldValue) -> Result<ResolvedValue, PdfError> {
        let resolved = self.check_value(&value)?;
        self.value = Some(value);
        Ok(resolved)
    }

    /// The stored value in its checked form.
    pub fn resolved_value(&self) -> Option<ResolvedValue> {
        self.value
            .as_ref()
            .and_then(|value| self.check_value(value).ok())
    }

    fn invalid_value(&self, reason: String) -> PdfError {
        PdfError::InvalidValue {
            name: self.name.clone(),
            reason,
        }
    }
}
