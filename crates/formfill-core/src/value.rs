//! Fill values supplied by callers.

use indexmap::IndexMap;

/// A value to fill into one element.
///
/// Which variants an element accepts depends on its type; see
/// [`Element::check_value`](crate::Element::check_value).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum FieldValue {
    /// Text for text fields and dropdowns.
    Text(String),
    /// On/off state for checkboxes and radio groups.
    Bool(bool),
    /// Position of a radio widget or a dropdown option.
    Index(usize),
}

impl FieldValue {
    /// Short name of the variant, used in type-mismatch messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::Bool(_) => "bool",
            FieldValue::Index(_) => "index",
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<usize> for FieldValue {
    fn from(value: usize) -> Self {
        FieldValue::Index(value)
    }
}

/// A fill payload: field name to value, applied in insertion order.
pub type FillData = IndexMap<String, FieldValue>;

/// Build a [`FillData`] from `(name, value)` pairs.
///
/// ```ignore
/// let data = fill_data([("test", "test_1".into()), ("check", true.into())]);
/// ```
pub fn fill_data<K, I>(pairs: I) -> FillData
where
    K: Into<String>,
    I: IntoIterator<Item = (K, FieldValue)>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// A value checked against its element and ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedValue {
    /// Text to store in `/V` or draw on the page.
    Text(String),
    /// Checkbox state.
    Check(bool),
    /// Selected widget of a radio group, `None` for all off.
    Select(Option<usize>),
}
