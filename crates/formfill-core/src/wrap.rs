//! Fixed-width text wrapping for overlay text.
//!
//! Wrapping is purely columnar: a value is cut into chunks of at most
//! `text_wrap_length` characters with no regard for word boundaries. Each
//! chunk becomes one line, placed one line height below the previous one.
//! An explicit `\n` always starts a new line.

use crate::RenderConfig;

/// One positioned line of wrapped text.
///
/// `x` and `y` are relative to the widget origin (its lower-left corner).
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine<'a> {
    pub text: &'a str,
    pub x: f64,
    pub y: f64,
}

/// Lazy iterator over the wrapped lines of a value.
///
/// Cloning the iterator restarts from the clone's position, so the same
/// layout can be walked more than once.
#[derive(Debug, Clone)]
pub struct TextLines<'a> {
    paragraphs: std::str::Split<'a, char>,
    /// Unconsumed rest of the current paragraph, `None` between paragraphs.
    current: Option<&'a str>,
    wrap_length: usize,
    x: f64,
    y: f64,
    line_height: f64,
    index: usize,
}

/// Wrap `value` using the element's render configuration.
///
/// An empty value yields no lines.
pub fn wrap_text<'a>(value: &'a str, config: &RenderConfig) -> TextLines<'a> {
    let mut paragraphs = value.split('\n');
    if value.is_empty() {
        // Split yields one empty item for an empty string; drop it.
        paragraphs.next();
    }
    TextLines {
        paragraphs,
        current: None,
        wrap_length: config.text_wrap_length(),
        x: config.text_x_offset(),
        y: config.text_y_offset(),
        line_height: config.line_height(),
        index: 0,
    }
}

/// Split `text` after at most `max_chars` characters.
fn split_chars(text: &str, max_chars: usize) -> (&str, &str) {
    if max_chars == 0 {
        return (text, "");
    }
    match text.char_indices().nth(max_chars) {
        Some((at, _)) => text.split_at(at),
        None => (text, ""),
    }
}

impl<'a> TextLines<'a> {
    fn emit(&mut self, text: &'a str) -> TextLine<'a> {
        let line = TextLine {
            text,
            x: self.x,
            y: self.y - self.index as f64 * self.line_height,
        };
        self.index += 1;
        line
    }
}

impl<'a> Iterator for TextLines<'a> {
    type Item = TextLine<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.current.take() {
            Some(rest) => {
                let (chunk, rest) = split_chars(rest, self.wrap_length);
                if !rest.is_empty() {
                    self.current = Some(rest);
                }
                Some(self.emit(chunk))
            }
            None => {
                let paragraph = self.paragraphs.next()?;
                let paragraph = paragraph.strip_suffix('\r').unwrap_or(paragraph);
                let (chunk, rest) = split_chars(paragraph, self.wrap_length);
                if !rest.is_empty() {
                    self.current = Some(rest);
                }
                Some(self.emit(chunk))
            }
        }
    }
}
