//! Auto-sizing multi-line text input
//!
//! The input grows and shrinks with its content: on every render the height
//! starts from a single row and extends to the number of wrapped rows the
//! value needs, so there is never a scrollbar. Rows are hard-wrapped at the
//! inner width and the caret is placed with the same walk over the text.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Text},
    widgets::{Block, Paragraph, Widget},
};

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Character-indexed cursor into an editable string
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Caret(usize);

impl Caret {
    pub fn position(&self) -> usize {
        self.0
    }

    pub fn insert(&mut self, text: &mut String, c: char) {
        self.clamp(text);
        let byte_pos = char_to_byte_index(text, self.0);
        text.insert(byte_pos, c);
        self.0 += 1;
    }

    pub fn backspace(&mut self, text: &mut String) {
        self.clamp(text);
        if self.0 > 0 {
            self.0 -= 1;
            let byte_pos = char_to_byte_index(text, self.0);
            text.remove(byte_pos);
        }
    }

    pub fn delete(&mut self, text: &mut String) {
        self.clamp(text);
        if self.0 < text.chars().count() {
            let byte_pos = char_to_byte_index(text, self.0);
            text.remove(byte_pos);
        }
    }

    pub fn left(&mut self) {
        self.0 = self.0.saturating_sub(1);
    }

    pub fn right(&mut self, text: &str) {
        self.0 = (self.0 + 1).min(text.chars().count());
    }

    pub fn home(&mut self) {
        self.0 = 0;
    }

    pub fn end(&mut self, text: &str) {
        self.0 = text.chars().count();
    }

    /// Keep the caret inside the text after it changed underneath us.
    pub fn clamp(&mut self, text: &str) {
        self.0 = self.0.min(text.chars().count());
    }
}

/// A full row only wraps when more text follows on the same logical line,
/// or at the very end where the caret needs a row of its own.
fn wraps_after(chars: &[char], index: usize) -> bool {
    chars.get(index + 1).map_or(true, |&next| next != '\n')
}

/// Split `value` into display rows of at most `width` characters.
pub fn wrap_rows(value: &str, width: u16) -> Vec<String> {
    let width = width.max(1) as usize;
    let chars: Vec<char> = value.chars().collect();
    let mut rows = vec![String::new()];
    let mut col = 0;

    for (i, &c) in chars.iter().enumerate() {
        if c == '\n' {
            rows.push(String::new());
            col = 0;
            continue;
        }
        if let Some(row) = rows.last_mut() {
            row.push(c);
        }
        col += 1;
        if col == width && wraps_after(&chars, i) {
            rows.push(String::new());
            col = 0;
        }
    }

    rows
}

/// Row and column of the caret after wrapping at `width`
pub fn caret_row_col(value: &str, caret: usize, width: u16) -> (u16, u16) {
    let width = width.max(1) as usize;
    let chars: Vec<char> = value.chars().collect();
    let (mut row, mut col) = (0usize, 0usize);

    for (i, &c) in chars.iter().enumerate().take(caret) {
        if c == '\n' {
            row += 1;
            col = 0;
            continue;
        }
        col += 1;
        if col == width && wraps_after(&chars, i) {
            row += 1;
            col = 0;
        }
    }

    // Caret right after a full row that ends at a newline stays on its last cell
    (row as u16, col.min(width - 1) as u16)
}

pub struct AutoResizeTextarea<'a> {
    value: &'a str,
    caret: usize,
    placeholder: &'a str,
    block: Option<Block<'a>>,
    style: Style,
}

impl<'a> AutoResizeTextarea<'a> {
    pub fn new(value: &'a str, caret: Caret) -> Self {
        Self {
            value,
            caret: caret.position(),
            placeholder: "",
            block: None,
            style: Style::default(),
        }
    }

    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = placeholder;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    fn border_size(&self) -> (u16, u16) {
        match &self.block {
            Some(block) => {
                let probe = Rect::new(0, 0, 10, 10);
                let inner = block.inner(probe);
                (probe.width - inner.width, probe.height - inner.height)
            }
            None => (0, 0),
        }
    }

    /// Rows the content needs at the given inner width, never less than one.
    pub fn content_height(&self, inner_width: u16) -> u16 {
        wrap_rows(self.value, inner_width).len().max(1) as u16
    }

    /// Total height including the block, for an outer width.
    pub fn required_height(&self, outer_width: u16) -> u16 {
        let (border_w, border_h) = self.border_size();
        self.content_height(outer_width.saturating_sub(border_w)) + border_h
    }

    /// Screen position of the caret when rendered into `area`.
    pub fn cursor_position(&self, area: Rect) -> (u16, u16) {
        let inner = self.inner(area);
        let (row, col) = caret_row_col(self.value, self.caret, inner.width);
        let row = row.saturating_sub(self.scroll_offset(inner));
        (inner.x + col, inner.y + row.min(inner.height.saturating_sub(1)))
    }

    fn inner(&self, area: Rect) -> Rect {
        match &self.block {
            Some(block) => block.inner(area),
            None => area,
        }
    }

    // When the layout gives us fewer rows than the content needs, keep the
    // caret row in view.
    fn scroll_offset(&self, inner: Rect) -> u16 {
        let (row, _) = caret_row_col(self.value, self.caret, inner.width);
        row.saturating_sub(inner.height.saturating_sub(1))
    }
}

impl Widget for AutoResizeTextarea<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = self.inner(area);
        let scroll = self.scroll_offset(inner);

        let text = if self.value.is_empty() {
            Text::from(Line::styled(
                self.placeholder.to_string(),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ))
        } else {
            Text::from(
                wrap_rows(self.value, inner.width)
                    .into_iter()
                    .map(Line::from)
                    .collect::<Vec<_>>(),
            )
        };

        let mut paragraph = Paragraph::new(text).style(self.style).scroll((scroll, 0));
        if let Some(block) = self.block {
            paragraph = paragraph.block(block);
        }
        paragraph.render(area, buf);
    }
}
