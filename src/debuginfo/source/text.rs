//! Source texts and their line-start tables.
//!
//! Offsets handed in by the code generator are byte offsets into the UTF-8 text. Lines
//! and columns are 1-based; columns count UTF-16 code units, which is what debuggers
//! expect.

use crate::utils::utf16_len;

/// A physical source text as seen by the parser.
#[derive(Debug, Clone)]
pub struct SourceText {
    path: String,
    text: String,
    line_starts: Vec<usize>,
}

impl SourceText {
    /// Build a source text and its line-start table.
    ///
    /// Recognized line terminators are `\n`, `\r\n`, `\r`, U+0085, U+2028 and U+2029.
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let line_starts = compute_line_starts(&text);
        SourceText {
            path: path.into(),
            text,
            line_starts,
        }
    }

    /// Path as written by the compiler's caller (not normalized).
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Full text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of lines; an empty text has one line.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte offset at which the 1-based `line` starts.
    #[must_use]
    pub fn line_start(&self, line: u32) -> Option<usize> {
        let index = usize::try_from(line).ok()?.checked_sub(1)?;
        self.line_starts.get(index).copied()
    }

    /// 1-based line and UTF-16 column of a byte offset.
    ///
    /// Offsets past the end clamp to the end of the text; offsets inside a multi-byte
    /// character snap back to its first byte.
    #[must_use]
    pub fn line_col(&self, offset: usize) -> (u32, u32) {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }

        let index = match self.line_starts.binary_search(&offset) {
            Ok(index) => index,
            Err(insert) => insert.saturating_sub(1),
        };
        let start = self.line_starts[index];
        let column = utf16_len(&self.text[start..offset]) + 1;

        (
            u32::try_from(index + 1).unwrap_or(u32::MAX),
            u32::try_from(column).unwrap_or(u32::MAX),
        )
    }
}

fn compute_line_starts(text: &str) -> Vec<usize> {
    let mut starts = vec![0];
    let mut chars = text.char_indices().peekable();

    while let Some((index, ch)) = chars.next() {
        match ch {
            '\r' => {
                if let Some(&(_, '\n')) = chars.peek() {
                    chars.next();
                    starts.push(index + 2);
                } else {
                    starts.push(index + 1);
                }
            }
            '\n' => starts.push(index + 1),
            '\u{0085}' | '\u{2028}' | '\u{2029}' => starts.push(index + ch.len_utf8()),
            _ => {}
        }
    }

    starts
}
