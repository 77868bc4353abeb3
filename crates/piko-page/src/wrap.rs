//! Word wrapping for text and links.
//!
//! Two modes:
//!
//! - **reflow** (default): each paragraph (split on `\n`) is filled greedily
//!   to the target width. Whitespace runs inside a line are kept as written;
//!   whitespace at a break point is dropped. A word longer than the width
//!   starts a fresh line and is hard-broken into width-sized pieces.
//! - **preserve**: no reflow at all. Lines are the existing `\n` breaks,
//!   each truncated at the width.
//!
//! Tabs expand to 4-column stops in both modes. Widths count chars: one
//! char is one cell on the page grid.

use crate::geom::Vec2;

const TAB_SIZE: usize = 4;

/// Result of wrapping: the lines and their bounding size
/// `(longest line, line count)`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Wrapped {
    pub lines: Vec<String>,
    pub size: Vec2,
}

impl Wrapped {
    fn from_lines(lines: Vec<String>) -> Self {
        let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let size = Vec2::new(to_i32(longest), to_i32(lines.len()));
        Self { lines, size }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
const fn to_i32(n: usize) -> i32 {
    if n > i32::MAX as usize {
        i32::MAX
    } else {
        n as i32
    }
}

/// Wrap `text` to `width` cells. Widths below one are treated as one.
#[must_use]
pub fn wrap(text: &str, width: i32, preserve: bool) -> Wrapped {
    #[allow(clippy::cast_sign_loss)]
    let width = width.max(1) as usize;
    if text.is_empty() {
        return Wrapped::default();
    }
    let mut lines = Vec::new();
    if preserve {
        for line in text.lines() {
            lines.push(expand_tabs(line).chars().take(width).collect());
        }
    } else {
        for paragraph in text.split('\n') {
            fill_paragraph(&expand_tabs(paragraph), width, &mut lines);
        }
    }
    Wrapped::from_lines(lines)
}

/// Replace each tab with spaces up to the next multiple of four columns.
#[must_use]
pub fn expand_tabs(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut col = 0;
    for ch in line.chars() {
        if ch == '\t' {
            let pad = TAB_SIZE - col % TAB_SIZE;
            out.extend(std::iter::repeat_n(' ', pad));
            col += pad;
        } else {
            out.push(ch);
            col += 1;
        }
    }
    out
}

/// Split into alternating whitespace / non-whitespace runs.
fn chunks(s: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut prev: Option<bool> = None;
    for (i, ch) in s.char_indices() {
        let space = ch.is_whitespace();
        if prev.is_some_and(|p| p != space) {
            out.push(&s[start..i]);
            start = i;
        }
        prev = Some(space);
    }
    if start < s.len() {
        out.push(&s[start..]);
    }
    out
}

/// Greedy fill of one paragraph. Always emits at least one line.
fn fill_paragraph(paragraph: &str, width: usize, out: &mut Vec<String>) {
    let first = out.len();
    let mut line = String::new();
    let mut len = 0;

    let flush = |line: &mut String, len: &mut usize, out: &mut Vec<String>| {
        let trimmed = line.trim_end();
        if !trimmed.is_empty() {
            out.push(trimmed.to_owned());
        }
        line.clear();
        *len = 0;
    };

    for chunk in chunks(paragraph) {
        let chunk_len = chunk.chars().count();
        let is_space = chunk.starts_with(char::is_whitespace);

        if is_space {
            // Leading whitespace survives only on the paragraph's first line.
            if len == 0 && out.len() > first {
                continue;
            }
            if len + chunk_len <= width {
                line.push_str(chunk);
                len += chunk_len;
            } else {
                flush(&mut line, &mut len, out);
            }
            continue;
        }

        if len + chunk_len <= width {
            line.push_str(chunk);
            len += chunk_len;
            continue;
        }
        if len > 0 {
            flush(&mut line, &mut len, out);
        }
        if chunk_len <= width {
            line.push_str(chunk);
            len = chunk_len;
            continue;
        }

        let chars: Vec<char> = chunk.chars().collect();
        let mut pieces = chars.chunks(width).peekable();
        while let Some(piece) = pieces.next() {
            if pieces.peek().is_some() {
                out.push(piece.iter().collect());
            } else {
                line.extend(piece);
                len = piece.len();
            }
        }
    }
    flush(&mut line, &mut len, out);

    if out.len() == first {
        out.push(String::new());
    }
}
