// SPDX-License-Identifier: MIT
//
// Browser chrome — everything on screen that isn't the page.
//
//   ┌──────────────────────────────────────┬─┐
//   │ URL bar                              │✔│  ← row 0, status glyph last
//   ├──────────────────────────────────────┴─┤
//   │ page viewport                          │  ← rows 1..h
//   │                                        │
//   ├────────────────────────────────────────┤
//   │ debug log (Alt+K)                      │  ← last `debug_height` rows
//   └────────────────────────────────────────┘
//
// The URL bar shows the right-most part of the URL when idle, so the end
// of a long address stays visible. While editing, the caret replaces the
// character under it and the view follows the caret.

use std::collections::VecDeque;

use piko_page::compose::CARET;
use piko_term::buffer::FrameBuffer;
use piko_term::cell::Attr;
use piko_term::color::Color;

pub const LOADED_MARK: char = '✔';
pub const LOADING_MARK: char = '◌';

/// First line of every debug log.
pub const DEBUG_BANNER: &str = "Debugger: Press Alt+K to close.";

// ─── Text fitting ────────────────────────────────────────────────────────────

/// The last `cap` chars of `text`.
#[must_use]
pub fn right_most(text: &[char], cap: usize) -> String {
    text[text.len().saturating_sub(cap)..].iter().collect()
}

/// A `cap`-wide window of `text` that keeps `cursor` in view, with a
/// margin of context to its left when there is room.
#[must_use]
pub fn cursor_centered(text: &[char], cursor: usize, cap: usize) -> String {
    if text.len() <= cap {
        return text.iter().collect();
    }
    let cursor = cursor.min(text.len() - 1);
    let margin = (cap / 4).min(10);

    let mut start = cursor.saturating_sub(margin);
    if start + cap > text.len() {
        start = text.len().saturating_sub(cap);
    }
    if cursor < start {
        start = cursor;
    } else if cursor >= start + cap {
        start = cursor + 1 - cap;
    }
    text[start..start + cap].iter().collect()
}

/// Pad with spaces or cut to exactly `cap` chars.
fn fit(text: &str, cap: usize) -> String {
    let mut out: String = text.chars().take(cap).collect();
    let len = out.chars().count();
    out.extend(std::iter::repeat_n(' ', cap - len));
    out
}

// ─── URL bar ─────────────────────────────────────────────────────────────────

/// The `cap` chars of URL bar text. `caret` is set while editing.
#[must_use]
pub fn url_bar_text(url: &str, caret: Option<usize>, cap: usize) -> String {
    let mut chars: Vec<char> = url.chars().collect();
    let shown = match caret {
        Some(c) => {
            let c = c.min(chars.len());
            if c < chars.len() {
                chars[c] = CARET;
            } else {
                chars.push(CARET);
            }
            cursor_centered(&chars, c, cap)
        }
        None => right_most(&chars, cap),
    };
    fit(&shown, cap)
}

/// Paint row 0: the URL bar across `width − 1` cells, then the status
/// glyph.
pub fn paint_url_bar(buf: &mut FrameBuffer, url: &str, caret: Option<usize>, focused: bool, loading: bool) {
    let width = usize::from(buf.width());
    if width == 0 {
        return;
    }
    let text = url_bar_text(url, caret.filter(|_| focused), width - 1);
    let (fg, bg, attrs) = if focused {
        (Color::White, Color::Black, Attr::BOLD)
    } else {
        (Color::Black, Color::White, Attr::UNDERLINE)
    };
    let used = buf.put_str(0, 0, &text, fg.to_cell_color(), bg.to_cell_color(), attrs);

    let mark = if loading { LOADING_MARK } else { LOADED_MARK };
    buf.put_str(
        used,
        0,
        &mark.to_string(),
        Color::White.to_cell_color(),
        Color::Black.to_cell_color(),
        Attr::UNDERLINE,
    );
}

// ─── Debug log ───────────────────────────────────────────────────────────────

/// Lines the debug log keeps. Older lines are dropped.
pub const DEBUG_LOG_LINES: usize = 500;

/// In-memory log shown by the Alt+K overlay. Separate from tracing: this
/// is for page authors, tracing is for whoever runs the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugLog {
    lines: VecDeque<String>,
    /// Lines ever pushed. Keeps changing after the log is full.
    pushed: u64,
}

impl DebugLog {
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: VecDeque::from([DEBUG_BANNER.to_owned()]),
            pushed: 0,
        }
    }

    /// Append `text`, one entry per line of it.
    pub fn push(&mut self, text: &str) {
        for line in text.split('\n') {
            if self.lines.len() == DEBUG_LOG_LINES {
                self.lines.pop_front();
            }
            self.lines.push_back(line.to_owned());
            self.pushed += 1;
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// Changes whenever a line is pushed.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.pushed
    }

    /// The last `height` lines, each cut or padded to `width`, with blank
    /// lines below when the log is short.
    #[must_use]
    pub fn tail(&self, width: usize, height: usize) -> Vec<String> {
        let start = self.lines.len().saturating_sub(height);
        let mut out: Vec<String> = self.lines.iter().skip(start).map(|l| fit(l, width)).collect();
        out.resize(height, " ".repeat(width));
        out
    }
}

impl Default for DebugLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Paint the overlay over the bottom `height` rows, black on white.
pub fn paint_debug(buf: &mut FrameBuffer, log: &DebugLog, height: u16) {
    let height = height.min(buf.height());
    let top = buf.height() - height;
    for (row, line) in (top..).zip(log.tail(usize::from(buf.width()), usize::from(height))) {
        buf.put_str(
            0,
            i32::from(row),
            &line,
            Color::Black.to_cell_color(),
            Color::White.to_cell_color(),
            Attr::empty(),
        );
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
