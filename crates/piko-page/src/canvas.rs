//! The page canvas: what the compositor paints into.
//!
//! A canvas is a fixed grid of characters with two parallel color grids and
//! an ordered list of style markers. Everything is clipped: writes outside
//! the grid are dropped silently, so the compositor can paint elements that
//! are scrolled partly off screen without bounds checks of its own.
//!
//! Style markers work like a pen: a marker at offset `o` sets the style for
//! every cell from `o` up to the next marker. The compositor registers a
//! `(start, style)` marker and a `(end, Normal)` marker around each styled
//! run.

use piko_term::buffer::FrameBuffer;
use piko_term::cell::{Attr, Cell};
use piko_term::color::{CellColor, Color};

use crate::geom::Vec2;

// ---------------------------------------------------------------------------
// Styles
// ---------------------------------------------------------------------------

/// Text style of a run of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextStyle {
    #[default]
    Normal,
    Bold,
    Underline,
}

impl TextStyle {
    /// The `style` attribute values that do something. Anything else is
    /// ignored.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "bold" => Some(Self::Bold),
            "underline" => Some(Self::Underline),
            _ => None,
        }
    }

    #[must_use]
    pub const fn attrs(self) -> Attr {
        match self {
            Self::Normal => Attr::empty(),
            Self::Bold => Attr::BOLD,
            Self::Underline => Attr::UNDERLINE,
        }
    }
}

/// A style marker at a row-major cell offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleSpan {
    pub offset: usize,
    pub style: TextStyle,
}

// ---------------------------------------------------------------------------
// Canvas
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Canvas {
    width: i32,
    height: i32,
    chars: Vec<char>,
    background: Vec<Option<Color>>,
    foreground: Vec<Option<Color>>,
    spans: Vec<StyleSpan>,
}

impl Canvas {
    /// A blank canvas. Every cell starts as a space in the given colors;
    /// `None` leaves the terminal's own color.
    #[must_use]
    pub fn new(width: i32, height: i32, background: Option<Color>, foreground: Option<Color>) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        #[allow(clippy::cast_sign_loss)]
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            chars: vec![' '; len],
            background: vec![background; len],
            foreground: vec![foreground; len],
            spans: vec![StyleSpan {
                offset: 0,
                style: TextStyle::Normal,
            }],
        }
    }

    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    #[must_use]
    pub const fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Row-major index of `(x, y)`, `None` off the grid.
    #[allow(clippy::cast_sign_loss)]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        (x >= 0 && y >= 0 && x < self.width && y < self.height)
            .then(|| y as usize * self.width as usize + x as usize)
    }

    #[must_use]
    pub fn get(&self, x: i32, y: i32) -> Option<char> {
        self.index(x, y).map(|i| self.chars[i])
    }

    pub fn put(&mut self, x: i32, y: i32, ch: char) {
        if let Some(i) = self.index(x, y) {
            self.chars[i] = if ch.is_control() { ' ' } else { ch };
        }
    }

    /// Write `text` left to right from `(x, y)`, one char per cell.
    pub fn put_str(&mut self, x: i32, y: i32, text: &str) {
        for (col, ch) in (x..self.width).zip(text.chars()) {
            self.put(col, y, ch);
        }
    }

    /// Write `ch` `count` times from `(x, y)`. Only cells on the grid are
    /// visited.
    pub fn repeat(&mut self, x: i32, y: i32, ch: char, count: i32) {
        let end = x.saturating_add(count.max(0)).min(self.width);
        for col in x.max(0)..end {
            self.put(col, y, ch);
        }
    }

    /// Row `y` as a string. Empty for rows off the grid.
    #[must_use]
    pub fn row_text(&self, y: i32) -> String {
        (0..self.width).filter_map(|x| self.get(x, y)).collect()
    }

    /// Every row, joined with `\n`.
    #[must_use]
    pub fn text(&self) -> String {
        (0..self.height)
            .map(|y| self.row_text(y))
            .collect::<Vec<_>>()
            .join("\n")
    }

    // ── Colors ───────────────────────────────────────────────────────────

    #[allow(clippy::cast_sign_loss)]
    fn fill(grid: &mut [Option<Color>], width: i32, height: i32, pos: Vec2, size: Vec2, color: Color) {
        let x0 = pos.x.max(0);
        let x1 = pos.x.saturating_add(size.x).min(width);
        let y0 = pos.y.max(0);
        let y1 = pos.y.saturating_add(size.y).min(height);
        for y in y0..y1 {
            let row = y as usize * width as usize;
            for x in x0..x1 {
                grid[row + x as usize] = Some(color);
            }
        }
    }

    pub fn fill_background(&mut self, pos: Vec2, size: Vec2, color: Color) {
        Self::fill(&mut self.background, self.width, self.height, pos, size, color);
    }

    pub fn fill_foreground(&mut self, pos: Vec2, size: Vec2, color: Color) {
        Self::fill(&mut self.foreground, self.width, self.height, pos, size, color);
    }

    #[must_use]
    pub fn background(&self, x: i32, y: i32) -> Option<Color> {
        self.index(x, y).and_then(|i| self.background[i])
    }

    #[must_use]
    pub fn foreground(&self, x: i32, y: i32) -> Option<Color> {
        self.index(x, y).and_then(|i| self.foreground[i])
    }

    // ── Styles ───────────────────────────────────────────────────────────

    /// Style the `len` cells from `(x, y)`. Rows off the grid register
    /// nothing.
    #[allow(clippy::cast_sign_loss)]
    pub fn mark(&mut self, x: i32, y: i32, len: i32, style: TextStyle) {
        if y < 0 || y >= self.height {
            return;
        }
        let row = y as usize * self.width as usize;
        let start = x.clamp(0, self.width) as usize;
        let end = x.saturating_add(len.max(0)).clamp(0, self.width) as usize;
        self.spans.push(StyleSpan {
            offset: row + start,
            style,
        });
        self.spans.push(StyleSpan {
            offset: row + end,
            style: TextStyle::Normal,
        });
    }

    #[must_use]
    pub fn spans(&self) -> &[StyleSpan] {
        &self.spans
    }

    /// The style of every cell, row-major. Each marker holds until the next
    /// marker's offset; a marker followed by a lower offset covers nothing.
    #[must_use]
    pub fn styles(&self) -> Vec<TextStyle> {
        let len = self.chars.len();
        let mut out = vec![TextStyle::Normal; len];
        for (i, span) in self.spans.iter().enumerate() {
            let end = self.spans.get(i + 1).map_or(len, |next| next.offset.min(len));
            let start = span.offset.min(len);
            if start < end {
                out[start..end].fill(span.style);
            }
        }
        out
    }

    // ── Output ───────────────────────────────────────────────────────────

    /// Copy the canvas into `buf` with its top-left corner at row `top`.
    /// Rows that do not fit are dropped.
    pub fn blit(&self, buf: &mut FrameBuffer, top: u16) {
        let styles = self.styles();
        let color = |c: Option<Color>| c.map_or(CellColor::Default, Color::to_cell_color);
        for y in 0..self.height {
            let Ok(row) = u16::try_from(y) else { break };
            let Some(dest_y) = top.checked_add(row) else { break };
            for x in 0..self.width {
                let (Ok(dest_x), Some(i)) = (u16::try_from(x), self.index(x, y)) else {
                    continue;
                };
                let cell = Cell::styled(
                    self.chars[i],
                    color(self.foreground[i]),
                    color(self.background[i]),
                    styles[i].attrs(),
                );
                buf.set(dest_x, dest_y, cell);
            }
        }
    }
}
