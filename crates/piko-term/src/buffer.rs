// SPDX-License-Identifier: MIT
//
// FrameBuffer — a 2D grid of cells.
//
// The screen keeps two of these (back and front). The browser paints the
// URL bar, the page canvas, and the debug overlay into the back buffer; the
// screen copies dirty rectangles across at present time.
//
// Storage is a flat row-major `Vec<Cell>`, so a row is a contiguous slice
// and the left-to-right scan the writer does is linear. Paint operations
// clip silently: writing outside the grid is a no-op, never an error, which
// lets scrolled page content hang off either edge.

use unicode_width::UnicodeWidthChar;

use crate::cell::{Attr, Cell};
use crate::color::CellColor;

// ─── Rect ───────────────────────────────────────────────────────────────────

/// A rectangle in screen space.
///
/// The origin is signed so regions can start above or left of the screen
/// (scrolled content); [`clamp_to`](Self::clamp_to) trims them back.
///
/// # Examples
///
/// ```
/// use piko_term::buffer::Rect;
///
/// let r = Rect::new(-2, 1, 5, 3);
/// assert_eq!(r.clamp_to(10, 10), Some(Rect::new(0, 1, 3, 3)));
/// assert_eq!(Rect::new(20, 0, 4, 4).clamp_to(10, 10), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn right(self) -> i32 {
        self.x + self.width as i32
    }

    /// Bottom edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn bottom(self) -> i32 {
        self.y + self.height as i32
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether a screen cell lies inside the rectangle.
    #[inline]
    #[must_use]
    pub fn contains(self, px: u16, py: u16) -> bool {
        let px = i32::from(px);
        let py = i32::from(py);
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// Overlap of two rectangles, `None` when they don't touch.
    #[must_use]
    pub fn intersect(self, other: Self) -> Option<Self> {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());

        if x2 > x1 && y2 > y1 {
            // Both spans are positive and bounded by the inputs' u16 sizes.
            #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
            Some(Self {
                x: x1,
                y: y1,
                width: (x2 - x1) as u16,
                height: (y2 - y1) as u16,
            })
        } else {
            None
        }
    }

    /// Trim to a `width × height` screen anchored at the origin.
    #[must_use]
    pub fn clamp_to(self, width: u16, height: u16) -> Option<Self> {
        self.intersect(Self::new(0, 0, width, height))
    }
}

// ─── FrameBuffer ────────────────────────────────────────────────────────────

/// A row-major grid of [`Cell`]s.
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    /// A blank buffer of the given size.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::EMPTY; usize::from(width) * usize::from(height)],
        }
    }

    #[inline]
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// The whole buffer as a rectangle.
    #[inline]
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| usize::from(y) * usize::from(self.width) + usize::from(x))
    }

    #[inline]
    #[must_use]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    #[inline]
    pub fn get_mut(&mut self, x: u16, y: u16) -> Option<&mut Cell> {
        self.index(x, y).map(|i| &mut self.cells[i])
    }

    /// One row as a slice, `None` past the bottom edge.
    #[must_use]
    pub fn row(&self, y: u16) -> Option<&[Cell]> {
        if y >= self.height {
            return None;
        }
        let start = usize::from(y) * usize::from(self.width);
        Some(&self.cells[start..start + usize::from(self.width)])
    }

    /// Row `y` as plain text (continuation cells dropped). Handy in tests and
    /// for the debug log.
    #[must_use]
    pub fn row_text(&self, y: u16) -> String {
        self.row(y)
            .map(|r| r.iter().filter(|c| !c.is_continuation()).map(|c| c.ch).collect())
            .unwrap_or_default()
    }

    /// Set one cell. Returns `false` when `(x, y)` is off the grid.
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) -> bool {
        match self.get_mut(x, y) {
            Some(slot) => {
                *slot = cell;
                true
            }
            None => false,
        }
    }

    /// Reset every cell to [`Cell::EMPTY`].
    pub fn clear(&mut self) {
        self.cells.fill(Cell::EMPTY);
    }

    /// Change dimensions. Content is discarded; the caller repaints.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.cells.clear();
        self.cells
            .resize(usize::from(width) * usize::from(height), Cell::EMPTY);
    }

    /// Fill the visible part of `rect` with `cell`.
    pub fn fill_rect(&mut self, rect: Rect, cell: Cell) {
        let Some(r) = rect.clamp_to(self.width, self.height) else {
            return;
        };
        // Clamped rectangles start inside the grid.
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let (x0, y0) = (r.x as u16, r.y as u16);
        for y in y0..y0 + r.height {
            let start = usize::from(y) * usize::from(self.width) + usize::from(x0);
            self.cells[start..start + usize::from(r.width)].fill(cell);
        }
    }

    /// Write `text` starting at `(x, y)` with one style, clipping at the
    /// edges. Wide characters take two columns; a wide character that would
    /// straddle the right edge is dropped. Zero-width characters are skipped.
    ///
    /// Returns the number of columns the text advanced, clipped or not.
    pub fn put_str(
        &mut self,
        x: i32,
        y: i32,
        text: &str,
        fg: CellColor,
        bg: CellColor,
        attrs: Attr,
    ) -> i32 {
        let mut col = x;
        let row = u16::try_from(y).ok().filter(|&r| r < self.height);

        for ch in text.chars() {
            let w = char_width(ch);
            if w == 0 {
                continue;
            }
            if let Some(row) = row {
                let fits = col >= 0 && col + w <= i32::from(self.width);
                if fits {
                    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
                    let cx = col as u16;
                    self.set(cx, row, Cell::styled(ch, fg, bg, attrs));
                    if w == 2 {
                        self.set(cx + 1, row, Cell::continuation(fg, bg, attrs));
                    }
                }
            }
            col += w;
        }

        col - x
    }

    /// Copy the cells under `rect` from `src`. Both buffers must share
    /// dimensions; mismatched sizes copy nothing.
    pub fn copy_rect_from(&mut self, src: &Self, rect: Rect) {
        if src.width != self.width || src.height != self.height {
            return;
        }
        let Some(r) = rect.clamp_to(self.width, self.height) else {
            return;
        };
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let (x0, y0) = (r.x as u16, r.y as u16);
        for y in y0..y0 + r.height {
            let start = usize::from(y) * usize::from(self.width) + usize::from(x0);
            let end = start + usize::from(r.width);
            self.cells[start..end].copy_from_slice(&src.cells[start..end]);
        }
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "FrameBuffer {}x{}", self.width, self.height)?;
        for y in 0..self.height {
            writeln!(f, "{}", self.row_text(y))?;
        }
        Ok(())
    }
}

/// Display width of a character in columns (0, 1 or 2). Control characters
/// count as zero.
#[inline]
#[must_use]
pub fn char_width(ch: char) -> i32 {
    match UnicodeWidthChar::width(ch) {
        Some(w) => i32::from(u8::try_from(w).unwrap_or(1)),
        None => 0,
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
