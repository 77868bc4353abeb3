// SPDX-License-Identifier: MIT
//
// Cell — one character position on the terminal grid.
//
// A cell is a character, a foreground and background color from the
// palette, and a small set of text attributes. Pages only ever ask for
// bold and underline; the URL bar and debug overlay use inverse and dim
// sparingly. Everything the screen emits is a run of these.
//
// Wide characters (CJK, some emoji) take two columns. The first cell holds
// the character and the second is a continuation cell (`ch == '\0'`) that
// the writer skips when the wide start was just printed.

use crate::color::CellColor;

// ─── Text Attributes ─────────────────────────────────────────────────────────

bitflags::bitflags! {
    /// Text attributes as a compact bitfield, one bit per SGR parameter.
    ///
    /// ```
    /// use piko_term::cell::Attr;
    ///
    /// let style = Attr::BOLD | Attr::UNDERLINE;
    /// assert!(style.contains(Attr::BOLD));
    /// assert!(!style.contains(Attr::INVERSE));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Attr: u8 {
        /// SGR 1 — increased intensity.
        const BOLD      = 1 << 0;
        /// SGR 2 — decreased intensity.
        const DIM       = 1 << 1;
        /// SGR 4 — single straight underline.
        const UNDERLINE = 1 << 2;
        /// SGR 7 — swap foreground and background.
        const INVERSE   = 1 << 3;
    }
}

// ─── Cell ────────────────────────────────────────────────────────────────────

/// A single terminal cell.
///
/// # Examples
///
/// ```
/// use piko_term::cell::{Attr, Cell};
/// use piko_term::color::CellColor;
///
/// let cell = Cell::new('x').with_attrs(Attr::BOLD);
/// assert_eq!(cell.ch, 'x');
/// assert_eq!(cell.bg, CellColor::Default);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    /// Character to display. `'\0'` marks a continuation cell.
    pub ch: char,
    /// Foreground (text) color.
    pub fg: CellColor,
    /// Background color.
    pub bg: CellColor,
    /// Text attributes.
    pub attrs: Attr,
}

const CONTINUATION: char = '\0';

impl Cell {
    /// A blank cell: space, default colors, no attributes.
    pub const EMPTY: Self = Self {
        ch: ' ',
        fg: CellColor::Default,
        bg: CellColor::Default,
        attrs: Attr::empty(),
    };

    /// A cell with a character and default styling.
    #[inline]
    #[must_use]
    pub const fn new(ch: char) -> Self {
        Self {
            ch,
            fg: CellColor::Default,
            bg: CellColor::Default,
            attrs: Attr::empty(),
        }
    }

    /// A fully styled cell.
    #[inline]
    #[must_use]
    pub const fn styled(ch: char, fg: CellColor, bg: CellColor, attrs: Attr) -> Self {
        Self { ch, fg, bg, attrs }
    }

    /// The second column of a wide character, carrying its colors.
    #[inline]
    #[must_use]
    pub const fn continuation(fg: CellColor, bg: CellColor, attrs: Attr) -> Self {
        Self {
            ch: CONTINUATION,
            fg,
            bg,
            attrs,
        }
    }

    /// Whether this cell continues a wide character to its left.
    #[inline]
    #[must_use]
    pub const fn is_continuation(self) -> bool {
        self.ch == CONTINUATION
    }

    /// Whether this cell looks exactly like [`Cell::EMPTY`].
    #[inline]
    #[must_use]
    pub fn is_empty(self) -> bool {
        self == Self::EMPTY
    }

    #[inline]
    #[must_use]
    pub const fn with_fg(self, fg: CellColor) -> Self {
        Self { fg, ..self }
    }

    #[inline]
    #[must_use]
    pub const fn with_bg(self, bg: CellColor) -> Self {
        Self { bg, ..self }
    }

    #[inline]
    #[must_use]
    pub const fn with_attrs(self, attrs: Attr) -> Self {
        Self { attrs, ..self }
    }

    /// Whether two cells share colors and attributes (characters may differ).
    #[inline]
    #[must_use]
    pub fn same_style(self, other: &Self) -> bool {
        self.fg == other.fg && self.bg == other.bg && self.attrs == other.attrs
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl std::fmt::Debug for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_continuation() {
            return write!(f, "Cell(cont)");
        }
        write!(f, "Cell({:?}", self.ch)?;
        if !self.fg.is_default() {
            write!(f, " fg={}", self.fg)?;
        }
        if !self.bg.is_default() {
            write!(f, " bg={}", self.bg)?;
        }
        if !self.attrs.is_empty() {
            write!(f, " {:?}", self.attrs)?;
        }
        write!(f, ")")
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_space_with_defaults() {
        assert_eq!(Cell::EMPTY.ch, ' ');
        assert!(Cell::EMPTY.is_empty());
        assert!(!Cell::EMPTY.is_continuation());
        assert_eq!(Cell::default(), Cell::EMPTY);
    }

    #[test]
    fn builders_replace_single_fields() {
        let c = Cell::new('a')
            .with_fg(CellColor::Indexed(1))
            .with_bg(CellColor::Indexed(4))
            .with_attrs(Attr::UNDERLINE);
        assert_eq!(c.ch, 'a');
        assert_eq!(c.fg, CellColor::Indexed(1));
        assert_eq!(c.bg, CellColor::Indexed(4));
        assert_eq!(c.attrs, Attr::UNDERLINE);
    }

    #[test]
    fn continuation_keeps_colors() {
        let c = Cell::continuation(CellColor::Indexed(2), CellColor::Indexed(0), Attr::BOLD);
        assert!(c.is_continuation());
        assert_eq!(c.bg, CellColor::Indexed(0));
    }

    #[test]
    fn same_style_ignores_character() {
        let a = Cell::styled('a', CellColor::Indexed(7), CellColor::Indexed(0), Attr::BOLD);
        let b = Cell { ch: 'b', ..a };
        assert!(a.same_style(&b));
        assert!(!a.same_style(&b.with_attrs(Attr::empty())));
    }

    #[test]
    fn debug_is_compact() {
        assert_eq!(format!("{:?}", Cell::new('x')), "Cell('x')");
        let styled = Cell::new('y').with_attrs(Attr::BOLD);
        assert!(format!("{styled:?}").contains("BOLD"));
    }
}
