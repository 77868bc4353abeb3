// SPDX-License-Identifier: MIT
//
// Colors — the eight named page colors and their terminal encoding.
//
// Pages name their colors (`background="blue"`), so the palette is the
// eight classic ANSI colors and nothing more. Names map to `Color`, and
// `Color` resolves to a `CellColor`, which is what cells store and what
// the ANSI layer knows how to emit. `CellColor::Default` leaves the
// terminal's own color untouched.

use std::fmt;

// ─── Color ───────────────────────────────────────────────────────────────────

/// One of the eight named page colors.
///
/// # Examples
///
/// ```
/// use piko_term::color::{CellColor, Color};
///
/// assert_eq!(Color::from_name("cyan"), Some(Color::Cyan));
/// assert_eq!(Color::from_name("teal"), None);
/// assert_eq!(Color::Red.to_cell_color(), CellColor::Indexed(1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
    Blue,
    Red,
    Green,
    Yellow,
    Magenta,
    Cyan,
}

impl Color {
    /// Every named color, in palette-table order.
    pub const ALL: [Self; 8] = [
        Self::White,
        Self::Black,
        Self::Blue,
        Self::Red,
        Self::Green,
        Self::Yellow,
        Self::Magenta,
        Self::Cyan,
    ];

    /// Look up a color by its page name. Unknown names are `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// The name pages use for this color.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Black => "black",
            Self::Blue => "blue",
            Self::Red => "red",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Magenta => "magenta",
            Self::Cyan => "cyan",
        }
    }

    /// Standard ANSI index (0–7) of this color.
    #[must_use]
    pub const fn ansi_index(self) -> u8 {
        match self {
            Self::Black => 0,
            Self::Red => 1,
            Self::Green => 2,
            Self::Yellow => 3,
            Self::Blue => 4,
            Self::Magenta => 5,
            Self::Cyan => 6,
            Self::White => 7,
        }
    }

    #[inline]
    #[must_use]
    pub const fn to_cell_color(self) -> CellColor {
        CellColor::Indexed(self.ansi_index())
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─── CellColor ───────────────────────────────────────────────────────────────

/// A color as stored in a [`Cell`](crate::cell::Cell).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellColor {
    /// The terminal's configured default.
    #[default]
    Default,
    /// A palette index (0–255).
    Indexed(u8),
}

impl CellColor {
    #[inline]
    #[must_use]
    pub const fn is_default(self) -> bool {
        matches!(self, Self::Default)
    }
}

impl fmt::Debug for CellColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "Default"),
            Self::Indexed(i) => write!(f, "Indexed({i})"),
        }
    }
}

impl fmt::Display for CellColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl From<Color> for CellColor {
    fn from(color: Color) -> Self {
        color.to_cell_color()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
