//! Box-drawing glyph sets for borders and table grids.

/// The thirteen glyphs a border style needs: corners and edges for boxes,
/// plus the tees and cross that table grids put between cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorderGlyphs {
    pub top_left: char,
    pub top_right: char,
    pub bottom_left: char,
    pub bottom_right: char,
    pub top: char,
    pub bottom: char,
    pub left: char,
    pub right: char,
    pub top_tee: char,
    pub bottom_tee: char,
    pub left_tee: char,
    pub right_tee: char,
    pub cross: char,
}

const LINE: BorderGlyphs = BorderGlyphs {
    top_left: '╔',
    top_right: '╗',
    bottom_left: '╚',
    bottom_right: '╝',
    top: '═',
    bottom: '═',
    left: '║',
    right: '║',
    top_tee: '╦',
    bottom_tee: '╩',
    left_tee: '╠',
    right_tee: '╣',
    cross: '╬',
};

const THIN: BorderGlyphs = BorderGlyphs {
    top_left: '┌',
    top_right: '┐',
    bottom_left: '└',
    bottom_right: '┘',
    top: '─',
    bottom: '─',
    left: '│',
    right: '│',
    top_tee: '┬',
    bottom_tee: '┴',
    left_tee: '├',
    right_tee: '┤',
    cross: '┼',
};

const DOTTED_THICK: BorderGlyphs = BorderGlyphs {
    top_left: '┏',
    top_right: '┓',
    bottom_left: '┗',
    bottom_right: '┛',
    top: '┅',
    bottom: '┅',
    left: '┇',
    right: '┇',
    top_tee: '┳',
    bottom_tee: '┻',
    left_tee: '┝',
    right_tee: '┥',
    cross: '╋',
};

const DOTTED_THIN: BorderGlyphs = BorderGlyphs {
    top: '┄',
    bottom: '┄',
    left: '┆',
    right: '┆',
    ..THIN
};

/// A named border style. Unknown names draw as [`BorderStyle::Line`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BorderStyle {
    #[default]
    Line,
    Thin,
    DottedThick,
    DottedThin,
}

impl BorderStyle {
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "thin" => Self::Thin,
            "dotted thick" => Self::DottedThick,
            "dotted thin" => Self::DottedThin,
            _ => Self::Line,
        }
    }

    #[must_use]
    pub const fn glyphs(self) -> &'static BorderGlyphs {
        match self {
            Self::Line => &LINE,
            Self::Thin => &THIN,
            Self::DottedThick => &DOTTED_THICK,
            Self::DottedThin => &DOTTED_THIN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_select_styles() {
        assert_eq!(BorderStyle::from_name("thin"), BorderStyle::Thin);
        assert_eq!(BorderStyle::from_name("dotted thick"), BorderStyle::DottedThick);
        assert_eq!(BorderStyle::from_name("dotted thin"), BorderStyle::DottedThin);
        assert_eq!(BorderStyle::from_name("line"), BorderStyle::Line);
        assert_eq!(BorderStyle::from_name("wavy"), BorderStyle::Line);
    }

    #[test]
    fn focused_and_unfocused_input_borders_differ() {
        let a = BorderStyle::DottedThick.glyphs();
        let b = BorderStyle::DottedThin.glyphs();
        assert_ne!(a.top_left, b.top_left);
        assert_ne!(a.top, b.top);
        assert_ne!(a.left, b.left);
    }

    #[test]
    fn dotted_thin_shares_thin_junctions() {
        let dotted = BorderStyle::DottedThin.glyphs();
        let thin = BorderStyle::Thin.glyphs();
        assert_eq!(dotted.cross, thin.cross);
        assert_eq!(dotted.top_left, thin.top_left);
        assert_eq!(dotted.top, '┄');
    }
}
