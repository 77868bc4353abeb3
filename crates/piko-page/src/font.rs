//! Big text: the built-in block font behind the `font` attribute.
//!
//! Glyphs are drawn on a 3×5 pixel grid and packed two pixel rows per
//! terminal row with half-block characters, so each line of text becomes a
//! block three rows tall. Lowercase letters use the uppercase glyphs; a
//! character the font has no glyph for is drawn as `?`.
//!
//! `block`, `standard` and `big` all select this font. Any other font name
//! leaves the text unchanged.

/// Pixel rows of one glyph, top to bottom, three bits each (MSB is the
/// leftmost column).
type Glyph = [u8; 5];

const GLYPH_WIDTH: usize = 3;

/// Font names the `font` attribute accepts.
pub const FONT_NAMES: [&str; 3] = ["block", "standard", "big"];

#[rustfmt::skip]
fn glyph(ch: char) -> Glyph {
    match ch.to_ascii_uppercase() {
        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b011, 0b100, 0b100, 0b100, 0b011],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'G' => [0b011, 0b100, 0b101, 0b101, 0b011],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b010],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'N' => [0b110, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b010, 0b101, 0b101, 0b101, 0b010],
        'P' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'Q' => [0b010, 0b101, 0b101, 0b110, 0b011],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b011, 0b100, 0b010, 0b001, 0b110],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b101, 0b010],
        'W' => [0b101, 0b101, 0b111, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b110, 0b001, 0b010, 0b100, 0b111],
        '3' => [0b110, 0b001, 0b010, 0b001, 0b110],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b110, 0b001, 0b110],
        '6' => [0b011, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b110],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '_' => [0b000, 0b000, 0b000, 0b000, 0b111],
        _   => [0b110, 0b001, 0b010, 0b000, 0b010],
    }
}

fn pixel(g: &Glyph, row: usize, col: usize) -> bool {
    g.get(row)
        .is_some_and(|bits| bits & (1 << (GLYPH_WIDTH - 1 - col)) != 0)
}

/// One terminal cell holding the pixel pair `(top, bottom)`.
const fn half_block(top: bool, bottom: bool) -> char {
    match (top, bottom) {
        (true, true) => '█',
        (true, false) => '▀',
        (false, true) => '▄',
        (false, false) => ' ',
    }
}

/// Render one line of text into three rows.
fn render_line(line: &str, out: &mut Vec<String>) {
    let glyphs: Vec<Glyph> = line.chars().map(glyph).collect();
    for term_row in 0..3 {
        let mut row = String::new();
        for (i, g) in glyphs.iter().enumerate() {
            if i > 0 {
                row.push(' ');
            }
            for col in 0..GLYPH_WIDTH {
                let top = pixel(g, term_row * 2, col);
                let bottom = pixel(g, term_row * 2 + 1, col);
                row.push(half_block(top, bottom));
            }
        }
        out.push(row);
    }
}

/// Whether `name` selects the block font.
#[must_use]
pub fn is_known(name: &str) -> bool {
    FONT_NAMES.contains(&name)
}

/// Render `text` in the named font as a multi-line block with trailing
/// blank lines removed. Unknown fonts return the text as is.
///
/// ```
/// use piko_page::font::render;
///
/// let big = render("HI", "block");
/// assert_eq!(big.lines().count(), 3);
/// assert_eq!(render("HI", "comic"), "HI");
/// ```
#[must_use]
pub fn render(text: &str, font: &str) -> String {
    if !is_known(font) {
        return text.to_owned();
    }
    let mut rows = Vec::new();
    for line in text.lines() {
        render_line(line, &mut rows);
    }
    while rows.last().is_some_and(|r| r.trim().is_empty()) {
        rows.pop();
    }
    rows.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn letter_h() {
        assert_eq!(render("H", "block"), "█ █\n█▀█\n▀ ▀");
    }

    #[test]
    fn glyphs_are_separated_by_a_column() {
        let out = render("IT", "big");
        for row in out.lines() {
            assert_eq!(row.chars().count(), 7);
        }
    }

    #[test]
    fn lowercase_uses_uppercase_glyphs() {
        assert_eq!(render("ok", "standard"), render("OK", "standard"));
    }

    #[test]
    fn trailing_blank_rows_are_stripped() {
        assert_eq!(render("   ", "block"), "");
        assert_eq!(render("A\n ", "block").lines().count(), 3);
    }

    #[test]
    fn unknown_font_is_identity() {
        assert_eq!(render("plain text", "gothic"), "plain text");
        assert!(!is_known("gothic"));
    }
}
