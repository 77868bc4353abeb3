//! Layout attributes: sizes, padding, direction, alignment.
//!
//! Sizes are either a plain integer (cells) or `"<int>pc"`, a percentage of
//! the parent's extent on the same axis. Anything else is *undefined*, the
//! [`UNDEFINED`] sentinel, and callers fall back to content or parent size.
//! Parsing never fails loudly, and every value is clamped to
//! [`MAX_EXTENT`] cells either way.

use std::sync::LazyLock;

use regex::Regex;

use crate::element::{Element, Kind};
use crate::geom::Vec2;

/// Marker for "no declared size, derive it".
pub const UNDEFINED: i32 = -1;

/// Width of an input without a `width` attribute.
pub const DEFAULT_INPUT_WIDTH: i32 = 15;

/// Largest size or padding, in cells, an attribute can ask for.
pub const MAX_EXTENT: i32 = 4096;

/// Most rows a multi-line input shows.
pub const MAX_INPUT_LINES: i32 = 256;

static INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[0-9]+$").expect("integer pattern is valid"));

static PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(-?[0-9]+)pc$").expect("percent pattern is valid"));

// ---------------------------------------------------------------------------
// Sizes
// ---------------------------------------------------------------------------

/// Parse an integer with an optional leading `-`.
#[must_use]
pub fn parse_int(s: &str) -> Option<i32> {
    INTEGER.is_match(s).then(|| s.parse().ok()).flatten()
}

/// Resolve a size string against the parent extent `max`.
///
/// Percentages round half to even. Results are clamped to
/// `±MAX_EXTENT`.
///
/// ```
/// use piko_page::units::{parse_size, UNDEFINED};
///
/// assert_eq!(parse_size("12", 80), 12);
/// assert_eq!(parse_size("50pc", 80), 40);
/// assert_eq!(parse_size("50px", 80), UNDEFINED);
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn parse_size(s: &str, max: i32) -> i32 {
    if let Some(n) = parse_int(s) {
        return n.clamp(-MAX_EXTENT, MAX_EXTENT);
    }
    let Some(caps) = PERCENT.captures(s) else {
        return UNDEFINED;
    };
    let Ok(pc) = caps[1].parse::<i32>() else {
        return UNDEFINED;
    };
    let limit = f64::from(MAX_EXTENT);
    (f64::from(max) / 100.0 * f64::from(pc))
        .round_ties_even()
        .clamp(-limit, limit) as i32
}

/// Declared `width`/`height` of an element against `parent`, each
/// [`UNDEFINED`] when absent or unparsable. Containers default their width
/// to `100pc`.
#[must_use]
pub fn defined_size(el: &Element, parent: Vec2) -> Vec2 {
    let width = el
        .attr("width")
        .or(matches!(el.kind, Kind::Container).then_some("100pc"));
    Vec2::new(
        width.map_or(UNDEFINED, |w| parse_size(w, parent.x)),
        el.attr("height").map_or(UNDEFINED, |h| parse_size(h, parent.y)),
    )
}

// ---------------------------------------------------------------------------
// Padding
// ---------------------------------------------------------------------------

/// Space between an element's edge and its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Padding {
    pub top: i32,
    pub bottom: i32,
    pub left: i32,
    pub right: i32,
}

impl Padding {
    /// `padding` sets every side, resolved per axis; `padding-<side>` adds
    /// to that base. Undefined values count as zero.
    #[must_use]
    pub fn of(el: &Element, parent: Vec2) -> Self {
        let size = |name: &str, max: i32| {
            el.attr(name)
                .map(|v| parse_size(v, max))
                .filter(|&v| v != UNDEFINED)
                .unwrap_or(0)
        };
        let vertical = size("padding", parent.y);
        let horizontal = size("padding", parent.x);
        Self {
            top: vertical + size("padding-top", parent.y),
            bottom: vertical + size("padding-bottom", parent.y),
            left: horizontal + size("padding-left", parent.x),
            right: horizontal + size("padding-right", parent.x),
        }
    }

    /// Left + right, top + bottom.
    #[must_use]
    pub const fn total(self) -> Vec2 {
        Vec2::new(self.left + self.right, self.top + self.bottom)
    }

    /// Offset of the content from the element's origin.
    #[must_use]
    pub const fn origin(self) -> Vec2 {
        Vec2::new(self.left, self.top)
    }
}

// ---------------------------------------------------------------------------
// Direction and alignment
// ---------------------------------------------------------------------------

/// Axis children are stacked along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Along x.
    Row,
    /// Along y.
    #[default]
    Column,
}

impl Direction {
    /// `direction="row"` is a row; anything else stacks vertically.
    #[must_use]
    pub fn of(el: &Element) -> Self {
        match el.attr("direction") {
            Some("row") => Self::Row,
            _ => Self::Column,
        }
    }

    /// Add `child` to the running `total`: sum on the main axis, max on the
    /// cross axis.
    #[must_use]
    pub fn accumulate(self, total: Vec2, child: Vec2) -> Vec2 {
        match self {
            Self::Row => Vec2::new(total.x.saturating_add(child.x), total.y.max(child.y)),
            Self::Column => Vec2::new(total.x.max(child.x), total.y.saturating_add(child.y)),
        }
    }

    /// Move `offset` past a child of size `child`.
    #[must_use]
    pub const fn advance(self, offset: Vec2, child: Vec2) -> Vec2 {
        match self {
            Self::Row => Vec2::new(offset.x.saturating_add(child.x), offset.y),
            Self::Column => Vec2::new(offset.x, offset.y.saturating_add(child.y)),
        }
    }
}

/// Horizontal placement inside the parent box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    #[must_use]
    pub fn of(el: &Element) -> Self {
        match el.attr("align") {
            Some("center") => Self::Center,
            Some("right") => Self::Right,
            _ => Self::Left,
        }
    }

    /// Shift of content `content` cells wide inside a box `outer` wide.
    #[must_use]
    pub fn offset(self, outer: i32, content: i32) -> i32 {
        match self {
            Self::Left => 0,
            Self::Center => half_rounded(outer).saturating_sub(half_rounded(content)),
            Self::Right => outer.saturating_sub(content),
        }
    }
}

/// `n / 2` rounded half to even.
fn half_rounded(n: i32) -> i32 {
    let half = n / 2;
    if n % 2 == 0 || half % 2 == 0 {
        half
    } else {
        half + n.signum()
    }
}

/// Visible rows of an input: the `lines` attribute when it is above one,
/// at most [`MAX_INPUT_LINES`].
#[must_use]
pub fn input_lines(el: &Element) -> i32 {
    el.attr("lines")
        .and_then(parse_int)
        .filter(|&n| n > 1)
        .map_or(1, |n| n.min(MAX_INPUT_LINES))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn integers_accept_leading_minus() {
        assert_eq!(parse_int("-4"), Some(-4));
        assert_eq!(parse_int("17"), Some(17));
        assert_eq!(parse_int("4-"), None);
        assert_eq!(parse_int(""), None);
        assert_eq!(parse_int("99999999999"), None);
    }

    #[test]
    fn percent_sizes() {
        assert_eq!(parse_size("33pc", 90), 30);
        assert_eq!(parse_size("100pc", 20), 20);
        assert_eq!(parse_size("-50pc", 10), -5);
        // 2.5 and 3.5 round to even.
        assert_eq!(parse_size("25pc", 10), 2);
        assert_eq!(parse_size("35pc", 10), 4);
    }

    #[test]
    fn huge_sizes_are_clamped() {
        assert_eq!(parse_size("2147483647", 80), MAX_EXTENT);
        assert_eq!(parse_size("-2147483648", 80), -MAX_EXTENT);
        assert_eq!(parse_size("2147483647pc", 80), MAX_EXTENT);
        let el = Element::new(Kind::Container).with_attr("padding", "2147483647");
        let p = Padding::of(&el, Vec2::new(80, 24));
        assert_eq!(p.total(), Vec2::new(2 * MAX_EXTENT, 2 * MAX_EXTENT));
    }

    #[test]
    fn malformed_sizes_are_undefined() {
        for s in ["", "pc", "10p", "10px", "abcpc", "1.5pc", "pc10", " 10"] {
            assert_eq!(parse_size(s, 100), UNDEFINED, "{s:?}");
        }
    }

    #[test]
    fn container_width_defaults_to_full() {
        let cont = Element::new(Kind::Container);
        assert_eq!(defined_size(&cont, Vec2::new(40, 10)), Vec2::new(40, UNDEFINED));
        let cell = Element::new(Kind::Cell);
        assert_eq!(defined_size(&cell, Vec2::new(40, 10)), Vec2::new(UNDEFINED, UNDEFINED));
        let sized = Element::new(Kind::Cell).with_attr("height", "50pc");
        assert_eq!(defined_size(&sized, Vec2::new(40, 10)).y, 5);
    }

    #[test]
    fn padding_adds_sides_to_base() {
        let el = Element::new(Kind::Container)
            .with_attr("padding", "10pc")
            .with_attr("padding-left", "2")
            .with_attr("padding-top", "bogus");
        let p = Padding::of(&el, Vec2::new(50, 20));
        assert_eq!(
            p,
            Padding {
                top: 2,
                bottom: 2,
                left: 7,
                right: 5
            }
        );
        assert_eq!(p.total(), Vec2::new(12, 4));
        assert_eq!(p.origin(), Vec2::new(7, 2));
    }

    #[test]
    fn direction_accumulates() {
        let row = Direction::Row;
        let col = Direction::Column;
        assert_eq!(row.accumulate(Vec2::new(3, 1), Vec2::new(4, 2)), Vec2::new(7, 2));
        assert_eq!(col.accumulate(Vec2::new(3, 1), Vec2::new(4, 2)), Vec2::new(4, 3));
        let el = Element::new(Kind::Container).with_attr("direction", "sideways");
        assert_eq!(Direction::of(&el), Direction::Column);
    }

    #[test]
    fn alignment_offsets() {
        assert_eq!(Align::Left.offset(20, 5), 0);
        assert_eq!(Align::Center.offset(20, 5), 8);
        assert_eq!(Align::Center.offset(20, 4), 8);
        assert_eq!(Align::Right.offset(20, 5), 15);
    }

    #[test]
    fn lines_attribute() {
        let el = Element::new(Kind::Input(crate::element::InputState::default()));
        assert_eq!(input_lines(&el), 1);
        assert_eq!(input_lines(&el.clone().with_attr("lines", "4")), 4);
        assert_eq!(input_lines(&el.clone().with_attr("lines", "1")), 1);
        assert_eq!(input_lines(&el.clone().with_attr("lines", "2147483647")), MAX_INPUT_LINES);
        assert_eq!(input_lines(&el.with_attr("lines", "x")), 1);
    }
}
