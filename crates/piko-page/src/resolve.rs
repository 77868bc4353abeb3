//! Size resolver: how much room an element takes.
//!
//! Sizes resolve bottom-up against the space the parent offers. The
//! resolver is pure; it reads the tree and never mutates it.
//!
//! The layout helpers here ([`container_layout`], [`text_layout`],
//! [`link_layout`], [`table_grid`]) are shared with the compositor so that
//! what gets measured and what gets painted cannot drift apart.
//!
//! ## Box model
//!
//! A container's declared `width`/`height` is its *footprint*, border
//! included. A border takes one cell on each side, so the resolved size of
//! a bordered container is two cells smaller on a declared axis. An axis
//! derived from content is left alone: it is the children plus padding,
//! and the border sits outside it. Padding sits inside the box, and
//! children measure against what is left.
//!
//! [`resolve_size`] reports the resolved size. [`footprint`] adds the
//! border back; it is what a parent stacks and what the compositor
//! consumes.

use crate::element::{Element, Kind, NodeId, Tree};
use crate::font;
use crate::geom::Vec2;
use crate::units::{
    defined_size, input_lines, parse_size, Align, Direction, Padding, DEFAULT_INPUT_WIDTH,
    UNDEFINED,
};
use crate::wrap::{wrap, Wrapped};

/// Size of `id` laid out inside `parent`. For a bordered container this is
/// the box inside the border.
#[must_use]
pub fn resolve_size(tree: &Tree, id: NodeId, parent: Vec2) -> Vec2 {
    let el = &tree[id];
    match &el.kind {
        Kind::Container | Kind::Cell | Kind::Row => container_layout(tree, id, parent).size,
        Kind::Text { .. } => text_layout(el, parent).size,
        Kind::Link { .. } => link_layout(el, parent).wrapped.size,
        Kind::Input(_) => input_size(el, parent),
        Kind::LineBreak => Vec2::new(1, 1),
        Kind::Table => table_grid(tree, id, parent).size(),
    }
}

/// Space `id` takes inside `parent`: its resolved size plus the border of
/// a bordered container.
#[must_use]
pub fn footprint(tree: &Tree, id: NodeId, parent: Vec2) -> Vec2 {
    match tree[id].kind {
        Kind::Container | Kind::Cell | Kind::Row => container_layout(tree, id, parent).footprint,
        _ => resolve_size(tree, id, parent),
    }
}

/// Size of a whole page: the width of the viewport by the stacked height of
/// every root.
#[must_use]
pub fn document_size(tree: &Tree, viewport: Vec2) -> Vec2 {
    let height = tree
        .roots()
        .iter()
        .fold(0, |h: i32, &root| h.saturating_add(footprint(tree, root, viewport).y));
    Vec2::new(viewport.x, height)
}

// ---------------------------------------------------------------------------
// Containers and cells
// ---------------------------------------------------------------------------

/// Layout of a box that stacks children: containers, cells, and rows used
/// outside a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxLayout {
    pub padding: Padding,
    pub border: bool,
    pub direction: Direction,
    /// Space offered to each child.
    pub inner: Vec2,
    /// Accumulated size of the children.
    pub content: Vec2,
    /// Size inside the border.
    pub size: Vec2,
    /// Size including the border.
    pub footprint: Vec2,
}

impl BoxLayout {
    /// Where the first child goes, relative to the element's origin.
    #[must_use]
    pub const fn content_origin(&self) -> Vec2 {
        let b = if self.border { 1 } else { 0 };
        Vec2::new(self.padding.left + b, self.padding.top + b)
    }
}

/// Lay out a container, cell or stray row.
#[must_use]
pub fn container_layout(tree: &Tree, id: NodeId, parent: Vec2) -> BoxLayout {
    let el = &tree[id];
    let border = matches!(el.kind, Kind::Container) && el.attr("border").is_some();
    let b = if border { 2 } else { 0 };
    let padding = Padding::of(el, parent);
    let pad = padding.total();
    let def = defined_size(el, parent);
    let direction = match el.kind {
        Kind::Row => Direction::Row,
        _ => Direction::of(el),
    };

    let avail = |def: i32, parent: i32, pad: i32| {
        let outer = if def == UNDEFINED { parent } else { def };
        outer.saturating_sub(b).saturating_sub(pad)
    };
    let inner = Vec2::new(avail(def.x, parent.x, pad.x), avail(def.y, parent.y, pad.y))
        .non_negative();

    let content = tree
        .children(id)
        .iter()
        .fold(Vec2::ZERO, |acc, &child| {
            direction.accumulate(acc, footprint(tree, child, inner))
        });

    let boxed = |def: i32, content: i32, pad: i32| {
        if def == UNDEFINED { content.saturating_add(pad) } else { def - b }
    };
    let size = Vec2::new(boxed(def.x, content.x, pad.x), boxed(def.y, content.y, pad.y));

    BoxLayout {
        padding,
        border,
        direction,
        inner,
        content,
        size,
        footprint: size + Vec2::new(b, b),
    }
}

// ---------------------------------------------------------------------------
// Text and links
// ---------------------------------------------------------------------------

/// A wrapped text element, placed within its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLayout {
    pub wrapped: Wrapped,
    pub padding: Padding,
    /// Wrapped size plus padding.
    pub size: Vec2,
    /// Shift of the text box inside the parent.
    pub align: i32,
}

/// Lay out a text element. Empty text still takes one row.
#[must_use]
pub fn text_layout(el: &Element, parent: Vec2) -> TextLayout {
    let padding = Padding::of(el, parent);
    let value = el.value().unwrap_or_default();
    if value.is_empty() {
        return TextLayout {
            wrapped: Wrapped::default(),
            padding,
            size: Vec2::new(0, 1),
            align: 0,
        };
    }

    let preserve = el.attr("preserve") == Some("true");
    let inner = parent - padding.total();
    let width = el
        .attr("width")
        .map(|w| parse_size(w, inner.x))
        .filter(|&w| w != UNDEFINED)
        .unwrap_or(inner.x);

    let source = if preserve { value } else { value.trim() };
    // A big font is a picture; reflowing it would scramble the glyphs.
    let (rendered, preserve) = match el.attr("font") {
        Some(name) => (font::render(source, name), true),
        None => (source.to_owned(), preserve),
    };
    let wrapped = wrap(&rendered, width, preserve);

    TextLayout {
        size: wrapped.size + padding.total(),
        align: Align::of(el).offset(inner.x, wrapped.size.x),
        wrapped,
        padding,
    }
}

/// A wrapped link label, placed within its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkLayout {
    pub wrapped: Wrapped,
    pub align: i32,
}

/// The label a link shows: `[key] value`.
#[must_use]
pub fn link_label(el: &Element) -> String {
    format!(
        "[{}] {}",
        el.attr("key").unwrap_or_default(),
        el.value().unwrap_or_default()
    )
}

#[must_use]
pub fn link_layout(el: &Element, parent: Vec2) -> LinkLayout {
    let width = el
        .attr("width")
        .map(|w| parse_size(w, parent.x))
        .filter(|&w| w != UNDEFINED)
        .unwrap_or(parent.x);
    let wrapped = wrap(&link_label(el), width, false);
    LinkLayout {
        align: Align::of(el).offset(parent.x, wrapped.size.x),
        wrapped,
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Footprint of an input: its width by its visible rows plus the border.
#[must_use]
pub fn input_size(el: &Element, parent: Vec2) -> Vec2 {
    let width = el
        .attr("width")
        .map(|w| parse_size(w, parent.x))
        .filter(|&w| w != UNDEFINED)
        .unwrap_or(DEFAULT_INPUT_WIDTH);
    Vec2::new(width, input_lines(el) + 2)
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Cells of a table with their measured sizes, plus the column widths and
/// row heights they produce. Widths and heights never drop below one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableGrid {
    pub cells: Vec<Vec<(NodeId, Vec2)>>,
    pub col_widths: Vec<i32>,
    pub row_heights: Vec<i32>,
}

impl TableGrid {
    /// Footprint: content plus one separator between neighbors and the
    /// outer border. A table without cells takes no room.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        if self.col_widths.is_empty() || self.row_heights.is_empty() {
            return Vec2::ZERO;
        }
        let axis = |v: &[i32]| {
            v.iter()
                .fold(count(v.len()), |total, &n| total.saturating_add(n))
                .saturating_add(1)
        };
        Vec2::new(axis(&self.col_widths), axis(&self.row_heights))
    }
}

fn count(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

/// Measure a table's rows and cells against `parent`. Children that are
/// not rows, and row children that are not cells, are ignored. Declared
/// `width`/`height` do not apply to tables.
#[must_use]
pub fn table_grid(tree: &Tree, id: NodeId, parent: Vec2) -> TableGrid {
    let cells: Vec<Vec<(NodeId, Vec2)>> = tree
        .children(id)
        .iter()
        .filter(|&&row| matches!(tree[row].kind, Kind::Row))
        .map(|&row| {
            tree.children(row)
                .iter()
                .filter(|&&cell| matches!(tree[cell].kind, Kind::Cell))
                .map(|&cell| (cell, footprint(tree, cell, parent)))
                .collect()
        })
        .collect();

    let columns = cells.iter().map(Vec::len).max().unwrap_or(0);
    let mut col_widths = vec![1; columns];
    let mut row_heights = vec![1; cells.len()];
    for (r, row) in cells.iter().enumerate() {
        for (c, &(_, size)) in row.iter().enumerate() {
            col_widths[c] = col_widths[c].max(size.x);
            row_heights[r] = row_heights[r].max(size.y);
        }
    }

    TableGrid {
        cells,
        col_widths,
        row_heights,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::InputState;
    use pretty_assertions::assert_eq;

    const VIEW: Vec2 = Vec2::new(80, 24);

    fn single(el: Element) -> (Tree, NodeId) {
        let mut tree = Tree::new();
        let id = tree.push(None, el);
        (tree, id)
    }

    #[test]
    fn bordered_hello_box() {
        let mut tree = Tree::new();
        let root = tree.push(
            None,
            Element::new(Kind::Container)
                .with_attr("border", "line")
                .with_attr("width", "20"),
        );
        tree.push(Some(root), Element::text("Hello"));
        let layout = container_layout(&tree, root, VIEW);
        assert_eq!(layout.size, Vec2::new(18, 1));
        assert_eq!(layout.inner.x, 18);
        assert_eq!(layout.footprint, Vec2::new(20, 3));
        assert_eq!(layout.content_origin(), Vec2::new(1, 1));
    }

    #[test]
    fn border_shrinks_declared_axes_only() {
        let mut tree = Tree::new();
        let root = tree.push(
            None,
            Element::new(Kind::Container)
                .with_attr("border", "thin")
                .with_attr("width", "100pc"),
        );
        tree.push(Some(root), Element::text("Hello"));
        let parent = Vec2::new(20, 24);
        assert_eq!(resolve_size(&tree, root, parent), Vec2::new(18, 1));
        assert_eq!(footprint(&tree, root, parent), Vec2::new(20, 3));

        let tall = tree.push(
            None,
            Element::new(Kind::Container)
                .with_attr("border", "thin")
                .with_attr("height", "5"),
        );
        assert_eq!(resolve_size(&tree, tall, parent), Vec2::new(18, 3));
        assert_eq!(footprint(&tree, tall, parent), Vec2::new(20, 5));
    }

    #[test]
    fn parents_stack_bordered_footprints() {
        let mut tree = Tree::new();
        let root = tree.push(None, Element::new(Kind::Container));
        for text in ["a", "b"] {
            let boxed = tree.push(Some(root), Element::new(Kind::Container).with_attr("border", "line"));
            tree.push(Some(boxed), Element::text(text));
        }
        assert_eq!(resolve_size(&tree, root, Vec2::new(10, 24)), Vec2::new(10, 6));
        assert_eq!(document_size(&tree, Vec2::new(10, 24)), Vec2::new(10, 6));
    }

    #[test]
    fn huge_attributes_do_not_overflow() {
        let mut tree = Tree::new();
        let root = tree.push(None, Element::new(Kind::Container).with_attr("padding", "2147483647"));
        tree.push(Some(root), Element::text("x"));
        let deep = tree.push(Some(root), Element::new(Kind::Container).with_attr("height", "2147483647"));
        tree.push(
            Some(deep),
            Element::new(Kind::Input(InputState::default())).with_attr("lines", "2147483647"),
        );
        let size = resolve_size(&tree, root, VIEW);
        assert!(size.y > 0);
        assert!(document_size(&tree, VIEW).y >= size.y);
    }

    #[test]
    fn percentage_children_fill_a_row() {
        let mut tree = Tree::new();
        let root = tree.push(
            None,
            Element::new(Kind::Container)
                .with_attr("direction", "row")
                .with_attr("width", "90"),
        );
        for _ in 0..3 {
            let child = tree.push(
                Some(root),
                Element::new(Kind::Container).with_attr("width", "33pc"),
            );
            tree.push(Some(child), Element::text("x"));
        }
        let sizes: Vec<i32> = tree
            .children(root)
            .iter()
            .map(|&c| resolve_size(&tree, c, Vec2::new(90, 24)).x)
            .collect();
        assert_eq!(sizes, vec![30, 30, 30]);
        assert_eq!(resolve_size(&tree, root, VIEW), Vec2::new(90, 1));
    }

    #[test]
    fn container_without_width_fills_parent() {
        let mut tree = Tree::new();
        let root = tree.push(None, Element::new(Kind::Container).with_attr("padding", "1"));
        tree.push(Some(root), Element::text("a b"));
        assert_eq!(resolve_size(&tree, root, Vec2::new(30, 10)), Vec2::new(30, 3));
    }

    #[test]
    fn cells_fit_content() {
        let mut tree = Tree::new();
        let cell = tree.push(None, Element::new(Kind::Cell).with_attr("padding-left", "2"));
        tree.push(Some(cell), Element::text("abc"));
        assert_eq!(resolve_size(&tree, cell, VIEW), Vec2::new(5, 1));
    }

    #[test]
    fn stray_rows_stack_horizontally() {
        let mut tree = Tree::new();
        let row = tree.push(None, Element::new(Kind::Row));
        tree.push(Some(row), Element::text("ab"));
        tree.push(Some(row), Element::text("cde"));
        assert_eq!(resolve_size(&tree, row, VIEW), Vec2::new(5, 1));
    }

    #[test]
    fn text_wraps_to_inner_width() {
        let el = Element::text("one two three").with_attr("padding-left", "1");
        let layout = text_layout(&el, Vec2::new(8, 5));
        assert_eq!(layout.wrapped.lines, vec!["one two", "three"]);
        assert_eq!(layout.size, Vec2::new(8, 2));
    }

    #[test]
    fn text_width_attribute_narrows_wrap() {
        let el = Element::text("aaa bbb").with_attr("width", "3");
        assert_eq!(text_layout(&el, VIEW).size, Vec2::new(3, 2));
    }

    #[test]
    fn empty_text_takes_a_row() {
        let (tree, id) = single(Element::text(""));
        assert_eq!(resolve_size(&tree, id, VIEW), Vec2::new(0, 1));
    }

    #[test]
    fn font_text_is_not_reflowed() {
        let el = Element::text("HI").with_attr("font", "block");
        let layout = text_layout(&el, VIEW);
        assert_eq!(layout.size, Vec2::new(7, 3));
        let narrow = text_layout(&el, Vec2::new(4, 5));
        assert_eq!(narrow.size, Vec2::new(4, 3));
    }

    #[test]
    fn centered_text_offset() {
        let el = Element::text("hello").with_attr("align", "center");
        assert_eq!(text_layout(&el, Vec2::new(20, 1)).align, 8);
        let el = Element::text("hello").with_attr("align", "right");
        assert_eq!(text_layout(&el, Vec2::new(20, 1)).align, 15);
    }

    #[test]
    fn link_label_and_size() {
        let el = Element::new(Kind::Link {
            value: "Home".into(),
        })
        .with_attr("key", "1");
        assert_eq!(link_label(&el), "[1] Home");
        let (tree, id) = single(el);
        assert_eq!(resolve_size(&tree, id, VIEW), Vec2::new(8, 1));
    }

    #[test]
    fn input_sizes() {
        let input = Element::new(Kind::Input(InputState::default()));
        assert_eq!(input_size(&input, VIEW), Vec2::new(15, 3));
        let wide = input.clone().with_attr("width", "50pc");
        assert_eq!(input_size(&wide, VIEW), Vec2::new(40, 3));
        let tall = input.with_attr("lines", "4");
        assert_eq!(input_size(&tall, VIEW), Vec2::new(15, 6));
    }

    #[test]
    fn line_break_is_one_cell() {
        let (tree, id) = single(Element::new(Kind::LineBreak));
        assert_eq!(resolve_size(&tree, id, VIEW), Vec2::new(1, 1));
    }

    fn two_by_two() -> (Tree, NodeId) {
        let mut tree = Tree::new();
        let table = tree.push(None, Element::new(Kind::Table));
        for row_text in [["abc", "d"], ["e", "fg"]] {
            let row = tree.push(Some(table), Element::new(Kind::Row));
            for text in row_text {
                let cell = tree.push(Some(row), Element::new(Kind::Cell));
                tree.push(Some(cell), Element::text(text));
            }
        }
        (tree, table)
    }

    #[test]
    fn table_columns_and_rows() {
        let (tree, table) = two_by_two();
        let grid = table_grid(&tree, table, VIEW);
        assert_eq!(grid.col_widths, vec![3, 2]);
        assert_eq!(grid.row_heights, vec![1, 1]);
        assert_eq!(grid.size(), Vec2::new(8, 5));
        assert_eq!(resolve_size(&tree, table, VIEW), Vec2::new(8, 5));
    }

    #[test]
    fn ragged_tables_use_widest_row() {
        let mut tree = Tree::new();
        let table = tree.push(None, Element::new(Kind::Table).with_attr("width", "50"));
        let a = tree.push(Some(table), Element::new(Kind::Row));
        tree.push(Some(a), Element::new(Kind::Cell));
        let b = tree.push(Some(table), Element::new(Kind::Row));
        tree.push(Some(b), Element::new(Kind::Cell));
        let tall = tree.push(Some(b), Element::new(Kind::Cell));
        tree.push(Some(tall), Element::new(Kind::LineBreak));
        tree.push(Some(tall), Element::new(Kind::LineBreak));
        tree.push(Some(table), Element::text("ignored"));

        let grid = table_grid(&tree, table, VIEW);
        assert_eq!(grid.col_widths, vec![1, 1]);
        assert_eq!(grid.row_heights, vec![1, 2]);
        assert_eq!(grid.size(), Vec2::new(5, 6));
    }

    #[test]
    fn empty_table_takes_no_room() {
        let (tree, id) = single(Element::new(Kind::Table));
        assert_eq!(resolve_size(&tree, id, VIEW), Vec2::ZERO);
    }

    #[test]
    fn document_height_stacks_roots() {
        let mut tree = Tree::new();
        tree.push(None, Element::text("a"));
        tree.push(None, Element::new(Kind::Input(InputState::default())));
        tree.push(None, Element::new(Kind::LineBreak));
        assert_eq!(document_size(&tree, Vec2::new(40, 10)), Vec2::new(40, 5));
    }
}
