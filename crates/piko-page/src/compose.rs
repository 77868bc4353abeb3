//! Compositor: paints a document into a [`Canvas`].
//!
//! Painting is top-down. Each element is drawn at an absolute position with
//! the space its parent offers, and reports the space it consumed so the
//! parent can advance to the next child. Measurement comes from
//! [`resolve`](crate::resolve), so the painted footprint of an element is
//! exactly its resolved size.
//!
//! Paint order inside a box: colors first, then children, then the border,
//! so a border is never overdrawn by a child that overflows.

use piko_term::color::Color;

use crate::border::{BorderGlyphs, BorderStyle};
use crate::canvas::{Canvas, TextStyle};
use crate::document::Document;
use crate::edit::line_col;
use crate::element::{Element, InputState, Kind, NodeId, Tree};
use crate::geom::Vec2;
use crate::resolve::{
    container_layout, input_size, link_layout, table_grid, text_layout, TableGrid,
};
use crate::units::{input_lines, Align};

/// Caret glyph for focused inputs and the URL bar.
pub const CARET: char = '█';

/// Border style tables use when they do not name one.
const TABLE_BORDER: &str = "dotted thick";

/// Paint the visible part of `doc` scrolled down by `scroll` rows onto a
/// fresh canvas of `width` × `height`.
#[must_use]
pub fn render_document(doc: &Document, width: i32, height: i32, scroll: i32) -> Canvas {
    let mut canvas = Canvas::new(width, height, doc.background(), doc.foreground());
    let viewport = canvas.size();
    let mut y = -scroll;
    for &root in doc.tree.roots() {
        let used = render(&doc.tree, root, Vec2::new(0, y), &mut canvas, viewport);
        y = y.saturating_add(used.y);
    }
    canvas
}

/// Paint `id` with its top-left corner at `pos`. Returns the space used.
pub fn render(tree: &Tree, id: NodeId, pos: Vec2, canvas: &mut Canvas, parent: Vec2) -> Vec2 {
    let el = &tree[id];
    match &el.kind {
        Kind::Container | Kind::Cell | Kind::Row => render_box(tree, id, pos, canvas, parent),
        Kind::Text { .. } => render_text(el, pos, canvas, parent),
        Kind::Link { .. } => render_link(el, pos, canvas, parent),
        Kind::Input(state) => render_input(el, state, pos, canvas, parent),
        Kind::LineBreak => Vec2::new(1, 1),
        Kind::Table => render_table(tree, id, pos, canvas, parent),
    }
}

/// Fill the element's `background` / `foreground` over its footprint.
/// Unknown color names are ignored.
fn paint_colors(el: &Element, pos: Vec2, size: Vec2, canvas: &mut Canvas) {
    if let Some(color) = el.attr("background").and_then(Color::from_name) {
        canvas.fill_background(pos, size, color);
    }
    if let Some(color) = el.attr("foreground").and_then(Color::from_name) {
        canvas.fill_foreground(pos, size, color);
    }
}

fn style_of(el: &Element) -> Option<TextStyle> {
    el.attr("style").and_then(TextStyle::from_name)
}

fn len_of(s: &str) -> i32 {
    i32::try_from(s.chars().count()).unwrap_or(i32::MAX)
}

// ---------------------------------------------------------------------------
// Boxes
// ---------------------------------------------------------------------------

fn render_box(tree: &Tree, id: NodeId, pos: Vec2, canvas: &mut Canvas, parent: Vec2) -> Vec2 {
    let el = &tree[id];
    let layout = container_layout(tree, id, parent);
    paint_colors(el, pos, layout.footprint, canvas);

    let mut offset = layout.content_origin();
    for &child in tree.children(id) {
        let used = render(tree, child, pos + offset, canvas, layout.inner);
        offset = layout.direction.advance(offset, used);
    }

    if layout.border {
        let style = BorderStyle::from_name(el.attr("border").unwrap_or_default());
        draw_border(canvas, style.glyphs(), pos, layout.size);
    }
    layout.footprint
}

/// Frame a `size` interior whose top-left border corner sits at `pos`.
/// Only rows on the canvas are visited.
pub fn draw_border(canvas: &mut Canvas, g: &BorderGlyphs, pos: Vec2, size: Vec2) {
    let far = pos + size + Vec2::new(1, 1);
    let (right, bottom) = (far.x, far.y);

    canvas.put(pos.x, pos.y, g.top_left);
    canvas.repeat(pos.x.saturating_add(1), pos.y, g.top, size.x);
    canvas.put(right, pos.y, g.top_right);

    for y in pos.y.saturating_add(1).max(0)..bottom.min(canvas.height()) {
        canvas.put(pos.x, y, g.left);
        canvas.put(right, y, g.right);
    }

    canvas.put(pos.x, bottom, g.bottom_left);
    canvas.repeat(pos.x.saturating_add(1), bottom, g.bottom, size.x);
    canvas.put(right, bottom, g.bottom_right);
}

// ---------------------------------------------------------------------------
// Text and links
// ---------------------------------------------------------------------------

fn render_text(el: &Element, pos: Vec2, canvas: &mut Canvas, parent: Vec2) -> Vec2 {
    let layout = text_layout(el, parent);
    if layout.wrapped.lines.is_empty() {
        return layout.size;
    }
    let box_pos = Vec2::new(pos.x.saturating_add(layout.align), pos.y);
    paint_colors(el, box_pos, layout.size, canvas);

    let x = box_pos.x.saturating_add(layout.padding.left);
    let style = style_of(el);
    let top = pos.y.saturating_add(layout.padding.top);
    for (y, line) in (top..canvas.height()).zip(&layout.wrapped.lines) {
        canvas.put_str(x, y, line);
        if let Some(style) = style {
            canvas.mark(x, y, len_of(line), style);
        }
    }
    layout.size
}

fn render_link(el: &Element, pos: Vec2, canvas: &mut Canvas, parent: Vec2) -> Vec2 {
    let layout = link_layout(el, parent);
    let size = layout.wrapped.size;
    paint_colors(el, pos, size, canvas);

    let x = pos.x.saturating_add(layout.align);
    let style = style_of(el);
    for (y, line) in (pos.y..canvas.height()).zip(&layout.wrapped.lines) {
        canvas.put_str(x, y, line);
        if let Some(style) = style {
            canvas.mark(x, y, len_of(line), style);
        }
    }
    size
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Decode `\uXXXX` escapes in an icon attribute. Anything else is kept.
#[must_use]
pub fn decode_icon(raw: &str) -> String {
    let mut out = String::new();
    let mut rest = raw;
    while let Some(at) = rest.find("\\u") {
        out.push_str(&rest[..at]);
        let hex = rest.get(at + 2..at + 6);
        match hex
            .and_then(|h| u32::from_str_radix(h, 16).ok())
            .and_then(char::from_u32)
        {
            Some(ch) => {
                out.push(ch);
                rest = &rest[at + 6..];
            }
            None => {
                out.push_str("\\u");
                rest = &rest[at + 2..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Pad `s` with spaces to `width` chars, then keep its right-most `width`.
fn fit_right(s: &str, width: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out: String = chars[chars.len().saturating_sub(width)..].iter().collect();
    let len = chars.len().min(width);
    out.extend(std::iter::repeat_n(' ', width - len));
    out
}

fn masked(text: &str, mask: Option<&str>) -> String {
    match mask {
        Some(m) => m.repeat(text.chars().count()),
        None => text.to_owned(),
    }
}

fn render_input(el: &Element, state: &InputState, pos: Vec2, canvas: &mut Canvas, parent: Vec2) -> Vec2 {
    let size = input_size(el, parent);
    let lines = input_lines(el);
    let icon = el.attr("icon").map(|raw| format!(" {} ", decode_icon(raw)));
    let icon_width = icon.as_deref().map_or(0, len_of);
    let interior = size.x.saturating_sub(2 + icon_width).max(0);
    #[allow(clippy::cast_sign_loss)]
    let interior_cells = interior as usize;
    let mask = el.attr("mask").filter(|m| !m.is_empty());
    let glyphs = if state.focused {
        BorderStyle::DottedThick.glyphs()
    } else {
        BorderStyle::DottedThin.glyphs()
    };

    let rows: Vec<String> = if lines > 1 {
        multi_line_rows(state, lines, mask, interior_cells)
    } else {
        vec![single_line_row(state, mask, interior_cells)]
    };
    let rows: Vec<String> = rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| match (&icon, i) {
            (Some(icon), 0) => format!("{icon}{row}"),
            (Some(_), _) => format!("{}{row}", " ".repeat(3)),
            (None, _) => row,
        })
        .collect();

    let rendered = interior.saturating_add(icon_width);
    let align = Align::of(el).offset(parent.x, rendered.saturating_add(2));
    let origin = Vec2::new(pos.x.saturating_add(align), pos.y);

    paint_colors(el, origin, size, canvas);
    draw_border(canvas, glyphs, origin, Vec2::new(rendered, lines));

    let style = style_of(el);
    for (y, row) in (origin.y.saturating_add(1)..canvas.height()).zip(&rows) {
        canvas.repeat(origin.x + 1, y, ' ', rendered);
        canvas.put_str(origin.x + 1, y, row);
        if let Some(style) = style {
            canvas.mark(origin.x + 1, y, rendered, style);
        }
    }
    size
}

/// The one interior row of a single-line input. When focused the caret
/// covers the character under it.
fn single_line_row(state: &InputState, mask: Option<&str>, width: usize) -> String {
    let shown = masked(&state.value, mask);
    if !state.focused {
        return fit_right(&shown, width);
    }
    let chars: Vec<char> = shown.chars().collect();
    let at = state.cursor.min(chars.len());
    let mut text: String = chars[..at].iter().collect();
    text.push(CARET);
    text.extend(chars.iter().skip(at + 1));
    fit_right(&text, width)
}

/// The visible rows of a multi-line input: a window of `lines` rows that
/// keeps the caret line in view, padded with blank rows. When focused the
/// caret is inserted on its line.
fn multi_line_rows(state: &InputState, lines: i32, mask: Option<&str>, width: usize) -> Vec<String> {
    #[allow(clippy::cast_sign_loss)]
    let lines = lines as usize;
    let (caret_line, caret_col) = line_col(&state.value, state.cursor);
    let start = if caret_line >= lines { caret_line + 1 - lines } else { 0 };

    let mut rows: Vec<String> = state
        .value
        .split('\n')
        .enumerate()
        .skip(start)
        .take(lines)
        .map(|(i, line)| {
            let shown = masked(line, mask);
            if state.focused && i == caret_line {
                let chars: Vec<char> = shown.chars().collect();
                let at = caret_col.min(chars.len());
                let mut text: String = chars[..at].iter().collect();
                text.push(CARET);
                text.extend(&chars[at..]);
                text
            } else {
                shown
            }
        })
        .map(|row| fit_right(&row, width))
        .collect();
    rows.resize(lines, " ".repeat(width));
    rows
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

fn render_table(tree: &Tree, id: NodeId, pos: Vec2, canvas: &mut Canvas, parent: Vec2) -> Vec2 {
    let el = &tree[id];
    let grid = table_grid(tree, id, parent);
    let size = grid.size();
    if size == Vec2::ZERO {
        return size;
    }
    paint_colors(el, pos, size, canvas);

    let mut oy: i32 = 1;
    for (row, height) in grid.cells.iter().zip(&grid.row_heights) {
        let mut ox: i32 = 1;
        for (&(cell, cell_size), width) in row.iter().zip(&grid.col_widths) {
            render(tree, cell, pos + Vec2::new(ox, oy), canvas, cell_size);
            ox = ox.saturating_add(*width).saturating_add(1);
        }
        oy = oy.saturating_add(*height).saturating_add(1);
    }

    let style = BorderStyle::from_name(el.attr("border").unwrap_or(TABLE_BORDER));
    draw_grid(canvas, style.glyphs(), pos, &grid);
    size
}

/// Draw the outer frame and the separators between rows and columns.
pub fn draw_grid(canvas: &mut Canvas, g: &BorderGlyphs, pos: Vec2, grid: &TableGrid) {
    let widths = &grid.col_widths;
    // Draw one horizontal rule: `left`, then each column's run of `fill`
    // joined by `join`, then `right`.
    let rule = |canvas: &mut Canvas, y: i32, left: char, fill: char, join: char, right: char| {
        let mut x = pos.x;
        canvas.put(x, y, left);
        x = x.saturating_add(1);
        for (i, &w) in widths.iter().enumerate() {
            canvas.repeat(x, y, fill, w);
            x = x.saturating_add(w);
            canvas.put(x, y, if i + 1 < widths.len() { join } else { right });
            x = x.saturating_add(1);
        }
    };

    let mut y = pos.y;
    rule(canvas, y, g.top_left, g.top, g.top_tee, g.top_right);
    y = y.saturating_add(1);
    for (r, &height) in grid.row_heights.iter().enumerate() {
        let end = y.saturating_add(height);
        for row_y in y.max(0)..end.min(canvas.height()) {
            let mut x = pos.x;
            canvas.put(x, row_y, g.left);
            for (i, &w) in widths.iter().enumerate() {
                x = x.saturating_add(w).saturating_add(1);
                canvas.put(x, row_y, if i + 1 < widths.len() { g.left } else { g.right });
            }
        }
        y = end;
        if r + 1 < grid.row_heights.len() {
            rule(canvas, y, g.left_tee, g.top, g.cross, g.right_tee);
            y = y.saturating_add(1);
        }
    }
    rule(canvas, y, g.bottom_left, g.bottom, g.bottom_tee, g.bottom_right);
}
