// SPDX-License-Identifier: MIT
//
// Output buffering and stateful cell emission.
//
//   OutputBuffer — collects a whole frame of bytes so the terminal gets one
//   write per present instead of one per escape sequence.
//
//   CellWriter — remembers the terminal's cursor position, colors and
//   attributes so consecutive cells with the same style only cost their
//   character bytes.

use std::io::{self, Write};

use crate::ansi;
use crate::cell::{Attr, Cell};
use crate::color::CellColor;

// ─── OutputBuffer ────────────────────────────────────────────────────────────

/// In-memory byte sink for one frame of terminal output.
pub struct OutputBuffer {
    buf: Vec<u8>,
}

const DEFAULT_CAPACITY: usize = 16_384;

impl OutputBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(DEFAULT_CAPACITY),
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Accumulated bytes, for tests.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Append a character as UTF-8.
    pub fn write_char(&mut self, ch: char) {
        let mut enc = [0u8; 4];
        self.buf.extend_from_slice(ch.encode_utf8(&mut enc).as_bytes());
    }

    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Write everything to stdout in one go and empty the buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to stdout fails.
    pub fn flush_stdout(&mut self) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        self.flush_to(&mut stdout)
    }

    /// Write everything to `w` and empty the buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `w` fails.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        if !self.buf.is_empty() {
            w.write_all(&self.buf)?;
            w.flush()?;
            self.buf.clear();
        }
        Ok(())
    }
}

impl Write for OutputBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── CellWriter ──────────────────────────────────────────────────────────────

/// Emits cells while skipping escapes the terminal state already satisfies.
///
/// - Cursor moves are skipped for the cell right after the previous one.
/// - An attribute change resets (SGR 0) and re-emits, which also forgets
///   the tracked colors.
/// - Colors are emitted only when they differ from the last emitted ones.
/// - A continuation cell right after its wide start emits nothing.
#[allow(clippy::struct_field_names)]
pub struct CellWriter {
    last_x: i32,
    last_y: i32,
    last_fg: Option<CellColor>,
    last_bg: Option<CellColor>,
    last_attrs: Attr,
}

impl CellWriter {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_x: -1,
            last_y: -1,
            last_fg: None,
            last_bg: None,
            last_attrs: Attr::empty(),
        }
    }

    /// Forget all tracked state. Call after a reset or a screen clear.
    pub fn reset_state(&mut self) {
        *self = Self::new();
    }

    /// Emit one cell at `(x, y)`.
    pub fn render_cell(&mut self, out: &mut OutputBuffer, x: u16, y: u16, cell: &Cell) {
        let xi = i32::from(x);
        let yi = i32::from(y);

        if cell.is_continuation() && self.last_y == yi && self.last_x == xi - 1 {
            self.last_x = xi;
            return;
        }

        if yi != self.last_y || xi != self.last_x + 1 {
            ansi::cursor_to(out, x, y).ok();
        }

        self.apply_style(out, cell);

        if cell.is_continuation() {
            out.buf.push(b' ');
        } else {
            out.write_char(cell.ch);
        }

        self.last_x = xi;
        self.last_y = yi;
    }

    fn apply_style(&mut self, out: &mut OutputBuffer, cell: &Cell) {
        if cell.attrs != self.last_attrs {
            if !self.last_attrs.is_empty() {
                ansi::reset(out).ok();
                self.last_fg = None;
                self.last_bg = None;
            }
            self.last_attrs = cell.attrs;
            ansi::attrs(out, cell.attrs).ok();
        }

        if self.last_fg != Some(cell.fg) {
            ansi::fg(out, cell.fg).ok();
            self.last_fg = Some(cell.fg);
        }

        if self.last_bg != Some(cell.bg) {
            ansi::bg(out, cell.bg).ok();
            self.last_bg = Some(cell.bg);
        }
    }
}

impl Default for CellWriter {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn text(out: &OutputBuffer) -> String {
        String::from_utf8(out.as_bytes().to_vec()).unwrap()
    }

    // ── OutputBuffer ──

    #[test]
    fn write_char_encodes_utf8() {
        let mut out = OutputBuffer::new();
        out.write_char('a');
        out.write_char('█');
        assert_eq!(text(&out), "a█");
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn flush_to_drains() {
        let mut out = OutputBuffer::new();
        out.write_all(b"hello").unwrap();
        let mut sink = Vec::new();
        out.flush_to(&mut sink).unwrap();
        assert_eq!(sink, b"hello");
        assert!(out.is_empty());
    }

    // ── CellWriter ──

    #[test]
    fn first_cell_positions_and_styles() {
        let mut out = OutputBuffer::new();
        let mut w = CellWriter::new();
        w.render_cell(&mut out, 0, 0, &Cell::new('x'));
        assert_eq!(text(&out), "\x1b[1;1H\x1b[39m\x1b[49mx");
    }

    #[test]
    fn sequential_cells_skip_cursor_and_style() {
        let mut out = OutputBuffer::new();
        let mut w = CellWriter::new();
        w.render_cell(&mut out, 0, 0, &Cell::new('a'));
        out.clear();
        w.render_cell(&mut out, 1, 0, &Cell::new('b'));
        assert_eq!(text(&out), "b");
    }

    #[test]
    fn gap_forces_cursor_move() {
        let mut out = OutputBuffer::new();
        let mut w = CellWriter::new();
        w.render_cell(&mut out, 0, 0, &Cell::new('a'));
        out.clear();
        w.render_cell(&mut out, 5, 2, &Cell::new('b'));
        assert_eq!(text(&out), "\x1b[3;6Hb");
    }

    #[test]
    fn attr_change_resets_and_reemits_colors() {
        let mut out = OutputBuffer::new();
        let mut w = CellWriter::new();
        w.render_cell(&mut out, 0, 0, &Cell::new('a').with_attrs(Attr::BOLD));
        out.clear();
        w.render_cell(&mut out, 1, 0, &Cell::new('b'));
        assert_eq!(text(&out), "\x1b[0m\x1b[39m\x1b[49mb");
    }

    #[test]
    fn continuation_after_wide_start_is_silent() {
        let mut out = OutputBuffer::new();
        let mut w = CellWriter::new();
        w.render_cell(&mut out, 0, 0, &Cell::new('日'));
        out.clear();
        let cont = Cell::continuation(CellColor::Default, CellColor::Default, Attr::empty());
        w.render_cell(&mut out, 1, 0, &cont);
        assert!(out.is_empty());
        w.render_cell(&mut out, 2, 0, &Cell::new('x'));
        assert_eq!(text(&out), "x");
    }

    #[test]
    fn orphan_continuation_becomes_space() {
        let mut out = OutputBuffer::new();
        let mut w = CellWriter::new();
        let cont = Cell::continuation(CellColor::Default, CellColor::Indexed(4), Attr::empty());
        w.render_cell(&mut out, 3, 0, &cont);
        assert!(text(&out).ends_with("\x1b[44m "));
    }
}
