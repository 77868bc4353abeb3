// SPDX-License-Identifier: MIT
//
// Screen — double buffering with dirty-region tracking.
//
// Painters write into the back buffer and say which rectangles they touched.
// At present time only those rectangles (clamped to the screen) are walked:
// each back cell that differs from its front twin is copied across and
// emitted through the `CellWriter`. Everything outside a dirty region stays
// exactly as the terminal last saw it, even if the back buffer was scribbled
// on, so a painter that forgets to mark a region simply doesn't show it.
//
// A full redraw (first frame, resize, explicit force) clears the terminal
// and copies the whole back buffer regardless of dirty marks.
//
// The pipeline per frame:
//
//   1. App paints into `back_mut()` and calls `mark_dirty` per region.
//   2. `present()` diffs the dirty regions into the OutputBuffer.
//   3. `flush()` writes the frame to the terminal in one syscall.

use std::io::{self, Write};

use crate::ansi;
use crate::buffer::{FrameBuffer, Rect};
use crate::output::{CellWriter, OutputBuffer};

// ─── PresentStats ────────────────────────────────────────────────────────────

/// What one [`Screen::present`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PresentStats {
    /// Cells copied to the front buffer and emitted.
    pub cells_written: usize,
    /// Cells inside dirty regions that already matched the front buffer.
    pub cells_skipped: usize,
    /// Dirty regions processed (after clamping).
    pub regions: usize,
    /// Bytes of ANSI output produced.
    pub bytes_written: usize,
    /// Whether this was a full redraw.
    pub full_redraw: bool,
}

// ─── Screen ──────────────────────────────────────────────────────────────────

/// Back/front buffer pair plus the terminal output state.
///
/// # Examples
///
/// ```
/// use piko_term::buffer::Rect;
/// use piko_term::cell::Attr;
/// use piko_term::color::CellColor;
/// use piko_term::screen::Screen;
///
/// let mut screen = Screen::new(10, 2);
/// screen.present(); // first frame is a full redraw
///
/// screen.back_mut().put_str(0, 1, "hi", CellColor::Default, CellColor::Default, Attr::empty());
/// screen.mark_dirty(Rect::new(0, 1, 10, 1));
/// let stats = screen.present();
/// assert_eq!(stats.cells_written, 2);
/// assert_eq!(screen.front().row_text(1), "hi        ");
/// ```
pub struct Screen {
    back: FrameBuffer,
    front: FrameBuffer,
    dirty: Vec<Rect>,
    full_redraw: bool,
    output: OutputBuffer,
    writer: CellWriter,
}

impl Screen {
    /// A blank screen. The first present is a full redraw.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            back: FrameBuffer::new(width, height),
            front: FrameBuffer::new(width, height),
            dirty: Vec::new(),
            full_redraw: true,
            output: OutputBuffer::new(),
            writer: CellWriter::new(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.back.width()
    }

    #[inline]
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.back.height()
    }

    /// The buffer painters write into.
    #[inline]
    pub fn back_mut(&mut self) -> &mut FrameBuffer {
        &mut self.back
    }

    #[inline]
    #[must_use]
    pub const fn back(&self) -> &FrameBuffer {
        &self.back
    }

    /// What the terminal is currently showing.
    #[inline]
    #[must_use]
    pub const fn front(&self) -> &FrameBuffer {
        &self.front
    }

    /// Record a painted region. It is clamped to the screen; regions that
    /// fall entirely outside are dropped.
    pub fn mark_dirty(&mut self, rect: Rect) {
        if let Some(r) = rect.clamp_to(self.width(), self.height()) {
            self.dirty.push(r);
        }
    }

    /// Mark the whole screen dirty without forcing a terminal clear.
    pub fn mark_all_dirty(&mut self) {
        let bounds = self.back.bounds();
        self.mark_dirty(bounds);
    }

    /// Regions recorded since the last present.
    #[must_use]
    pub fn dirty_regions(&self) -> &[Rect] {
        &self.dirty
    }

    /// Change dimensions. Both buffers are blanked and the next present
    /// is a full redraw.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.back.resize(width, height);
        self.front.resize(width, height);
        self.dirty.clear();
        self.full_redraw = true;
    }

    /// Make the next present a full redraw.
    pub fn force_redraw(&mut self) {
        self.full_redraw = true;
    }

    /// Copy dirty regions from back to front and emit the changed cells.
    pub fn present(&mut self) -> PresentStats {
        self.output.clear();
        self.writer.reset_state();

        let mut stats = PresentStats {
            full_redraw: self.full_redraw,
            ..PresentStats::default()
        };
        let regions = std::mem::take(&mut self.dirty);

        if self.width() == 0 || self.height() == 0 {
            self.full_redraw = false;
            return stats;
        }

        ansi::begin_sync(&mut self.output).ok();

        if self.full_redraw {
            ansi::reset(&mut self.output).ok();
            ansi::clear_screen(&mut self.output).ok();
            for y in 0..self.height() {
                for x in 0..self.width() {
                    if let Some(cell) = self.back.get(x, y) {
                        self.writer.render_cell(&mut self.output, x, y, cell);
                        stats.cells_written += 1;
                    }
                }
            }
            self.front.clone_from(&self.back);
            stats.regions = 1;
            self.full_redraw = false;
        } else {
            for region in &regions {
                stats.regions += 1;
                self.present_region(*region, &mut stats);
            }
        }

        if stats.cells_written == 0 {
            // Nothing changed on screen; don't send an empty synchronized frame.
            self.output.clear();
            return stats;
        }

        ansi::reset(&mut self.output).ok();
        ansi::end_sync(&mut self.output).ok();
        stats.bytes_written = self.output.len();
        stats
    }

    fn present_region(&mut self, region: Rect, stats: &mut PresentStats) {
        // Regions were clamped on insertion, so the origin is on screen.
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let (x0, y0) = (region.x as u16, region.y as u16);

        for y in y0..y0 + region.height {
            let (Some(back_row), Some(front_row)) = (self.back.row(y), self.front.row(y)) else {
                continue;
            };
            let span = usize::from(x0)..usize::from(x0 + region.width);
            if back_row[span.clone()] == front_row[span] {
                stats.cells_skipped += usize::from(region.width);
                continue;
            }

            for x in x0..x0 + region.width {
                let Some(&cell) = self.back.get(x, y) else {
                    continue;
                };
                if self.front.get(x, y) == Some(&cell) {
                    stats.cells_skipped += 1;
                    continue;
                }
                self.front.set(x, y, cell);
                self.writer.render_cell(&mut self.output, x, y, &cell);
                stats.cells_written += 1;
            }
        }
    }

    /// ANSI bytes produced by the last present.
    #[must_use]
    pub fn output_bytes(&self) -> &[u8] {
        self.output.as_bytes()
    }

    /// Write the last present's output to stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to stdout fails.
    pub fn flush(&mut self) -> io::Result<()> {
        self.output.flush_stdout()
    }

    /// Write the last present's output to `w`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `w` fails.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        self.output.flush_to(w)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Attr, Cell};
    use crate::color::CellColor;

    fn write(screen: &mut Screen, x: i32, y: i32, s: &str) {
        screen
            .back_mut()
            .put_str(x, y, s, CellColor::Default, CellColor::Default, Attr::empty());
    }

    fn settled(width: u16, height: u16) -> Screen {
        let mut s = Screen::new(width, height);
        s.present();
        s
    }

    #[test]
    fn first_present_is_full() {
        let mut s = Screen::new(3, 2);
        let stats = s.present();
        assert!(stats.full_redraw);
        assert_eq!(stats.cells_written, 6);
        let out = String::from_utf8(s.output_bytes().to_vec()).unwrap();
        assert!(out.contains("\x1b[2J"));
    }

    #[test]
    fn unmarked_paint_is_not_shown() {
        let mut s = settled(5, 1);
        write(&mut s, 0, 0, "abc");
        let stats = s.present();
        assert_eq!(stats.cells_written, 0);
        assert_eq!(s.front().row_text(0), "     ");
    }

    #[test]
    fn only_changed_cells_in_region_are_written() {
        let mut s = settled(6, 2);
        write(&mut s, 0, 0, "ab");
        s.mark_dirty(Rect::new(0, 0, 6, 2));
        let stats = s.present();
        assert_eq!(stats.cells_written, 2);
        assert_eq!(stats.cells_skipped, 10);
        assert_eq!(s.front().row_text(0), "ab    ");
    }

    #[test]
    fn region_outside_screen_is_dropped() {
        let mut s = settled(4, 4);
        s.mark_dirty(Rect::new(10, 10, 2, 2));
        s.mark_dirty(Rect::new(-5, 0, 2, 2));
        assert!(s.dirty_regions().is_empty());
    }

    #[test]
    fn region_is_clamped() {
        let mut s = settled(4, 4);
        s.mark_dirty(Rect::new(2, 3, 10, 10));
        assert_eq!(s.dirty_regions(), &[Rect::new(2, 3, 2, 1)]);
    }

    #[test]
    fn overlapping_regions_emit_once() {
        let mut s = settled(4, 1);
        write(&mut s, 0, 0, "wxyz");
        s.mark_dirty(Rect::new(0, 0, 3, 1));
        s.mark_dirty(Rect::new(1, 0, 3, 1));
        let stats = s.present();
        assert_eq!(stats.cells_written, 4);
        assert_eq!(stats.regions, 2);
    }

    #[test]
    fn unchanged_region_emits_no_bytes() {
        let mut s = settled(3, 1);
        s.mark_all_dirty();
        let stats = s.present();
        assert_eq!(stats.cells_written, 0);
        assert!(s.output_bytes().is_empty());
    }

    #[test]
    fn dirty_list_is_consumed() {
        let mut s = settled(2, 1);
        s.mark_all_dirty();
        s.present();
        assert!(s.dirty_regions().is_empty());
    }

    #[test]
    fn resize_forces_full_redraw() {
        let mut s = settled(2, 1);
        s.resize(3, 2);
        s.back_mut().set(2, 1, Cell::new('z'));
        let stats = s.present();
        assert!(stats.full_redraw);
        assert_eq!(s.front().row_text(1), "  z");
    }

    #[test]
    fn force_redraw_rewrites_everything() {
        let mut s = settled(2, 2);
        s.force_redraw();
        let stats = s.present();
        assert_eq!(stats.cells_written, 4);
    }

    #[test]
    fn flush_to_writes_output() {
        let mut s = settled(2, 1);
        write(&mut s, 0, 0, "q");
        s.mark_all_dirty();
        s.present();
        let mut sink = Vec::new();
        s.flush_to(&mut sink).unwrap();
        assert!(String::from_utf8(sink).unwrap().contains('q'));
    }
}
