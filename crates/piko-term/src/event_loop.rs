// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Event loop — fixed-rate frames over a channel of input events.
//
// The input thread sends parsed events; the loop blocks on the channel
// with a timeout equal to one frame (60 Hz by default). Each wake-up:
//
//   1. drain every queued event into the app,
//   2. pick up a pending resize (SIGWINCH sets an atomic flag),
//   3. tick the app (background work hand-offs land here),
//   4. let the app paint into the screen's back buffer,
//   5. present the dirty regions and flush if anything was emitted.
//
// All app state is touched from this one thread, so the app needs no
// locking; anything produced elsewhere reaches it through `on_tick`.
//
// The app decides whether a frame actually changed (it fingerprints its
// own state). The loop only says when a repaint is forced: the first
// frame and every resize.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use crate::input::Event;
use crate::reader::InputReader;
use crate::screen::Screen;
use crate::terminal::{Size, Terminal};

// ─── SIGWINCH ────────────────────────────────────────────────────────────────

static SIGWINCH_RECEIVED: AtomicBool = AtomicBool::new(false);

#[cfg(unix)]
fn install_sigwinch_handler() {
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = sigwinch_handler as *const () as usize;
        sa.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&raw mut sa.sa_mask);
        libc::sigaction(libc::SIGWINCH, &raw const sa, std::ptr::null_mut());
    }
}

#[cfg(unix)]
extern "C" fn sigwinch_handler(_sig: libc::c_int) {
    SIGWINCH_RECEIVED.store(true, Ordering::Relaxed);
}

#[cfg(not(unix))]
fn install_sigwinch_handler() {}

// ─── App Trait ───────────────────────────────────────────────────────────────

/// What the app wants after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
}

/// A full-screen application driven by [`EventLoop`].
///
/// Per frame the loop calls [`on_event`](App::on_event) for each queued
/// event, [`on_resize`](App::on_resize) if the terminal changed size,
/// [`on_tick`](App::on_tick) once, then [`paint`](App::paint).
pub trait App {
    /// Handle one input event. Return [`Action::Quit`] to stop the loop.
    fn on_event(&mut self, _event: &Event) -> Action {
        Action::Continue
    }

    /// The screen has already been resized when this is called.
    fn on_resize(&mut self, _size: Size) {}

    /// Called once per frame, input or not. Returning [`Action::Quit`]
    /// stops the loop.
    fn on_tick(&mut self) -> Action {
        Action::Continue
    }

    /// Paint into `screen.back_mut()` and mark what changed. `force` is set
    /// on the first frame and after a resize; the app must then repaint
    /// and mark everything.
    fn paint(&mut self, screen: &mut Screen, force: bool);
}

// ─── Config ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct LoopConfig {
    /// Frame interval in microseconds.
    pub tick_interval_us: u64,
}

impl LoopConfig {
    /// Interval for a target frame rate. Zero is treated as one frame per
    /// second.
    #[must_use]
    pub fn from_fps(fps: u32) -> Self {
        Self {
            tick_interval_us: 1_000_000 / u64::from(fps.max(1)),
        }
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self::from_fps(60)
    }
}

// ─── Frame Step ──────────────────────────────────────────────────────────────

/// Run one frame's worth of app callbacks against `screen`: events, tick,
/// paint, present. The caller flushes.
pub fn run_frame(
    app: &mut impl App,
    screen: &mut Screen,
    events: impl IntoIterator<Item = Event>,
    force: bool,
) -> Action {
    for event in events {
        if app.on_event(&event) == Action::Quit {
            return Action::Quit;
        }
    }
    if app.on_tick() == Action::Quit {
        return Action::Quit;
    }
    app.paint(screen, force);
    screen.present();
    Action::Continue
}

// ─── EventLoop ───────────────────────────────────────────────────────────────

/// Owns the terminal and the screen; [`run`](Self::run) blocks until the
/// app quits.
///
/// ```no_run
/// use piko_term::event_loop::{App, EventLoop};
/// use piko_term::screen::Screen;
///
/// struct Blank;
///
/// impl App for Blank {
///     fn paint(&mut self, screen: &mut Screen, force: bool) {
///         if force {
///             screen.mark_all_dirty();
///         }
///     }
/// }
///
/// EventLoop::new().run(&mut Blank)?;
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct EventLoop {
    terminal: Terminal,
    config: LoopConfig,
}

impl EventLoop {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(LoopConfig::default())
    }

    #[must_use]
    pub fn with_config(config: LoopConfig) -> Self {
        Self {
            terminal: Terminal::new(),
            config,
        }
    }

    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.terminal.size()
    }

    /// Enter the terminal, run frames until the app quits, restore.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal setup, output, or teardown fails.
    pub fn run(&mut self, app: &mut impl App) -> io::Result<()> {
        self.terminal.enter()?;
        install_sigwinch_handler();

        let result = InputReader::spawn().and_then(|(mut reader, rx)| {
            let r = self.run_inner(app, &rx);
            reader.stop();
            r
        });

        self.terminal.leave()?;
        result
    }

    fn run_inner(&mut self, app: &mut impl App, rx: &Receiver<Event>) -> io::Result<()> {
        let size = self.terminal.size();
        let mut screen = Screen::new(size.cols, size.rows);
        app.on_resize(size);
        let mut force = true;
        let timeout = Duration::from_micros(self.config.tick_interval_us);

        loop {
            let mut events = Vec::new();
            match rx.recv_timeout(timeout) {
                Ok(event) => {
                    events.push(event);
                    events.extend(rx.try_iter());
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return Ok(()),
            }

            if SIGWINCH_RECEIVED.swap(false, Ordering::Relaxed) {
                let new_size = self.terminal.refresh_size();
                screen.resize(new_size.cols, new_size.rows);
                app.on_resize(new_size);
                force = true;
            }

            if run_frame(app, &mut screen, events, force) == Action::Quit {
                return Ok(());
            }
            force = false;
            screen.flush()?;
        }
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Rect;
    use crate::cell::Attr;
    use crate::color::CellColor;
    use crate::input::{KeyCode, KeyEvent};

    #[derive(Default)]
    struct Recorder {
        keys: Vec<KeyCode>,
        ticks: usize,
        paints: Vec<bool>,
        quit_on: Option<KeyCode>,
    }

    impl App for Recorder {
        fn on_event(&mut self, event: &Event) -> Action {
            if let Event::Key(k) = event {
                self.keys.push(k.code);
                if Some(k.code) == self.quit_on {
                    return Action::Quit;
                }
            }
            Action::Continue
        }

        fn on_tick(&mut self) -> Action {
            self.ticks += 1;
            Action::Continue
        }

        fn paint(&mut self, screen: &mut Screen, force: bool) {
            self.paints.push(force);
            screen
                .back_mut()
                .put_str(0, 0, "hi", CellColor::Default, CellColor::Default, Attr::empty());
            screen.mark_dirty(Rect::new(0, 0, 2, 1));
        }
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::plain(code))
    }

    #[test]
    fn frame_runs_events_tick_and_paint() {
        let mut app = Recorder::default();
        let mut screen = Screen::new(4, 1);
        let action = run_frame(&mut app, &mut screen, vec![key(KeyCode::Tab), key(KeyCode::Enter)], true);
        assert_eq!(action, Action::Continue);
        assert_eq!(app.keys, vec![KeyCode::Tab, KeyCode::Enter]);
        assert_eq!(app.ticks, 1);
        assert_eq!(app.paints, vec![true]);
        assert_eq!(screen.front().row_text(0), "hi  ");
    }

    #[test]
    fn quit_stops_before_paint() {
        let mut app = Recorder {
            quit_on: Some(KeyCode::Escape),
            ..Recorder::default()
        };
        let mut screen = Screen::new(4, 1);
        let action = run_frame(
            &mut app,
            &mut screen,
            vec![key(KeyCode::Escape), key(KeyCode::Tab)],
            false,
        );
        assert_eq!(action, Action::Quit);
        assert_eq!(app.keys, vec![KeyCode::Escape]);
        assert!(app.paints.is_empty());
    }

    #[test]
    fn loop_config_from_fps() {
        assert_eq!(LoopConfig::from_fps(60).tick_interval_us, 16_666);
        assert_eq!(LoopConfig::from_fps(0).tick_interval_us, 1_000_000);
        assert_eq!(LoopConfig::default().tick_interval_us, 16_666);
    }
}
