// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Background input thread — stdin bytes in, parsed events out.
//
// The thread owns the input `Parser`. It polls stdin with a short timeout,
// feeds whatever arrives to the parser, and sends each event down a
// channel. A poll that times out with bytes still pending resolves the
// lone-ESC ambiguity by flushing the parser, so the render loop only ever
// sees complete events and never touches parser state.
//
// Shutdown: the stop flag is checked between polls, so `stop()` returns
// within one poll interval.

#[cfg(unix)]
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::input::{Event, Parser};

const READ_BUF_SIZE: usize = 4096;

/// Poll interval, which is also how long a lone ESC waits before it
/// counts as the Escape key.
const POLL_TIMEOUT_MS: i32 = 25;

/// Handle to the input thread. Dropping it stops the thread.
///
/// ```no_run
/// use piko_term::reader::InputReader;
///
/// let (reader, events) = InputReader::spawn()?;
/// while let Ok(event) = events.recv() {
///     println!("{event:?}");
/// }
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct InputReader {
    handle: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
}

impl InputReader {
    /// Start the input thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS refuses to spawn the thread.
    pub fn spawn() -> std::io::Result<(Self, Receiver<Event>)> {
        let (tx, rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("piko-input".into())
            .spawn(move || reader_loop(&tx, &stop_flag))?;

        Ok((
            Self {
                handle: Some(handle),
                stop,
            },
            rx,
        ))
    }

    /// Signal the thread and join it. Idempotent.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for InputReader {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Send every event; `false` once the receiver is gone.
fn send_all(tx: &Sender<Event>, events: Vec<Event>) -> bool {
    events.into_iter().all(|e| tx.send(e).is_ok())
}

#[cfg(unix)]
fn reader_loop(tx: &Sender<Event>, stop: &AtomicBool) {
    use std::os::unix::io::AsRawFd;

    let stdin_fd = io::stdin().as_raw_fd();
    let mut buf = [0u8; READ_BUF_SIZE];
    let mut parser = Parser::new();

    while !stop.load(Ordering::Relaxed) {
        let ready = unsafe {
            let mut pfd = libc::pollfd {
                fd: stdin_fd,
                events: libc::POLLIN,
                revents: 0,
            };
            libc::poll(&raw mut pfd, 1, POLL_TIMEOUT_MS)
        };

        if ready <= 0 {
            if parser.has_pending() && !send_all(tx, parser.flush()) {
                break;
            }
            continue;
        }

        let n = unsafe { libc::read(stdin_fd, buf.as_mut_ptr().cast(), buf.len()) };
        if n <= 0 {
            break;
        }

        #[allow(clippy::cast_sign_loss)]
        let events = parser.advance(&buf[..n as usize]);
        if !send_all(tx, events) {
            break;
        }
    }
}

#[cfg(not(unix))]
fn reader_loop(tx: &Sender<Event>, stop: &AtomicBool) {
    use std::io::Read;

    let stdin = std::io::stdin();
    let mut buf = [0u8; READ_BUF_SIZE];
    let mut parser = Parser::new();

    while !stop.load(Ordering::Relaxed) {
        match stdin.lock().read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let mut events = parser.advance(&buf[..n]);
                events.extend(parser.flush());
                if !send_all(tx, events) {
                    break;
                }
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
