// SPDX-License-Identifier: MIT
//
// piko-term — terminal backend for the piko browser.
//
// A small, direct-to-ANSI terminal layer: raw mode through termios, a cell
// grid with an eight-color named palette, and a double-buffered screen that
// only copies and emits the rectangles a frame marked dirty. No TUI
// framework sits in between; every escape sequence is written here.
//
// The page engine (piko-page) paints into a `FrameBuffer`; the browser
// binary drives everything through the `App` trait and `EventLoop`.

pub mod ansi;
pub mod buffer;
pub mod cell;
pub mod color;
pub mod event_loop;
pub mod input;
pub mod output;
pub mod reader;
pub mod screen;
pub mod terminal;
