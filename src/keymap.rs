// SPDX-License-Identifier: MIT
//
// Key map — terminal events to browser commands, per focus state.
//
//   Unfocused   `  quit           Alt+K  debug overlay    Tab  next input
//               Esc  URL bar      Up/Down  scroll         0-9  follow link
//
//   URL bar     editing keys      Alt+V  paste clipboard  Enter  open
//               Esc  leave        Tab  next input
//
//   Input       editing keys      Esc / Alt+Q  leave      Tab  next input
//
// Editing keys are Left, Right, Up, Down, Backspace, Enter, printable
// characters and bracketed paste. The map is pure; the browser decides
// what each command does.

use piko_page::edit::EditKey;
use piko_page::Focus;
use piko_term::input::{Event, KeyCode, KeyEvent, Modifiers};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    ToggleDebug,
    FocusNext,
    FocusUrlBar,
    Unfocus,
    /// Scroll the page by this many rows.
    Scroll(i32),
    /// Activate the link bound to this digit.
    FollowLink(char),
    /// Paste the system clipboard into the URL bar.
    PasteClipboard,
    Edit(EditKey),
}

/// The command for `event` under `focus`, `None` if the key does nothing.
#[must_use]
pub fn command(focus: Focus, event: &Event) -> Option<Command> {
    match event {
        Event::Paste(text) => match focus {
            Focus::Unfocused => None,
            Focus::UrlBar | Focus::Element(_) => Some(Command::Edit(EditKey::Paste(text.clone()))),
        },
        Event::Key(key) => match focus {
            Focus::Unfocused => browsing(key),
            Focus::UrlBar => url_bar(key),
            Focus::Element(_) => element(key),
        },
    }
}

fn browsing(key: &KeyEvent) -> Option<Command> {
    if key.is_alt('k') {
        return Some(Command::ToggleDebug);
    }
    if !key.modifiers.is_empty() {
        return None;
    }
    match key.code {
        KeyCode::Char('`') => Some(Command::Quit),
        KeyCode::Tab => Some(Command::FocusNext),
        KeyCode::Escape => Some(Command::FocusUrlBar),
        KeyCode::Up => Some(Command::Scroll(-1)),
        KeyCode::Down => Some(Command::Scroll(1)),
        KeyCode::Char(c) if c.is_ascii_digit() => Some(Command::FollowLink(c)),
        _ => None,
    }
}

fn url_bar(key: &KeyEvent) -> Option<Command> {
    if key.is_alt('v') {
        return Some(Command::PasteClipboard);
    }
    match key.code {
        KeyCode::Escape => Some(Command::Unfocus),
        KeyCode::Tab => Some(Command::FocusNext),
        _ => edit_key(key).map(Command::Edit),
    }
}

fn element(key: &KeyEvent) -> Option<Command> {
    if key.is_alt('q') {
        return Some(Command::Unfocus);
    }
    match key.code {
        KeyCode::Escape => Some(Command::Unfocus),
        KeyCode::Tab => Some(Command::FocusNext),
        _ => edit_key(key).map(Command::Edit),
    }
}

/// Editing keys. Alt and Ctrl chords never type; Shift may.
fn edit_key(key: &KeyEvent) -> Option<EditKey> {
    if key.modifiers.intersects(Modifiers::ALT | Modifiers::CTRL) {
        return None;
    }
    Some(match key.code {
        KeyCode::Left => EditKey::Left,
        KeyCode::Right => EditKey::Right,
        KeyCode::Up => EditKey::Up,
        KeyCode::Down => EditKey::Down,
        KeyCode::Backspace => EditKey::Backspace,
        KeyCode::Enter => EditKey::Enter,
        KeyCode::Char(c) => EditKey::Char(c),
        _ => return None,
    })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
