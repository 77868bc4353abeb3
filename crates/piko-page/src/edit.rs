//! Caret arithmetic and key editing on text values.
//!
//! One editor serves both the URL bar and page inputs: a value, a caret
//! offset counted in chars, and a flag for whether the value may span
//! lines. Editing goes through a [`ropey::Rope`] so that line/column
//! mapping and splicing are cheap and char-indexed.
//!
//! Only `\n` breaks lines. Page values never carry `\r`; the markup reader
//! normalizes line endings and pastes drop them.
//!
//! The caret is clamped into `[0, len]` before every operation, so a value
//! replaced behind the editor's back never leaves it out of range.

use ropey::Rope;

use crate::element::InputState;

/// Characters typed keys may insert.
pub const VALID_INPUT_CHARS: &str = " abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ1234567890!@#$%&*()-=_+[]{}\\|'\";:.>,</?`~";

#[must_use]
pub fn is_valid_input_char(ch: char) -> bool {
    VALID_INPUT_CHARS.contains(ch)
}

/// An editing key, already decoded from the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditKey {
    Left,
    Right,
    Up,
    Down,
    Backspace,
    Enter,
    Char(char),
    Paste(String),
}

/// What an edit asks of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// Nothing beyond a possible caret move.
    None,
    /// The value changed.
    Changed,
    /// Enter on a single-line value.
    Submit,
    /// Up on a single-line value: scroll the page instead.
    ScrollUp,
    /// Down on a single-line value: scroll the page instead.
    ScrollDown,
}

// ---------------------------------------------------------------------------
// Line / column mapping
// ---------------------------------------------------------------------------

/// Chars on `line`, not counting its `\n`.
fn line_content_len(rope: &Rope, line: usize) -> usize {
    let slice = rope.line(line);
    let len = slice.len_chars();
    if len > 0 && slice.char(len - 1) == '\n' { len - 1 } else { len }
}

/// `(line, column)` of a char offset. Offsets past the end map to the end.
///
/// ```
/// use piko_page::edit::line_col;
///
/// assert_eq!(line_col("ab\ncd", 4), (1, 1));
/// assert_eq!(line_col("ab\ncd", 2), (0, 2));
/// ```
#[must_use]
pub fn line_col(text: &str, offset: usize) -> (usize, usize) {
    let rope = Rope::from_str(text);
    rope_line_col(&rope, offset)
}

fn rope_line_col(rope: &Rope, offset: usize) -> (usize, usize) {
    let offset = offset.min(rope.len_chars());
    let line = rope.char_to_line(offset);
    (line, offset - rope.line_to_char(line))
}

/// Char offset of `(line, column)`, with the line clamped to the text and
/// the column clamped to the line's content.
#[must_use]
pub fn offset_of(text: &str, line: usize, col: usize) -> usize {
    rope_offset(&Rope::from_str(text), line, col)
}

fn rope_offset(rope: &Rope, line: usize, col: usize) -> usize {
    let line = line.min(rope.len_lines().saturating_sub(1));
    rope.line_to_char(line) + col.min(line_content_len(rope, line))
}

// ---------------------------------------------------------------------------
// Editing
// ---------------------------------------------------------------------------

/// Apply `key` to `value` with the caret at `cursor`.
///
/// Single-line values submit on Enter and hand Up/Down back as scrolling;
/// multi-line values insert a newline on Enter and move between lines,
/// keeping the column where the target line allows.
pub fn apply(value: &mut String, cursor: &mut usize, key: &EditKey, multiline: bool) -> EditOutcome {
    let mut rope = Rope::from_str(value);
    let len = rope.len_chars();
    let caret = (*cursor).min(len);

    let (caret, outcome) = match key {
        EditKey::Left => (caret.saturating_sub(1), EditOutcome::None),
        EditKey::Right => ((caret + 1).min(len), EditOutcome::None),
        EditKey::Up | EditKey::Down if multiline => {
            let (line, col) = rope_line_col(&rope, caret);
            let target = match key {
                EditKey::Up => line.checked_sub(1),
                _ => Some(line + 1).filter(|&l| l < rope.len_lines()),
            };
            let caret = target.map_or(caret, |l| rope_offset(&rope, l, col));
            (caret, EditOutcome::None)
        }
        EditKey::Up => (caret, EditOutcome::ScrollUp),
        EditKey::Down => (caret, EditOutcome::ScrollDown),
        EditKey::Backspace if caret > 0 => {
            rope.remove(caret - 1..caret);
            (caret - 1, EditOutcome::Changed)
        }
        EditKey::Backspace => (caret, EditOutcome::None),
        EditKey::Enter if multiline => {
            rope.insert_char(caret, '\n');
            (caret + 1, EditOutcome::Changed)
        }
        EditKey::Enter => (caret, EditOutcome::Submit),
        EditKey::Char(ch) if is_valid_input_char(*ch) => {
            rope.insert_char(caret, *ch);
            (caret + 1, EditOutcome::Changed)
        }
        EditKey::Char(_) => (caret, EditOutcome::None),
        EditKey::Paste(text) => {
            let clean: String = text
                .chars()
                .filter(|c| !matches!(c, '\t' | '\n' | '\r'))
                .collect();
            if clean.is_empty() {
                (caret, EditOutcome::None)
            } else {
                rope.insert(caret, &clean);
                (caret + clean.chars().count(), EditOutcome::Changed)
            }
        }
    };

    if outcome == EditOutcome::Changed {
        *value = rope.to_string();
    }
    *cursor = caret;
    outcome
}

impl InputState {
    /// Apply an editing key to this input's value and caret.
    pub fn edit(&mut self, key: &EditKey, multiline: bool) -> EditOutcome {
        apply(&mut self.value, &mut self.cursor, key, multiline)
    }
}
