//! A loaded page: its element tree plus everything the browser needs to
//! drive it.
//!
//! The document owns the focus state machine. Focus is one of three
//! states: nothing focused, the URL bar, or the `i`-th input of the *focus
//! list* (every input in pre-order). The focus list is recomputed each time
//! it is needed, so a tree mutation can never leave a stale list behind.
//! At most one input carries its `focused` flag, and only while focus is
//! `Element(i)` for that input.

use piko_term::color::Color;

use crate::element::{Element, NodeId, Tree};
use crate::geom::Vec2;
use crate::resolve::document_size;

/// A named block of script code. The code is handed to the evaluator as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub name: String,
    pub code: String,
}

/// What activating a link does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// Navigate to a URL, relative to the current page.
    Url(String),
    /// Run the named action.
    Submit(String),
}

/// A link reachable from the keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub key: char,
    pub target: LinkTarget,
    pub node: NodeId,
}

/// Who owns the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Focus {
    #[default]
    Unfocused,
    UrlBar,
    /// Index into the focus list.
    Element(usize),
}

#[derive(Debug, Clone)]
pub struct Document {
    pub tree: Tree,
    pub links: Vec<Link>,
    pub actions: Vec<Action>,
    pub has_inputs: bool,
    /// Page color names; unknown names fall back to black on white.
    pub background: String,
    pub foreground: String,
    focus: Focus,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            tree: Tree::new(),
            links: Vec::new(),
            actions: Vec::new(),
            has_inputs: false,
            background: Color::Black.name().to_owned(),
            foreground: Color::White.name().to_owned(),
            focus: Focus::Unfocused,
        }
    }
}

impl Document {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A page showing nothing but `message`.
    #[must_use]
    pub fn with_message(message: &str) -> Self {
        let mut doc = Self::default();
        doc.tree.push(None, Element::text(message));
        doc
    }

    #[must_use]
    pub fn background(&self) -> Option<Color> {
        Some(Color::from_name(&self.background).unwrap_or(Color::Black))
    }

    #[must_use]
    pub fn foreground(&self) -> Option<Color> {
        Some(Color::from_name(&self.foreground).unwrap_or(Color::White))
    }

    /// Full size of the page laid out in `viewport`.
    #[must_use]
    pub fn size(&self, viewport: Vec2) -> Vec2 {
        document_size(&self.tree, viewport)
    }

    // ── Links and actions ────────────────────────────────────────────────

    /// Register the link element `node`. Links need a single-digit `key`
    /// and either a `url` or a `submit` attribute; anything else is
    /// skipped. Returns whether the link was registered.
    pub fn add_link(&mut self, node: NodeId) -> bool {
        let el = &self.tree[node];
        let key = match el.attr("key").map(|k| k.chars().collect::<Vec<_>>()) {
            Some(chars) if chars.len() == 1 && chars[0].is_ascii_digit() => chars[0],
            _ => return false,
        };
        let target = match (el.attr("url"), el.attr("submit")) {
            (Some(url), _) => LinkTarget::Url(url.to_owned()),
            (None, Some(action)) => LinkTarget::Submit(action.to_owned()),
            (None, None) => return false,
        };
        self.links.push(Link { key, target, node });
        true
    }

    /// First link bound to `key`. Only `0`-`9` can match.
    #[must_use]
    pub fn find_link(&self, key: char) -> Option<&Link> {
        if !key.is_ascii_digit() {
            return None;
        }
        self.links.iter().find(|l| l.key == key)
    }

    #[must_use]
    pub fn find_action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }

    /// The action an element names in its `attr` attribute (`submit` or
    /// `change`), if both the attribute and the action exist.
    #[must_use]
    pub fn element_action(&self, node: NodeId, attr: &str) -> Option<&Action> {
        self.tree
            .get(node)
            .and_then(|el| el.attr(attr))
            .and_then(|name| self.find_action(name))
    }

    /// A document-level action such as `[start]`.
    #[must_use]
    pub fn document_action(&self, name: &str) -> Option<&Action> {
        self.find_action(&format!("[{name}]"))
    }

    // ── Elements by id ───────────────────────────────────────────────────

    #[must_use]
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree.find_by_id(id)
    }

    /// Replace the value of the element with `id`. Returns `false` when
    /// there is no such element or it holds no value.
    pub fn set_value(&mut self, id: &str, value: &str) -> bool {
        match self.find_by_id(id) {
            Some(node) => self.tree[node].set_value(value),
            None => false,
        }
    }

    // ── Focus ────────────────────────────────────────────────────────────

    #[must_use]
    pub const fn focus(&self) -> Focus {
        self.focus
    }

    /// Every input, in pre-order.
    #[must_use]
    pub fn focus_list(&self) -> Vec<NodeId> {
        self.tree
            .preorder()
            .into_iter()
            .filter(|&id| self.tree[id].is_input())
            .collect()
    }

    /// The focused input, if focus is on one that still exists.
    #[must_use]
    pub fn focused_element(&self) -> Option<NodeId> {
        match self.focus {
            Focus::Element(i) => self.focus_list().get(i).copied(),
            _ => None,
        }
    }

    fn clear_flags(&mut self) {
        for id in self.focus_list() {
            if let Some(state) = self.tree[id].input_mut() {
                state.focused = false;
            }
        }
    }

    /// Drop focus everywhere.
    pub fn unfocus(&mut self) {
        self.clear_flags();
        self.focus = Focus::Unfocused;
    }

    /// Hand the keyboard to the URL bar.
    pub fn focus_url_bar(&mut self) {
        self.clear_flags();
        self.focus = Focus::UrlBar;
    }

    /// Focus the `index`-th input with its caret at the end. Out-of-range
    /// indices leave focus unchanged and return `false`.
    pub fn focus_element(&mut self, index: usize) -> bool {
        let list = self.focus_list();
        let Some(&id) = list.get(index) else {
            return false;
        };
        self.clear_flags();
        if let Some(state) = self.tree[id].input_mut() {
            state.focused = true;
            state.cursor_to_end();
        }
        self.focus = Focus::Element(index);
        true
    }

    /// Tab: move focus to the next input, cycling through the URL bar.
    pub fn focus_next(&mut self) {
        match self.focus {
            Focus::UrlBar | Focus::Unfocused => {
                if !self.focus_element(0) {
                    self.focus_url_bar();
                }
            }
            Focus::Element(i) => {
                if !self.focus_element(i + 1) {
                    self.focus_url_bar();
                }
            }
        }
    }
}
