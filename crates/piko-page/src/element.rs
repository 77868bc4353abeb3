//! Page elements and the arena that owns them.
//!
//! A page is a forest of typed nodes. All nodes live in one `Tree` arena and
//! refer to each other by [`NodeId`]: a node owns its children through the
//! order of its `children` list, and keeps a non-owning `parent` id that is
//! only a lookup aid. Nothing walks the tree upward to decide layout or
//! paint order.
//!
//! Element kinds are a closed set. Each variant carries only the payload it
//! needs: text and links carry their string, inputs carry the editable value
//! with its caret and focus flag, everything else carries nothing.

use std::ops::{Index, IndexMut};

// ---------------------------------------------------------------------------
// Identifiers and attributes
// ---------------------------------------------------------------------------

/// Index of a node inside its [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// One `name="value"` pair. Names are not unique; lookups take the first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

/// Editable state of an `input` element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct InputState {
    /// Current content. May contain `\n` in multi-line inputs.
    pub value: String,
    /// Caret position as a char offset into `value`.
    pub cursor: usize,
    /// True while this input owns the keyboard.
    pub focused: bool,
}

impl InputState {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            cursor: 0,
            focused: false,
        }
    }

    /// Length of the value in chars.
    #[must_use]
    pub fn len(&self) -> usize {
        self.value.chars().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Put the caret after the last character.
    pub fn cursor_to_end(&mut self) {
        self.cursor = self.len();
    }
}

/// What an element is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Box that stacks its children along a direction.
    Container,
    /// Wrapped run of text.
    Text { value: String },
    /// Text with an activation key, rendered as `[k] value`.
    Link { value: String },
    /// Bordered editable field.
    Input(InputState),
    /// One empty cell of vertical space.
    LineBreak,
    /// Grid of rows and cells with a drawn border.
    Table,
    /// A table row; its children are cells.
    Row,
    /// A table cell; laid out like a border-less container.
    Cell,
}

impl Kind {
    /// The markup tag for this kind.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Container => "container",
            Self::Text { .. } => "text",
            Self::Link { .. } => "link",
            Self::Input(_) => "input",
            Self::LineBreak => "br",
            Self::Table => "table",
            Self::Row => "row",
            Self::Cell => "cell",
        }
    }

    /// An empty kind for a markup tag, `None` for unknown tags.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "container" => Self::Container,
            "text" => Self::Text {
                value: String::new(),
            },
            "link" => Self::Link {
                value: String::new(),
            },
            "input" => Self::Input(InputState::default()),
            "br" => Self::LineBreak,
            "table" => Self::Table,
            "row" => Self::Row,
            "cell" => Self::Cell,
            _ => return None,
        })
    }
}

// ---------------------------------------------------------------------------
// Element
// ---------------------------------------------------------------------------

/// One node of a page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Element {
    pub kind: Kind,
    pub attributes: Vec<Attribute>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl Element {
    #[must_use]
    pub const fn new(kind: Kind) -> Self {
        Self {
            kind,
            attributes: Vec::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    /// A text element holding `value`.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::new(Kind::Text {
            value: value.into(),
        })
    }

    /// Builder form of [`set_attr`](Self::set_attr).
    #[must_use]
    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Append an attribute. An earlier attribute with the same name keeps
    /// winning lookups.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        self.attributes.push(Attribute {
            name: name.to_owned(),
            value: value.to_owned(),
        });
    }

    /// First attribute named `name`. The empty name never matches.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        if name.is_empty() {
            return None;
        }
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The string payload of text, link and input elements.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        match &self.kind {
            Kind::Text { value } | Kind::Link { value } => Some(value),
            Kind::Input(state) => Some(&state.value),
            _ => None,
        }
    }

    /// Replace the string payload. Returns `false` for kinds without one.
    /// An input's caret is clamped into the new value.
    pub fn set_value(&mut self, new: &str) -> bool {
        match &mut self.kind {
            Kind::Text { value } | Kind::Link { value } => {
                new.clone_into(value);
                true
            }
            Kind::Input(state) => {
                new.clone_into(&mut state.value);
                state.cursor = state.cursor.min(state.len());
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub const fn input(&self) -> Option<&InputState> {
        match &self.kind {
            Kind::Input(state) => Some(state),
            _ => None,
        }
    }

    pub const fn input_mut(&mut self) -> Option<&mut InputState> {
        match &mut self.kind {
            Kind::Input(state) => Some(state),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_input(&self) -> bool {
        matches!(self.kind, Kind::Input(_))
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// Arena owning every element of a page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Tree {
    nodes: Vec<Element>,
    roots: Vec<NodeId>,
}

impl Tree {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            nodes: Vec::new(),
            roots: Vec::new(),
        }
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add `element` as the last child of `parent`, or as the last root.
    ///
    /// # Panics
    ///
    /// Panics if `parent` does not belong to this tree.
    pub fn push(&mut self, parent: Option<NodeId>, mut element: Element) -> NodeId {
        let id = NodeId(self.nodes.len());
        element.parent = parent;
        element.children.clear();
        self.nodes.push(element);
        match parent {
            Some(p) => self.nodes[p.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Element> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        self.nodes.get_mut(id.0)
    }

    /// Top-level elements in document order.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Children of `id`; empty for unknown ids.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], Element::children)
    }

    /// Every node, parents before children, siblings in order.
    #[must_use]
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// First node in pre-order whose `id` attribute equals `id`.
    #[must_use]
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.preorder()
            .into_iter()
            .find(|&n| self[n].attr("id") == Some(id))
    }

    /// Parent, grandparent, ... of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.get(id).and_then(Element::parent), |&p| {
            self.get(p).and_then(Element::parent)
        })
    }
}

impl Index<NodeId> for Tree {
    type Output = Element;

    fn index(&self, id: NodeId) -> &Element {
        &self.nodes[id.0]
    }
}

impl IndexMut<NodeId> for Tree {
    fn index_mut(&mut self, id: NodeId) -> &mut Element {
        &mut self.nodes[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> (Tree, NodeId, NodeId, NodeId) {
        let mut tree = Tree::new();
        let root = tree.push(None, Element::new(Kind::Container).with_attr("id", "outer"));
        let text = tree.push(Some(root), Element::text("hi"));
        let input = tree.push(
            Some(root),
            Element::new(Kind::Input(InputState::new("abc"))).with_attr("id", "name"),
        );
        (tree, root, text, input)
    }

    #[test]
    fn first_attribute_wins() {
        let el = Element::new(Kind::Container)
            .with_attr("width", "10")
            .with_attr("width", "20");
        assert_eq!(el.attr("width"), Some("10"));
        assert_eq!(el.attr("height"), None);
        assert_eq!(el.attr(""), None);
    }

    #[test]
    fn push_links_parent_and_children() {
        let (tree, root, text, input) = sample();
        assert_eq!(tree.roots(), &[root]);
        assert_eq!(tree.children(root), &[text, input]);
        assert_eq!(tree[text].parent(), Some(root));
        assert_eq!(tree[root].parent(), None);
    }

    #[test]
    fn preorder_visits_parents_first() {
        let mut tree = Tree::new();
        let a = tree.push(None, Element::new(Kind::Container));
        let b = tree.push(Some(a), Element::new(Kind::Container));
        let c = tree.push(Some(b), Element::text("c"));
        let d = tree.push(Some(a), Element::text("d"));
        let e = tree.push(None, Element::text("e"));
        assert_eq!(tree.preorder(), vec![a, b, c, d, e]);
    }

    #[test]
    fn find_by_id_and_ancestors() {
        let (tree, root, _, input) = sample();
        assert_eq!(tree.find_by_id("name"), Some(input));
        assert_eq!(tree.find_by_id("outer"), Some(root));
        assert_eq!(tree.find_by_id("missing"), None);
        assert_eq!(tree.ancestors(input).collect::<Vec<_>>(), vec![root]);
        assert_eq!(tree.ancestors(root).count(), 0);
    }

    #[test]
    fn set_value_clamps_input_caret() {
        let (mut tree, root, text, input) = sample();
        tree[input].input_mut().unwrap().cursor = 3;
        assert!(tree[input].set_value("x"));
        assert_eq!(tree[input].input().unwrap().cursor, 1);
        assert!(tree[text].set_value("bye"));
        assert_eq!(tree[text].value(), Some("bye"));
        assert!(!tree[root].set_value("nope"));
    }

    #[test]
    fn tags_round_trip() {
        for tag in ["container", "text", "link", "input", "br", "table", "row", "cell"] {
            assert_eq!(Kind::from_tag(tag).unwrap().tag(), tag);
        }
        assert_eq!(Kind::from_tag("div"), None);
    }
}
