//! The page reader: XML markup to [`Document`].
//!
//! A page is an XML document rooted at `<piko type="m100_xml">`. The root
//! may carry `background` and `foreground` color names. Its children are
//! either `<action name="...">code</action>` blocks or elements; elements
//! nest freely. Unknown tags are skipped together with everything inside
//! them.
//!
//! ```xml
//! <piko type="m100_xml" background="blue">
//!   <action name="[start]">debug("hello")</action>
//!   <container border="thin" padding="1">
//!     <text style="bold">Search</text>
//!     <input id="q" submit="go" initial="piko"/>
//!     <link key="1" url="piko://help">Help</link>
//!   </container>
//!   <action name="go">visit("https://example.com/?q=" .. encode(value))</action>
//! </piko>
//! ```
//!
//! Reading never panics on bad input. [`parse`] reports what went wrong;
//! [`load`] turns the failure into a one-line message page.

use thiserror::Error;
use tracing::debug;

use crate::document::{Action, Document};
use crate::element::{Element, InputState, Kind, NodeId};

/// The only page format this reader understands.
pub const PAGE_TYPE: &str = "m100_xml";

/// Why a page could not be read. Lines are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
    #[error("Line {line}: XML Parse Error: {message}")]
    Syntax { line: u32, message: String },

    #[error("Line {line}: XML file must have a <piko> root element")]
    MissingRoot { line: u32 },

    #[error("Line {line}: Unsupported piko type: {kind}")]
    UnsupportedType { line: u32, kind: String },
}

/// Read a page, falling back to a message page on failure.
#[must_use]
pub fn load(source: &str) -> Document {
    parse(source).unwrap_or_else(|err| {
        debug!(%err, "page markup rejected");
        Document::with_message(&err.to_string())
    })
}

/// Read a page.
///
/// # Errors
///
/// Returns a [`MarkupError`] when the text is not well-formed XML, when the
/// root element is not `<piko>`, or when its `type` is not
/// [`PAGE_TYPE`].
pub fn parse(source: &str) -> Result<Document, MarkupError> {
    let normalized = source.replace("\r\n", "\n").replace('\r', "\n");
    let xml = roxmltree::Document::parse(&normalized).map_err(|e| MarkupError::Syntax {
        line: e.pos().row,
        message: e.to_string(),
    })?;

    let root = xml.root_element();
    let line = xml.text_pos_at(root.range().start).row;
    if root.tag_name().name() != "piko" {
        return Err(MarkupError::MissingRoot { line });
    }
    match root.attribute("type") {
        Some(PAGE_TYPE) => {}
        other => {
            return Err(MarkupError::UnsupportedType {
                line,
                kind: other.unwrap_or("None").to_owned(),
            });
        }
    }

    let mut doc = Document::new();
    if let Some(bg) = root.attribute("background").filter(|s| !s.is_empty()) {
        bg.clone_into(&mut doc.background);
    }
    if let Some(fg) = root.attribute("foreground").filter(|s| !s.is_empty()) {
        fg.clone_into(&mut doc.foreground);
    }

    for child in root.children().filter(roxmltree::Node::is_element) {
        if child.tag_name().name() == "action" {
            let name = child.attribute("name").unwrap_or_default();
            let code = child.text().map(str::trim).unwrap_or_default();
            if !name.is_empty() && !code.is_empty() {
                doc.actions.push(Action {
                    name: name.to_owned(),
                    code: code.to_owned(),
                });
            }
        } else {
            read_element(child, None, &mut doc);
        }
    }

    debug!(
        nodes = doc.tree.len(),
        links = doc.links.len(),
        actions = doc.actions.len(),
        "page parsed"
    );
    Ok(doc)
}

/// Add `node` and its subtree under `parent`. Unknown tags add nothing.
fn read_element(node: roxmltree::Node<'_, '_>, parent: Option<NodeId>, doc: &mut Document) {
    let Some(mut kind) = Kind::from_tag(node.tag_name().name()) else {
        return;
    };

    let preserve = node.attribute("preserve") == Some("true");
    let text = node.text().unwrap_or_default();
    match &mut kind {
        Kind::Text { value } => {
            *value = if preserve { text.to_owned() } else { text.trim().to_owned() };
        }
        Kind::Link { value } => text.trim().clone_into(value),
        Kind::Input(state) => {
            *state = InputState::new(node.attribute("initial").unwrap_or_default());
            doc.has_inputs = true;
        }
        _ => {}
    }

    let mut element = Element::new(kind);
    for attr in node.attributes() {
        element.set_attr(attr.name(), attr.value());
    }
    let is_link = matches!(element.kind, Kind::Link { .. });
    let id = doc.tree.push(parent, element);
    if is_link {
        doc.add_link(id);
    }

    for child in node.children().filter(roxmltree::Node::is_element) {
        read_element(child, Some(id), doc);
    }
}
