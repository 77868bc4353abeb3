//! # piko-page — Page engine for the piko browser
//!
//! Everything between "here is a markup string" and "here is a grid of
//! characters with colors" lives in this crate:
//!
//! - **[`geom`]** — `Vec2`, the integer size/position pair used everywhere
//! - **[`element`]** — the node arena: `Tree`, `Element`, `Kind`, attributes
//! - **[`document`]** — `Document`: tree, links, actions, focus state
//! - **[`markup`]** — the XML page reader producing a `Document`
//! - **[`units`]** — size, padding, direction and alignment attributes
//! - **[`wrap`]** — word wrapping and preserved-line truncation
//! - **[`font`]** — the built-in big block font
//! - **[`resolve`]** — bottom-up size resolution
//! - **[`border`]** — box-drawing glyph sets
//! - **[`canvas`]** — the character/color/style grid pages are painted into
//! - **[`compose`]** — top-down painting of a document into a canvas
//! - **[`edit`]** — caret arithmetic and key editing on text values
//! - **[`script`]** — the evaluator and host interfaces used by page actions
//!
//! The crate never touches the terminal or the network. The browser binary
//! feeds it markup and key presses and copies the canvas onto the screen.

pub mod border;
pub mod canvas;
pub mod compose;
pub mod document;
pub mod edit;
pub mod element;
pub mod font;
pub mod geom;
pub mod markup;
pub mod resolve;
pub mod script;
pub mod units;
pub mod wrap;

pub use document::{Document, Focus};
pub use element::{Element, Kind, NodeId, Tree};
pub use geom::Vec2;
pub use markup::MarkupError;
pub use script::{Evaluator, ScriptError, ScriptHost};
