//! Canonical screen schema shared by template producers and the interpreter.
//!
//! ```text
//! ScreenDocument
//!   └── components: [ComponentNode]
//!         ├── Text / Button / Image / Spacer / Divider   (leaves)
//!         ├── Container { vstack | hstack | zstack | card, children }
//!         ├── List { dataSource, itemTemplate }
//!         └── Unsupported { raw JSON }                   (degraded)
//! ```
//!
//! Decoding is forward compatible: unknown fields are ignored, malformed
//! optional fields decode as absent and unknown node types decode as
//! [`ComponentNode::Unsupported`].

mod action;
mod condition;
mod document;
mod lenient;
mod node;
mod style;

pub use action::Action;
pub use condition::{Condition, ConditionOperator};
pub use document::{DegradedNode, ScreenDocument};
pub use lenient::scalar_to_string;
pub use node::{
    ButtonNode, ComponentNode, ContainerKind, ContainerNode, ImageNode, ImageSource, ListNode,
    NodeCommon, TextNode, UnsupportedNode, MAX_DECODE_DEPTH,
};
pub use style::{Font, Padding, Style};
