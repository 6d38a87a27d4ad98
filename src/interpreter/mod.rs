//! Component tree interpreter.
//!
//! Turns a template ([`ComponentNode`](crate::schema::ComponentNode) tree)
//! plus an [`Environment`] into a [`RenderTree`]: conditions decide
//! visibility, `{{path}}` tokens are substituted, lists are expanded once per
//! bound item, and actions are packaged for the dispatcher.
//!
//! The interpreter is pure with respect to its inputs. It never performs
//! I/O: images come out as [`ResourceDescriptor`]s in the `Placeholder`
//! state for [`crate::resources::ResourceLoader`] to fill in later.

pub mod conditions;
mod environment;
mod evaluator;
pub mod interpolate;
mod render;

pub use environment::{Environment, Scope};
pub use evaluator::{EvaluateError, InteractionError, Interpreter, ROOT_IDENTITY};
pub use render::{
    Diagnostic, DiagnosticKind, ReachableAction, RenderKind, RenderNode, RenderTree,
    ResourceDescriptor, ResourceSource, ResourceState,
};
