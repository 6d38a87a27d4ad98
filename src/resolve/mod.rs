//! Screen resolution: screen id + request context → stored template.
//!
//! Resolution is pure and cacheable. Binding of dynamic values happens
//! later, in the interpreter, against an environment the caller builds
//! (see [`crate::interpreter::Environment::from_context`]).

mod context;
mod resolver;

pub use context::ScreenContext;
pub use resolver::{ResolveError, ScreenResolver};
