//! Server-driven UI: screen resolution service and component tree interpreter.
//!
//! The service side ([`resolve`], [`store`], [`server`]) maps a screen id and
//! request context to a declarative [`schema::ScreenDocument`]. The client
//! side ([`interpreter`], [`session`], [`resources`], [`dispatch`]) evaluates
//! that document against an environment into a render tree.

pub mod config;
pub mod dispatch;
pub mod interpreter;
pub mod resolve;
pub mod resources;
pub mod schema;
pub mod server;
pub mod session;
pub mod store;
pub mod telemetry;
