//! Action dispatch boundary.
//!
//! The interpreter only packages actions; a dispatcher decides what they
//! do. Dispatch is fire-and-forget from the interpreter's side and may kick
//! off asynchronous work that eventually produces a new environment and a
//! new render pass.

use tokio::sync::mpsc;

use crate::schema::Action;

/// Receives actions emitted for user interactions.
pub trait ActionDispatcher: Send + Sync {
    fn dispatch(&self, action: Action);
}

/// Records dispatched actions in the log and drops them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingDispatcher;

impl ActionDispatcher for LoggingDispatcher {
    fn dispatch(&self, action: Action) {
        tracing::info!(
            kind = %action.kind,
            target = %action.target,
            parameters = action.parameters.len(),
            "Action dispatched"
        );
    }
}

/// Forwards actions to an async executor over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelDispatcher {
    sender: mpsc::UnboundedSender<Action>,
}

impl ChannelDispatcher {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Action>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ActionDispatcher for ChannelDispatcher {
    fn dispatch(&self, action: Action) {
        if let Err(err) = self.sender.send(action) {
            tracing::warn!(kind = %err.0.kind, "Action executor has shut down; dropping action");
        }
    }
}
