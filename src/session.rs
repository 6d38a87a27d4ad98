//! Ordered publication of render passes.
//!
//! Environments change while earlier passes may still be evaluating or
//! waiting on images. Each pass takes a logical generation from
//! [`RenderSession::begin`]; [`RenderSession::publish`] only accepts a tree
//! newer than the one already published, so a slow old pass can never
//! overwrite a newer render regardless of completion order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use crate::interpreter::{Environment, Interpreter, RenderTree};
use crate::resources::{ResourceEvent, ResourceLoader};
use crate::schema::ScreenDocument;

/// A render tree together with the generation that produced it.
#[derive(Debug, Clone)]
pub struct PublishedTree {
    pub generation: u64,
    pub tree: Arc<RenderTree>,
}

pub struct RenderSession {
    interpreter: Arc<Interpreter>,
    loader: Option<Arc<ResourceLoader>>,
    clock: AtomicU64,
    latest: watch::Sender<Option<PublishedTree>>,
}

impl RenderSession {
    pub fn new(interpreter: Arc<Interpreter>) -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            interpreter,
            loader: None,
            clock: AtomicU64::new(0),
            latest,
        }
    }

    /// Fetch images for published trees and cancel fetches they no longer need.
    pub fn with_loader(mut self, loader: Arc<ResourceLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Reserve the next logical generation.
    pub fn begin(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<PublishedTree>> {
        self.latest.subscribe()
    }

    pub fn current(&self) -> Option<PublishedTree> {
        self.latest.borrow().clone()
    }

    /// Publish `tree` for `generation` unless a newer tree is already out.
    ///
    /// Safe to call from any thread: image fetches it starts run on the
    /// runtime the loader was built on. Returns whether the tree was accepted.
    pub fn publish(&self, generation: u64, mut tree: RenderTree) -> bool {
        if let Some(loader) = &self.loader {
            loader.annotate(&mut tree);
        }
        let tree = Arc::new(tree);

        let accepted = self.latest.send_if_modified(|current| {
            if current.as_ref().is_some_and(|p| p.generation >= generation) {
                return false;
            }
            *current = Some(PublishedTree {
                generation,
                tree: tree.clone(),
            });
            true
        });

        if !accepted {
            tracing::debug!(generation, "Discarded stale render pass");
            return false;
        }

        if let Some(loader) = &self.loader {
            loader.request(&tree, generation);
            let aborted = loader.cancel_stale(generation);
            if aborted > 0 {
                tracing::debug!(generation, aborted, "Cancelled fetches for superseded renders");
            }
        }
        true
    }

    /// Evaluate `document` against `env` off the async executor and publish
    /// the result. Returns the generation if the tree was accepted.
    pub async fn render(&self, document: Arc<ScreenDocument>, env: Environment) -> Option<u64> {
        let generation = self.begin();
        let interpreter = self.interpreter.clone();
        let tree = match tokio::task::spawn_blocking(move || interpreter.render(&document, &env)).await {
            Ok(tree) => tree,
            Err(err) => {
                tracing::error!(generation, error = %err, "Render pass panicked");
                return None;
            }
        };
        self.publish(generation, tree).then_some(generation)
    }

    /// Refresh resource states in the published tree after a fetch finished.
    ///
    /// Returns whether the published tree changed.
    pub fn apply_resource_event(&self, event: &ResourceEvent) -> bool {
        let Some(loader) = &self.loader else {
            return false;
        };
        self.latest.send_if_modified(|current| {
            let Some(published) = current.as_mut() else {
                return false;
            };
            let mut tree = RenderTree::clone(&published.tree);
            loader.annotate(&mut tree);
            if tree == *published.tree {
                return false;
            }
            tracing::debug!(
                url = event.url(),
                requested_by = event.generation(),
                generation = published.generation,
                "Resource ready, tree refreshed"
            );
            published.tree = Arc::new(tree);
            true
        })
    }
}
