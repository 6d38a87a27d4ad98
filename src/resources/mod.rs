//! Out-of-band resource loading.
//!
//! The interpreter describes images instead of fetching them. The
//! [`ResourceLoader`] owns the fetch lifecycle: it starts fetches for
//! placeholder descriptors, tags each with the logical generation of the
//! render pass that wanted it, aborts fetches that only stale passes wanted,
//! and announces completions so the owner can run a new pass.

mod loader;

pub use loader::{ResourceError, ResourceEvent, ResourceLoader};
