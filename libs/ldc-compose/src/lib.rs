//! The composer (C10, §4.10): resolves `@relations`, `@ref` and `@rollup`
//! against sibling documents fetched through a host-supplied loader,
//! merging the results into a working copy of the document as inert
//! values before the indexer ever walks it.

#![forbid(unsafe_code)]

mod compose;
mod error;
mod loader;
mod path;
mod rollup;

/// A document is plain JSON throughout this workspace; no dedicated
/// wrapper type earns its keep over `serde_json::Value`.
pub type Document = serde_json::Value;

pub use compose::{compose, Composed};
pub use error::{ComposeError, Result};
pub use loader::{DocumentLoader, NoRelations};
pub use path::Segment;
pub use rollup::RollupAgg;
