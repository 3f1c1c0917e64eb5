use crate::error::{ComposeError, Result};
use crate::Document;

/// Fetches a sibling document for an `@relations` alias (§4.10, §6).
/// Synchronous by design: the evaluator core stays free of an async
/// runtime; hosts needing async I/O adapt at their own boundary.
pub trait DocumentLoader {
    fn load(&self, alias: &str, path: &str) -> Result<Document>;
}

/// A loader with nothing registered. Every alias lookup fails with
/// [`ComposeError::UnknownAlias`] — useful for documents known not to
/// declare `@relations`.
pub struct NoRelations;

impl DocumentLoader for NoRelations {
    fn load(&self, alias: &str, _path: &str) -> Result<Document> {
        Err(ComposeError::UnknownAlias(alias.to_string()))
    }
}
