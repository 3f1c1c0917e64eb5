//! Ordered provenance operations attached to an evaluation result (§6:
//! "an ordered list of fetch/filter/sort/paginate/compute operations").

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvenanceOp {
    /// The Composer fetched a sibling document for an `@relations` alias.
    Fetch { alias: String },
    /// A `@query` directive's body carried at least one `filters` clause.
    Filter { path: String },
    /// A `@query` directive's body carried an `orderBy`.
    Sort { path: String },
    /// A `@query` directive's body carried a `limit`.
    Paginate { path: String },
    /// An `@expr`/`@view`/`@constraint`/`@query` node was evaluated.
    Compute { path: String },
}
