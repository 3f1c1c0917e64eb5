//! Document/context-map model (§3) and the indexer (C6, §4.6) that walks
//! a document once into a DAG of computation nodes plus inert, seeded
//! triples. This crate also hosts the [`Diagnostic`] type shared by every
//! downstream crate, since it sits low enough in the dependency graph to
//! avoid a cycle.

#![forbid(unsafe_code)]

mod context;
mod diagnostic;
mod document;

pub use context::ContextMap;
pub use diagnostic::{Diagnostic, DiagnosticCode, Severity};
pub use document::{index, DagKind, DagNode, IndexResult, NodePayload};
