//! Parsed shape of an `@query` directive body (§4.9).

use ldc_expr::AstNode;
use ldc_expr::Value;
use std::collections::BTreeMap;

/// A single result row, keyed by variable name with the leading `?`
/// stripped. `BTreeMap` gives deterministic key iteration order, which
/// the canonicalizer downstream depends on.
pub type Row = BTreeMap<String, Value>;

#[derive(Debug, Clone)]
pub struct QueryAst {
    pub patterns: Vec<Pattern>,
    pub filters: Vec<AstNode>,
    pub select: Vec<SelectItem>,
    pub group_by: Vec<String>,
    pub having: Vec<AstNode>,
    pub order_by: Vec<OrderKey>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone)]
pub enum Pattern {
    Triple(TriplePattern),
    /// A left-joined group: rows that fail to match keep their existing
    /// bindings and get `null` for every variable the group would have
    /// bound, rather than being dropped.
    Optional {
        patterns: Vec<TriplePattern>,
        filters: Vec<AstNode>,
    },
}

#[derive(Debug, Clone)]
pub struct TriplePattern {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

/// One position of a triple pattern. `Iri` terms are stored unexpanded —
/// CURIE/context expansion happens later via [`QueryAst::expand_iris`],
/// since resolving a context map here would make this crate depend on
/// the document model that in turn needs to depend on query ASTs.
#[derive(Debug, Clone)]
pub enum Term {
    Var(String),
    Iri(String),
    Literal(Value),
}

#[derive(Debug, Clone)]
pub enum SelectItem {
    Var(String),
    Aggregate {
        agg: AggKind,
        expr: Option<AstNode>,
        alias: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggKind {
    Sum,
    Count,
    Min,
    Max,
    Avg,
}

#[derive(Debug, Clone)]
pub struct OrderKey {
    pub var: String,
    pub descending: bool,
}

impl QueryAst {
    /// Rewrites every [`Term::Iri`] in every pattern position (including
    /// nested `Optional` groups) through `expand`. The reserved `a`
    /// shorthand (§4.9) is the caller's concern: `expand` should map it
    /// to `rdf:type` itself before falling through to generic CURIE
    /// resolution.
    pub fn expand_iris(&mut self, expand: &impl Fn(&str) -> String) {
        for pattern in &mut self.patterns {
            expand_pattern(pattern, expand);
        }
    }
}

fn expand_pattern(pattern: &mut Pattern, expand: &impl Fn(&str) -> String) {
    match pattern {
        Pattern::Triple(tp) => expand_triple(tp, expand),
        Pattern::Optional { patterns, .. } => {
            for tp in patterns {
                expand_triple(tp, expand);
            }
        }
    }
}

fn expand_triple(tp: &mut TriplePattern, expand: &impl Fn(&str) -> String) {
    expand_term(&mut tp.subject, expand);
    expand_term(&mut tp.predicate, expand);
    expand_term(&mut tp.object, expand);
}

fn expand_term(term: &mut Term, expand: &impl Fn(&str) -> String) {
    if let Term::Iri(s) = term {
        *s = expand(s);
    }
}

/// Variable names referenced by any position of any pattern in `patterns`,
/// in first-seen order (used to null-fill an unmatched optional group).
pub(crate) fn collect_vars(patterns: &[TriplePattern]) -> Vec<String> {
    let mut seen = Vec::new();
    let mut push = |name: &str| {
        if !seen.iter().any(|s: &String| s == name) {
            seen.push(name.to_string());
        }
    };
    for tp in patterns {
        for term in [&tp.subject, &tp.predicate, &tp.object] {
            if let Term::Var(name) = term {
                push(name);
            }
        }
    }
    seen
}
