//! Topological layering (§4.7): "compute in-degrees using the relation
//! 'A reads a name that is among B's writes ⇒ A depends on B'. Emit layers
//! by repeatedly draining zero-in-degree nodes... if any node remains,
//! emit those as a fixpoint layer."

use std::collections::{HashMap, HashSet};

use ldc_index::DagNode;

/// The output of [`build`]: zero or more ordered layers (I1 holds within
/// and across these), plus whatever nodes form the circular remainder.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    /// Each entry is a layer of node indices (into the slice passed to
    /// [`build`]) that may be evaluated in any order relative to one
    /// another, but only after every earlier layer has been evaluated.
    pub layers: Vec<Vec<usize>>,
    /// Node indices with a circular dependency among themselves. Empty
    /// when the whole DAG is acyclic.
    pub fixpoint: Vec<usize>,
}

/// Builds a [`Schedule`] from a document's DAG nodes. A name is looked up
/// against both the plain-key and IRI halves of every node's `writes`
/// pair, per the indexer's "writes both, so the scheduler can match
/// dependencies regardless of whether a reader names a plain key" note.
pub fn build(nodes: &[DagNode]) -> Schedule {
    let mut writers: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, node) in nodes.iter().enumerate() {
        writers.entry(node.writes.0.as_str()).or_default().push(i);
        writers.entry(node.writes.1.as_str()).or_default().push(i);
    }

    let direct_deps = |i: usize| -> HashSet<usize> {
        let node = &nodes[i];
        let mut deps = HashSet::new();
        for read in &node.reads {
            if let Some(writer_indices) = writers.get(read.as_str()) {
                deps.extend(writer_indices.iter().copied().filter(|&w| w != i));
            }
        }
        deps
    };

    let mut remaining: Vec<usize> = (0..nodes.len()).collect();
    let mut resolved: HashSet<usize> = HashSet::new();
    let mut layers = Vec::new();

    loop {
        if remaining.is_empty() {
            break;
        }
        let mut layer = Vec::new();
        remaining.retain(|&i| {
            if direct_deps(i).iter().all(|d| resolved.contains(d)) {
                layer.push(i);
                false
            } else {
                true
            }
        });
        if layer.is_empty() {
            // Nothing drained this pass: whatever's left depends on
            // itself, directly or transitively. That's the fixpoint layer.
            break;
        }
        resolved.extend(&layer);
        layers.push(layer);
    }

    Schedule { layers, fixpoint: remaining }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ldc_index::{DagKind, DagNode, NodePayload};

    fn node(id: &str, reads: &[&str], writes: (&str, &str)) -> DagNode {
        DagNode {
            id: id.to_string(),
            plain_key: writes.0.to_string(),
            kind: DagKind::Expr,
            reads: reads.iter().map(|s| s.to_string()).collect(),
            writes: (writes.0.to_string(), writes.1.to_string()),
            payload: NodePayload::Expr(ldc_expr_placeholder_ast()),
            stable: false,
        }
    }

    // ldc-index's DagNode embeds a parsed AST; building one from scratch
    // here would pull in ldc-expr just for test fixtures, so parse the
    // simplest possible literal instead.
    fn ldc_expr_placeholder_ast() -> ldc_expr::AstNode {
        ldc_expr::parse("1").unwrap()
    }

    #[test]
    fn independent_nodes_share_one_layer() {
        let nodes = vec![
            node("#a", &[], ("a", "https://ex/a")),
            node("#b", &[], ("b", "https://ex/b")),
        ];
        let schedule = build(&nodes);
        assert_eq!(schedule.layers.len(), 1);
        assert_eq!(schedule.layers[0].len(), 2);
        assert!(schedule.fixpoint.is_empty());
    }

    #[test]
    fn a_dependent_chain_is_ordered_into_separate_layers() {
        let nodes = vec![
            node("#a", &[], ("a", "https://ex/a")),
            node("#b", &["a"], ("b", "https://ex/b")),
            node("#c", &["b"], ("c", "https://ex/c")),
        ];
        let schedule = build(&nodes);
        assert_eq!(schedule.layers, vec![vec![0], vec![1], vec![2]]);
        assert!(schedule.fixpoint.is_empty());
    }

    #[test]
    fn reading_by_iri_depends_on_the_same_writer_as_plain_key() {
        let nodes = vec![
            node("#a", &[], ("a", "https://ex/a")),
            node("#b", &["https://ex/a"], ("b", "https://ex/b")),
        ];
        let schedule = build(&nodes);
        assert_eq!(schedule.layers, vec![vec![0], vec![1]]);
    }

    #[test]
    fn a_mutual_cycle_is_set_aside_as_the_fixpoint_layer() {
        let nodes = vec![
            node("#a", &["b"], ("a", "https://ex/a")),
            node("#b", &["a"], ("b", "https://ex/b")),
        ];
        let schedule = build(&nodes);
        assert!(schedule.layers.is_empty());
        let mut fixpoint = schedule.fixpoint.clone();
        fixpoint.sort_unstable();
        assert_eq!(fixpoint, vec![0, 1]);
    }

    #[test]
    fn an_acyclic_prefix_still_drains_before_the_cycle_remains() {
        let nodes = vec![
            node("#seed", &[], ("seed", "https://ex/seed")),
            node("#a", &["seed", "b"], ("a", "https://ex/a")),
            node("#b", &["a"], ("b", "https://ex/b")),
        ];
        let schedule = build(&nodes);
        assert_eq!(schedule.layers, vec![vec![0]]);
        let mut fixpoint = schedule.fixpoint.clone();
        fixpoint.sort_unstable();
        assert_eq!(fixpoint, vec![1, 2]);
    }
}
