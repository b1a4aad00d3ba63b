//! Construction-time validation helpers for factor graphs.
//!
//! Small focused routines used while assembling a graph from nodes:
//! duplicate deterministic-declaration detection, ordered plate unions, and
//! the shared positional prefix that becomes the graph call signature.
//! Each helper is a pure query over node metadata; the graph constructor
//! decides what to do with the answers.
use crate::graph::core::plate::Plate;
use crate::graph::core::variable::Variable;
use std::collections::{BTreeMap, BTreeSet};

/// Collect deterministic variable names declared more than once.
///
/// # Arguments
/// - `declared`: every deterministic output variable across all nodes, in
///   any order, one entry per declaration.
///
/// # Returns
/// - Sorted, deduplicated names that appear in more than one declaration;
///   empty when the uniqueness invariant holds.
pub fn duplicate_names<'a>(declared: impl Iterator<Item = &'a Variable>) -> Vec<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for variable in declared {
        *counts.entry(variable.name()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .filter(|&(_, count)| count > 1)
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Union plates across nodes, preserving first-occurrence order.
///
/// Order matters: the result defines the graph-wide plate order every log
/// contribution is aligned to during evaluation.
pub fn ordered_plate_union<'a>(node_plates: impl Iterator<Item = &'a [Plate]>) -> Vec<Plate> {
    let mut union: Vec<Plate> = Vec::new();
    for plates in node_plates {
        for plate in plates {
            if !union.contains(plate) {
                union.push(plate.clone());
            }
        }
    }
    union
}

/// The longest positional prefix shared by every node.
///
/// Positions are included while every node binds the identical variable at
/// that index; the prefix stops at the first disagreement, at the shortest
/// node's length, or at a variable produced deterministically inside the
/// graph (an internal product is never a caller-supplied argument).
/// Contiguity keeps positional forwarding coherent: the graph can hand its
/// positional values to every member node unchanged.
///
/// # Arguments
/// - `positional_lists`: each node's ordered positional variables.
/// - `deterministic`: names produced inside the graph.
pub fn shared_positional_prefix(
    positional_lists: &[&[Variable]],
    deterministic: &BTreeSet<String>,
) -> Vec<Variable> {
    let Some(first) = positional_lists.first() else {
        return Vec::new();
    };
    let min_len = positional_lists.iter().map(|list| list.len()).min().unwrap_or(0);

    let mut prefix = Vec::new();
    for position in 0..min_len {
        let candidate = &first[position];
        if deterministic.contains(candidate.name()) {
            break;
        }
        if positional_lists.iter().any(|list| list[position] != *candidate) {
            break;
        }
        prefix.push(candidate.clone());
    }
    prefix
}
