//! Broadcasting helpers for plate-aware factor evaluation.
//!
//! Implements the shape bookkeeping the engine relies on: trailing-aligned
//! co-broadcasting, per-call plate-extent resolution, call-shape computation,
//! and node-to-graph plate alignment.
//!
//! ## Shape convention
//! A value bound to a variable carries `batch dims ++ plate dims`: the
//! trailing dimensions map onto the variable's plates positionally, and any
//! leading dimensions are batch dimensions shared across the whole call.
//!
//! ## What this module does
//! - Resolves each plate's extent from the values actually bound at call
//!   time, checking cross-variable consistency ([`plate_sizes`]).
//! - Computes a node's *call shape*: co-broadcast batch dims plus the node's
//!   own plate extents in node plate order ([`function_shape`]).
//! - Aligns a node's log contribution to the graph-wide plate order with
//!   view-level axis permutation and size-1 axis insertion, no copies
//!   ([`broadcast_plates`]).
//! - Adds tensors under trailing-alignment broadcasting ([`add_arrays`]).
//!
//! ## Invariants
//! - Plate extents never come from the plates themselves; they are derived
//!   per call from bound data and may differ between calls.
//! - `broadcast_plates` assumes every node plate appears in the graph plate
//!   order, which graph construction guarantees.
use crate::graph::core::plate::Plate;
use crate::graph::core::value::Tensor;
use crate::graph::core::variable::Variable;
use crate::graph::errors::{GraphError, GraphResult};
use ndarray::{ArrayViewD, IxDyn};
use std::collections::HashMap;

/// Co-broadcast two shapes under trailing-alignment rules.
///
/// # Arguments
/// - `left`, `right`: shapes to combine; dimensions align from the end, and
///   a missing or size-1 dimension stretches to match its partner.
///
/// # Returns
/// - The combined shape.
///
/// # Errors
/// - [`GraphError::BroadcastMismatch`] when any aligned pair of extents
///   disagrees and neither is 1.
pub fn broadcast_shape(left: &[usize], right: &[usize]) -> GraphResult<Vec<usize>> {
    let rank = left.len().max(right.len());
    let mut shape = vec![0; rank];
    for offset in 0..rank {
        let l = if offset < left.len() { left[left.len() - 1 - offset] } else { 1 };
        let r = if offset < right.len() { right[right.len() - 1 - offset] } else { 1 };
        shape[rank - 1 - offset] = if l == r || r == 1 {
            l
        } else if l == 1 {
            r
        } else {
            return Err(GraphError::BroadcastMismatch {
                left: left.to_vec(),
                right: right.to_vec(),
            });
        };
    }
    Ok(shape)
}

/// Elementwise addition with trailing-alignment broadcasting.
///
/// # Arguments
/// - `left`, `right`: tensors of any (mutually broadcastable) shapes.
///
/// # Returns
/// - A freshly allocated tensor of the co-broadcast shape.
///
/// # Errors
/// - [`GraphError::BroadcastMismatch`] when the shapes are incompatible.
pub fn add_arrays(left: &Tensor, right: &Tensor) -> GraphResult<Tensor> {
    let shape = broadcast_shape(left.shape(), right.shape())?;
    let mismatch = || GraphError::BroadcastMismatch {
        left: left.shape().to_vec(),
        right: right.shape().to_vec(),
    };
    let l = left.broadcast(IxDyn(&shape)).ok_or_else(mismatch)?;
    let r = right.broadcast(IxDyn(&shape)).ok_or_else(mismatch)?;
    Ok(&l + &r)
}

/// Resolve plate extents from the values bound in one call.
///
/// Matches each value's trailing dimensions against its variable's plates,
/// positionally, and collects one extent per plate identity.
///
/// # Arguments
/// - `bindings`: resolved `(variable, value)` pairs for one node call.
///
/// # Returns
/// - Map from plate id to extent, covering every plate any binding touches.
///
/// # Errors
/// - [`GraphError::MissingPlateDims`] when a value carries fewer dimensions
///   than its variable's plate count.
/// - [`GraphError::PlateSizeMismatch`] when two bindings imply different
///   extents for the same plate.
pub fn plate_sizes(
    bindings: &[(&Variable, ArrayViewD<'_, f64>)],
) -> GraphResult<HashMap<u64, usize>> {
    let mut sizes: HashMap<u64, usize> = HashMap::new();
    for (variable, value) in bindings {
        if value.ndim() < variable.ndim() {
            return Err(GraphError::MissingPlateDims {
                name: variable.name().to_string(),
                plates: variable.ndim(),
                ndim: value.ndim(),
            });
        }
        let lead = value.ndim() - variable.ndim();
        for (plate, &extent) in variable.plates().iter().zip(&value.shape()[lead..]) {
            match sizes.get(&plate.id()) {
                Some(&known) if known != extent => {
                    return Err(GraphError::PlateSizeMismatch {
                        plate: plate.name().to_string(),
                        expected: known,
                        actual: extent,
                    });
                }
                Some(_) => {}
                None => {
                    sizes.insert(plate.id(), extent);
                }
            }
        }
    }
    Ok(sizes)
}

/// Compute the call shape of a node from its resolved bindings.
///
/// The call shape is the co-broadcast of every binding's batch (leading,
/// non-plate) dimensions, followed by the node's own plate extents in node
/// plate order.
///
/// # Arguments
/// - `bindings`: resolved `(variable, value)` pairs for one node call.
/// - `plates`: the node's ordered plate union.
///
/// # Returns
/// - `batch dims ++ plate extents`.
///
/// # Errors
/// - Propagates extent-resolution errors from [`plate_sizes`] and batch
///   incompatibilities from [`broadcast_shape`].
///
/// # Panics
/// - When `plates` contains a plate no binding ranges over; callers pass
///   the plate union of the same bindings, so that is a logic bug.
pub fn function_shape(
    bindings: &[(&Variable, ArrayViewD<'_, f64>)],
    plates: &[Plate],
) -> GraphResult<Vec<usize>> {
    let sizes = plate_sizes(bindings)?;
    let mut batch: Vec<usize> = Vec::new();
    for (variable, value) in bindings {
        let lead = value.ndim() - variable.ndim();
        batch = broadcast_shape(&batch, &value.shape()[..lead])?;
    }
    let mut shape = batch;
    for plate in plates {
        // Every node plate comes from some binding, so the lookup succeeds
        // whenever plate_sizes did; a miss is a logic bug upstream.
        shape.push(sizes[&plate.id()]);
    }
    Ok(shape)
}

/// Align a node's log contribution to the graph-wide plate order.
///
/// The node's value carries `batch dims ++ node plate dims`. This reorders
/// the plate axes into `graph_plates` order and inserts size-1 axes for
/// graph plates the node does not range over, so the graph accumulator can
/// co-broadcast contributions from nodes over different plate subsets.
/// Axis permutation and insertion are view-level; element data is not
/// copied or reordered.
///
/// # Arguments
/// - `value`: the node's log contribution.
/// - `node_plates`: the node's ordered plates (trailing axes of `value`).
/// - `graph_plates`: the graph's ordered plate union; must contain every
///   node plate.
/// - `factor`: node name for error reporting.
///
/// # Errors
/// - [`GraphError::MissingPlateDims`] when `value` carries fewer dimensions
///   than the node's plate count, which violates the node output contract.
pub fn broadcast_plates(
    value: Tensor,
    node_plates: &[Plate],
    graph_plates: &[Plate],
    factor: &str,
) -> GraphResult<Tensor> {
    if value.ndim() < node_plates.len() {
        return Err(GraphError::MissingPlateDims {
            name: factor.to_string(),
            plates: node_plates.len(),
            ndim: value.ndim(),
        });
    }
    let shift = value.ndim() - node_plates.len();

    let missing: Vec<usize> = graph_plates
        .iter()
        .enumerate()
        .filter(|(_, plate)| !node_plates.contains(plate))
        .map(|(position, _)| position)
        .collect();

    // Append one size-1 axis per absent graph plate, then permute so the
    // trailing axes follow graph plate order.
    let mut expanded = value;
    for _ in &missing {
        let end = expanded.ndim();
        expanded = expanded.insert_axis(ndarray::Axis(end));
    }

    let mut permutation: Vec<usize> = (0..shift).collect();
    for plate in graph_plates {
        match node_plates.iter().position(|own| own == plate) {
            Some(axis) => permutation.push(shift + axis),
            None => {
                let inserted = missing
                    .iter()
                    .position(|&position| graph_plates[position] == *plate)
                    .unwrap_or(0);
                permutation.push(shift + node_plates.len() + inserted);
            }
        }
    }
    Ok(expanded.permuted_axes(IxDyn(&permutation)))
}
