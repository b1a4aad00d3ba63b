//! graph — the factor-graph engine: primitives, nodes, graphs, and errors.
//!
//! Purpose
//! -------
//! Provide the full probabilistic-model evaluation engine: structural
//! primitives in [`core`], factors bound to variables in [`nodes`],
//! validated graphs with wave scheduling and plate-aligned accumulation in
//! [`factor_graph`], and a uniform error surface in [`errors`]. This is the
//! main entry point for model construction and the surface most consumers
//! (including Python bindings) should depend on.
//!
//! Key behaviors
//! -------------
//! - Build models from [`Plate`]s and [`Variable`]s, bind [`Factor`]s into
//!   [`FactorNode`]s and [`DeterministicFactorNode`]s, and compose them
//!   with `*` into a validated [`FactorGraph`].
//! - Construction derives everything evaluation needs — variable and plate
//!   namespaces, wave schedule, shared positional signature — so a graph
//!   that constructs is guaranteed to evaluate without dependency failures.
//! - Evaluation returns a [`FactorValue`]: the joint log value over
//!   `batch dims ++ graph plate dims` plus every deterministic variable
//!   produced along the way.
//! - Centralize engine errors in [`errors`] ([`GraphError`] and the
//!   [`GraphResult`] alias) so callers see one error surface across
//!   construction, scheduling, and evaluation.
//!
//! Invariants & assumptions
//! ------------------------
//! - Graphs, nodes, plates, and variables are immutable after construction;
//!   composition builds new graphs. Factors live behind `Arc` and are
//!   `Send + Sync`, so constructed models are safe to share across threads.
//! - Plate extents are resolved per call from bound values; nothing in the
//!   structure fixes a size.
//! - A deterministic variable name is produced by at most one node per
//!   graph.
//!
//! Conventions
//! -----------
//! - Values carry `batch dims ++ plate dims`; broadcasting is
//!   trailing-aligned.
//! - Evaluation is single-threaded and synchronous; waves run in order and
//!   nodes within a wave run in insertion order.
//! - The engine performs no I/O and no logging; error conditions surface as
//!   [`GraphResult`] and, at the binding layer, as `PyErr` via the
//!   conversions in [`errors`].
//!
//! Downstream usage
//! ----------------
//! - Typical flow:
//!   1. Create [`Plate`]s for the model's repeated axes and [`Variable`]s
//!      over them.
//!   2. Implement [`Factor`] (or wrap closures with [`FactorFn`] /
//!      [`DeterministicFn`]; the stock library in [`crate::factors`]
//!      supplies common densities and transforms).
//!   3. Bind factors into nodes, compose with `*`, and inspect the graph's
//!      `call_signature` / `call_sequence` if needed.
//!   4. Evaluate with `graph.call(positional, named)` and read the joint
//!      log value and deterministic outputs off the returned
//!      [`FactorValue`].
//! - Python bindings import from this module (or its [`prelude`]) and rely
//!   on the `GraphError` → `PyErr` conversion defined in [`errors`].
//!
//! Testing notes
//! -------------
//! - Unit tests live with the behavior they cover: broadcasting and
//!   validation under [`core`], call contracts under [`nodes`], scheduling,
//!   evaluation, and composition under [`factor_graph`], and message/
//!   conversion coverage under [`errors`]. End-to-end model pipelines are
//!   exercised in the crate's integration tests.

pub mod core;
pub mod errors;
pub mod factor_graph;
pub mod nodes;

// ---- Re-exports (primary public surface) ----------------------------------
//
// The everyday types for building and evaluating models. Broadcasting and
// validation internals remain under `core`.

pub use self::core::{
    DeterministicFn, Factor, FactorFn, FactorValue, Plate, Tensor, Variable, scalar,
};
pub use self::errors::{GraphError, GraphResult};
pub use self::factor_graph::{FactorGraph, GraphNode, IntoGraphNodes};
pub use self::nodes::{DeterministicFactorNode, FactorNode};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Usage:
//
//     use rust_factorgraphs::graph::prelude::*;

pub mod prelude {
    pub use super::core::prelude::*;
    pub use super::errors::{GraphError, GraphResult};
    pub use super::factor_graph::{FactorGraph, GraphNode, IntoGraphNodes};
    pub use super::nodes::prelude::*;
}
