//! nodes — factors bound to concrete variables.
//!
//! Purpose
//! -------
//! Provide the graph's unit of scheduling and evaluation: a factor bound to
//! the variables it reads ([`FactorNode`]) and, for factors that produce
//! derived variables, the declared outputs it writes
//! ([`DeterministicFactorNode`]).
//!
//! Key behaviors
//! -------------
//! - Uniform call contract: positional values fill construction order,
//!   everything else resolves from the shared variable map by variable
//!   name, and extra named entries are ignored.
//! - [`FactorNode`] returns the factor's log contribution;
//!   [`DeterministicFactorNode`] reshapes raw outputs to their declared
//!   variables' shapes and contributes the additive identity.
//! - Both expose the pure dependency probe (`variables_difference`) the
//!   graph's wave scheduler is built on.
//!
//! Invariants & assumptions
//! ------------------------
//! - Nodes are immutable after construction and purely functional; a node's
//!   plate set is the first-occurrence union of its variables' plates.
//! - Declared output arity is checked at construction and again on every
//!   call.
//!
//! Testing notes
//! -------------
//! - Unit tests in [`factor_node`] cover call resolution and argument
//!   errors; [`deterministic`] covers reshaping, the zero log contribution,
//!   and arity enforcement.

pub mod deterministic;
pub mod factor_node;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::deterministic::DeterministicFactorNode;
pub use self::factor_node::FactorNode;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Usage:
//
//     use rust_factorgraphs::graph::nodes::prelude::*;

pub mod prelude {
    pub use super::deterministic::DeterministicFactorNode;
    pub use super::factor_node::FactorNode;
}
