//! core — shared factor-graph primitives: plates, variables, values, factors.
//!
//! Purpose
//! -------
//! Collect the building blocks everything else in the graph layer is
//! assembled from: identity-compared plates, named variables, the tensor
//! value types, the [`Factor`] capability trait, trailing-alignment
//! broadcasting, and construction-time validation helpers. Node and graph
//! types build on top of these primitives.
//!
//! Key behaviors
//! -------------
//! - Define the structural vocabulary: [`Plate`] (an axis a model repeats
//!   over, compared by identity), [`Variable`] (a name plus ordered plates),
//!   and the [`Tensor`] / [`FactorValue`] value types.
//! - Define the [`Factor`] trait — a pure numeric function with a declared
//!   output arity — plus closure adapters [`FactorFn`] and
//!   [`DeterministicFn`].
//! - Implement the broadcasting toolkit in [`broadcast`]: trailing-aligned
//!   shape combination, co-broadcast addition, per-call plate-extent
//!   resolution, call-shape computation, and node-to-graph plate alignment.
//! - Provide construction-time queries in [`validation`]: duplicate
//!   deterministic-name detection, ordered plate unions, and the shared
//!   positional prefix.
//!
//! Invariants & assumptions
//! ------------------------
//! - Plates carry no intrinsic size; extents are resolved per call from the
//!   trailing dimensions of bound values and checked for cross-variable
//!   consistency.
//! - Values carry `batch dims ++ plate dims`: a variable's plates occupy
//!   the trailing axes of its value, any leading axes are batch dimensions.
//! - Factors are pure and `Send + Sync`; everything here is immutable after
//!   construction.
//!
//! Conventions
//! -----------
//! - Broadcasting follows trailing-alignment rules (dimensions of 1
//!   stretch; missing leading dimensions are implied).
//! - Plate order is first-occurrence order wherever unions are taken; the
//!   graph-wide order every contribution is aligned to derives from it.
//!
//! Testing notes
//! -------------
//! - Each submodule carries unit tests for its own behavior: plate
//!   identity, variable metadata, broadcasting and alignment, and the
//!   validation queries.

pub mod broadcast;
pub mod factor;
pub mod plate;
pub mod validation;
pub mod value;
pub mod variable;

// ---- Re-exports (primary public surface) ----------------------------------
//
// The everyday vocabulary for building models. Broadcasting internals and
// validation queries stay under their submodules.

pub use self::factor::{DeterministicFn, Factor, FactorFn};
pub use self::plate::Plate;
pub use self::value::{scalar, FactorValue, Tensor};
pub use self::variable::Variable;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Usage:
//
//     use rust_factorgraphs::graph::core::prelude::*;

pub mod prelude {
    pub use super::factor::{DeterministicFn, Factor, FactorFn};
    pub use super::plate::Plate;
    pub use super::value::{scalar, FactorValue, Tensor};
    pub use super::variable::Variable;
}
