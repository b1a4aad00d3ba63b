//! factors — stock factor library: Gaussian densities and transforms.
//!
//! Purpose
//! -------
//! Supply ready-made [`Factor`](crate::graph::Factor) implementations for
//! the common pieces of a model, so everyday graphs need no hand-rolled
//! trait impls: Gaussian priors and data-carrying likelihoods in
//! [`gaussian`], deterministic transforms in [`transforms`], and the
//! parameter-validation errors in [`errors`].
//!
//! Key behaviors
//! ------------
//! - All stock factors are elementwise: log outputs and transform outputs
//!   keep the (co-broadcast) shape of their inputs, so plated variables and
//!   leading batch dimensions flow through unchanged.
//! - Distribution parameters and carried data are validated at
//!   construction via [`FactorError`]; a stock factor that constructs
//!   evaluates without parameter failures.
//!
//! Conventions
//! -----------
//! - Every stock factor takes its name at construction; the name feeds
//!   graph names, display, and error messages.
//! - Transforms are single-output and meant to be bound through
//!   `DeterministicFactorNode`; the densities are plain log factors.
//!
//! Testing notes
//! -------------
//! - Unit tests in [`gaussian`] check log densities against closed forms
//!   and validate the constructor error paths; [`transforms`] covers
//!   elementwise semantics and co-broadcast summation.

pub mod errors;
pub mod gaussian;
pub mod transforms;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::errors::{FactorError, FactorResult};
pub use self::gaussian::{GaussianLikelihood, GaussianPrior};
pub use self::transforms::{Affine, Exp, Sum};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Usage:
//
//     use rust_factorgraphs::factors::prelude::*;

pub mod prelude {
    pub use super::errors::{FactorError, FactorResult};
    pub use super::gaussian::{GaussianLikelihood, GaussianPrior};
    pub use super::transforms::{Affine, Exp, Sum};
}
