//! core::value — shared tensor alias and the per-evaluation result pair.
//!
//! Purpose
//! -------
//! Centralize the numeric value types flowing through factor evaluation. By
//! defining these in one place, the rest of the engine stays agnostic to the
//! concrete `ndarray` container and can evolve if the backend changes.
//!
//! Key behaviors
//! -------------
//! - Define the canonical [`Tensor`] alias for all factor inputs, log values,
//!   and deterministic outputs.
//! - Provide [`FactorValue`], the transient pair returned by one evaluation:
//!   a log-value tensor plus the mapping of deterministic variable values.
//! - Provide [`scalar`] for lifting plain `f64` values into zero-dimensional
//!   tensors (the additive identity, test fixtures, scalar model inputs).
//!
//! Conventions
//! -----------
//! - A scalar is a zero-dimensional tensor (one element, empty shape), so
//!   scalar and plated values travel through the same code paths.
//! - `FactorValue` is produced and consumed within a single evaluation; it is
//!   never persisted by the engine.
use ndarray::{ArrayD, IxDyn};
use std::collections::HashMap;

/// Numeric tensor used for every value in the engine.
///
/// Alias for `ndarray::ArrayD<f64>`; scalars are zero-dimensional tensors.
pub type Tensor = ArrayD<f64>;

/// Lift a plain `f64` into a zero-dimensional [`Tensor`].
pub fn scalar(value: f64) -> Tensor {
    ArrayD::from_elem(IxDyn(&[]), value)
}

/// Transient result of one factor or graph evaluation.
///
/// Pairs the log-value contribution with the deterministic variable values
/// produced alongside it. Purely deterministic nodes contribute a zero
/// log value; ordinary nodes contribute an empty deterministic map.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorValue {
    /// Log-value contribution; shape = leading batch dims × plate dims.
    pub log_value: Tensor,
    /// Deterministic variable values keyed by variable name.
    pub deterministic_values: HashMap<String, Tensor>,
}

impl FactorValue {
    /// Bundle a log value with its deterministic outputs.
    pub fn new(log_value: Tensor, deterministic_values: HashMap<String, Tensor>) -> FactorValue {
        FactorValue { log_value, deterministic_values }
    }

    /// The log value collapsed to `f64`.
    ///
    /// Convenience for scalar (plate-free) models and diagnostics; sums over
    /// any plate dimensions, which for a zero-dimensional tensor is the value
    /// itself.
    pub fn log_value_sum(&self) -> f64 {
        self.log_value.sum()
    }
}
