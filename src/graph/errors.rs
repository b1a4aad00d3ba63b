//! Errors for factor-graph construction, scheduling, and evaluation.
//!
//! This module defines the engine error type, [`GraphError`], used across the
//! Python-facing API and the internal Rust core. It implements
//! `Display`/`Error` and converts to `PyErr` for PyO3.
//!
//! ## Conventions
//! - **Construction-time** failures (duplicate deterministic declarations,
//!   unresolvable dependencies) are fatal: the caller must fix the model
//!   definition.
//! - **Call-time** failures (arity, missing arguments, shape mismatches)
//!   carry the graph or node call signature so the offending variable can be
//!   pinpointed without re-deriving scheduling internals.
//! - Name lists inside variants are **sorted** for deterministic messages.
//! - Failures raised inside user-supplied factors are normalized to
//!   [`GraphError::Factor`] with the factor name and a human-readable reason.
use crate::factors::errors::FactorError;

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, PyErr};

/// Crate-wide result alias for graph operations that may produce [`GraphError`].
pub type GraphResult<T> = Result<T, GraphError>;

/// Unified error type for the factor-graph engine.
///
/// Covers malformed-graph construction failures, call-time arity and
/// completeness checks, shape/broadcast mismatches, and failures propagated
/// from user factors. Implements `Display`/`Error` and converts to a Python
/// `ValueError` at PyO3 boundaries.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    // ---- Malformed graph (construction/composition time) ----
    /// A deterministic variable name is declared by more than one node.
    /// `names` lists every duplicated name, sorted.
    DuplicateDeterministicVariables { names: Vec<String> },

    /// Scheduling could not resolve every node: the graph is cyclic or a
    /// node depends on a variable nothing produces. `blocked` pairs each
    /// stuck node's name with its unresolved variable names.
    UnresolvableDependencies { blocked: Vec<(String, Vec<String>)> },

    // ---- Call arity / completeness ----
    /// More positional values were supplied than the call signature allows.
    TooManyArguments { given: usize, expected: usize, signature: String },

    /// Required variables absent from both positional and keyword inputs.
    /// `missing` enumerates every absent name, sorted.
    MissingArguments { missing: Vec<String>, signature: String },

    // ---- Shape mismatches ----
    /// A factor produced a different number of outputs than it declares.
    OutputArityMismatch { factor: String, declared: usize, returned: usize },

    /// A raw deterministic output could not be reshaped into the declared
    /// variable's target shape (element-count or layout mismatch).
    ReshapeMismatch { variable: String, target: Vec<usize>, len: usize },

    /// Two bound values imply different extents for the same plate.
    PlateSizeMismatch { plate: String, expected: usize, actual: usize },

    /// Two shapes cannot be broadcast together under trailing-alignment rules.
    BroadcastMismatch { left: Vec<usize>, right: Vec<usize> },

    /// A value or log contribution carries fewer dimensions than the plates
    /// it is indexed over. `name` is the offending variable or factor.
    MissingPlateDims { name: String, plates: usize, ndim: usize },

    /// A deterministic output variable ranges over a plate that none of the
    /// node's inputs provide, so its extent cannot be resolved.
    UnknownOutputPlate { variable: String, plate: String },

    // ---- Factor propagation ----
    /// A user-supplied factor failed during evaluation.
    Factor { factor: String, reason: String },
}

impl std::error::Error for GraphError {}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Malformed graph ----
            GraphError::DuplicateDeterministicVariables { names } => {
                write!(
                    f,
                    "Improper factor graph: deterministic variables {} appear in multiple factors",
                    names.join(", ")
                )
            }
            GraphError::UnresolvableDependencies { blocked } => {
                let detail: Vec<String> = blocked
                    .iter()
                    .map(|(factor, missing)| format!("{factor} waits on {}", missing.join(", ")))
                    .collect();
                write!(
                    f,
                    "Improper factor graph: cyclic or unresolvable dependencies ({})",
                    detail.join("; ")
                )
            }
            // ---- Call arity / completeness ----
            GraphError::TooManyArguments { given, expected, signature } => {
                write!(
                    f,
                    "Too many positional arguments: got {given}, at most {expected} accepted; call signature: {signature}"
                )
            }
            GraphError::MissingArguments { missing, signature } => {
                write!(
                    f,
                    "Missing values for {} variable(s): {}; call signature: {signature}",
                    missing.len(),
                    missing.join(", ")
                )
            }
            // ---- Shape mismatches ----
            GraphError::OutputArityMismatch { factor, declared, returned } => {
                write!(
                    f,
                    "Factor {factor} declares {declared} output(s) but returned {returned}"
                )
            }
            GraphError::ReshapeMismatch { variable, target, len } => {
                write!(
                    f,
                    "Cannot reshape output for variable {variable}: {len} element(s) do not fit target shape {target:?}"
                )
            }
            GraphError::PlateSizeMismatch { plate, expected, actual } => {
                write!(
                    f,
                    "Inconsistent extents for plate {plate}: expected {expected}, got {actual}"
                )
            }
            GraphError::BroadcastMismatch { left, right } => {
                write!(f, "Shapes {left:?} and {right:?} cannot be broadcast together")
            }
            GraphError::MissingPlateDims { name, plates, ndim } => {
                write!(
                    f,
                    "{name} provides {ndim} dimension(s) but is indexed over {plates} plate(s)"
                )
            }
            GraphError::UnknownOutputPlate { variable, plate } => {
                write!(
                    f,
                    "Deterministic variable {variable} ranges over plate {plate}, which no input of its node provides"
                )
            }
            // ---- Factor propagation ----
            GraphError::Factor { factor, reason } => {
                write!(f, "Factor {factor} failed: {reason}")
            }
        }
    }
}

/// Normalize stock-factor validation failures into the graph error surface.
///
/// Used when a stock factor from [`crate::factors`] fails inside a graph
/// evaluation; construction-time validation keeps its own [`FactorError`].
impl From<FactorError> for GraphError {
    fn from(err: FactorError) -> GraphError {
        GraphError::Factor { factor: err.factor().to_string(), reason: err.to_string() }
    }
}

/// Convert a [`GraphError`] into a Python `ValueError` with the error message.
///
/// This is used at the Rust↔Python boundary to surface domain errors cleanly.
/// Composition-operand type errors are raised directly as `TypeError` by the
/// binding layer and never pass through this conversion.
#[cfg(feature = "python-bindings")]
impl std::convert::From<GraphError> for PyErr {
    fn from(err: GraphError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - `Display` rendering for the variants whose messages embed structure
    //   (name lists, counts, signatures).
    // - The `From<FactorError>` normalization into `GraphError::Factor`.
    //
    // These tests intentionally DO NOT cover:
    // - The conditions under which each variant is produced; those are
    //   asserted where the behavior lives (nodes, scheduling, broadcasting).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Duplicate-declaration messages must list every duplicated name so the
    // caller can fix the model in one pass.
    //
    // Given
    // -----
    // - Two duplicated deterministic names, pre-sorted.
    //
    // Expect
    // ------
    // - Both names appear in the rendered message.
    fn display_lists_all_duplicate_deterministic_names() {
        let err = GraphError::DuplicateDeterministicVariables {
            names: vec!["y".to_string(), "z".to_string()],
        };

        let msg = err.to_string();

        assert!(msg.contains("y, z"));
        assert!(msg.contains("multiple factors"));
    }

    #[test]
    // Purpose
    // -------
    // Missing-argument messages must enumerate every missing name and carry
    // the call signature.
    //
    // Given
    // -----
    // - Two missing names and a graph call signature.
    //
    // Expect
    // ------
    // - The count, both names, and the signature appear in the message.
    fn display_enumerates_missing_arguments_and_signature() {
        let err = GraphError::MissingArguments {
            missing: vec!["sigma".to_string(), "x".to_string()],
            signature: "prior(x, *, sigma)".to_string(),
        };

        let msg = err.to_string();

        assert!(msg.contains("2 variable(s)"));
        assert!(msg.contains("sigma, x"));
        assert!(msg.contains("prior(x, *, sigma)"));
    }

    #[test]
    // Purpose
    // -------
    // Blocked-scheduling messages must pair each stuck node with the names it
    // waits on.
    //
    // Given
    // -----
    // - Two blocked nodes with one unresolved name each.
    //
    // Expect
    // ------
    // - Both node names and both unresolved names appear in the message.
    fn display_reports_each_blocked_node_with_its_missing_names() {
        let err = GraphError::UnresolvableDependencies {
            blocked: vec![
                ("f".to_string(), vec!["b".to_string()]),
                ("g".to_string(), vec!["a".to_string()]),
            ],
        };

        let msg = err.to_string();

        assert!(msg.contains("f waits on b"));
        assert!(msg.contains("g waits on a"));
    }

    #[test]
    // Purpose
    // -------
    // Stock-factor errors must normalize into `GraphError::Factor` with the
    // factor family and the original message preserved.
    //
    // Given
    // -----
    // - A `FactorError::NonPositiveSigma`.
    //
    // Expect
    // ------
    // - Conversion yields `GraphError::Factor` whose reason contains the
    //   offending value.
    fn from_factor_error_preserves_family_and_reason() {
        let err: GraphError = FactorError::NonPositiveSigma { value: -1.0 }.into();

        match err {
            GraphError::Factor { factor, reason } => {
                assert_eq!(factor, "gaussian");
                assert!(reason.contains("-1"));
            }
            other => panic!("expected GraphError::Factor, got {other:?}"),
        }
    }
}
