//! Errors for stock-factor parameter validation.
//!
//! This module defines [`FactorError`], raised by the constructors of the
//! stock factor library when distribution parameters or carried data are
//! invalid. Evaluation-time failures inside factors are normalized to
//! `GraphError::Factor` by the engine; construction keeps this richer type
//! so model-authoring code can match on the concrete problem.
//!
//! ## Conventions
//! - Validation happens at construction: a stock factor that constructs
//!   evaluates without parameter failures.
//! - [`FactorError::factor`] names the factor family for error routing.

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, PyErr};

/// Result alias for stock-factor construction.
pub type FactorResult<T> = Result<T, FactorError>;

/// Parameter-validation errors raised by stock factor constructors.
#[derive(Debug, Clone, PartialEq)]
pub enum FactorError {
    // ---- Distribution parameters ----
    /// A distribution parameter is NaN or infinite.
    NonFiniteParameter { name: &'static str, value: f64 },

    /// A scale parameter is zero, negative, NaN, or infinite.
    NonPositiveSigma { value: f64 },

    // ---- Carried data ----
    /// A likelihood factor was given an empty observation set.
    EmptyData,

    /// The noise map's element count disagrees with the observations'.
    NoiseLengthMismatch { data: usize, noise: usize },
}

impl FactorError {
    /// The factor family the error belongs to, used when normalizing into
    /// engine errors.
    pub fn factor(&self) -> &'static str {
        match self {
            FactorError::NonFiniteParameter { .. }
            | FactorError::NonPositiveSigma { .. }
            | FactorError::EmptyData
            | FactorError::NoiseLengthMismatch { .. } => "gaussian",
        }
    }
}

impl std::error::Error for FactorError {}

impl std::fmt::Display for FactorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FactorError::NonFiniteParameter { name, value } => {
                write!(f, "parameter `{name}` must be finite, got {value}")
            }
            FactorError::NonPositiveSigma { value } => {
                write!(f, "sigma must be finite and positive, got {value}")
            }
            FactorError::EmptyData => {
                write!(f, "likelihood requires at least one observation")
            }
            FactorError::NoiseLengthMismatch { data, noise } => {
                write!(
                    f,
                    "noise map length {noise} does not match {data} observations"
                )
            }
        }
    }
}

// ---- Python conversion ----------------------------------------------------

#[cfg(feature = "python-bindings")]
impl From<FactorError> for PyErr {
    fn from(err: FactorError) -> PyErr {
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
    // - `Display` payloads for every variant.
    // - Family attribution via `factor()`.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Messages carry the offending values so callers need not re-derive
    // them.
    //
    // Given
    // -----
    // - One error of each variant.
    //
    // Expect
    // ------
    // - Each message names its parameter and value.
    fn display_carries_offending_values() {
        let non_finite = FactorError::NonFiniteParameter { name: "mu", value: f64::NAN };
        let sigma = FactorError::NonPositiveSigma { value: 0.0 };
        let empty = FactorError::EmptyData;
        let lengths = FactorError::NoiseLengthMismatch { data: 4, noise: 3 };

        assert_eq!(non_finite.to_string(), "parameter `mu` must be finite, got NaN");
        assert_eq!(sigma.to_string(), "sigma must be finite and positive, got 0");
        assert_eq!(empty.to_string(), "likelihood requires at least one observation");
        assert_eq!(
            lengths.to_string(),
            "noise map length 3 does not match 4 observations"
        );
    }

    #[test]
    // Purpose
    // -------
    // Every current variant belongs to the Gaussian family.
    //
    // Given
    // -----
    // - A `NonPositiveSigma` and an `EmptyData` error.
    //
    // Expect
    // ------
    // - `factor()` returns "gaussian" for both.
    fn factor_names_the_family() {
        assert_eq!(FactorError::NonPositiveSigma { value: -2.0 }.factor(), "gaussian");
        assert_eq!(FactorError::EmptyData.factor(), "gaussian");
    }
}
