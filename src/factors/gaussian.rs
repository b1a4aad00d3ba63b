//! Gaussian stock factors: prior densities and data-carrying likelihoods.
//!
//! Purpose
//! -------
//! Provide ready-made [`Factor`] implementations for the most common model
//! building blocks: an elementwise Gaussian log-density over a variable
//! (prior-style) and a Gaussian likelihood carrying observed data with a
//! per-observation noise map.
//!
//! Key behaviors
//! -------------
//! - Both factors are elementwise: the log output keeps the input's shape
//!   (leading batch dims included), so plated variables contribute one log
//!   term per plate element and the engine's alignment rules apply cleanly.
//! - Parameters are validated at construction via [`FactorError`]; a factor
//!   that constructs evaluates without parameter failures.
//!
//! Invariants & assumptions
//! ------------------------
//! - `GaussianLikelihood` observations are non-empty and its noise map has
//!   one strictly positive, finite sigma per observation.
//! - Prediction values broadcast against the carried data under
//!   trailing-alignment rules, so batched predictions of shape
//!   `batch ++ data shape` evaluate per batch element.
use crate::factors::errors::{FactorError, FactorResult};
use crate::graph::core::factor::Factor;
use crate::graph::core::value::Tensor;
use crate::graph::errors::{GraphError, GraphResult};
use ndarray::{ArrayViewD, Zip};
use statrs::consts::LN_SQRT_2PI;
use statrs::distribution::{Continuous, Normal};

/// Elementwise Gaussian log-density factor, `log N(x; mu, sigma)` per input
/// element. The usual prior over a scalar or plated variable.
#[derive(Debug)]
pub struct GaussianPrior {
    name: String,
    distribution: Normal,
}

impl GaussianPrior {
    /// Build a named Gaussian prior.
    ///
    /// # Errors
    /// - [`FactorError::NonFiniteParameter`] when `mu` is NaN or infinite.
    /// - [`FactorError::NonPositiveSigma`] when `sigma` is not finite and
    ///   positive.
    pub fn new(name: impl Into<String>, mu: f64, sigma: f64) -> FactorResult<GaussianPrior> {
        if !mu.is_finite() {
            return Err(FactorError::NonFiniteParameter { name: "mu", value: mu });
        }
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(FactorError::NonPositiveSigma { value: sigma });
        }
        let distribution = Normal::new(mu, sigma)
            .map_err(|_| FactorError::NonPositiveSigma { value: sigma })?;
        Ok(GaussianPrior { name: name.into(), distribution })
    }
}

impl Factor for GaussianPrior {
    fn name(&self) -> &str {
        &self.name
    }

    fn output_arity(&self) -> usize {
        1
    }

    fn evaluate(&self, inputs: &[ArrayViewD<'_, f64>]) -> GraphResult<Vec<Tensor>> {
        let [input] = inputs else {
            return Err(GraphError::Factor {
                factor: self.name.clone(),
                reason: format!("expected exactly one input, got {}", inputs.len()),
            });
        };
        Ok(vec![input.mapv(|v| self.distribution.ln_pdf(v))])
    }
}

/// Gaussian likelihood over carried observations with a per-observation
/// noise map: `log N(data_i; prediction_i, noise_i)` per element.
#[derive(Debug)]
pub struct GaussianLikelihood {
    name: String,
    data: Tensor,
    noise: Tensor,
}

impl GaussianLikelihood {
    /// Build a named likelihood over `data` with per-observation sigmas.
    ///
    /// # Errors
    /// - [`FactorError::EmptyData`] when `data` has no elements.
    /// - [`FactorError::NoiseLengthMismatch`] when `noise` and `data` have
    ///   different element counts.
    /// - [`FactorError::NonPositiveSigma`] reporting the first noise entry
    ///   that is not finite and positive.
    pub fn new(
        name: impl Into<String>, data: Tensor, noise: Tensor,
    ) -> FactorResult<GaussianLikelihood> {
        if data.is_empty() {
            return Err(FactorError::EmptyData);
        }
        if noise.len() != data.len() {
            return Err(FactorError::NoiseLengthMismatch {
                data: data.len(),
                noise: noise.len(),
            });
        }
        if let Some(&bad) = noise.iter().find(|&&sigma| !sigma.is_finite() || sigma <= 0.0) {
            return Err(FactorError::NonPositiveSigma { value: bad });
        }
        Ok(GaussianLikelihood { name: name.into(), data, noise })
    }

    /// Carried observations.
    pub fn data(&self) -> &Tensor {
        &self.data
    }
}

impl Factor for GaussianLikelihood {
    fn name(&self) -> &str {
        &self.name
    }

    fn output_arity(&self) -> usize {
        1
    }

    fn evaluate(&self, inputs: &[ArrayViewD<'_, f64>]) -> GraphResult<Vec<Tensor>> {
        let [prediction] = inputs else {
            return Err(GraphError::Factor {
                factor: self.name.clone(),
                reason: format!("expected exactly one input, got {}", inputs.len()),
            });
        };
        let data = self.data.broadcast(prediction.raw_dim()).ok_or_else(|| {
            GraphError::BroadcastMismatch {
                left: self.data.shape().to_vec(),
                right: prediction.shape().to_vec(),
            }
        })?;
        let noise = self.noise.broadcast(prediction.raw_dim()).ok_or_else(|| {
            GraphError::BroadcastMismatch {
                left: self.noise.shape().to_vec(),
                right: prediction.shape().to_vec(),
            }
        })?;

        let mut log = prediction.to_owned();
        Zip::from(&mut log).and(&data).and(&noise).for_each(|value, &observed, &sigma| {
            let z = (observed - *value) / sigma;
            *value = -0.5 * z * z - sigma.ln() - LN_SQRT_2PI;
        });
        Ok(vec![log])
    }
}
