//! Deterministic stock transforms: affine maps, elementwise sums, exp.
//!
//! Single-output [`Factor`] implementations for the deterministic middle of
//! a model: a prediction assembled from inputs, then consumed by a
//! likelihood downstream. All three are elementwise, so outputs keep the
//! co-broadcast shape of their inputs and reshape cleanly against the
//! declared output variable's plates.
use crate::graph::core::broadcast;
use crate::graph::core::factor::Factor;
use crate::graph::core::value::Tensor;
use crate::graph::errors::{GraphError, GraphResult};
use ndarray::ArrayViewD;

/// Elementwise affine transform `scale * x + offset` of a single input.
pub struct Affine {
    name: String,
    scale: f64,
    offset: f64,
}

impl Affine {
    /// Build a named affine transform.
    pub fn new(name: impl Into<String>, scale: f64, offset: f64) -> Affine {
        Affine { name: name.into(), scale, offset }
    }
}

impl Factor for Affine {
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
        Ok(vec![input.mapv(|v| self.scale * v + self.offset)])
    }
}

/// Elementwise sum of every input, co-broadcast under trailing-alignment
/// rules.
pub struct Sum {
    name: String,
}

impl Sum {
    /// Build a named sum transform.
    pub fn new(name: impl Into<String>) -> Sum {
        Sum { name: name.into() }
    }
}

impl Factor for Sum {
    fn name(&self) -> &str {
        &self.name
    }

    fn output_arity(&self) -> usize {
        1
    }

    fn evaluate(&self, inputs: &[ArrayViewD<'_, f64>]) -> GraphResult<Vec<Tensor>> {
        let Some((first, rest)) = inputs.split_first() else {
            return Err(GraphError::Factor {
                factor: self.name.clone(),
                reason: "called with no inputs".to_string(),
            });
        };
        let mut total = first.to_owned();
        for view in rest {
            total = broadcast::add_arrays(&total, &view.to_owned())?;
        }
        Ok(vec![total])
    }
}

/// Elementwise exponential of a single input.
pub struct Exp {
    name: String,
}

impl Exp {
    /// Build a named exponential transform.
    pub fn new(name: impl Into<String>) -> Exp {
        Exp { name: name.into() }
    }
}

impl Factor for Exp {
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
        Ok(vec![input.mapv(f64::exp)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::core::value::scalar;
    use ndarray::{ArrayD, IxDyn};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Elementwise semantics of each transform.
    // - Co-broadcast summation across mixed shapes.
    // - The no-input sum error path and single-input count guards.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Affine applies `scale * x + offset` per element.
    //
    // Given
    // -----
    // - scale 2, offset -1, input [0, 1, 2].
    //
    // Expect
    // ------
    // - [-1, 1, 3].
    fn affine_is_elementwise() {
        let affine = Affine::new("affine", 2.0, -1.0);
        let input = ArrayD::from_shape_vec(IxDyn(&[3]), vec![0.0, 1.0, 2.0]).unwrap();

        let outputs = affine.evaluate(&[input.view()]).unwrap();

        assert_eq!(
            outputs[0],
            ArrayD::from_shape_vec(IxDyn(&[3]), vec![-1.0, 1.0, 3.0]).unwrap()
        );
    }

    #[test]
    // Purpose
    // -------
    // Sum co-broadcasts its inputs instead of requiring equal shapes.
    //
    // Given
    // -----
    // - A (2, 1) input of ones, a (3,) input of tens, and a scalar 100.
    //
    // Expect
    // ------
    // - Shape (2, 3), every element 111.
    fn sum_co_broadcasts_inputs() {
        let sum = Sum::new("sum");
        let ones = ArrayD::from_elem(IxDyn(&[2, 1]), 1.0);
        let tens = ArrayD::from_elem(IxDyn(&[3]), 10.0);
        let hundred = scalar(100.0);

        let outputs = sum.evaluate(&[ones.view(), tens.view(), hundred.view()]).unwrap();

        assert_eq!(outputs[0].shape(), &[2, 3]);
        assert!(outputs[0].iter().all(|&v| v == 111.0));
    }

    #[test]
    // Purpose
    // -------
    // A sum over nothing has no defined shape and is an error, not a
    // silent scalar zero.
    //
    // Given
    // -----
    // - No inputs.
    //
    // Expect
    // ------
    // - `GraphError::Factor` naming the node.
    fn sum_rejects_empty_input_list() {
        let sum = Sum::new("sum");

        let err = sum.evaluate(&[]).unwrap_err();

        assert_eq!(
            err,
            GraphError::Factor {
                factor: "sum".to_string(),
                reason: "called with no inputs".to_string(),
            }
        );
    }

    #[test]
    // Purpose
    // -------
    // Exp applies the exponential per element.
    //
    // Given
    // -----
    // - Input [0, 1].
    //
    // Expect
    // ------
    // - [1, e].
    fn exp_is_elementwise() {
        let exp = Exp::new("exp");
        let input = ArrayD::from_shape_vec(IxDyn(&[2]), vec![0.0, 1.0]).unwrap();

        let outputs = exp.evaluate(&[input.view()]).unwrap();

        assert!((outputs[0][[0]] - 1.0).abs() < 1e-12);
        assert!((outputs[0][[1]] - std::f64::consts::E).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Single-input transforms error on a missing or surplus input instead
    // of panicking on a bad index.
    //
    // Given
    // -----
    // - Affine with no inputs; Exp with two.
    //
    // Expect
    // ------
    // - `GraphError::Factor` naming the node and the received count.
    fn single_input_transforms_reject_wrong_input_counts() {
        let affine = Affine::new("affine", 2.0, 0.0);
        let exp = Exp::new("exp");
        let value = scalar(1.0);

        let affine_err = affine.evaluate(&[]).unwrap_err();
        let exp_err = exp.evaluate(&[value.view(), value.view()]).unwrap_err();

        assert_eq!(
            affine_err,
            GraphError::Factor {
                factor: "affine".to_string(),
                reason: "expected exactly one input, got 0".to_string(),
            }
        );
        assert_eq!(
            exp_err,
            GraphError::Factor {
                factor: "exp".to_string(),
                reason: "expected exactly one input, got 2".to_string(),
            }
        );
    }
}
