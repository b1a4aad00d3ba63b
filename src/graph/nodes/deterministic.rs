//! DeterministicFactorNode — factors that produce derived variables.
//!
//! Purpose
//! -------
//! Wrap a factor that computes one or more derived variable values and
//! present them in the declared variable shapes, so a model `f(g(x))` can be
//! expressed as two independently testable pieces `g` producing `y` and `f`
//! consuming `y`, joined through the shared variable name.
//!
//! Key behaviors
//! -------------
//! - The declared output count must match the factor's declared arity at
//!   construction, and the produced count is checked again on every call; a
//!   disagreement is surfaced as a structured error, never silently
//!   mis-zipped.
//! - Raw outputs are reshaped to `batch dims ++ own plate extents` per
//!   declared variable; an empty target shape leaves the value as-is.
//! - A purely deterministic node contributes the additive identity as its
//!   log value: scalar `0` when the call shape is empty, else a zero tensor
//!   of the call shape.
//!
//! Invariants & assumptions
//! ------------------------
//! - Raw outputs are assumed to be laid out in broadcasting-compatible
//!   order; reshaping changes shape only, never element order.
//! - Every plate a declared output ranges over must be provided by some
//!   input of the node, otherwise its extent cannot be resolved.
//!
//! Testing notes
//! -------------
//! - Unit tests cover reshape correctness (flat and batched outputs), the
//!   zero log contribution, and arity/plate error paths.
use crate::graph::core::broadcast;
use crate::graph::core::factor::Factor;
use crate::graph::core::plate::Plate;
use crate::graph::core::value::{FactorValue, Tensor};
use crate::graph::core::variable::Variable;
use crate::graph::errors::{GraphError, GraphResult};
use crate::graph::nodes::factor_node::FactorNode;
use ndarray::{ArrayD, ArrayViewD, IxDyn};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// A factor node that additionally declares deterministic output variables.
#[derive(Clone)]
pub struct DeterministicFactorNode {
    node: FactorNode,
    outputs: Vec<Variable>,
}

impl DeterministicFactorNode {
    /// Bind a factor to its positional variables and declare its outputs.
    ///
    /// # Errors
    /// - [`GraphError::OutputArityMismatch`] when the factor's declared
    ///   arity disagrees with the declared output-variable count.
    pub fn new(
        factor: Arc<dyn Factor>, positional: Vec<Variable>, outputs: Vec<Variable>,
    ) -> GraphResult<DeterministicFactorNode> {
        if factor.output_arity() != outputs.len() {
            return Err(GraphError::OutputArityMismatch {
                factor: factor.name().to_string(),
                declared: outputs.len(),
                returned: factor.output_arity(),
            });
        }
        Ok(DeterministicFactorNode { node: FactorNode::new(factor, positional), outputs })
    }

    /// Bind a keyword parameter of the factor to a variable.
    pub fn with_named(mut self, parameter: &str, variable: Variable) -> DeterministicFactorNode {
        self.node = self.node.with_named(parameter, variable);
        self
    }

    /// The factor's name.
    pub fn name(&self) -> &str {
        self.node.name()
    }

    /// The wrapped input-binding node.
    pub fn node(&self) -> &FactorNode {
        &self.node
    }

    /// Declared output variables, in declaration order.
    pub fn output_variables(&self) -> &[Variable] {
        &self.outputs
    }

    /// Ordered plate union of the bound input variables.
    pub fn plates(&self) -> &[Plate] {
        self.node.plates()
    }

    /// Number of plates this node ranges over.
    pub fn ndim(&self) -> usize {
        self.node.ndim()
    }

    /// Names this node binds that are absent from `available`.
    pub fn variables_difference(&self, available: &BTreeSet<String>) -> BTreeSet<String> {
        self.node.variables_difference(available)
    }

    /// Render the node's call signature for error messages.
    pub fn call_signature(&self) -> String {
        self.node.call_signature()
    }

    /// Call the node, producing its deterministic values in declared shapes.
    ///
    /// # Errors
    /// - Input-resolution errors as for [`FactorNode::call`].
    /// - [`GraphError::OutputArityMismatch`] when the factor produces a
    ///   different number of outputs than declared.
    /// - [`GraphError::UnknownOutputPlate`] when an output variable ranges
    ///   over a plate no input provides.
    /// - [`GraphError::ReshapeMismatch`] when a raw output's element count
    ///   does not fit its target shape.
    pub fn call(
        &self, positional: &[Tensor], named: &HashMap<String, Tensor>,
    ) -> GraphResult<FactorValue> {
        let resolved = self.node.resolve(positional, named)?;
        let views: Vec<ArrayViewD<'_, f64>> =
            resolved.iter().map(|(_, view)| view.clone()).collect();
        let raw = self.node.factor().evaluate(&views)?;
        if raw.len() != self.outputs.len() {
            return Err(GraphError::OutputArityMismatch {
                factor: self.name().to_string(),
                declared: self.outputs.len(),
                returned: raw.len(),
            });
        }

        let sizes = broadcast::plate_sizes(&resolved)?;
        let call_shape = broadcast::function_shape(&resolved, self.node.plates())?;
        let shift = call_shape.len() - self.ndim();

        let mut deterministic_values = HashMap::with_capacity(self.outputs.len());
        for (variable, value) in self.outputs.iter().zip(raw) {
            let mut target: Vec<usize> = call_shape[..shift].to_vec();
            for plate in variable.plates() {
                let extent = sizes.get(&plate.id()).copied().ok_or_else(|| {
                    GraphError::UnknownOutputPlate {
                        variable: variable.name().to_string(),
                        plate: plate.name().to_string(),
                    }
                })?;
                target.push(extent);
            }
            let shaped = if target.is_empty() {
                value
            } else {
                let len = value.len();
                value.into_shape_with_order(IxDyn(&target)).map_err(|_| {
                    GraphError::ReshapeMismatch {
                        variable: variable.name().to_string(),
                        target: target.clone(),
                        len,
                    }
                })?
            };
            deterministic_values.insert(variable.name().to_string(), shaped);
        }

        let log_value = ArrayD::zeros(IxDyn(&call_shape));
        Ok(FactorValue::new(log_value, deterministic_values))
    }
}

impl std::fmt::Display for DeterministicFactorNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> =
            self.outputs.iter().map(|variable| variable.name()).collect();
        write!(f, "({} == ({}))", self.node, names.join(", "))
    }
}

impl std::fmt::Debug for DeterministicFactorNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DeterministicFactorNode({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::core::factor::DeterministicFn;
    use crate::graph::core::value::scalar;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Reshape targets for scalar, plated, and batched calls.
    // - The additive-identity log contribution.
    // - Declared-vs-produced arity enforcement at construction and call time.
    // - Unresolvable output plates and outputs that misfit their extents.
    //
    // These tests intentionally DO NOT cover:
    // - Graph-level scheduling of deterministic producers; see `factor_graph`.
    // -------------------------------------------------------------------------

    // Purpose
    // -------
    // Build a deterministic doubling node `x -> y = 2x` where both variables
    // range over the given plates.
    fn make_double_node(input: Variable, output: Variable) -> DeterministicFactorNode {
        let factor: Arc<dyn Factor> = Arc::new(DeterministicFn::new("double", 1, |inputs| {
            Ok(vec![inputs[0].mapv(|v| 2.0 * v)])
        }));
        DeterministicFactorNode::new(factor, vec![input], vec![output]).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // A scalar call leaves the output unshaped and contributes a scalar
    // zero log value.
    //
    // Given
    // -----
    // - Plate-free x = 2.
    //
    // Expect
    // ------
    // - y = 4 as a scalar; log value 0 with empty shape.
    fn call_passes_scalar_outputs_through_unshaped() {
        let node = make_double_node(Variable::new("x"), Variable::new("y"));
        let mut named = HashMap::new();
        named.insert("x".to_string(), scalar(2.0));

        let value = node.call(&[], &named).unwrap();

        assert_eq!(value.deterministic_values["y"], scalar(4.0));
        assert_eq!(value.log_value, scalar(0.0));
    }

    #[test]
    // Purpose
    // -------
    // A flat output over one plate of extent 4 keeps shape (4,), and the
    // log contribution is a zero tensor of the call shape.
    //
    // Given
    // -----
    // - x over plate obs bound to 4 elements.
    //
    // Expect
    // ------
    // - y has shape (4,); log value is zeros of shape (4,).
    fn call_shapes_plated_output_to_plate_extent() {
        let obs = Plate::new("obs");
        let node = make_double_node(
            Variable::with_plates("x", vec![obs.clone()]),
            Variable::with_plates("y", vec![obs]),
        );
        let mut named = HashMap::new();
        named.insert("x".to_string(), ArrayD::from_elem(IxDyn(&[4]), 1.5));

        let value = node.call(&[], &named).unwrap();

        assert_eq!(value.deterministic_values["y"].shape(), &[4]);
        assert!(value.deterministic_values["y"].iter().all(|&v| v == 3.0));
        assert_eq!(value.log_value, ArrayD::zeros(IxDyn(&[4])));
    }

    #[test]
    // Purpose
    // -------
    // An extra leading batch dimension carries through to the output shape.
    //
    // Given
    // -----
    // - The same node, with x bound to a (3, 4) value.
    //
    // Expect
    // ------
    // - y has shape (3, 4).
    fn call_prepends_batch_dims_to_output_shape() {
        let obs = Plate::new("obs");
        let node = make_double_node(
            Variable::with_plates("x", vec![obs.clone()]),
            Variable::with_plates("y", vec![obs]),
        );
        let mut named = HashMap::new();
        named.insert("x".to_string(), ArrayD::from_elem(IxDyn(&[3, 4]), 1.0));

        let value = node.call(&[], &named).unwrap();

        assert_eq!(value.deterministic_values["y"].shape(), &[3, 4]);
    }

    #[test]
    // Purpose
    // -------
    // A factor whose declared arity disagrees with the declared output
    // variables is rejected at construction.
    //
    // Given
    // -----
    // - A one-output factor declared with two output variables.
    //
    // Expect
    // ------
    // - `OutputArityMismatch { declared: 2, returned: 1 }`.
    fn new_rejects_arity_disagreement() {
        let factor: Arc<dyn Factor> = Arc::new(DeterministicFn::new("single", 1, |inputs| {
            Ok(vec![inputs[0].to_owned()])
        }));

        let err = DeterministicFactorNode::new(
            factor,
            vec![Variable::new("x")],
            vec![Variable::new("y"), Variable::new("z")],
        )
        .unwrap_err();

        assert_eq!(
            err,
            GraphError::OutputArityMismatch {
                factor: "single".to_string(),
                declared: 2,
                returned: 1,
            }
        );
    }

    #[test]
    // Purpose
    // -------
    // A factor that lies about its arity at call time is caught before any
    // zipping with declared variables.
    //
    // Given
    // -----
    // - A factor declaring arity 2 but returning one tensor.
    //
    // Expect
    // ------
    // - `OutputArityMismatch { declared: 2, returned: 1 }` from `call`.
    fn call_rejects_produced_count_disagreement() {
        let factor: Arc<dyn Factor> = Arc::new(DeterministicFn::new("liar", 2, |inputs| {
            Ok(vec![inputs[0].to_owned()])
        }));
        let node = DeterministicFactorNode::new(
            factor,
            vec![Variable::new("x")],
            vec![Variable::new("y"), Variable::new("z")],
        )
        .unwrap();
        let mut named = HashMap::new();
        named.insert("x".to_string(), scalar(1.0));

        let err = node.call(&[], &named).unwrap_err();

        assert_eq!(
            err,
            GraphError::OutputArityMismatch {
                factor: "liar".to_string(),
                declared: 2,
                returned: 1,
            }
        );
    }

    #[test]
    // Purpose
    // -------
    // An output whose element count disagrees with the resolved plate
    // extent cannot be shaped to the declared variable.
    //
    // Given
    // -----
    // - x over plate obs bound to 4 elements; a factor returning a fixed
    //   3-element tensor for y over the same plate.
    //
    // Expect
    // ------
    // - `ReshapeMismatch { variable: "y", target: [4], len: 3 }`.
    fn call_rejects_output_length_against_plate_extent() {
        let obs = Plate::new("obs");
        let factor: Arc<dyn Factor> = Arc::new(DeterministicFn::new("truncate", 1, |_| {
            Ok(vec![ArrayD::from_elem(IxDyn(&[3]), 1.0)])
        }));
        let node = DeterministicFactorNode::new(
            factor,
            vec![Variable::with_plates("x", vec![obs.clone()])],
            vec![Variable::with_plates("y", vec![obs])],
        )
        .unwrap();
        let mut named = HashMap::new();
        named.insert("x".to_string(), ArrayD::from_elem(IxDyn(&[4]), 1.0));

        let err = node.call(&[], &named).unwrap_err();

        assert_eq!(
            err,
            GraphError::ReshapeMismatch {
                variable: "y".to_string(),
                target: vec![4],
                len: 3,
            }
        );
    }

    #[test]
    // Purpose
    // -------
    // An output variable over a plate no input provides cannot resolve its
    // extent.
    //
    // Given
    // -----
    // - Scalar input x; output y declared over a fresh plate.
    //
    // Expect
    // ------
    // - `UnknownOutputPlate` naming the variable and the plate.
    fn call_rejects_output_plate_absent_from_inputs() {
        let node = make_double_node(
            Variable::new("x"),
            Variable::with_plates("y", vec![Plate::new("hidden")]),
        );
        let mut named = HashMap::new();
        named.insert("x".to_string(), scalar(1.0));

        let err = node.call(&[], &named).unwrap_err();

        assert_eq!(
            err,
            GraphError::UnknownOutputPlate {
                variable: "y".to_string(),
                plate: "hidden".to_string(),
            }
        );
    }
}
