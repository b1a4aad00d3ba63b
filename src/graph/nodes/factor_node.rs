//! FactorNode — a factor bound to concrete variables.
//!
//! Purpose
//! -------
//! Provide the unit of scheduling in a factor graph: one [`Factor`] bound to
//! an ordered list of positional variables and a mapping of keyword-parameter
//! variables, with a uniform call contract and a declared plate set.
//!
//! Key behaviors
//! -------------
//! - [`FactorNode::call`] resolves every bound variable from positional
//!   values (construction order) and/or keyword values (by variable name),
//!   evaluates the factor, and returns a [`FactorValue`] with the factor's
//!   log contribution and no deterministic outputs.
//! - [`FactorNode::variables_difference`] is the pure dependency probe used
//!   by graph scheduling.
//! - The node's plate set is the first-occurrence union of its variables'
//!   plates; `ndim` is the plate count.
//!
//! Invariants & assumptions
//! ------------------------
//! - Nodes are immutable after construction and purely functional: calling
//!   one has no side effects.
//! - Extra keyword values are ignored; the graph forwards its full variable
//!   map to every node.
//! - The factor's log output carries `batch dims ++ node plate dims`; the
//!   graph checks this contract when aligning contributions.
//!
//! Conventions
//! -----------
//! - Keyword bindings map a factor parameter name to a variable; resolution
//!   at call time is by **variable** name, matching the graph's variable
//!   namespace.
//!
//! Testing notes
//! -------------
//! - Unit tests cover call resolution, arity and missing-argument errors,
//!   the dependency probe, and plate-union derivation.
use crate::graph::core::broadcast;
use crate::graph::core::factor::Factor;
use crate::graph::core::plate::Plate;
use crate::graph::core::validation::ordered_plate_union;
use crate::graph::core::value::{FactorValue, Tensor};
use crate::graph::core::variable::Variable;
use crate::graph::errors::{GraphError, GraphResult};
use ndarray::ArrayViewD;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// A factor bound to concrete variables for each of its parameters.
#[derive(Clone)]
pub struct FactorNode {
    factor: Arc<dyn Factor>,
    positional: Vec<Variable>,
    named: Vec<(String, Variable)>,
    plates: Vec<Plate>,
}

impl FactorNode {
    /// Bind a factor to its positional variables.
    ///
    /// Keyword-parameter bindings are added with [`FactorNode::with_named`];
    /// insertion order is preserved and becomes part of the factor's input
    /// order.
    pub fn new(factor: Arc<dyn Factor>, positional: Vec<Variable>) -> FactorNode {
        let plates = ordered_plate_union(positional.iter().map(|variable| variable.plates()));
        FactorNode { factor, positional, named: Vec::new(), plates }
    }

    /// Bind a keyword parameter of the factor to a variable.
    pub fn with_named(mut self, parameter: &str, variable: Variable) -> FactorNode {
        self.named.push((parameter.to_string(), variable));
        self.plates = ordered_plate_union(self.variables().map(|variable| variable.plates()));
        self
    }

    /// The underlying factor.
    pub fn factor(&self) -> &Arc<dyn Factor> {
        &self.factor
    }

    /// The factor's name.
    pub fn name(&self) -> &str {
        self.factor.name()
    }

    /// Ordered positional variables.
    pub fn positional_variables(&self) -> &[Variable] {
        &self.positional
    }

    /// Keyword-parameter bindings in insertion order.
    pub fn named_variables(&self) -> &[(String, Variable)] {
        &self.named
    }

    /// Every bound variable, positional first, then keyword bindings.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.positional.iter().chain(self.named.iter().map(|(_, variable)| variable))
    }

    /// Ordered union of the plates implied by the bound variables.
    pub fn plates(&self) -> &[Plate] {
        &self.plates
    }

    /// Number of plates this node ranges over.
    pub fn ndim(&self) -> usize {
        self.plates.len()
    }

    /// Names this node binds that are absent from `available`.
    ///
    /// Pure dependency probe used by graph scheduling; an empty result means
    /// the node is callable from `available` alone.
    pub fn variables_difference(&self, available: &BTreeSet<String>) -> BTreeSet<String> {
        self.variables()
            .map(|variable| variable.name().to_string())
            .filter(|name| !available.contains(name))
            .collect()
    }

    /// Render the node's call signature for error messages.
    pub fn call_signature(&self) -> String {
        let mut parts: Vec<String> =
            self.positional.iter().map(|variable| variable.name().to_string()).collect();
        if !self.named.is_empty() {
            parts.push("*".to_string());
            parts.extend(self.named.iter().map(|(_, variable)| variable.name().to_string()));
        }
        format!("{}({})", self.name(), parts.join(", "))
    }

    /// Call the node with positional and keyword values.
    ///
    /// Positional values fill positional variables in construction order;
    /// unfilled slots and keyword parameters resolve from `named` by
    /// variable name. Extra named entries are ignored.
    ///
    /// # Errors
    /// - [`GraphError::TooManyArguments`] when more positional values are
    ///   supplied than the node has positional variables.
    /// - [`GraphError::MissingArguments`] enumerating every unresolved name.
    /// - [`GraphError::OutputArityMismatch`] when the factor does not
    ///   produce exactly one output.
    /// - Any error raised inside the factor, propagated unchanged.
    pub fn call(
        &self, positional: &[Tensor], named: &HashMap<String, Tensor>,
    ) -> GraphResult<FactorValue> {
        let resolved = self.resolve(positional, named)?;
        let views: Vec<ArrayViewD<'_, f64>> =
            resolved.iter().map(|(_, view)| view.clone()).collect();
        let mut outputs = self.factor.evaluate(&views)?;
        let returned = outputs.len();
        match (outputs.pop(), returned) {
            (Some(log_value), 1) => Ok(FactorValue::new(log_value, HashMap::new())),
            _ => Err(GraphError::OutputArityMismatch {
                factor: self.name().to_string(),
                declared: 1,
                returned,
            }),
        }
    }

    /// The node's call shape for the given inputs: co-broadcast batch dims
    /// followed by this node's plate extents. Exposed for diagnostics; the
    /// deterministic reshape path relies on it.
    pub fn function_shape(
        &self, positional: &[Tensor], named: &HashMap<String, Tensor>,
    ) -> GraphResult<Vec<usize>> {
        let resolved = self.resolve(positional, named)?;
        broadcast::function_shape(&resolved, &self.plates)
    }

    /// Resolve every bound variable to a value view, in factor input order.
    pub(crate) fn resolve<'a>(
        &'a self, positional: &'a [Tensor], named: &'a HashMap<String, Tensor>,
    ) -> GraphResult<Vec<(&'a Variable, ArrayViewD<'a, f64>)>> {
        if positional.len() > self.positional.len() {
            return Err(GraphError::TooManyArguments {
                given: positional.len(),
                expected: self.positional.len(),
                signature: self.call_signature(),
            });
        }

        let mut resolved = Vec::with_capacity(self.positional.len() + self.named.len());
        let mut missing: BTreeSet<String> = BTreeSet::new();
        for (slot, variable) in self.positional.iter().enumerate() {
            let value = positional.get(slot).or_else(|| named.get(variable.name()));
            match value {
                Some(value) => resolved.push((variable, value.view())),
                None => {
                    missing.insert(variable.name().to_string());
                }
            }
        }
        for (_, variable) in &self.named {
            match named.get(variable.name()) {
                Some(value) => resolved.push((variable, value.view())),
                None => {
                    missing.insert(variable.name().to_string());
                }
            }
        }

        if !missing.is_empty() {
            return Err(GraphError::MissingArguments {
                missing: missing.into_iter().collect(),
                signature: self.call_signature(),
            });
        }
        Ok(resolved)
    }
}

impl std::fmt::Display for FactorNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.variables().map(|variable| variable.name()).collect();
        write!(f, "{}({})", self.name(), names.join(", "))
    }
}

impl std::fmt::Debug for FactorNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FactorNode({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::core::factor::FactorFn;
    use crate::graph::core::value::scalar;
    use ndarray::{ArrayD, IxDyn};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Call resolution (positional order, keyword fallback, extras ignored).
    // - Arity and missing-argument error payloads.
    // - The scheduling dependency probe.
    // - Plate-union derivation across positional and keyword bindings.
    //
    // These tests intentionally DO NOT cover:
    // - Deterministic reshaping; that lives in `deterministic`.
    // -------------------------------------------------------------------------

    // Purpose
    // -------
    // Build a two-input node computing `-0.5 (x - mu)^2` with `x` positional
    // and `mu` bound as a keyword parameter.
    fn make_residual_node() -> FactorNode {
        let factor: Arc<dyn Factor> = Arc::new(FactorFn::new("residual", |inputs| {
            let x = &inputs[0];
            let mu = &inputs[1];
            Ok((x - mu).mapv(|v| -0.5 * v * v))
        }));
        FactorNode::new(factor, vec![Variable::new("x")])
            .with_named("location", Variable::new("mu"))
    }

    #[test]
    // Purpose
    // -------
    // Positional values fill construction order; keyword parameters resolve
    // by variable name; unused keyword entries are ignored.
    //
    // Given
    // -----
    // - x = 3 positionally, mu = 1 by name, plus an unrelated entry.
    //
    // Expect
    // ------
    // - log value -0.5 * (3 - 1)^2 = -2, no deterministic outputs.
    fn call_resolves_positional_then_keyword_values() {
        let node = make_residual_node();
        let mut named = HashMap::new();
        named.insert("mu".to_string(), scalar(1.0));
        named.insert("unrelated".to_string(), scalar(9.0));

        let value = node.call(&[scalar(3.0)], &named).unwrap();

        assert_eq!(value.log_value_sum(), -2.0);
        assert!(value.deterministic_values.is_empty());
    }

    #[test]
    // Purpose
    // -------
    // A positional variable can also be supplied by keyword when no
    // positional value fills its slot.
    //
    // Given
    // -----
    // - Both x and mu by keyword, nothing positional.
    //
    // Expect
    // ------
    // - Same result as the positional call.
    fn call_falls_back_to_keyword_for_unfilled_positional_slots() {
        let node = make_residual_node();
        let mut named = HashMap::new();
        named.insert("x".to_string(), scalar(3.0));
        named.insert("mu".to_string(), scalar(1.0));

        let value = node.call(&[], &named).unwrap();

        assert_eq!(value.log_value_sum(), -2.0);
    }

    #[test]
    // Purpose
    // -------
    // Supplying more positional values than positional variables is an
    // arity error naming the node's call signature.
    //
    // Given
    // -----
    // - Two positional values for a one-positional-variable node.
    //
    // Expect
    // ------
    // - `TooManyArguments { given: 2, expected: 1 }` with the signature.
    fn call_rejects_excess_positional_values() {
        let node = make_residual_node();

        let err = node.call(&[scalar(1.0), scalar(2.0)], &HashMap::new()).unwrap_err();

        assert_eq!(
            err,
            GraphError::TooManyArguments {
                given: 2,
                expected: 1,
                signature: "residual(x, *, mu)".to_string(),
            }
        );
    }

    #[test]
    // Purpose
    // -------
    // Every unresolved variable is enumerated in one missing-arguments
    // error, sorted.
    //
    // Given
    // -----
    // - No values at all for a node binding x and mu.
    //
    // Expect
    // ------
    // - `MissingArguments { missing: [mu, x] }`.
    fn call_enumerates_every_missing_variable() {
        let node = make_residual_node();

        let err = node.call(&[], &HashMap::new()).unwrap_err();

        assert_eq!(
            err,
            GraphError::MissingArguments {
                missing: vec!["mu".to_string(), "x".to_string()],
                signature: "residual(x, *, mu)".to_string(),
            }
        );
    }

    #[test]
    // Purpose
    // -------
    // The dependency probe reports exactly the bound names absent from the
    // available set and never mutates anything.
    //
    // Given
    // -----
    // - Available = {x}; node binds x and mu.
    //
    // Expect
    // ------
    // - Difference = {mu}.
    fn variables_difference_reports_absent_names() {
        let node = make_residual_node();
        let available: BTreeSet<String> = [String::from("x")].into();

        let difference = node.variables_difference(&available);

        assert_eq!(difference, [String::from("mu")].into());
    }

    #[test]
    // Purpose
    // -------
    // The node's plates are the first-occurrence union across positional
    // and keyword bindings.
    //
    // Given
    // -----
    // - x over [row], sigma over [row, column] bound by keyword.
    //
    // Expect
    // ------
    // - Plates [row, column], ndim 2.
    fn plates_union_spans_positional_and_keyword_bindings() {
        let row = Plate::new("row");
        let column = Plate::new("column");
        let factor: Arc<dyn Factor> =
            Arc::new(FactorFn::new("field", |inputs| Ok(inputs[0].to_owned())));
        let node = FactorNode::new(
            factor,
            vec![Variable::with_plates("x", vec![row.clone()])],
        )
        .with_named(
            "scale",
            Variable::with_plates("sigma", vec![row.clone(), column.clone()]),
        );

        assert_eq!(node.plates(), &[row, column]);
        assert_eq!(node.ndim(), 2);
    }

    #[test]
    // Purpose
    // -------
    // `function_shape` combines batch dims with the node's plate extents.
    //
    // Given
    // -----
    // - x over one plate, bound to a (3, 4) value (batch 3, extent 4).
    //
    // Expect
    // ------
    // - Call shape (3, 4).
    fn function_shape_reports_batch_then_plate_extents() {
        let obs = Plate::new("obs");
        let factor: Arc<dyn Factor> =
            Arc::new(FactorFn::new("plated", |inputs| Ok(inputs[0].to_owned())));
        let node =
            FactorNode::new(factor, vec![Variable::with_plates("x", vec![obs])]);
        let mut named = HashMap::new();
        named.insert("x".to_string(), ArrayD::from_elem(IxDyn(&[3, 4]), 1.0));

        let shape = node.function_shape(&[], &named).unwrap();

        assert_eq!(shape, vec![3, 4]);
    }
}
