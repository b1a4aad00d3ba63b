//! rust_factorgraphs — factor-graph model evaluation with Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that
//! exposes the factor-graph engine to Python via the `_rust_factorgraphs`
//! extension module. When the `python-bindings` feature is enabled, this
//! module defines the Python-facing classes and submodules used by the
//! `rust_factorgraphs` package.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules (`graph` and `factors`) as the public
//!   crate surface.
//! - Define `#[pyclass]` wrappers and the `#[pymodule]` initializer for the
//!   `_rust_factorgraphs` Python extension.
//! - Create and register the `factor_graphs` Python submodule under
//!   `rust_factorgraphs` so that dot-notation imports work as expected.
//!
//! Invariants & assumptions
//! ------------------------
//! - All scheduling and numerical work is implemented in the inner Rust
//!   modules; this file performs only FFI glue, input conversion, and error
//!   mapping.
//! - When `python-bindings` is enabled, the Python-visible types mirror the
//!   invariants and signatures of their Rust counterparts (e.g.
//!   `FactorGraph`, `FactorValue`).
//! - Python callables wrapped as factors are treated as pure functions from
//!   float64 arrays to float64 arrays (or tuples of them); side effects are
//!   the caller's responsibility.
//!
//! Conventions
//! -----------
//! - Python-exposed classes live under `_rust_factorgraphs.factor_graphs`
//!   and are typically wrapped by thin pure-Python facades in the top-level
//!   `rust_factorgraphs` package.
//! - Values cross the boundary as float64 numpy arrays; bare floats become
//!   0-d tensors and flat sequences become 1-d tensors (see
//!   [`utils::extract_tensor`]).
//! - Errors from core Rust code are propagated as [`GraphError`] internally
//!   and converted to `PyErr` values at the PyO3 boundary; composing with a
//!   foreign operand raises `TypeError`.
//!
//! Downstream usage
//! ----------------
//! - Native Rust code should usually depend directly on the inner modules
//!   and can ignore the PyO3 items guarded by the `python-bindings` feature.
//! - The Python packaging layer imports the `_rust_factorgraphs` module
//!   defined here and wraps its classes in user-facing Python APIs.
//!
//! Testing notes
//! -------------
//! - Core behavior is covered by unit tests in the inner modules and by the
//!   crate's integration tests; Python smoke tests verify that classes can
//!   be constructed, composed, and called from Python.

pub mod factors;
pub mod graph;
pub mod utils;

#[cfg(feature = "python-bindings")]
use pyo3::{
    exceptions::PyTypeError,
    prelude::*,
    types::{PyAny, PyDict, PyTuple},
};

#[cfg(feature = "python-bindings")]
use numpy::PyArrayDyn;

#[cfg(feature = "python-bindings")]
use ndarray::ArrayViewD;

#[cfg(feature = "python-bindings")]
use std::sync::Arc;

#[cfg(feature = "python-bindings")]
use crate::{
    graph::{
        core::{factor::Factor, value::Tensor},
        errors::{GraphError, GraphResult},
        DeterministicFactorNode, FactorGraph, FactorNode, FactorValue, GraphNode, Plate,
        Variable,
    },
    utils::{extract_keyword_tensors, extract_positional_tensors, extract_tensor, tensor_to_py},
};

// ---- Python-callable factors ----------------------------------------------

/// A Python callable adapted to the [`Factor`] trait.
///
/// Inputs are handed to the callable as float64 numpy arrays in binding
/// order; the return value may be a single array-like (arity 1) or a tuple
/// of array-likes. Exceptions raised inside the callable are normalized to
/// [`GraphError::Factor`] with the factor's name.
#[cfg(feature = "python-bindings")]
struct PyCallableFactor {
    name: String,
    arity: usize,
    callable: Py<PyAny>,
}

#[cfg(feature = "python-bindings")]
impl PyCallableFactor {
    fn new(name: String, arity: usize, callable: Py<PyAny>) -> PyCallableFactor {
        PyCallableFactor { name, arity, callable }
    }

    fn failure(&self, err: PyErr) -> GraphError {
        GraphError::Factor { factor: self.name.clone(), reason: err.to_string() }
    }
}

#[cfg(feature = "python-bindings")]
impl Factor for PyCallableFactor {
    fn name(&self) -> &str {
        &self.name
    }

    fn output_arity(&self) -> usize {
        self.arity
    }

    fn evaluate(&self, inputs: &[ArrayViewD<'_, f64>]) -> GraphResult<Vec<Tensor>> {
        Python::with_gil(|py| {
            let args =
                PyTuple::new(py, inputs.iter().map(|view| tensor_to_py(py, &view.to_owned())))
                    .map_err(|err| self.failure(err))?;
            let result =
                self.callable.bind(py).call1(args).map_err(|err| self.failure(err))?;

            if let Ok(tuple) = result.downcast::<PyTuple>() {
                let mut outputs = Vec::with_capacity(tuple.len());
                for item in tuple.iter() {
                    outputs.push(extract_tensor(py, &item).map_err(|err| self.failure(err))?);
                }
                Ok(outputs)
            } else {
                Ok(vec![extract_tensor(py, &result).map_err(|err| self.failure(err))?])
            }
        })
    }
}

// Resolve the factor's display name: explicit `name` kwarg, then the
// callable's `__name__`, then a generic fallback.
#[cfg(feature = "python-bindings")]
fn callable_name(callable: &Bound<'_, PyAny>, name: Option<String>) -> String {
    match name {
        Some(name) => name,
        None => callable
            .getattr("__name__")
            .and_then(|attr| attr.extract::<String>())
            .unwrap_or_else(|_| "factor".to_string()),
    }
}

// Decompose the right operand of `*` into graph members, or raise
// `TypeError` for foreign types.
#[cfg(feature = "python-bindings")]
fn right_operand_nodes(other: &Bound<'_, PyAny>) -> PyResult<Vec<GraphNode>> {
    if let Ok(node) = other.extract::<PyRef<PyFactorNode>>() {
        return Ok(vec![GraphNode::Factor(node.inner.clone())]);
    }
    if let Ok(node) = other.extract::<PyRef<PyDeterministicFactorNode>>() {
        return Ok(vec![GraphNode::Deterministic(node.inner.clone())]);
    }
    if let Ok(graph) = other.extract::<PyRef<PyFactorGraph>>() {
        return Ok(graph.inner.nodes().to_vec());
    }
    Err(PyTypeError::new_err(format!(
        "cannot compose factor-graph nodes with {}",
        other.get_type().name()?
    )))
}

#[cfg(feature = "python-bindings")]
fn compose(left: Vec<GraphNode>, other: &Bound<'_, PyAny>) -> PyResult<PyFactorGraph> {
    let mut nodes = left;
    nodes.extend(right_operand_nodes(other)?);
    let inner = FactorGraph::new(nodes)?;
    Ok(PyFactorGraph { inner })
}

// ---- Python-facing classes ------------------------------------------------

/// Plate — Python-facing wrapper for a repeated model axis.
///
/// Plates are compared by identity: two `Plate("obs")` instances are
/// distinct axes, and the same instance is equal to itself wherever it
/// appears. Extents are resolved per call from bound values.
#[cfg(feature = "python-bindings")]
#[pyclass(name = "Plate", module = "rust_factorgraphs.factor_graphs")]
#[derive(Clone)]
pub struct PyPlate {
    inner: Plate,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PyPlate {
    #[new]
    pub fn new(name: &str) -> PyPlate {
        PyPlate { inner: Plate::new(name) }
    }

    /// The plate's display name.
    #[getter]
    pub fn name(&self) -> String {
        self.inner.name().to_string()
    }

    pub fn __eq__(&self, other: &PyPlate) -> bool {
        self.inner == other.inner
    }

    pub fn __hash__(&self) -> u64 {
        self.inner.id()
    }

    pub fn __repr__(&self) -> String {
        self.inner.to_string()
    }
}

/// Variable — Python-facing wrapper for a named model variable.
///
/// A variable is a name plus the ordered plates it ranges over; its plates
/// occupy the trailing axes of any value bound to it.
#[cfg(feature = "python-bindings")]
#[pyclass(name = "Variable", module = "rust_factorgraphs.factor_graphs")]
#[derive(Clone)]
pub struct PyVariable {
    inner: Variable,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PyVariable {
    #[new]
    #[pyo3(
        text_signature = "(name, plates=None)",
        signature = (name, plates = None)
    )]
    pub fn new(name: &str, plates: Option<Vec<PyPlate>>) -> PyVariable {
        let plates = plates
            .unwrap_or_default()
            .into_iter()
            .map(|plate| plate.inner)
            .collect::<Vec<Plate>>();
        PyVariable { inner: Variable::with_plates(name, plates) }
    }

    /// The variable's name.
    #[getter]
    pub fn name(&self) -> String {
        self.inner.name().to_string()
    }

    /// The ordered plates the variable ranges over.
    #[getter]
    pub fn plates(&self) -> Vec<PyPlate> {
        self.inner.plates().iter().map(|plate| PyPlate { inner: plate.clone() }).collect()
    }

    /// Number of plates (trailing value dimensions).
    #[getter]
    pub fn ndim(&self) -> usize {
        self.inner.ndim()
    }

    pub fn __repr__(&self) -> String {
        self.inner.to_string()
    }
}

/// FactorNode — Python-facing wrapper binding a callable to variables.
///
/// Purpose
/// -------
/// Expose [`FactorNode`] to Python: wrap a Python callable as a log factor
/// and bind it to positional and keyword-parameter variables.
///
/// Key behaviors
/// -------------
/// - The callable receives float64 numpy arrays in binding order and must
///   return a single array-like log value.
/// - Calling the node resolves values positionally (construction order)
///   and by variable name from keyword arguments.
/// - `*` composes the node with other nodes and graphs into a
///   [`FactorGraph`]; foreign operands raise `TypeError`.
///
/// Parameters
/// ----------
/// Constructed from Python via `FactorNode(factor, variables, named=None,
/// name=None)`:
/// - `factor`: a Python callable from arrays to an array-like log value.
/// - `variables`: ordered positional [`PyVariable`]s.
/// - `named`: optional `{parameter_name: Variable}` keyword bindings,
///   applied in insertion order.
/// - `name`: optional display name; defaults to the callable's `__name__`.
///
/// Notes
/// -----
/// - Native Rust code should use [`FactorNode`] directly; this wrapper
///   exists solely for the PyO3 binding surface.
#[cfg(feature = "python-bindings")]
#[pyclass(name = "FactorNode", module = "rust_factorgraphs.factor_graphs")]
pub struct PyFactorNode {
    inner: FactorNode,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PyFactorNode {
    #[new]
    #[pyo3(
        text_signature = "(factor, variables, /, named=None, name=None)",
        signature = (factor, variables, named = None, name = None)
    )]
    pub fn new(
        factor: &Bound<'_, PyAny>, variables: Vec<PyVariable>,
        named: Option<&Bound<'_, PyDict>>, name: Option<String>,
    ) -> PyResult<PyFactorNode> {
        let factor_name = callable_name(factor, name);
        let wrapped: Arc<dyn Factor> =
            Arc::new(PyCallableFactor::new(factor_name, 1, factor.clone().unbind()));
        let positional = variables.into_iter().map(|variable| variable.inner).collect();

        let mut inner = FactorNode::new(wrapped, positional);
        if let Some(named) = named {
            for (key, value) in named.iter() {
                let parameter: String = key.extract()?;
                let variable: PyVariable = value.extract()?;
                inner = inner.with_named(&parameter, variable.inner);
            }
        }
        Ok(PyFactorNode { inner })
    }

    /// The node's factor name.
    #[getter]
    pub fn name(&self) -> String {
        self.inner.name().to_string()
    }

    /// The node's call signature as rendered in error messages.
    #[getter]
    pub fn call_signature(&self) -> String {
        self.inner.call_signature()
    }

    /// The ordered plates the node ranges over.
    #[getter]
    pub fn plates(&self) -> Vec<PyPlate> {
        self.inner.plates().iter().map(|plate| PyPlate { inner: plate.clone() }).collect()
    }

    #[pyo3(signature = (*args, **kwargs))]
    pub fn __call__<'py>(
        &self, py: Python<'py>, args: &Bound<'py, PyTuple>, kwargs: Option<&Bound<'py, PyDict>>,
    ) -> PyResult<PyFactorValue> {
        let positional = extract_positional_tensors(py, args)?;
        let named = extract_keyword_tensors(py, kwargs)?;
        let inner = self.inner.call(&positional, &named)?;
        Ok(PyFactorValue { inner })
    }

    pub fn __mul__(&self, other: &Bound<'_, PyAny>) -> PyResult<PyFactorGraph> {
        compose(vec![GraphNode::Factor(self.inner.clone())], other)
    }

    pub fn __repr__(&self) -> String {
        self.inner.to_string()
    }
}

/// DeterministicFactorNode — Python-facing wrapper producing derived
/// variables.
///
/// Purpose
/// -------
/// Expose [`DeterministicFactorNode`] to Python: wrap a Python callable
/// producing one value per declared output variable (a tuple for several),
/// reshaped to each output's declared plates.
///
/// Parameters
/// ----------
/// Constructed from Python via `DeterministicFactorNode(factor, variables,
/// outputs, named=None, name=None)`:
/// - `factor`: a Python callable returning one array-like per output (a
///   tuple when there are several).
/// - `variables`: ordered positional input [`PyVariable`]s.
/// - `outputs`: the declared output variables, fixing the factor's arity.
/// - `named` / `name`: as for [`PyFactorNode`].
///
/// Notes
/// -----
/// - The node contributes zero to the joint log value; it exists to feed
///   derived variables to downstream factors.
#[cfg(feature = "python-bindings")]
#[pyclass(name = "DeterministicFactorNode", module = "rust_factorgraphs.factor_graphs")]
pub struct PyDeterministicFactorNode {
    inner: DeterministicFactorNode,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PyDeterministicFactorNode {
    #[new]
    #[pyo3(
        text_signature = "(factor, variables, outputs, /, named=None, name=None)",
        signature = (factor, variables, outputs, named = None, name = None)
    )]
    pub fn new(
        factor: &Bound<'_, PyAny>, variables: Vec<PyVariable>, outputs: Vec<PyVariable>,
        named: Option<&Bound<'_, PyDict>>, name: Option<String>,
    ) -> PyResult<PyDeterministicFactorNode> {
        let factor_name = callable_name(factor, name);
        let wrapped: Arc<dyn Factor> = Arc::new(PyCallableFactor::new(
            factor_name,
            outputs.len(),
            factor.clone().unbind(),
        ));
        let positional = variables.into_iter().map(|variable| variable.inner).collect();
        let declared = outputs.into_iter().map(|variable| variable.inner).collect();

        let mut inner = DeterministicFactorNode::new(wrapped, positional, declared)?;
        if let Some(named) = named {
            for (key, value) in named.iter() {
                let parameter: String = key.extract()?;
                let variable: PyVariable = value.extract()?;
                inner = inner.with_named(&parameter, variable.inner);
            }
        }
        Ok(PyDeterministicFactorNode { inner })
    }

    /// The node's factor name.
    #[getter]
    pub fn name(&self) -> String {
        self.inner.name().to_string()
    }

    /// Declared output variable names, in declaration order.
    #[getter]
    pub fn outputs(&self) -> Vec<String> {
        self.inner
            .output_variables()
            .iter()
            .map(|variable| variable.name().to_string())
            .collect()
    }

    #[pyo3(signature = (*args, **kwargs))]
    pub fn __call__<'py>(
        &self, py: Python<'py>, args: &Bound<'py, PyTuple>, kwargs: Option<&Bound<'py, PyDict>>,
    ) -> PyResult<PyFactorValue> {
        let positional = extract_positional_tensors(py, args)?;
        let named = extract_keyword_tensors(py, kwargs)?;
        let inner = self.inner.call(&positional, &named)?;
        Ok(PyFactorValue { inner })
    }

    pub fn __mul__(&self, other: &Bound<'_, PyAny>) -> PyResult<PyFactorGraph> {
        compose(vec![GraphNode::Deterministic(self.inner.clone())], other)
    }

    pub fn __repr__(&self) -> String {
        self.inner.to_string()
    }
}

/// FactorGraph — Python-facing wrapper for a validated factor graph.
///
/// Purpose
/// -------
/// Expose [`FactorGraph`] to Python: a composed, validated model that
/// evaluates to a joint log value plus its deterministic variables.
///
/// Key behaviors
/// -------------
/// - Built by composing nodes and graphs with `*`; construction validation
///   (duplicate deterministic names, unresolvable dependencies) raises
///   `ValueError`.
/// - Calling the graph resolves positional values against the shared
///   positional parameters and everything else by variable name.
/// - Scheduling metadata (`call_sequence`, variable sets) is exposed for
///   inspection.
///
/// Notes
/// -----
/// - Native Rust code should use [`FactorGraph`] directly; this wrapper
///   exists solely for the PyO3 binding surface.
#[cfg(feature = "python-bindings")]
#[pyclass(name = "FactorGraph", module = "rust_factorgraphs.factor_graphs")]
pub struct PyFactorGraph {
    inner: FactorGraph,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PyFactorGraph {
    /// The graph's dotted name (member factor names joined with ".").
    #[getter]
    pub fn name(&self) -> String {
        self.inner.name().to_string()
    }

    /// The graph's call signature as rendered in error messages.
    #[getter]
    pub fn call_signature(&self) -> String {
        self.inner.call_signature()
    }

    /// Required input variable names, sorted.
    #[getter]
    pub fn variables(&self) -> Vec<String> {
        self.inner.variables().keys().cloned().collect()
    }

    /// Deterministic variable names produced inside the graph, sorted.
    #[getter]
    pub fn deterministic_variables(&self) -> Vec<String> {
        self.inner.deterministic_variables().keys().cloned().collect()
    }

    /// Shared positional parameter names, in call order.
    #[getter]
    pub fn positional_variables(&self) -> Vec<String> {
        self.inner
            .positional_variables()
            .iter()
            .map(|variable| variable.name().to_string())
            .collect()
    }

    /// Scheduled waves of member-node indices.
    #[getter]
    pub fn call_sequence(&self) -> Vec<Vec<usize>> {
        self.inner.call_sequence().to_vec()
    }

    #[pyo3(signature = (*args, **kwargs))]
    pub fn __call__<'py>(
        &self, py: Python<'py>, args: &Bound<'py, PyTuple>, kwargs: Option<&Bound<'py, PyDict>>,
    ) -> PyResult<PyFactorValue> {
        let positional = extract_positional_tensors(py, args)?;
        let named = extract_keyword_tensors(py, kwargs)?;
        let inner = self.inner.call(&positional, &named)?;
        Ok(PyFactorValue { inner })
    }

    pub fn __mul__(&self, other: &Bound<'_, PyAny>) -> PyResult<PyFactorGraph> {
        compose(self.inner.nodes().to_vec(), other)
    }

    pub fn __repr__(&self) -> String {
        self.inner.to_string()
    }
}

/// FactorValue — Python-facing wrapper for one evaluation's results.
///
/// Carries the joint log value over `batch dims ++ graph plate dims` and
/// every deterministic variable produced during the call.
#[cfg(feature = "python-bindings")]
#[pyclass(name = "FactorValue", module = "rust_factorgraphs.factor_graphs")]
pub struct PyFactorValue {
    inner: FactorValue,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PyFactorValue {
    /// The joint log value as a float64 numpy array.
    #[getter]
    pub fn log_value<'py>(&self, py: Python<'py>) -> Bound<'py, PyArrayDyn<f64>> {
        tensor_to_py(py, &self.inner.log_value)
    }

    /// The joint log value summed over every dimension.
    #[getter]
    pub fn log_value_sum(&self) -> f64 {
        self.inner.log_value_sum()
    }

    /// Deterministic variable values keyed by name.
    #[getter]
    pub fn deterministic_values<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let values = PyDict::new(py);
        for (name, tensor) in &self.inner.deterministic_values {
            values.set_item(name, tensor_to_py(py, tensor))?;
        }
        Ok(values)
    }
}

// ---- Module initialization ------------------------------------------------

/// _rust_factorgraphs — PyO3 module initializer for the Python extension.
///
/// Purpose
/// -------
/// Define the `_rust_factorgraphs` Python module and register the
/// `factor_graphs` submodule used by the public `rust_factorgraphs`
/// package.
///
/// Key behaviors
/// -------------
/// - Create the `factor_graphs` submodule and attach it to the parent
///   module.
/// - Register the submodule in `sys.modules` so it is importable via the
///   dotted path from Python.
///
/// Notes
/// -----
/// - This function is invoked automatically by Python when importing the
///   compiled extension; it is not called directly by user code.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _rust_factorgraphs<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let factor_graphs_mod = PyModule::new(_py, "factor_graphs")?;
    factor_graphs(_py, m, &factor_graphs_mod)?;

    // Manually add the submodule into sys.modules to allow for dot notation.
    _py.import("sys")?
        .getattr("modules")?
        .set_item("rust_factorgraphs.factor_graphs", factor_graphs_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn factor_graphs<'py>(
    _py: Python, rust_factorgraphs: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<PyPlate>()?;
    m.add_class::<PyVariable>()?;
    m.add_class::<PyFactorNode>()?;
    m.add_class::<PyDeterministicFactorNode>()?;
    m.add_class::<PyFactorGraph>()?;
    m.add_class::<PyFactorValue>()?;
    rust_factorgraphs.add_submodule(m)?;
    Ok(())
}
