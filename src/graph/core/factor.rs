//! Factor capability — the pure numeric functions a graph is built from.
//!
//! Purpose
//! -------
//! Define the trait seam between the engine and model-authoring code. A
//! factor is an opaque numeric function from positional tensor inputs to a
//! fixed number of tensor outputs; the engine schedules and broadcasts around
//! it without knowing anything else.
//!
//! Key behaviors
//! -------------
//! - [`Factor::output_arity`] is declared up front: a plain log factor has
//!   arity 1, a deterministic factor has arity equal to its declared output
//!   count. Nodes verify the produced count against it on every call, so a
//!   mismatch surfaces as a structured error instead of a silent mis-zip.
//! - [`FactorFn`] and [`DeterministicFn`] adapt plain closures, so simple
//!   models need no hand-rolled trait impls.
//!
//! Invariants & assumptions
//! ------------------------
//! - Factors are **pure**: no side effects, no interior state beyond the
//!   computation itself. The engine may evaluate them in any order consistent
//!   with the schedule.
//! - Inputs arrive in the node's binding order (positional variables first,
//!   then keyword bindings in insertion order).
//! - Factors are `Send + Sync` so constructed graphs can be shared across
//!   threads.
//!
//! Downstream usage
//! ----------------
//! - Model authors implement [`Factor`] directly or wrap closures with the
//!   adapters here; the stock library in [`crate::factors`] supplies common
//!   densities and transforms.
use crate::graph::core::value::Tensor;
use crate::graph::errors::GraphResult;
use ndarray::ArrayViewD;

/// A pure numeric function over named variables.
///
/// Concrete variants are supplied by model authors and dispatched
/// dynamically behind `Arc<dyn Factor>`; [`crate::graph::nodes::FactorNode`]
/// binds one to concrete variables.
pub trait Factor: Send + Sync {
    /// Factor name used in graph names, rendering, and error messages.
    fn name(&self) -> &str;

    /// Number of outputs `evaluate` must produce. `1` for a plain log
    /// factor; the declared deterministic-output count otherwise.
    fn output_arity(&self) -> usize;

    /// Evaluate the factor on inputs given in binding order.
    ///
    /// # Returns
    /// - Exactly `output_arity()` tensors, in declaration order.
    ///
    /// # Errors
    /// - Any failure inside the computation, reported as a [`GraphResult`]
    ///   error and propagated unchanged to the caller.
    fn evaluate(&self, inputs: &[ArrayViewD<'_, f64>]) -> GraphResult<Vec<Tensor>>;
}

/// Closure adapter for single-output log factors.
///
/// Wraps `Fn(&[ArrayViewD<f64>]) -> GraphResult<Tensor>` as a [`Factor`]
/// with `output_arity() == 1`.
pub struct FactorFn<F>
where
    F: Fn(&[ArrayViewD<'_, f64>]) -> GraphResult<Tensor> + Send + Sync,
{
    name: String,
    f: F,
}

impl<F> FactorFn<F>
where
    F: Fn(&[ArrayViewD<'_, f64>]) -> GraphResult<Tensor> + Send + Sync,
{
    /// Wrap a closure as a named single-output factor.
    pub fn new(name: impl Into<String>, f: F) -> FactorFn<F> {
        FactorFn { name: name.into(), f }
    }
}

impl<F> Factor for FactorFn<F>
where
    F: Fn(&[ArrayViewD<'_, f64>]) -> GraphResult<Tensor> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn output_arity(&self) -> usize {
        1
    }

    fn evaluate(&self, inputs: &[ArrayViewD<'_, f64>]) -> GraphResult<Vec<Tensor>> {
        Ok(vec![(self.f)(inputs)?])
    }
}

/// Closure adapter for fixed-arity deterministic factors.
///
/// Wraps `Fn(&[ArrayViewD<f64>]) -> GraphResult<Vec<Tensor>>` as a
/// [`Factor`] whose `output_arity()` is declared at construction; the
/// wrapping node checks the produced count against it on every call.
pub struct DeterministicFn<F>
where
    F: Fn(&[ArrayViewD<'_, f64>]) -> GraphResult<Vec<Tensor>> + Send + Sync,
{
    name: String,
    arity: usize,
    f: F,
}

impl<F> DeterministicFn<F>
where
    F: Fn(&[ArrayViewD<'_, f64>]) -> GraphResult<Vec<Tensor>> + Send + Sync,
{
    /// Wrap a closure as a named factor producing `arity` outputs.
    pub fn new(name: impl Into<String>, arity: usize, f: F) -> DeterministicFn<F> {
        DeterministicFn { name: name.into(), arity, f }
    }
}

impl<F> Factor for DeterministicFn<F>
where
    F: Fn(&[ArrayViewD<'_, f64>]) -> GraphResult<Vec<Tensor>> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn output_arity(&self) -> usize {
        self.arity
    }

    fn evaluate(&self, inputs: &[ArrayViewD<'_, f64>]) -> GraphResult<Vec<Tensor>> {
        (self.f)(inputs)
    }
}
