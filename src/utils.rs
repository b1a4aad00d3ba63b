#[cfg(feature = "python-bindings")]
use ndarray::Array1;

#[cfg(feature = "python-bindings")]
use pyo3::{
    exceptions::PyTypeError,
    prelude::*,
    types::{PyAny, PyDict, PyTuple},
};

#[cfg(feature = "python-bindings")]
use numpy::{
    PyArrayDyn,
    PyReadonlyArrayDyn,
    ToPyArray, // ndarray → PyArray
};

#[cfg(feature = "python-bindings")]
use crate::graph::core::value::{scalar, Tensor};

#[cfg(feature = "python-bindings")]
use std::collections::HashMap;

/// Convert an arbitrary Python value into an owned [`Tensor`].
///
/// Accepts, in order: any-dimensional float64 numpy arrays, objects exposing
/// `to_numpy` (pandas), bare Python floats/ints (0-d tensors), and flat
/// float sequences (1-d tensors).
#[cfg(feature = "python-bindings")]
pub fn extract_tensor<'py>(_py: Python<'py>, value: &Bound<'py, PyAny>) -> PyResult<Tensor> {
    if let Ok(array) = value.extract::<PyReadonlyArrayDyn<f64>>() {
        return Ok(array.as_array().to_owned());
    }

    if let Ok(obj) = value.call_method("to_numpy", (false,), None) {
        if let Ok(array) = obj.extract::<PyReadonlyArrayDyn<f64>>() {
            return Ok(array.as_array().to_owned());
        }
    }

    if let Ok(number) = value.extract::<f64>() {
        return Ok(scalar(number));
    }

    if let Ok(values) = value.extract::<Vec<f64>>() {
        return Ok(Array1::from_vec(values).into_dyn());
    }

    Err(PyTypeError::new_err(
        "expected a numpy.ndarray, pandas.Series, float, or sequence of float64",
    ))
}

/// Convert a Python argument tuple into positional tensors, in order.
#[cfg(feature = "python-bindings")]
pub fn extract_positional_tensors<'py>(
    py: Python<'py>, args: &Bound<'py, PyTuple>,
) -> PyResult<Vec<Tensor>> {
    let mut positional = Vec::with_capacity(args.len());
    for value in args.iter() {
        positional.push(extract_tensor(py, &value)?);
    }
    Ok(positional)
}

/// Convert Python keyword arguments into a variable-name → tensor map.
#[cfg(feature = "python-bindings")]
pub fn extract_keyword_tensors<'py>(
    py: Python<'py>, kwargs: Option<&Bound<'py, PyDict>>,
) -> PyResult<HashMap<String, Tensor>> {
    let mut named = HashMap::new();
    if let Some(kwargs) = kwargs {
        for (key, value) in kwargs.iter() {
            let name: String = key.extract()?;
            named.insert(name, extract_tensor(py, &value)?);
        }
    }
    Ok(named)
}

/// Expose a [`Tensor`] to Python as a float64 numpy array.
#[cfg(feature = "python-bindings")]
pub fn tensor_to_py<'py>(py: Python<'py>, tensor: &Tensor) -> Bound<'py, PyArrayDyn<f64>> {
    tensor.to_pyarray(py)
}
