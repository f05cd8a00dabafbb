//! PyO3 bindings for Python integration

use std::fmt::Display;

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

mod naming_bindings;
mod session_bindings;
mod spectrum_bindings;

pub(crate) fn to_py_err(e: impl Display) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// Python module definition
#[pymodule]
fn spectrum_correlator(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(spectrum_bindings::compute_spectrum, m)?)?;
    m.add_function(wrap_pyfunction!(spectrum_bindings::compute_phase_spectrum, m)?)?;
    m.add_function(wrap_pyfunction!(spectrum_bindings::find_peaks, m)?)?;
    m.add_function(wrap_pyfunction!(naming_bindings::unique_identifiers, m)?)?;
    m.add_class::<session_bindings::PyAnalysisSession>()?;

    Ok(())
}
