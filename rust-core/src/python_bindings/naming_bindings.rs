//! Python bindings for source naming

use pyo3::prelude::*;

use crate::naming;

/// Short display names for a list of file paths
///
/// Each name is as short as possible while staying unique in the list.
///
/// Args:
///     paths: File paths, in display order
///
/// Returns:
///     One name per path, same order
#[pyfunction]
pub fn unique_identifiers(paths: Vec<String>) -> Vec<String> {
    naming::unique_identifiers(&paths)
}
