//! Utility functions exposed to Python.
//!
//! Provides version and other helpers for the `dram_sim` module.

use pyo3::prelude::*;

/// Returns the simulator version string (e.g., for scripting or diagnostics).
///
/// # Returns
///
/// A version string such as `"0.3.0"`.
#[pyfunction]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
