//! Python bindings for the DRAM simulator.
//!
//! This crate exposes the simulator to Python via PyO3. It provides:
//! 1. **Memory system:** `PyMemorySystem` for configuration, transaction
//!    submission, cycle stepping, and completion polling.
//! 2. **Utilities:** Version string and config conversion helpers.

use pyo3::prelude::*;

/// Python config (dict or JSON) to Rust `Config` conversion.
pub mod conversion;
/// Memory system binding (`PyMemorySystem`).
pub mod system;
/// Utility functions (e.g., version).
pub mod utils;

/// Registers all simulator classes and functions onto the given Python
/// module.
///
/// Called from the `#[pymodule]` entry point to expose `PyMemorySystem`
/// and `version`.
///
/// # Arguments
///
/// * `m` - The Python module to register types and functions on.
///
/// # Returns
///
/// `Ok(())` on success, or a `PyErr` if registration fails.
pub fn register_simulator_module(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<system::PyMemorySystem>()?;
    m.add_function(wrap_pyfunction!(utils::version, m)?)?;
    Ok(())
}

#[pymodule]
fn dram_sim(m: &Bound<'_, PyModule>) -> PyResult<()> {
    register_simulator_module(m)?;
    Ok(())
}
