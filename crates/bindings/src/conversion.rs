//! Python↔Rust configuration conversion.
//!
//! Converts Python dicts (or JSON strings) into the core `Config` type via
//! JSON serialization, so the same schema is used from both Python and CLI.

use dram_core::config::Config;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

/// Converts a Python config object to a simulator `Config`.
///
/// Accepts `None` (defaults), a JSON string, or a dict whose keys match the
/// Rust config structure (`device`, `controller`, `timing`, `power`,
/// `lrdimm`, `output`). Dicts are serialized through Python's `json` module
/// and then deserialized into `Config`.
///
/// # Arguments
///
/// * `py` - Python interpreter handle.
/// * `config` - `None`, a JSON string, or a dict.
///
/// # Returns
///
/// The deserialized `Config`, or a `PyErr` if the object is invalid.
pub fn py_config(py: Python, config: Option<&Bound<'_, PyAny>>) -> PyResult<Config> {
    let Some(config) = config else {
        return Ok(Config::default());
    };
    let json_str: String = if let Ok(text) = config.extract::<String>() {
        text
    } else {
        let json = py.import("json")?;
        let dumps = json.getattr("dumps")?;
        dumps.call1((config,))?.extract()?
    };
    serde_json::from_str(&json_str)
        .map_err(|e| PyValueError::new_err(format!("Invalid config: {}", e)))
}
