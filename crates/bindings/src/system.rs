//! Memory system Python binding.
//!
//! Exposes the top-level `MemorySystem` to Python: create from a config
//! dict (or JSON string), submit transactions, step cycles, and poll
//! completions that the callbacks collected.

use crate::conversion::py_config;
use dram_core::sim::MemorySystem;
use dram_core::Transaction;
use pyo3::prelude::*;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Python-exposed memory system: wraps the core `MemorySystem` and buffers
/// completions for polling from Python.
#[pyclass(unsendable)]
pub struct PyMemorySystem {
    inner: MemorySystem,
    completions: Arc<Mutex<VecDeque<(u64, bool)>>>,
}

#[pymethods]
impl PyMemorySystem {
    /// Creates a memory system from `None`, a JSON string, or a config dict.
    ///
    /// Completion callbacks are wired internally; poll them with
    /// `pop_completion` after each `tick`.
    #[new]
    #[pyo3(signature = (config=None))]
    fn new(py: Python, config: Option<&Bound<'_, PyAny>>) -> PyResult<Self> {
        let config = py_config(py, config)?;
        let mut inner = MemorySystem::new(config);
        let completions = Arc::new(Mutex::new(VecDeque::new()));
        let reads = Arc::clone(&completions);
        let writes = Arc::clone(&completions);
        inner.register_callbacks(
            Box::new(move |addr| reads.lock().unwrap().push_back((addr, false))),
            Box::new(move |addr| writes.lock().unwrap().push_back((addr, true))),
        );
        Ok(Self { inner, completions })
    }

    /// Current system cycle.
    fn clk(&self) -> u64 {
        self.inner.clk()
    }

    /// Admission test for the channel serving `addr`.
    #[pyo3(signature = (addr, is_write, is_mrs=false))]
    fn will_accept(&self, addr: u64, is_write: bool, is_mrs: bool) -> bool {
        self.inner.will_accept(addr, is_write, is_mrs)
    }

    /// Submits a transaction; returns `False` when the target buffer is full.
    #[pyo3(signature = (addr, is_write, is_mrs=false, payload=None))]
    fn add_transaction(
        &mut self,
        addr: u64,
        is_write: bool,
        is_mrs: bool,
        payload: Option<Vec<u64>>,
    ) -> bool {
        if !self.inner.will_accept(addr, is_write, is_mrs) {
            return false;
        }
        let trans = if is_mrs {
            Transaction::mrs(addr)
        } else if is_write {
            Transaction::write(addr, payload.unwrap_or_default())
        } else {
            Transaction::read(addr)
        };
        self.inner.add_transaction(trans)
    }

    /// Advances the system one cycle.
    fn tick(&mut self) {
        self.inner.clock_tick();
    }

    /// Pops the oldest buffered completion as `(addr, is_write)`, if any.
    fn pop_completion(&mut self) -> Option<(u64, bool)> {
        self.completions.lock().unwrap().pop_front()
    }

    /// Pops the oldest LRDIMM read payload for the channel serving `addr`.
    fn get_resp_data(&mut self, addr: u64) -> Vec<u64> {
        self.inner.get_resp_data(addr)
    }

    /// Flushes epoch statistics on every channel.
    fn print_epoch_stats(&mut self) {
        self.inner.print_epoch_stats();
    }

    /// Flushes final statistics on every channel.
    fn print_final_stats(&mut self) {
        self.inner.print_final_stats();
    }
}
