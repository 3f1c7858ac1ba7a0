//! Simulation front door: system assembly and stimulus.
//!
//! This module holds the pieces that sit above the per-channel controllers:
//! 1. **System:** Multi-channel dispatch, completion callbacks, and the
//!    ideal fixed-latency baseline.
//! 2. **Trace:** Trace-file parsing, replay, and deterministic stimulus
//!    generators.

/// Multi-channel memory system and the ideal baseline.
pub mod system;

/// Trace parsing, replay, and stimulus generators.
pub mod trace;

pub use system::{Callback, IdealMemorySystem, MemorySystem};
pub use trace::{TraceError, TraceReplayer, TraceRequest};
