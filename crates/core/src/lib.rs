//! Cycle-accurate DRAM memory system simulator.
//!
//! This crate implements a per-channel DRAM controller and the system glue
//! around it:
//! 1. **Controller:** Transaction buffering, write merging and forwarding,
//!    row-buffer policy, write-drain scheduling, and the per-cycle issue
//!    engine.
//! 2. **Device state:** Bank/rank timing windows, refresh obligations, and
//!    self-refresh power management.
//! 3. **System:** Multi-channel dispatch with completion callbacks, plus an
//!    ideal fixed-latency baseline.
//! 4. **Simulation:** Trace front-end, stimulus generators, configuration,
//!    and statistics collection.

/// Per-channel controller and device-facing collaborators.
pub mod channel;
/// Shared data model (addresses, commands, transactions).
pub mod common;
/// Simulator configuration (defaults, enums, hierarchical structures).
pub mod config;
/// Simulation front door (system assembly, traces, stimulus).
pub mod sim;
/// Per-channel statistics collection and reporting.
pub mod stats;
/// Thermal energy accounting.
pub mod thermal;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Per-channel controller; most users drive it through `MemorySystem`.
pub use crate::channel::Controller;
/// Requester-level transaction.
pub use crate::common::Transaction;
/// Multi-channel front door; construct with `MemorySystem::new`.
pub use crate::sim::MemorySystem;
