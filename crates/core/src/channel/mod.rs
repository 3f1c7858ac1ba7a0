//! Per-channel controller and its device-facing collaborators.
//!
//! One [`Controller`] exists per DRAM channel. It owns:
//! 1. **Transaction buffers and pending maps** (admission side).
//! 2. **Command queues** ([`cmd_queue`]) feeding the issue slot.
//! 3. **Device state** ([`state`]) with bank timing and power residency.
//! 4. **Refresh obligations** ([`refresh`]) and the optional on-DIMM
//!    buffer ([`lrdimm`]).

/// Command queues and issue arbitration.
pub mod cmd_queue;

/// The per-channel controller core.
pub mod controller;

/// On-DIMM (LRDIMM) data buffer bridge.
pub mod lrdimm;

/// Refresh obligation counter.
pub mod refresh;

/// Bank/rank device state and timing windows.
pub mod state;

pub use cmd_queue::CommandQueue;
pub use controller::Controller;
pub use lrdimm::LrdimmBridge;
pub use refresh::Refresh;
pub use state::ChannelState;
