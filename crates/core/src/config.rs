//! Configuration system for the DRAM simulator.
//!
//! This module defines all configuration structures and enums used to
//! parameterize the simulator. It provides:
//! 1. **Defaults:** Baseline device geometry and JEDEC-shaped timing constants.
//! 2. **Structures:** Hierarchical config for device, controller, timing, power, LRDIMM, and output.
//! 3. **Enums:** Row-buffer policy and command-queue structure.
//!
//! Configuration is supplied as JSON (CLI `--config` flag or the Python
//! bindings) or via `Config::default()`.

use crate::common::{Address, AddressMapping};
use serde::Deserialize;

/// Default configuration constants for the simulator.
///
/// These values define the baseline device when not explicitly overridden
/// in a JSON configuration file. Geometry counts must be powers of two.
mod defaults {
    /// Number of independent channels.
    pub const CHANNELS: u64 = 1;

    /// Ranks per channel.
    pub const RANKS: u64 = 2;

    /// Bankgroups per rank.
    pub const BANKGROUPS: u64 = 4;

    /// Banks per bankgroup.
    pub const BANKS_PER_GROUP: u64 = 4;

    /// Rows per bank.
    pub const ROWS: u64 = 1 << 16;

    /// Columns per row.
    pub const COLUMNS: u64 = 1024;

    /// Data bus width in bits.
    pub const BUS_WIDTH: u64 = 64;

    /// Burst length in beats; one transaction transfers
    /// `BUS_WIDTH / 8 * BURST_LEN` bytes.
    pub const BURST_LEN: u64 = 8;

    /// Transaction queue capacity (per class in split mode).
    pub const TRANS_QUEUE_SIZE: usize = 32;

    /// Command queue capacity per rank (or per bank).
    pub const CMD_QUEUE_SIZE: usize = 8;

    /// Write buffer occupancy above which an empty command queue triggers an
    /// opportunistic write drain.
    pub const WRITE_DRAIN_LOW: usize = 8;

    /// Cycles from READ issue to requester-visible data.
    pub const READ_DELAY: u64 = 40;

    /// Cycles from WRITE issue to device-visible data.
    pub const WRITE_DELAY: u64 = 20;

    /// Row activate to column access delay (tRCD).
    pub const T_RCD: u64 = 14;

    /// Precharge to activate delay (tRP).
    pub const T_RP: u64 = 14;

    /// Activate to precharge minimum (tRAS).
    pub const T_RAS: u64 = 33;

    /// Activate to activate, same rank (tRRD).
    pub const T_RRD: u64 = 6;

    /// Column to column delay (tCCD).
    pub const T_CCD: u64 = 4;

    /// Read to precharge delay (tRTP).
    pub const T_RTP: u64 = 8;

    /// Write recovery before precharge (tWR).
    pub const T_WR: u64 = 15;

    /// Write to read turnaround, same rank (tWTR).
    pub const T_WTR: u64 = 8;

    /// Mode register set to next command (tMOD).
    pub const T_MOD: u64 = 24;

    /// Refresh cycle time (tRFC).
    pub const T_RFC: u64 = 350;

    /// Average refresh interval per rank (tREFI).
    pub const T_REFI: u64 = 7800;

    /// Self-refresh exit to first activate (tXS).
    pub const T_XS: u64 = 360;

    /// Minimum self-refresh residency (tCKESR).
    pub const T_CKESR: u64 = 12;

    /// Idle cycles on a rank before self-refresh entry is attempted.
    pub const SREF_THRESHOLD: u64 = 1000;

    /// LRDIMM data-buffer read latency (tPDM_RD).
    pub const T_PDM_RD: u64 = 13;

    /// LRDIMM data-buffer write latency (tPDM_WR).
    pub const T_PDM_WR: u64 = 7;

    /// LRDIMM read preamble (tRPRE).
    pub const T_RPRE: u64 = 1;

    /// Cycles per statistics epoch.
    pub const EPOCH_PERIOD: u64 = 100_000;
}

/// Row-buffer management policy, fixed per controller at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum RowBufPolicy {
    /// Leave the row open after a column access; PRECHARGE is inserted by
    /// the timing engine only when a different row is needed.
    #[default]
    #[serde(alias = "OPEN_PAGE")]
    OpenPage,
    /// Close the row with every access (READ_PRECHARGE / WRITE_PRECHARGE).
    #[serde(alias = "CLOSE_PAGE")]
    ClosePage,
}

/// Command queue organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum QueueStructure {
    /// One command queue per rank.
    #[default]
    #[serde(alias = "PER_RANK")]
    PerRank,
    /// One command queue per bank.
    #[serde(alias = "PER_BANK")]
    PerBank,
}

/// Root configuration structure containing all simulator settings.
///
/// # Examples
///
/// ```
/// use dram_core::config::{Config, RowBufPolicy};
///
/// let json = r#"{
///     "device": { "channels": 2, "ranks": 2 },
///     "controller": { "unified_queue": true, "row_buf_policy": "CLOSE_PAGE" },
///     "timing": { "read_delay": 30 }
/// }"#;
/// let config: Config = serde_json::from_str(json).unwrap();
/// assert_eq!(config.device.channels, 2);
/// assert_eq!(config.controller.row_buf_policy, RowBufPolicy::ClosePage);
/// assert_eq!(config.timing.read_delay, 30);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device geometry.
    pub device: DeviceConfig,
    /// Controller queueing and scheduling knobs.
    pub controller: ControllerConfig,
    /// Device timing constraints in controller cycles.
    pub timing: TimingConfig,
    /// Power management (self-refresh, thermal accounting).
    pub power: PowerConfig,
    /// On-DIMM buffer (LRDIMM) parameters.
    pub lrdimm: LrdimmConfig,
    /// Output and trace settings.
    pub output: OutputConfig,
}

impl Config {
    /// Decodes a flat physical address into its DRAM fields.
    pub fn address_mapping(&self, hex_addr: u64) -> Address {
        AddressMapping::new(&self.device).decode(hex_addr)
    }

    /// Total banks per rank.
    pub fn banks(&self) -> usize {
        (self.device.bankgroups * self.device.banks_per_group) as usize
    }
}

/// Device geometry. All counts must be powers of two.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Number of independent channels.
    pub channels: u64,
    /// Ranks per channel.
    pub ranks: u64,
    /// Bankgroups per rank.
    pub bankgroups: u64,
    /// Banks per bankgroup.
    pub banks_per_group: u64,
    /// Rows per bank.
    pub rows: u64,
    /// Columns per row.
    pub columns: u64,
    /// Data bus width in bits.
    pub bus_width: u64,
    /// Burst length in beats.
    pub burst_len: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            channels: defaults::CHANNELS,
            ranks: defaults::RANKS,
            bankgroups: defaults::BANKGROUPS,
            banks_per_group: defaults::BANKS_PER_GROUP,
            rows: defaults::ROWS,
            columns: defaults::COLUMNS,
            bus_width: defaults::BUS_WIDTH,
            burst_len: defaults::BURST_LEN,
        }
    }
}

/// Controller queueing and scheduling configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// One mixed read/write queue instead of split read queue + write buffer.
    pub unified_queue: bool,
    /// Row-buffer policy.
    pub row_buf_policy: RowBufPolicy,
    /// Command queue organization.
    pub queue_structure: QueueStructure,
    /// Transaction queue capacity (per class in split mode).
    pub trans_queue_size: usize,
    /// Command queue capacity per rank (or per bank).
    pub cmd_queue_size: usize,
    /// Write buffer occupancy above which an empty command queue triggers an
    /// opportunistic write drain.
    pub write_drain_low: usize,
    /// Issue a second command per cycle when its read/write-ness differs
    /// from the first (HBM-class devices).
    pub enable_hbm_dual_cmd: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            unified_queue: false,
            row_buf_policy: RowBufPolicy::default(),
            queue_structure: QueueStructure::default(),
            trans_queue_size: defaults::TRANS_QUEUE_SIZE,
            cmd_queue_size: defaults::CMD_QUEUE_SIZE,
            write_drain_low: defaults::WRITE_DRAIN_LOW,
            enable_hbm_dual_cmd: false,
        }
    }
}

/// Device timing constraints, all in controller cycles.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Cycles from READ issue to requester-visible data.
    pub read_delay: u64,
    /// Cycles from WRITE issue to device-visible data.
    pub write_delay: u64,
    /// Row activate to column access (tRCD).
    pub t_rcd: u64,
    /// Precharge to activate (tRP).
    pub t_rp: u64,
    /// Activate to precharge minimum (tRAS).
    pub t_ras: u64,
    /// Activate to activate, same rank (tRRD).
    pub t_rrd: u64,
    /// Column to column (tCCD).
    pub t_ccd: u64,
    /// Read to precharge (tRTP).
    pub t_rtp: u64,
    /// Write recovery before precharge (tWR).
    pub t_wr: u64,
    /// Write to read turnaround, same rank (tWTR).
    pub t_wtr: u64,
    /// Mode register set to next command (tMOD).
    pub t_mod: u64,
    /// Refresh cycle time (tRFC).
    pub t_rfc: u64,
    /// Average refresh interval per rank (tREFI).
    pub t_refi: u64,
    /// Self-refresh exit to first activate (tXS).
    pub t_xs: u64,
    /// Minimum self-refresh residency (tCKESR).
    pub t_ckesr: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            read_delay: defaults::READ_DELAY,
            write_delay: defaults::WRITE_DELAY,
            t_rcd: defaults::T_RCD,
            t_rp: defaults::T_RP,
            t_ras: defaults::T_RAS,
            t_rrd: defaults::T_RRD,
            t_ccd: defaults::T_CCD,
            t_rtp: defaults::T_RTP,
            t_wr: defaults::T_WR,
            t_wtr: defaults::T_WTR,
            t_mod: defaults::T_MOD,
            t_rfc: defaults::T_RFC,
            t_refi: defaults::T_REFI,
            t_xs: defaults::T_XS,
            t_ckesr: defaults::T_CKESR,
        }
    }
}

/// Power management configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PowerConfig {
    /// Move idle ranks into self-refresh.
    pub enable_self_refresh: bool,
    /// Idle cycles on a rank before self-refresh entry is attempted.
    pub sref_threshold: u64,
    /// Feed issued commands to a thermal energy sink.
    pub enable_thermal: bool,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            enable_self_refresh: false,
            sref_threshold: defaults::SREF_THRESHOLD,
            enable_thermal: false,
        }
    }
}

/// On-DIMM buffer (LRDIMM) configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LrdimmConfig {
    /// Model the on-DIMM data buffer and carry payloads end to end.
    pub is_lrdimm: bool,
    /// Data-buffer read latency (tPDM_RD).
    pub t_pdm_rd: u64,
    /// Data-buffer write latency (tPDM_WR).
    pub t_pdm_wr: u64,
    /// Read preamble (tRPRE).
    pub t_rpre: u64,
}

impl Default for LrdimmConfig {
    fn default() -> Self {
        Self {
            is_lrdimm: false,
            t_pdm_rd: defaults::T_PDM_RD,
            t_pdm_wr: defaults::T_PDM_WR,
            t_rpre: defaults::T_RPRE,
        }
    }
}

/// Output and trace configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Prefix for per-channel output files.
    pub output_prefix: String,
    /// Write one line per issued command to `{prefix}ch_{id}cmd.trace`.
    pub cmd_trace: bool,
    /// Cycles per statistics epoch.
    pub epoch_period: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_prefix: String::new(),
            cmd_trace: false,
            epoch_period: defaults::EPOCH_PERIOD,
        }
    }
}
