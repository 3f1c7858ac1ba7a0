//! Thermal energy accounting.
//!
//! Controllers feed every issued command to an optional [`ThermalSink`].
//! The sink may be shared across channels; the enclosing simulator is
//! expected to serialize channel ticks, and the handle is a mutex so the
//! contract holds even when it does not.

use crate::common::{Command, CommandType};
use std::sync::{Arc, Mutex};

/// Shared handle to a thermal sink, one per simulation run.
pub type SharedThermal = Arc<Mutex<dyn ThermalSink>>;

/// Sink for per-command and background energy contributions.
pub trait ThermalSink: Send {
    /// Accounts the energy of one issued command.
    fn command_energy(&mut self, channel: usize, cmd: &Command, clk: u64);

    /// Accounts background energy for one rank over a stats epoch.
    fn background_energy(&mut self, channel: usize, rank: usize, energy: f64);
}

/// Per-command energy contributions in picojoules.
///
/// Coarse DDR4-shaped figures; MRS and self-refresh transition commands are
/// not accounted, matching the command-power model this feeds.
fn command_pj(cmd_type: CommandType) -> f64 {
    match cmd_type {
        CommandType::Activate => 280.0,
        CommandType::Precharge => 140.0,
        CommandType::Read | CommandType::ReadPrecharge => 210.0,
        CommandType::Write | CommandType::WritePrecharge => 220.0,
        CommandType::Refresh => 1900.0,
        CommandType::RefreshBank => 480.0,
        CommandType::SrefEnter | CommandType::SrefExit | CommandType::Mrs => 0.0,
    }
}

/// Background energy of one rank over a stats window, in picojoules.
///
/// Coarse DDR4-shaped per-cycle figures for the three residency classes.
pub fn background_pj(sref_cycles: u64, idle_cycles: u64, active_cycles: u64) -> f64 {
    const SREF_PJ: f64 = 2.5;
    const IDLE_PJ: f64 = 18.0;
    const ACTIVE_PJ: f64 = 45.0;
    sref_cycles as f64 * SREF_PJ + idle_cycles as f64 * IDLE_PJ + active_cycles as f64 * ACTIVE_PJ
}

/// Energy accumulator: tracks per-channel command and background energy.
#[derive(Debug, Default)]
pub struct ThermalCalculator {
    command_energy_pj: Vec<f64>,
    background_energy_pj: Vec<f64>,
}

impl ThermalCalculator {
    /// Creates an accumulator for `channels` channels.
    pub fn new(channels: usize) -> Self {
        Self {
            command_energy_pj: vec![0.0; channels],
            background_energy_pj: vec![0.0; channels],
        }
    }

    /// Creates a shared handle for `channels` channels.
    pub fn shared(channels: usize) -> SharedThermal {
        Arc::new(Mutex::new(Self::new(channels)))
    }

    /// Total accumulated energy for one channel in picojoules.
    pub fn channel_energy_pj(&self, channel: usize) -> f64 {
        self.command_energy_pj[channel] + self.background_energy_pj[channel]
    }
}

impl ThermalSink for ThermalCalculator {
    fn command_energy(&mut self, channel: usize, cmd: &Command, _clk: u64) {
        self.command_energy_pj[channel] += command_pj(cmd.cmd_type);
    }

    fn background_energy(&mut self, channel: usize, _rank: usize, energy: f64) {
        self.background_energy_pj[channel] += energy;
    }
}
