//! Multi-channel memory system front door.
//!
//! `MemorySystem` fans transactions out to per-channel controllers by the
//! decoded channel bits, ticks every channel each cycle, and reports
//! completions through registered callbacks. `IdealMemorySystem` is the
//! infinite-bandwidth, fixed-latency baseline for comparison runs.

use crate::channel::Controller;
use crate::common::Transaction;
use crate::config::Config;
use crate::thermal::{SharedThermal, ThermalCalculator};
use std::collections::VecDeque;
use std::sync::Arc;

/// Completion callback; receives the transaction's flat address.
pub type Callback = Box<dyn FnMut(u64) + Send>;

/// A full memory system: one controller per channel.
pub struct MemorySystem {
    config: Arc<Config>,
    clk: u64,
    controllers: Vec<Controller>,
    thermal: Option<SharedThermal>,
    read_callback: Option<Callback>,
    write_callback: Option<Callback>,
}

impl MemorySystem {
    /// Builds the system from a configuration.
    ///
    /// A shared thermal sink is created and attached to every channel when
    /// `power.enable_thermal` is set.
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);
        let channels = config.device.channels as usize;
        let thermal = config
            .power
            .enable_thermal
            .then(|| ThermalCalculator::shared(channels));
        let controllers = (0..channels)
            .map(|ch| Controller::new(ch, Arc::clone(&config), thermal.clone()))
            .collect();
        Self {
            config,
            clk: 0,
            controllers,
            thermal,
            read_callback: None,
            write_callback: None,
        }
    }

    /// Registers the completion callbacks.
    pub fn register_callbacks(&mut self, read_callback: Callback, write_callback: Callback) {
        self.read_callback = Some(read_callback);
        self.write_callback = Some(write_callback);
    }

    /// Current system cycle.
    pub fn clk(&self) -> u64 {
        self.clk
    }

    /// The simulation configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The channel serving a flat address.
    pub fn channel_of(&self, hex_addr: u64) -> usize {
        self.config.address_mapping(hex_addr).channel
    }

    /// Borrow one channel's controller (stats inspection, tests).
    pub fn controller(&self, channel: usize) -> &Controller {
        &self.controllers[channel]
    }

    /// The shared thermal sink, when enabled.
    pub fn thermal(&self) -> Option<&SharedThermal> {
        self.thermal.as_ref()
    }

    /// Admission test for the channel serving `hex_addr`.
    pub fn will_accept(&self, hex_addr: u64, is_write: bool, is_mrs: bool) -> bool {
        self.controllers[self.channel_of(hex_addr)].will_accept(hex_addr, is_write, is_mrs)
    }

    /// Routes a transaction to its channel.
    ///
    /// The caller must have checked `will_accept`.
    pub fn add_transaction(&mut self, trans: Transaction) -> bool {
        let channel = self.channel_of(trans.addr);
        self.controllers[channel].add_transaction(trans)
    }

    /// Advances every channel one cycle; drains at most one completion per
    /// channel and invokes the matching callback.
    pub fn clock_tick(&mut self) {
        for ctrl in &mut self.controllers {
            if let Some((addr, is_write)) = ctrl.return_done_transactions(self.clk) {
                let callback = if is_write {
                    &mut self.write_callback
                } else {
                    &mut self.read_callback
                };
                if let Some(callback) = callback {
                    callback(addr);
                }
            }
            ctrl.clock_tick();
        }
        self.clk += 1;
    }

    /// Pops the oldest LRDIMM read payload from the channel serving
    /// `hex_addr`.
    pub fn get_resp_data(&mut self, hex_addr: u64) -> Vec<u64> {
        let channel = self.channel_of(hex_addr);
        self.controllers[channel].get_resp_data()
    }

    /// Flushes epoch statistics on every channel.
    pub fn print_epoch_stats(&mut self) {
        for ctrl in &mut self.controllers {
            ctrl.print_epoch_stats();
        }
    }

    /// Flushes final statistics on every channel.
    pub fn print_final_stats(&mut self) {
        for ctrl in &mut self.controllers {
            ctrl.print_final_stats();
        }
    }
}

/// Infinite-bandwidth baseline: every transaction completes after a fixed
/// latency (`timing.read_delay`), with no device modeling at all.
pub struct IdealMemorySystem {
    clk: u64,
    latency: u64,
    buffer: VecDeque<Transaction>,
    read_callback: Option<Callback>,
    write_callback: Option<Callback>,
}

impl IdealMemorySystem {
    /// Builds the baseline system.
    pub fn new(config: &Config) -> Self {
        Self {
            clk: 0,
            latency: config.timing.read_delay,
            buffer: VecDeque::new(),
            read_callback: None,
            write_callback: None,
        }
    }

    /// Registers the completion callbacks.
    pub fn register_callbacks(&mut self, read_callback: Callback, write_callback: Callback) {
        self.read_callback = Some(read_callback);
        self.write_callback = Some(write_callback);
    }

    /// Always true; the baseline has no capacity limit.
    pub fn will_accept(&self, _hex_addr: u64, _is_write: bool, _is_mrs: bool) -> bool {
        true
    }

    /// Accepts a transaction; it completes `latency` cycles from now.
    pub fn add_transaction(&mut self, mut trans: Transaction) -> bool {
        trans.added_cycle = self.clk;
        trans.complete_cycle = self.clk + self.latency;
        self.buffer.push_back(trans);
        true
    }

    /// Advances one cycle and drains every due completion.
    pub fn clock_tick(&mut self) {
        while self
            .buffer
            .front()
            .is_some_and(|t| t.complete_cycle <= self.clk)
        {
            let trans = self.buffer.pop_front().unwrap();
            let callback = if trans.is_write {
                &mut self.write_callback
            } else {
                &mut self.read_callback
            };
            if let Some(callback) = callback {
                callback(trans.addr);
            }
        }
        self.clk += 1;
    }
}
