//! Refresh obligation counter.
//!
//! Ranks are refreshed round-robin: with `r` ranks and an average refresh
//! interval of tREFI, one rank's obligation is raised every `tREFI / r`
//! cycles, staggering refreshes across the channel. An obligation already
//! pending for a rank is not duplicated; the device catches up through the
//! tRFC window applied when the REFRESH issues.

use crate::channel::state::ChannelState;
use crate::common::{Command, CommandType};
use crate::config::Config;
use log::trace;

/// Per-channel refresh counter.
pub struct Refresh {
    clk: u64,
    ranks: usize,
    interval: u64,
    next_rank: usize,
}

impl Refresh {
    /// Creates the counter; an interval of zero disables refresh.
    pub fn new(config: &Config) -> Self {
        let ranks = config.device.ranks as usize;
        Self {
            clk: 0,
            ranks,
            interval: config.timing.t_refi / ranks as u64,
            next_rank: 0,
        }
    }

    /// Advances one cycle; raises the next rank's obligation on interval
    /// boundaries.
    pub fn tick(&mut self, state: &mut ChannelState) {
        self.clk += 1;
        if self.interval == 0 || self.clk % self.interval != 0 {
            return;
        }
        let rank = self.next_rank;
        self.next_rank = (self.next_rank + 1) % self.ranks;
        if !state.rank_refresh_pending(rank) {
            trace!("refresh due for rank {} at clk {}", rank, self.clk);
            state.push_refresh(Command::rank_level(CommandType::Refresh, rank));
        }
    }
}
