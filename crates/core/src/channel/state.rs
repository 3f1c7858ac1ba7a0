//! Bank and rank device state for one channel.
//!
//! `ChannelState` is the sole mutator of device timing state. It tracks:
//! 1. **Per-bank state:** Open row, row-hit streak, per-command earliest
//!    issue cycles.
//! 2. **Per-rank state:** Self-refresh residency and entry/exit windows.
//! 3. **Refresh obligations:** A FIFO of pending refresh commands raised by
//!    the refresh counter and retired when the REFRESH issues.
//!
//! `get_ready_command` maps a wanted command to the command that must issue
//! first (ACTIVATE or PRECHARGE precursors, SREF_EXIT wakeups) and gates it
//! on the timing windows; `update_timing_and_states` applies the issued
//! command's effects.

use crate::common::{Command, CommandType};
use crate::config::{Config, TimingConfig};
use std::collections::VecDeque;

/// Earliest allowed issue cycle per command family for one bank.
#[derive(Debug, Clone, Copy, Default)]
struct CmdTiming {
    activate: u64,
    precharge: u64,
    read: u64,
    write: u64,
    refresh: u64,
}

impl CmdTiming {
    fn earliest(&self, cmd_type: CommandType) -> u64 {
        match cmd_type {
            CommandType::Activate => self.activate,
            CommandType::Precharge => self.precharge,
            CommandType::Read | CommandType::ReadPrecharge => self.read,
            CommandType::Write | CommandType::WritePrecharge => self.write,
            CommandType::Refresh | CommandType::RefreshBank => self.refresh,
            CommandType::SrefEnter | CommandType::SrefExit | CommandType::Mrs => 0,
        }
    }
}

/// State of one bank: the open row (if any), the row-hit streak since the
/// last ACTIVATE, and the timing windows.
#[derive(Debug, Clone, Default)]
struct BankState {
    open_row: Option<u64>,
    row_hit_count: u64,
    timing: CmdTiming,
}

#[derive(Debug, Clone, Default)]
struct RankState {
    in_self_refresh: bool,
    sref_enter_clk: u64,
    sref_exit_clk: u64,
}

/// Device timing and power state for one channel.
pub struct ChannelState {
    timing: TimingConfig,
    bankgroups: usize,
    banks_per_group: usize,
    banks: Vec<BankState>,
    rank_states: Vec<RankState>,
    /// Consecutive idle cycles per rank; maintained by the controller's
    /// power accounting, consumed by self-refresh entry.
    pub rank_idle_cycles: Vec<u64>,
    refresh_queue: VecDeque<Command>,
}

impl ChannelState {
    /// Creates the state block for one channel of `config`'s device.
    pub fn new(config: &Config) -> Self {
        let ranks = config.device.ranks as usize;
        let bankgroups = config.device.bankgroups as usize;
        let banks_per_group = config.device.banks_per_group as usize;
        Self {
            timing: config.timing.clone(),
            bankgroups,
            banks_per_group,
            banks: vec![BankState::default(); ranks * bankgroups * banks_per_group],
            rank_states: vec![RankState::default(); ranks],
            rank_idle_cycles: vec![0; ranks],
            refresh_queue: VecDeque::new(),
        }
    }

    fn index(&self, rank: usize, bankgroup: usize, bank: usize) -> usize {
        (rank * self.bankgroups + bankgroup) * self.banks_per_group + bank
    }

    fn bank(&self, rank: usize, bankgroup: usize, bank: usize) -> &BankState {
        &self.banks[self.index(rank, bankgroup, bank)]
    }

    fn rank_banks_mut(&mut self, rank: usize) -> impl Iterator<Item = &mut BankState> + '_ {
        let span = self.bankgroups * self.banks_per_group;
        self.banks[rank * span..(rank + 1) * span].iter_mut()
    }

    /// True while a refresh obligation is pending.
    pub fn is_refresh_waiting(&self) -> bool {
        !self.refresh_queue.is_empty()
    }

    /// The oldest pending refresh command, if any.
    pub fn refresh_front(&self) -> Option<Command> {
        self.refresh_queue.front().copied()
    }

    /// True if a refresh is already queued for `rank`.
    pub fn rank_refresh_pending(&self, rank: usize) -> bool {
        self.refresh_queue.iter().any(|c| c.rank() == rank)
    }

    /// Queues a refresh obligation raised by the refresh counter.
    pub fn push_refresh(&mut self, cmd: Command) {
        debug_assert!(cmd.is_refresh());
        self.refresh_queue.push_back(cmd);
    }

    /// True while `rank` sits in self-refresh.
    pub fn is_rank_self_refreshing(&self, rank: usize) -> bool {
        self.rank_states[rank].in_self_refresh
    }

    /// True when no bank in `rank` has an open row.
    pub fn is_all_bank_idle_in_rank(&self, rank: usize) -> bool {
        let span = self.bankgroups * self.banks_per_group;
        self.banks[rank * span..(rank + 1) * span]
            .iter()
            .all(|b| b.open_row.is_none())
    }

    /// Column accesses to the currently open row since its ACTIVATE.
    pub fn row_hit_count(&self, rank: usize, bankgroup: usize, bank: usize) -> u64 {
        self.bank(rank, bankgroup, bank).row_hit_count
    }

    /// The open row of a bank, if any.
    pub fn open_row(&self, rank: usize, bankgroup: usize, bank: usize) -> Option<u64> {
        self.bank(rank, bankgroup, bank).open_row
    }

    /// Maps `cmd` to the command that must issue first, gated on timing.
    ///
    /// Returns the command itself when it can issue directly, a precursor
    /// (ACTIVATE, PRECHARGE, SREF_EXIT) when one is required, or `None`
    /// while timing blocks the required command.
    pub fn get_ready_command(&self, cmd: &Command, clk: u64) -> Option<Command> {
        let required = self.required_command(cmd);
        let rank = &self.rank_states[required.rank()];
        match required.cmd_type {
            CommandType::SrefEnter => {
                let allowed = rank.sref_enter_clk <= clk
                    && self.is_all_bank_idle_in_rank(required.rank())
                    && !self.rank_refresh_pending(required.rank());
                allowed.then_some(required)
            }
            CommandType::SrefExit => (rank.sref_exit_clk <= clk).then_some(required),
            CommandType::Refresh => {
                let span = self.bankgroups * self.banks_per_group;
                let ready = self.banks[required.rank() * span..(required.rank() + 1) * span]
                    .iter()
                    .all(|b| b.timing.refresh <= clk);
                ready.then_some(required)
            }
            _ => {
                let bank = self.bank(required.rank(), required.bankgroup(), required.bank());
                (bank.timing.earliest(required.cmd_type) <= clk).then_some(required)
            }
        }
    }

    /// The command that must issue before `cmd` can (possibly `cmd` itself).
    fn required_command(&self, cmd: &Command) -> Command {
        if self.rank_states[cmd.rank()].in_self_refresh {
            return Command::rank_level(CommandType::SrefExit, cmd.rank());
        }
        match cmd.cmd_type {
            CommandType::Read
            | CommandType::ReadPrecharge
            | CommandType::Write
            | CommandType::WritePrecharge => {
                let bank = self.bank(cmd.rank(), cmd.bankgroup(), cmd.bank());
                match bank.open_row {
                    Some(row) if row == cmd.row() => *cmd,
                    Some(_) => Command::new(CommandType::Precharge, cmd.addr, cmd.hex_addr),
                    None => Command::new(CommandType::Activate, cmd.addr, cmd.hex_addr),
                }
            }
            CommandType::Refresh | CommandType::Mrs => {
                // All banks in the rank must be precharged first.
                match self.first_open_bank(cmd.rank()) {
                    Some(pre) => pre,
                    None => *cmd,
                }
            }
            CommandType::RefreshBank => {
                let bank = self.bank(cmd.rank(), cmd.bankgroup(), cmd.bank());
                match bank.open_row {
                    Some(_) => Command::new(CommandType::Precharge, cmd.addr, cmd.hex_addr),
                    None => *cmd,
                }
            }
            CommandType::Activate
            | CommandType::Precharge
            | CommandType::SrefEnter
            | CommandType::SrefExit => *cmd,
        }
    }

    fn first_open_bank(&self, rank: usize) -> Option<Command> {
        for bg in 0..self.bankgroups {
            for b in 0..self.banks_per_group {
                if self.bank(rank, bg, b).open_row.is_some() {
                    let mut addr = crate::common::Address::rank_only(rank);
                    addr.bankgroup = bg;
                    addr.bank = b;
                    return Some(Command::new(CommandType::Precharge, addr, 0));
                }
            }
        }
        None
    }

    /// Applies the issued command's state and timing effects.
    ///
    /// The controller's stats update must run before this call so row hits
    /// are observed against the pre-update streak.
    pub fn update_timing_and_states(&mut self, cmd: &Command, clk: u64) {
        let t = self.timing.clone();
        let idx = self.index(cmd.rank(), cmd.bankgroup(), cmd.bank());
        match cmd.cmd_type {
            CommandType::Activate => {
                {
                    let bank = &mut self.banks[idx];
                    bank.open_row = Some(cmd.row());
                    bank.row_hit_count = 0;
                    raise(&mut bank.timing.read, clk + t.t_rcd);
                    raise(&mut bank.timing.write, clk + t.t_rcd);
                    raise(&mut bank.timing.precharge, clk + t.t_ras);
                }
                for bank in self.rank_banks_mut(cmd.rank()) {
                    raise(&mut bank.timing.activate, clk + t.t_rrd);
                }
            }
            CommandType::Read => {
                self.banks[idx].row_hit_count += 1;
                raise(&mut self.banks[idx].timing.precharge, clk + t.t_rtp);
                for bank in self.rank_banks_mut(cmd.rank()) {
                    raise(&mut bank.timing.read, clk + t.t_ccd);
                    raise(&mut bank.timing.write, clk + t.t_ccd);
                }
            }
            CommandType::ReadPrecharge => {
                let bank = &mut self.banks[idx];
                bank.row_hit_count += 1;
                bank.open_row = None;
                raise(&mut bank.timing.activate, clk + t.t_rtp + t.t_rp);
                for bank in self.rank_banks_mut(cmd.rank()) {
                    raise(&mut bank.timing.read, clk + t.t_ccd);
                    raise(&mut bank.timing.write, clk + t.t_ccd);
                }
            }
            CommandType::Write => {
                self.banks[idx].row_hit_count += 1;
                raise(&mut self.banks[idx].timing.precharge, clk + t.t_wr);
                for bank in self.rank_banks_mut(cmd.rank()) {
                    raise(&mut bank.timing.write, clk + t.t_ccd);
                    raise(&mut bank.timing.read, clk + t.t_wtr);
                }
            }
            CommandType::WritePrecharge => {
                let bank = &mut self.banks[idx];
                bank.row_hit_count += 1;
                bank.open_row = None;
                raise(&mut bank.timing.activate, clk + t.t_wr + t.t_rp);
                for bank in self.rank_banks_mut(cmd.rank()) {
                    raise(&mut bank.timing.write, clk + t.t_ccd);
                    raise(&mut bank.timing.read, clk + t.t_wtr);
                }
            }
            CommandType::Precharge => {
                let bank = &mut self.banks[idx];
                bank.open_row = None;
                raise(&mut bank.timing.activate, clk + t.t_rp);
            }
            CommandType::Refresh => {
                let pending = self
                    .refresh_queue
                    .pop_front()
                    .expect("REFRESH issued with no pending obligation");
                assert_eq!(
                    pending.rank(),
                    cmd.rank(),
                    "REFRESH issued out of obligation order"
                );
                for bank in self.rank_banks_mut(cmd.rank()) {
                    raise(&mut bank.timing.activate, clk + t.t_rfc);
                    raise(&mut bank.timing.refresh, clk + t.t_rfc);
                }
                raise(&mut self.rank_states[cmd.rank()].sref_enter_clk, clk + t.t_rfc);
            }
            CommandType::RefreshBank => {
                if let Some(pos) = self
                    .refresh_queue
                    .iter()
                    .position(|c| c.rank() == cmd.rank() && c.bank() == cmd.bank())
                {
                    let _ = self.refresh_queue.remove(pos);
                }
                let bank = &mut self.banks[idx];
                raise(&mut bank.timing.activate, clk + t.t_rfc);
                raise(&mut bank.timing.refresh, clk + t.t_rfc);
            }
            CommandType::SrefEnter => {
                let rank = &mut self.rank_states[cmd.rank()];
                rank.in_self_refresh = true;
                raise(&mut rank.sref_exit_clk, clk + t.t_ckesr);
            }
            CommandType::SrefExit => {
                self.rank_states[cmd.rank()].in_self_refresh = false;
                for bank in self.rank_banks_mut(cmd.rank()) {
                    raise(&mut bank.timing.activate, clk + t.t_xs);
                }
                raise(&mut self.rank_states[cmd.rank()].sref_enter_clk, clk + t.t_xs);
            }
            CommandType::Mrs => {
                for bank in self.rank_banks_mut(cmd.rank()) {
                    raise(&mut bank.timing.activate, clk + t.t_mod);
                    raise(&mut bank.timing.read, clk + t.t_mod);
                    raise(&mut bank.timing.write, clk + t.t_mod);
                    raise(&mut bank.timing.precharge, clk + t.t_mod);
                }
            }
        }
    }
}

fn raise(slot: &mut u64, clk: u64) {
    *slot = (*slot).max(clk);
}
