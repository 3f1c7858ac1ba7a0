//! Per-channel command queues and issue arbitration.
//!
//! Translated commands wait here until the device timing lets them issue.
//! Queues are organized per rank or per bank (configurable); MRS commands
//! live in a dedicated queue with issue priority and strict FIFO order.
//!
//! Arbitration is round-robin across queues. Within a queue the oldest
//! issuable command wins, and a command never bypasses an older entry to
//! the same bank, so same-address command order is preserved.

use crate::channel::state::ChannelState;
use crate::common::{Command, CommandType};
use crate::config::{Config, QueueStructure};
use log::trace;
use std::collections::VecDeque;

/// Bounded command queues for one channel.
pub struct CommandQueue {
    channel_id: usize,
    structure: QueueStructure,
    queue_size: usize,
    bankgroups: usize,
    banks_per_group: usize,
    queues: Vec<VecDeque<Command>>,
    mrs_queue: VecDeque<Command>,
    next_queue: usize,
    clk: u64,
}

impl CommandQueue {
    /// Creates the queues for one channel of `config`'s device.
    pub fn new(channel_id: usize, config: &Config) -> Self {
        let ranks = config.device.ranks as usize;
        let structure = config.controller.queue_structure;
        let queue_count = match structure {
            QueueStructure::PerRank => ranks,
            QueueStructure::PerBank => ranks * config.banks(),
        };
        Self {
            channel_id,
            structure,
            queue_size: config.controller.cmd_queue_size,
            bankgroups: config.device.bankgroups as usize,
            banks_per_group: config.device.banks_per_group as usize,
            queues: vec![VecDeque::new(); queue_count],
            mrs_queue: VecDeque::new(),
            next_queue: 0,
            clk: 0,
        }
    }

    fn index(&self, rank: usize, bankgroup: usize, bank: usize) -> usize {
        match self.structure {
            QueueStructure::PerRank => rank,
            QueueStructure::PerBank => {
                (rank * self.bankgroups + bankgroup) * self.banks_per_group + bank
            }
        }
    }

    fn queues_per_rank(&self) -> usize {
        match self.structure {
            QueueStructure::PerRank => 1,
            QueueStructure::PerBank => self.bankgroups * self.banks_per_group,
        }
    }

    /// True when the queue serving (rank, bankgroup, bank) has room.
    pub fn will_accept(&self, rank: usize, bankgroup: usize, bank: usize) -> bool {
        self.queues[self.index(rank, bankgroup, bank)].len() < self.queue_size
    }

    /// True when the MRS queue has room.
    pub fn will_accept_mrs(&self) -> bool {
        self.mrs_queue.len() < self.queue_size
    }

    /// Appends a command to its queue.
    ///
    /// The caller must have checked `will_accept` / `will_accept_mrs`.
    pub fn add_command(&mut self, cmd: Command) {
        trace!("ch {} queue cmd [{}]", self.channel_id, cmd);
        if cmd.is_mrs() {
            debug_assert!(self.will_accept_mrs());
            self.mrs_queue.push_back(cmd);
        } else {
            debug_assert!(self.will_accept(cmd.rank(), cmd.bankgroup(), cmd.bank()));
            let idx = self.index(cmd.rank(), cmd.bankgroup(), cmd.bank());
            self.queues[idx].push_back(cmd);
        }
    }

    /// Picks the next command ready to issue this cycle, if any.
    ///
    /// The MRS queue is served first and strictly in order: only its head is
    /// considered. Normal queues are served round-robin; a returned
    /// precursor (ACTIVATE / PRECHARGE / SREF_EXIT) leaves the queued
    /// command in place for a later cycle.
    pub fn get_command_to_issue(&mut self, state: &ChannelState) -> Option<Command> {
        if let Some(front) = self.mrs_queue.front() {
            if let Some(ready) = state.get_ready_command(front, self.clk) {
                if ready.cmd_type == CommandType::Mrs {
                    self.mrs_queue.pop_front();
                }
                return Some(ready);
            }
        }
        let queue_count = self.queues.len();
        for i in 0..queue_count {
            let qi = (self.next_queue + i) % queue_count;
            if let Some(ready) = self.first_ready_in_queue(qi, state) {
                self.next_queue = (qi + 1) % queue_count;
                return Some(ready);
            }
        }
        None
    }

    fn first_ready_in_queue(&mut self, qi: usize, state: &ChannelState) -> Option<Command> {
        let mut found: Option<(usize, Command, bool)> = None;
        for (pos, cmd) in self.queues[qi].iter().enumerate() {
            let blocked = self.queues[qi].iter().take(pos).any(|older| {
                older.rank() == cmd.rank()
                    && older.bankgroup() == cmd.bankgroup()
                    && older.bank() == cmd.bank()
            });
            if blocked {
                continue;
            }
            if let Some(ready) = state.get_ready_command(cmd, self.clk) {
                found = Some((pos, ready, ready.cmd_type == cmd.cmd_type));
                break;
            }
        }
        let (pos, ready, pops) = found?;
        if pops {
            let _ = self.queues[qi].remove(pos);
        }
        Some(ready)
    }

    /// Produces the command advancing the pending refresh, if timing allows.
    ///
    /// May return a PRECHARGE (open banks must close first) or a SREF_EXIT
    /// (the rank must wake) before the REFRESH itself becomes issuable.
    pub fn finish_refresh(&mut self, state: &ChannelState) -> Option<Command> {
        let front = state.refresh_front()?;
        state.get_ready_command(&front, self.clk)
    }

    /// True when every queue, including the MRS queue, is empty.
    pub fn queue_empty(&self) -> bool {
        self.mrs_queue.is_empty() && self.queues.iter().all(|q| q.is_empty())
    }

    /// True when every queue serving `rank` is empty.
    pub fn rank_q_empty(&self, rank: usize) -> bool {
        let per_rank = self.queues_per_rank();
        self.queues[rank * per_rank..(rank + 1) * per_rank]
            .iter()
            .all(|q| q.is_empty())
    }

    /// Total queued commands across all queues.
    pub fn queue_usage(&self) -> usize {
        self.mrs_queue.len() + self.queues.iter().map(|q| q.len()).sum::<usize>()
    }

    /// Advances the queue clock one cycle.
    pub fn tick(&mut self) {
        self.clk += 1;
    }
}
