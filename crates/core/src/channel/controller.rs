//! Per-channel memory controller.
//!
//! The controller owns the transaction-side buffers and drives one DRAM
//! channel. Each simulated cycle it:
//! 1. Advances the refresh counter and (when LRDIMM) the data buffer.
//! 2. Issues at most one command slot (refresh first, then the command
//!    queue; optionally a second command under HBM dual issue).
//! 3. Accounts per-rank power residency and drives self-refresh entry/exit.
//! 4. Promotes at most one buffered transaction into the command queue.
//!
//! Writes and MRS transactions are acknowledged posted-style one cycle
//! after admission; reads return `read_delay` cycles after their READ
//! issues. Reads to a pending write forward the buffered payload and never
//! reach the device.

use crate::channel::cmd_queue::CommandQueue;
use crate::channel::lrdimm::LrdimmBridge;
use crate::channel::refresh::Refresh;
use crate::channel::state::ChannelState;
use crate::common::{Command, CommandType, Transaction};
use crate::config::{Config, RowBufPolicy};
use crate::stats::ChannelStats;
use crate::thermal::{background_pj, SharedThermal};
use log::{debug, warn};
use std::collections::{HashMap, VecDeque};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::Arc;

/// Transaction buffers: one mixed queue, or a split read queue plus write
/// buffer. Fixed at construction by `controller.unified_queue`.
enum TransQueues {
    Unified(VecDeque<Transaction>),
    Split {
        read_queue: VecDeque<Transaction>,
        write_buffer: VecDeque<Transaction>,
    },
}

/// One DRAM channel's controller.
pub struct Controller {
    channel_id: usize,
    clk: u64,
    config: Arc<Config>,
    /// Per-channel statistics, mutated directly along the pipeline.
    pub stats: ChannelStats,
    channel_state: ChannelState,
    cmd_queue: CommandQueue,
    refresh: Refresh,
    lrdimm: Option<LrdimmBridge>,
    thermal: Option<SharedThermal>,
    cmd_trace: Option<BufWriter<File>>,
    queues: TransQueues,
    mrs_buffer: VecDeque<Transaction>,
    pending_rd_q: HashMap<u64, Vec<Transaction>>,
    pending_wr_q: HashMap<u64, Transaction>,
    return_queue: Vec<Transaction>,
    resp_data: VecDeque<Vec<u64>>,
    write_draining: usize,
    last_trans_clk: u64,
}

impl Controller {
    /// Creates the controller for `channel_id`.
    ///
    /// `thermal` attaches the shared energy sink when thermal accounting is
    /// enabled. The command trace file, when configured, is best-effort: a
    /// failure to create it is logged and tracing is disabled.
    pub fn new(channel_id: usize, config: Arc<Config>, thermal: Option<SharedThermal>) -> Self {
        let capacity = config.controller.trans_queue_size;
        let queues = if config.controller.unified_queue {
            TransQueues::Unified(VecDeque::with_capacity(capacity))
        } else {
            TransQueues::Split {
                read_queue: VecDeque::with_capacity(capacity),
                write_buffer: VecDeque::with_capacity(capacity),
            }
        };
        let cmd_trace = if config.output.cmd_trace {
            let path = format!("{}ch_{}cmd.trace", config.output.output_prefix, channel_id);
            match File::create(&path) {
                Ok(file) => Some(BufWriter::new(file)),
                Err(err) => {
                    warn!("cannot create command trace {}: {}", path, err);
                    None
                }
            }
        } else {
            None
        };
        let lrdimm = config.lrdimm.is_lrdimm.then(|| {
            LrdimmBridge::new(config.lrdimm.t_pdm_rd, config.device.burst_len as usize)
        });
        Self {
            channel_id,
            clk: 0,
            stats: ChannelStats::new(channel_id, config.device.ranks as usize),
            channel_state: ChannelState::new(&config),
            cmd_queue: CommandQueue::new(channel_id, &config),
            refresh: Refresh::new(&config),
            lrdimm,
            thermal,
            cmd_trace,
            queues,
            mrs_buffer: VecDeque::with_capacity(capacity),
            pending_rd_q: HashMap::new(),
            pending_wr_q: HashMap::new(),
            return_queue: Vec::new(),
            resp_data: VecDeque::new(),
            write_draining: 0,
            last_trans_clk: 0,
            config,
        }
    }

    /// Current controller cycle.
    pub fn clk(&self) -> u64 {
        self.clk
    }

    /// Read-only view of the device state (banks, ranks, refresh).
    pub fn channel_state(&self) -> &ChannelState {
        &self.channel_state
    }

    /// Remaining writes in the current drain burst; zero when not draining.
    pub fn write_drain_level(&self) -> usize {
        self.write_draining
    }

    /// Outstanding (unmerged) pending writes.
    pub fn pending_write_count(&self) -> usize {
        self.pending_wr_q.len()
    }

    /// Outstanding pending reads for one address (coalesced entries count).
    pub fn pending_read_count(&self, addr: u64) -> usize {
        self.pending_rd_q.get(&addr).map_or(0, Vec::len)
    }

    /// Commands waiting in the command queue.
    pub fn queue_usage(&self) -> usize {
        self.cmd_queue.queue_usage()
    }

    /// True iff the target buffer for this transaction class has room.
    ///
    /// No side effects; queryable at any cycle.
    pub fn will_accept(&self, _addr: u64, is_write: bool, is_mrs: bool) -> bool {
        let capacity = self.config.controller.trans_queue_size;
        if is_mrs {
            return self.mrs_buffer.len() < capacity;
        }
        match &self.queues {
            TransQueues::Unified(queue) => queue.len() < capacity,
            TransQueues::Split {
                read_queue,
                write_buffer,
            } => {
                if is_write {
                    write_buffer.len() < capacity
                } else {
                    read_queue.len() < capacity
                }
            }
        }
    }

    /// Accepts a transaction; the caller must have checked `will_accept`.
    ///
    /// Writes merge into an existing pending write to the same address
    /// (payload overwrite, no second queue entry). Reads to a pending write
    /// forward its payload and complete next cycle. Repeated reads to the
    /// same address coalesce onto the first; only the first enqueues. Writes
    /// and MRS are acknowledged at `clk + 1` regardless of device activity.
    pub fn add_transaction(&mut self, mut trans: Transaction) -> bool {
        trans.added_cycle = self.clk;
        self.stats
            .counters
            .interarrival_latency
            .add(self.clk - self.last_trans_clk);
        self.last_trans_clk = self.clk;
        debug!("ch {} [{:>10}] add {}", self.channel_id, self.clk, trans);

        if trans.is_mrs {
            self.mrs_buffer.push_back(trans.clone());
            trans.complete_cycle = self.clk + 1;
            self.return_queue.push(trans);
            return true;
        }

        if trans.is_write {
            match self.pending_wr_q.get_mut(&trans.addr) {
                // Merge: the later payload wins, no second entry.
                Some(pending) => pending.update_payload(&trans.payload),
                None => {
                    self.pending_wr_q.insert(trans.addr, trans.clone());
                    match &mut self.queues {
                        TransQueues::Unified(queue) => queue.push_back(trans.clone()),
                        TransQueues::Split { write_buffer, .. } => {
                            write_buffer.push_back(trans.clone())
                        }
                    }
                }
            }
            trans.complete_cycle = self.clk + 1;
            self.return_queue.push(trans);
            return true;
        }

        // Read-after-write forwarding: serve from the pending write.
        if let Some(pending) = self.pending_wr_q.get(&trans.addr) {
            trans.update_payload(&pending.payload);
            trans.complete_cycle = self.clk + 1;
            self.return_queue.push(trans);
            return true;
        }
        let entries = self.pending_rd_q.entry(trans.addr).or_default();
        entries.push(trans.clone());
        if entries.len() == 1 {
            match &mut self.queues {
                TransQueues::Unified(queue) => queue.push_back(trans),
                TransQueues::Split { read_queue, .. } => read_queue.push_back(trans),
            }
        }
        true
    }

    /// Advances the controller one simulated cycle.
    pub fn clock_tick(&mut self) {
        self.refresh.tick(&mut self.channel_state);

        if let Some(lrdimm) = self.lrdimm.as_mut() {
            lrdimm.tick();
            while let Some((cmd, payload)) = lrdimm.get_read_response() {
                let mut matched = false;
                for trans in self
                    .return_queue
                    .iter_mut()
                    .filter(|t| t.addr == cmd.hex_addr)
                {
                    trans.payload = payload.clone();
                    matched = true;
                }
                assert!(
                    matched,
                    "LRDIMM read response for {:#x} has no waiting return entry",
                    cmd.hex_addr
                );
            }
        }

        let mut cmd_issued = false;
        let mut cmd = None;
        if self.channel_state.is_refresh_waiting() {
            cmd = self.cmd_queue.finish_refresh(&self.channel_state);
        }
        if cmd.is_none() {
            cmd = self.cmd_queue.get_command_to_issue(&self.channel_state);
        }
        if let Some(cmd) = cmd {
            self.issue_command(&cmd);
            cmd_issued = true;
            if let Some(lrdimm) = self.lrdimm.as_mut() {
                lrdimm.record_ddr_cmd(&cmd);
            }
            if self.config.controller.enable_hbm_dual_cmd {
                if let Some(second) = self.cmd_queue.get_command_to_issue(&self.channel_state) {
                    if second.is_read_write() != cmd.is_read_write() {
                        self.issue_command(&second);
                        self.stats.counters.hbm_dual_cmds += 1;
                    }
                }
            }
        }

        // Power residency accounting. Self-refresh transitions themselves
        // do not count as command issue for the entry/exit walk below.
        let ranks = self.config.device.ranks as usize;
        for rank in 0..ranks {
            if self.channel_state.is_rank_self_refreshing(rank) {
                self.stats.counters.sref_cycles[rank] += 1;
            } else if self.channel_state.is_all_bank_idle_in_rank(rank) {
                self.stats.counters.all_bank_idle_cycles[rank] += 1;
                self.channel_state.rank_idle_cycles[rank] += 1;
            } else {
                self.stats.counters.rank_active_cycles[rank] += 1;
                self.channel_state.rank_idle_cycles[rank] = 0;
            }
        }

        if self.config.power.enable_self_refresh && !cmd_issued {
            for rank in 0..ranks {
                if self.channel_state.is_rank_self_refreshing(rank) {
                    if !self.cmd_queue.rank_q_empty(rank) {
                        let wanted = Command::rank_level(CommandType::SrefExit, rank);
                        if let Some(ready) =
                            self.channel_state.get_ready_command(&wanted, self.clk)
                        {
                            self.issue_command(&ready);
                            break;
                        }
                    }
                } else if self.cmd_queue.rank_q_empty(rank)
                    && self.channel_state.rank_idle_cycles[rank]
                        >= self.config.power.sref_threshold
                {
                    let wanted = Command::rank_level(CommandType::SrefEnter, rank);
                    if let Some(ready) = self.channel_state.get_ready_command(&wanted, self.clk) {
                        self.issue_command(&ready);
                        break;
                    }
                }
            }
        }

        self.schedule_transaction();
        self.clk += 1;
        self.cmd_queue.tick();
        self.stats.counters.num_cycles += 1;
    }

    /// Returns one completed transaction as `(addr, is_write)`, if any.
    ///
    /// The return queue is scanned in insertion order and the first entry
    /// with `complete_cycle <= clk` is drained; completion cycles are not
    /// monotone, so an unready head does not block later entries.
    pub fn return_done_transactions(&mut self, clk: u64) -> Option<(u64, bool)> {
        let pos = self
            .return_queue
            .iter()
            .position(|t| clk >= t.complete_cycle)?;
        let trans = self.return_queue.remove(pos);
        if trans.is_mrs {
            self.stats.counters.num_mrs_done += 1;
        } else if trans.is_write {
            self.stats.counters.num_writes_done += 1;
        } else {
            self.stats.counters.num_reads_done += 1;
            self.stats
                .counters
                .read_latency
                .add(self.clk - trans.added_cycle);
        }
        if self.config.lrdimm.is_lrdimm && !trans.is_write && !trans.is_mrs {
            assert!(
                !trans.payload.is_empty(),
                "LRDIMM read {:#x} returned without payload",
                trans.addr
            );
            self.resp_data.push_back(trans.payload.clone());
        }
        Some((trans.addr, trans.is_write))
    }

    /// Pops the oldest LRDIMM read payload awaiting requester pickup.
    ///
    /// Calling with nothing pending is a driver bug and aborts.
    pub fn get_resp_data(&mut self) -> Vec<u64> {
        self.resp_data
            .pop_front()
            .expect("no LRDIMM response data pending")
    }

    /// Flushes epoch statistics (and epoch background energy when thermal
    /// accounting is attached).
    pub fn print_epoch_stats(&mut self) {
        self.flush_background_energy();
        self.stats.print_epoch();
    }

    /// Flushes final statistics.
    pub fn print_final_stats(&mut self) {
        self.flush_background_energy();
        self.stats.print_final();
    }

    fn flush_background_energy(&mut self) {
        let Some(thermal) = &self.thermal else {
            return;
        };
        let epoch = self.stats.epoch_counters();
        let mut sink = thermal.lock().unwrap();
        for rank in 0..self.config.device.ranks as usize {
            let energy = background_pj(
                epoch.sref_cycles[rank],
                epoch.all_bank_idle_cycles[rank],
                epoch.rank_active_cycles[rank],
            );
            sink.background_energy(self.channel_id, rank, energy);
        }
    }

    /// Promotes at most one buffered transaction into the command queue.
    ///
    /// The MRS buffer has absolute priority and is strict FIFO: only its
    /// head is ever considered. In split mode a write drain is entered when
    /// the write buffer fills, or opportunistically when it holds more than
    /// the low threshold and the command queue is empty; a drain aborts the
    /// moment the next write targets an address with a pending read.
    fn schedule_transaction(&mut self) {
        if self.write_draining == 0 {
            if let TransQueues::Split { write_buffer, .. } = &self.queues {
                let capacity = self.config.controller.trans_queue_size;
                let low = self.config.controller.write_drain_low;
                if write_buffer.len() >= capacity
                    || (write_buffer.len() > low && self.cmd_queue.queue_empty())
                {
                    self.write_draining = write_buffer.len();
                }
            }
        }

        if let Some(front) = self.mrs_buffer.front() {
            let cmd = Self::trans_to_command(&self.config, front);
            if self.cmd_queue.will_accept_mrs() {
                self.cmd_queue.add_command(cmd);
                self.mrs_buffer.pop_front();
            }
            return;
        }

        let is_unified = matches!(self.queues, TransQueues::Unified(_));
        let draining = self.write_draining > 0;
        let queue = match &mut self.queues {
            TransQueues::Unified(queue) => queue,
            TransQueues::Split {
                read_queue,
                write_buffer,
            } => {
                if draining {
                    write_buffer
                } else {
                    read_queue
                }
            }
        };
        for pos in 0..queue.len() {
            let cmd = Self::trans_to_command(&self.config, &queue[pos]);
            if !self
                .cmd_queue
                .will_accept(cmd.rank(), cmd.bankgroup(), cmd.bank())
            {
                continue;
            }
            if !is_unified && cmd.is_write() {
                if self.pending_rd_q.contains_key(&cmd.hex_addr) {
                    // A read admitted before this write is still pending;
                    // stop draining so it is served first.
                    self.write_draining = 0;
                    break;
                }
                self.write_draining = self.write_draining.saturating_sub(1);
            }
            self.cmd_queue.add_command(cmd);
            let _ = queue.remove(pos);
            break;
        }
    }

    /// Translates a transaction into its DRAM command under the row-buffer
    /// policy; the command carries both the decoded tuple and the flat
    /// address.
    fn trans_to_command(config: &Config, trans: &Transaction) -> Command {
        let addr = config.address_mapping(trans.addr);
        let cmd_type = if trans.is_mrs {
            CommandType::Mrs
        } else {
            match config.controller.row_buf_policy {
                RowBufPolicy::OpenPage => {
                    if trans.is_write {
                        CommandType::Write
                    } else {
                        CommandType::Read
                    }
                }
                RowBufPolicy::ClosePage => {
                    if trans.is_write {
                        CommandType::WritePrecharge
                    } else {
                        CommandType::ReadPrecharge
                    }
                }
            }
        };
        Command::new(cmd_type, addr, trans.addr)
    }

    /// Issues one command: completes pending reads, retires the pending
    /// write, traces, accounts energy, then updates device state.
    fn issue_command(&mut self, cmd: &Command) {
        debug!("ch {} [{:>10}] issue [{}]", self.channel_id, self.clk, cmd);
        if let Some(trace_file) = self.cmd_trace.as_mut() {
            let _ = writeln!(trace_file, "{:<18} {}", self.clk, cmd);
        }
        if let Some(thermal) = &self.thermal {
            thermal
                .lock()
                .unwrap()
                .command_energy(self.channel_id, cmd, self.clk);
        }
        if cmd.is_read() {
            let pending = self.pending_rd_q.remove(&cmd.hex_addr).unwrap_or_else(|| {
                panic!("READ issued for {:#x} with no pending read", cmd.hex_addr)
            });
            let mut delay = self.config.timing.read_delay;
            if self.config.lrdimm.is_lrdimm {
                delay += self.config.lrdimm.t_pdm_rd + self.config.lrdimm.t_rpre;
            }
            // Every coalesced read returns on the same cycle.
            for mut trans in pending {
                trans.complete_cycle = self.clk + delay;
                self.return_queue.push(trans);
            }
        } else if cmd.is_write() {
            let trans = self.pending_wr_q.remove(&cmd.hex_addr).unwrap_or_else(|| {
                panic!("WRITE issued for {:#x} with no pending write", cmd.hex_addr)
            });
            if let Some(lrdimm) = self.lrdimm.as_mut() {
                lrdimm.enqueue_write_data(cmd.rank(), cmd.hex_addr, trans.payload.clone());
            }
            self.stats
                .counters
                .write_latency
                .add(self.clk - trans.added_cycle + self.config.timing.write_delay);
        }
        // MRS and rank-level commands carry no pending-queue bookkeeping;
        // the MRS acknowledgement was posted at admission.

        // Stats must observe the pre-update state (row hits).
        self.update_command_stats(cmd);
        self.channel_state.update_timing_and_states(cmd, self.clk);
    }

    fn update_command_stats(&mut self, cmd: &Command) {
        let counters = &mut self.stats.counters;
        match cmd.cmd_type {
            CommandType::Read | CommandType::ReadPrecharge => {
                counters.num_read_cmds += 1;
                if self
                    .channel_state
                    .row_hit_count(cmd.rank(), cmd.bankgroup(), cmd.bank())
                    != 0
                {
                    counters.num_read_row_hits += 1;
                }
            }
            CommandType::Write | CommandType::WritePrecharge => {
                counters.num_write_cmds += 1;
                if self
                    .channel_state
                    .row_hit_count(cmd.rank(), cmd.bankgroup(), cmd.bank())
                    != 0
                {
                    counters.num_write_row_hits += 1;
                }
            }
            CommandType::Activate => counters.num_act_cmds += 1,
            CommandType::Precharge => counters.num_pre_cmds += 1,
            CommandType::Refresh => counters.num_ref_cmds += 1,
            CommandType::RefreshBank => counters.num_refb_cmds += 1,
            CommandType::SrefEnter => counters.num_srefe_cmds += 1,
            CommandType::SrefExit => counters.num_srefx_cmds += 1,
            CommandType::Mrs => counters.num_mrs_cmds += 1,
        }
    }
}
