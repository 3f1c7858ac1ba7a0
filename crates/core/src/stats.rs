//! Per-channel statistics collection and reporting.
//!
//! This module tracks simulation metrics for one controller. It provides:
//! 1. **Cycle and completion counts:** Cycles, reads/writes/MRS returned.
//! 2. **Command mix:** Issued command counts by type, row-hit counts.
//! 3. **Power residency:** Per-rank self-refresh / idle / active cycles.
//! 4. **Latency accumulators:** Read, write, and interarrival latency.
//!
//! Epoch printing reports the delta since the previous epoch; final printing
//! reports totals. Both go to stdout in an aligned `name value` format.

/// Accumulator for a sampled value: running sum, count, and maximum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValueStat {
    /// Sum of all samples.
    pub sum: u64,
    /// Number of samples.
    pub count: u64,
    /// Largest sample seen.
    pub max: u64,
}

impl ValueStat {
    /// Records one sample.
    pub fn add(&mut self, value: u64) {
        self.sum += value;
        self.count += 1;
        self.max = self.max.max(value);
    }

    /// Mean of all samples, zero when empty.
    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum as f64 / self.count as f64
        }
    }

    fn delta(&self, base: &ValueStat) -> ValueStat {
        ValueStat {
            sum: self.sum - base.sum,
            count: self.count - base.count,
            max: self.max,
        }
    }
}

/// Raw counter block. Every field is cumulative since construction.
#[derive(Debug, Clone, Default)]
pub struct Counters {
    /// Simulated cycles.
    pub num_cycles: u64,
    /// Read transactions returned to the requester.
    pub num_reads_done: u64,
    /// Write transactions returned to the requester.
    pub num_writes_done: u64,
    /// MRS transactions returned to the requester.
    pub num_mrs_done: u64,

    /// READ / READ_PRECHARGE commands issued.
    pub num_read_cmds: u64,
    /// WRITE / WRITE_PRECHARGE commands issued.
    pub num_write_cmds: u64,
    /// ACTIVATE commands issued.
    pub num_act_cmds: u64,
    /// PRECHARGE commands issued.
    pub num_pre_cmds: u64,
    /// REFRESH commands issued.
    pub num_ref_cmds: u64,
    /// REFRESH_BANK commands issued.
    pub num_refb_cmds: u64,
    /// SREF_ENTER commands issued.
    pub num_srefe_cmds: u64,
    /// SREF_EXIT commands issued.
    pub num_srefx_cmds: u64,
    /// MRS commands issued.
    pub num_mrs_cmds: u64,
    /// Reads that hit an already-open row.
    pub num_read_row_hits: u64,
    /// Writes that hit an already-open row.
    pub num_write_row_hits: u64,
    /// Second commands issued under HBM dual issue.
    pub hbm_dual_cmds: u64,

    /// Per-rank cycles spent in self-refresh.
    pub sref_cycles: Vec<u64>,
    /// Per-rank cycles with every bank idle.
    pub all_bank_idle_cycles: Vec<u64>,
    /// Per-rank cycles with at least one bank active.
    pub rank_active_cycles: Vec<u64>,

    /// Read latency from admission to return.
    pub read_latency: ValueStat,
    /// Write latency from admission to device write.
    pub write_latency: ValueStat,
    /// Cycles between consecutive admissions.
    pub interarrival_latency: ValueStat,
}

impl Counters {
    fn new(ranks: usize) -> Self {
        Self {
            sref_cycles: vec![0; ranks],
            all_bank_idle_cycles: vec![0; ranks],
            rank_active_cycles: vec![0; ranks],
            ..Self::default()
        }
    }

    fn delta(&self, base: &Counters) -> Counters {
        Counters {
            num_cycles: self.num_cycles - base.num_cycles,
            num_reads_done: self.num_reads_done - base.num_reads_done,
            num_writes_done: self.num_writes_done - base.num_writes_done,
            num_mrs_done: self.num_mrs_done - base.num_mrs_done,
            num_read_cmds: self.num_read_cmds - base.num_read_cmds,
            num_write_cmds: self.num_write_cmds - base.num_write_cmds,
            num_act_cmds: self.num_act_cmds - base.num_act_cmds,
            num_pre_cmds: self.num_pre_cmds - base.num_pre_cmds,
            num_ref_cmds: self.num_ref_cmds - base.num_ref_cmds,
            num_refb_cmds: self.num_refb_cmds - base.num_refb_cmds,
            num_srefe_cmds: self.num_srefe_cmds - base.num_srefe_cmds,
            num_srefx_cmds: self.num_srefx_cmds - base.num_srefx_cmds,
            num_mrs_cmds: self.num_mrs_cmds - base.num_mrs_cmds,
            num_read_row_hits: self.num_read_row_hits - base.num_read_row_hits,
            num_write_row_hits: self.num_write_row_hits - base.num_write_row_hits,
            hbm_dual_cmds: self.hbm_dual_cmds - base.hbm_dual_cmds,
            sref_cycles: sub_vec(&self.sref_cycles, &base.sref_cycles),
            all_bank_idle_cycles: sub_vec(&self.all_bank_idle_cycles, &base.all_bank_idle_cycles),
            rank_active_cycles: sub_vec(&self.rank_active_cycles, &base.rank_active_cycles),
            read_latency: self.read_latency.delta(&base.read_latency),
            write_latency: self.write_latency.delta(&base.write_latency),
            interarrival_latency: self.interarrival_latency.delta(&base.interarrival_latency),
        }
    }
}

fn sub_vec(a: &[u64], b: &[u64]) -> Vec<u64> {
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}

/// Per-channel statistics: cumulative counters plus the epoch baseline.
#[derive(Debug, Clone)]
pub struct ChannelStats {
    channel_id: usize,
    /// Cumulative counters, mutated directly by the controller.
    pub counters: Counters,
    epoch_base: Counters,
    epoch_num: u64,
}

impl ChannelStats {
    /// Creates a stats block for one channel with `ranks` rank vectors.
    pub fn new(channel_id: usize, ranks: usize) -> Self {
        Self {
            channel_id,
            counters: Counters::new(ranks),
            epoch_base: Counters::new(ranks),
            epoch_num: 0,
        }
    }

    /// Number of completed epochs.
    pub fn epoch_num(&self) -> u64 {
        self.epoch_num
    }

    /// Counters accumulated since the last epoch boundary.
    pub fn epoch_counters(&self) -> Counters {
        self.counters.delta(&self.epoch_base)
    }

    /// Prints the delta since the previous epoch and advances the baseline.
    pub fn print_epoch(&mut self) {
        self.epoch_num += 1;
        let delta = self.epoch_counters();
        println!(
            "----- epoch {} channel {} ({} cycles) -----",
            self.epoch_num, self.channel_id, delta.num_cycles
        );
        print_counters(&delta);
        self.epoch_base = self.counters.clone();
    }

    /// Prints cumulative totals.
    pub fn print_final(&self) {
        println!("===== channel {} final stats =====", self.channel_id);
        print_counters(&self.counters);
    }
}

fn print_counters(c: &Counters) {
    let row = |name: &str, value: u64| println!("{:<28}{}", name, value);
    row("num_cycles", c.num_cycles);
    row("num_reads_done", c.num_reads_done);
    row("num_writes_done", c.num_writes_done);
    row("num_mrs_done", c.num_mrs_done);
    row("num_read_cmds", c.num_read_cmds);
    row("num_write_cmds", c.num_write_cmds);
    row("num_act_cmds", c.num_act_cmds);
    row("num_pre_cmds", c.num_pre_cmds);
    row("num_ref_cmds", c.num_ref_cmds);
    row("num_refb_cmds", c.num_refb_cmds);
    row("num_srefe_cmds", c.num_srefe_cmds);
    row("num_srefx_cmds", c.num_srefx_cmds);
    row("num_mrs_cmds", c.num_mrs_cmds);
    row("num_read_row_hits", c.num_read_row_hits);
    row("num_write_row_hits", c.num_write_row_hits);
    row("hbm_dual_cmds", c.hbm_dual_cmds);
    for (r, v) in c.sref_cycles.iter().enumerate() {
        println!("{:<28}{}", format!("sref_cycles.{}", r), v);
    }
    for (r, v) in c.all_bank_idle_cycles.iter().enumerate() {
        println!("{:<28}{}", format!("all_bank_idle_cycles.{}", r), v);
    }
    for (r, v) in c.rank_active_cycles.iter().enumerate() {
        println!("{:<28}{}", format!("rank_active_cycles.{}", r), v);
    }
    let lat = |name: &str, v: &ValueStat| {
        println!(
            "{:<28}avg {:.2}  max {}  n {}",
            name,
            v.avg(),
            v.max,
            v.count
        );
    };
    lat("read_latency", &c.read_latency);
    lat("write_latency", &c.write_latency);
    lat("interarrival_latency", &c.interarrival_latency);
}
