//! On-DIMM data buffer for load-reduced DIMMs.
//!
//! LRDIMM modules stage data through a buffer chip, adding latency on both
//! directions. The bridge observes every issued DRAM command: READs schedule
//! a payload response `tPDM_RD` cycles later, drawn from the data staged by
//! earlier writes (or a zero burst for never-written addresses). Write
//! payloads are handed over at WRITE issue and retained as the buffered
//! image of that address.

use crate::common::Command;
use std::collections::{HashMap, VecDeque};

/// The data-buffer bridge for one channel.
pub struct LrdimmBridge {
    clk: u64,
    t_pdm_rd: u64,
    burst_len: usize,
    staged: HashMap<(usize, u64), Vec<u64>>,
    responses: VecDeque<ReadResponse>,
}

struct ReadResponse {
    ready_clk: u64,
    cmd: Command,
    payload: Vec<u64>,
}

impl LrdimmBridge {
    /// Creates the bridge.
    ///
    /// `t_pdm_rd` is the buffer's read latency; `burst_len` sizes the zero
    /// payload returned for addresses with no staged data.
    pub fn new(t_pdm_rd: u64, burst_len: usize) -> Self {
        Self {
            clk: 0,
            t_pdm_rd,
            burst_len,
            staged: HashMap::new(),
            responses: VecDeque::new(),
        }
    }

    /// Advances the buffer one cycle.
    pub fn tick(&mut self) {
        self.clk += 1;
    }

    /// Observes an issued DRAM command; READs schedule a payload response.
    pub fn record_ddr_cmd(&mut self, cmd: &Command) {
        if !cmd.is_read() {
            return;
        }
        let payload = self
            .staged
            .get(&(cmd.rank(), cmd.hex_addr))
            .cloned()
            .unwrap_or_else(|| vec![0; self.burst_len]);
        self.responses.push_back(ReadResponse {
            ready_clk: self.clk + self.t_pdm_rd,
            cmd: *cmd,
            payload,
        });
    }

    /// Stages the payload of a WRITE at issue time.
    pub fn enqueue_write_data(&mut self, rank: usize, addr: u64, payload: Vec<u64>) {
        self.staged.insert((rank, addr), payload);
    }

    /// Delivers the oldest completed read payload, if one is due.
    pub fn get_read_response(&mut self) -> Option<(Command, Vec<u64>)> {
        if self.responses.front()?.ready_clk > self.clk {
            return None;
        }
        let resp = self.responses.pop_front().unwrap();
        Some((resp.cmd, resp.payload))
    }
}
