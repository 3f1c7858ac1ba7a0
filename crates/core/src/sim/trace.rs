//! Trace-file parsing and self-contained stimulus generators.
//!
//! Trace format: one request per line, `<hex-addr> <READ|WRITE|MRS> <cycle>`,
//! with `#` comment lines and blank lines ignored:
//!
//! ```text
//! 0x2cc10 READ 126
//! 0x2cc40 WRITE 130
//! ```
//!
//! The generators produce deterministic stimulus without a trace file: a
//! hand-rolled LCG for random mixes and a striding walker for streams, so
//! runs reproduce exactly across hosts.

use std::fmt::{self, Display, Formatter};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// One parsed trace request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRequest {
    /// Flat physical address.
    pub addr: u64,
    /// Write request.
    pub is_write: bool,
    /// Mode-register-set request.
    pub is_mrs: bool,
    /// Earliest cycle at which the request may be submitted.
    pub cycle: u64,
}

/// Trace loading failure: I/O, or a malformed line with its line number.
#[derive(Debug)]
pub enum TraceError {
    /// Underlying file error.
    Io(io::Error),
    /// Malformed line.
    Parse {
        /// 1-based line number.
        line: usize,
        /// What was wrong.
        reason: String,
    },
}

impl Display for TraceError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "trace i/o error: {}", err),
            Self::Parse { line, reason } => write!(f, "trace line {}: {}", line, reason),
        }
    }
}

impl std::error::Error for TraceError {}

impl From<io::Error> for TraceError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// Loads and parses a whole trace file.
pub fn load_trace(path: &Path) -> Result<Vec<TraceRequest>, TraceError> {
    let file = File::open(path)?;
    let mut requests = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let request = parse_line(line).map_err(|reason| TraceError::Parse {
            line: index + 1,
            reason,
        })?;
        requests.push(request);
    }
    Ok(requests)
}

fn parse_line(line: &str) -> Result<TraceRequest, String> {
    let mut fields = line.split_whitespace();
    let addr = fields.next().ok_or("missing address field")?;
    let op = fields.next().ok_or("missing operation field")?;
    let cycle = fields.next().ok_or("missing cycle field")?;
    if fields.next().is_some() {
        return Err("trailing fields".into());
    }
    let addr = parse_hex(addr)?;
    let (is_write, is_mrs) = match op {
        "READ" | "read" => (false, false),
        "WRITE" | "write" => (true, false),
        "MRS" | "mrs" => (false, true),
        other => return Err(format!("unknown operation '{}'", other)),
    };
    let cycle = cycle
        .parse()
        .map_err(|_| format!("bad cycle '{}'", cycle))?;
    Ok(TraceRequest {
        addr,
        is_write,
        is_mrs,
        cycle,
    })
}

fn parse_hex(field: &str) -> Result<u64, String> {
    let digits = field
        .strip_prefix("0x")
        .or_else(|| field.strip_prefix("0X"))
        .unwrap_or(field);
    u64::from_str_radix(digits, 16).map_err(|_| format!("bad address '{}'", field))
}

/// Replays a parsed trace against the simulation clock.
pub struct TraceReplayer {
    requests: Vec<TraceRequest>,
    next: usize,
}

impl TraceReplayer {
    /// Wraps an already-parsed request list.
    pub fn new(requests: Vec<TraceRequest>) -> Self {
        Self { requests, next: 0 }
    }

    /// Loads a trace file and wraps it.
    pub fn from_file(path: &Path) -> Result<Self, TraceError> {
        Ok(Self::new(load_trace(path)?))
    }

    /// True once every request has been handed out.
    pub fn done(&self) -> bool {
        self.next >= self.requests.len()
    }

    /// Requests not yet handed out.
    pub fn remaining(&self) -> usize {
        self.requests.len() - self.next
    }

    /// The next request, if its submission cycle has been reached.
    pub fn front_due(&self, clk: u64) -> Option<&TraceRequest> {
        let request = self.requests.get(self.next)?;
        (request.cycle <= clk).then_some(request)
    }

    /// Hands out the next request unconditionally.
    pub fn advance(&mut self) -> TraceRequest {
        let request = self.requests[self.next].clone();
        self.next += 1;
        request
    }
}

/// Deterministic pseudo-random request generator (64-bit LCG).
pub struct RandomStimulus {
    state: u64,
    addr_mask: u64,
    write_one_in: u64,
}

impl RandomStimulus {
    const MUL: u64 = 6364136223846793005;
    const INC: u64 = 1442695040888963407;

    /// Creates the generator.
    ///
    /// Addresses span `addr_bits` bits, 64-byte aligned; one request in
    /// `write_one_in` is a write (zero means reads only).
    pub fn new(seed: u64, addr_bits: u32, write_one_in: u64) -> Self {
        Self {
            state: seed,
            addr_mask: (1u64 << addr_bits) - 1,
            write_one_in,
        }
    }

    /// Produces the next `(addr, is_write)` pair.
    pub fn next_request(&mut self) -> (u64, bool) {
        self.state = self.state.wrapping_mul(Self::MUL).wrapping_add(Self::INC);
        let addr = (self.state >> 16) & self.addr_mask & !0x3f;
        let is_write = self.write_one_in != 0 && (self.state >> 8) % self.write_one_in == 0;
        (addr, is_write)
    }
}

/// Striding stream generator: writes a region, then reads it back.
pub struct StreamStimulus {
    base: u64,
    stride: u64,
    length: u64,
    index: u64,
    writing: bool,
}

impl StreamStimulus {
    /// Creates a stream over `length` blocks of `stride` bytes from `base`.
    pub fn new(base: u64, stride: u64, length: u64) -> Self {
        Self {
            base,
            stride,
            length,
            index: 0,
            writing: true,
        }
    }

    /// Produces the next `(addr, is_write)` pair, alternating a write pass
    /// and a read pass over the region.
    pub fn next_request(&mut self) -> (u64, bool) {
        let addr = self.base + self.index * self.stride;
        let is_write = self.writing;
        self.index += 1;
        if self.index == self.length {
            self.index = 0;
            self.writing = !self.writing;
        }
        (addr, is_write)
    }
}
