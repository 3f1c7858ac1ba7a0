//! DRAM simulator CLI.
//!
//! This binary provides a single entry point for all simulation modes. It
//! performs:
//! 1. **Trace run:** Replay a `<hex-addr> <op> <cycle>` trace file.
//! 2. **Random run:** Deterministic pseudo-random stimulus, no trace needed.
//! 3. **Stream run:** Striding write-then-read stream stimulus.
//!
//! Configuration is JSON (`--config`); built-in defaults otherwise.

use clap::{Parser, Subcommand};
use dram_core::config::Config;
use dram_core::sim::trace::{RandomStimulus, StreamStimulus};
use dram_core::sim::{MemorySystem, TraceReplayer};
use dram_core::Transaction;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "dramsim",
    author,
    version,
    about = "Cycle-accurate DRAM memory system simulator",
    long_about = "Replay a memory trace or run built-in stimulus against a simulated DRAM system.\n\nExamples:\n  dramsim run -t traces/stream.trc\n  dramsim run -t traces/mix.trc -c configs/ddr4_2ch.json\n  dramsim random --cycles 200000 --write-one-in 3\n  dramsim stream --length 4096"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a trace file.
    Run {
        /// Trace file (`<hex-addr> <READ|WRITE|MRS> <cycle>` per line).
        #[arg(short, long)]
        trace: PathBuf,

        /// JSON configuration file (defaults when omitted).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Stop after this many cycles even if the trace has not drained.
        #[arg(long)]
        cycles: Option<u64>,
    },

    /// Run deterministic pseudo-random stimulus.
    Random {
        /// JSON configuration file (defaults when omitted).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Cycles to simulate.
        #[arg(long, default_value_t = 100_000)]
        cycles: u64,

        /// LCG seed.
        #[arg(long, default_value_t = 1)]
        seed: u64,

        /// Address space width in bits.
        #[arg(long, default_value_t = 28)]
        addr_bits: u32,

        /// One request in N is a write (0 = reads only).
        #[arg(long, default_value_t = 4)]
        write_one_in: u64,
    },

    /// Run a striding write-then-read stream.
    Stream {
        /// JSON configuration file (defaults when omitted).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Cycles to simulate.
        #[arg(long, default_value_t = 100_000)]
        cycles: u64,

        /// Stream base address.
        #[arg(long, default_value_t = 0)]
        base: u64,

        /// Stride in bytes between consecutive requests.
        #[arg(long, default_value_t = 64)]
        stride: u64,

        /// Blocks per pass.
        #[arg(long, default_value_t = 1024)]
        length: u64,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            trace,
            config,
            cycles,
        } => cmd_run(&trace, config, cycles),
        Commands::Random {
            config,
            cycles,
            seed,
            addr_bits,
            write_one_in,
        } => {
            let mut stim = RandomStimulus::new(seed, addr_bits, write_one_in);
            cmd_stimulus(config, cycles, move || stim.next_request());
        }
        Commands::Stream {
            config,
            cycles,
            base,
            stride,
            length,
        } => {
            let mut stim = StreamStimulus::new(base, stride, length);
            cmd_stimulus(config, cycles, move || stim.next_request());
        }
    }
}

/// Loads the JSON configuration, or the built-in defaults when omitted.
///
/// Exits with a diagnostic on read or parse failure.
fn load_config(path: Option<PathBuf>) -> Config {
    let Some(path) = path else {
        return Config::default();
    };
    let text = fs::read_to_string(&path).unwrap_or_else(|err| {
        eprintln!("Error reading config {}: {}", path.display(), err);
        process::exit(1);
    });
    serde_json::from_str(&text).unwrap_or_else(|err| {
        eprintln!("Error parsing config {}: {}", path.display(), err);
        process::exit(1);
    })
}

fn print_banner(config: &Config, mode: &str) {
    println!(
        "[*] {}: {} channel(s), {} rank(s), {:?} / {:?}",
        mode,
        config.device.channels,
        config.device.ranks,
        config.controller.row_buf_policy,
        config.controller.queue_structure
    );
}

/// Replays a trace: submits each request at its cycle (back-pressured by
/// `will_accept`), runs until the trace and all outstanding requests drain
/// or the cycle limit hits, then prints final stats.
fn cmd_run(trace: &Path, config: Option<PathBuf>, cycles: Option<u64>) {
    let config = load_config(config);
    let mut replayer = TraceReplayer::from_file(trace).unwrap_or_else(|err| {
        eprintln!("Error loading trace {}: {}", trace.display(), err);
        process::exit(1);
    });
    print_banner(&config, "Trace run");
    println!(
        "    trace={} requests={}",
        trace.display(),
        replayer.remaining()
    );

    let epoch_period = config.output.epoch_period;
    let mut system = MemorySystem::new(config);
    let done = Arc::new(AtomicU64::new(0));
    let done_rd = Arc::clone(&done);
    let done_wr = Arc::clone(&done);
    system.register_callbacks(
        Box::new(move |_addr| {
            done_rd.fetch_add(1, Ordering::Relaxed);
        }),
        Box::new(move |_addr| {
            done_wr.fetch_add(1, Ordering::Relaxed);
        }),
    );

    let mut submitted: u64 = 0;
    loop {
        let clk = system.clk();
        if let Some(limit) = cycles {
            if clk >= limit {
                break;
            }
        }
        if replayer.done() && done.load(Ordering::Relaxed) == submitted {
            break;
        }
        while let Some(req) = replayer.front_due(clk) {
            if !system.will_accept(req.addr, req.is_write, req.is_mrs) {
                break;
            }
            let req = replayer.advance();
            let trans = if req.is_mrs {
                Transaction::mrs(req.addr)
            } else if req.is_write {
                Transaction::write(req.addr, vec![req.addr])
            } else {
                Transaction::read(req.addr)
            };
            system.add_transaction(trans);
            submitted += 1;
        }
        system.clock_tick();
        if epoch_period != 0 && system.clk() % epoch_period == 0 {
            system.print_epoch_stats();
        }
    }

    system.print_final_stats();
    println!(
        "[*] {} cycles, {} submitted, {} completed",
        system.clk(),
        submitted,
        done.load(Ordering::Relaxed)
    );
}

/// Runs generated stimulus: offers one request per cycle while the target
/// channel accepts it, for a fixed number of cycles.
fn cmd_stimulus<F: FnMut() -> (u64, bool)>(
    config: Option<PathBuf>,
    cycles: u64,
    mut next_request: F,
) {
    let config = load_config(config);
    print_banner(&config, "Stimulus run");

    let epoch_period = config.output.epoch_period;
    let mut system = MemorySystem::new(config);
    let done = Arc::new(AtomicU64::new(0));
    let done_rd = Arc::clone(&done);
    let done_wr = Arc::clone(&done);
    system.register_callbacks(
        Box::new(move |_addr| {
            done_rd.fetch_add(1, Ordering::Relaxed);
        }),
        Box::new(move |_addr| {
            done_wr.fetch_add(1, Ordering::Relaxed);
        }),
    );

    let mut submitted: u64 = 0;
    let mut held: Option<(u64, bool)> = None;
    for _ in 0..cycles {
        let (addr, is_write) = held.take().unwrap_or_else(&mut next_request);
        if system.will_accept(addr, is_write, false) {
            let trans = if is_write {
                Transaction::write(addr, vec![addr])
            } else {
                Transaction::read(addr)
            };
            system.add_transaction(trans);
            submitted += 1;
        } else {
            // Re-offer the same request next cycle.
            held = Some((addr, is_write));
        }
        system.clock_tick();
        if epoch_period != 0 && system.clk() % epoch_period == 0 {
            system.print_epoch_stats();
        }
    }

    system.print_final_stats();
    println!(
        "[*] {} cycles, {} submitted, {} completed",
        system.clk(),
        submitted,
        done.load(Ordering::Relaxed)
    );
}
