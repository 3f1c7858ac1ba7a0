//! Admission Tests.
//!
//! Verifies `will_accept` / `add_transaction` behavior: posted write and
//! MRS acknowledgement, write merging, read-after-write forwarding, read
//! coalescing, and per-buffer capacity bounds.

use crate::common::harness::{test_config, TestContext};

// ──────────────────────────────────────────────────────────
// Posted acknowledgement
// ──────────────────────────────────────────────────────────

/// A write completes exactly one cycle after admission, regardless of when
/// the DRAM WRITE issues.
#[test]
fn write_acknowledged_next_cycle() {
    let mut ctx = TestContext::new();
    ctx.add_write(0x80, &[5]);

    assert!(
        ctx.drain_all_now().is_empty(),
        "write must not complete on its admission cycle"
    );
    ctx.run(1);
    assert_eq!(ctx.drain_all_now(), vec![(0x80, true)]);
    assert_eq!(ctx.ctrl.stats.counters.num_writes_done, 1);
}

/// An MRS transaction is acknowledged one cycle after admission, before the
/// device has seen the MRS command; the command still issues afterwards.
#[test]
fn mrs_acknowledged_next_cycle_command_issues_later() {
    let mut ctx = TestContext::new();
    ctx.add_mrs(0x40);
    ctx.run(1);

    assert_eq!(ctx.drain_all_now(), vec![(0x40, false)]);
    assert_eq!(ctx.ctrl.stats.counters.num_mrs_done, 1);

    // The DRAM MRS issues on a later cycle; no further completion appears.
    ctx.run(3);
    assert_eq!(ctx.ctrl.stats.counters.num_mrs_cmds, 1);
    assert!(ctx.drain_all_now().is_empty());
}

// ──────────────────────────────────────────────────────────
// Write merging + read-after-write forwarding
// ──────────────────────────────────────────────────────────

/// Double-write to one address: the second write merges into the pending
/// entry (payload overwrite), both are acknowledged, and a following read
/// is forwarded without touching DRAM. The pending write map never holds
/// more than one entry for the address.
#[test]
fn write_merge_then_forwarded_read() {
    let mut ctx = TestContext::new();

    // cycle 0: first write
    ctx.add_write(0x100, &[1]);
    assert_eq!(ctx.ctrl.pending_write_count(), 1);
    ctx.run(1);

    // cycle 1: second write to the same address merges
    ctx.add_write(0x100, &[2]);
    assert_eq!(ctx.ctrl.pending_write_count(), 1, "second write must merge");
    assert_eq!(
        ctx.drain_all_now(),
        vec![(0x100, true)],
        "first write ack at cycle 1"
    );
    ctx.run(1);

    // cycle 2: read is served from the pending write
    ctx.add_read(0x100);
    assert_eq!(
        ctx.ctrl.pending_read_count(0x100),
        0,
        "forwarded read must not enter the pending read queue"
    );
    assert_eq!(
        ctx.drain_all_now(),
        vec![(0x100, true)],
        "second write ack at cycle 2"
    );
    ctx.run(1);

    // cycle 3: forwarded read completes
    assert_eq!(ctx.drain_all_now(), vec![(0x100, false)]);
    assert_eq!(
        ctx.ctrl.pending_write_count(),
        1,
        "the merged write is still headed to DRAM"
    );
    assert_eq!(ctx.ctrl.stats.counters.num_read_cmds, 0);
}

// ──────────────────────────────────────────────────────────
// Read coalescing
// ──────────────────────────────────────────────────────────

/// Three reads to one address issued before the READ completes: one READ
/// command services all three, and every return lands on the same cycle.
#[test]
fn reads_coalesce_and_complete_together() {
    let mut ctx = TestContext::new();
    ctx.add_read(0x200);
    ctx.run(1);
    ctx.add_read(0x200);
    ctx.run(1);
    ctx.add_read(0x200);
    assert_eq!(ctx.ctrl.pending_read_count(0x200), 3);

    let (clk, addr, is_write) = ctx.run_until_completion(100);
    assert_eq!((addr, is_write), (0x200, false));

    let rest = ctx.drain_all_now();
    assert_eq!(rest.len(), 2, "all coalesced reads ready on cycle {}", clk);
    assert!(rest.iter().all(|&(a, w)| a == 0x200 && !w));
    assert_eq!(
        ctx.ctrl.stats.counters.num_read_cmds, 1,
        "a single READ services every coalesced entry"
    );
}

// ──────────────────────────────────────────────────────────
// Capacity bounds
// ──────────────────────────────────────────────────────────

/// Split-mode buffers fill independently: a full read queue still accepts
/// writes and MRS, and vice versa.
#[test]
fn split_buffers_fill_independently() {
    let mut ctx = TestContext::new();
    for i in 0..16u64 {
        ctx.add_read(i << 6);
    }
    assert!(!ctx.ctrl.will_accept(0x9000, false, false));
    assert!(ctx.ctrl.will_accept(0x9000, true, false));
    assert!(ctx.ctrl.will_accept(0x9000, false, true));

    for i in 16..32u64 {
        ctx.add_write(i << 6, &[i]);
    }
    assert!(!ctx.ctrl.will_accept(0x9000, true, false));
    assert!(ctx.ctrl.will_accept(0x9000, false, true));
}

/// The MRS buffer is bounded like the others.
#[test]
fn mrs_buffer_bounded() {
    let mut ctx = TestContext::new();
    for i in 0..16u64 {
        ctx.add_mrs(i << 6);
    }
    assert!(!ctx.ctrl.will_accept(0, false, true));
    assert!(ctx.ctrl.will_accept(0, false, false), "reads unaffected");
}

/// In unified mode reads and writes share one bounded queue.
#[test]
fn unified_queue_shares_capacity() {
    let mut config = test_config();
    config.controller.unified_queue = true;
    let mut ctx = TestContext::with_config(config);
    for i in 0..8u64 {
        ctx.add_read(i << 6);
    }
    for i in 8..16u64 {
        ctx.add_write(i << 6, &[i]);
    }
    assert!(!ctx.ctrl.will_accept(0x9000, false, false));
    assert!(!ctx.ctrl.will_accept(0x9000, true, false));
    assert!(ctx.ctrl.will_accept(0x9000, false, true), "MRS is separate");
}

/// Coalesced reads consume pending-map entries, not queue slots: many reads
/// to one address never exhaust the read queue.
#[test]
fn coalesced_reads_do_not_consume_queue_slots() {
    let mut ctx = TestContext::new();
    for _ in 0..32 {
        ctx.add_read(0x300);
    }
    assert_eq!(ctx.ctrl.pending_read_count(0x300), 32);
    assert!(ctx.ctrl.will_accept(0x300, false, false));
}
