//! Self-Refresh Power Tests.
//!
//! Verifies rank residency accounting, threshold-driven self-refresh
//! entry, and wakeup when traffic returns.

use crate::common::harness::{test_config, TestContext};

fn sref_config(threshold: u64) -> dram_core::config::Config {
    let mut config = test_config();
    config.power.enable_self_refresh = true;
    config.power.sref_threshold = threshold;
    config
}

/// A rank idle past the threshold enters self-refresh on a cycle with no
/// normal command issue, and starts accumulating self-refresh residency.
#[test]
fn idle_rank_enters_self_refresh() {
    let mut ctx = TestContext::with_config(sref_config(50));
    ctx.run(60);

    let counters = &ctx.ctrl.stats.counters;
    assert!(counters.num_srefe_cmds >= 1, "rank 0 entered self-refresh");
    assert!(ctx.ctrl.channel_state().is_rank_self_refreshing(0));
    assert!(counters.sref_cycles[0] > 0, "residency accounted");
}

/// With a long threshold nothing enters self-refresh.
#[test]
fn no_entry_below_threshold() {
    let mut ctx = TestContext::with_config(sref_config(1000));
    ctx.run(100);
    assert_eq!(ctx.ctrl.stats.counters.num_srefe_cmds, 0);
    assert!(!ctx.ctrl.channel_state().is_rank_self_refreshing(0));
}

/// Both ranks eventually enter; entries are staggered one per cycle.
#[test]
fn both_ranks_enter_one_per_cycle() {
    let mut ctx = TestContext::with_config(sref_config(50));
    ctx.run(60);
    assert_eq!(ctx.ctrl.stats.counters.num_srefe_cmds, 2);
    assert!(ctx.ctrl.channel_state().is_rank_self_refreshing(1));
}

/// A read arriving while the rank self-refreshes wakes it (SREF_EXIT) and
/// still completes.
#[test]
fn read_wakes_self_refreshing_rank() {
    let mut ctx = TestContext::with_config(sref_config(50));
    ctx.run(60);
    assert!(ctx.ctrl.channel_state().is_rank_self_refreshing(0));

    ctx.add_read(0x0);
    let (_, addr, is_write) = ctx.run_until_completion(100);
    assert_eq!((addr, is_write), (0x0, false));
    assert!(ctx.ctrl.stats.counters.num_srefx_cmds >= 1, "rank woke up");
    assert!(!ctx.ctrl.channel_state().is_rank_self_refreshing(0));
}

/// Idle residency counts toward `all_bank_idle_cycles` until entry, then
/// toward `sref_cycles`.
#[test]
fn residency_accounting_switches_class() {
    let mut ctx = TestContext::with_config(sref_config(50));
    ctx.run(60);
    let counters = &ctx.ctrl.stats.counters;
    assert!(counters.all_bank_idle_cycles[0] >= 50);
    assert_eq!(
        counters.all_bank_idle_cycles[0] + counters.sref_cycles[0],
        60,
        "every cycle is idle or self-refreshing for rank 0"
    );
}
