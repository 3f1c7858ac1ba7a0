//! Address Mapping Tests.
//!
//! Verifies field extraction and the decode/compose round trip for the
//! fixed channel–column–bank–bankgroup–rank–row packing.

use dram_core::common::{Address, AddressMapping};
use dram_core::config::Config;

fn mapping() -> (Config, AddressMapping) {
    let mut config = Config::default();
    config.device.channels = 2;
    config.device.ranks = 2;
    config.device.bankgroups = 2;
    config.device.banks_per_group = 4;
    config.device.rows = 1 << 14;
    config.device.columns = 128;
    // 64-bit bus, burst 8: 64-byte blocks, 6 offset bits.
    (config.clone(), AddressMapping::new(&config.device))
}

/// Address zero decodes to all-zero fields.
#[test]
fn zero_address_decodes_to_origin() {
    let (_, map) = mapping();
    assert_eq!(map.decode(0), Address::default());
}

/// The block offset does not affect any decoded field.
#[test]
fn block_offset_bits_are_ignored() {
    let (_, map) = mapping();
    assert_eq!(map.decode(0x0), map.decode(0x3f));
}

/// The channel field sits in the lowest bits above the block offset, so
/// consecutive blocks alternate channels.
#[test]
fn consecutive_blocks_alternate_channels() {
    let (_, map) = mapping();
    assert_eq!(map.decode(0x00).channel, 0);
    assert_eq!(map.decode(0x40).channel, 1);
    assert_eq!(map.decode(0x80).channel, 0);
}

/// Decode of a composed address recovers every field.
#[test]
fn compose_decode_round_trip() {
    let (_, map) = mapping();
    let addr = Address {
        channel: 1,
        rank: 1,
        bankgroup: 0,
        bank: 3,
        row: 0x2a5,
        column: 9,
    };
    assert_eq!(map.decode(map.compose(&addr)), addr);
}

/// `Config::address_mapping` is the same decode, reachable from config.
#[test]
fn config_exposes_the_mapping() {
    let (config, map) = mapping();
    let hex = map.compose(&Address {
        channel: 0,
        rank: 1,
        bankgroup: 1,
        bank: 2,
        row: 7,
        column: 3,
    });
    assert_eq!(config.address_mapping(hex), map.decode(hex));
}
