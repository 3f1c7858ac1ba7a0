//! Decoded DRAM addresses and the flat-address mapping.
//!
//! A flat physical address is split into (channel, rank, bankgroup, bank,
//! row, column) fields. The field order is fixed: the block offset (bus
//! width x burst length bytes) occupies the lowest bits, then channel,
//! column, bank, bankgroup, rank, and row as the most significant field.
//! Low-order channel bits spread consecutive blocks across channels;
//! high-order row bits keep a sequential stream inside one row.

use crate::config::DeviceConfig;
use std::fmt::{self, Display, Formatter};

/// A decoded DRAM address.
///
/// Produced by [`AddressMapping::decode`]; carried by every
/// [`Command`](crate::common::Command) alongside the originating flat address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Address {
    /// Channel index.
    pub channel: usize,
    /// Rank index within the channel.
    pub rank: usize,
    /// Bankgroup index within the rank.
    pub bankgroup: usize,
    /// Bank index within the bankgroup.
    pub bank: usize,
    /// Row index within the bank.
    pub row: u64,
    /// Column block index within the row.
    pub column: u64,
}

impl Address {
    /// Creates an address that names only a rank.
    ///
    /// Used for rank-scoped commands (REFRESH, SREF_ENTER, SREF_EXIT) where
    /// the remaining fields are irrelevant.
    pub fn rank_only(rank: usize) -> Self {
        Self {
            rank,
            ..Self::default()
        }
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "ch {} ra {} bg {} ba {} ro {:#x} co {:#x}",
            self.channel, self.rank, self.bankgroup, self.bank, self.row, self.column
        )
    }
}

/// Bit-field widths and shifts derived from the device geometry.
///
/// All widths are log2 of the corresponding [`DeviceConfig`] count, so every
/// geometry value must be a power of two.
#[derive(Debug, Clone, Copy)]
pub struct AddressMapping {
    block_bits: u32,
    channel_bits: u32,
    column_bits: u32,
    bank_bits: u32,
    bankgroup_bits: u32,
    rank_bits: u32,
    row_bits: u32,
}

impl AddressMapping {
    /// Derives the mapping from the device geometry.
    ///
    /// The block offset covers one burst (`bus_width / 8 * burst_len` bytes);
    /// the column field addresses burst-sized blocks, so it spans
    /// `columns / burst_len` values.
    pub fn new(device: &DeviceConfig) -> Self {
        let block_bytes = device.bus_width / 8 * device.burst_len;
        Self {
            block_bits: log2(block_bytes),
            channel_bits: log2(device.channels),
            column_bits: log2(device.columns / device.burst_len),
            bank_bits: log2(device.banks_per_group),
            bankgroup_bits: log2(device.bankgroups),
            rank_bits: log2(device.ranks),
            row_bits: log2(device.rows),
        }
    }

    /// Decodes a flat physical address into its DRAM fields.
    pub fn decode(&self, hex_addr: u64) -> Address {
        let mut bits = hex_addr >> self.block_bits;
        let mut take = |width: u32| -> u64 {
            let field = bits & ((1 << width) - 1);
            bits >>= width;
            field
        };
        Address {
            channel: take(self.channel_bits) as usize,
            column: take(self.column_bits),
            bank: take(self.bank_bits) as usize,
            bankgroup: take(self.bankgroup_bits) as usize,
            rank: take(self.rank_bits) as usize,
            row: take(self.row_bits),
        }
    }

    /// Composes a flat physical address from DRAM fields.
    ///
    /// Inverse of [`decode`](Self::decode); the block offset is zero.
    pub fn compose(&self, addr: &Address) -> u64 {
        let mut bits = addr.row;
        let mut put = |width: u32, field: u64| {
            bits = (bits << width) | (field & ((1 << width) - 1));
        };
        put(self.rank_bits, addr.rank as u64);
        put(self.bankgroup_bits, addr.bankgroup as u64);
        put(self.bank_bits, addr.bank as u64);
        put(self.column_bits, addr.column);
        put(self.channel_bits, addr.channel as u64);
        bits << self.block_bits
    }
}

/// Floor log2; zero for zero counts (field width collapses to nothing).
fn log2(value: u64) -> u32 {
    if value <= 1 { 0 } else { value.ilog2() }
}
