//! DRAM command types and the command carrier.

use crate::common::Address;
use std::fmt::{self, Display, Formatter};

/// DRAM-level command types.
///
/// Dispatch on a command is always an exhaustive match on this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    /// Open a row in a bank.
    Activate,
    /// Close the open row in a bank.
    Precharge,
    /// Column read from the open row.
    Read,
    /// Column read that closes the row afterwards.
    ReadPrecharge,
    /// Column write to the open row.
    Write,
    /// Column write that closes the row afterwards.
    WritePrecharge,
    /// All-bank refresh for one rank.
    Refresh,
    /// Single-bank refresh.
    RefreshBank,
    /// Enter self-refresh on one rank.
    SrefEnter,
    /// Exit self-refresh on one rank.
    SrefExit,
    /// Mode register set.
    Mrs,
}

impl CommandType {
    /// Short uppercase mnemonic used in the command trace.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Activate => "ACT",
            Self::Precharge => "PRE",
            Self::Read => "READ",
            Self::ReadPrecharge => "READ_P",
            Self::Write => "WRITE",
            Self::WritePrecharge => "WRITE_P",
            Self::Refresh => "REF",
            Self::RefreshBank => "REFB",
            Self::SrefEnter => "SREF_ENTER",
            Self::SrefExit => "SREF_EXIT",
            Self::Mrs => "MRS",
        }
    }
}

/// A DRAM command: type tag, decoded address, and the originating flat
/// address for pending-queue lookups downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    /// Command type tag.
    pub cmd_type: CommandType,
    /// Decoded address tuple.
    pub addr: Address,
    /// Flat physical address of the originating transaction.
    pub hex_addr: u64,
}

impl Command {
    /// Creates a command.
    pub fn new(cmd_type: CommandType, addr: Address, hex_addr: u64) -> Self {
        Self {
            cmd_type,
            addr,
            hex_addr,
        }
    }

    /// Creates a rank-scoped command (REFRESH, SREF_ENTER, SREF_EXIT).
    pub fn rank_level(cmd_type: CommandType, rank: usize) -> Self {
        Self::new(cmd_type, Address::rank_only(rank), 0)
    }

    /// True for READ and READ_PRECHARGE.
    pub fn is_read(&self) -> bool {
        matches!(self.cmd_type, CommandType::Read | CommandType::ReadPrecharge)
    }

    /// True for WRITE and WRITE_PRECHARGE.
    pub fn is_write(&self) -> bool {
        matches!(
            self.cmd_type,
            CommandType::Write | CommandType::WritePrecharge
        )
    }

    /// True for any column access (read or write, with or without
    /// auto-precharge).
    pub fn is_read_write(&self) -> bool {
        self.is_read() || self.is_write()
    }

    /// True for MRS.
    pub fn is_mrs(&self) -> bool {
        self.cmd_type == CommandType::Mrs
    }

    /// True for REFRESH and REFRESH_BANK.
    pub fn is_refresh(&self) -> bool {
        matches!(self.cmd_type, CommandType::Refresh | CommandType::RefreshBank)
    }

    /// Rank field of the decoded address.
    pub fn rank(&self) -> usize {
        self.addr.rank
    }

    /// Bankgroup field of the decoded address.
    pub fn bankgroup(&self) -> usize {
        self.addr.bankgroup
    }

    /// Bank field of the decoded address.
    pub fn bank(&self) -> usize {
        self.addr.bank
    }

    /// Row field of the decoded address.
    pub fn row(&self) -> u64 {
        self.addr.row
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "{:<10} {:>2} {:>2} {:>2} {:>8x} {:>8x}",
            self.cmd_type.mnemonic(),
            self.addr.rank,
            self.addr.bankgroup,
            self.addr.bank,
            self.addr.row,
            self.addr.column
        )
    }
}
