//! Common types shared across the simulator.
//!
//! This module organizes the data model every other component builds on:
//! 1. **Addresses:** Decoded DRAM address tuples and the flat-address mapping.
//! 2. **Commands:** DRAM-level command types and the `Command` carrier.
//! 3. **Transactions:** Requester-level read/write/MRS transactions.

/// Decoded DRAM addresses and flat-address mapping.
pub mod addr;

/// DRAM command types and the command carrier.
pub mod command;

/// Requester-level transactions.
pub mod transaction;

pub use addr::{Address, AddressMapping};
pub use command::{Command, CommandType};
pub use transaction::Transaction;
