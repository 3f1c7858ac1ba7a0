//! Requester-level transactions.

use std::fmt::{self, Display, Formatter};

/// An accepted memory request.
///
/// At most one of `is_write` / `is_mrs` is set; both false means a read.
/// `added_cycle` is stamped at admission; `complete_cycle` is filled in by
/// the controller when the completion is scheduled.
#[derive(Debug, Clone, Default)]
pub struct Transaction {
    /// Flat physical address.
    pub addr: u64,
    /// Write transaction.
    pub is_write: bool,
    /// Mode-register-set transaction.
    pub is_mrs: bool,
    /// Data words carried by writes, and by reads once serviced (LRDIMM).
    pub payload: Vec<u64>,
    /// Cycle at which the controller accepted the transaction.
    pub added_cycle: u64,
    /// Cycle at which the requester observes completion.
    pub complete_cycle: u64,
}

impl Transaction {
    /// Creates a read transaction.
    pub fn read(addr: u64) -> Self {
        Self {
            addr,
            ..Self::default()
        }
    }

    /// Creates a write transaction carrying `payload`.
    pub fn write(addr: u64, payload: Vec<u64>) -> Self {
        Self {
            addr,
            is_write: true,
            payload,
            ..Self::default()
        }
    }

    /// Creates a mode-register-set transaction.
    pub fn mrs(addr: u64) -> Self {
        Self {
            addr,
            is_mrs: true,
            ..Self::default()
        }
    }

    /// Replaces the carried payload.
    pub fn update_payload(&mut self, payload: &[u64]) {
        self.payload.clear();
        self.payload.extend_from_slice(payload);
    }

    /// Transaction class letter used in logs.
    fn class(&self) -> &'static str {
        if self.is_mrs {
            "MRS"
        } else if self.is_write {
            "WR"
        } else {
            "RD"
        }
    }
}

impl Display for Transaction {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{} {:#x} @ {}", self.class(), self.addr, self.added_cycle)
    }
}
