//! Per-call capability descriptor.

use sharepool_types::{Address, Timestamp};

/// Who is calling and when.
///
/// Every mutating pool operation receives one; role checks (member, operator,
/// owner) are made against `caller`, time gates against `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Address,
    pub now: Timestamp,
}

impl CallContext {
    pub fn new(caller: Address, now: Timestamp) -> Self {
        Self { caller, now }
    }

    /// Same caller, later time.
    pub fn at(self, now: Timestamp) -> Self {
        Self { now, ..self }
    }
}
