use crate::{crypto::Address, time::TimestampSeconds};

/// Per-call context supplied by the host
///
/// `caller` is the authenticated principal invoking the operation and `now`
/// is the host timestamp. Both are read once and stay fixed for the whole
/// operation, so every admission decision inside one call sees the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Address,
    pub now: TimestampSeconds,
}

impl CallContext {
    pub fn new(caller: Address, now: TimestampSeconds) -> Self {
        Self { caller, now }
    }
}
