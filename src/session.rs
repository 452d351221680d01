use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::rate_limit::RateWindow;

/// Identifies one accepted TCP connection for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{:03}", self.0)
    }
}

/// Rate windows of every session that has sent at least one query.
///
/// Entries are never evicted, so the table grows with the number of sessions
/// seen by the process. Dropping a finished session's window would let a
/// client reset its budget by reconnecting under a new id.
pub type SessionTable = Arc<Mutex<HashMap<SessionId, RateWindow>>>;

/// Hands out session ids and owns the table the rate limiter works on.
///
/// Only the accept loop calls [`SessionRegistry::next_session_id`], so the
/// counter needs no synchronisation.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    last: u64,
    windows: SessionTable,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns 1, 2, 3, ... in order.
    pub fn next_session_id(&mut self) -> SessionId {
        self.last += 1;
        SessionId(self.last)
    }

    pub fn windows(&self) -> SessionTable {
        Arc::clone(&self.windows)
    }
}
