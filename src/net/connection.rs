//! Session identity and session → acceptor events.
//!
//! # Responsibilities
//! - Generate unique session IDs for tracing
//! - Define the events a session reports to its acceptor (key-log records, completion)

use std::sync::atomic::{AtomicU64, Ordering};

use crate::observability::keylog::KeyLogRecord;
use crate::session::SessionOutcome;

/// Process-wide session counter; ids only need to be unique.
static SESSION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    /// Generate a new unique session ID.
    pub fn new() -> Self {
        Self(SESSION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Messages a session sends to the acceptor that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A secret became available and should be appended to the key log.
    KeyLog(KeyLogRecord),
    /// The session reached a terminal state. Sent exactly once.
    Finished {
        id: SessionId,
        outcome: SessionOutcome,
    },
}
