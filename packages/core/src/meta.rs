//! Per-address registration records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ActorPid;

/// Registration record stored at `meta-<address>`.
///
/// Existence of this record is what makes an address routable; senders
/// check it before touching the mailbox. The parent pid supports
/// supervision bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorMeta {
    /// Role the actor was spawned under.
    pub role: String,
    /// Pid of the runtime instance that spawned the actor.
    pub parent: ActorPid,
    /// When the actor was spawned.
    pub spawned_at: DateTime<Utc>,
}

impl ActorMeta {
    /// Create a record for a freshly spawned actor.
    pub fn new(role: impl Into<String>, parent: ActorPid) -> Self {
        Self {
            role: role.into(),
            parent,
            spawned_at: Utc::now(),
        }
    }
}
