//! Identity types for actors and runtime instances.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Stable external name of one actor, unique within the system.
///
/// Assigned at spawn time, either caller-supplied or random. Every store
/// key belonging to an actor is derived from its address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorAddress(String);

impl ActorAddress {
    /// Create an address from a caller-supplied name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Create a random address.
    pub fn random() -> Self {
        Self(Ulid::new().to_string())
    }

    /// The advisory lock key for this address.
    pub fn lock_key(&self) -> String {
        format!("lock-{}", self.0)
    }

    /// The mailbox list key for this address.
    pub fn mailbox_key(&self) -> String {
        format!("mailbox-{}", self.0)
    }

    /// The state blob key for this address.
    pub fn state_key(&self) -> String {
        format!("state-{}", self.0)
    }

    /// The registration record key for this address.
    pub fn meta_key(&self) -> String {
        format!("meta-{}", self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ActorAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ActorAddress {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ActorAddress {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Opaque random token identifying one lock attempt or caller.
///
/// A pid doubles as the holder identity written into a lock key and as
/// the reply channel name for a call. Generated fresh per attempt; never
/// persisted beyond the lock's or call's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorPid(Ulid);

impl ActorPid {
    /// Generate a fresh pid.
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Parse a pid from a string.
    pub fn parse(s: &str) -> Result<Self, ulid::DecodeError> {
        Ok(Self(Ulid::from_string(s)?))
    }

    /// The pub/sub channel a call result for this token is published on.
    pub fn channel(&self) -> String {
        self.0.to_string()
    }

    /// The list key recording addresses spawned under this pid.
    pub fn children_key(&self) -> String {
        format!("children-{}", self.0)
    }
}

impl Default for ActorPid {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ActorPid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
