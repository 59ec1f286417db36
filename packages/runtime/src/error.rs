//! Runtime error types.

use std::time::Duration;

use actor_core::{ActorAddress, MessageKind};
use thiserror::Error;

/// Errors surfaced by runtime operations.
///
/// Lock contention is deliberately not represented here: failing to
/// acquire a lock is an expected concurrency outcome, modelled as `None`
/// from [`crate::LockManager::try_acquire`].
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("No role named '{0}' is registered with this runtime")]
    RoleNotFound(String),

    #[error("No actor exists at address {0}")]
    AddressNotFound(ActorAddress),

    #[error("An actor already exists at address {0}")]
    AddressTaken(ActorAddress),

    #[error("No {kind} handler matches the payload for {address}")]
    NoHandlerMatch {
        address: ActorAddress,
        kind: MessageKind,
    },

    #[error("Handler failed for {address}: {reason}")]
    HandlerFailed {
        address: ActorAddress,
        reason: String,
    },

    #[error("Init handler failed: {0}")]
    InitFailed(String),

    #[error("Call timed out after {0:?}")]
    CallTimeout(Duration),

    #[error("Call was cancelled")]
    CallCancelled,

    #[error("Reply channel closed before a result was published")]
    ReplyChannelClosed,

    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
