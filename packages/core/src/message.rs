//! Durable mailbox message types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ActorPid;

/// Whether a message expects a published reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageKind {
    /// Request/response; the handler result is published on the caller's
    /// channel.
    Call,
    /// Fire-and-forget.
    Cast,
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageKind::Call => write!(f, "call"),
            MessageKind::Cast => write!(f, "cast"),
        }
    }
}

/// One entry in an actor's durable mailbox.
///
/// Messages are immutable once enqueued; the store's atomic pop
/// guarantees each is removed exactly once, by exactly one drain pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailboxMessage {
    /// Token identifying the sender; for a call, also the reply channel.
    pub caller: ActorPid,
    pub kind: MessageKind,
    /// Opaque payload, matched against the role's patterns at dispatch.
    pub payload: Value,
}

impl MailboxMessage {
    /// Create a request/response message.
    pub fn call(caller: ActorPid, payload: Value) -> Self {
        Self {
            caller,
            kind: MessageKind::Call,
            payload,
        }
    }

    /// Create a fire-and-forget message.
    pub fn cast(caller: ActorPid, payload: Value) -> Self {
        Self {
            caller,
            kind: MessageKind::Cast,
            payload,
        }
    }

    /// Whether this message expects a published reply.
    pub fn is_call(&self) -> bool {
        matches!(self.kind, MessageKind::Call)
    }
}
