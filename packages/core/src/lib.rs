//! Core domain types for the ensemble actor runtime.
//!
//! This crate contains shared types used across all packages:
//! - ActorAddress and ActorPid for identity
//! - MailboxMessage for durable mailbox entries
//! - ActorMeta for per-address registration records

mod address;
mod message;
mod meta;

pub use address::{ActorAddress, ActorPid};
pub use message::{MailboxMessage, MessageKind};
pub use meta::ActorMeta;
