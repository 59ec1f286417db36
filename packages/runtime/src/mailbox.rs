//! Durable per-actor mailboxes.

use std::sync::Arc;

use actor_core::{ActorAddress, MailboxMessage};
use store::Store;

use crate::RuntimeError;

/// FIFO queue of pending messages, one list per address.
///
/// Order is global per address: the store's list operations define a
/// single order across all senders, and that is the order any drain
/// pass observes.
pub struct Mailbox<S> {
    store: Arc<S>,
}

impl<S: Store> Mailbox<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Append a message to the tail of the address's mailbox.
    pub async fn enqueue(
        &self,
        address: &ActorAddress,
        message: &MailboxMessage,
    ) -> Result<(), RuntimeError> {
        let raw = serde_json::to_string(message)?;
        self.store.push_tail(&address.mailbox_key(), &raw).await?;
        tracing::debug!("enqueued {} message for {}", message.kind, address);
        Ok(())
    }

    /// Atomically remove and return the head-most pending message.
    ///
    /// Only the holder of the address's lock should call this; the
    /// mailbox itself does not enforce lock discipline.
    pub async fn dequeue_next(
        &self,
        address: &ActorAddress,
    ) -> Result<Option<MailboxMessage>, RuntimeError> {
        match self.store.pop_head(&address.mailbox_key()).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }
}
