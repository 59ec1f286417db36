//! The drain pass: mailbox-to-emptiness processing under one lock.

use std::sync::Arc;

use actor_core::MessageKind;
use serde_json::Value;
use store::Store;

use crate::RuntimeError;
use crate::lock::{LockManager, LockToken};
use crate::mailbox::Mailbox;
use crate::role::Role;
use crate::state::StateStore;

/// Runs one continuous drain pass for an address whose lock is held.
///
/// The pass pops messages one at a time, dispatches each against the
/// role's table, persists the returned state between messages, and
/// publishes call results on the caller's channel. When the mailbox is
/// observed empty the lock is released and the pass ends: a message
/// enqueued a moment later is that enqueuer's responsibility (hand-off,
/// not hand-back).
pub(crate) struct DrainLoop<'a, S> {
    pub store: &'a Arc<S>,
    pub locks: &'a LockManager<S>,
    pub mailbox: &'a Mailbox<S>,
    pub states: &'a StateStore<S>,
}

impl<S: Store> DrainLoop<'_, S> {
    /// Process the mailbox to emptiness, then release the lock.
    ///
    /// On `NoHandlerMatch` or a handler failure the pass aborts with the
    /// lock still held: state and lock-release consistency cannot be
    /// guaranteed past an unrecovered failure, so nothing further is
    /// popped and recovery is left to an operator (`force_release`).
    pub async fn run(&self, role: &Role, token: LockToken) -> Result<(), RuntimeError> {
        let address = token.address().clone();
        tracing::debug!("drain pass started for {}", address);

        // State is loaded once per pass, then threaded handler to
        // handler so each sees exactly what its predecessor returned.
        let mut state: Option<Value> = None;
        let mut processed = 0usize;

        while let Some(message) = self.mailbox.dequeue_next(&address).await? {
            let prev_state = match state.take() {
                Some(current) => current,
                None => self.states.get(&address).await?.unwrap_or(Value::Null),
            };

            let new_state = match message.kind {
                MessageKind::Call => {
                    let handler = role.match_call(&message.payload).ok_or_else(|| {
                        tracing::warn!("no call handler matches a message for {}", address);
                        RuntimeError::NoHandlerMatch {
                            address: address.clone(),
                            kind: MessageKind::Call,
                        }
                    })?;

                    let (result, new_state) =
                        handler(message.payload, prev_state).await.map_err(|reason| {
                            RuntimeError::HandlerFailed {
                                address: address.clone(),
                                reason,
                            }
                        })?;

                    self.states.set(&address, &new_state).await?;
                    let raw = serde_json::to_string(&result)?;
                    self.store.publish(&message.caller.channel(), &raw).await?;
                    new_state
                }
                MessageKind::Cast => {
                    let handler = role.match_cast(&message.payload).ok_or_else(|| {
                        tracing::warn!("no cast handler matches a message for {}", address);
                        RuntimeError::NoHandlerMatch {
                            address: address.clone(),
                            kind: MessageKind::Cast,
                        }
                    })?;

                    let new_state =
                        handler(message.payload, prev_state).await.map_err(|reason| {
                            RuntimeError::HandlerFailed {
                                address: address.clone(),
                                reason,
                            }
                        })?;

                    self.states.set(&address, &new_state).await?;
                    new_state
                }
            };

            state = Some(new_state);
            processed += 1;
        }

        self.locks.release(token).await?;
        tracing::debug!("drain pass finished for {} ({} messages)", address, processed);
        Ok(())
    }
}
