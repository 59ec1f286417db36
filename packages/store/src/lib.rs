//! Shared key-value store boundary for the ensemble runtime.
//!
//! Every distributed primitive the runtime needs — advisory locks,
//! durable mailboxes, state blobs, reply channels — is expressed through
//! the [`Store`] trait: atomic set-if-absent, plain get/set/delete, list
//! push-tail/pop-head, and publish/subscribe.
//!
//! Two backends are provided:
//! - [`MemoryStore`]: in-process, for tests and single-process use
//! - [`SurrealStore`]: SurrealDB-backed, for shared deployments

mod memory;
mod surreal;

pub use memory::MemoryStore;
pub use surreal::{SurrealConfig, SurrealStore};

use std::future::Future;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),
}

impl From<surrealdb::Error> for StoreError {
    fn from(err: surrealdb::Error) -> Self {
        StoreError::Query(err.to_string())
    }
}

/// Atomic primitives of the shared store.
///
/// `set_if_absent` and `pop_head` must be atomic: they are the two
/// points of contention that decide lock ownership and message
/// ownership respectively. A key names either a plain value or a list;
/// `delete` removes whichever is stored under it.
pub trait Store: Send + Sync + 'static {
    /// Set `key` to `value` only if the key is absent. Returns whether
    /// the write happened.
    fn set_if_absent(
        &self,
        key: &str,
        value: &str,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Read the value stored at `key`.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    /// Set `key` to `value`, overwriting any previous value.
    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Delete whatever is stored at `key`. Deleting an absent key is a
    /// no-op.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Append `value` to the tail of the list at `key`.
    fn push_tail(
        &self,
        key: &str,
        value: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Atomically remove and return the head of the list at `key`.
    fn pop_head(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    /// Publish `payload` to every current subscriber of `channel`.
    fn publish(
        &self,
        channel: &str,
        payload: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Subscribe to `channel`. The subscription is live before this
    /// returns: a payload published afterwards will be delivered.
    fn subscribe(
        &self,
        channel: &str,
    ) -> impl Future<Output = Result<Subscription, StoreError>> + Send;
}

/// A live subscription to one pub/sub channel.
///
/// Yields payloads in publish order. Dropping the subscription
/// unsubscribes.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<String>,
    forwarder: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Build a subscription fed directly through a channel.
    pub fn new(rx: mpsc::UnboundedReceiver<String>) -> Self {
        Self {
            rx,
            forwarder: None,
        }
    }

    /// Build a subscription fed by a background forwarding task; the
    /// task is aborted when the subscription is dropped.
    pub fn with_forwarder(rx: mpsc::UnboundedReceiver<String>, forwarder: JoinHandle<()>) -> Self {
        Self {
            rx,
            forwarder: Some(forwarder),
        }
    }

    /// Wait for the next published payload.
    ///
    /// Returns `None` when the channel can no longer deliver (the store
    /// was dropped or the underlying feed lapsed).
    pub async fn next_message(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }
    }
}
