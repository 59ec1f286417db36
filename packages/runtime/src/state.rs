//! Actor state persistence.

use std::sync::Arc;

use actor_core::ActorAddress;
use serde_json::Value;
use store::Store;

use crate::RuntimeError;

/// Latest serialized state blob per actor address.
///
/// Last-writer-wins with no versioning; under correct lock discipline
/// the drain pass is the only writer and that is sufficient.
pub struct StateStore<S> {
    store: Arc<S>,
}

impl<S: Store> StateStore<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Load the current state, or `None` for an address that has never
    /// been initialised.
    pub async fn get(&self, address: &ActorAddress) -> Result<Option<Value>, RuntimeError> {
        match self.store.get(&address.state_key()).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Replace the current state.
    pub async fn set(&self, address: &ActorAddress, state: &Value) -> Result<(), RuntimeError> {
        let raw = serde_json::to_string(state)?;
        self.store.set(&address.state_key(), &raw).await?;
        tracing::debug!("persisted state for {}", address);
        Ok(())
    }
}
