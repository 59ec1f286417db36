//! The runtime facade: spawn, cast, call, and supervision operations.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use actor_core::{ActorAddress, ActorMeta, ActorPid, MailboxMessage, MessageKind};
use serde_json::Value;
use store::Store;
use tokio_util::sync::CancellationToken;

use crate::RuntimeError;
use crate::drain::DrainLoop;
use crate::lock::LockManager;
use crate::mailbox::Mailbox;
use crate::role::Role;
use crate::state::StateStore;

/// Timeout applied to `call` unless overridden.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-call policy: how long to wait for a published result, and an
/// optional cooperative cancellation token. Either outcome drops the
/// reply subscription before returning.
#[derive(Debug, Clone)]
pub struct CallOptions {
    timeout: Duration,
    cancel: Option<CancellationToken>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_CALL_TIMEOUT,
            cancel: None,
        }
    }

    /// Set the result timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Attach a cancellation token.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

impl Default for CallOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// One runtime instance.
///
/// Any number of instances may run concurrently against the same store;
/// the per-address lock is the sole admission gate for processing. The
/// role table is fixed at construction and passed by reference into
/// drain passes.
pub struct Runtime<S> {
    store: Arc<S>,
    locks: LockManager<S>,
    mailbox: Mailbox<S>,
    states: StateStore<S>,
    roles: HashMap<String, Role>,
    pid: ActorPid,
}

impl<S: Store> Runtime<S> {
    /// Create a runtime instance over `store` holding the given roles.
    pub fn new(store: Arc<S>, roles: impl IntoIterator<Item = Role>) -> Self {
        let roles = roles
            .into_iter()
            .map(|role| (role.name().to_string(), role))
            .collect();
        Self {
            locks: LockManager::new(store.clone()),
            mailbox: Mailbox::new(store.clone()),
            states: StateStore::new(store.clone()),
            store,
            roles,
            pid: ActorPid::new(),
        }
    }

    /// This instance's identity, recorded as parent of actors it spawns.
    pub fn pid(&self) -> ActorPid {
        self.pid
    }

    fn drain_loop(&self) -> DrainLoop<'_, S> {
        DrainLoop {
            store: &self.store,
            locks: &self.locks,
            mailbox: &self.mailbox,
            states: &self.states,
        }
    }

    fn role(&self, name: &str) -> Result<&Role, RuntimeError> {
        self.roles
            .get(name)
            .ok_or_else(|| RuntimeError::RoleNotFound(name.to_string()))
    }

    /// Whether an actor is registered at `address`.
    pub async fn exists(&self, address: &ActorAddress) -> Result<bool, RuntimeError> {
        Ok(self.store.get(&address.meta_key()).await?.is_some())
    }

    async fn meta(&self, address: &ActorAddress) -> Result<ActorMeta, RuntimeError> {
        let raw = self
            .store
            .get(&address.meta_key())
            .await?
            .ok_or_else(|| RuntimeError::AddressNotFound(address.clone()))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Resolve the role an address was spawned under, failing fast for
    /// unknown addresses.
    async fn role_for(&self, address: &ActorAddress) -> Result<&Role, RuntimeError> {
        let meta = self.meta(address).await?;
        self.role(&meta.role)
    }

    /// Spawn an actor at a random address.
    pub async fn spawn(&self, role: &str, init_payload: Value) -> Result<ActorAddress, RuntimeError> {
        self.spawn_named(role, init_payload, ActorAddress::random())
            .await
    }

    /// Spawn an actor at a caller-supplied address.
    ///
    /// The address lock arbitrates between concurrent spawners; losing
    /// it means someone else owns the address.
    pub async fn spawn_named(
        &self,
        role_name: &str,
        init_payload: Value,
        address: ActorAddress,
    ) -> Result<ActorAddress, RuntimeError> {
        let role = self.role(role_name)?;

        if self.exists(&address).await? {
            return Err(RuntimeError::AddressTaken(address));
        }
        let Some(token) = self.locks.try_acquire(&address).await? else {
            return Err(RuntimeError::AddressTaken(address));
        };

        let state = match role.init(init_payload).await {
            Ok(state) => state,
            Err(reason) => {
                self.locks.release(token).await?;
                return Err(RuntimeError::InitFailed(reason));
            }
        };

        self.states.set(&address, &state).await?;
        let meta = ActorMeta::new(role_name, self.pid);
        self.store
            .set(&address.meta_key(), &serde_json::to_string(&meta)?)
            .await?;
        self.store
            .push_tail(&self.pid.children_key(), address.as_str())
            .await?;
        self.locks.release(token).await?;

        tracing::info!("spawned {} actor at {}", role_name, address);
        Ok(address)
    }

    /// Fire-and-forget send.
    ///
    /// Enqueues the message, then attempts to take the address's lock.
    /// On success the mailbox is drained inline before returning; on
    /// contention this returns immediately and the concurrent owner
    /// picks the message up.
    pub async fn cast(&self, address: &ActorAddress, payload: Value) -> Result<(), RuntimeError> {
        let role = self.role_for(address).await?;
        if !role.accepts_cast(&payload) {
            return Err(RuntimeError::NoHandlerMatch {
                address: address.clone(),
                kind: MessageKind::Cast,
            });
        }

        let message = MailboxMessage::cast(self.pid, payload);
        self.mailbox.enqueue(address, &message).await?;

        if let Some(token) = self.locks.try_acquire(address).await? {
            self.drain_loop().run(role, token).await?;
        }
        Ok(())
    }

    /// Request/response send.
    ///
    /// Subscribes to a fresh caller token's channel before enqueueing,
    /// so a result published by a concurrent owner cannot be missed,
    /// then waits for the first payload published there subject to the
    /// timeout and cancellation policy in `options`.
    pub async fn call(
        &self,
        address: &ActorAddress,
        payload: Value,
        options: CallOptions,
    ) -> Result<Value, RuntimeError> {
        let role = self.role_for(address).await?;
        if !role.accepts_call(&payload) {
            return Err(RuntimeError::NoHandlerMatch {
                address: address.clone(),
                kind: MessageKind::Call,
            });
        }

        let caller = ActorPid::new();
        let mut subscription = self.store.subscribe(&caller.channel()).await?;

        let message = MailboxMessage::call(caller, payload);
        self.mailbox.enqueue(address, &message).await?;

        if let Some(token) = self.locks.try_acquire(address).await? {
            self.drain_loop().run(role, token).await?;
        }

        // A default token is never cancelled, so the branch only fires
        // when the caller supplied one.
        let cancel = options.cancel.unwrap_or_default();
        let raw = tokio::select! {
            received = tokio::time::timeout(options.timeout, subscription.next_message()) => {
                match received {
                    Ok(Some(raw)) => raw,
                    Ok(None) => return Err(RuntimeError::ReplyChannelClosed),
                    Err(_) => return Err(RuntimeError::CallTimeout(options.timeout)),
                }
            }
            _ = cancel.cancelled() => return Err(RuntimeError::CallCancelled),
        };

        Ok(serde_json::from_str(&raw)?)
    }

    /// Remove an actor: registration, state, pending mailbox, and lock.
    ///
    /// Deletes are last-writer-wins; a drain pass already running for
    /// the address is not interrupted.
    pub async fn kill(&self, address: &ActorAddress) -> Result<(), RuntimeError> {
        self.store.delete(&address.meta_key()).await?;
        self.store.delete(&address.state_key()).await?;
        self.store.delete(&address.mailbox_key()).await?;
        self.store.delete(&address.lock_key()).await?;
        tracing::info!("killed actor at {}", address);
        Ok(())
    }

    /// Kill every actor this instance has spawned.
    pub async fn kill_all(&self) -> Result<(), RuntimeError> {
        let children_key = self.pid.children_key();
        while let Some(child) = self.store.pop_head(&children_key).await? {
            self.kill(&ActorAddress::from(child)).await?;
        }
        Ok(())
    }

    /// Operator escape hatch for a lock orphaned by a crashed or
    /// aborted drain pass; see [`LockManager::force_release`].
    pub async fn force_release(&self, address: &ActorAddress) -> Result<(), RuntimeError> {
        self.locks.force_release(address).await
    }
}
