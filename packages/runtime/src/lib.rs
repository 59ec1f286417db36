//! Distributed actor runtime over a shared key-value store.
//!
//! Actors are addressable units of sequential computation with private
//! persisted state. Messages go through a durable per-address mailbox
//! and are processed under a per-address advisory lock, so at most one
//! runtime instance advances a given actor's state at a time. Call and
//! cast RPC are built entirely from store primitives plus pub/sub; no
//! instance ever connects to another directly.
//!
//! # Usage
//!
//! ```ignore
//! use runtime::{CallOptions, Literal, Role, Runtime, Shape, ValueShape};
//! use serde_json::{Value, json};
//!
//! let counter = Role::builder("counter", |initial: Value| async move { Ok(initial) })
//!     .add_cast_handler(Shape(ValueShape::Number), |n: Value, prev: Value| async move {
//!         Ok(json!(prev.as_i64().unwrap_or(0) + n.as_i64().unwrap_or(0)))
//!     })
//!     .add_call_handler(Literal(json!("get")), |_msg: Value, prev: Value| async move {
//!         Ok((prev.clone(), prev))
//!     })
//!     .build();
//!
//! let rt = Runtime::new(store, [counter]);
//! let addr = rt.spawn("counter", json!(3)).await?;
//! rt.cast(&addr, json!(5)).await?;
//! let n = rt.call(&addr, json!("get"), CallOptions::new()).await?;
//! assert_eq!(n, json!(8));
//! ```

mod drain;
mod error;
mod lock;
mod mailbox;
mod pattern;
mod role;
mod runtime;
mod state;

pub use error::RuntimeError;
pub use lock::{LockManager, LockToken};
pub use mailbox::Mailbox;
pub use pattern::{Guard, Literal, Pattern, Shape, ValueShape};
pub use role::{CallFuture, CastFuture, InitFuture, Role, RoleBuilder};
pub use runtime::{CallOptions, DEFAULT_CALL_TIMEOUT, Runtime};
pub use state::StateStore;

/// Re-export the cancellation token type accepted by [`CallOptions`].
pub use tokio_util::sync::CancellationToken;
