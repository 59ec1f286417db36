//! Roles: named, immutable dispatch tables.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::pattern::Pattern;

/// Future returned by call handlers: `(result, new_state)`.
pub type CallFuture = Pin<Box<dyn Future<Output = Result<(Value, Value), String>> + Send>>;

/// Future returned by cast handlers: `new_state`.
pub type CastFuture = Pin<Box<dyn Future<Output = Result<Value, String>> + Send>>;

/// Future returned by init handlers: the initial state.
pub type InitFuture = Pin<Box<dyn Future<Output = Result<Value, String>> + Send>>;

type CallHandler = Box<dyn Fn(Value, Value) -> CallFuture + Send + Sync>;
type CastHandler = Box<dyn Fn(Value, Value) -> CastFuture + Send + Sync>;
type InitHandler = Box<dyn Fn(Value) -> InitFuture + Send + Sync>;

/// A named collection of call and cast handlers keyed by payload
/// patterns, shared by every actor spawned under the role.
///
/// The table is immutable once built; registration order is
/// match-priority order and the first accepting pattern wins.
pub struct Role {
    name: String,
    init: InitHandler,
    call_handlers: Vec<(Box<dyn Pattern>, CallHandler)>,
    cast_handlers: Vec<(Box<dyn Pattern>, CastHandler)>,
}

impl Role {
    /// Start building a role. `init` produces the initial state from the
    /// spawn payload.
    pub fn builder<F, Fut>(name: impl Into<String>, init: F) -> RoleBuilder
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, String>> + Send + 'static,
    {
        RoleBuilder {
            name: name.into(),
            init: Box::new(move |payload| Box::pin(init(payload))),
            call_handlers: Vec::new(),
            cast_handlers: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the init handler on a spawn payload.
    pub(crate) fn init(&self, payload: Value) -> InitFuture {
        (self.init)(payload)
    }

    /// First call handler whose pattern accepts `payload`.
    pub(crate) fn match_call(&self, payload: &Value) -> Option<&CallHandler> {
        self.call_handlers
            .iter()
            .find(|(pattern, _)| pattern.accepts(payload))
            .map(|(_, handler)| handler)
    }

    /// First cast handler whose pattern accepts `payload`.
    pub(crate) fn match_cast(&self, payload: &Value) -> Option<&CastHandler> {
        self.cast_handlers
            .iter()
            .find(|(pattern, _)| pattern.accepts(payload))
            .map(|(_, handler)| handler)
    }

    /// Whether any call pattern accepts `payload`. Used by the facade
    /// pre-check before a message is enqueued.
    pub fn accepts_call(&self, payload: &Value) -> bool {
        self.call_handlers
            .iter()
            .any(|(pattern, _)| pattern.accepts(payload))
    }

    /// Whether any cast pattern accepts `payload`.
    pub fn accepts_cast(&self, payload: &Value) -> bool {
        self.cast_handlers
            .iter()
            .any(|(pattern, _)| pattern.accepts(payload))
    }
}

/// Builder for [`Role`]; see [`Role::builder`].
pub struct RoleBuilder {
    name: String,
    init: InitHandler,
    call_handlers: Vec<(Box<dyn Pattern>, CallHandler)>,
    cast_handlers: Vec<(Box<dyn Pattern>, CastHandler)>,
}

impl RoleBuilder {
    /// Register a call handler: `(payload, prev_state) -> (result, new_state)`.
    pub fn add_call_handler<P, F, Fut>(mut self, pattern: P, handler: F) -> Self
    where
        P: Pattern + 'static,
        F: Fn(Value, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(Value, Value), String>> + Send + 'static,
    {
        self.call_handlers.push((
            Box::new(pattern),
            Box::new(move |payload, state| Box::pin(handler(payload, state))),
        ));
        self
    }

    /// Register a cast handler: `(payload, prev_state) -> new_state`.
    pub fn add_cast_handler<P, F, Fut>(mut self, pattern: P, handler: F) -> Self
    where
        P: Pattern + 'static,
        F: Fn(Value, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, String>> + Send + 'static,
    {
        self.cast_handlers.push((
            Box::new(pattern),
            Box::new(move |payload, state| Box::pin(handler(payload, state))),
        ));
        self
    }

    /// Freeze the dispatch table.
    pub fn build(self) -> Role {
        Role {
            name: self.name,
            init: self.init,
            call_handlers: self.call_handlers,
            cast_handlers: self.cast_handlers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{Guard, Literal, Shape, ValueShape};
    use serde_json::json;

    fn role_with_overlapping_patterns() -> Role {
        Role::builder("overlap", |initial: Value| async move { Ok(initial) })
            .add_call_handler(Literal(json!("get")), |_msg: Value, prev: Value| async move {
                Ok((json!("literal"), prev))
            })
            .add_call_handler(
                Shape(ValueShape::String),
                |_msg: Value, prev: Value| async move { Ok((json!("shape"), prev)) },
            )
            .build()
    }

    #[tokio::test]
    async fn first_registered_pattern_wins() {
        let role = role_with_overlapping_patterns();

        // "get" is accepted by both patterns; registration order decides.
        let handler = role.match_call(&json!("get")).expect("match");
        let (result, _) = handler(json!("get"), json!(null)).await.expect("handler");
        assert_eq!(result, json!("literal"));

        let handler = role.match_call(&json!("other")).expect("match");
        let (result, _) = handler(json!("other"), json!(null)).await.expect("handler");
        assert_eq!(result, json!("shape"));
    }

    #[test]
    fn unmatched_payloads_find_no_handler() {
        let role = role_with_overlapping_patterns();
        assert!(role.match_call(&json!(42)).is_none());
        assert!(role.match_cast(&json!("get")).is_none());
        assert!(!role.accepts_call(&json!(42)));
    }

    #[test]
    fn guard_patterns_participate_in_dispatch() {
        let role = Role::builder("guarded", |initial: Value| async move { Ok(initial) })
            .add_cast_handler(
                Guard(|payload: &Value| payload.get("op").is_some()),
                |_msg: Value, prev: Value| async move { Ok(prev) },
            )
            .build();

        assert!(role.accepts_cast(&json!({"op": "add"})));
        assert!(!role.accepts_cast(&json!({"nope": 1})));
    }
}
