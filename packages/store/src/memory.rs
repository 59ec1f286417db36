//! In-process store backend.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use tokio::sync::mpsc;

use crate::{Store, StoreError, Subscription};

/// In-memory implementation of [`Store`].
///
/// Suitable for tests and for running every runtime instance inside one
/// process; instances must share the same `MemoryStore` (wrap it in an
/// `Arc`). Atomicity of `set_if_absent` and `pop_head` falls out of the
/// interior mutexes.
#[derive(Default)]
pub struct MemoryStore {
    kv: Mutex<HashMap<String, String>>,
    lists: Mutex<HashMap<String, VecDeque<String>>>,
    channels: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<String>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let mut kv = self.kv.lock().unwrap();
        if kv.contains_key(key) {
            return Ok(false);
        }
        kv.insert(key.to_string(), value.to_string());
        Ok(true)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.kv.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.kv
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.kv.lock().unwrap().remove(key);
        self.lists.lock().unwrap().remove(key);
        Ok(())
    }

    async fn push_tail(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.lists
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .push_back(value.to_string());
        Ok(())
    }

    async fn pop_head(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .lists
            .lock()
            .unwrap()
            .get_mut(key)
            .and_then(|list| list.pop_front()))
    }

    async fn publish(&self, channel: &str, payload: &str) -> Result<(), StoreError> {
        let mut channels = self.channels.lock().unwrap();
        if let Some(senders) = channels.get_mut(channel) {
            senders.retain(|tx| tx.send(payload.to_string()).is_ok());
            if senders.is_empty() {
                channels.remove(channel);
            }
        }
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<Subscription, StoreError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.channels
            .lock()
            .unwrap()
            .entry(channel.to_string())
            .or_default()
            .push(tx);
        Ok(Subscription::new(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_if_absent_is_first_writer_wins() -> Result<(), StoreError> {
        let store = MemoryStore::new();
        assert!(store.set_if_absent("lock-a", "pid-1").await?);
        assert!(!store.set_if_absent("lock-a", "pid-2").await?);
        assert_eq!(store.get("lock-a").await?, Some("pid-1".to_string()));

        store.delete("lock-a").await?;
        assert_eq!(store.get("lock-a").await?, None);
        assert!(store.set_if_absent("lock-a", "pid-2").await?);
        Ok(())
    }

    #[tokio::test]
    async fn lists_pop_in_push_order() -> Result<(), StoreError> {
        let store = MemoryStore::new();
        store.push_tail("mailbox-a", "m1").await?;
        store.push_tail("mailbox-a", "m2").await?;
        store.push_tail("mailbox-b", "other").await?;

        assert_eq!(store.pop_head("mailbox-a").await?, Some("m1".to_string()));
        assert_eq!(store.pop_head("mailbox-a").await?, Some("m2".to_string()));
        assert_eq!(store.pop_head("mailbox-a").await?, None);
        assert_eq!(store.pop_head("mailbox-b").await?, Some("other".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn delete_removes_lists_too() -> Result<(), StoreError> {
        let store = MemoryStore::new();
        store.push_tail("mailbox-a", "m1").await?;
        store.delete("mailbox-a").await?;
        assert_eq!(store.pop_head("mailbox-a").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn publish_reaches_only_matching_subscribers() -> Result<(), StoreError> {
        let store = MemoryStore::new();
        let mut sub_a = store.subscribe("chan-a").await?;
        let mut sub_b = store.subscribe("chan-b").await?;

        store.publish("chan-a", "hello").await?;
        assert_eq!(sub_a.next_message().await, Some("hello".to_string()));

        store.publish("chan-b", "world").await?;
        assert_eq!(sub_b.next_message().await, Some("world".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_a_noop() -> Result<(), StoreError> {
        let store = MemoryStore::new();
        store.publish("chan-a", "nobody home").await?;

        // A later subscriber does not see earlier publishes.
        let mut sub = store.subscribe("chan-a").await?;
        store.publish("chan-a", "fresh").await?;
        assert_eq!(sub.next_message().await, Some("fresh".to_string()));
        Ok(())
    }
}
