use std::time::Duration;

use store::{Store, StoreError, SurrealConfig, SurrealStore};

#[tokio::test]
async fn kv_primitives_round_trip() -> Result<(), StoreError> {
    let store = SurrealStore::connect(SurrealConfig::memory()).await?;

    assert!(store.set_if_absent("lock-a", "pid-1").await?);
    assert!(!store.set_if_absent("lock-a", "pid-2").await?);
    assert_eq!(store.get("lock-a").await?, Some("pid-1".to_string()));

    store.set("state-a", "{\"n\":1}").await?;
    store.set("state-a", "{\"n\":2}").await?;
    assert_eq!(store.get("state-a").await?, Some("{\"n\":2}".to_string()));

    store.delete("lock-a").await?;
    assert_eq!(store.get("lock-a").await?, None);

    // Deleting an absent key is a no-op.
    store.delete("lock-a").await?;
    assert!(store.set_if_absent("lock-a", "pid-3").await?);
    Ok(())
}

#[tokio::test]
async fn lists_pop_in_push_order() -> Result<(), StoreError> {
    let store = SurrealStore::connect(SurrealConfig::memory()).await?;

    store.push_tail("mailbox-a", "m1").await?;
    store.push_tail("mailbox-a", "m2").await?;
    store.push_tail("mailbox-a", "m3").await?;
    store.push_tail("mailbox-b", "other").await?;

    assert_eq!(store.pop_head("mailbox-a").await?, Some("m1".to_string()));
    assert_eq!(store.pop_head("mailbox-a").await?, Some("m2".to_string()));
    assert_eq!(store.pop_head("mailbox-a").await?, Some("m3".to_string()));
    assert_eq!(store.pop_head("mailbox-a").await?, None);
    assert_eq!(store.pop_head("mailbox-b").await?, Some("other".to_string()));
    Ok(())
}

#[tokio::test]
async fn delete_removes_pending_list_entries() -> Result<(), StoreError> {
    let store = SurrealStore::connect(SurrealConfig::memory()).await?;

    store.push_tail("mailbox-a", "m1").await?;
    store.push_tail("mailbox-a", "m2").await?;
    store.delete("mailbox-a").await?;
    assert_eq!(store.pop_head("mailbox-a").await?, None);
    Ok(())
}

#[tokio::test]
async fn publish_reaches_only_matching_subscribers() -> Result<(), StoreError> {
    let store = SurrealStore::connect(SurrealConfig::memory()).await?;

    let mut sub_a = store.subscribe("chan-a").await?;
    let mut sub_b = store.subscribe("chan-b").await?;

    store.publish("chan-a", "hello").await?;

    let got = tokio::time::timeout(Duration::from_secs(5), sub_a.next_message())
        .await
        .expect("delivery should be timely")
        .expect("subscription should be live");
    assert_eq!(got, "hello");

    // The other channel's subscriber sees nothing.
    let nothing = tokio::time::timeout(Duration::from_millis(200), sub_b.next_message()).await;
    assert!(nothing.is_err());
    Ok(())
}
