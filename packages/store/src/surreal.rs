//! SurrealDB store backend.

use std::sync::Mutex;

use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use surrealdb::engine::any::{Any, connect};
use surrealdb::opt::auth::Root;
use surrealdb::{Action, Surreal};
use tokio::sync::{mpsc, oneshot};
use ulid::Generator;

use crate::{Store, StoreError, Subscription};

/// Connection configuration for [`SurrealStore`].
#[derive(Debug, Clone)]
pub struct SurrealConfig {
    /// Connection mode: "mem://", "rocksdb://path", or a remote endpoint.
    pub endpoint: String,
    /// Namespace to use.
    pub namespace: String,
    /// Database name to use.
    pub database: String,
    /// Optional root credentials for authentication.
    pub credentials: Option<(String, String)>,
}

impl Default for SurrealConfig {
    fn default() -> Self {
        Self {
            endpoint: "mem://".to_string(),
            namespace: "ensemble".to_string(),
            database: "main".to_string(),
            credentials: None,
        }
    }
}

impl SurrealConfig {
    /// Create a config for in-memory testing.
    pub fn memory() -> Self {
        Self::default()
    }

    /// Create a config for the given endpoint.
    pub fn endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Set the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the database name.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Set root credentials for authentication.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }
}

/// Internal record type for plain keys.
#[derive(Debug, Serialize, Deserialize)]
struct KvRecord {
    data: String,
}

/// Internal record type for list entries, ordered by `seq`.
#[derive(Debug, Serialize, Deserialize)]
struct ListEntry {
    list: String,
    seq: String,
    data: String,
}

/// Internal record type for published channel messages.
#[derive(Debug, Serialize, Deserialize)]
struct ChannelMessage {
    channel: String,
    payload: String,
}

/// Schema definitions, applied idempotently at connect.
const SCHEMA: &str = r#"
DEFINE TABLE IF NOT EXISTS kv SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS data ON kv TYPE string;

DEFINE TABLE IF NOT EXISTS list_entry SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS list ON list_entry TYPE string;
DEFINE FIELD IF NOT EXISTS seq ON list_entry TYPE string;
DEFINE FIELD IF NOT EXISTS data ON list_entry TYPE string;
DEFINE INDEX IF NOT EXISTS list_entry_list ON list_entry FIELDS list;
DEFINE INDEX IF NOT EXISTS list_entry_order ON list_entry FIELDS list, seq;

DEFINE TABLE IF NOT EXISTS channel_message SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS channel ON channel_message TYPE string;
DEFINE FIELD IF NOT EXISTS payload ON channel_message TYPE string;
DEFINE INDEX IF NOT EXISTS channel_message_channel ON channel_message FIELDS channel;
"#;

/// SurrealDB-backed implementation of [`Store`].
///
/// Every runtime instance connects to the same endpoint. Set-if-absent
/// maps onto create-fails-on-duplicate; the atomic list pop is a single
/// transaction, so only one popper can win a given entry. List entries
/// are ordered by ULIDs from a monotonic generator, which keeps pushes
/// from one instance strictly ordered and pushes from different
/// instances in timestamp order.
pub struct SurrealStore {
    db: Surreal<Any>,
    seq: Mutex<Generator>,
}

impl SurrealStore {
    /// Connect to the configured endpoint and apply schema definitions.
    pub async fn connect(config: SurrealConfig) -> Result<Self, StoreError> {
        tracing::info!("Connecting to store: {}", config.endpoint);

        let db = connect(&config.endpoint).await?;

        if let Some((username, password)) = &config.credentials {
            db.signin(Root { username, password }).await?;
        }

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;
        db.query(SCHEMA).await?;

        tracing::info!(
            "Connected to store: {}/{}",
            config.namespace,
            config.database
        );

        Ok(Self {
            db,
            seq: Mutex::new(Generator::new()),
        })
    }

    fn next_seq(&self) -> Result<String, StoreError> {
        let mut generator = self.seq.lock().unwrap();
        generator
            .generate()
            .map(|ulid| ulid.to_string())
            .map_err(|_| StoreError::Query("list sequence overflow".to_string()))
    }
}

impl Store for SurrealStore {
    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let created: Result<Option<KvRecord>, surrealdb::Error> = self
            .db
            .create(("kv", key))
            .content(KvRecord {
                data: value.to_string(),
            })
            .await;

        match created {
            Ok(_) => Ok(true),
            Err(err) if err.to_string().contains("already exists") => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let record: Option<KvRecord> = self.db.select(("kv", key)).await?;
        Ok(record.map(|record| record.data))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _: Option<KvRecord> = self
            .db
            .upsert(("kv", key))
            .content(KvRecord {
                data: value.to_string(),
            })
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let _: Option<KvRecord> = self.db.delete(("kv", key)).await?;
        self.db
            .query("DELETE list_entry WHERE list = $list")
            .bind(("list", key.to_string()))
            .await?;
        Ok(())
    }

    async fn push_tail(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let seq = self.next_seq()?;
        let _: Option<ListEntry> = self
            .db
            .create(("list_entry", seq.clone()))
            .content(ListEntry {
                list: key.to_string(),
                seq,
                data: value.to_string(),
            })
            .await?;
        Ok(())
    }

    async fn pop_head(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut response = self
            .db
            .query(
                "BEGIN TRANSACTION;
                 LET $entry = (SELECT * FROM list_entry WHERE list = $list ORDER BY seq ASC LIMIT 1);
                 DELETE $entry.id;
                 RETURN $entry[0];
                 COMMIT TRANSACTION;",
            )
            .bind(("list", key.to_string()))
            .await?;

        let popped: Option<ListEntry> = response.take(0)?;
        Ok(popped.map(|entry| entry.data))
    }

    async fn publish(&self, channel: &str, payload: &str) -> Result<(), StoreError> {
        let _: Option<ChannelMessage> = self
            .db
            .create("channel_message")
            .content(ChannelMessage {
                channel: channel.to_string(),
                payload: payload.to_string(),
            })
            .await?;
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<Subscription, StoreError> {
        let db = self.db.clone();
        let channel = channel.to_string();
        let (tx, rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();

        let forwarder = tokio::spawn(async move {
            // The live query must be registered before subscribe()
            // returns, so readiness is signalled back explicitly.
            let stream = db
                .select::<Vec<ChannelMessage>>("channel_message")
                .live()
                .await;
            let mut stream = match stream {
                Ok(stream) => {
                    let _ = ready_tx.send(Ok(()));
                    stream
                }
                Err(err) => {
                    let _ = ready_tx.send(Err(StoreError::from(err)));
                    return;
                }
            };

            while let Some(item) = stream.next().await {
                let notification = match item {
                    Ok(notification) => notification,
                    Err(err) => {
                        tracing::warn!("live channel feed lapsed: {}", err);
                        break;
                    }
                };

                if !matches!(notification.action, Action::Create) {
                    continue;
                }

                let message = notification.data;
                if message.channel == channel && tx.send(message.payload).is_err() {
                    break;
                }
            }
        });

        match ready_rx.await {
            Ok(Ok(())) => Ok(Subscription::with_forwarder(rx, forwarder)),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(StoreError::Connection(
                "subscription task exited before the live query started".to_string(),
            )),
        }
    }
}
