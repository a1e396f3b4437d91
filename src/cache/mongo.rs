// MongoDB-backed record store
//
// One long-lived client per process; the driver pools connections internally.
// Every operation carries its own timeout.

use super::fingerprint::Fingerprint;
use super::store::{RecordStore, RecordUpdate, StoreError, StoreResult, StoredRecord, WriteOutcome};
use crate::config::{StoreConfig, StoreCredentials};
use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use mongodb::options::{ClientOptions, Credential};
use mongodb::{Client, Collection};
use std::future::IntoFuture;
use std::time::Duration;
use tracing::{debug, info};

pub struct MongoRecordStore {
    client: Client,
    database: String,
    collection: Collection<StoredRecord>,
    op_timeout: Duration,
}

impl MongoRecordStore {
    /// Build a client for the configured deployment.
    ///
    /// The driver connects lazily, so this only fails on unusable options;
    /// reachability is checked separately with [`RecordStore::ping`].
    pub async fn connect(config: &StoreConfig, creds: &StoreCredentials) -> StoreResult<Self> {
        let op_timeout = Duration::from_secs(config.connect_timeout_seconds);

        let uri = creds.uri();
        let mut options = ClientOptions::parse(uri.as_str())
            .await
            .map_err(|e| StoreError::Credentials(e.to_string()))?;

        options.app_name = Some(env!("CARGO_PKG_NAME").to_string());
        options.connect_timeout = Some(op_timeout);
        options.server_selection_timeout = Some(op_timeout);

        if creds.has_auth() {
            options.credential = Some(
                Credential::builder()
                    .username(creds.username.clone())
                    .password(creds.password.clone())
                    .build(),
            );
        }

        let client =
            Client::with_options(options).map_err(|e| StoreError::Connect(e.to_string()))?;
        let collection = client
            .database(&config.database)
            .collection::<StoredRecord>(&config.collection);

        info!(
            "Record store configured: {}:{} db={} collection={}",
            creds.hostname, creds.port, config.database, config.collection
        );

        Ok(Self {
            client,
            database: config.database.clone(),
            collection,
            op_timeout,
        })
    }

    fn filter(fp: &Fingerprint) -> Document {
        doc! { "params": fp.as_str() }
    }

    async fn timed<F, T>(&self, op: &'static str, action: F) -> StoreResult<T>
    where
        F: IntoFuture<Output = mongodb::error::Result<T>>,
    {
        match tokio::time::timeout(self.op_timeout, action.into_future()).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(StoreError::Operation(format!("{}: {}", op, e))),
            Err(_) => Err(StoreError::Timeout(self.op_timeout)),
        }
    }
}

#[async_trait]
impl RecordStore for MongoRecordStore {
    fn backend(&self) -> &'static str {
        "mongodb"
    }

    async fn exists(&self, fp: &Fingerprint) -> StoreResult<bool> {
        let count = self
            .timed(
                "count_documents",
                self.collection.count_documents(Self::filter(fp)),
            )
            .await?;
        Ok(count > 0)
    }

    async fn read(&self, fp: &Fingerprint) -> StoreResult<Option<String>> {
        let record = self
            .timed("find_one", self.collection.find_one(Self::filter(fp)))
            .await?;
        Ok(record.map(|r| r.data))
    }

    async fn write(&self, fp: &Fingerprint, payload: &str) -> StoreResult<WriteOutcome> {
        if self.exists(fp).await? {
            debug!("Record {} already stored, skipping insert", fp.short_id());
            return Ok(WriteOutcome::AlreadyPresent);
        }

        let record = StoredRecord {
            params: fp.as_str().to_string(),
            data: payload.to_string(),
        };
        self.timed("insert_one", self.collection.insert_one(record))
            .await?;
        Ok(WriteOutcome::Inserted)
    }

    async fn update(&self, fp: &Fingerprint, update: RecordUpdate) -> StoreResult<bool> {
        let mut set = Document::new();
        if let Some(data) = update.data {
            set.insert("data", data);
        }
        if set.is_empty() {
            return self.exists(fp).await;
        }

        let result = self
            .timed(
                "update_one",
                self.collection
                    .update_one(Self::filter(fp), doc! { "$set": set }),
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete(&self, fp: &Fingerprint) -> StoreResult<bool> {
        let result = self
            .timed("delete_one", self.collection.delete_one(Self::filter(fp)))
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn ping(&self) -> StoreResult<()> {
        let db = self.client.database(&self.database);
        self.timed("ping", db.run_command(doc! { "ping": 1 }))
            .await
            .map(|_| ())
    }
}
