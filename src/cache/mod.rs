// Promotion cache module: fingerprints, hit counting and the record store

pub mod counter;
pub mod fingerprint;
pub mod models;
pub mod mongo;
pub mod promotion;
pub mod store;

pub use counter::{CounterTick, FrequencyCounter};
pub use fingerprint::Fingerprint;
pub use models::{CacheStats, Promotion, Resolution, ResolutionSource, StoreLookup};
pub use mongo::MongoRecordStore;
pub use promotion::PromotionCache;
pub use store::{
    MemoryStore, RecordStore, RecordUpdate, StoreError, StoreResult, StoredRecord,
    UnavailableStore, WriteOutcome,
};

use crate::config::{StoreConfig, StoreCredentials};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Build the record store described by `config`.
///
/// Never fails: unusable credentials or options yield an [`UnavailableStore`]
/// and the gateway keeps serving from upstream.
pub async fn open_store(config: &StoreConfig) -> Arc<dyn RecordStore> {
    if !config.enabled {
        info!("Record store disabled, promoted records are kept in memory");
        return Arc::new(MemoryStore::new());
    }

    let creds = match StoreCredentials::load(&config.credentials_path) {
        Ok(creds) => creds,
        Err(e) => {
            error!("Record store not configured: {}", e);
            return Arc::new(UnavailableStore::new(e.to_string()));
        }
    };

    match MongoRecordStore::connect(config, &creds).await {
        Ok(store) => {
            if let Err(e) = store.ping().await {
                warn!("Record store not reachable yet: {}", e);
            }
            Arc::new(store)
        }
        Err(e) => {
            error!("Record store client could not be built: {}", e);
            Arc::new(UnavailableStore::new(e.to_string()))
        }
    }
}
