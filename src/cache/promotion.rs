// Promotion cache - read-through store lookup with threshold-gated write-through

use super::counter::FrequencyCounter;
use super::fingerprint::Fingerprint;
use super::models::{CacheStats, Promotion, Resolution, ResolutionSource, StoreLookup};
use super::store::{RecordStore, WriteOutcome};
use crate::error::Result;
use crate::metrics;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Promotion cache for one route.
///
/// Requests whose fingerprint already has a stored record are answered from
/// the store. Everything else goes upstream and is counted; the request that
/// brings a fingerprint's count to exactly `threshold` persists its payload.
///
/// Routes share one [`FrequencyCounter`] and one [`RecordStore`]; cloning is
/// cheap and clones share statistics.
#[derive(Clone)]
pub struct PromotionCache {
    route: Arc<str>,
    threshold: u64,
    store: Arc<dyn RecordStore>,
    counter: Arc<FrequencyCounter>,
    stats: Arc<Mutex<CacheStats>>,
}

impl PromotionCache {
    pub fn new(
        route: &str,
        threshold: u64,
        store: Arc<dyn RecordStore>,
        counter: Arc<FrequencyCounter>,
    ) -> Self {
        Self {
            route: Arc::from(route),
            threshold,
            store,
            counter,
            stats: Arc::new(Mutex::new(CacheStats::default())),
        }
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn counter(&self) -> &FrequencyCounter {
        &self.counter
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.lock().clone()
    }

    /// Read-through step. Store failures come back as [`StoreLookup::Unavailable`].
    pub async fn lookup(&self, fp: &Fingerprint) -> StoreLookup {
        match self.store.read(fp).await {
            Ok(Some(payload)) => StoreLookup::Hit(payload),
            Ok(None) => StoreLookup::Miss,
            Err(e) => StoreLookup::Unavailable(e),
        }
    }

    /// Resolve a request, calling `fetch` only when the store has no record.
    ///
    /// Store faults never fail the request; `fetch` errors are returned
    /// unchanged and leave the count untouched.
    pub async fn resolve<F, Fut>(&self, fp: &Fingerprint, fetch: F) -> Result<Resolution>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let key = fp.short_id();

        let store_degraded = match self.lookup(fp).await {
            StoreLookup::Hit(payload) => {
                debug!("[{}] store hit for {}", self.route, key);
                self.stats.lock().hits += 1;
                metrics::record_promotion_op(&self.route, "hit");
                return Ok(Resolution {
                    payload,
                    source: ResolutionSource::Stored,
                    store_degraded: false,
                });
            }
            StoreLookup::Miss => false,
            StoreLookup::Unavailable(e) => {
                warn!(
                    "[{}] {} store read failed, serving from upstream: {}",
                    self.route,
                    self.store.backend(),
                    e
                );
                self.stats.lock().store_errors += 1;
                metrics::record_promotion_op(&self.route, "store_error");
                true
            }
        };

        let payload = fetch().await?;

        let tick = self.counter.increment_and_check(fp, self.threshold);
        self.stats.lock().misses += 1;
        metrics::record_promotion_op(&self.route, "miss");
        metrics::update_counter_entries(self.counter.len());
        debug!("[{}] miss for {} (count {})", self.route, key, tick.count);

        let promotion = if tick.reached_threshold {
            self.promote(fp, &payload, &key).await
        } else {
            Promotion::NotDue
        };

        Ok(Resolution {
            payload,
            source: ResolutionSource::Upstream {
                count: tick.count,
                promotion,
            },
            store_degraded,
        })
    }

    async fn promote(&self, fp: &Fingerprint, payload: &str, key: &str) -> Promotion {
        match self.store.write(fp, payload).await {
            Ok(WriteOutcome::Inserted) => {
                info!(
                    "[{}] promoted {} after {} hits",
                    self.route, key, self.threshold
                );
                self.stats.lock().promotions += 1;
                metrics::record_promotion_op(&self.route, "promote");
                Promotion::Written
            }
            Ok(WriteOutcome::AlreadyPresent) => {
                debug!("[{}] {} already stored", self.route, key);
                Promotion::AlreadyStored
            }
            Err(e) => {
                warn!(
                    "[{}] {} store write failed, promotion skipped: {}",
                    self.route,
                    self.store.backend(),
                    e
                );
                self.stats.lock().store_errors += 1;
                metrics::record_promotion_op(&self.route, "store_error");
                Promotion::Skipped(e)
            }
        }
    }
}
