// Promotion cache behaviour through the public API

use async_trait::async_trait;
use oag::cache::{
    Fingerprint, FrequencyCounter, MemoryStore, Promotion, PromotionCache, RecordStore,
    RecordUpdate, ResolutionSource, StoreError, StoreResult, UnavailableStore, WriteOutcome,
};
use oag::error::GatewayError;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Wraps a store and counts calls; can be switched into a failing mode.
#[derive(Default)]
struct CountingStore {
    inner: MemoryStore,
    reads: AtomicUsize,
    writes: AtomicUsize,
    fail_reads: AtomicBool,
}

impl CountingStore {
    fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for CountingStore {
    fn backend(&self) -> &'static str {
        "counting"
    }

    async fn exists(&self, fp: &Fingerprint) -> StoreResult<bool> {
        self.inner.exists(fp).await
    }

    async fn read(&self, fp: &Fingerprint) -> StoreResult<Option<String>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Connect("connection refused".to_string()));
        }
        self.inner.read(fp).await
    }

    async fn write(&self, fp: &Fingerprint, payload: &str) -> StoreResult<WriteOutcome> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.write(fp, payload).await
    }

    async fn update(&self, fp: &Fingerprint, update: RecordUpdate) -> StoreResult<bool> {
        self.inner.update(fp, update).await
    }

    async fn delete(&self, fp: &Fingerprint) -> StoreResult<bool> {
        self.inner.delete(fp).await
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

fn scenario_fingerprint() -> Fingerprint {
    Fingerprint::build([("pageNo", "1"), ("numOfRows", "10")])
}

fn cache_with(store: Arc<CountingStore>, threshold: u64) -> PromotionCache {
    PromotionCache::new("forest_point", threshold, store, Arc::new(FrequencyCounter::new()))
}

/// Simulated upstream: the n-th fetch returns a distinct transformed payload.
struct Upstream {
    calls: AtomicUsize,
}

impl Upstream {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    async fn fetch(&self) -> oag::error::Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("{{\n\t\"fetch\": {}\n}}", n))
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[tokio::test]
async fn test_threshold_five_scenario() {
    let store = Arc::new(CountingStore::default());
    let cache = cache_with(store.clone(), 5);
    let upstream = Upstream::new();
    let fp = scenario_fingerprint();

    for i in 1..=4u64 {
        let resolution = cache.resolve(&fp, || upstream.fetch()).await.unwrap();
        assert_eq!(resolution.hit_count(), Some(i));
        assert_eq!(resolution.cache_status(), "miss");
        assert!(!store.exists(&fp).await.unwrap(), "no record before request 5");
    }
    assert_eq!(store.writes(), 0);

    let fifth = cache.resolve(&fp, || upstream.fetch()).await.unwrap();
    assert_eq!(fifth.cache_status(), "promoted");
    assert_eq!(store.writes(), 1);
    assert!(store.exists(&fp).await.unwrap());
    assert_eq!(
        store.read(&fp).await.unwrap().as_deref(),
        Some(fifth.payload.as_str()),
        "stored payload is the 5th fetch's transformed response"
    );

    let sixth = cache.resolve(&fp, || upstream.fetch()).await.unwrap();
    assert_eq!(sixth.source, ResolutionSource::Stored);
    assert_eq!(sixth.payload.as_bytes(), fifth.payload.as_bytes());

    assert_eq!(upstream.calls(), 5, "request 6 must not reach upstream");
    assert_eq!(store.writes(), 1);
    assert_eq!(cache.counter().get(&fp), Some(5), "store hits leave the counter alone");
}

#[tokio::test]
async fn test_read_through_short_circuits_upstream() {
    let store = Arc::new(CountingStore::default());
    let fp = scenario_fingerprint();
    store.write(&fp, "persisted").await.unwrap();

    let cache = cache_with(store.clone(), 5);
    let upstream = Upstream::new();

    for _ in 0..10 {
        let resolution = cache.resolve(&fp, || upstream.fetch()).await.unwrap();
        assert_eq!(resolution.payload, "persisted");
    }

    assert_eq!(upstream.calls(), 0);
    assert_eq!(cache.counter().get(&fp), None);
    assert_eq!(cache.stats().hits, 10);
}

#[tokio::test]
async fn test_write_once_through_public_store() {
    let store = MemoryStore::new();
    let fp = scenario_fingerprint();

    assert_eq!(store.write(&fp, "payloadA").await.unwrap(), WriteOutcome::Inserted);
    assert!(store.exists(&fp).await.unwrap());
    assert_eq!(
        store.write(&fp, "payloadB").await.unwrap(),
        WriteOutcome::AlreadyPresent
    );
    assert_eq!(store.read(&fp).await.unwrap().as_deref(), Some("payloadA"));
}

#[tokio::test]
async fn test_store_read_failure_falls_through() {
    let store = Arc::new(CountingStore::default());
    store.fail_reads.store(true, Ordering::SeqCst);
    let cache = cache_with(store.clone(), 5);
    let upstream = Upstream::new();
    let fp = scenario_fingerprint();

    let resolution = cache.resolve(&fp, || upstream.fetch()).await.unwrap();

    assert!(resolution.store_degraded);
    assert_eq!(resolution.hit_count(), Some(1));
    assert_eq!(upstream.calls(), 1);
    assert_eq!(store.reads(), 1);
}

#[tokio::test]
async fn test_unavailable_store_never_blocks_requests() {
    let cache = PromotionCache::new(
        "pages",
        2,
        Arc::new(UnavailableStore::new("credentials missing")),
        Arc::new(FrequencyCounter::new()),
    );
    let upstream = Upstream::new();
    let fp = scenario_fingerprint();

    for _ in 0..4 {
        let resolution = cache.resolve(&fp, || upstream.fetch()).await.unwrap();
        assert!(resolution.store_degraded);
    }

    // every request reached upstream; the threshold write was attempted and skipped
    assert_eq!(upstream.calls(), 4);
    assert_eq!(cache.stats().promotions, 0);
    assert_eq!(cache.counter().get(&fp), Some(4));
}

#[tokio::test]
async fn test_upstream_failure_propagates() {
    let store = Arc::new(CountingStore::default());
    let cache = cache_with(store.clone(), 1);
    let fp = scenario_fingerprint();

    let err = cache
        .resolve(&fp, || async {
            Err(GatewayError::Parse("forest point XML: unexpected EOF".to_string()))
        })
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Parse(_)));
    assert_eq!(store.writes(), 0);
    assert_eq!(cache.counter().get(&fp), None);
}

#[tokio::test]
async fn test_routes_keep_their_own_threshold() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let counter = Arc::new(FrequencyCounter::new());
    let low = PromotionCache::new("low", 1, Arc::clone(&store), Arc::clone(&counter));
    let high = PromotionCache::new("high", 30, Arc::clone(&store), Arc::clone(&counter));

    let a = Fingerprint::build([("route", "low")]);
    let b = Fingerprint::build([("route", "high")]);

    let first_low = low.resolve(&a, || async { Ok("a".to_string()) }).await.unwrap();
    let first_high = high.resolve(&b, || async { Ok("b".to_string()) }).await.unwrap();

    assert_eq!(first_low.cache_status(), "promoted");
    assert_eq!(first_high.cache_status(), "miss");
    assert_eq!(counter.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_promote_once() {
    let store = Arc::new(CountingStore::default());
    let cache = cache_with(store.clone(), 5);
    let fp = scenario_fingerprint();

    let mut handles = Vec::new();
    for i in 0..32 {
        let cache = cache.clone();
        let fp = fp.clone();
        handles.push(tokio::spawn(async move {
            cache
                .resolve(&fp, || async move { Ok(format!("payload {}", i)) })
                .await
                .unwrap()
        }));
    }

    let results = futures::future::join_all(handles).await;
    let promoted = results
        .into_iter()
        .map(|r| r.unwrap())
        .filter(|r| {
            matches!(
                r.source,
                ResolutionSource::Upstream {
                    promotion: Promotion::Written,
                    ..
                }
            )
        })
        .count();

    assert_eq!(promoted, 1);
    assert_eq!(store.writes(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_increments_counted_exactly() {
    let counter = Arc::new(FrequencyCounter::new());
    let fp = scenario_fingerprint();

    let handles: Vec<_> = (0..64)
        .map(|_| {
            let counter = Arc::clone(&counter);
            let fp = fp.clone();
            tokio::spawn(async move { counter.increment(&fp) })
        })
        .collect();

    let mut seen: Vec<u64> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    seen.sort_unstable();

    assert_eq!(counter.get(&fp), Some(64));
    assert_eq!(seen, (1..=64).collect::<Vec<u64>>());
}
