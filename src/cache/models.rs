//! Outcome and statistics types for the promotion cache.

use super::store::StoreError;

/// Result of the read-through step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLookup {
    /// A promoted record exists; its payload is served as-is.
    Hit(String),
    /// No record for this fingerprint.
    Miss,
    /// The store could not answer. Treated like a miss.
    Unavailable(StoreError),
}

/// What happened to the promotion step after a fresh fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Promotion {
    /// Count has not hit the threshold (or has passed it).
    NotDue,
    /// The payload was written to the store.
    Written,
    /// The write-once guard found an existing record.
    AlreadyStored,
    /// The write failed; the response is still served.
    Skipped(StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionSource {
    /// Served from the record store.
    Stored,
    /// Fetched from upstream; `count` is the hit count after this request.
    Upstream { count: u64, promotion: Promotion },
}

/// A resolved request: the payload plus how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub payload: String,
    pub source: ResolutionSource,
    /// True when the store lookup failed and the request fell through.
    pub store_degraded: bool,
}

impl Resolution {
    /// `hit`, `promoted` or `miss`; exposed as the `x-oag-cache` header.
    pub fn cache_status(&self) -> &'static str {
        match &self.source {
            ResolutionSource::Stored => "hit",
            ResolutionSource::Upstream {
                promotion: Promotion::Written,
                ..
            } => "promoted",
            ResolutionSource::Upstream { .. } => "miss",
        }
    }

    /// Hit count for upstream-served responses.
    pub fn hit_count(&self) -> Option<u64> {
        match &self.source {
            ResolutionSource::Stored => None,
            ResolutionSource::Upstream { count, .. } => Some(*count),
        }
    }
}

/// Per-route counters, reported by the health endpoint.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Requests answered from the store.
    pub hits: u64,
    /// Requests that went upstream.
    pub misses: u64,
    /// Records written.
    pub promotions: u64,
    /// Store reads or writes that failed.
    pub store_errors: u64,
}
