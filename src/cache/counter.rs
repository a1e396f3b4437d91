// Frequency counter - process-wide hit counts per fingerprint

use super::fingerprint::Fingerprint;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Result of counting one cache miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterTick {
    /// Hit count after this increment.
    pub count: u64,
    /// True for exactly one increment: the one that made `count == threshold`.
    pub reached_threshold: bool,
}

/// Thread-safe map from fingerprint to miss count.
///
/// Entries are created on first increment and live for the lifetime of the
/// process. Counts are never persisted, so a restart begins from zero.
#[derive(Debug, Default)]
pub struct FrequencyCounter {
    counts: Mutex<HashMap<Fingerprint, u64>>,
}

impl FrequencyCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the count for `fp`, returning the new value.
    pub fn increment(&self, fp: &Fingerprint) -> u64 {
        let mut counts = self.counts.lock();
        let count = counts.entry(fp.clone()).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    /// Increment and compare against `threshold` under the same lock, so
    /// concurrent callers can never both observe the threshold value.
    pub fn increment_and_check(&self, fp: &Fingerprint, threshold: u64) -> CounterTick {
        let count = self.increment(fp);
        CounterTick {
            count,
            reached_threshold: count == threshold,
        }
    }

    pub fn get(&self, fp: &Fingerprint) -> Option<u64> {
        self.counts.lock().get(fp).copied()
    }

    /// Number of distinct fingerprints seen.
    pub fn len(&self) -> usize {
        self.counts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_increment_creates_entry() {
        let counter = FrequencyCounter::new();
        let fp = Fingerprint::build([("pageNo", "1")]);

        assert_eq!(counter.get(&fp), None);
        assert_eq!(counter.increment(&fp), 1);
        assert_eq!(counter.increment(&fp), 2);
        assert_eq!(counter.get(&fp), Some(2));
        assert_eq!(counter.len(), 1);
    }

    #[test]
    fn test_threshold_observed_once() {
        let counter = FrequencyCounter::new();
        let fp = Fingerprint::build([("pageNo", "1")]);

        let ticks: Vec<CounterTick> = (0..8).map(|_| counter.increment_and_check(&fp, 5)).collect();
        let reached: Vec<u64> = ticks
            .iter()
            .filter(|t| t.reached_threshold)
            .map(|t| t.count)
            .collect();
        assert_eq!(reached, vec![5]);
    }

    #[test]
    fn test_concurrent_increments_not_lost() {
        let counter = Arc::new(FrequencyCounter::new());
        let fp = Fingerprint::build([("pageNo", "1")]);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let counter = Arc::clone(&counter);
                let fp = fp.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        counter.increment(&fp);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counter.get(&fp), Some(1600));
    }

    #[test]
    fn test_concurrent_threshold_single_winner() {
        let counter = Arc::new(FrequencyCounter::new());
        let fp = Fingerprint::build([("pageNo", "1")]);

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let counter = Arc::clone(&counter);
                let fp = fp.clone();
                std::thread::spawn(move || counter.increment_and_check(&fp, 10).reached_threshold)
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
