//! Per-label accumulator registry
//!
//! Maps a sample label to its [`StatAccumulator`], creating accumulators
//! lazily on first sight. Insertion order is preserved so summary documents
//! list labels in the order they first appeared in the input, which keeps
//! output deterministic for a given stream. One registry exists per window.

use crate::stats::{StatAccumulator, SummaryStats};
use anyhow::Result;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Ordered label → accumulator mapping, safe for concurrent resolution.
pub struct AccumulatorRegistry {
    precision: u8,
    inner: Mutex<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    /// Labels in first-seen order.
    order: Vec<String>,
    accumulators: HashMap<String, Arc<StatAccumulator>>,
}

impl AccumulatorRegistry {
    /// Create a registry whose accumulators use the given histogram
    /// precision. The precision is validated up front so later `resolve`
    /// calls cannot fail on configuration.
    pub fn new(precision: u8) -> Result<Self> {
        // Probe construction surfaces an out-of-range precision immediately.
        StatAccumulator::new(precision)?;
        Ok(Self {
            precision,
            inner: Mutex::new(RegistryInner::default()),
        })
    }

    /// Return the accumulator for `label`, creating it atomically on first
    /// use and recording the first-seen position.
    pub fn resolve(&self, label: &str) -> Result<Arc<StatAccumulator>> {
        let mut inner = self.inner.lock();
        if let Some(accumulator) = inner.accumulators.get(label) {
            return Ok(Arc::clone(accumulator));
        }
        let accumulator = Arc::new(StatAccumulator::new(self.precision)?);
        inner.order.push(label.to_string());
        inner
            .accumulators
            .insert(label.to_string(), Arc::clone(&accumulator));
        Ok(accumulator)
    }

    /// Number of distinct labels seen so far.
    pub fn len(&self) -> usize {
        self.inner.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().order.is_empty()
    }

    /// Summarize every accumulator in first-seen label order.
    pub fn snapshot_all(&self) -> Result<Vec<(String, SummaryStats)>> {
        let (order, accumulators) = {
            let inner = self.inner.lock();
            (inner.order.clone(), inner.accumulators.clone())
        };
        let mut summaries = Vec::with_capacity(order.len());
        for label in order {
            // Order and map are mutated together under the same lock, so
            // every ordered label has an accumulator.
            if let Some(accumulator) = accumulators.get(&label) {
                let stats = accumulator.summarize()?;
                summaries.push((label, stats));
            }
        }
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn resolve_creates_lazily_and_reuses() {
        let registry = AccumulatorRegistry::new(2).unwrap();
        assert!(registry.is_empty());

        let a = registry.resolve("HTTP Request").unwrap();
        let b = registry.resolve("HTTP Request").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn snapshot_preserves_first_seen_order() {
        let registry = AccumulatorRegistry::new(2).unwrap();
        for label in ["checkout", "login", "browse", "login"] {
            let accumulator = registry.resolve(label).unwrap();
            accumulator.add_sample(1_000, 10, true, 100, 100);
        }

        let summaries = registry.snapshot_all().unwrap();
        let labels: Vec<&str> = summaries.iter().map(|(label, _)| label.as_str()).collect();
        assert_eq!(labels, vec!["checkout", "login", "browse"]);
        assert_eq!(summaries[1].1.samples, 2);
    }

    #[test]
    fn rejects_invalid_precision_up_front() {
        assert!(AccumulatorRegistry::new(0).is_err());
        assert!(AccumulatorRegistry::new(9).is_err());
    }

    #[test]
    fn concurrent_resolution_creates_one_accumulator_per_label() {
        let registry = Arc::new(AccumulatorRegistry::new(2).unwrap());
        let mut handles = Vec::new();
        for t in 0..8 {
            let registry = Arc::clone(&registry);
            handles.push(thread::spawn(move || {
                for i in 0..1_000 {
                    let label = format!("label-{}", i % 4);
                    let accumulator = registry.resolve(&label).unwrap();
                    accumulator.add_sample(1_000 + i as i64, t + 1, true, 10, 10);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.len(), 4);
        let summaries = registry.snapshot_all().unwrap();
        let total: u64 = summaries.iter().map(|(_, stats)| stats.samples).sum();
        assert_eq!(total, 8_000);
    }
}
