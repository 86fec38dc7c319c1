//! Per-type crossing totals with consistent snapshot reads.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::counting::crossing::CrossingEvent;
use crate::tracker::ObjectType;

type Totals = BTreeMap<ObjectType, u64>;

/// Immutable copy of the totals at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountSnapshot {
    totals: Totals,
}

impl CountSnapshot {
    /// Count for one type; zero if the type was never counted.
    pub fn get(&self, object_type: &str) -> u64 {
        self.totals.get(object_type).copied().unwrap_or(0)
    }

    /// Sum over all types.
    pub fn total(&self) -> u64 {
        self.totals.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, ObjectType, u64> {
        self.totals.iter()
    }

    pub fn into_inner(self) -> BTreeMap<ObjectType, u64> {
        self.totals
    }
}

impl<'a> IntoIterator for &'a CountSnapshot {
    type Item = (&'a ObjectType, &'a u64);
    type IntoIter = btree_map::Iter<'a, ObjectType, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.totals.iter()
    }
}

/// Sole writer of the count totals.
///
/// Totals only grow while the counter runs. Readers on other threads go
/// through a [`CountsHandle`].
#[derive(Debug, Default)]
pub struct CountAggregator {
    totals: Arc<RwLock<Totals>>,
}

impl CountAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one crossing. Returns the new total for its type.
    pub fn record(&mut self, event: &CrossingEvent) -> u64 {
        let mut totals = self.totals.write();
        let count = totals.entry(event.object_type.clone()).or_insert(0);
        *count += 1;
        *count
    }

    /// Count a frame's crossings under a single write lock, so readers see
    /// either none or all of them.
    pub fn record_all(&mut self, events: &[CrossingEvent]) {
        if events.is_empty() {
            return;
        }
        let mut totals = self.totals.write();
        for event in events {
            *totals.entry(event.object_type.clone()).or_insert(0) += 1;
        }
    }

    pub fn snapshot(&self) -> CountSnapshot {
        CountSnapshot {
            totals: self.totals.read().clone(),
        }
    }

    /// A cloneable read handle for external collaborators.
    pub fn handle(&self) -> CountsHandle {
        CountsHandle {
            totals: Arc::clone(&self.totals),
        }
    }
}

/// Shared read access to the totals, e.g. for a periodic exporter thread.
#[derive(Debug, Clone)]
pub struct CountsHandle {
    totals: Arc<RwLock<Totals>>,
}

impl CountsHandle {
    /// Consistent copy of all per-type totals.
    pub fn snapshot(&self) -> CountSnapshot {
        CountSnapshot {
            totals: self.totals.read().clone(),
        }
    }

    pub fn get(&self, object_type: &str) -> u64 {
        self.totals.read().get(object_type).copied().unwrap_or(0)
    }

    /// Clear all totals between counting sessions.
    pub fn reset(&self) {
        self.totals.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counting::boundary::CrossingDirection;
    use std::thread;

    fn event(track_id: u64, object_type: &str) -> CrossingEvent {
        CrossingEvent {
            track_id,
            object_type: ObjectType::from(object_type),
            frame_id: 1,
            boundary: "line".to_string(),
            direction: CrossingDirection::Forward,
        }
    }

    #[test]
    fn test_record_and_snapshot() {
        let mut aggregator = CountAggregator::new();
        assert!(aggregator.snapshot().is_empty());

        assert_eq!(aggregator.record(&event(1, "car")), 1);
        assert_eq!(aggregator.record(&event(2, "car")), 2);
        assert_eq!(aggregator.record(&event(3, "bus")), 1);

        let snapshot = aggregator.snapshot();
        assert_eq!(snapshot.get("car"), 2);
        assert_eq!(snapshot.get("bus"), 1);
        assert_eq!(snapshot.get("van"), 0);
        assert_eq!(snapshot.total(), 3);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut aggregator = CountAggregator::new();
        aggregator.record(&event(1, "car"));
        let before = aggregator.snapshot();
        aggregator.record(&event(2, "car"));
        assert_eq!(before.get("car"), 1);
        assert_eq!(aggregator.snapshot().get("car"), 2);
    }

    #[test]
    fn test_handle_reads_from_another_thread() {
        let mut aggregator = CountAggregator::new();
        let handle = aggregator.handle();

        let reader = thread::spawn(move || {
            // Every snapshot is internally consistent: cars and buses move together.
            for _ in 0..1000 {
                let snapshot = handle.snapshot();
                assert_eq!(snapshot.get("car"), snapshot.get("bus"));
            }
            handle
        });

        for id in 0..500 {
            aggregator.record_all(&[event(2 * id, "car"), event(2 * id + 1, "bus")]);
        }

        let handle = reader.join().unwrap();
        assert_eq!(handle.get("car"), 500);
        handle.reset();
        assert!(aggregator.snapshot().is_empty());
    }
}
