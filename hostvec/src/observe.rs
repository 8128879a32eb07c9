//! Object accounting
//!
//! The runtime reports every construction and release to an
//! [`ObjectObserver`]. [`ObjectStats`] is the default observer: it keeps live
//! counts per class and logs a summary every `report_rate` changes.

use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use tracing::info;

/// Receives object lifecycle events from the runtime
pub trait ObjectObserver {
    fn on_construct(&self, class: &str);

    fn on_release(&self, class: &str);

    /// Current statistics
    fn snapshot(&self) -> StatsSnapshot;
}

/// Per-class counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassStats {
    pub live: u64,
    pub created: u64,
    pub released: u64,
}

/// Point-in-time copy of the statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Live objects across all classes
    pub total: u64,
    /// Constructions plus releases observed so far
    pub changes: u64,
    pub classes: BTreeMap<String, ClassStats>,
}

/// Default observer
#[derive(Debug, Default)]
pub struct ObjectStats {
    classes: RefCell<BTreeMap<String, ClassStats>>,
    changes: Cell<u64>,
    report_rate: Cell<u64>,
}

impl ObjectStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log a summary every `rate` changes; 0 disables reporting
    pub fn with_report_rate(rate: u64) -> Self {
        let stats = Self::default();
        stats.report_rate.set(rate);
        stats
    }

    pub fn set_report_rate(&self, rate: u64) {
        self.report_rate.set(rate);
    }

    pub fn report_rate(&self) -> u64 {
        self.report_rate.get()
    }

    /// Live objects of `class`
    pub fn live(&self, class: &str) -> u64 {
        self.classes.borrow().get(class).map_or(0, |s| s.live)
    }

    fn record(&self, class: &str, update: impl FnOnce(&mut ClassStats)) {
        {
            let mut classes = self.classes.borrow_mut();
            update(classes.entry(class.to_string()).or_default());
        }
        let changes = self.changes.get() + 1;
        self.changes.set(changes);
        let rate = self.report_rate.get();
        if rate > 0 && changes % rate == 0 {
            self.report();
        }
    }

    fn report(&self) {
        let snapshot = self.snapshot();
        for (class, stats) in &snapshot.classes {
            info!(
                class = %class,
                live = stats.live,
                created = stats.created,
                released = stats.released,
                "object count"
            );
        }
        info!(total = snapshot.total, changes = snapshot.changes, "object totals");
    }
}

impl ObjectObserver for ObjectStats {
    fn on_construct(&self, class: &str) {
        self.record(class, |s| {
            s.live += 1;
            s.created += 1;
        });
    }

    fn on_release(&self, class: &str) {
        self.record(class, |s| {
            s.live = s.live.saturating_sub(1);
            s.released += 1;
        });
    }

    fn snapshot(&self) -> StatsSnapshot {
        let classes = self.classes.borrow().clone();
        StatsSnapshot {
            total: classes.values().map(|s| s.live).sum(),
            changes: self.changes.get(),
            classes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_follow_lifecycle() {
        let stats = ObjectStats::new();
        stats.on_construct("TVec");
        stats.on_construct("TVec");
        stats.on_release("TVec");
        assert_eq!(stats.live("TVec"), 1);
        assert_eq!(stats.live("TMat"), 0);

        let snap = stats.snapshot();
        assert_eq!(snap.total, 1);
        assert_eq!(snap.changes, 3);
        assert_eq!(
            snap.classes["TVec"],
            ClassStats {
                live: 1,
                created: 2,
                released: 1
            }
        );
    }

    #[test]
    fn test_snapshot_serializes() {
        let stats = ObjectStats::with_report_rate(2);
        stats.on_construct("TVec");
        stats.on_construct("TVec");
        assert_eq!(stats.report_rate(), 2);
        let json = serde_json::to_string(&stats.snapshot()).unwrap();
        assert_eq!(
            json,
            r#"{"total":2,"changes":2,"classes":{"TVec":{"live":2,"created":2,"released":0}}}"#
        );
    }

    #[test]
    fn test_release_never_underflows() {
        let stats = ObjectStats::new();
        stats.on_release("TVec");
        assert_eq!(stats.live("TVec"), 0);
        assert_eq!(stats.snapshot().classes["TVec"].released, 1);
    }
}
