//! Metrics registry for confcentral
//!
//! - Counters only
//! - Monotonic increase
//! - Reset only on process start

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters
///
/// Relaxed ordering throughout; readers only need eventually exact totals.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    queries_planned: AtomicU64,
    queries_executed: AtomicU64,
    queries_rejected: AtomicU64,
    intersections: AtomicU64,
    empty_intersections: AtomicU64,
    fan_outs: AtomicU64,
    windows_resolved: AtomicU64,
    registrations: AtomicU64,
    unregistrations: AtomicU64,
    registrations_rejected: AtomicU64,
    conferences_created: AtomicU64,
    sessions_created: AtomicU64,
    store_failures: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    // Query metrics

    pub fn increment_queries_planned(&self) {
        self.queries_planned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_executed(&self) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_rejected(&self) {
        self.queries_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one intersection and whether it came back empty
    pub fn record_intersection(&self, empty: bool) {
        self.intersections.fetch_add(1, Ordering::Relaxed);
        if empty {
            self.empty_intersections.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn increment_fan_outs(&self) {
        self.fan_outs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_windows_resolved(&self) {
        self.windows_resolved.fetch_add(1, Ordering::Relaxed);
    }

    // Registration metrics

    pub fn increment_registrations(&self) {
        self.registrations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_unregistrations(&self) {
        self.unregistrations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_registrations_rejected(&self) {
        self.registrations_rejected.fetch_add(1, Ordering::Relaxed);
    }

    // Write metrics

    pub fn increment_conferences_created(&self) {
        self.conferences_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_sessions_created(&self) {
        self.sessions_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_store_failures(&self) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries_planned: self.queries_planned.load(Ordering::Relaxed),
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            queries_rejected: self.queries_rejected.load(Ordering::Relaxed),
            intersections: self.intersections.load(Ordering::Relaxed),
            empty_intersections: self.empty_intersections.load(Ordering::Relaxed),
            fan_outs: self.fan_outs.load(Ordering::Relaxed),
            windows_resolved: self.windows_resolved.load(Ordering::Relaxed),
            registrations: self.registrations.load(Ordering::Relaxed),
            unregistrations: self.unregistrations.load(Ordering::Relaxed),
            registrations_rejected: self.registrations_rejected.load(Ordering::Relaxed),
            conferences_created: self.conferences_created.load(Ordering::Relaxed),
            sessions_created: self.sessions_created.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
        }
    }

    /// Current values as a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self.snapshot()).unwrap_or(serde_json::Value::Null)
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub queries_planned: u64,
    pub queries_executed: u64,
    pub queries_rejected: u64,
    pub intersections: u64,
    pub empty_intersections: u64,
    pub fan_outs: u64,
    pub windows_resolved: u64,
    pub registrations: u64,
    pub unregistrations: u64,
    pub registrations_rejected: u64,
    pub conferences_created: u64,
    pub sessions_created: u64,
    pub store_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_has_zero_values() {
        let registry = MetricsRegistry::new();
        assert_eq!(registry.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_increment_counters() {
        let registry = MetricsRegistry::new();

        registry.increment_queries_planned();
        registry.increment_queries_planned();
        registry.increment_queries_rejected();
        registry.record_intersection(false);
        registry.record_intersection(true);
        registry.increment_registrations();

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.queries_planned, 2);
        assert_eq!(snapshot.queries_rejected, 1);
        assert_eq!(snapshot.intersections, 2);
        assert_eq!(snapshot.empty_intersections, 1);
        assert_eq!(snapshot.registrations, 1);
    }

    #[test]
    fn test_to_json() {
        let registry = MetricsRegistry::new();
        registry.increment_queries_executed();

        let json = registry.to_json();
        assert_eq!(json["queries_executed"], 1);
        assert_eq!(json["fan_outs"], 0);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let registry = Arc::new(MetricsRegistry::new());
        let mut handles = vec![];

        for _ in 0..10 {
            let reg = Arc::clone(&registry);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    reg.increment_queries_executed();
                    reg.increment_fan_outs();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.queries_executed, 1000);
        assert_eq!(snapshot.fan_outs, 1000);
    }
}
