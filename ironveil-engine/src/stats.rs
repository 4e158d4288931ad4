//! Engine statistics
//!
//! Process-wide counters owned by the engine instance. Counters are
//! lock-free atomics so concurrent callers never contend; the start
//! instant is monotonic and captured once at construction. The only way
//! to reset the counters is to construct a new engine.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Mutable counter block, one per engine instance
#[derive(Debug)]
pub struct EngineStats {
    total_processed: AtomicU64,
    threats_detected: AtomicU64,
    threats_blocked: AtomicU64,
    clean_inputs: AtomicU64,
    start_time: Instant,
}

/// Point-in-time view of the counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total_processed: u64,
    pub threats_detected: u64,
    pub threats_blocked: u64,
    pub clean_inputs: u64,
    pub runtime_seconds: f64,
    pub requests_per_second: f64,
}

impl EngineStats {
    pub fn new() -> Self {
        Self {
            total_processed: AtomicU64::new(0),
            threats_detected: AtomicU64::new(0),
            threats_blocked: AtomicU64::new(0),
            clean_inputs: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record one completed scan.
    ///
    /// `blocked` is only meaningful when a threat was found and the input
    /// was actually sanitized.
    pub fn record_scan(&self, threat_found: bool, blocked: bool) {
        self.total_processed.fetch_add(1, Ordering::Relaxed);
        if threat_found {
            self.threats_detected.fetch_add(1, Ordering::Relaxed);
            if blocked {
                self.threats_blocked.fetch_add(1, Ordering::Relaxed);
            }
        } else {
            self.clean_inputs.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let total_processed = self.total_processed.load(Ordering::Relaxed);
        let runtime_seconds = self.start_time.elapsed().as_secs_f64();
        let requests_per_second = if runtime_seconds > 0.0 {
            total_processed as f64 / runtime_seconds
        } else {
            0.0
        };

        StatsSnapshot {
            total_processed,
            threats_detected: self.threats_detected.load(Ordering::Relaxed),
            threats_blocked: self.threats_blocked.load(Ordering::Relaxed),
            clean_inputs: self.clean_inputs.load(Ordering::Relaxed),
            runtime_seconds,
            requests_per_second,
        }
    }
}

impl Default for EngineStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_stats_are_zero() {
        let stats = EngineStats::new();
        let snap = stats.snapshot();
        assert_eq!(snap.total_processed, 0);
        assert_eq!(snap.threats_detected, 0);
        assert_eq!(snap.threats_blocked, 0);
        assert_eq!(snap.clean_inputs, 0);
    }

    #[test]
    fn test_clean_scan_counts() {
        let stats = EngineStats::new();
        stats.record_scan(false, false);
        let snap = stats.snapshot();
        assert_eq!(snap.total_processed, 1);
        assert_eq!(snap.clean_inputs, 1);
        assert_eq!(snap.threats_detected, 0);
    }

    #[test]
    fn test_detected_and_blocked_counts() {
        let stats = EngineStats::new();
        stats.record_scan(true, false);
        stats.record_scan(true, true);
        let snap = stats.snapshot();
        assert_eq!(snap.total_processed, 2);
        assert_eq!(snap.threats_detected, 2);
        assert_eq!(snap.threats_blocked, 1);
        assert_eq!(snap.clean_inputs, 0);
    }

    #[test]
    fn test_rate_is_derived_from_runtime() {
        let stats = EngineStats::new();
        for _ in 0..10 {
            stats.record_scan(false, false);
        }
        let snap = stats.snapshot();
        assert!(snap.runtime_seconds >= 0.0);
        if snap.runtime_seconds > 0.0 {
            assert!(snap.requests_per_second > 0.0);
        }
    }
}
