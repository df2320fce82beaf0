//! Process-lifetime analysis counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct AnalysisStats {
    total: AtomicU64,
    completed: AtomicU64,
    rejected: AtomicU64,
    fallback: AtomicU64,
    processing_micros: AtomicU64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatsSnapshot {
    pub total_analyses: u64,
    pub successful_analyses: u64,
    pub rejected_uploads: u64,
    pub fallback_analyses: u64,
    /// Mean processing time of completed analyses, in seconds
    pub average_processing_time: f64,
    /// Completed / total, in [0, 1]
    pub success_rate: f64,
}

impl AnalysisStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_completed(&self, processing_time: Duration, used_fallback: bool) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.completed.fetch_add(1, Ordering::Relaxed);
        if used_fallback {
            self.fallback.fetch_add(1, Ordering::Relaxed);
        }
        let micros = u64::try_from(processing_time.as_micros()).unwrap_or(u64::MAX);
        self.processing_micros.fetch_add(micros, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let total = self.total.load(Ordering::Relaxed);
        let completed = self.completed.load(Ordering::Relaxed);
        let micros = self.processing_micros.load(Ordering::Relaxed);

        let average_processing_time = if completed == 0 {
            0.0
        } else {
            (micros as f64 / completed as f64 / 1_000.0).round() / 1_000.0
        };
        let success_rate = if total == 0 {
            0.0
        } else {
            completed as f64 / total as f64
        };

        StatsSnapshot {
            total_analyses: total,
            successful_analyses: completed,
            rejected_uploads: self.rejected.load(Ordering::Relaxed),
            fallback_analyses: self.fallback.load(Ordering::Relaxed),
            average_processing_time,
            success_rate,
        }
    }
}
