use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Process-wide counters, exposed as JSON on GET /metrics.
#[derive(Debug, Default)]
pub struct Metrics {
    requests: AtomicU64,
    client_errors: AtomicU64,
    server_errors: AtomicU64,
    builds_ok: AtomicU64,
    builds_failed: AtomicU64,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub client_errors: u64,
    pub server_errors: u64,
    pub builds_ok: u64,
    pub builds_failed: u64,
}

impl Metrics {
    pub fn record_response(&self, status: u16) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        match status {
            400..=499 => {
                self.client_errors.fetch_add(1, Ordering::Relaxed);
            }
            500..=599 => {
                self.server_errors.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }

    pub fn record_build(&self, ok: bool) {
        let counter = if ok {
            &self.builds_ok
        } else {
            &self.builds_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            client_errors: self.client_errors.load(Ordering::Relaxed),
            server_errors: self.server_errors.load(Ordering::Relaxed),
            builds_ok: self.builds_ok.load(Ordering::Relaxed),
            builds_failed: self.builds_failed.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn responses_are_bucketed_by_status_class() {
        let metrics = Metrics::default();
        metrics.record_response(200);
        metrics.record_response(404);
        metrics.record_response(503);
        metrics.record_build(true);
        metrics.record_build(false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests, 3);
        assert_eq!(snapshot.client_errors, 1);
        assert_eq!(snapshot.server_errors, 1);
        assert_eq!(snapshot.builds_ok, 1);
        assert_eq!(snapshot.builds_failed, 1);
    }
}
