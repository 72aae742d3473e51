use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use serde::Serialize;

#[derive(Default)]
pub struct Metrics {
    // Counters
    total_requests: AtomicUsize,
    successful_requests: AtomicUsize,
    client_errors: AtomicUsize,
    server_errors: AtomicUsize,

    // Timing (in microseconds)
    total_request_time_us: AtomicU64,
    total_research_time_us: AtomicU64,

    // Counts
    research_queries: AtomicUsize,
    chunks_ingested: AtomicUsize,
    chunk_failures: AtomicUsize,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record_request(&self, status: StatusCode, duration: Duration) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_request_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);

        if status.is_server_error() {
            self.server_errors.fetch_add(1, Ordering::Relaxed);
        } else if status.is_client_error() {
            self.client_errors.fetch_add(1, Ordering::Relaxed);
        } else {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_research(&self, duration: Duration) {
        self.research_queries.fetch_add(1, Ordering::Relaxed);
        self.total_research_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_ingest(&self, chunks: usize, failures: usize) {
        self.chunks_ingested.fetch_add(chunks, Ordering::Relaxed);
        self.chunk_failures.fetch_add(failures, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            client_errors: self.client_errors.load(Ordering::Relaxed),
            server_errors: self.server_errors.load(Ordering::Relaxed),
            avg_request_time_ms: avg_time_ms(&self.total_request_time_us, &self.total_requests),
            avg_research_time_ms: avg_time_ms(&self.total_research_time_us, &self.research_queries),
            research_queries: self.research_queries.load(Ordering::Relaxed),
            chunks_ingested: self.chunks_ingested.load(Ordering::Relaxed),
            chunk_failures: self.chunk_failures.load(Ordering::Relaxed),
        }
    }
}

fn avg_time_ms(total_us: &AtomicU64, count: &AtomicUsize) -> f64 {
    let total = total_us.load(Ordering::Relaxed) as f64;
    let cnt = count.load(Ordering::Relaxed) as f64;
    if cnt > 0.0 {
        total / cnt / 1000.0 // Convert to ms
    } else {
        0.0
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub client_errors: usize,
    pub server_errors: usize,
    pub avg_request_time_ms: f64,
    pub avg_research_time_ms: f64,
    pub research_queries: usize,
    pub chunks_ingested: usize,
    pub chunk_failures: usize,
}

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Middleware recording the status and latency of every request
pub async fn track_requests(
    State(metrics): State<Arc<Metrics>>,
    request: Request,
    next: Next,
) -> Response {
    let timer = TimedOperation::start();
    let response = next.run(request).await;
    metrics.record_request(response.status(), timer.elapsed());
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_are_bucketed_by_status() {
        let metrics = Metrics::new();
        metrics.record_request(StatusCode::OK, Duration::from_millis(4));
        metrics.record_request(StatusCode::BAD_REQUEST, Duration::from_millis(2));
        metrics.record_request(StatusCode::INTERNAL_SERVER_ERROR, Duration::from_millis(6));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_requests, 3);
        assert_eq!(snapshot.successful_requests, 1);
        assert_eq!(snapshot.client_errors, 1);
        assert_eq!(snapshot.server_errors, 1);
        assert!((snapshot.avg_request_time_ms - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_averages_are_zero() {
        let snapshot = Metrics::new().snapshot();
        assert_eq!(snapshot.avg_request_time_ms, 0.0);
        assert_eq!(snapshot.avg_research_time_ms, 0.0);
    }

    #[test]
    fn test_ingest_and_research_counters() {
        let metrics = Metrics::new();
        metrics.record_ingest(3, 1);
        metrics.record_research(Duration::from_millis(10));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.chunks_ingested, 3);
        assert_eq!(snapshot.chunk_failures, 1);
        assert_eq!(snapshot.research_queries, 1);
        assert!((snapshot.avg_research_time_ms - 10.0).abs() < 1e-9);
    }
}
