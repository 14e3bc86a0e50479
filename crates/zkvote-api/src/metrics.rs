//! # Prometheus Metrics
//!
//! HTTP request counts are recorded by middleware; registration and vote
//! outcomes are recorded by the handlers. Labels never carry voter handles
//! or ballot contents: paths are normalized and outcomes are error codes.

use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct ApiMetrics {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,
    http_requests_total: IntCounterVec,
    registrations_total: IntCounterVec,
    votes_total: IntCounterVec,
}

impl std::fmt::Debug for ApiMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiMetrics")
            .field("requests", &total(&self.inner.http_requests_total))
            .finish()
    }
}

impl ApiMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("zkvote_http_requests_total", "Total HTTP requests"),
            &["method", "path", "status"],
        )?;
        let registrations_total = IntCounterVec::new(
            Opts::new("zkvote_registrations_total", "Voter registrations by outcome"),
            &["outcome"],
        )?;
        let votes_total = IntCounterVec::new(
            Opts::new("zkvote_votes_total", "Vote casting attempts by outcome"),
            &["outcome"],
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(registrations_total.clone()))?;
        registry.register(Box::new(votes_total.clone()))?;

        Ok(Self {
            inner: Arc::new(Inner {
                registry,
                http_requests_total,
                registrations_total,
                votes_total,
            }),
        })
    }

    /// `outcome` is `"registered"` or an error code.
    pub fn record_registration(&self, outcome: &str) {
        self.inner
            .registrations_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// `outcome` is `"confirmed"` or an error code.
    pub fn record_vote(&self, outcome: &str) {
        self.inner.votes_total.with_label_values(&[outcome]).inc();
    }

    fn record_request(&self, method: &str, path: &str, status: u16) {
        self.inner
            .http_requests_total
            .with_label_values(&[method, path, &status.to_string()])
            .inc();
    }

    pub fn requests(&self) -> u64 {
        total(&self.inner.http_requests_total)
    }

    pub fn votes(&self, outcome: &str) -> u64 {
        self.inner.votes_total.with_label_values(&[outcome]).get()
    }

    pub fn registrations(&self, outcome: &str) -> u64 {
        self.inner
            .registrations_total
            .with_label_values(&[outcome])
            .get()
    }

    /// Gather all metrics in Prometheus text format.
    pub fn gather_and_encode(&self) -> Result<String, String> {
        let encoder = TextEncoder::new();
        let families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&families, &mut buffer)
            .map_err(|e| format!("failed to encode metrics: {e}"))?;
        String::from_utf8(buffer).map_err(|e| format!("metrics encoding produced invalid UTF-8: {e}"))
    }
}

fn total(counter: &IntCounterVec) -> u64 {
    use prometheus::core::Collector;
    counter
        .collect()
        .iter()
        .flat_map(|mf| mf.get_metric())
        .map(|m| m.get_counter().get_value() as u64)
        .sum()
}

/// Replace ballot ids and voter handles with placeholders so label
/// cardinality stays bounded.
fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
                ":id"
            } else if segment.len() == 64 && segment.bytes().all(|b| b.is_ascii_hexdigit()) {
                ":handle"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());

    let response = next.run(request).await;

    if let Some(m) = metrics {
        m.record_request(&method, &path, response.status().as_u16());
    }
    response
}
