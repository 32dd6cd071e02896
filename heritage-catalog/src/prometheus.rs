//! Prometheus metrics: HTTP request counts and latencies, cache outcomes.

use crate::cache::{Cache, CacheError};
use crate::error::{self, Result};
use actix_web::{
    Error, HttpResponse,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    middleware::Next,
    web,
};
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct PrometheusMetrics {
    pub registry: Registry,
    http_requests_total: IntCounterVec,
    http_requests_duration: HistogramVec,
    cache_lookups_total: IntCounterVec,
}

impl PrometheusMetrics {
    pub fn new() -> std::result::Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("heritage_http_requests_total", "Total number of HTTP requests"),
            &["method", "path", "status"],
        )?;

        let http_requests_duration = HistogramVec::new(
            HistogramOpts::new(
                "heritage_http_request_duration_seconds",
                "HTTP request latencies in seconds",
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
            &["method", "path", "status"],
        )?;

        let cache_lookups_total = IntCounterVec::new(
            Opts::new(
                "heritage_cache_lookups_total",
                "Result cache lookups by outcome (hit, miss, error)",
            ),
            &["result"],
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_requests_duration.clone()))?;
        registry.register(Box::new(cache_lookups_total.clone()))?;

        Ok(PrometheusMetrics {
            registry,
            http_requests_total,
            http_requests_duration,
            cache_lookups_total,
        })
    }

    pub fn render(&self) -> std::result::Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }

    fn observe_request(&self, method: &str, path: &str, status: StatusCode, elapsed: Duration) {
        let labels = [method, path, status.as_str()];
        self.http_requests_total.with_label_values(&labels).inc();
        self.http_requests_duration
            .with_label_values(&labels)
            .observe(elapsed.as_secs_f64());
    }

    /// Wrap `inner` so every lookup is counted.
    pub fn instrument_cache(&self, inner: Arc<dyn Cache>) -> Arc<dyn Cache> {
        Arc::new(InstrumentedCache {
            inner,
            lookups: self.cache_lookups_total.clone(),
        })
    }
}

/// Middleware recording each routed request.
///
/// Reads the metrics from `web::Data<Arc<PrometheusMetrics>>`; requests that
/// match no route are not recorded.
pub async fn track_requests(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> std::result::Result<ServiceResponse<impl MessageBody>, Error> {
    let start = Instant::now();
    let metrics = req.app_data::<web::Data<Arc<PrometheusMetrics>>>().cloned();
    let method = req.method().to_string();
    // Label by route pattern so artifact ids don't explode cardinality
    let path = req.match_pattern();

    let res = next.call(req).await?;

    if let (Some(metrics), Some(path)) = (metrics, path) {
        metrics.observe_request(&method, &path, res.status(), start.elapsed());
    }
    Ok(res)
}

struct InstrumentedCache {
    inner: Arc<dyn Cache>,
    lookups: IntCounterVec,
}

impl Cache for InstrumentedCache {
    fn get(&self, key: &str) -> std::result::Result<Option<String>, CacheError> {
        let result = self.inner.get(key);
        let outcome = match &result {
            Ok(Some(_)) => "hit",
            Ok(None) => "miss",
            Err(_) => "error",
        };
        self.lookups.with_label_values(&[outcome]).inc();
        result
    }

    fn set(&self, key: &str, value: String, ttl: Duration) -> std::result::Result<(), CacheError> {
        self.inner.set(key, value, ttl)
    }
}

pub async fn metrics_handler(
    metrics: web::Data<Arc<PrometheusMetrics>>,
) -> actix_web::Result<HttpResponse> {
    let body = metrics
        .render()
        .map_err(actix_web::error::ErrorInternalServerError)?;
    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(body))
}

pub fn initialize_metrics() -> Result<Arc<PrometheusMetrics>> {
    let metrics = PrometheusMetrics::new().map_err(|e| error::ServerError::Startup {
        reason: format!("Failed to create prometheus metrics: {e}"),
    })?;
    Ok(Arc::new(metrics))
}
