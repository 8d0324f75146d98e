use std::sync::Arc;

use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Body, Response, StatusCode};
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder, TEXT_FORMAT};
use tracing::error;

#[derive(Clone)]
pub struct Metrics {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,
    dtd_builds_total: IntCounterVec,
    request_latency: HistogramVec,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let dtd_builds_total = IntCounterVec::new(
            Opts::new("wodt_dtd_builds_total", "Digital twin descriptor rebuilds"),
            &["status"],
        )?;
        let request_latency = HistogramVec::new(
            HistogramOpts::new("wodt_request_latency_seconds", "Request latency"),
            &["route"],
        )?;

        registry.register(Box::new(dtd_builds_total.clone()))?;
        registry.register(Box::new(request_latency.clone()))?;

        Ok(Self { inner: Arc::new(Inner { registry, dtd_builds_total, request_latency }) })
    }

    pub fn render(&self) -> Response<Body> {
        let mf = self.inner.registry.gather();
        let mut buf = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&mf, &mut buf) {
            error!(error=%e, "metrics encoding failed");
            let mut r = Response::new(Body::from("metrics unavailable"));
            *r.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            return r;
        }

        let mut r = Response::new(Body::from(buf));
        r.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_FORMAT));
        r
    }

    pub fn inc_builds(&self, status: &'static str) {
        self.inner.dtd_builds_total.with_label_values(&[status]).inc();
    }

    pub fn builds(&self, status: &str) -> u64 {
        self.inner.dtd_builds_total.with_label_values(&[status]).get()
    }

    pub fn observe_latency(&self, route: &'static str, seconds: f64) {
        self.inner.request_latency.with_label_values(&[route]).observe(seconds);
    }
}
