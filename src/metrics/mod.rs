//! Prometheus metrics for the cluster monitor
//!
//! Exposes metrics via HTTP endpoint for Prometheus scraping.

use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry,
};
use std::sync::OnceLock;

/// Global metrics registry
static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Get the global metrics instance
pub fn metrics() -> &'static Metrics {
    METRICS.get_or_init(Metrics::new)
}

/// Clusterwatch metrics collection
pub struct Metrics {
    /// Registry for all metrics
    pub registry: Registry,

    // Check metrics
    /// Checks performed by component and resulting status
    pub checks_total: IntCounterVec,
    /// Probe latency histogram (in seconds)
    pub check_duration_seconds: HistogramVec,

    /// Events raised by type and severity
    pub events_total: IntCounterVec,

    /// Failed store writes by operation
    pub store_errors_total: IntCounterVec,

    // Pass metrics
    /// Completed check passes
    pub passes_total: IntCounter,
    /// Components by status after the latest pass
    pub components: IntGaugeVec,
}

impl Metrics {
    /// Create a new metrics collection
    pub fn new() -> Self {
        let registry = Registry::new();

        let checks_total = IntCounterVec::new(
            Opts::new("clusterwatch_checks_total", "Total number of component checks"),
            &["component", "status"],
        )
        .unwrap();

        let check_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "clusterwatch_check_duration_seconds",
                "Component probe latency in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
            ]),
            &["component"],
        )
        .unwrap();

        let events_total = IntCounterVec::new(
            Opts::new("clusterwatch_events_total", "Total number of events raised"),
            &["event_type", "severity"],
        )
        .unwrap();

        let store_errors_total = IntCounterVec::new(
            Opts::new(
                "clusterwatch_store_errors_total",
                "Total number of failed store operations",
            ),
            &["operation"], // save_check, log_event, upsert_summary, purge
        )
        .unwrap();

        let passes_total = IntCounter::new(
            "clusterwatch_passes_total",
            "Total number of completed check passes",
        )
        .unwrap();

        let components = IntGaugeVec::new(
            Opts::new(
                "clusterwatch_components",
                "Current number of components by status",
            ),
            &["status"], // online, offline, error
        )
        .unwrap();

        registry.register(Box::new(checks_total.clone())).unwrap();
        registry
            .register(Box::new(check_duration_seconds.clone()))
            .unwrap();
        registry.register(Box::new(events_total.clone())).unwrap();
        registry
            .register(Box::new(store_errors_total.clone()))
            .unwrap();
        registry.register(Box::new(passes_total.clone())).unwrap();
        registry.register(Box::new(components.clone())).unwrap();

        Self {
            registry,
            checks_total,
            check_duration_seconds,
            events_total,
            store_errors_total,
            passes_total,
            components,
        }
    }

    /// Record a component check
    pub fn record_check(&self, component: &str, status: &str, duration_secs: f64) {
        self.checks_total
            .with_label_values(&[component, status])
            .inc();
        self.check_duration_seconds
            .with_label_values(&[component])
            .observe(duration_secs);
    }

    /// Record a raised event
    pub fn record_event(&self, event_type: &str, severity: &str) {
        self.events_total
            .with_label_values(&[event_type, severity])
            .inc();
    }

    /// Record a failed store operation
    pub fn record_store_error(&self, operation: &str) {
        self.store_errors_total
            .with_label_values(&[operation])
            .inc();
    }

    /// Record a finished pass and its status breakdown
    pub fn record_pass(&self, online: i64, offline: i64, error: i64) {
        self.passes_total.inc();
        self.components.with_label_values(&["online"]).set(online);
        self.components.with_label_values(&["offline"]).set(offline);
        self.components.with_label_values(&["error"]).set(error);
    }

    /// Get metrics as Prometheus text format
    pub fn gather(&self) -> String {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Start the metrics HTTP server
pub async fn start_metrics_server(addr: &str) -> anyhow::Result<()> {
    use http_body_util::Full;
    use hyper::body::Bytes;
    use hyper::server::conn::http1;
    use hyper::service::service_fn;
    use hyper::{Request, Response, StatusCode};
    use hyper_util::rt::TokioIo;
    use std::convert::Infallible;
    use std::net::SocketAddr;
    use tokio::net::TcpListener;
    use tracing::{error, info};

    async fn handle_request(
        req: Request<hyper::body::Incoming>,
    ) -> Result<Response<Full<Bytes>>, Infallible> {
        match req.uri().path() {
            "/metrics" => {
                let body = metrics().gather();
                Ok(Response::builder()
                    .status(StatusCode::OK)
                    .header("Content-Type", "text/plain; version=0.0.4; charset=utf-8")
                    .body(Full::new(Bytes::from(body)))
                    .unwrap())
            }
            "/health" => Ok(Response::builder()
                .status(StatusCode::OK)
                .body(Full::new(Bytes::from("OK")))
                .unwrap()),
            _ => Ok(Response::builder()
                .status(StatusCode::NOT_FOUND)
                .body(Full::new(Bytes::from("Not Found")))
                .unwrap()),
        }
    }

    let addr: SocketAddr = addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Metrics server listening");

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);

        tokio::spawn(async move {
            if let Err(e) = http1::Builder::new()
                .serve_connection(io, service_fn(handle_request))
                .await
            {
                error!(error = %e, "Metrics server connection error");
            }
        });
    }
}
