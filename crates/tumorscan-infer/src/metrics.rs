//! Prometheus metrics for the inference service.

use prometheus::{CounterVec, Histogram, HistogramOpts, Opts, Registry};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Metrics collection shared across requests.
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    pub requests_total: CounterVec,
    pub predictions_total: CounterVec,
    pub inference_latency: Histogram,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let requests_total = CounterVec::new(
            Opts::new("tumorscan_requests_total", "Prediction requests by status"),
            &["status"],
        )
        .expect("failed to create requests_total counter");

        let predictions_total = CounterVec::new(
            Opts::new("tumorscan_predictions_total", "Successful predictions by class"),
            &["label"],
        )
        .expect("failed to create predictions_total counter");

        let inference_latency = Histogram::with_opts(
            HistogramOpts::new(
                "tumorscan_inference_latency_seconds",
                "End-to-end prediction latency",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )
        .expect("failed to create inference_latency histogram");

        registry
            .register(Box::new(requests_total.clone()))
            .expect("failed to register requests_total");
        registry
            .register(Box::new(predictions_total.clone()))
            .expect("failed to register predictions_total");
        registry
            .register(Box::new(inference_latency.clone()))
            .expect("failed to register inference_latency");

        Self {
            registry: Arc::new(registry),
            requests_total,
            predictions_total,
            inference_latency,
        }
    }

    /// Record a finished request by HTTP status code.
    pub fn record_request(&self, status: u16) {
        self.requests_total
            .with_label_values(&[&status.to_string()])
            .inc();
    }

    /// Record a successful prediction and its latency.
    pub fn record_prediction(&self, label: &str, latency_secs: f64) {
        self.predictions_total.with_label_values(&[label]).inc();
        self.inference_latency.observe(latency_secs);
    }

    /// Get Prometheus text output
    pub fn gather(&self) -> String {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if encoder.encode(&metric_families, &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// HTTP server for the Prometheus metrics endpoint
pub struct MetricsServer {
    metrics: Metrics,
    addr: String,
}

impl MetricsServer {
    pub fn new(metrics: Metrics, addr: impl Into<String>) -> Self {
        Self {
            metrics,
            addr: addr.into(),
        }
    }

    /// Run the metrics HTTP server
    pub async fn run(&self) -> Result<(), std::io::Error> {
        let listener = TcpListener::bind(&self.addr).await?;
        info!("Metrics server listening on http://{}/metrics", self.addr);

        loop {
            let (mut socket, _addr) = listener.accept().await?;

            let metrics_output = self.metrics.gather();

            // Simple HTTP response
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\n\r\n{}",
                metrics_output.len(),
                metrics_output
            );

            if let Err(e) = socket.write_all(response.as_bytes()).await {
                error!("Failed to write response: {}", e);
            }
        }
    }
}
