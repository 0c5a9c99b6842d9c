//! # Prometheus Metrics
//!
//! Exposes governance metrics for the hosted vault. Scraped by Prometheus
//! at the `/metrics` HTTP endpoint on the configured metrics port.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] so they
//! do not collide with any default global registry consumers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use metavault_contracts::MetaVault;
use metavault_protocol::{VaultError, VaultEvent};
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the node.
///
/// Clone-friendly (prometheus handles are reference counted) so it can be
/// shared across request handlers.
#[derive(Clone)]
pub struct NodeMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Calls the vault accepted.
    pub calls_accepted_total: IntCounter,
    /// Calls the vault rejected, labelled by ABI error name.
    pub calls_rejected_total: IntCounterVec,
    /// Events appended to the vault's log.
    pub events_emitted_total: IntCounter,
    /// Successful `setModule` calls.
    pub module_switches_total: IntCounter,
    /// Current size of the module whitelist.
    pub whitelisted_modules: IntGauge,
    /// Time spent executing a call while holding the vault lock.
    pub call_latency_seconds: Histogram,
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("metavault".into()), None)
            .expect("failed to create prometheus registry");

        let calls_accepted_total =
            IntCounter::new("calls_accepted_total", "Total number of vault calls accepted")
                .expect("metric creation");
        registry
            .register(Box::new(calls_accepted_total.clone()))
            .expect("metric registration");

        let calls_rejected_total = IntCounterVec::new(
            Opts::new(
                "calls_rejected_total",
                "Total number of vault calls rejected, by error",
            ),
            &["error"],
        )
        .expect("metric creation");
        registry
            .register(Box::new(calls_rejected_total.clone()))
            .expect("metric registration");

        let events_emitted_total =
            IntCounter::new("events_emitted_total", "Total number of vault events emitted")
                .expect("metric creation");
        registry
            .register(Box::new(events_emitted_total.clone()))
            .expect("metric registration");

        let module_switches_total = IntCounter::new(
            "module_switches_total",
            "Total number of successful active module switches",
        )
        .expect("metric creation");
        registry
            .register(Box::new(module_switches_total.clone()))
            .expect("metric registration");

        let whitelisted_modules =
            IntGauge::new("whitelisted_modules", "Number of whitelisted modules")
                .expect("metric creation");
        registry
            .register(Box::new(whitelisted_modules.clone()))
            .expect("metric registration");

        let call_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "call_latency_seconds",
                "Vault call execution latency in seconds",
            )
            .buckets(vec![0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001, 0.005, 0.01, 0.05]),
        )
        .expect("metric creation");
        registry
            .register(Box::new(call_latency_seconds.clone()))
            .expect("metric registration");

        Self {
            registry,
            calls_accepted_total,
            calls_rejected_total,
            events_emitted_total,
            module_switches_total,
            whitelisted_modules,
            call_latency_seconds,
        }
    }

    /// Records the outcome of one vault call.
    pub fn record_call(&self, result: &Result<Vec<VaultEvent>, VaultError>) {
        match result {
            Ok(events) => {
                self.calls_accepted_total.inc();
                self.events_emitted_total.inc_by(events.len() as u64);
                let switches = events
                    .iter()
                    .filter(|e| matches!(e, VaultEvent::LogSetModule { .. }))
                    .count();
                self.module_switches_total.inc_by(switches as u64);
            }
            Err(err) => {
                self.calls_rejected_total
                    .with_label_values(&[err.name()])
                    .inc();
            }
        }
    }

    /// Refreshes gauges from the vault's current state.
    pub fn observe_vault(&self, vault: &MetaVault) {
        self.whitelisted_modules
            .set(vault.whitelisted_modules().len() as i64);
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<NodeMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
///
/// Returns HTTP 500 if encoding fails.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
