//! [`MetricsBackend`] backed by an owned Prometheus recorder.

use anyhow::{Context, Result};
use metrics::{Key, Label, Level, Metadata, Recorder};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use metrics_process::Collector;
use tracing::info;

use crate::metrics_recorder::{
    MetricLabels, MetricsBackend, MetricsError, APP_ERRORS_TOTAL, APP_EVENTS_TOTAL,
    DURATION_BUCKETS, HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS,
};

/// The recorder is not installed as the global `metrics` recorder, so
/// several instances can live side by side. Process metrics (`process_*`)
/// are sampled into it on every render.
pub struct PrometheusMetrics {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
    process: Collector,
}

impl PrometheusMetrics {
    pub fn new() -> Result<Self> {
        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Full(HTTP_REQUEST_DURATION_SECONDS.to_string()),
                DURATION_BUCKETS,
            )
            .context("Failed to configure histogram buckets")?
            .build_recorder();
        let handle = recorder.handle();

        let metrics = Self {
            recorder,
            handle,
            process: Collector::default(),
        };
        metrics.describe();

        info!(
            buckets = ?DURATION_BUCKETS,
            "Prometheus metrics backend initialized"
        );
        Ok(metrics)
    }

    /// Current state in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        metrics::with_local_recorder(&self.recorder, || self.process.collect());
        self.handle.render()
    }

    fn describe(&self) {
        let descriptions = [
            (HTTP_REQUESTS_TOTAL, "Total number of HTTP requests"),
            (APP_EVENTS_TOTAL, "Total number of application events"),
            (APP_ERRORS_TOTAL, "Total number of application errors"),
        ];
        for (name, help) in descriptions {
            self.recorder.describe_counter(name.into(), None, help.into());
        }
        self.recorder.describe_histogram(
            HTTP_REQUEST_DURATION_SECONDS.into(),
            Some(metrics::Unit::Seconds),
            "HTTP request duration in seconds".into(),
        );
        metrics::with_local_recorder(&self.recorder, || self.process.describe());
    }

    fn key(name: &'static str, labels: &MetricLabels) -> Key {
        let labels: Vec<Label> = labels
            .iter()
            .map(|(key, value)| Label::new(*key, value.clone()))
            .collect();
        Key::from_parts(name, labels)
    }

    fn metadata() -> Metadata<'static> {
        Metadata::new(module_path!(), Level::INFO, Some(module_path!()))
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn increment_counter(&self, name: &'static str, labels: &MetricLabels) -> Result<(), MetricsError> {
        validate_labels(labels)?;
        self.recorder
            .register_counter(&Self::key(name, labels), &Self::metadata())
            .increment(1);
        Ok(())
    }

    fn observe_histogram(
        &self,
        name: &'static str,
        labels: &MetricLabels,
        value: f64,
    ) -> Result<(), MetricsError> {
        validate_labels(labels)?;
        if !value.is_finite() || value < 0.0 {
            return Err(MetricsError::Backend(format!(
                "histogram {name} rejects observation {value}"
            )));
        }
        self.recorder
            .register_histogram(&Self::key(name, labels), &Self::metadata())
            .record(value);
        Ok(())
    }
}

fn validate_labels(labels: &MetricLabels) -> Result<(), MetricsError> {
    for (label, value) in labels {
        if value.is_empty() {
            return Err(MetricsError::InvalidLabel {
                label,
                reason: "empty value".to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(status: &str) -> Vec<(&'static str, String)> {
        vec![
            ("method", "GET".to_string()),
            ("path", "/users".to_string()),
            ("statusCode", status.to_string()),
        ]
    }

    #[test]
    fn test_counter_is_rendered_with_labels() {
        let metrics = PrometheusMetrics::new().unwrap();
        metrics
            .increment_counter(HTTP_REQUESTS_TOTAL, &labels("200"))
            .unwrap();
        metrics
            .increment_counter(HTTP_REQUESTS_TOTAL, &labels("200"))
            .unwrap();

        let output = metrics.render();
        assert!(output.contains("# HELP http_requests_total Total number of HTTP requests"));
        assert!(output.contains(r#"http_requests_total{method="GET",path="/users",statusCode="200"} 2"#));
    }

    #[test]
    fn test_histogram_uses_fixed_buckets() {
        let metrics = PrometheusMetrics::new().unwrap();
        metrics
            .observe_histogram(HTTP_REQUEST_DURATION_SECONDS, &labels("200"), 0.2)
            .unwrap();

        let output = metrics.render();
        assert!(output.contains(r#"http_request_duration_seconds_bucket{method="GET",path="/users",statusCode="200",le="0.1"} 0"#));
        assert!(output.contains(r#"http_request_duration_seconds_bucket{method="GET",path="/users",statusCode="200",le="0.5"} 1"#));
        assert!(output.contains(r#"http_request_duration_seconds_count{method="GET",path="/users",statusCode="200"} 1"#));
    }

    #[test]
    fn test_invalid_samples_are_rejected() {
        let metrics = PrometheusMetrics::new().unwrap();
        assert!(metrics
            .increment_counter(HTTP_REQUESTS_TOTAL, &labels(""))
            .is_err());
        assert!(metrics
            .observe_histogram(HTTP_REQUEST_DURATION_SECONDS, &labels("200"), f64::NAN)
            .is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_render_includes_process_metrics() {
        let metrics = PrometheusMetrics::new().unwrap();

        let output = metrics.render();
        assert!(output.contains("process_resident_memory_bytes"));
        assert!(output.contains("process_cpu_seconds_total"));
        assert!(output.contains("process_threads"));
    }

    #[test]
    fn test_instances_are_independent() {
        let first = PrometheusMetrics::new().unwrap();
        let second = PrometheusMetrics::new().unwrap();
        first
            .increment_counter(APP_EVENTS_TOTAL, &[("event", "user.created".to_string()), ("status", "success".to_string())])
            .unwrap();

        assert!(first.render().contains("app_events_total{"));
        assert!(!second.render().contains("app_events_total{"));
    }
}
