use anyhow::{Context, Result};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;
use users_config::{DeploymentEnvironment, LogConfig, ObservabilityConfig, OutputFormat};

/// Keeps the tracer provider alive; call [`TelemetryGuard::shutdown`] on exit
/// so buffered spans are exported.
#[must_use]
pub struct TelemetryGuard {
    tracer_provider: Option<SdkTracerProvider>,
}

impl TelemetryGuard {
    pub fn tracing_enabled(&self) -> bool {
        self.tracer_provider.is_some()
    }

    pub fn shutdown(self) {
        if let Some(provider) = self.tracer_provider {
            if let Err(err) = provider.shutdown() {
                warn!(error = %err, "Tracer provider shutdown failed");
            } else {
                info!("Tracer provider flushed and shut down");
            }
        }
    }
}

fn build_tracer_provider(config: &ObservabilityConfig) -> Result<SdkTracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()
        .context("Failed to create OTLP span exporter")?;

    let instance_id = hostname::get()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown".to_string());

    let resource = Resource::builder()
        .with_service_name(config.service_name.clone())
        .with_attribute(KeyValue::new("service.instance.id", instance_id))
        .build();

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .build())
}

/// Loki layer labelled with the service name and deployment environment.
/// The returned task does the pushing and must be spawned on the runtime.
pub fn build_loki_layer(
    loki_url: &str,
    app: &str,
    environment: DeploymentEnvironment,
) -> Result<(tracing_loki::Layer, tracing_loki::BackgroundTask)> {
    let url = Url::parse(loki_url).with_context(|| format!("Invalid Loki URL: {loki_url}"))?;

    tracing_loki::builder()
        .label("app", app)?
        .label("env", environment.as_str())?
        .build_url(url)
        .context("Failed to create Loki layer")
}

/// Installs the global subscriber: `EnvFilter` (`RUST_LOG` wins over the
/// configured level), the OpenTelemetry bridge when tracing is enabled, and a
/// `fmt` layer in the configured format. With `logging.loki_url` set, events
/// are also shipped to Loki; this needs a running tokio runtime.
pub fn init_telemetry(
    log_config: &LogConfig,
    observability: &ObservabilityConfig,
    environment: DeploymentEnvironment,
) -> Result<TelemetryGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_config.level.to_string()));

    let tracer_provider = if observability.tracing_enabled {
        let provider = build_tracer_provider(observability)?;
        global::set_text_map_propagator(TraceContextPropagator::new());
        global::set_tracer_provider(provider.clone());
        Some(provider)
    } else {
        None
    };

    let otel_layer = tracer_provider.as_ref().map(|provider| {
        tracing_opentelemetry::layer().with_tracer(provider.tracer(observability.service_name.clone()))
    });

    let loki_layer = match &log_config.loki_url {
        Some(url) => {
            let (layer, task) = build_loki_layer(url, &observability.service_name, environment)?;
            tokio::spawn(task);
            Some(layer)
        }
        None => None,
    };

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(otel_layer)
        .with(loki_layer);

    let init_result = match log_config.format {
        OutputFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .with_file(log_config.include_location)
                .with_line_number(log_config.include_location)
                .with_thread_ids(log_config.include_thread_id);

            registry.with(fmt_layer).try_init()
        }
        OutputFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_file(log_config.include_location)
                .with_line_number(log_config.include_location)
                .with_thread_ids(log_config.include_thread_id);

            registry.with(fmt_layer).try_init()
        }
        OutputFormat::Compact => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_file(log_config.include_location)
                .with_line_number(log_config.include_location)
                .with_thread_ids(log_config.include_thread_id);

            registry.with(fmt_layer).try_init()
        }
    };
    init_result.context("Failed to install tracing subscriber")?;

    info!(
        logging.format = ?log_config.format,
        logging.level = %log_config.level,
        tracing.enabled = observability.tracing_enabled,
        tracing.endpoint = %observability.otlp_endpoint,
        service.name = %observability.service_name,
        loki.enabled = log_config.loki_url.is_some(),
        "Structured logging initialized"
    );

    Ok(TelemetryGuard { tracer_provider })
}
