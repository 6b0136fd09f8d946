use crate::config::Environment;
use opentelemetry::global;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LEVEL: &str = "info";

/// Initialize tracing subscriber with pretty formatting for development
/// and JSON formatting for production.
///
/// `RUST_LOG` wins when set; otherwise `log_level` is used, then "info".
///
/// Spans are also forwarded to the global OpenTelemetry tracer, which is a
/// no-op unless a [`crate::TelemetryGuard`] was initialized first.
pub fn setup_logging(
    service_name: &'static str,
    environment: Environment,
    log_level: Option<&str>,
) {
    let otel_layer = tracing_opentelemetry::layer().with_tracer(global::tracer(service_name));

    let registry = tracing_subscriber::registry()
        .with(env_filter(log_level))
        .with(otel_layer);

    match environment {
        Environment::Production => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_level(true))
                .init();
        }
        Environment::Development => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_ansi(true))
                .init();
        }
    }
}

fn env_filter(log_level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level.unwrap_or(DEFAULT_LEVEL)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
}
