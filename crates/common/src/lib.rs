pub mod config;
pub mod logging;
pub mod telemetry;

pub use config::{Environment, env_or, parse_env};
pub use logging::setup_logging;
pub use telemetry::TelemetryGuard;
