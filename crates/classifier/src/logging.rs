use crate::config::ClassifierConfig;

pub fn setup_logging(config: &ClassifierConfig) {
    common::setup_logging(
        crate::SERVICE_NAME,
        config.environment,
        config.log_level.as_deref(),
    );
}
