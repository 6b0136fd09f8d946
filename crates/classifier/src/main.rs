use classifier::{
    ClassifierConfig, Classifier, LabelTable, Outcome, SERVICE_NAME, logging::setup_logging,
};
use common::TelemetryGuard;
use std::sync::Arc;

#[cfg(feature = "ort-backend")]
use classifier::backend::ort::OrtBackend as Backend;

#[cfg(not(feature = "ort-backend"))]
compile_error!("The 'ort-backend' feature must be enabled to build the classifier binary");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ClassifierConfig::from_env()?;

    let _telemetry = config
        .otel_endpoint
        .as_ref()
        .map(|endpoint| TelemetryGuard::init(SERVICE_NAME, endpoint))
        .transpose()?;

    setup_logging(&config);

    tracing::info!(
        config = ?config,
        "Loaded configuration"
    );

    tracing::info!("Loading inference model");
    let backend = Backend::load_model_with_provider(&config.model_path, config.execution_provider)?;
    tracing::info!("Model loaded successfully");

    let labels = LabelTable::load(&config.labels_path);
    let image = preprocess::load_image(&config.image_path)?;

    let classifier = Arc::new(Classifier::new(
        backend,
        config.preprocessor(),
        labels,
        config.model_spec(),
    ));

    println!("{}", Outcome::Pending);

    let outcome = match classifier.submit(image) {
        Ok(pending) => Outcome::from(pending.wait(config.inference_timeout()).await),
        Err(e) => Outcome::from(Err(e)),
    };

    println!("{}", outcome);

    if let Outcome::Failed(reason) = outcome {
        anyhow::bail!(reason);
    }
    Ok(())
}
