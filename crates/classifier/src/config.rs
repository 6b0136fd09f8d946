use crate::backend::{ExecutionProvider, ModelSpec};
use common::{env_or, parse_env};
use preprocess::{DEFAULT_INPUT_SIZE, DEFAULT_MEAN, DEFAULT_STD, Preprocessor, ResampleFilter};
use std::env;
use std::time::Duration;

pub use common::Environment;

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub environment: Environment,
    pub log_level: Option<String>,
    pub otel_endpoint: Option<String>,
    pub model_path: String,
    pub labels_path: String,
    pub image_path: String,
    pub input_size: u32,
    pub mean: f32,
    pub std: f32,
    pub resample_filter: ResampleFilter,
    pub input_name: String,
    pub output_name: String,
    pub num_classes: usize,
    pub execution_provider: ExecutionProvider,
    pub inference_timeout_ms: Option<u64>,
}

impl ClassifierConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = ModelSpec::default();

        let config = Self {
            environment: Environment::from_env(),
            log_level: env::var("LOG_LEVEL").ok(),
            otel_endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok(),
            model_path: env_or("MODEL_PATH", "models/squeezenet.onnx"),
            labels_path: env_or("LABELS_PATH", "assets/labels.json"),
            image_path: env_or("IMAGE_PATH", "assets/broc.jpg"),
            input_size: parse_env("INPUT_SIZE").unwrap_or(DEFAULT_INPUT_SIZE),
            mean: parse_env("INPUT_MEAN").unwrap_or(DEFAULT_MEAN),
            std: parse_env("INPUT_STD").unwrap_or(DEFAULT_STD),
            resample_filter: parse_env("RESAMPLE_FILTER").unwrap_or_default(),
            input_name: env_or("INPUT_NAME", &defaults.input_name),
            output_name: env_or("OUTPUT_NAME", &defaults.output_name),
            num_classes: parse_env("NUM_CLASSES").unwrap_or(defaults.num_classes),
            execution_provider: parse_env("EXECUTION_PROVIDER").unwrap_or_default(),
            inference_timeout_ms: parse_env("INFERENCE_TIMEOUT_MS"),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.input_size == 0 {
            anyhow::bail!("INPUT_SIZE must be positive");
        }
        if self.std == 0.0 {
            anyhow::bail!("INPUT_STD must be non-zero");
        }
        if self.num_classes == 0 {
            anyhow::bail!("NUM_CLASSES must be positive");
        }
        Ok(())
    }

    pub fn preprocessor(&self) -> Preprocessor {
        Preprocessor::new(self.input_size, self.mean, self.std).with_filter(self.resample_filter)
    }

    pub fn model_spec(&self) -> ModelSpec {
        ModelSpec {
            input_name: self.input_name.clone(),
            output_name: self.output_name.clone(),
            num_classes: self.num_classes,
        }
    }

    pub fn inference_timeout(&self) -> Option<Duration> {
        self.inference_timeout_ms.map(Duration::from_millis)
    }

    /// Create default configuration for testing
    #[cfg(test)]
    pub fn test_default() -> Self {
        Self {
            environment: Environment::Development,
            log_level: None,
            otel_endpoint: None,
            model_path: "/models/squeezenet.onnx".to_string(),
            labels_path: "/assets/labels.json".to_string(),
            image_path: "/assets/broc.jpg".to_string(),
            input_size: 224,
            mean: 127.5,
            std: 1.0,
            resample_filter: ResampleFilter::Nearest,
            input_name: "input_1".to_string(),
            output_name: "output_1".to_string(),
            num_classes: 1000,
            execution_provider: ExecutionProvider::Cpu,
            inference_timeout_ms: None,
        }
    }
}
