use super::{ExecutionProvider, InferenceBackend, RunOutputs, check_shape};
use ndarray::{Array, IxDyn};
use ort::{
    session::{Session, SessionInputValue, builder::GraphOptimizationLevel},
    value::TensorRef,
};
use preprocess::NormalizedTensor;

/// ONNX Runtime session holding staged inputs between `feed` and `run`, and
/// the outputs of the last `run` until the next one.
pub struct OrtBackend {
    session: Session,
    inputs: Vec<(String, Array<f32, IxDyn>)>,
    outputs: RunOutputs,
}

impl OrtBackend {
    /// Load model with specified execution provider
    pub fn load_model_with_provider(
        path: &str,
        provider: ExecutionProvider,
    ) -> anyhow::Result<Self> {
        // Initialize ORT environment (idempotent)
        let _ = ort::init().commit();

        let mut builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?;

        match provider {
            ExecutionProvider::Cuda => {
                tracing::info!("Initializing ONNX Runtime with CUDA execution provider");
                builder = builder.with_execution_providers([
                    ort::execution_providers::CUDAExecutionProvider::default()
                        .with_device_id(0)
                        .build()
                        .error_on_failure(),
                ])?;
            }
            ExecutionProvider::Cpu => {
                tracing::info!("Initializing ONNX Runtime with CPU execution provider");
            }
        }

        let session = builder.commit_from_file(path)?;

        tracing::info!("Model loaded from {}", path);
        Ok(Self {
            session,
            inputs: Vec::new(),
            outputs: RunOutputs::default(),
        })
    }
}

impl InferenceBackend for OrtBackend {
    fn load_model(path: &str) -> anyhow::Result<Self> {
        Self::load_model_with_provider(path, ExecutionProvider::Cpu)
    }

    fn feed(
        &mut self,
        input_name: &str,
        tensor: &NormalizedTensor,
        shape: &[usize],
    ) -> anyhow::Result<()> {
        check_shape(shape, tensor.len())?;
        let array = Array::from_shape_vec(IxDyn(shape), tensor.as_slice().to_vec())?;

        self.inputs.retain(|(name, _)| name != input_name);
        self.inputs.push((input_name.to_string(), array));
        Ok(())
    }

    fn run(&mut self, output_names: &[&str]) -> anyhow::Result<()> {
        if self.inputs.is_empty() {
            anyhow::bail!("run called with no fed inputs");
        }
        let fed = std::mem::take(&mut self.inputs);
        self.outputs.clear();

        let mut session_inputs: Vec<(&str, SessionInputValue<'_>)> =
            Vec::with_capacity(fed.len());
        for (name, array) in &fed {
            let value = TensorRef::from_array_view(array.view())?;
            session_inputs.push((name.as_str(), value.into()));
        }

        let outputs = self.session.run(session_inputs)?;

        for &name in output_names {
            let value = outputs
                .get(name)
                .ok_or_else(|| anyhow::anyhow!("Model has no output named {}", name))?;
            let array = value.try_extract_array::<f32>()?;
            self.outputs.store(name, array.iter().copied().collect());
        }

        Ok(())
    }

    fn fetch(&mut self, output_name: &str, buffer: &mut [f32]) -> anyhow::Result<usize> {
        self.outputs.copy_into(output_name, buffer)
    }
}
