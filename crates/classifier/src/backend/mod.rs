use preprocess::NormalizedTensor;
use std::collections::HashMap;
use std::str::FromStr;

#[cfg(feature = "ort-backend")]
pub mod ort;

/// Model execution engine driven through a feed / run / fetch sequence.
///
/// A prediction always calls all three, in that order: `feed` stages named
/// inputs, `run` consumes them and computes the requested outputs, `fetch`
/// copies one computed output out. Implementations are not expected to be
/// reentrant; callers serialize access.
pub trait InferenceBackend: Send {
    fn load_model(path: &str) -> anyhow::Result<Self>
    where
        Self: Sized;

    /// Stage `tensor` as input `input_name`, reshaped to `shape`.
    fn feed(
        &mut self,
        input_name: &str,
        tensor: &NormalizedTensor,
        shape: &[usize],
    ) -> anyhow::Result<()>;

    /// Execute the model on the staged inputs, keeping `output_names`.
    fn run(&mut self, output_names: &[&str]) -> anyhow::Result<()>;

    /// Copy output `output_name` into `buffer` and return the number of
    /// values the output holds (which may differ from `buffer.len()`).
    fn fetch(&mut self, output_name: &str, buffer: &mut [f32]) -> anyhow::Result<usize>;
}

/// Tensor names and output width of a bundled classifier model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub input_name: String,
    pub output_name: String,
    pub num_classes: usize,
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self {
            input_name: "input_1".to_string(),
            output_name: "output_1".to_string(),
            num_classes: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionProvider {
    #[default]
    Cpu,
    Cuda,
}

impl FromStr for ExecutionProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "cuda" | "gpu" => Ok(Self::Cuda),
            other => Err(format!("unknown execution provider: {}", other)),
        }
    }
}

/// Outputs of the most recent `run`, kept for `fetch`. Cleared when a run
/// starts so a failed run never leaves earlier scores behind.
#[derive(Debug, Default)]
pub struct RunOutputs {
    values: HashMap<String, Vec<f32>>,
}

impl RunOutputs {
    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn store(&mut self, name: &str, values: Vec<f32>) {
        self.values.insert(name.to_string(), values);
    }

    /// Copy as much of `name` as fits into `buffer`; returns the full length.
    pub fn copy_into(&self, name: &str, buffer: &mut [f32]) -> anyhow::Result<usize> {
        let values = self
            .values
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("Output {} was not produced by the last run", name))?;

        let n = values.len().min(buffer.len());
        buffer[..n].copy_from_slice(&values[..n]);
        Ok(values.len())
    }
}

/// Check that `shape` describes exactly `len` values.
pub fn check_shape(shape: &[usize], len: usize) -> anyhow::Result<()> {
    let volume: usize = shape.iter().product();
    if shape.is_empty() || volume != len {
        anyhow::bail!(
            "Shape {:?} holds {} values, tensor has {}",
            shape,
            volume,
            len
        );
    }
    Ok(())
}
