use classifier::{
    Classification, Classifier, ClassifyError, InferenceBackend, LabelTable, ModelSpec, Outcome,
    Prediction,
};
use image::{Rgb, RgbImage};
use preprocess::{NormalizedTensor, Preprocessor};
use std::sync::{Arc, Mutex, mpsc};
use std::time::Duration;

/// In-memory engine that returns fixed scores and records every call.
struct ScriptedBackend {
    scores: Vec<f32>,
    calls: Arc<Mutex<Vec<String>>>,
    fed: Arc<Mutex<Vec<f32>>>,
    staged: bool,
    produced: bool,
    gate: Option<mpsc::Receiver<()>>,
    fail_run: bool,
    panic_run: bool,
}

impl ScriptedBackend {
    fn new(scores: Vec<f32>) -> Self {
        Self {
            scores,
            calls: Arc::default(),
            fed: Arc::default(),
            staged: false,
            produced: false,
            gate: None,
            fail_run: false,
            panic_run: false,
        }
    }

    /// `run` blocks until the returned sender fires (or is dropped).
    fn gated(scores: Vec<f32>) -> (Self, mpsc::Sender<()>) {
        let (tx, rx) = mpsc::channel();
        let mut backend = Self::new(scores);
        backend.gate = Some(rx);
        (backend, tx)
    }
}

impl InferenceBackend for ScriptedBackend {
    fn load_model(_path: &str) -> anyhow::Result<Self> {
        Ok(Self::new(Vec::new()))
    }

    fn feed(
        &mut self,
        input_name: &str,
        tensor: &NormalizedTensor,
        shape: &[usize],
    ) -> anyhow::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("feed {} {:?} {}", input_name, shape, tensor.len()));
        *self.fed.lock().unwrap() = tensor.as_slice().to_vec();
        self.staged = true;
        Ok(())
    }

    fn run(&mut self, output_names: &[&str]) -> anyhow::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("run {}", output_names.join(",")));
        if let Some(gate) = &self.gate {
            let _ = gate.recv();
        }
        if self.panic_run {
            panic!("engine crashed");
        }
        if self.fail_run {
            anyhow::bail!("native run failed");
        }
        if !self.staged {
            anyhow::bail!("run before feed");
        }
        self.staged = false;
        self.produced = true;
        Ok(())
    }

    fn fetch(&mut self, output_name: &str, buffer: &mut [f32]) -> anyhow::Result<usize> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("fetch {}", output_name));
        if !self.produced {
            anyhow::bail!("fetch before run");
        }
        let n = self.scores.len().min(buffer.len());
        buffer[..n].copy_from_slice(&self.scores[..n]);
        Ok(self.scores.len())
    }
}

fn spec(num_classes: usize) -> ModelSpec {
    ModelSpec {
        num_classes,
        ..ModelSpec::default()
    }
}

fn labels() -> LabelTable {
    LabelTable::from_json(r#"{"1": "broccoli", "3": "cauliflower"}"#).unwrap()
}

fn sample_image() -> RgbImage {
    RgbImage::from_fn(8, 6, |x, y| Rgb([(x * 20) as u8, (y * 30) as u8, 128]))
}

fn classifier(backend: ScriptedBackend, num_classes: usize) -> Arc<Classifier<ScriptedBackend>> {
    Arc::new(Classifier::new(
        backend,
        Preprocessor::new(4, 127.5, 1.0),
        labels(),
        spec(num_classes),
    ))
}

#[test]
fn test_classify_calls_feed_run_fetch_in_order() {
    let backend = ScriptedBackend::new(vec![0.1, 0.5, 0.5, 0.2]);
    let calls = Arc::clone(&backend.calls);
    let fed = Arc::clone(&backend.fed);
    let classifier = classifier(backend, 4);

    let result = classifier.classify(&sample_image()).unwrap();

    assert_eq!(
        result,
        Classification {
            prediction: Some(Prediction {
                index: 1,
                confidence: 0.5
            }),
            label: "broccoli".to_string(),
        }
    );
    assert_eq!(result.to_string(), "broccoli : 50.00%");

    assert_eq!(
        *calls.lock().unwrap(),
        vec![
            "feed input_1 [1, 4, 4, 3] 48".to_string(),
            "run output_1".to_string(),
            "fetch output_1".to_string(),
        ]
    );

    let expected = Preprocessor::new(4, 127.5, 1.0)
        .preprocess(&sample_image())
        .unwrap();
    assert_eq!(*fed.lock().unwrap(), expected.as_slice());
}

#[test]
fn test_unconfident_scores_have_no_prediction() {
    let classifier = classifier(ScriptedBackend::new(vec![-1.0, -2.0, 0.0, -0.5]), 4);

    let result = classifier.classify(&sample_image()).unwrap();
    assert_eq!(result.prediction, None);
    assert_eq!(result.label, "");
    assert_eq!(result.to_string(), "no confident class");
}

#[test]
fn test_unknown_label_renders_empty() {
    let classifier = classifier(ScriptedBackend::new(vec![0.0, 0.0, 0.25, 0.0]), 4);

    let result = classifier.classify(&sample_image()).unwrap();
    assert_eq!(result.prediction.map(|p| p.index), Some(2));
    assert_eq!(result.to_string(), " : 25.00%");
}

#[test]
fn test_engine_failure_is_reported() {
    let mut backend = ScriptedBackend::new(vec![0.9; 4]);
    backend.fail_run = true;
    let classifier = classifier(backend, 4);

    let err = classifier.classify(&sample_image()).unwrap_err();
    assert!(matches!(err, ClassifyError::Inference(ref msg) if msg.contains("native run failed")));

    let outcome = Outcome::from(Err(err));
    assert_eq!(
        outcome.to_string(),
        "classification failed: Inference failed: native run failed"
    );
}

#[test]
fn test_output_size_mismatch() {
    let classifier = classifier(ScriptedBackend::new(vec![0.9, 0.1, 0.2]), 4);

    let err = classifier.classify(&sample_image()).unwrap_err();
    assert!(matches!(
        err,
        ClassifyError::OutputSize {
            expected: 4,
            actual: 3
        }
    ));
}

#[tokio::test]
async fn test_submit_resolves_once() {
    let classifier = classifier(ScriptedBackend::new(vec![0.0, 0.0, 0.0, 0.8]), 4);

    let pending = classifier.submit(sample_image()).unwrap();
    let result = pending.wait(Some(Duration::from_secs(5))).await.unwrap();

    assert_eq!(result.label, "cauliflower");
    assert!(!classifier.is_busy());
}

#[tokio::test]
async fn test_second_submission_rejected_while_in_flight() {
    let (backend, release) = ScriptedBackend::gated(vec![0.0, 0.6, 0.0, 0.0]);
    let classifier = classifier(backend, 4);

    let first = classifier.submit(sample_image()).unwrap();
    assert!(classifier.is_busy());
    assert!(matches!(
        classifier.submit(sample_image()),
        Err(ClassifyError::Busy)
    ));

    release.send(()).unwrap();
    let result = first.wait(Some(Duration::from_secs(5))).await.unwrap();
    assert_eq!(result.label, "broccoli");

    // Slot is free again once the result has been delivered.
    release.send(()).unwrap();
    let again = classifier.submit(sample_image()).unwrap();
    assert!(again.wait(Some(Duration::from_secs(5))).await.is_ok());
}

#[tokio::test]
async fn test_wait_times_out_on_hung_engine() {
    let (backend, release) = ScriptedBackend::gated(vec![0.0, 0.6, 0.0, 0.0]);
    let classifier = classifier(backend, 4);

    let pending = classifier.submit(sample_image()).unwrap();
    let err = pending
        .wait(Some(Duration::from_millis(50)))
        .await
        .unwrap_err();
    assert!(matches!(err, ClassifyError::Timeout(_)));

    // The abandoned request still holds the engine until it finishes.
    assert!(classifier.is_busy());
    release.send(()).unwrap();
    while classifier.is_busy() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(classifier.submit(sample_image()).is_ok());
}

#[test]
fn test_failed_submission_releases_slot() {
    let mut backend = ScriptedBackend::new(vec![0.5; 4]);
    backend.fail_run = true;
    let classifier = classifier(backend, 4);

    let err = classifier
        .submit(sample_image())
        .unwrap()
        .blocking_wait()
        .unwrap_err();
    assert!(matches!(err, ClassifyError::Inference(_)));
    assert!(!classifier.is_busy());
    assert!(classifier.submit(sample_image()).is_ok());
}

#[test]
fn test_worker_panic_is_observed() {
    let mut backend = ScriptedBackend::new(vec![0.5; 4]);
    backend.panic_run = true;
    let classifier = classifier(backend, 4);

    let err = classifier
        .submit(sample_image())
        .unwrap()
        .blocking_wait()
        .unwrap_err();
    assert!(matches!(err, ClassifyError::WorkerLost));
    assert!(!classifier.is_busy());

    // The engine lock was poisoned by the panic.
    assert!(matches!(
        classifier.classify(&sample_image()),
        Err(ClassifyError::EnginePoisoned)
    ));
}
