use crate::{
    backend::{InferenceBackend, ModelSpec},
    error::ClassifyError,
    labels::{LabelTable, resolve_label},
    processing::{Prediction, decode_top1},
};
use common::span;
use image::RgbImage;
use opentelemetry::{
    global,
    metrics::{Counter, Histogram},
};
use preprocess::Preprocessor;
use std::fmt;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

/// Decoded top-1 result with its resolved label.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub prediction: Option<Prediction>,
    pub label: String,
}

struct ClassifierMetrics {
    duration: Histogram<f64>,
    classified: Counter<u64>,
    failures: Counter<u64>,
    unconfident: Counter<u64>,
}

impl ClassifierMetrics {
    fn new(meter_name: &'static str) -> Self {
        let meter = global::meter(meter_name);
        let latency_buckets = [
            0.005, 0.01, 0.02, 0.05, 0.075, 0.1, 0.15, 0.2, 0.3, 0.5, 0.75, 1.0, 2.0, 5.0,
        ];
        Self {
            duration: meter
                .f64_histogram("inference_duration_seconds")
                .with_description("Time to classify one image (preprocess + infer + decode)")
                .with_unit("s")
                .with_boundaries(latency_buckets.to_vec())
                .build(),
            classified: meter
                .u64_counter("classifications_total")
                .with_description("Total images classified")
                .build(),
            failures: meter
                .u64_counter("classification_failures_total")
                .with_description("Total classification requests that failed")
                .build(),
            unconfident: meter
                .u64_counter("classifications_unconfident_total")
                .with_description("Classifications where no class scored above zero")
                .build(),
        }
    }
}

/// Owns the inference engine and runs the full image-to-label pipeline.
///
/// The engine sits behind a mutex so at most one feed/run/fetch sequence
/// touches it at a time; [`Classifier::submit`] additionally rejects a second
/// request while one is still running.
pub struct Classifier<B: InferenceBackend> {
    backend: Mutex<B>,
    preprocessor: Preprocessor,
    labels: LabelTable,
    model: ModelSpec,
    in_flight: AtomicBool,
    metrics: ClassifierMetrics,
}

impl<B: InferenceBackend> fmt::Debug for Classifier<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classifier")
            .field("preprocessor", &self.preprocessor)
            .field("labels", &self.labels.len())
            .field("model", &self.model)
            .field("in_flight", &self.in_flight.load(Ordering::Relaxed))
            .finish()
    }
}

impl<B: InferenceBackend> Classifier<B> {
    pub fn new(
        backend: B,
        preprocessor: Preprocessor,
        labels: LabelTable,
        model: ModelSpec,
    ) -> Self {
        Self {
            backend: Mutex::new(backend),
            preprocessor,
            labels,
            model,
            in_flight: AtomicBool::new(false),
            metrics: ClassifierMetrics::new("classifier"),
        }
    }

    /// Classify synchronously on the calling thread.
    pub fn classify(&self, image: &RgbImage) -> Result<Classification, ClassifyError> {
        let _span = tracing::info_span!(
            "classify",
            width = image.width(),
            height = image.height()
        )
        .entered();

        let start = Instant::now();
        let result = self.run_pipeline(image);
        self.metrics
            .duration
            .record(start.elapsed().as_secs_f64(), &[]);

        match &result {
            Ok(classification) => {
                self.metrics.classified.add(1, &[]);
                match classification.prediction {
                    Some(prediction) => tracing::debug!(
                        index = prediction.index,
                        confidence = prediction.confidence,
                        label = %classification.label,
                        "Image classified"
                    ),
                    None => {
                        self.metrics.unconfident.add(1, &[]);
                        tracing::debug!("No class scored above zero");
                    }
                }
            }
            Err(e) => {
                self.metrics.failures.add(1, &[]);
                tracing::error!(error = %e, "Classification failed");
            }
        }

        result
    }

    fn run_pipeline(&self, image: &RgbImage) -> Result<Classification, ClassifyError> {
        let tensor = self.preprocessor.preprocess(image)?;
        let shape = self.preprocessor.input_shape();

        let mut scores = vec![0.0f32; self.model.num_classes];
        let produced = {
            let _s = span!("model_inference");
            let mut backend = self
                .backend
                .lock()
                .map_err(|_| ClassifyError::EnginePoisoned)?;

            backend
                .feed(&self.model.input_name, &tensor, &shape)
                .map_err(ClassifyError::inference)?;
            backend
                .run(&[self.model.output_name.as_str()])
                .map_err(ClassifyError::inference)?;
            backend
                .fetch(&self.model.output_name, &mut scores)
                .map_err(ClassifyError::inference)?
        };

        if produced != self.model.num_classes {
            return Err(ClassifyError::OutputSize {
                expected: self.model.num_classes,
                actual: produced,
            });
        }

        let prediction = decode_top1(&scores);
        let label = resolve_label(&self.labels, prediction).to_string();

        Ok(Classification { prediction, label })
    }
}

impl<B: InferenceBackend + 'static> Classifier<B> {
    /// Classify on a worker thread. The returned [`Pending`] resolves exactly
    /// once with the result or the failure.
    ///
    /// Fails with [`ClassifyError::Busy`] while an earlier submission is still
    /// running, including one whose caller already gave up waiting.
    pub fn submit(self: &Arc<Self>, image: RgbImage) -> Result<Pending, ClassifyError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("Rejecting classification request, one is already in flight");
            return Err(ClassifyError::Busy);
        }

        let (tx, rx) = oneshot::channel();
        let this = Arc::clone(self);

        let spawned = thread::Builder::new()
            .name("classifier-worker".to_string())
            .spawn(move || {
                let slot = InFlightSlot(&this.in_flight);
                let result = this.classify(&image);
                // Free the slot before the caller can observe the result.
                drop(slot);
                if tx.send(result).is_err() {
                    tracing::debug!("Classification result dropped, caller stopped waiting");
                }
            });

        if let Err(e) = spawned {
            self.in_flight.store(false, Ordering::Release);
            return Err(ClassifyError::Spawn(e));
        }

        Ok(Pending { rx })
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// Releases the in-flight flag on drop, including when the worker panics.
struct InFlightSlot<'a>(&'a AtomicBool);

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Completion handle for a submitted classification.
#[derive(Debug)]
pub struct Pending {
    rx: oneshot::Receiver<Result<Classification, ClassifyError>>,
}

impl Pending {
    /// Await the result, giving up after `timeout` when one is set.
    pub async fn wait(self, timeout: Option<Duration>) -> Result<Classification, ClassifyError> {
        let received = match timeout {
            Some(limit) => tokio::time::timeout(limit, self.rx)
                .await
                .map_err(|_| ClassifyError::Timeout(limit))?,
            None => self.rx.await,
        };
        received.map_err(|_| ClassifyError::WorkerLost)?
    }

    /// Block the current (non-async) thread until the result arrives.
    pub fn blocking_wait(self) -> Result<Classification, ClassifyError> {
        self.rx
            .blocking_recv()
            .map_err(|_| ClassifyError::WorkerLost)?
    }
}
