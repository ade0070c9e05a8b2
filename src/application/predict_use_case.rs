// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Classifies one question/answer pair with a saved checkpoint.
// The backend is picked at runtime, so the classifier is held
// behind the PairClassifier trait.

use anyhow::Result;
use std::path::Path;

use crate::domain::traits::PairClassifier;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    device::{cpu_device, gpu_device, ComputeDevice, CpuBackend, GpuBackend},
    inferencer::Inferencer,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label:         String,
    /// Every label with its probability, most likely first
    pub probabilities: Vec<(String, f32)>,
}

impl std::fmt::Display for Prediction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Prediction: {}", self.label)?;
        for (name, p) in &self.probabilities {
            writeln!(f, "  {p:.4}  {name}")?;
        }
        Ok(())
    }
}

pub struct PredictUseCase {
    classifier: Box<dyn PairClassifier>,
    labels:     Vec<String>,
}

impl PredictUseCase {
    pub fn new(checkpoint_dir: impl AsRef<Path>, epoch: Option<usize>, device: Option<ComputeDevice>) -> Result<Self> {
        let ckpt   = CheckpointManager::new(checkpoint_dir)?;
        let device = match device {
            Some(d) => d,
            None    => ckpt.load_config()?.device,
        };

        let classifier: Box<dyn PairClassifier> = match device {
            ComputeDevice::Cpu  => Box::new(Inferencer::<CpuBackend>::from_checkpoint(&ckpt, epoch, cpu_device())?),
            ComputeDevice::Wgpu => Box::new(Inferencer::<GpuBackend>::from_checkpoint(&ckpt, epoch, gpu_device())?),
        };
        let labels = ckpt.load_labels()?.names().to_vec();
        Ok(Self::with_classifier(classifier, labels))
    }

    pub fn with_classifier(classifier: Box<dyn PairClassifier>, labels: Vec<String>) -> Self {
        Self { classifier, labels }
    }

    pub fn predict(&self, question: &str, answer: &str) -> Result<Prediction> {
        let (label, probs) = self.classifier.classify(question, answer)?;

        let mut probabilities: Vec<(String, f32)> = self
            .labels
            .iter()
            .cloned()
            .zip(probs)
            .collect();
        probabilities.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(Prediction { label, probabilities })
    }
}
