// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Re-scores a saved checkpoint without training:
//
//   Step 1: Read train_config.json and labels.json
//   Step 2: Re-derive the split from the data file (same seed,
//           same label ids → same validation and test rows)
//   Step 3: Rebuild the classifier for the chosen epoch
//   Step 4: Report on validation and test

use anyhow::Result;
use burn::prelude::*;
use std::path::{Path, PathBuf};

use crate::application::{
    corpus,
    report::{partition_report, PartitionReport},
};
use crate::data::{dataset::ClassifyDataset, encoder::PairEncoder};
use crate::domain::record::Partition;
use crate::infra::{checkpoint::CheckpointManager, tokenizer_store::TokenizerStore};
use crate::ml::{
    device::{cpu_device, gpu_device, ComputeDevice, CpuBackend, GpuBackend},
    inferencer::Inferencer,
};

pub struct EvaluateUseCase {
    checkpoint_dir: PathBuf,
    data_path:      Option<PathBuf>,
    epoch:          Option<usize>,
    device:         Option<ComputeDevice>,
}

impl EvaluateUseCase {
    /// `data_path` and `device` fall back to the values saved at training time.
    pub fn new(
        checkpoint_dir: impl Into<PathBuf>,
        data_path:      Option<PathBuf>,
        epoch:          Option<usize>,
        device:         Option<ComputeDevice>,
    ) -> Self {
        Self { checkpoint_dir: checkpoint_dir.into(), data_path, epoch, device }
    }

    pub fn execute(&self) -> Result<Vec<PartitionReport>> {
        let ckpt   = CheckpointManager::new(&self.checkpoint_dir)?;
        let cfg    = ckpt.load_config()?;
        let labels = ckpt.load_labels()?;

        let data_path = self.data_path.clone().unwrap_or_else(|| PathBuf::from(&cfg.data_path));
        tracing::info!("Re-deriving partitions from '{}'", data_path.display());
        let prepared = corpus::prepare(&data_path, cfg.seed, Some(labels))?;

        let tokenizer = TokenizerStore::new(ckpt.dir()).load()?;
        let encoder   = PairEncoder::new(&tokenizer, cfg.max_length)?;
        let val  = ClassifyDataset::new(encoder.encode_all(&prepared.val)?);
        let test = ClassifyDataset::new(encoder.encode_all(&prepared.test)?);

        let device = self.device.unwrap_or(cfg.device);
        match device {
            ComputeDevice::Cpu  => self.run::<CpuBackend>(&ckpt, cfg.batch_size, val, test, cpu_device()),
            ComputeDevice::Wgpu => self.run::<GpuBackend>(&ckpt, cfg.batch_size, val, test, gpu_device()),
        }
    }

    fn run<B: Backend>(
        &self,
        ckpt:       &CheckpointManager,
        batch_size: usize,
        val:        ClassifyDataset,
        test:       ClassifyDataset,
        device:     B::Device,
    ) -> Result<Vec<PartitionReport>> {
        let inferencer = Inferencer::<B>::from_checkpoint(ckpt, self.epoch, device.clone())?;
        let names      = inferencer.labels().names();

        Ok(vec![
            partition_report(inferencer.model(), val, batch_size, &device, Partition::Val, names)?,
            partition_report(inferencer.model(), test, batch_size, &device, Partition::Test, names)?,
        ])
    }

    pub fn checkpoint_dir(&self) -> &Path {
        &self.checkpoint_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{
        predict_use_case::PredictUseCase,
        train_use_case::{TrainConfig, TrainUseCase},
    };
    use crate::ml::bert::tests::tiny_config;
    use crate::ml::weights::tests::{checkpoint_for, write_safetensors};

    const VOCAB: &[&str] = &[
        "[PAD]", "[UNK]", "[CLS]", "[SEP]", "[MASK]",
        "are", "you", "hungry", "is", "it", "done", "i", "just", "ate",
        "yes", "no", "maybe", "sure", "not", "really", "?", ".",
    ];

    const LABELS: [&str; 3] = ["Yes", "No", "In the middle, neither yes nor no"];

    /// A tiny pretrained model directory: config.json, model.safetensors, vocab.txt
    fn write_pretrained(dir: &Path) {
        let cfg = tiny_config();
        std::fs::write(dir.join("config.json"), serde_json::to_string(&cfg).unwrap()).unwrap();
        write_safetensors(&checkpoint_for(&cfg, "bert."), &dir.join("model.safetensors"));
        std::fs::write(dir.join("vocab.txt"), VOCAB.join("\n")).unwrap();
    }

    fn write_corpus(path: &Path) {
        let answers = ["sure .", "i just ate .", "maybe not really ."];
        let mut tsv = String::from("context\tquestion-X\tanswer-Y\tgoldstandard1\tgoldstandard2\n");
        for i in 0..30 {
            let label = LABELS[i % 3];
            tsv.push_str(&format!("friends\tare you hungry ?\t{}\t{label}\t{label}\n", answers[i % 3]));
        }
        // Dropped by the label filter
        tsv.push_str("friends\tis it done ?\tnot really .\tOther\tOther\n");
        std::fs::write(path, tsv).unwrap();
    }

    #[test]
    fn test_train_then_evaluate_then_predict() {
        let dir        = tempfile::tempdir().unwrap();
        let pretrained = dir.path().join("pretrained");
        let ckpt_dir   = dir.path().join("ckpt");
        let data_path  = dir.path().join("circa.tsv");
        std::fs::create_dir_all(&pretrained).unwrap();
        write_pretrained(&pretrained);
        write_corpus(&data_path);

        let cfg = TrainConfig {
            data_path:      data_path.display().to_string(),
            checkpoint_dir: ckpt_dir.display().to_string(),
            model:          pretrained.display().to_string(),
            max_length:     12,
            batch_size:     4,
            epochs:         1,
            lr:             1e-3,
            device:         ComputeDevice::Cpu,
            ..TrainConfig::default()
        };
        let trained = TrainUseCase::new(cfg.clone()).execute().unwrap();
        assert_eq!(trained.len(), 2);

        // Same partitions as training: val then test, same row counts
        let labels   = CheckpointManager::new(&ckpt_dir).unwrap().load_labels().unwrap();
        let prepared = corpus::prepare(&data_path, cfg.seed, Some(labels.clone())).unwrap();

        let reports = EvaluateUseCase::new(&ckpt_dir, None, None, Some(ComputeDevice::Cpu))
            .execute()
            .unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].partition, Partition::Val);
        assert_eq!(reports[0].rows, prepared.val.len());
        assert_eq!(reports[1].partition, Partition::Test);
        assert_eq!(reports[1].rows, prepared.test.len());
        assert_eq!(reports[0].rows + reports[1].rows + prepared.train.len(), 30);
        for report in &reports {
            assert!(report.loss.is_finite());
            assert!((0.0..=1.0).contains(&report.weighted_f1));
        }
        assert_eq!(reports[1].rows, trained[1].rows);

        let prediction = PredictUseCase::new(&ckpt_dir, None, Some(ComputeDevice::Cpu))
            .unwrap()
            .predict("are you hungry ?", "i just ate .")
            .unwrap();
        assert!(labels.id(&prediction.label).is_some());
        assert_eq!(prediction.probabilities.len(), LABELS.len());
        let total: f32 = prediction.probabilities.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_missing_checkpoint_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let uc  = EvaluateUseCase::new(dir.path(), None, None, Some(ComputeDevice::Cpu));
        assert!(uc.execute().is_err());
        assert_eq!(uc.checkpoint_dir(), dir.path());
    }
}
