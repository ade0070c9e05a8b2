// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores fine-tuned classifiers with burn's
// a full-precision MessagePack + gzip recorder, plus the JSON side files
// needed to rebuild the model before the weights go back in.
//
//   checkpoints/
//     finetuned_bert_epoch_1.mpk.gz   ← weights after epoch 1
//     finetuned_bert_epoch_2.mpk.gz
//     latest_epoch.json               ← number of the newest epoch
//     train_config.json               ← run hyperparameters
//     bert_config.json                ← encoder architecture
//     labels.json                     ← class id ↔ label name
//     tokenizer.json                  ← written by TokenizerStore
//     metrics.csv                     ← written by MetricsLogger

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::application::train_use_case::TrainConfig;
use crate::domain::labels::LabelMap;
use crate::ml::bert::BertConfig;
use crate::ml::classifier::BertForSequenceClassification;

/// f32 weights on disk, so re-scoring sees exactly the trained model
type WeightsRecorder = NamedMpkGzFileRecorder<FullPrecisionSettings>;

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't exist yet.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint dir '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn model_path(&self, epoch: usize) -> PathBuf {
        // The recorder appends its own extension
        self.dir.join(format!("finetuned_bert_epoch_{epoch}"))
    }

    /// Save weights for `epoch` and move the latest-epoch pointer.
    pub fn save_model<B: Backend>(
        &self,
        model: &BertForSequenceClassification<B>,
        epoch: usize,
    ) -> Result<()> {
        let path = self.model_path(epoch);

        WeightsRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        self.write_json("latest_epoch.json", &epoch)?;
        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Restore weights into `model`, from `epoch` or else the latest one.
    /// `model` must have the architecture the checkpoint was saved with.
    pub fn load_model<B: Backend>(
        &self,
        model:  BertForSequenceClassification<B>,
        epoch:  Option<usize>,
        device: &B::Device,
    ) -> Result<BertForSequenceClassification<B>> {
        let epoch = match epoch {
            Some(e) => e,
            None    => self.latest_epoch()?,
        };
        let path = self.model_path(epoch);

        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = WeightsRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?", path.display())
            })?;

        Ok(model.load_record(record))
    }

    pub fn latest_epoch(&self) -> Result<usize> {
        self.read_json("latest_epoch.json")
            .context("No finished epoch found. Have you run 'train' first?")
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        self.write_json("train_config.json", cfg)
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        self.read_json("train_config.json")
    }

    pub fn save_bert_config(&self, cfg: &BertConfig) -> Result<()> {
        self.write_json("bert_config.json", cfg)
    }

    pub fn load_bert_config(&self) -> Result<BertConfig> {
        self.read_json("bert_config.json")
    }

    pub fn save_labels(&self, labels: &LabelMap) -> Result<()> {
        self.write_json("labels.json", labels)
    }

    pub fn load_labels(&self) -> Result<LabelMap> {
        self.read_json("labels.json")
    }

    fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json).with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Wrote '{}'", path.display());
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("Malformed JSON in '{}'", path.display()))
    }
}
