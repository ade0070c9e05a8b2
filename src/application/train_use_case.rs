// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full fine-tuning pipeline in order:
//
//   Step 1: Load, filter and split the corpus  (Layer 4 - data)
//   Step 2: Fetch the pretrained model         (Layer 6 - infra)
//   Step 3: Import the tokenizer               (Layer 6 - infra)
//   Step 4: Read the encoder architecture      (Layer 5 - ml)
//   Step 5: Encode question/answer pairs       (Layer 4 - data)
//   Step 6: Save config, architecture, labels  (Layer 6 - infra)
//   Step 7: Pretrained encoder + fresh head    (Layer 5 - ml)
//   Step 8: Run the fine-tuning loop           (Layer 5 - ml)
//   Step 9: Report on validation and test      (Layer 5 - ml)

use anyhow::{bail, Result};
use burn::{backend::Autodiff, module::AutodiffModule, prelude::*, tensor::backend::AutodiffBackend};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::application::{
    corpus::{self, PreparedCorpus},
    report::{partition_report, PartitionReport},
};
use crate::data::{dataset::ClassifyDataset, encoder::PairEncoder, splitter::DEFAULT_SEED};
use crate::domain::record::Partition;
use crate::infra::{checkpoint::CheckpointManager, hub::ModelHub, tokenizer_store::TokenizerStore};
use crate::ml::{
    bert::BertConfig,
    device::{cpu_device, gpu_device, ComputeDevice, CpuBackend, GpuBackend},
    trainer,
    weights::PretrainedWeights,
};

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a run. Saved as train_config.json so
// `evaluate` and `predict` can rebuild the same setup later.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub data_path:      String,
    pub checkpoint_dir: String,
    pub model:          String,
    pub revision:       Option<String>,
    pub cache_dir:      Option<String>,
    pub max_length:     usize,
    pub batch_size:     usize,
    pub epochs:         usize,
    pub lr:             f64,
    pub adam_epsilon:   f64,
    pub weight_decay:   f64,
    pub warmup_steps:   usize,
    pub max_grad_norm:  f64,
    pub seed:           u64,
    pub device:         ComputeDevice,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_path:      "data/circa-data.tsv".to_string(),
            checkpoint_dir: "checkpoints".to_string(),
            model:          "bert-base-uncased".to_string(),
            revision:       None,
            cache_dir:      None,
            max_length:     25,
            batch_size:     32,
            epochs:         3,
            lr:             3e-5,
            adam_epsilon:   1e-8,
            weight_decay:   0.0,
            warmup_steps:   0,
            max_grad_norm:  1.0,
            seed:           DEFAULT_SEED,
            device:         ComputeDevice::Cpu,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        if self.epochs == 0 {
            bail!("epochs must be at least 1");
        }
        if self.lr <= 0.0 {
            bail!("lr must be positive, got {}", self.lr);
        }
        Ok(())
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

/// Tokenised partitions ready for the data loaders.
struct Encoded {
    train: ClassifyDataset,
    val:   ClassifyDataset,
    test:  ClassifyDataset,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline end to end and return the final reports
    /// (validation first, then test).
    pub fn execute(&self) -> Result<Vec<PartitionReport>> {
        let cfg = &self.config;
        cfg.validate()?;

        // ── Step 1: Corpus ────────────────────────────────────────────────────
        tracing::info!("Loading corpus from '{}'", cfg.data_path);
        let prepared = corpus::prepare(Path::new(&cfg.data_path), cfg.seed, None)?;

        // ── Step 2: Pretrained files ──────────────────────────────────────────
        let hub   = ModelHub::new(cfg.revision.clone(), cfg.cache_dir.as_ref().map(PathBuf::from));
        let files = hub.fetch(&cfg.model)?;

        // ── Step 3: Tokenizer (copied into the checkpoint dir) ────────────────
        let ckpt      = CheckpointManager::new(&cfg.checkpoint_dir)?;
        let tokenizer = TokenizerStore::new(ckpt.dir())
            .import(files.tokenizer_json.as_deref(), files.vocab_txt.as_deref())?;

        // ── Step 4: Architecture ──────────────────────────────────────────────
        let bert_cfg = BertConfig::from_json_file(&files.config)?;
        if cfg.max_length > bert_cfg.max_position_embeddings {
            bail!(
                "max_length {} exceeds the model's {} positions",
                cfg.max_length,
                bert_cfg.max_position_embeddings
            );
        }

        // ── Step 5: Encode ────────────────────────────────────────────────────
        let encoder = PairEncoder::new(&tokenizer, cfg.max_length)?;
        let encoded = Encoded {
            train: ClassifyDataset::new(encoder.encode_all(&prepared.train)?),
            val:   ClassifyDataset::new(encoder.encode_all(&prepared.val)?),
            test:  ClassifyDataset::new(encoder.encode_all(&prepared.test)?),
        };

        // ── Step 6: Side files for evaluate/predict ───────────────────────────
        ckpt.save_config(cfg)?;
        ckpt.save_bert_config(&bert_cfg)?;
        ckpt.save_labels(&prepared.labels)?;

        // ── Steps 7-9: Backend-specific part ──────────────────────────────────
        tracing::info!("Training on {}", cfg.device);
        match cfg.device {
            ComputeDevice::Cpu => {
                self.run::<Autodiff<CpuBackend>>(&prepared, &bert_cfg, &files.weights, encoded, &ckpt, &cpu_device())
            }
            ComputeDevice::Wgpu => {
                self.run::<Autodiff<GpuBackend>>(&prepared, &bert_cfg, &files.weights, encoded, &ckpt, &gpu_device())
            }
        }
    }

    fn run<B: AutodiffBackend>(
        &self,
        prepared: &PreparedCorpus,
        bert_cfg: &BertConfig,
        weights:  &Path,
        encoded:  Encoded,
        ckpt:     &CheckpointManager,
        device:   &B::Device,
    ) -> Result<Vec<PartitionReport>> {
        let cfg = &self.config;
        B::seed(cfg.seed);

        // Fresh head on top of the pretrained encoder
        let mut model = bert_cfg.init_classifier::<B>(prepared.labels.len(), device);
        let pretrained = PretrainedWeights::from_safetensors(weights)?;
        model.bert = pretrained.apply(model.bert, device)?;
        tracing::info!(
            "Loaded {} pretrained tensors; classifier head has {} outputs",
            pretrained.len(),
            prepared.labels.len()
        );

        let model = trainer::train(cfg, model, encoded.train, encoded.val.clone(), ckpt, device)?;

        let model = model.valid();
        let names = prepared.labels.names();
        Ok(vec![
            partition_report(&model, encoded.val, cfg.batch_size, device, Partition::Val, names)?,
            partition_report(&model, encoded.test, cfg.batch_size, device, Partition::Test, names)?,
        ])
    }
}
