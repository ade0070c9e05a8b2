// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Loads a fine-tuned checkpoint and classifies single
// question/answer pairs.
use anyhow::{anyhow, Result};
use burn::{prelude::*, tensor::activation::softmax};
use tokenizers::Tokenizer;

use crate::data::encoder::PairEncoder;
use crate::domain::labels::LabelMap;
use crate::domain::traits::PairClassifier;
use crate::infra::{checkpoint::CheckpointManager, tokenizer_store::TokenizerStore};
use crate::ml::classifier::BertForSequenceClassification;
use crate::ml::scoring::argmax_rows;

pub struct Inferencer<B: Backend> {
    model:      BertForSequenceClassification<B>,
    tokenizer:  Tokenizer,
    labels:     LabelMap,
    max_length: usize,
    device:     B::Device,
}

impl<B: Backend> Inferencer<B> {
    pub fn new(
        model:      BertForSequenceClassification<B>,
        tokenizer:  Tokenizer,
        labels:     LabelMap,
        max_length: usize,
        device:     B::Device,
    ) -> Self {
        Self { model, tokenizer, labels, max_length, device }
    }

    /// Rebuild the classifier saved in `ckpt` (latest epoch unless given).
    pub fn from_checkpoint(ckpt: &CheckpointManager, epoch: Option<usize>, device: B::Device) -> Result<Self> {
        let train_cfg = ckpt.load_config()?;
        let bert_cfg  = ckpt.load_bert_config()?;
        let labels    = ckpt.load_labels()?;
        let tokenizer = TokenizerStore::new(ckpt.dir()).load()?;

        let model = bert_cfg.init_classifier::<B>(labels.len(), &device);
        let model = ckpt.load_model(model, epoch, &device)?;
        tracing::info!("Classifier loaded with {} labels", labels.len());

        Ok(Self::new(model, tokenizer, labels, train_cfg.max_length, device))
    }

    pub fn model(&self) -> &BertForSequenceClassification<B> {
        &self.model
    }

    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    /// Class probabilities for one pair, indexed by class id.
    pub fn probabilities(&self, question: &str, answer: &str) -> Result<Vec<f32>> {
        let encoder = PairEncoder::new(&self.tokenizer, self.max_length)?;
        let (ids, mask) = encoder.encode(question, answer)?;

        let to_tensor = |v: &[u32]| {
            let v: Vec<i32> = v.iter().map(|&x| x as i32).collect();
            Tensor::<B, 1, Int>::from_ints(v.as_slice(), &self.device).reshape([1, v.len()])
        };

        let logits = self.model.forward(to_tensor(&ids), to_tensor(&mask));
        softmax(logits, 1)
            .into_data()
            .convert::<f32>()
            .to_vec()
            .map_err(|e| anyhow!("Cannot read probabilities: {e:?}"))
    }
}

impl<B: Backend> PairClassifier for Inferencer<B> {
    fn classify(&self, question: &str, answer: &str) -> Result<(String, Vec<f32>)> {
        let probs = self.probabilities(question, answer)?;
        let best  = argmax_rows(std::slice::from_ref(&probs))[0];
        let name  = self
            .labels
            .name(best)
            .ok_or_else(|| anyhow!("Model predicted class {best}, which has no label"))?
            .to_string();

        tracing::debug!("'{}' / '{}' → {} ({:.4})", question, answer, name, probs[best]);
        Ok((name, probs))
    }
}
