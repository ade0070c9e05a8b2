// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Runs a model over batches without tracking gradients and
// collects what the scoring functions need:
//
//   loss    - mean of the per-batch mean cross-entropy
//   logits  - one row of class scores per sample, in batch order
//   labels  - gold class ids, aligned with logits
//
// Call it with a model on the inner (non-autodiff) backend,
// e.g. `model.valid()`, so dropout is off and no graph is built.

use anyhow::{anyhow, Result};
use burn::prelude::*;

use crate::data::batcher::ClassifyBatch;
use crate::ml::classifier::BertForSequenceClassification;
use crate::ml::scoring::{argmax_rows, weighted_f1};

#[derive(Debug, Clone, Default)]
pub struct EvalOutput {
    pub loss:   f64,
    pub logits: Vec<Vec<f32>>,
    pub labels: Vec<usize>,
}

impl EvalOutput {
    pub fn predictions(&self) -> Vec<usize> {
        argmax_rows(&self.logits)
    }

    pub fn weighted_f1(&self) -> f64 {
        weighted_f1(&self.predictions(), &self.labels)
    }
}

pub fn evaluate<B, I>(model: &BertForSequenceClassification<B>, batches: I) -> Result<EvalOutput>
where
    B: Backend,
    I: IntoIterator<Item = ClassifyBatch<B>>,
{
    let mut out       = EvalOutput::default();
    let mut loss_sum  = 0.0f64;
    let mut n_batches = 0usize;

    for batch in batches {
        let (loss, logits) = model.forward_loss(batch.input_ids, batch.attention_mask, batch.labels.clone());
        loss_sum  += loss.into_scalar().elem::<f64>();
        n_batches += 1;

        let [rows, classes] = logits.dims();
        let flat: Vec<f32> = logits
            .into_data()
            .convert::<f32>()
            .to_vec()
            .map_err(|e| anyhow!("Cannot read logits: {e:?}"))?;
        out.logits.extend((0..rows).map(|r| flat[r * classes..(r + 1) * classes].to_vec()));

        out.labels.extend(batch.labels.into_data().iter::<i64>().map(|l| l as usize));
    }

    out.loss = if n_batches > 0 { loss_sum / n_batches as f64 } else { f64::NAN };
    Ok(out)
}
