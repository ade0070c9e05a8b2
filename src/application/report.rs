// ============================================================
// Layer 2 — Partition Reports
// ============================================================
// Runs a trained classifier over one partition and collects
// everything the CLI prints about it: mean loss, weighted F1,
// per-class accuracy and the precision/recall table.

use anyhow::Result;
use burn::{data::dataloader::DataLoaderBuilder, prelude::*};

use crate::data::{batcher::ClassifyBatcher, dataset::ClassifyDataset};
use crate::domain::record::Partition;
use crate::ml::{
    classifier::BertForSequenceClassification,
    evaluator::evaluate,
    scoring::{accuracy_per_class, render_accuracy, ClassificationReport},
};

const REPORT_DIGITS: usize = 3;

#[derive(Debug, Clone)]
pub struct PartitionReport {
    pub partition:   Partition,
    pub rows:        usize,
    pub loss:        f64,
    pub weighted_f1: f64,
    pub accuracy:    String,
    pub table:       String,
}

impl std::fmt::Display for PartitionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "==== {} ====", self.partition)?;
        writeln!(f, "Loss: {:.6}", self.loss)?;
        writeln!(f, "F1 Score (Weighted): {:.6}\n", self.weighted_f1)?;
        writeln!(f, "{}", self.accuracy)?;
        write!(f, "{}", self.table)
    }
}

/// Evaluate `model` on `dataset` in order. Pass the inner-backend
/// model (`model.valid()`) so dropout is off.
pub fn partition_report<B: Backend>(
    model:      &BertForSequenceClassification<B>,
    dataset:    ClassifyDataset,
    batch_size: usize,
    device:     &B::Device,
    partition:  Partition,
    names:      &[String],
) -> Result<PartitionReport> {
    let rows = dataset.sample_count();
    tracing::info!("Evaluating {} partition ({} rows)", partition, rows);

    let loader = DataLoaderBuilder::new(ClassifyBatcher::<B>::new(device.clone()))
        .batch_size(batch_size)
        .num_workers(1)
        .build(dataset);

    let out   = evaluate(model, loader.iter())?;
    let preds = out.predictions();

    Ok(PartitionReport {
        partition,
        rows,
        loss:        out.loss,
        weighted_f1: out.weighted_f1(),
        accuracy:    render_accuracy(&accuracy_per_class(&preds, &out.labels), names),
        table:       ClassificationReport::new(&preds, &out.labels, names).render(REPORT_DIGITS),
    })
}
