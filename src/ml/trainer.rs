// ============================================================
// Layer 5 — Fine-tuning Loop
// ============================================================
// Train + validate for a fixed number of epochs.
//
// Per optimiser step:
//   forward → cross-entropy → backward → clip → AdamW step
//   (lr taken from the linear warmup/decay schedule)
//
// Per epoch:
//   save checkpoint → mean train loss → validation loss and
//   weighted F1 → one row in metrics.csv
//
// Burn notes:
//   - Training runs on Autodiff<B>; model.valid() hands back the
//     same weights on the inner backend with dropout disabled.
//   - Gradients are rebuilt by every backward pass, so there is
//     no separate "zero grad" step.
//   - Gradients are clipped by their combined norm (clipping.rs)
//     before the step; the optimiser itself does no clipping.

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamWConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use indicatif::{ProgressBar, ProgressStyle};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::ClassifyBatcher, dataset::ClassifyDataset};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::classifier::BertForSequenceClassification;
use crate::ml::clipping::clip_grad_norm;
use crate::ml::evaluator::evaluate;
use crate::ml::schedule::LinearWarmupSchedule;

/// Number of batches `len` samples make at `batch_size`
pub fn batches_per_epoch(len: usize, batch_size: usize) -> usize {
    len.div_ceil(batch_size.max(1))
}

fn progress_bar(len: usize, epoch: usize) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("Epoch {prefix} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
    {
        bar.set_style(style.progress_chars("=>-"));
    }
    bar.set_prefix(epoch.to_string());
    bar
}

/// Fine-tune `model` and return it with the final weights.
pub fn train<B: AutodiffBackend>(
    cfg:      &TrainConfig,
    mut model: BertForSequenceClassification<B>,
    train_ds: ClassifyDataset,
    val_ds:   ClassifyDataset,
    ckpt:     &CheckpointManager,
    device:   &B::Device,
) -> Result<BertForSequenceClassification<B>> {
    B::seed(cfg.seed);

    let steps_per_epoch = batches_per_epoch(train_ds.sample_count(), cfg.batch_size);
    let schedule = LinearWarmupSchedule::new(cfg.lr, cfg.warmup_steps, steps_per_epoch * cfg.epochs);

    // ── Data loaders ──────────────────────────────────────────────────────────
    let train_loader = DataLoaderBuilder::new(ClassifyBatcher::<B>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .build(train_ds);

    // Validation stays in dataset order
    let val_loader = DataLoaderBuilder::new(ClassifyBatcher::<B::InnerBackend>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(val_ds);

    // ── AdamW ─────────────────────────────────────────────────────────────────
    let mut optim = AdamWConfig::new()
        .with_epsilon(cfg.adam_epsilon as f32)
        .with_weight_decay(cfg.weight_decay as f32)
        .init();

    let logger = MetricsLogger::new(ckpt.dir())?;
    let mut step    = 0usize;
    let mut best_f1 = f64::NEG_INFINITY;

    tracing::info!(
        "Fine-tuning for {} epochs, {} steps per epoch, lr={}",
        cfg.epochs,
        steps_per_epoch,
        cfg.lr
    );

    for epoch in 1..=cfg.epochs {
        // ── Training phase ────────────────────────────────────────────────────
        let bar = progress_bar(steps_per_epoch, epoch);
        let mut loss_sum  = 0.0f64;
        let mut n_batches = 0usize;

        for batch in train_loader.iter() {
            let (loss, _) = model.forward_loss(batch.input_ids, batch.attention_mask, batch.labels);

            let loss_val = loss.clone().into_scalar().elem::<f64>();
            loss_sum  += loss_val;
            n_batches += 1;

            let mut grads = GradientsParams::from_grads(loss.backward(), &model);
            if cfg.max_grad_norm > 0.0 {
                clip_grad_norm::<B, _>(&model, &mut grads, cfg.max_grad_norm);
            }
            model = optim.step(schedule.lr_at(step), model, grads);
            step += 1;

            bar.set_message(format!("training_loss={loss_val:.3}"));
            bar.inc(1);
        }
        bar.finish_and_clear();

        ckpt.save_model(&model, epoch)?;

        let train_loss = if n_batches > 0 { loss_sum / n_batches as f64 } else { f64::NAN };

        // ── Validation phase ──────────────────────────────────────────────────
        let eval    = evaluate(&model.valid(), val_loader.iter())?;
        let metrics = EpochMetrics::new(epoch, train_loss, eval.loss, eval.weighted_f1());

        println!("\nEpoch {epoch}");
        println!("Training loss: {:.6}", metrics.train_loss);
        println!("Validation loss: {:.6}", metrics.val_loss);
        println!("F1 Score (Weighted): {:.6}", metrics.val_f1);
        tracing::info!(
            "epoch={} train_loss={:.4} val_loss={:.4} val_f1={:.4}",
            epoch,
            metrics.train_loss,
            metrics.val_loss,
            metrics.val_f1
        );

        if metrics.is_improvement(best_f1) {
            best_f1 = metrics.val_f1;
            tracing::info!("Epoch {} is the best so far (val_f1={:.4})", epoch, best_f1);
        }
        logger.log(&metrics)?;
    }

    tracing::info!("Training complete after {} steps", step);
    Ok(model)
}
