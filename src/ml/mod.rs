// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Everything that touches burn tensors or modules lives here.
//
//   bert.rs       - BERT encoder laid out like the hub checkpoints
//   classifier.rs - encoder + dropout + linear classification head
//   weights.rs    - copies model.safetensors into the burn modules
//   schedule.rs   - linear warmup / linear decay learning rate
//   clipping.rs   - rescales gradients by their combined L2 norm
//   trainer.rs    - AdamW fine-tuning loop with per-epoch validation
//   evaluator.rs  - gradient-free pass collecting loss and logits
//   scoring.rs    - weighted F1, per-class accuracy, reports
//   inferencer.rs - classify single pairs from a saved checkpoint
//   device.rs     - CPU / GPU backend selection

pub mod bert;

pub mod classifier;

pub mod weights;

pub mod schedule;

pub mod clipping;

pub mod trainer;

pub mod evaluator;

pub mod scoring;

pub mod inferencer;

pub mod device;
