// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// one goal per command (train, evaluate, predict, stats).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1); use cases return
//     values that implement Display
//   - Only workflow coordination

// Load → filter → label ids → split, shared by train and evaluate
pub mod corpus;

// Loss / F1 / per-class tables for one partition
pub mod report;

// The fine-tuning workflow
pub mod train_use_case;

// Re-scoring a saved checkpoint
pub mod evaluate_use_case;

// Classifying a single question/answer pair
pub mod predict_use_case;

// Corpus distribution tables
pub mod stats_use_case;
