// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// From the TSV corpus to tensor batches:
//
//   corpus.tsv
//       │
//       ▼
//   TsvLoader         → rows with question, answer, gold labels
//       │
//       ▼
//   Preprocessor      → drops unlabelled / "Other" rows, cleans text
//       │
//       ▼
//   splitter          → stratified train / val / test assignment
//       │
//       ▼
//   PairEncoder       → [CLS] q [SEP] a [SEP] ids + attention mask
//       │
//       ▼
//   ClassifyDataset   → burn Dataset
//       │
//       ▼
//   ClassifyBatcher   → burn Batcher, feeds the DataLoader

pub mod loader;

pub mod preprocessor;

pub mod splitter;

pub mod encoder;

pub mod dataset;

pub mod batcher;
