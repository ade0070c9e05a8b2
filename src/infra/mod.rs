// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns shared by the use cases:
//
//   hub.rs             - finds pretrained files locally or on
//                        the Hugging Face Hub
//   tokenizer_store.rs - loads/builds the WordPiece tokenizer and
//                        keeps a copy with the checkpoints
//   checkpoint.rs      - burn full-precision recorder weights plus the
//                        JSON side files needed to rebuild a model
//   metrics.rs         - per-epoch CSV log

pub mod hub;

pub mod tokenizer_store;

pub mod checkpoint;

pub mod metrics;
