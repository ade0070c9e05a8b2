// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs and traits describing the corpus:
//
//   record.rs - one annotated question/answer row
//   labels.rs - gold-standard label ↔ class id mapping
//   traits.rs - abstractions the application layer depends on
//
// Rules for this layer:
//   - NO burn types
//   - NO file I/O
//   - NO tokenizer code

pub mod record;

pub mod labels;

pub mod traits;
