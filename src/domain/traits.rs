// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer talks to data sources and trained
// models through these traits only, so the TSV reader or the
// burn-backed classifier can be swapped without touching the
// use cases.

use anyhow::Result;
use crate::domain::record::AnswerRecord;

// ─── RecordSource ─────────────────────────────────────────────────────────────
/// Any component that can produce annotated question/answer rows.
///
/// Implementations:
///   - TsvLoader → reads the tab-separated corpus file
pub trait RecordSource {
    fn load_all(&self) -> Result<Vec<AnswerRecord>>;
}

// ─── PairClassifier ───────────────────────────────────────────────────────────
/// Anything that can judge what an answer means for a question.
///
/// Implementations:
///   - Inferencer → fine-tuned BERT checkpoint
pub trait PairClassifier {
    /// Returns the predicted label name and the probability of
    /// every class, indexed by class id.
    fn classify(&self, question: &str, answer: &str) -> Result<(String, Vec<f32>)>;
}
