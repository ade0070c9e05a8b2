// ============================================================
// Layer 3 — AnswerRecord Domain Type
// ============================================================
// One row of the indirect-answer corpus: a yes/no question,
// the answer that was actually given, the scenario it was
// asked in, and the annotators' interpretations.
//
// Example:
//   Context:  "Y has just travelled from a different city to meet X."
//   Question: "Do you want to go for a walk?"
//   Answer:   "I'm exhausted."
//   Gold (relaxed): "No"
//
// Two gold standards exist. The strict one keeps fine-grained
// classes ("Probably yes / sometimes yes", ...). The relaxed one
// folds them into a handful of classes and is what we train on.

use serde::{Deserialize, Serialize};

/// A raw annotated question/answer row as read from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    /// Scenario the exchange takes place in
    pub context: String,

    /// The polar question asked by X
    pub question: String,

    /// Y's indirect answer
    pub answer: String,

    /// Strict interpretation (may be missing)
    pub goldstandard1: Option<String>,

    /// Relaxed interpretation (may be missing)
    pub goldstandard2: Option<String>,
}

impl AnswerRecord {
    pub fn new(
        context:  impl Into<String>,
        question: impl Into<String>,
        answer:   impl Into<String>,
        goldstandard2: Option<&str>,
    ) -> Self {
        Self {
            context:       context.into(),
            question:      question.into(),
            answer:        answer.into(),
            goldstandard1: None,
            goldstandard2: goldstandard2.map(str::to_string),
        }
    }

    /// The relaxed label, if the row has one
    pub fn relaxed_label(&self) -> Option<&str> {
        self.goldstandard2.as_deref()
    }
}

/// A question/answer pair with its class id resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelledPair {
    pub question: String,
    pub answer:   String,
    pub label:    usize,
}

/// Which partition a row was assigned to by the splitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Partition {
    Train,
    Val,
    Test,
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Partition::Train => "train",
            Partition::Val   => "val",
            Partition::Test  => "test",
        };
        f.write_str(name)
    }
}
