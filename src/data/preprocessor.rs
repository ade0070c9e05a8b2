// ============================================================
// Layer 4 — Record Preprocessor
// ============================================================
// Prepares raw corpus rows for labelling and tokenisation.
//
// Steps (applied in order):
//   1. Drop rows with no relaxed gold standard
//   2. Drop rows labelled "Other" (too few and too vague to learn)
//   3. Normalise whitespace in question and answer text
//
// Text cleaning is deliberately light. The BERT tokenizer does
// its own lowercasing and accent handling; we only make sure
// stray tabs, non-breaking spaces and doubled spaces don't turn
// into odd tokens.

use std::collections::HashMap;

use crate::domain::record::AnswerRecord;

/// Relaxed label that is excluded from training
pub const EXCLUDED_LABEL: &str = "Other";

pub struct Preprocessor {
    excluded: Vec<String>,
}

impl Preprocessor {
    pub fn new() -> Self {
        Self { excluded: vec![EXCLUDED_LABEL.to_string()] }
    }

    /// Keep only rows that carry a usable relaxed label, with
    /// their question/answer text cleaned.
    pub fn filter(&self, records: Vec<AnswerRecord>) -> Vec<AnswerRecord> {
        let before = records.len();

        let kept: Vec<AnswerRecord> = records
            .into_iter()
            .filter(|r| match r.relaxed_label() {
                Some(label) => !self.excluded.iter().any(|x| x == label),
                None        => false,
            })
            .map(|mut r| {
                r.question = self.clean(&r.question);
                r.answer   = self.clean(&r.answer);
                r
            })
            .collect();

        tracing::info!("{} of {} rows kept after label filtering", kept.len(), before);
        kept
    }

    /// Collapse every run of whitespace (including NBSP and
    /// zero-width spaces) into one plain space and trim the ends.
    pub fn clean(&self, text: &str) -> String {
        let mut out        = String::with_capacity(text.len());
        let mut last_space = true;

        for c in text.chars() {
            let is_space = c.is_whitespace()
                || c.is_control()
                || matches!(c, '\u{200B}' | '\u{FEFF}');

            if is_space {
                if !last_space {
                    out.push(' ');
                }
                last_space = true;
            } else {
                out.push(c);
                last_space = false;
            }
        }

        out.trim_end().to_string()
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Count occurrences of each key, most frequent first.
/// Ties are broken alphabetically so output is stable.
pub fn value_counts<'a, I>(keys: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for k in keys {
        *counts.entry(k).or_insert(0) += 1;
    }

    let mut out: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(k, n)| (k.to_string(), n))
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drops_missing_and_other() {
        let rows = vec![
            AnswerRecord::new("c", "q1", "a1", Some("Yes")),
            AnswerRecord::new("c", "q2", "a2", None),
            AnswerRecord::new("c", "q3", "a3", Some("Other")),
            AnswerRecord::new("c", "q4", "a4", Some("No")),
        ];
        let kept = Preprocessor::new().filter(rows);
        let questions: Vec<&str> = kept.iter().map(|r| r.question.as_str()).collect();
        assert_eq!(questions, vec!["q1", "q4"]);
    }

    #[test]
    fn test_cleans_text_of_kept_rows() {
        let rows = vec![AnswerRecord::new("c", "  Are  you\tin? ", "Yes\u{00A0}\u{00A0}I am", Some("Yes"))];
        let kept = Preprocessor::new().filter(rows);
        assert_eq!(kept[0].question, "Are you in?");
        assert_eq!(kept[0].answer, "Yes I am");
    }

    #[test]
    fn test_clean_empty() {
        assert_eq!(Preprocessor::new().clean("   "), "");
    }

    #[test]
    fn test_value_counts_sorted() {
        let counts = value_counts(["No", "Yes", "No", "Maybe", "Yes", "No"]);
        assert_eq!(counts[0], ("No".to_string(), 3));
        assert_eq!(counts[1], ("Yes".to_string(), 2));
        assert_eq!(counts[2], ("Maybe".to_string(), 1));
    }

    #[test]
    fn test_value_counts_ties_alphabetical() {
        let counts = value_counts(["b", "a"]);
        assert_eq!(counts[0].0, "a");
    }
}
