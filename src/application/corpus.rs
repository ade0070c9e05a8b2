// ============================================================
// Layer 2 — Corpus Preparation
// ============================================================
// Shared by `train` and `evaluate`, which must see the SAME
// partitions for the test numbers to mean anything:
//
//   load TSV → filter labels → label map → stratified split
//
// Given the same file, seed and label map, the split is
// reproduced exactly.

use anyhow::{bail, Result};
use std::path::Path;

use crate::data::{loader::TsvLoader, preprocessor::Preprocessor, splitter};
use crate::domain::{
    labels::LabelMap,
    record::{AnswerRecord, LabelledPair},
    traits::RecordSource,
};

pub struct PreparedCorpus {
    pub labels: LabelMap,
    pub train:  Vec<LabelledPair>,
    pub val:    Vec<LabelledPair>,
    pub test:   Vec<LabelledPair>,
}

/// Load and split the corpus. With `labels` given (from a saved
/// checkpoint) ids are taken from it, otherwise a fresh map is built.
pub fn prepare(data_path: &Path, seed: u64, labels: Option<LabelMap>) -> Result<PreparedCorpus> {
    let records = TsvLoader::new(data_path).load_all()?;
    prepare_records(&records, seed, labels)
}

pub fn prepare_records(
    records: &[AnswerRecord],
    seed:    u64,
    labels:  Option<LabelMap>,
) -> Result<PreparedCorpus> {
    let kept = Preprocessor::new().filter(records.to_vec());
    if kept.is_empty() {
        bail!("No labelled rows left after filtering");
    }

    let labels = labels.unwrap_or_else(|| {
        LabelMap::from_labels(kept.iter().filter_map(|r| r.relaxed_label()))
    });
    tracing::info!("Labels: {:?}", labels.names());

    let mut pairs = Vec::with_capacity(kept.len());
    for r in &kept {
        let label = r.relaxed_label().unwrap_or_default();
        let Some(id) = labels.id(label) else {
            bail!("Label '{label}' is not known to the checkpoint ({:?})", labels.names());
        };
        pairs.push(LabelledPair { question: r.question.clone(), answer: r.answer.clone(), label: id });
    }

    let ids: Vec<usize>      = pairs.iter().map(|p| p.label).collect();
    let parts                = splitter::assign_partitions(&ids, seed);
    let (train, val, test)   = splitter::partition(pairs, &parts);

    tracing::info!("Split: {} train, {} validation, {} test", train.len(), val.len(), test.len());
    Ok(PreparedCorpus { labels, train, val, test })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<AnswerRecord> {
        let mut rows = Vec::new();
        for i in 0..30 {
            let label = match i % 3 {
                0 => "Yes",
                1 => "No",
                _ => "In the middle, neither yes nor no",
            };
            rows.push(AnswerRecord::new("ctx", format!("q{i}"), format!("a{i}"), Some(label)));
        }
        rows.push(AnswerRecord::new("ctx", "q-other", "a", Some("Other")));
        rows.push(AnswerRecord::new("ctx", "q-none", "a", None));
        rows
    }

    #[test]
    fn test_split_covers_filtered_rows() {
        let prepared = prepare_records(&corpus(), 17, None).unwrap();
        let total = prepared.train.len() + prepared.val.len() + prepared.test.len();
        assert_eq!(total, 30);
        assert_eq!(prepared.train.len(), 12);
        assert_eq!(prepared.labels.len(), 3);
    }

    #[test]
    fn test_same_split_with_saved_labels() {
        let first  = prepare_records(&corpus(), 17, None).unwrap();
        let second = prepare_records(&corpus(), 17, Some(first.labels.clone())).unwrap();
        assert_eq!(first.test, second.test);
        assert_eq!(first.val, second.val);
    }

    #[test]
    fn test_unknown_label_with_saved_map_is_error() {
        let labels = LabelMap::from_labels(["Yes", "No"]);
        assert!(prepare_records(&corpus(), 17, Some(labels)).is_err());
    }

    #[test]
    fn test_nothing_labelled_is_error() {
        let rows = vec![AnswerRecord::new("c", "q", "a", None)];
        assert!(prepare_records(&rows, 17, None).is_err());
    }
}
