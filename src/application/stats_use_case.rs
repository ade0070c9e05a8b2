// ============================================================
// Layer 2 — StatsUseCase
// ============================================================
// Text tables of how the corpus is distributed, before any
// training: rows per relaxed label and rows per context.

use anyhow::Result;
use std::fmt::Write as _;
use std::path::PathBuf;

use crate::data::{loader::TsvLoader, preprocessor::{value_counts, Preprocessor}};
use crate::domain::{record::AnswerRecord, traits::RecordSource};

#[derive(Debug, Clone, PartialEq)]
pub struct CorpusStats {
    pub total_rows: usize,
    pub kept_rows:  usize,
    pub labels:     Vec<(String, usize)>,
    pub contexts:   Vec<(String, usize)>,
}

impl CorpusStats {
    pub fn from_records(records: Vec<AnswerRecord>) -> Self {
        let total_rows = records.len();
        let kept       = Preprocessor::new().filter(records);

        Self {
            total_rows,
            kept_rows: kept.len(),
            labels:    value_counts(kept.iter().filter_map(|r| r.relaxed_label())),
            contexts:  value_counts(kept.iter().map(|r| r.context.as_str())),
        }
    }
}

fn render_table(out: &mut String, title: &str, rows: &[(String, usize)]) {
    let width = rows.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0).max(title.len());
    let _ = writeln!(out, "{title:<width$}  count");
    let _ = writeln!(out, "{}", "-".repeat(width + 7));
    for (key, n) in rows {
        let _ = writeln!(out, "{key:<width$}  {n:>5}");
    }
}

impl std::fmt::Display for CorpusStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut out = String::new();
        let _ = writeln!(out, "Rows: {} read, {} with a usable label\n", self.total_rows, self.kept_rows);
        render_table(&mut out, "goldstandard2", &self.labels);
        out.push('\n');
        render_table(&mut out, "context", &self.contexts);
        f.write_str(&out)
    }
}

pub struct StatsUseCase {
    data_path: PathBuf,
}

impl StatsUseCase {
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self { data_path: data_path.into() }
    }

    pub fn execute(&self) -> Result<CorpusStats> {
        let records = TsvLoader::new(&self.data_path).load_all()?;
        Ok(CorpusStats::from_records(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_only_usable_rows() {
        let rows = vec![
            AnswerRecord::new("X wants to know about Y's food preferences.", "q1", "a", Some("No")),
            AnswerRecord::new("X wants to know about Y's food preferences.", "q2", "a", Some("Yes")),
            AnswerRecord::new("Y has just moved into a neighbourhood.", "q3", "a", Some("No")),
            AnswerRecord::new("Y has just moved into a neighbourhood.", "q4", "a", Some("Other")),
            AnswerRecord::new("Y has just moved into a neighbourhood.", "q5", "a", None),
        ];
        let stats = CorpusStats::from_records(rows);
        assert_eq!(stats.total_rows, 5);
        assert_eq!(stats.kept_rows, 3);
        assert_eq!(stats.labels[0], ("No".to_string(), 2));
        assert_eq!(stats.contexts[0].1, 2);

        let shown = stats.to_string();
        assert!(shown.contains("goldstandard2"));
        assert!(shown.contains("Y has just moved into a neighbourhood."));
    }

    #[test]
    fn test_reads_tsv_file() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("circa.tsv");
        std::fs::write(
            &path,
            "context\tquestion-X\tanswer-Y\tgoldstandard1\tgoldstandard2\n\
             ctx\tAre you in?\tSure.\tYes\tYes\n",
        )
        .unwrap();
        let stats = StatsUseCase::new(&path).execute().unwrap();
        assert_eq!(stats.kept_rows, 1);
    }
}
