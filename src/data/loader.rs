// ============================================================
// Layer 4 — Corpus Loader
// ============================================================
// Reads the tab-separated indirect-answer corpus with the csv crate.
//
// File layout (header row + one row per exchange):
//
//   id  context  question-X  canquestion-X  answer-Y  judgements  goldstandard1  goldstandard2
//
// Only five columns matter to us. Everything else is ignored
// because the row struct doesn't declare it.
//
// Quirks of the file:
//   - Quoting is OFF. Answers like `"Sure," I said` contain bare
//     double quotes that must be kept as literal characters.
//   - Some exports spell the columns `questionX` / `answerY`,
//     so both spellings are accepted.
//   - Missing gold standards are empty fields (or the literal
//     `nan` when the file went through a dataframe round trip).

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::record::AnswerRecord;
use crate::domain::traits::RecordSource;

/// Column names as they appear in the header row.
#[derive(Debug, Deserialize)]
struct TsvRow {
    #[serde(default)]
    context: String,

    #[serde(rename = "question-X", alias = "questionX")]
    question: String,

    #[serde(rename = "answer-Y", alias = "answerY")]
    answer: String,

    #[serde(default)]
    goldstandard1: Option<String>,

    #[serde(default)]
    goldstandard2: Option<String>,
}

impl From<TsvRow> for AnswerRecord {
    fn from(row: TsvRow) -> Self {
        AnswerRecord {
            context:       row.context,
            question:      row.question,
            answer:        row.answer,
            goldstandard1: missing_to_none(row.goldstandard1),
            goldstandard2: missing_to_none(row.goldstandard2),
        }
    }
}

/// Empty, whitespace-only and `nan` cells all mean "no label".
fn missing_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("nan"))
}

/// Loads every row of a TSV corpus file.
pub struct TsvLoader {
    path: PathBuf,
}

impl TsvLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for TsvLoader {
    fn load_all(&self) -> Result<Vec<AnswerRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .quoting(false)
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)
            .with_context(|| format!("Cannot open corpus file '{}'", self.path.display()))?;

        let mut records = Vec::new();
        let mut skipped = 0usize;

        for (line, row) in reader.deserialize::<TsvRow>().enumerate() {
            match row {
                Ok(row) => records.push(AnswerRecord::from(row)),
                // One malformed line shouldn't sink the whole corpus
                Err(e) => {
                    skipped += 1;
                    tracing::warn!("Skipping row {} of '{}': {}", line + 2, self.path.display(), e);
                }
            }
        }

        tracing::info!(
            "Loaded {} rows from '{}' ({} skipped)",
            records.len(),
            self.path.display(),
            skipped
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tsv(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_reads_named_columns() {
        let f = write_tsv(
            "id\tcontext\tquestion-X\tcanquestion-X\tanswer-Y\tjudgements\tgoldstandard1\tgoldstandard2\n\
             0\tfriends\tAre you hungry?\tI am hungry.\tI just ate.\tNo#No\tNo\tNo\n",
        );
        let rows = TsvLoader::new(f.path()).load_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].question, "Are you hungry?");
        assert_eq!(rows[0].answer, "I just ate.");
        assert_eq!(rows[0].relaxed_label(), Some("No"));
    }

    #[test]
    fn test_accepts_compact_column_names() {
        let f = write_tsv(
            "context\tquestionX\tanswerY\tgoldstandard1\tgoldstandard2\n\
             work\tIs it done?\tAlmost.\tProbably no\tIn the middle, neither yes nor no\n",
        );
        let rows = TsvLoader::new(f.path()).load_all().unwrap();
        assert_eq!(rows[0].goldstandard1.as_deref(), Some("Probably no"));
    }

    #[test]
    fn test_quotes_are_literal() {
        let f = write_tsv(
            "context\tquestionX\tanswerY\tgoldstandard1\tgoldstandard2\n\
             c\tReady?\t\"Sure,\" I said\tYes\tYes\n",
        );
        let rows = TsvLoader::new(f.path()).load_all().unwrap();
        assert_eq!(rows[0].answer, "\"Sure,\" I said");
    }

    #[test]
    fn test_missing_gold_becomes_none() {
        let f = write_tsv(
            "context\tquestionX\tanswerY\tgoldstandard1\tgoldstandard2\n\
             c\tq1\ta1\t\t\n\
             c\tq2\ta2\tnan\tNaN\n",
        );
        let rows = TsvLoader::new(f.path()).load_all().unwrap();
        assert!(rows.iter().all(|r| r.goldstandard2.is_none()));
        assert!(rows.iter().all(|r| r.goldstandard1.is_none()));
    }

    #[test]
    fn test_missing_file_is_error() {
        let loader = TsvLoader::new("/definitely/not/here.tsv");
        assert!(loader.load_all().is_err());
    }
}
