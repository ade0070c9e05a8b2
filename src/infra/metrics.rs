// ============================================================
// Layer 6 — Epoch Metrics Logger
// ============================================================
// Appends one CSV row per training epoch:
//
//   epoch,train_loss,val_loss,val_f1
//   1,0.912345,0.801234,0.654321
//   2,0.612345,0.750012,0.701234
//
// The header is written only when the file is created, so
// repeated runs into the same directory keep one continuous log.
//
// Reading it:
//   - val_loss rising while train_loss falls → overfitting
//   - val_f1 is the number to pick the checkpoint by

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
};

const HEADER: [&str; 4] = ["epoch", "train_loss", "val_loss", "val_f1"];

/// Metrics for a single epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Starts at 1
    pub epoch: usize,

    /// Mean cross-entropy over training batches
    pub train_loss: f64,

    /// Mean cross-entropy over validation batches
    pub val_loss: f64,

    /// Support-weighted F1 on the validation set
    pub val_f1: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, val_loss: f64, val_f1: f64) -> Self {
        Self { epoch, train_loss, val_loss, val_f1 }
    }

    /// True if this epoch beats the best validation F1 so far
    pub fn is_improvement(&self, best_f1: f64) -> bool {
        self.val_f1 > best_f1
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create metrics dir '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut writer = csv::Writer::from_path(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writer.write_record(HEADER)?;
            writer.flush()?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let file = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        writer.write_record([
            m.epoch.to_string(),
            format!("{:.6}", m.train_loss),
            format!("{:.6}", m.val_loss),
            format!("{:.6}", m.val_f1),
        ])?;
        writer.flush()?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}, val_f1={:.4}",
            m.epoch,
            m.train_loss,
            m.val_loss,
            m.val_f1,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_improvement() {
        let m = EpochMetrics::new(2, 0.5, 0.6, 0.7);
        assert!(m.is_improvement(0.65));
        assert!(!m.is_improvement(0.7));
    }

    #[test]
    fn test_header_written_once() {
        let dir = tempfile::tempdir().unwrap();

        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger.log(&EpochMetrics::new(1, 1.0, 0.9, 0.5)).unwrap();

        // A second logger on the same dir appends below the first row
        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger.log(&EpochMetrics::new(2, 0.8, 0.85, 0.6)).unwrap();

        let text = std::fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], HEADER.join(","));
        assert_eq!(lines[1], "1,1.000000,0.900000,0.500000");
        assert!(lines[2].starts_with("2,"));
    }
}
