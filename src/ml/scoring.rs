// ============================================================
// Layer 5 — Classification Scoring
// ============================================================
// Pure-Rust metrics over predicted and gold class ids.
//
//   weighted F1  = Σ_c  support_c / N · F1_c
//   F1_c         = 2·P_c·R_c / (P_c + R_c)
//   P_c          = TP_c / predicted_c       (0 when nothing predicted)
//   R_c          = TP_c / support_c         (0 when no gold rows)
//
// Per-class accuracy is recall under another name: of the rows
// whose gold label is c, how many did the model get right.
// It is reported only for classes that occur in the gold labels.

use std::fmt::Write as _;

/// Index of the largest logit in each row. Ties go to the lower id.
pub fn argmax_rows(logits: &[Vec<f32>]) -> Vec<usize> {
    logits
        .iter()
        .map(|row| {
            let mut best = 0usize;
            for (i, &v) in row.iter().enumerate() {
                if v > row[best] {
                    best = i;
                }
            }
            best
        })
        .collect()
}

/// Per-class confusion counts.
#[derive(Debug, Clone, Default, PartialEq)]
struct Counts {
    true_positive: usize,
    predicted:     usize,
    support:       usize,
}

fn counts(preds: &[usize], labels: &[usize]) -> Vec<Counts> {
    let n = preds
        .iter()
        .chain(labels.iter())
        .map(|&c| c + 1)
        .max()
        .unwrap_or(0);

    let mut out = vec![Counts::default(); n];
    for (&p, &t) in preds.iter().zip(labels.iter()) {
        out[p].predicted += 1;
        out[t].support   += 1;
        if p == t {
            out[t].true_positive += 1;
        }
    }
    out
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 { 0.0 } else { 2.0 * precision * recall / (precision + recall) }
}

/// Support-weighted mean of per-class F1.
pub fn weighted_f1(preds: &[usize], labels: &[usize]) -> f64 {
    let total = labels.len();
    if total == 0 {
        return 0.0;
    }
    counts(preds, labels)
        .iter()
        .map(|c| {
            let p = ratio(c.true_positive, c.predicted);
            let r = ratio(c.true_positive, c.support);
            f1(p, r) * c.support as f64 / total as f64
        })
        .sum()
}

// ─── Per-class accuracy ───────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq)]
pub struct ClassAccuracy {
    pub class:   usize,
    pub correct: usize,
    pub total:   usize,
}

impl ClassAccuracy {
    pub fn ratio(&self) -> f64 {
        ratio(self.correct, self.total)
    }
}

/// Accuracy for every class present in `labels`, ascending by id.
pub fn accuracy_per_class(preds: &[usize], labels: &[usize]) -> Vec<ClassAccuracy> {
    counts(preds, labels)
        .into_iter()
        .enumerate()
        .filter(|(_, c)| c.support > 0)
        .map(|(class, c)| ClassAccuracy { class, correct: c.true_positive, total: c.support })
        .collect()
}

/// Human-readable per-class accuracy block, ending with the overall ratio.
pub fn render_accuracy(rows: &[ClassAccuracy], names: &[String]) -> String {
    let mut out = String::new();
    let mut correct = 0usize;
    let mut total   = 0usize;

    for row in rows {
        let name = names.get(row.class).map_or_else(|| format!("Class {}", row.class), Clone::clone);
        let _ = writeln!(out, "Class: {name}");
        let _ = writeln!(out, "Accuracy: {}/{}", row.correct, row.total);
        let _ = writeln!(out, "Correct predictions {} {:.4}", row.class, row.ratio());
        correct += row.correct;
        total   += row.total;
    }
    let _ = writeln!(out, "Total correct predictions {:.4}", ratio(correct, total));
    out
}

// ─── Classification report ────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq)]
pub struct ClassScores {
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
    pub support:   usize,
}

/// Precision/recall/F1 table in the familiar sklearn layout.
#[derive(Debug, Clone)]
pub struct ClassificationReport {
    pub names:    Vec<String>,
    pub classes:  Vec<ClassScores>,
    pub accuracy: f64,
}

impl ClassificationReport {
    /// Rows cover the classes that occur in `labels` or `preds`
    /// (sklearn's `unique_labels`), ascending by id. Named classes
    /// that occur in neither are left out of the table and averages.
    pub fn new(preds: &[usize], labels: &[usize], names: &[String]) -> Self {
        let mut row_names = Vec::new();
        let mut classes   = Vec::new();
        for (id, c) in counts(preds, labels).into_iter().enumerate() {
            if c.support == 0 && c.predicted == 0 {
                continue;
            }
            let precision = ratio(c.true_positive, c.predicted);
            let recall    = ratio(c.true_positive, c.support);
            row_names.push(names.get(id).cloned().unwrap_or_else(|| format!("Class {id}")));
            classes.push(ClassScores { precision, recall, f1: f1(precision, recall), support: c.support });
        }

        let correct = preds.iter().zip(labels.iter()).filter(|(p, t)| p == t).count();

        Self { names: row_names, classes, accuracy: ratio(correct, labels.len()) }
    }

    pub fn total_support(&self) -> usize {
        self.classes.iter().map(|c| c.support).sum()
    }

    pub fn macro_avg(&self) -> ClassScores {
        let n = self.classes.len().max(1) as f64;
        let mean = |f: fn(&ClassScores) -> f64| self.classes.iter().map(f).sum::<f64>() / n;
        ClassScores {
            precision: mean(|c| c.precision),
            recall:    mean(|c| c.recall),
            f1:        mean(|c| c.f1),
            support:   self.total_support(),
        }
    }

    pub fn weighted_avg(&self) -> ClassScores {
        let total = self.total_support();
        let wmean = |f: fn(&ClassScores) -> f64| {
            if total == 0 {
                return 0.0;
            }
            self.classes.iter().map(|c| f(c) * c.support as f64).sum::<f64>() / total as f64
        };
        ClassScores {
            precision: wmean(|c| c.precision),
            recall:    wmean(|c| c.recall),
            f1:        wmean(|c| c.f1),
            support:   total,
        }
    }

    /// Render with `digits` decimals.
    pub fn render(&self, digits: usize) -> String {
        let width = self
            .names
            .iter()
            .map(|n| n.chars().count())
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(12);
        let col = digits.max(4) + 5;

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:>width$} {:>col$} {:>col$} {:>col$} {:>col$}\n",
            "", "precision", "recall", "f1-score", "support"
        );

        let row = |out: &mut String, name: &str, s: &ClassScores| {
            let _ = writeln!(
                out,
                "{:>width$} {:>col$.digits$} {:>col$.digits$} {:>col$.digits$} {:>col$}",
                name, s.precision, s.recall, s.f1, s.support
            );
        };

        for (name, scores) in self.names.iter().zip(self.classes.iter()) {
            row(&mut out, name, scores);
        }
        out.push('\n');

        let total = self.total_support();
        let _ = writeln!(
            out,
            "{:>width$} {:>col$} {:>col$} {:>col$.digits$} {:>col$}",
            "accuracy", "", "", self.accuracy, total
        );
        row(&mut out, "macro avg", &self.macro_avg());
        row(&mut out, "weighted avg", &self.weighted_avg());
        out
    }
}
