// ============================================================
// Layer 4 — Stratified Train/Validation/Test Splitter
// ============================================================
// Assigns every row to exactly one partition while keeping the
// class balance of each partition close to the full corpus.
//
// Two-stage split (same proportions as the reference run):
//
//   all rows ──(test_size 0.6)──► train 40%  |  held out 60%
//   held out ──(test_size 0.5)──► test  30%  |  val 30%
//
// Stratification, per split:
//   n_test       = ceil(n * test_size)
//   class share  = n_c * n_test / n          (integer part first)
//   leftover     = handed to the classes with the largest
//                  remainders, ties by class id
//
// Within a class the rows that go to the test side are picked
// after a Fisher-Yates shuffle from a seeded StdRng, so the same
// seed always reproduces the same split.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use std::collections::BTreeMap;

use crate::domain::record::Partition;

/// Seed used by the reference run for both split stages
pub const DEFAULT_SEED: u64 = 17;

/// Share of all rows held out from training
pub const HOLDOUT_FRACTION: f64 = 0.6;

/// Share of held-out rows that become the validation set
pub const VAL_FRACTION: f64 = 0.5;

/// Split positions `0..labels.len()` into (train, test) with
/// per-class proportions preserved.
pub fn stratified_split(labels: &[usize], test_size: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let n = labels.len();
    if n == 0 {
        return (Vec::new(), Vec::new());
    }

    let n_test = ((n as f64) * test_size.clamp(0.0, 1.0)).ceil() as usize;
    let n_test = n_test.min(n);

    // Group row positions by class. BTreeMap keeps class order fixed.
    let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (pos, &label) in labels.iter().enumerate() {
        by_class.entry(label).or_default().push(pos);
    }

    // ── Largest-remainder allocation of test slots ────────────────────────────
    let mut alloc: BTreeMap<usize, usize> = BTreeMap::new();
    let mut remainders: Vec<(usize, usize)> = Vec::new();
    for (&class, members) in &by_class {
        let scaled = members.len() * n_test;
        alloc.insert(class, scaled / n);
        remainders.push((class, scaled % n));
    }

    let assigned: usize = alloc.values().sum();
    let mut leftover    = n_test - assigned;
    remainders.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    for (class, rem) in remainders {
        if leftover == 0 || rem == 0 {
            break;
        }
        if let Some(slot) = alloc.get_mut(&class) {
            *slot += 1;
            leftover -= 1;
        }
    }

    // ── Draw members per class ────────────────────────────────────────────────
    let mut rng   = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(n - n_test);
    let mut test  = Vec::with_capacity(n_test);

    for (class, mut members) in by_class {
        members.shuffle(&mut rng);
        let take = alloc.get(&class).copied().unwrap_or(0).min(members.len());
        test.extend_from_slice(&members[..take]);
        train.extend_from_slice(&members[take..]);
    }

    train.shuffle(&mut rng);
    test.shuffle(&mut rng);

    tracing::debug!(
        "Stratified split: {} kept, {} held out (test_size={})",
        train.len(),
        test.len(),
        test_size
    );

    (train, test)
}

/// Assign every row a partition using the two-stage split.
pub fn assign_partitions(labels: &[usize], seed: u64) -> Vec<Partition> {
    let mut parts = vec![Partition::Train; labels.len()];

    let (_, held_out) = stratified_split(labels, HOLDOUT_FRACTION, seed);
    let held_labels: Vec<usize> = held_out.iter().map(|&i| labels[i]).collect();

    // First half of the second split is test, the held-out half is val
    let (test_pos, val_pos) = stratified_split(&held_labels, VAL_FRACTION, seed);

    for p in test_pos {
        parts[held_out[p]] = Partition::Test;
    }
    for p in val_pos {
        parts[held_out[p]] = Partition::Val;
    }
    parts
}

/// Route items into (train, val, test), keeping their original
/// relative order inside each partition.
pub fn partition<T>(items: Vec<T>, parts: &[Partition]) -> (Vec<T>, Vec<T>, Vec<T>) {
    let mut train = Vec::new();
    let mut val   = Vec::new();
    let mut test  = Vec::new();

    for (item, part) in items.into_iter().zip(parts.iter()) {
        match part {
            Partition::Train => train.push(item),
            Partition::Val   => val.push(item),
            Partition::Test  => test.push(item),
        }
    }
    (train, val, test)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn labels_for(counts: &[usize]) -> Vec<usize> {
        counts
            .iter()
            .enumerate()
            .flat_map(|(c, &n)| std::iter::repeat(c).take(n))
            .collect()
    }

    #[test]
    fn test_split_sizes() {
        let labels        = labels_for(&[50, 30, 20]);
        let (train, test) = stratified_split(&labels, 0.6, 17);
        assert_eq!(test.len(), 60);
        assert_eq!(train.len(), 40);
    }

    #[test]
    fn test_test_size_rounds_up() {
        let labels        = labels_for(&[7]);
        let (train, test) = stratified_split(&labels, 0.5, 1);
        assert_eq!(test.len(), 4);
        assert_eq!(train.len(), 3);
    }

    #[test]
    fn test_class_proportions_preserved() {
        let labels   = labels_for(&[50, 30, 20]);
        let (_, test) = stratified_split(&labels, 0.6, 17);
        let count = |c: usize| test.iter().filter(|&&i| labels[i] == c).count();
        assert_eq!(count(0), 30);
        assert_eq!(count(1), 18);
        assert_eq!(count(2), 12);
    }

    #[test]
    fn test_no_overlap_and_nothing_lost() {
        let labels        = labels_for(&[13, 8, 5, 3]);
        let (train, test) = stratified_split(&labels, 0.6, 17);
        let all: HashSet<usize> = train.iter().chain(test.iter()).copied().collect();
        assert_eq!(all.len(), labels.len());
        assert_eq!(train.len() + test.len(), labels.len());
    }

    #[test]
    fn test_same_seed_same_split() {
        let labels = labels_for(&[40, 25, 10]);
        assert_eq!(stratified_split(&labels, 0.6, 17), stratified_split(&labels, 0.6, 17));
        assert_ne!(stratified_split(&labels, 0.6, 17).1, stratified_split(&labels, 0.6, 18).1);
    }

    #[test]
    fn test_empty_input() {
        let (train, test) = stratified_split(&[], 0.6, 17);
        assert!(train.is_empty());
        assert!(test.is_empty());
    }

    #[test]
    fn test_three_way_partition_sizes() {
        let labels = labels_for(&[100, 60, 40]);
        let parts  = assign_partitions(&labels, DEFAULT_SEED);
        let count  = |p: Partition| parts.iter().filter(|&&x| x == p).count();
        assert_eq!(count(Partition::Train), 80);
        assert_eq!(count(Partition::Test), 60);
        assert_eq!(count(Partition::Val), 60);
    }

    #[test]
    fn test_partition_keeps_order() {
        let items = vec!["a", "b", "c", "d"];
        let parts = [Partition::Val, Partition::Train, Partition::Val, Partition::Test];
        let (train, val, test) = partition(items, &parts);
        assert_eq!(train, vec!["b"]);
        assert_eq!(val, vec!["a", "c"]);
        assert_eq!(test, vec!["d"]);
    }
}
