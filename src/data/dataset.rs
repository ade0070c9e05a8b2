use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// One encoded, padded classification example.
/// Sequence format: [CLS] question [SEP] answer [SEP] [PAD]...
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifySample {
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub label:          usize,
}

#[derive(Debug, Clone)]
pub struct ClassifyDataset {
    samples: Vec<ClassifySample>,
}

impl ClassifyDataset {
    pub fn new(samples: Vec<ClassifySample>) -> Self { Self { samples } }

    pub fn sample_count(&self) -> usize { self.samples.len() }

    /// Class ids in dataset order
    pub fn labels(&self) -> Vec<usize> {
        self.samples.iter().map(|s| s.label).collect()
    }
}

impl Dataset<ClassifySample> for ClassifyDataset {
    fn get(&self, index: usize) -> Option<ClassifySample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_access() {
        let ds = ClassifyDataset::new(vec![
            ClassifySample { input_ids: vec![2, 5, 3, 0], attention_mask: vec![1, 1, 1, 0], label: 1 },
            ClassifySample { input_ids: vec![2, 6, 3, 0], attention_mask: vec![1, 1, 1, 0], label: 0 },
        ]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.get(1).map(|s| s.label), Some(0));
        assert!(ds.get(2).is_none());
        assert_eq!(ds.labels(), vec![1, 0]);
        assert_eq!(ds.get(0).unwrap().attention_mask.iter().sum::<u32>(), 3);
    }
}
