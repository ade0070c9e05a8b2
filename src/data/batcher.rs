// ============================================================
// Layer 4 — Classification Batcher
// ============================================================
// Implements Burn's Batcher trait to stack ClassifySamples into
// tensors for one forward pass.
//
//   Input:  Vec of N samples, each padded to length S
//   Output: input_ids [N, S], attention_mask [N, S], labels [N]
//
// Every sample is already padded to max_length by the encoder,
// so batching is a flatten + reshape.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::ClassifySample;

/// A batch of encoded pairs ready for the model.
#[derive(Debug, Clone)]
pub struct ClassifyBatch<B: Backend> {
    /// Token ids: shape: [batch_size, seq_len]
    pub input_ids: Tensor<B, 2, Int>,

    /// 1 = real token, 0 = padding: shape: [batch_size, seq_len]
    pub attention_mask: Tensor<B, 2, Int>,

    /// Gold class ids: shape: [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

#[derive(Clone, Debug)]
pub struct ClassifyBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> ClassifyBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<ClassifySample, ClassifyBatch<B>> for ClassifyBatcher<B> {
    fn batch(&self, items: Vec<ClassifySample>) -> ClassifyBatch<B> {
        let batch_size = items.len();
        let seq_len    = items.first().map_or(0, |s| s.input_ids.len());

        // Burn Int tensors are built from i32 here
        let input_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.input_ids.iter().map(|&x| x as i32))
            .collect();

        let mask_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.attention_mask.iter().map(|&x| x as i32))
            .collect();

        let labels: Vec<i32> = items.iter().map(|s| s.label as i32).collect();

        let input_ids = Tensor::<B, 1, Int>::from_ints(input_flat.as_slice(), &self.device)
            .reshape([batch_size, seq_len]);

        let attention_mask = Tensor::<B, 1, Int>::from_ints(mask_flat.as_slice(), &self.device)
            .reshape([batch_size, seq_len]);

        let labels = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        ClassifyBatch { input_ids, attention_mask, labels }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_batch_shapes() {
        let device  = Default::default();
        let batcher = ClassifyBatcher::<NdArray>::new(device);
        let items = vec![
            ClassifySample { input_ids: vec![2, 5, 3, 0], attention_mask: vec![1, 1, 1, 0], label: 1 },
            ClassifySample { input_ids: vec![2, 6, 7, 3], attention_mask: vec![1, 1, 1, 1], label: 2 },
        ];
        let batch = batcher.batch(items);
        assert_eq!(batch.input_ids.dims(), [2, 4]);
        assert_eq!(batch.attention_mask.dims(), [2, 4]);
        assert_eq!(batch.labels.dims(), [2]);

        let labels: Vec<i64> = batch
            .labels
            .into_data()
            .iter::<i64>()
            .collect();
        assert_eq!(labels, vec![1, 2]);
    }
}
