// ============================================================
// Layer 5 — Sequence Classification Head
// ============================================================
// BERT encoder + dropout + one linear layer over the pooled
// [CLS] vector:
//
//   logits = W · dropout(pooled) + b      W: [hidden, num_labels]
//
// The head is always freshly initialised, N(0, 0.02) like the
// pretrained model's own initialiser. Whatever head the hub
// checkpoint carried (MNLI, masked-LM, ...) is discarded.

use burn::{
    nn::{
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig, Initializer, Linear, LinearConfig,
    },
    prelude::*,
};

use crate::ml::bert::{BertConfig, BertModel};

const HEAD_INIT_STD: f64 = 0.02;

#[derive(Module, Debug)]
pub struct BertForSequenceClassification<B: Backend> {
    pub bert:       BertModel<B>,
    pub dropout:    Dropout,
    pub classifier: Linear<B>,
    pub num_labels: usize,
}

impl BertConfig {
    /// Randomly initialised encoder with a new classification head.
    pub fn init_classifier<B: Backend>(
        &self,
        num_labels: usize,
        device:     &B::Device,
    ) -> BertForSequenceClassification<B> {
        BertForSequenceClassification {
            bert:    self.init(device),
            dropout: DropoutConfig::new(self.hidden_dropout_prob).init(),
            classifier: LinearConfig::new(self.hidden_size, num_labels)
                .with_initializer(Initializer::Normal { mean: 0.0, std: HEAD_INIT_STD })
                .init(device),
            num_labels,
        }
    }
}

impl<B: Backend> BertForSequenceClassification<B> {
    /// input_ids, attention_mask: [batch, seq] → logits [batch, num_labels]
    pub fn forward(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
    ) -> Tensor<B, 2> {
        let pooled = self.bert.forward(input_ids, attention_mask).pooled;
        self.classifier.forward(self.dropout.forward(pooled))
    }

    /// Mean cross-entropy over the batch, plus the logits.
    pub fn forward_loss(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
        labels:         Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward(input_ids, attention_mask);
        let loss   = CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits.clone(), labels);
        (loss, logits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::bert::tests::tiny_config;
    use burn::backend::NdArray;

    type TB = NdArray<f32>;

    #[test]
    fn test_logit_shape() {
        let device = Default::default();
        let model  = tiny_config().init_classifier::<TB>(4, &device);
        let ids    = Tensor::<TB, 2, Int>::from_ints([[2, 5, 3], [2, 6, 3]], &device);
        let mask   = Tensor::<TB, 2, Int>::ones([2, 3], &device);
        assert_eq!(model.forward(ids, mask).dims(), [2, 4]);
    }

    #[test]
    fn test_loss_is_finite_and_positive() {
        let device = Default::default();
        let model  = tiny_config().init_classifier::<TB>(3, &device);
        let ids    = Tensor::<TB, 2, Int>::from_ints([[2, 5, 3, 0]], &device);
        let mask   = Tensor::<TB, 2, Int>::from_ints([[1, 1, 1, 0]], &device);
        let labels = Tensor::<TB, 1, Int>::from_ints([2], &device);

        let (loss, _) = model.forward_loss(ids, mask, labels);
        let loss: f32 = loss.into_scalar();
        assert!(loss.is_finite() && loss > 0.0);
    }
}
