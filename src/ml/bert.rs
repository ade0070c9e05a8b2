// ============================================================
// Layer 5 — BERT Encoder (Burn)
// ============================================================
// A post-norm transformer encoder laid out exactly like the
// Hugging Face BERT checkpoints, so pretrained weights can be
// copied in tensor by tensor (see weights.rs).
//
//   input_ids ─► word + position + token-type embeddings
//             ─► LayerNorm ─► dropout
//             ─► N × [ self-attention ─► add & norm
//                      ─► GELU feed-forward ─► add & norm ]
//             ─► pooler: tanh(dense(hidden[:, 0]))
//
// Padding positions are hidden from attention by adding a large
// negative bias to their scores before the softmax.

use burn::{
    nn::{
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::{gelu, softmax, tanh},
};
use serde::{Deserialize, Serialize};

/// Score added to masked positions before softmax
const MASK_BIAS: f32 = -10_000.0;

fn default_dropout() -> f64 { 0.1 }
fn default_max_positions() -> usize { 512 }
fn default_type_vocab() -> usize { 2 }
fn default_layer_norm_eps() -> f64 { 1e-12 }
fn default_hidden_act() -> String { "gelu".to_string() }

/// Architecture hyperparameters, read from the hub's config.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BertConfig {
    pub vocab_size:          usize,
    pub hidden_size:         usize,
    pub num_hidden_layers:   usize,
    pub num_attention_heads: usize,
    pub intermediate_size:   usize,

    #[serde(default = "default_dropout")]
    pub hidden_dropout_prob: f64,

    #[serde(default = "default_dropout")]
    pub attention_probs_dropout_prob: f64,

    #[serde(default = "default_max_positions")]
    pub max_position_embeddings: usize,

    #[serde(default = "default_type_vocab")]
    pub type_vocab_size: usize,

    #[serde(default = "default_layer_norm_eps")]
    pub layer_norm_eps: f64,

    #[serde(default = "default_hidden_act")]
    pub hidden_act: String,
}

impl BertConfig {
    /// Parse a Hugging Face config.json. Unknown keys are ignored.
    pub fn from_json_file(path: &std::path::Path) -> anyhow::Result<Self> {
        use anyhow::Context;
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read model config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_str(&json)
            .with_context(|| format!("Malformed model config '{}'", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.num_attention_heads == 0 || self.hidden_size % self.num_attention_heads != 0 {
            anyhow::bail!(
                "hidden_size ({}) must be divisible by num_attention_heads ({})",
                self.hidden_size,
                self.num_attention_heads
            );
        }
        if self.hidden_act != "gelu" {
            anyhow::bail!("Unsupported activation '{}', only 'gelu' is implemented", self.hidden_act);
        }
        Ok(())
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> BertModel<B> {
        let embeddings = BertEmbeddings {
            word_embeddings:       EmbeddingConfig::new(self.vocab_size, self.hidden_size).init(device),
            position_embeddings:   EmbeddingConfig::new(self.max_position_embeddings, self.hidden_size).init(device),
            token_type_embeddings: EmbeddingConfig::new(self.type_vocab_size, self.hidden_size).init(device),
            layer_norm:            self.layer_norm(device),
            dropout:               DropoutConfig::new(self.hidden_dropout_prob).init(),
        };

        let layers = (0..self.num_hidden_layers)
            .map(|_| self.init_layer(device))
            .collect();

        let pooler = LinearConfig::new(self.hidden_size, self.hidden_size).init(device);

        BertModel { embeddings, layers, pooler }
    }

    fn init_layer<B: Backend>(&self, device: &B::Device) -> BertLayer<B> {
        let h = self.hidden_size;
        let attention = BertSelfAttention {
            query:     LinearConfig::new(h, h).init(device),
            key:       LinearConfig::new(h, h).init(device),
            value:     LinearConfig::new(h, h).init(device),
            dropout:   DropoutConfig::new(self.attention_probs_dropout_prob).init(),
            num_heads: self.num_attention_heads,
        };
        BertLayer {
            attention,
            attention_output: LinearConfig::new(h, h).init(device),
            attention_norm:   self.layer_norm(device),
            intermediate:     LinearConfig::new(h, self.intermediate_size).init(device),
            output:           LinearConfig::new(self.intermediate_size, h).init(device),
            output_norm:      self.layer_norm(device),
            dropout:          DropoutConfig::new(self.hidden_dropout_prob).init(),
        }
    }

    fn layer_norm<B: Backend>(&self, device: &B::Device) -> LayerNorm<B> {
        LayerNormConfig::new(self.hidden_size)
            .with_epsilon(self.layer_norm_eps)
            .init(device)
    }
}

// ─── Embeddings ───────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct BertEmbeddings<B: Backend> {
    pub word_embeddings:       Embedding<B>,
    pub position_embeddings:   Embedding<B>,
    pub token_type_embeddings: Embedding<B>,
    pub layer_norm:            LayerNorm<B>,
    pub dropout:               Dropout,
}

impl<B: Backend> BertEmbeddings<B> {
    /// input_ids: [batch, seq_len] → [batch, seq_len, hidden]
    pub fn forward(&self, input_ids: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let [batch_size, seq_len] = input_ids.dims();
        let device = input_ids.device();

        let words = self.word_embeddings.forward(input_ids);

        // [1, seq_len]: broadcast over the batch when added
        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &device)
            .reshape([1, seq_len]);
        let positions = self.position_embeddings.forward(positions);

        // Single-segment input: every token has type 0
        let types = Tensor::<B, 2, Int>::zeros([batch_size, seq_len], &device);
        let types = self.token_type_embeddings.forward(types);

        let x = words + positions + types;
        self.dropout.forward(self.layer_norm.forward(x))
    }
}

// ─── Self-attention ───────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct BertSelfAttention<B: Backend> {
    pub query:     Linear<B>,
    pub key:       Linear<B>,
    pub value:     Linear<B>,
    pub dropout:   Dropout,
    pub num_heads: usize,
}

impl<B: Backend> BertSelfAttention<B> {
    /// x: [batch, seq, hidden], mask_bias: [batch, 1, 1, seq]
    pub fn forward(&self, x: Tensor<B, 3>, mask_bias: Tensor<B, 4>) -> Tensor<B, 3> {
        let [batch_size, seq_len, hidden] = x.dims();
        let head_dim = hidden / self.num_heads;

        let split_heads = |t: Tensor<B, 3>| {
            t.reshape([batch_size, seq_len, self.num_heads, head_dim])
                .swap_dims(1, 2) // [batch, heads, seq, head_dim]
        };

        let q = split_heads(self.query.forward(x.clone()));
        let k = split_heads(self.key.forward(x.clone()));
        let v = split_heads(self.value.forward(x));

        let scores = q.matmul(k.transpose()).div_scalar((head_dim as f64).sqrt());
        let probs  = softmax(scores + mask_bias, 3);
        let probs  = self.dropout.forward(probs);

        probs
            .matmul(v)
            .swap_dims(1, 2)
            .reshape([batch_size, seq_len, hidden])
    }
}

// ─── Encoder layer ────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct BertLayer<B: Backend> {
    pub attention:        BertSelfAttention<B>,
    pub attention_output: Linear<B>,
    pub attention_norm:   LayerNorm<B>,
    pub intermediate:     Linear<B>,
    pub output:           Linear<B>,
    pub output_norm:      LayerNorm<B>,
    pub dropout:          Dropout,
}

impl<B: Backend> BertLayer<B> {
    pub fn forward(&self, x: Tensor<B, 3>, mask_bias: Tensor<B, 4>) -> Tensor<B, 3> {
        let context  = self.attention.forward(x.clone(), mask_bias);
        let attended = self.attention_norm.forward(
            x + self.dropout.forward(self.attention_output.forward(context)),
        );

        let inner = gelu(self.intermediate.forward(attended.clone()));
        self.output_norm.forward(attended + self.dropout.forward(self.output.forward(inner)))
    }
}

// ─── Full encoder ─────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct BertModel<B: Backend> {
    pub embeddings: BertEmbeddings<B>,
    pub layers:     Vec<BertLayer<B>>,
    pub pooler:     Linear<B>,
}

pub struct BertOutput<B: Backend> {
    /// Final hidden states: [batch, seq, hidden]
    pub sequence: Tensor<B, 3>,
    /// tanh-pooled [CLS] representation: [batch, hidden]
    pub pooled: Tensor<B, 2>,
}

impl<B: Backend> BertModel<B> {
    pub fn forward(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
    ) -> BertOutput<B> {
        let [batch_size, _] = input_ids.dims();
        let mask_bias = attention_bias(attention_mask);

        let mut x = self.embeddings.forward(input_ids);
        for layer in &self.layers {
            x = layer.forward(x, mask_bias.clone());
        }

        let [_, _, hidden] = x.dims();
        let cls = x
            .clone()
            .slice([0..batch_size, 0..1, 0..hidden])
            .reshape([batch_size, hidden]);
        let pooled = tanh(self.pooler.forward(cls));

        BertOutput { sequence: x, pooled }
    }
}

/// [batch, seq] mask of 1/0 → additive bias [batch, 1, 1, seq]
/// that is 0 for real tokens and MASK_BIAS for padding.
pub fn attention_bias<B: Backend>(attention_mask: Tensor<B, 2, Int>) -> Tensor<B, 4> {
    let [batch_size, seq_len] = attention_mask.dims();
    attention_mask
        .float()
        .neg()
        .add_scalar(1.0)
        .mul_scalar(MASK_BIAS)
        .reshape([batch_size, 1, 1, seq_len])
}
