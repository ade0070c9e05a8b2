// ============================================================
// Layer 5 — Pretrained Weight Loading
// ============================================================
// Copies a Hugging Face BERT checkpoint (model.safetensors) into
// the burn modules from bert.rs.
//
// Name mapping (prefix `bert.` is optional, older uploads use
// `gamma`/`beta` instead of `weight`/`bias` for LayerNorm):
//
//   embeddings.word_embeddings.weight            → embeddings.word_embeddings
//   embeddings.LayerNorm.{weight,bias}           → embeddings.layer_norm
//   encoder.layer.{i}.attention.self.query       → layers[i].attention.query
//   encoder.layer.{i}.attention.output.dense     → layers[i].attention_output
//   encoder.layer.{i}.attention.output.LayerNorm → layers[i].attention_norm
//   encoder.layer.{i}.intermediate.dense         → layers[i].intermediate
//   encoder.layer.{i}.output.dense               → layers[i].output
//   encoder.layer.{i}.output.LayerNorm           → layers[i].output_norm
//   pooler.dense                                 → pooler
//
// PyTorch stores Linear weights as [out, in]; burn uses [in, out],
// so every linear weight is transposed on the way in.

use anyhow::{anyhow, bail, Context, Result};
use burn::{
    module::Param,
    nn::{Embedding, LayerNorm, Linear},
    prelude::*,
};
use safetensors::{Dtype, SafeTensors};
use std::collections::HashMap;
use std::path::Path;

use crate::ml::bert::BertModel;

/// A host-side tensor: flat f32 values plus shape.
#[derive(Debug, Clone)]
pub struct HostTensor {
    pub values: Vec<f32>,
    pub shape:  Vec<usize>,
}

/// All tensors of a checkpoint, keyed by name with any `bert.`
/// prefix removed.
pub struct PretrainedWeights {
    tensors: HashMap<String, HostTensor>,
}

impl PretrainedWeights {
    pub fn from_tensors(tensors: HashMap<String, HostTensor>) -> Self {
        let tensors = tensors
            .into_iter()
            .map(|(name, t)| (strip_prefix(&name).to_string(), t))
            .collect();
        Self { tensors }
    }

    /// Read every floating-point tensor from a safetensors file.
    pub fn from_safetensors(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Cannot read weights '{}'", path.display()))?;
        let st = SafeTensors::deserialize(&bytes)
            .map_err(|e| anyhow!("Cannot parse safetensors '{}': {e}", path.display()))?;

        let mut tensors = HashMap::new();
        for (name, view) in st.tensors() {
            match to_f32(view.dtype(), view.data()) {
                Some(values) => {
                    tensors.insert(name, HostTensor { values, shape: view.shape().to_vec() });
                }
                None => tracing::debug!("Skipping non-float tensor '{}' ({:?})", name, view.dtype()),
            }
        }

        tracing::info!("Read {} tensors from '{}'", tensors.len(), path.display());
        Ok(Self::from_tensors(tensors))
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    fn get(&self, name: &str) -> Result<&HostTensor> {
        self.tensors
            .get(name)
            .ok_or_else(|| anyhow!("Pretrained checkpoint has no tensor '{name}'"))
    }

    /// LayerNorm parameters under either naming convention
    fn get_norm(&self, prefix: &str) -> Result<(&HostTensor, &HostTensor)> {
        let weight = self
            .get(&format!("{prefix}.weight"))
            .or_else(|_| self.get(&format!("{prefix}.gamma")))?;
        let bias = self
            .get(&format!("{prefix}.bias"))
            .or_else(|_| self.get(&format!("{prefix}.beta")))?;
        Ok((weight, bias))
    }

    /// Copy all encoder tensors into `model`. Fails on any missing
    /// tensor or shape mismatch; classifier heads in the file are ignored.
    pub fn apply<B: Backend>(&self, mut model: BertModel<B>, device: &B::Device) -> Result<BertModel<B>> {
        let emb = &mut model.embeddings;
        load_embedding(&mut emb.word_embeddings, self.get("embeddings.word_embeddings.weight")?, device)?;
        load_embedding(&mut emb.position_embeddings, self.get("embeddings.position_embeddings.weight")?, device)?;
        load_embedding(&mut emb.token_type_embeddings, self.get("embeddings.token_type_embeddings.weight")?, device)?;
        load_layer_norm(&mut emb.layer_norm, self.get_norm("embeddings.LayerNorm")?, device)?;

        for (i, layer) in model.layers.iter_mut().enumerate() {
            let p = format!("encoder.layer.{i}");
            self.load_linear(&mut layer.attention.query, &format!("{p}.attention.self.query"), device)?;
            self.load_linear(&mut layer.attention.key, &format!("{p}.attention.self.key"), device)?;
            self.load_linear(&mut layer.attention.value, &format!("{p}.attention.self.value"), device)?;
            self.load_linear(&mut layer.attention_output, &format!("{p}.attention.output.dense"), device)?;
            load_layer_norm(&mut layer.attention_norm, self.get_norm(&format!("{p}.attention.output.LayerNorm"))?, device)?;
            self.load_linear(&mut layer.intermediate, &format!("{p}.intermediate.dense"), device)?;
            self.load_linear(&mut layer.output, &format!("{p}.output.dense"), device)?;
            load_layer_norm(&mut layer.output_norm, self.get_norm(&format!("{p}.output.LayerNorm"))?, device)?;
        }

        self.load_linear(&mut model.pooler, "pooler.dense", device)?;

        tracing::info!("Pretrained encoder weights loaded ({} layers)", model.layers.len());
        Ok(model)
    }

    fn load_linear<B: Backend>(&self, linear: &mut Linear<B>, prefix: &str, device: &B::Device) -> Result<()> {
        let weight = self.get(&format!("{prefix}.weight"))?;
        // [out, in] → [in, out]
        let weight = tensor_2d::<B>(weight, device)
            .with_context(|| format!("'{prefix}.weight'"))?
            .transpose();
        expect_dims(prefix, &linear.weight.val().dims(), &weight.dims())?;
        linear.weight = Param::from_tensor(weight);

        let bias = tensor_1d::<B>(self.get(&format!("{prefix}.bias"))?, device)
            .with_context(|| format!("'{prefix}.bias'"))?;
        linear.bias = Some(Param::from_tensor(bias));
        Ok(())
    }
}

fn load_embedding<B: Backend>(emb: &mut Embedding<B>, t: &HostTensor, device: &B::Device) -> Result<()> {
    let weight = tensor_2d::<B>(t, device)?;
    expect_dims("embedding", &emb.weight.val().dims(), &weight.dims())?;
    emb.weight = Param::from_tensor(weight);
    Ok(())
}

fn load_layer_norm<B: Backend>(
    norm:           &mut LayerNorm<B>,
    (gamma, beta):  (&HostTensor, &HostTensor),
    device:         &B::Device,
) -> Result<()> {
    let gamma = tensor_1d::<B>(gamma, device)?;
    expect_dims("LayerNorm", &norm.gamma.val().dims(), &gamma.dims())?;
    norm.gamma = Param::from_tensor(gamma);
    norm.beta  = Param::from_tensor(tensor_1d::<B>(beta, device)?);
    Ok(())
}

fn tensor_2d<B: Backend>(t: &HostTensor, device: &B::Device) -> Result<Tensor<B, 2>> {
    if t.shape.len() != 2 {
        bail!("expected a 2-d tensor, found shape {:?}", t.shape);
    }
    Ok(Tensor::from_data(TensorData::new(t.values.clone(), t.shape.clone()), device))
}

fn tensor_1d<B: Backend>(t: &HostTensor, device: &B::Device) -> Result<Tensor<B, 1>> {
    if t.shape.len() != 1 {
        bail!("expected a 1-d tensor, found shape {:?}", t.shape);
    }
    Ok(Tensor::from_data(TensorData::new(t.values.clone(), t.shape.clone()), device))
}

fn expect_dims<const D: usize>(what: &str, expected: &[usize; D], found: &[usize; D]) -> Result<()> {
    if expected != found {
        bail!("Shape mismatch for {what}: model expects {expected:?}, checkpoint has {found:?}");
    }
    Ok(())
}

fn strip_prefix(name: &str) -> &str {
    name.strip_prefix("bert.").unwrap_or(name)
}

/// Decode little-endian float data; None for integer dtypes.
fn to_f32(dtype: Dtype, data: &[u8]) -> Option<Vec<f32>> {
    match dtype {
        Dtype::F32 => Some(
            data.chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        ),
        Dtype::F16 => Some(
            data.chunks_exact(2)
                .map(|c| half::f16::from_bits(u16::from_le_bytes([c[0], c[1]])).to_f32())
                .collect(),
        ),
        Dtype::BF16 => Some(
            data.chunks_exact(2)
                .map(|c| half::bf16::from_bits(u16::from_le_bytes([c[0], c[1]])).to_f32())
                .collect(),
        ),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ml::bert::{tests::tiny_config, BertConfig};
    use burn::backend::NdArray;

    type TB = NdArray<f32>;

    fn host(shape: &[usize], fill: f32) -> HostTensor {
        HostTensor { values: vec![fill; shape.iter().product()], shape: shape.to_vec() }
    }

    /// A full set of encoder tensors for `cfg`, named like a hub checkpoint.
    pub(crate) fn checkpoint_for(cfg: &BertConfig, prefix: &str) -> HashMap<String, HostTensor> {
        let h = cfg.hidden_size;
        let i = cfg.intermediate_size;
        let mut m = HashMap::new();
        let mut put = |name: String, t: HostTensor| {
            m.insert(format!("{prefix}{name}"), t);
        };

        put("embeddings.word_embeddings.weight".into(), host(&[cfg.vocab_size, h], 0.5));
        put("embeddings.position_embeddings.weight".into(), host(&[cfg.max_position_embeddings, h], 0.0));
        put("embeddings.token_type_embeddings.weight".into(), host(&[cfg.type_vocab_size, h], 0.0));
        put("embeddings.LayerNorm.gamma".into(), host(&[h], 1.0));
        put("embeddings.LayerNorm.beta".into(), host(&[h], 0.0));

        for l in 0..cfg.num_hidden_layers {
            let p = format!("encoder.layer.{l}");
            for name in ["attention.self.query", "attention.self.key", "attention.self.value", "attention.output.dense"] {
                put(format!("{p}.{name}.weight"), host(&[h, h], 0.01));
                put(format!("{p}.{name}.bias"), host(&[h], 0.0));
            }
            put(format!("{p}.intermediate.dense.weight"), host(&[i, h], 0.01));
            put(format!("{p}.intermediate.dense.bias"), host(&[i], 0.0));
            put(format!("{p}.output.dense.weight"), host(&[h, i], 0.01));
            put(format!("{p}.output.dense.bias"), host(&[h], 0.0));
            for norm in ["attention.output.LayerNorm", "output.LayerNorm"] {
                put(format!("{p}.{norm}.weight"), host(&[h], 1.0));
                put(format!("{p}.{norm}.bias"), host(&[h], 0.0));
            }
        }
        put("pooler.dense.weight".into(), host(&[h, h], 0.01));
        put("pooler.dense.bias".into(), host(&[h], 0.25));
        // Pretrained task head that must be ignored
        put("classifier.weight".into(), host(&[3, h], 9.0));
        m
    }

    /// Write `tensors` as an F32 `model.safetensors` file.
    pub(crate) fn write_safetensors(tensors: &HashMap<String, HostTensor>, path: &Path) {
        use safetensors::tensor::TensorView;

        let bytes: Vec<(&str, Vec<u8>, Vec<usize>)> = tensors
            .iter()
            .map(|(name, t)| {
                (name.as_str(), t.values.iter().flat_map(|v| v.to_le_bytes()).collect(), t.shape.clone())
            })
            .collect();
        let views: Vec<(&str, TensorView<'_>)> = bytes
            .iter()
            .map(|(name, data, shape)| (*name, TensorView::new(Dtype::F32, shape.clone(), data).unwrap()))
            .collect();
        safetensors::serialize_to_file(views, &None, path).unwrap();
    }

    #[test]
    fn test_applies_prefixed_checkpoint() {
        let cfg     = tiny_config();
        let device  = Default::default();
        let weights = PretrainedWeights::from_tensors(checkpoint_for(&cfg, "bert."));
        let model   = weights.apply(cfg.init::<TB>(&device), &device).unwrap();

        let word: Vec<f32> = model.embeddings.word_embeddings.weight.val().into_data().to_vec().unwrap();
        assert!(word.iter().all(|&v| v == 0.5));

        let pooler_bias: Vec<f32> = model.pooler.bias.unwrap().val().into_data().to_vec().unwrap();
        assert!(pooler_bias.iter().all(|&v| v == 0.25));
    }

    #[test]
    fn test_linear_weight_is_transposed() {
        let mut cfg = tiny_config();
        cfg.num_hidden_layers = 1;
        let device  = Default::default();
        let mut tensors = checkpoint_for(&cfg, "");
        // [out=intermediate, in=hidden] in the file
        let (i, h) = (cfg.intermediate_size, cfg.hidden_size);
        let values: Vec<f32> = (0..i * h).map(|v| v as f32).collect();
        tensors.insert(
            "encoder.layer.0.intermediate.dense.weight".into(),
            HostTensor { values, shape: vec![i, h] },
        );

        let model = PretrainedWeights::from_tensors(tensors)
            .apply(cfg.init::<TB>(&device), &device)
            .unwrap();
        let w = model.layers[0].intermediate.weight.val();
        assert_eq!(w.dims(), [h, i]);
        // burn[in=1][out=2] == file[out=2][in=1] == 2*h + 1
        let v: f32 = w.slice([1..2, 2..3]).into_scalar();
        assert_eq!(v, (2 * h + 1) as f32);
    }

    #[test]
    fn test_missing_tensor_is_error() {
        let cfg    = tiny_config();
        let device = Default::default();
        let mut tensors = checkpoint_for(&cfg, "");
        tensors.remove("pooler.dense.weight");
        let result = PretrainedWeights::from_tensors(tensors).apply(cfg.init::<TB>(&device), &device);
        assert!(result.is_err());
    }

    #[test]
    fn test_shape_mismatch_is_error() {
        let cfg    = tiny_config();
        let device = Default::default();
        let mut tensors = checkpoint_for(&cfg, "");
        tensors.insert("embeddings.word_embeddings.weight".into(), host(&[5, cfg.hidden_size], 0.0));
        let result = PretrainedWeights::from_tensors(tensors).apply(cfg.init::<TB>(&device), &device);
        assert!(result.is_err());
    }

    #[test]
    fn test_reads_safetensors_file() {
        use safetensors::tensor::TensorView;

        let values: Vec<f32> = vec![1.0, 2.0, 3.0, 4.0];
        let bytes: Vec<u8>   = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let view = TensorView::new(Dtype::F32, vec![2, 2], &bytes).unwrap();

        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.safetensors");
        safetensors::serialize_to_file(vec![("bert.pooler.dense.weight", view)], &None, &path).unwrap();

        let weights = PretrainedWeights::from_safetensors(&path).unwrap();
        let t = weights.get("pooler.dense.weight").unwrap();
        assert_eq!(t.shape, vec![2, 2]);
        assert_eq!(t.values, values);
    }

    #[test]
    fn test_half_precision_decoding() {
        let bytes: Vec<u8> = half::f16::from_f32(1.5).to_bits().to_le_bytes().to_vec();
        assert_eq!(to_f32(Dtype::F16, &bytes), Some(vec![1.5]));
        assert_eq!(to_f32(Dtype::I64, &[0; 8]), None);
    }
}
