// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the four subcommands and all their flags:
//
//   train     fine-tune a pretrained BERT on the corpus
//   evaluate  re-score a saved checkpoint on validation and test
//   predict   classify one question/answer pair
//   stats     show label and context distributions
//
// clap's derive macros generate --help, error messages for
// missing args and the string → number conversions.

use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::application::train_use_case::TrainConfig;
use crate::ml::device::ComputeDevice;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fine-tune a pretrained BERT to classify indirect answers
    Train(TrainArgs),

    /// Report validation and test metrics for a saved checkpoint
    Evaluate(EvaluateArgs),

    /// Classify a single question/answer pair
    Predict(PredictArgs),

    /// Print label and context distributions of the corpus
    Stats(StatsArgs),
}

/// Burn backend to run on
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceArg {
    /// NdArray on the CPU
    Cpu,
    /// Wgpu on the first GPU adapter found
    Wgpu,
}

impl From<DeviceArg> for ComputeDevice {
    fn from(d: DeviceArg) -> Self {
        match d {
            DeviceArg::Cpu  => ComputeDevice::Cpu,
            DeviceArg::Wgpu => ComputeDevice::Wgpu,
        }
    }
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Tab-separated corpus file
    #[arg(long, default_value = "data/circa-data.tsv")]
    pub data_path: String,

    /// Directory to save checkpoints, tokenizer and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Hub model id, or a local directory with config.json and model.safetensors
    #[arg(long, default_value = "bert-base-uncased")]
    pub model: String,

    /// Hub revision (branch, tag or commit)
    #[arg(long)]
    pub revision: Option<String>,

    /// Where downloaded hub files are cached
    #[arg(long)]
    pub cache_dir: Option<String>,

    /// Tokens per input: [CLS] question [SEP] answer [SEP] + padding
    #[arg(long, default_value_t = 25)]
    pub max_length: usize,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 3)]
    pub epochs: usize,

    /// Peak learning rate, reached after the warmup steps
    #[arg(long, default_value_t = 3e-5)]
    pub lr: f64,

    #[arg(long, default_value_t = 1e-8)]
    pub adam_epsilon: f64,

    #[arg(long, default_value_t = 0.0)]
    pub weight_decay: f64,

    #[arg(long, default_value_t = 0)]
    pub warmup_steps: usize,

    /// Gradient norm clip threshold
    #[arg(long, default_value_t = 1.0)]
    pub max_grad_norm: f64,

    /// Seed for the split, shuffling and weight init
    #[arg(long, default_value_t = 17)]
    pub seed: u64,

    #[arg(long, value_enum, default_value_t = DeviceArg::Cpu)]
    pub device: DeviceArg,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_path:      a.data_path,
            checkpoint_dir: a.checkpoint_dir,
            model:          a.model,
            revision:       a.revision,
            cache_dir:      a.cache_dir,
            max_length:     a.max_length,
            batch_size:     a.batch_size,
            epochs:         a.epochs,
            lr:             a.lr,
            adam_epsilon:   a.adam_epsilon,
            weight_decay:   a.weight_decay,
            warmup_steps:   a.warmup_steps,
            max_grad_norm:  a.max_grad_norm,
            seed:           a.seed,
            device:         a.device.into(),
        }
    }
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Directory the `train` command wrote to
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Corpus file; defaults to the one used for training
    #[arg(long)]
    pub data_path: Option<PathBuf>,

    /// Epoch to load; defaults to the latest
    #[arg(long)]
    pub epoch: Option<usize>,

    /// Defaults to the device used for training
    #[arg(long, value_enum)]
    pub device: Option<DeviceArg>,
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// The yes/no question
    #[arg(long)]
    pub question: String,

    /// The indirect answer to judge
    #[arg(long)]
    pub answer: String,

    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    #[arg(long)]
    pub epoch: Option<usize>,

    #[arg(long, value_enum)]
    pub device: Option<DeviceArg>,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    #[arg(long, default_value = "data/circa-data.tsv")]
    pub data_path: PathBuf,
}
