// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap, hands them to a Layer 2 use case and prints whatever
// comes back. No business logic lives here.

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, PredictArgs, StatsArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "yn-qa-classifier",
    version = "0.1.0",
    about = "Fine-tune BERT to tell whether an indirect answer means yes, no or something in between."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
            Commands::Predict(args)  => run_predict(args),
            Commands::Stats(args)    => run_stats(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Fine-tuning '{}' on '{}'", args.model, args.data_path);
    let checkpoint_dir = args.checkpoint_dir.clone();

    let reports = TrainUseCase::new(args.into()).execute()?;
    for report in &reports {
        println!("\n{report}");
    }

    println!("Training complete. Checkpoints saved in '{checkpoint_dir}'.");
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let use_case = EvaluateUseCase::new(
        args.checkpoint_dir,
        args.data_path,
        args.epoch,
        args.device.map(Into::into),
    );
    tracing::info!("Evaluating checkpoint in '{}'", use_case.checkpoint_dir().display());

    for report in use_case.execute()? {
        println!("\n{report}");
    }
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let use_case   = PredictUseCase::new(&args.checkpoint_dir, args.epoch, args.device.map(Into::into))?;
    let prediction = use_case.predict(&args.question, &args.answer)?;

    println!("\nQuestion: {}", args.question);
    println!("Answer:   {}", args.answer);
    print!("{prediction}");
    Ok(())
}

fn run_stats(args: StatsArgs) -> Result<()> {
    use crate::application::stats_use_case::StatsUseCase;

    let stats = StatsUseCase::new(args.data_path).execute()?;
    print!("{stats}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::TrainConfig;
    use crate::ml::device::ComputeDevice;

    #[test]
    fn test_train_defaults_become_config() {
        let cli = Cli::try_parse_from(["yn-qa-classifier", "train"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.model, "bert-base-uncased");
        assert_eq!(cfg.max_length, 25);
        assert_eq!(cfg.lr, 3e-5);
        assert_eq!(cfg.device, ComputeDevice::Cpu);
    }

    #[test]
    fn test_predict_requires_answer() {
        assert!(Cli::try_parse_from(["yn-qa-classifier", "predict", "--question", "Coming?"]).is_err());
    }

    #[test]
    fn test_evaluate_epoch_and_device() {
        let cli = Cli::try_parse_from(["yn-qa-classifier", "evaluate", "--epoch", "2", "--device", "wgpu"]).unwrap();
        let Commands::Evaluate(args) = cli.command else { panic!("expected evaluate") };
        assert_eq!(args.epoch, Some(2));
        assert_eq!(args.device, Some(commands::DeviceArg::Wgpu));
    }
}
