//! Subcommand execution

use crate::cli::{InferArgs, PreprocessArgs, ReplayArgs, SplitArgs, TrainArgs};
use anyhow::Context;
use std::io::Write;
use toxguard_data::{preprocess, split, PreprocessReport, ReplayClient, ReplayReport, SplitReport};
use toxguard_model::{
    write_results, CommentDataset, InferenceRunner, ToxicityDataset, Trainer, TrainingSummary,
};
use toxguard_telemetry::{ExperimentTracker, FileTracker, NoopTracker};
use tracing::info;

/// Fine-tune and write the weight file; blocking
pub fn train(args: &TrainArgs) -> anyhow::Result<TrainingSummary> {
    let config = args.resolve_config()?;
    std::fs::create_dir_all(&args.output_dir).with_context(|| {
        format!("failed to create output directory {}", args.output_dir.display())
    })?;

    let dataset = ToxicityDataset::from_csv(&args.data_path, config.max_rows)
        .with_context(|| format!("failed to read training data {}", args.data_path.display()))?;
    info!("Loaded {} training samples", dataset.len());

    // No run record is opened until the model has loaded.
    let tracking = config.tracking.clone();
    let mut trainer = Trainer::new(config, &args.output_dir)?;
    let mut tracker: Box<dyn ExperimentTracker> = if tracking.enabled {
        Box::new(FileTracker::start(&tracking.dir, &tracking.experiment)?)
    } else {
        Box::new(NoopTracker)
    };

    let summary = trainer.run(&dataset, tracker.as_mut())?;
    Ok(summary)
}

/// Score every comment and write the results table; blocking
pub fn infer(args: &InferArgs) -> anyhow::Result<usize> {
    let config = args.to_config();
    let dataset = CommentDataset::from_csv(&args.data_path)
        .with_context(|| format!("failed to read comments {}", args.data_path.display()))?;

    let runner = InferenceRunner::load(&config)?;
    let results = runner.run(&dataset)?;
    write_results(&config.output, &results)?;
    info!("Wrote {} scored comments to {}", results.len(), config.output.display());
    Ok(results.len())
}

pub fn preprocess(args: &PreprocessArgs) -> anyhow::Result<PreprocessReport> {
    Ok(preprocess::run(&args.to_config())?)
}

pub fn split(args: &SplitArgs) -> anyhow::Result<SplitReport> {
    Ok(split::run(&args.to_config())?)
}

/// Replay with dry-run lines going to `out`
pub async fn replay<W: Write>(args: &ReplayArgs, out: &mut W) -> anyhow::Result<ReplayReport> {
    let client = ReplayClient::new(args.resolve_config()?)?;
    Ok(client.run(out).await?)
}
