use clap::Parser;
use toxguard_cli::commands;
use toxguard_cli::{Cli, Commands};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Train(args) => {
            println!("Training on {}", args.data_path.display());
            let summary = tokio::task::spawn_blocking(move || commands::train(&args)).await??;

            for stats in &summary.epochs {
                println!(
                    "  Epoch {}: loss {:.4}, accuracy {:.2}%",
                    stats.epoch, stats.avg_loss, stats.accuracy
                );
            }
            println!("  Training time: {:.1}s", summary.training_time.as_secs_f64());
            println!("  Weights: {}", summary.weights_path.display());
            println!("  Run: {}", summary.run_id);
        }

        Commands::Infer(args) => {
            let output = args.output.clone();
            let scored = tokio::task::spawn_blocking(move || commands::infer(&args)).await??;
            println!("Scored {} comments -> {}", scored, output.display());
        }

        Commands::Preprocess(args) => {
            let report = commands::preprocess(&args)?;
            println!(
                "Read {} rows: {} without positive target, {} with invalid dates",
                report.read, report.filtered_out, report.invalid_dates
            );
            println!("  {} -> {} rows", args.train_out.display(), report.train);
            println!("  {} -> {} rows", args.val_out.display(), report.validation);
        }

        Commands::Split(args) => {
            let report = commands::split(&args)?;
            println!("Read {} rows, {} with invalid dates", report.read, report.invalid_dates);
            println!(
                "  train: {}, validation: {}, production: {}",
                report.train, report.validation, report.production
            );
        }

        Commands::Replay(args) => {
            let mut stdout = std::io::stdout();
            let report = commands::replay(&args, &mut stdout).await?;
            eprintln!(
                "Replay finished: {} sent, {} failed, {} skipped of {}",
                report.sent, report.failed, report.skipped, report.total
            );
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "toxguard_cli=debug,toxguard_model=debug,toxguard_data=debug,toxguard_telemetry=debug"
    } else {
        "toxguard_cli=info,toxguard_model=info,toxguard_data=info,toxguard_telemetry=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
