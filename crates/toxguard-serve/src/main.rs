use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use toxguard_model::{InferenceConfig, InferenceRunner, ModelScorer};
use toxguard_serve::cli::{Cli, Commands};
use toxguard_serve::{build_form_app, build_mock_app, run_server, AppState};
use toxguard_telemetry::metrics::init_prometheus;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Form {
            port,
            address,
            weights,
            pretrained,
            max_length,
            device,
            verbose,
        } => {
            init_logging(verbose);

            let addr: SocketAddr = format!("{}:{}", address, port).parse()?;
            let config = InferenceConfig {
                pretrained,
                weights,
                max_length,
                device,
                ..Default::default()
            };

            banner("Comment Form");
            println!("  Weights: {}", config.weights.display());
            println!("  Device:  {:?}", config.device);
            println!();
            println!("  Open http://{} in your browser", addr);
            println!();

            info!("Loading classifier from {}", config.weights.display());
            let runner =
                tokio::task::spawn_blocking(move || InferenceRunner::load(&config)).await??;
            let scorer = ModelScorer::new("bert-toxicity", runner);

            let state = AppState::new(Arc::new(scorer)).with_metrics(init_prometheus()?);
            run_server(build_form_app(state), addr).await?;
        }

        Commands::Mock {
            port,
            address,
            verbose,
        } => {
            init_logging(verbose);

            let addr: SocketAddr = format!("{}:{}", address, port).parse()?;

            banner("Mock Prediction Endpoint");
            println!("  POST http://{}/predict", addr);
            println!();

            run_server(build_mock_app(), addr).await?;
        }
    }

    Ok(())
}

fn banner(title: &str) {
    println!();
    println!("  ╔═══════════════════════════════════════════╗");
    println!("  ║                 TOXGUARD                  ║");
    println!("  ║{:^43}║", title);
    println!("  ╚═══════════════════════════════════════════╝");
    println!();
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "toxguard_serve=debug,toxguard_model=debug,tower_http=debug"
    } else {
        "toxguard_serve=info,toxguard_model=info,tower_http=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
