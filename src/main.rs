use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sdxmon::config::Config;
use sdxmon::report::{status_table, ReportWriter};
use sdxmon::runner::Coordinator;

#[derive(Parser)]
#[command(
    name = "sdxmon",
    version,
    about = "Health monitor for a federated network of GeoNetwork/CSW catalog nodes",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe the catalog nodes and print a status table
    Status,

    /// Run a full monitoring cycle and write a Markdown report
    Report {
        /// Report output path
        #[arg(short, long, default_value = "report.md")]
        output: PathBuf,

        /// Custom Handlebars template for the report
        #[arg(long)]
        template: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(&cli.log_format, cli.verbose)?;

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    config.validate()?;

    match cli.command {
        Commands::Status => {
            status(config).await?;
        }

        Commands::Report { output, template } => {
            tracing::info!(output = %output.display(), "Starting report command");
            report(config, output, template).await?;
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("sdxmon=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("sdxmon=info,warn")
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    Ok(())
}

async fn status(config: Config) -> Result<()> {
    let coordinator = Coordinator::new(config)?;
    let nodes = coordinator.probe_nodes().await;
    print!("{}", status_table(&nodes));
    Ok(())
}

async fn report(config: Config, output: PathBuf, template: Option<PathBuf>) -> Result<()> {
    let coordinator = Coordinator::new(config)?;
    let cycle = coordinator.run_cycle().await;

    let writer = match &template {
        Some(path) => ReportWriter::with_template(path)?,
        None => ReportWriter::new()?,
    };
    writer.save(&cycle, &output)?;

    let summary = cycle.summary();
    tracing::info!(
        nodes_up = summary.nodes_up,
        nodes_down = summary.nodes_down,
        records_checked = summary.records_checked,
        invalid_records = summary.invalid_records,
        "Monitoring cycle completed"
    );
    println!("Report written to {}", output.display());
    Ok(())
}
