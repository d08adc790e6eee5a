//! pagelens CLI - index PDFs into a local vector store and query them.

use clap::Parser;
use pagelens_cli::commands;
use pagelens_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> pagelens_cli::Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Ingest reports per-PDF progress at info; the others only warn
    let default_level = match cli.verbose {
        0 if matches!(cli.command, Command::Ingest(_)) => "info",
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    init_tracing(default_level);

    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_process_env();
    config.validate().map_err(pagelens_cli::CliError::Config)?;

    let format = cli.format.map(Into::into).unwrap_or(config.output.format);
    let color_enabled = !cli.no_color && config.output.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Ingest(args) => commands::execute_ingest(args, &config, &formatter).await?,
        Command::Query(args) => commands::execute_query(args, &config, &formatter).await?,
        Command::Inspect(args) => commands::execute_inspect(args, &config, &formatter)?,
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` overrides the default level.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
