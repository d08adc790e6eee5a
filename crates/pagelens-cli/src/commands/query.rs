//! Query command implementation.

use crate::cli::QueryArgs;
use crate::commands::Providers;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use pagelens_pipeline::{QueryOutcome, QueryPipeline};
use pagelens_store::VectorStore;

/// Execute the query command.
pub async fn execute_query(args: QueryArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let outcome = run_query(args, config).await?;
    println!("{}", formatter.format_query(&outcome)?);
    Ok(())
}

/// Search the store and answer when asked.
pub async fn run_query(args: QueryArgs, config: &Config) -> Result<QueryOutcome> {
    if args.top_k == 0 {
        return Err(CliError::InvalidInput("--top_k must be at least 1".to_string()));
    }
    if args.query.trim().is_empty() {
        return Err(CliError::InvalidInput("--query must not be empty".to_string()));
    }

    let providers = Providers::resolve(config, args.offline)?;
    let collection = args.collection.as_deref().unwrap_or(&config.store.collection);
    let store = VectorStore::open(&args.store, collection, providers.embedder)?;

    let pipeline = QueryPipeline::new(store, providers.chat);
    Ok(pipeline.run(&args.query, args.top_k, args.answer).await?)
}
