//! Inspect command implementation.

use crate::cli::InspectArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use pagelens_store::VectorStore;

/// Execute the inspect command.
///
/// Reads only; no model or credential is needed.
pub fn execute_inspect(args: InspectArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let collection = args.collection.as_deref().unwrap_or(&config.store.collection);
    let store = VectorStore::open_unbound(&args.store, collection)?;

    let count = store.count()?;
    let entries = store.peek(args.limit)?;
    println!("{}", formatter.format_inspect(count, &entries)?);
    Ok(())
}
