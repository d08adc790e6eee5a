//! Ingest command implementation.

use crate::cli::IngestArgs;
use crate::commands::Providers;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use pagelens_extractor::{EmbeddedImageScope, ExtractorConfig, PdfExtractor, PdfiumBackend};
use pagelens_llm::VisionEnricher;
use pagelens_pipeline::{IngestPipeline, IngestReport};
use pagelens_store::VectorStore;

/// Execute the ingest command.
pub async fn execute_ingest(args: IngestArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    if args.offline {
        eprintln!(
            "{}",
            formatter.info("Offline mode: local hashing embeddings, images are not enriched")
        );
    }

    let store_dir = args.store.clone();
    let report = run_ingest(args, config).await?;
    println!("{}", formatter.format_report(&report, &store_dir)?);
    Ok(())
}

/// Check credentials, bind PDFium and run the ingest pipeline.
pub async fn run_ingest(args: IngestArgs, config: &Config) -> Result<IngestReport> {
    // Nothing is touched on disk before the credential check
    let providers = Providers::resolve(config, args.offline)?;

    let mut extractor_config = ExtractorConfig::new(&args.store);
    extractor_config.dpi = args.dpi;
    extractor_config.max_pages = args.max_pages;
    if args.last_page_images {
        extractor_config.image_scope = EmbeddedImageScope::LastPageOnly;
    }

    let backend = PdfiumBackend::with_library_dir(config.pdfium_dir.as_ref())?;
    let extractor = PdfExtractor::new(Box::new(backend), extractor_config)?;

    let collection = args.collection.as_deref().unwrap_or(&config.store.collection);
    let store = VectorStore::open(&args.store, collection, providers.embedder)?;
    let enricher = providers.vision.map(VisionEnricher::new);

    let mut pipeline = IngestPipeline::new(extractor, enricher, store).with_progress(!args.no_progress);
    Ok(pipeline.run(&args.pdfs).await?)
}
