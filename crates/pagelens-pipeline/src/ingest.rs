//! PDF directory ingestion

use crate::PipelineError;
use indicatif::{ProgressBar, ProgressStyle};
use pagelens_extractor::PdfExtractor;
use pagelens_llm::{VisionEnricher, VisionStatus};
use pagelens_store::VectorStore;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Totals of one ingest run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// PDFs processed
    pub documents: usize,
    /// Records produced by extraction
    pub records_extracted: usize,
    /// Entries written to the store
    pub records_stored: usize,
    /// Images the vision model described as JSON
    pub enriched: usize,
    /// Images whose vision reply was kept as raw text
    pub raw_fallbacks: usize,
    /// Images that could not be enriched
    pub vision_failures: usize,
    /// Pages without a raster
    pub raster_failures: usize,
    /// Embedded images that were dropped
    pub images_skipped: usize,
}

/// `*.pdf` files directly inside `dir`, sorted by file name
///
/// The extension match ignores case.
pub fn list_pdfs(dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let to_error = |source| PipelineError::PdfDirectory {
        path: dir.to_path_buf(),
        source,
    };

    let mut pdfs = Vec::new();
    for entry in fs::read_dir(dir).map_err(to_error)? {
        let path = entry.map_err(to_error)?.path();
        let is_pdf = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        if is_pdf && path.is_file() {
            pdfs.push(path);
        }
    }

    pdfs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(pdfs)
}

/// Extract → enrich → upsert for a directory of PDFs
pub struct IngestPipeline {
    extractor: PdfExtractor,
    enricher: Option<VisionEnricher>,
    store: VectorStore,
    show_progress: bool,
}

impl IngestPipeline {
    /// Create a pipeline. Without an enricher, image records carry no text
    /// and are dropped at upsert.
    pub fn new(extractor: PdfExtractor, enricher: Option<VisionEnricher>, store: VectorStore) -> Self {
        Self {
            extractor,
            enricher,
            store,
            show_progress: false,
        }
    }

    /// Draw a progress bar while enriching
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Target store
    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    /// Ingest every PDF in `pdf_dir`
    pub async fn run(&mut self, pdf_dir: &Path) -> Result<IngestReport, PipelineError> {
        let pdfs = list_pdfs(pdf_dir)?;
        let mut report = IngestReport::default();

        if pdfs.is_empty() {
            info!(dir = %pdf_dir.display(), "No PDF files found");
            return Ok(report);
        }

        for pdf in &pdfs {
            let name = pdf.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            info!("[PDF] {}", name);

            let extraction = self.extractor.extract(pdf)?;
            report.documents += 1;
            report.records_extracted += extraction.records.len();
            report.raster_failures += extraction.stats.raster_failures;
            report.images_skipped += extraction.stats.images_skipped;

            let mut records = extraction.records;
            let progress = self.progress_bar(records.len(), &name);

            for record in records.iter_mut() {
                if let (true, Some(enricher)) = (record.content_type.is_image(), &self.enricher) {
                    let Some(path) = record.image_path().map(Path::to_path_buf) else {
                        continue;
                    };
                    let outcome = enricher.enrich(&path).await;
                    match outcome.status {
                        VisionStatus::Parsed => report.enriched += 1,
                        VisionStatus::RawFallback => report.raw_fallbacks += 1,
                        VisionStatus::ImageUnreadable(_) | VisionStatus::RequestFailed(_) => {
                            report.vision_failures += 1
                        }
                    }
                    record.enrich(outcome.enrichment);
                }
                progress.inc(1);
            }
            progress.finish_and_clear();

            if self.enricher.is_none() {
                debug!(pdf = %name, "No vision model configured; image records left unenriched");
            }

            let upsert = self.store.upsert(&records).await?;
            report.records_stored += upsert.stored;
        }

        if report.vision_failures > 0 {
            warn!(failures = report.vision_failures, "Some images could not be enriched");
        }
        info!(
            documents = report.documents,
            stored = report.records_stored,
            "Ingest complete"
        );
        Ok(report)
    }

    fn progress_bar(&self, len: usize, name: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_message(format!("Processing records: {}", name));
        pb
    }
}
