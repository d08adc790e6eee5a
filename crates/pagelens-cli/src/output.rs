//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use pagelens_domain::{Metadata, MetadataValue, QueryHit};
use pagelens_pipeline::{AnswerStatus, IngestReport, QueryOutcome};
use pagelens_store::StoredEntry;
use serde_json::{json, Map, Value};
use std::path::Path;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Hit content shown in the results table
pub const HIT_PREVIEW_CHARS: usize = 180;

/// Entry content shown by `inspect`
pub const ENTRY_PREVIEW_CHARS: usize = 200;

const RULE_WIDTH: usize = 60;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a query outcome: hits, then the answer or a warning.
    pub fn format_query(&self, outcome: &QueryOutcome) -> Result<String> {
        match self.format {
            OutputFormat::Json => self.format_query_json(outcome),
            OutputFormat::Table => {
                let mut out = self.format_hits_table(&outcome.hits);
                match &outcome.answer {
                    AnswerStatus::NotRequested => {}
                    AnswerStatus::Answered(answer) => {
                        out.push_str("\n\n");
                        out.push_str(&self.rule("Answer"));
                        out.push('\n');
                        out.push_str(answer);
                    }
                    AnswerStatus::MissingCredential => {
                        out.push_str("\n\n");
                        out.push_str(&self.warning("OPENAI_API_KEY is required for answer synthesis."));
                    }
                }
                Ok(out)
            }
        }
    }

    fn format_query_json(&self, outcome: &QueryOutcome) -> Result<String> {
        let hits: Vec<Value> = outcome
            .hits
            .iter()
            .map(|hit| {
                json!({
                    "id": hit.id,
                    "distance": hit.distance,
                    "content": hit.content,
                    "metadata": metadata_json(&hit.metadata),
                })
            })
            .collect();

        let (answer, status) = match &outcome.answer {
            AnswerStatus::NotRequested => (Value::Null, "not_requested"),
            AnswerStatus::Answered(answer) => (Value::String(answer.clone()), "answered"),
            AnswerStatus::MissingCredential => (Value::Null, "missing_credential"),
        };

        Ok(serde_json::to_string_pretty(&json!({
            "query": outcome.query,
            "hits": hits,
            "answer": answer,
            "answer_status": status,
        }))?)
    }

    /// Format hits as a table.
    pub fn format_hits_table(&self, hits: &[QueryHit]) -> String {
        if hits.is_empty() {
            return self.colorize("No results found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["type", "page", "bbox", "text / extracted (trunc)", "image_path", "source"]);

        for hit in hits {
            let content_type = hit.content_type().map(|t| t.as_str().to_string()).unwrap_or_default();
            let page = hit.page().map(|p| p.to_string()).unwrap_or_default();
            let bbox = hit.bbox().map(|b| b.to_string()).unwrap_or_default();
            builder.push_record([
                content_type,
                page,
                bbox,
                truncate(&hit.content, HIT_PREVIEW_CHARS),
                hit.image_path().to_string(),
                hit.source().to_string(),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    /// Format an ingest summary.
    pub fn format_report(&self, report: &IngestReport, store: &Path) -> Result<String> {
        if self.format == OutputFormat::Json {
            let mut value = serde_json::to_value(report)?;
            if let Value::Object(map) = &mut value {
                map.insert("store".to_string(), Value::String(store.display().to_string()));
            }
            return Ok(serde_json::to_string_pretty(&value)?);
        }

        let mut builder = Builder::default();
        builder.push_record(["metric", "count"]);
        let rows = [
            ("documents", report.documents),
            ("records extracted", report.records_extracted),
            ("records stored", report.records_stored),
            ("images enriched", report.enriched),
            ("raw vision replies", report.raw_fallbacks),
            ("vision failures", report.vision_failures),
            ("raster failures", report.raster_failures),
            ("images skipped", report.images_skipped),
        ];
        for (metric, count) in rows {
            builder.push_record([metric.to_string(), count.to_string()]);
        }
        let mut table = builder.build();
        table.with(Style::rounded());

        Ok(format!(
            "{}\n{}",
            table,
            self.success(&format!("Ingested into {}", store.display()))
        ))
    }

    /// Format the `inspect` listing: count, sample ids, then each entry.
    pub fn format_inspect(&self, count: usize, entries: &[StoredEntry]) -> Result<String> {
        if self.format == OutputFormat::Json {
            let entries: Vec<Value> = entries
                .iter()
                .map(|e| {
                    json!({
                        "id": e.id,
                        "content": e.content,
                        "metadata": metadata_json(&e.metadata),
                    })
                })
                .collect();
            return Ok(serde_json::to_string_pretty(&json!({
                "count": count,
                "entries": entries,
            }))?);
        }

        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        let mut lines = vec![
            format!("{} {}", self.colorize("COUNT:", "cyan"), count),
            format!("{} {:?}", self.colorize("SAMPLE IDS:", "cyan"), ids),
        ];
        for entry in entries {
            lines.push("----".to_string());
            lines.push(format!("DOC: {}", truncate(&entry.content, ENTRY_PREVIEW_CHARS)));
            lines.push(format!("META: {}", metadata_json(&entry.metadata)));
        }
        Ok(lines.join("\n"))
    }

    /// A horizontal rule with a centered title.
    pub fn rule(&self, title: &str) -> String {
        let side = "─".repeat(RULE_WIDTH.saturating_sub(title.chars().count() + 2) / 2);
        self.colorize(&format!("{} {} {}", side, title, side), "cyan")
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Cut `text` to `max` characters, marking the cut with `…`.
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

/// Metadata as a JSON object, preserving value types.
pub fn metadata_json(metadata: &Metadata) -> Value {
    let map: Map<String, Value> = metadata
        .iter()
        .map(|(key, value)| {
            let value = match value {
                MetadataValue::Str(s) => Value::String(s.clone()),
                MetadataValue::Int(v) => Value::from(*v),
                MetadataValue::Float(v) => Value::from(*v),
            };
            (key.clone(), value)
        })
        .collect();
    Value::Object(map)
}
