use std::fmt::Write as FmtWrite;
use std::path::PathBuf;

use serde::Serialize;

use crate::models::{ChatDataset, OutputFormat, SearchResults};
use crate::services::LoadReport;

pub trait Formatter {
    fn format_load_report(&self, report: &LoadReport, collection: &str) -> String;
    fn format_search_results(&self, results: &SearchResults) -> String;
    fn format_datasets(&self, datasets: &[DatasetSummary]) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

/// Per-file view printed by `inspect`.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub path: Option<PathBuf>,
    pub total_messages: usize,
    pub clean_messages: usize,
    pub senders: Vec<String>,
}

impl From<&ChatDataset> for DatasetSummary {
    fn from(dataset: &ChatDataset) -> Self {
        Self {
            path: dataset.source().map(PathBuf::from),
            total_messages: dataset.total_messages(),
            clean_messages: dataset.total_clean_messages(),
            senders: dataset.senders().into_iter().map(String::from).collect(),
        }
    }
}

fn display_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map_or_else(|| "<memory>".to_string(), |p| p.display().to_string())
}

fn preview(text: &str, max_chars: usize) -> String {
    let head: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        format!("{}...", head)
    } else {
        head
    }
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_load_report(&self, report: &LoadReport, collection: &str) -> String {
        let mut output = String::new();
        writeln!(output, "Loading Complete").unwrap();
        writeln!(output, "----------------").unwrap();
        writeln!(output, "Collection: {}", collection).unwrap();
        writeln!(output, "Files: {}", report.files_total).unwrap();
        writeln!(output, "Files loaded: {}", report.files_loaded).unwrap();
        writeln!(output, "Files skipped: {}", report.files_skipped()).unwrap();
        for skipped in &report.skipped {
            writeln!(output, "  {}: {}", skipped.path.display(), skipped.reason).unwrap();
        }
        writeln!(output, "Messages: {}", report.messages).unwrap();
        writeln!(output, "Messages indexed: {}", report.clean_messages).unwrap();
        writeln!(output, "Duration: {}ms", report.duration_ms).unwrap();
        output
    }

    fn format_search_results(&self, results: &SearchResults) -> String {
        if results.is_empty() {
            return format!("No results found for: \"{}\"\n", results.query);
        }

        let mut output = String::new();
        writeln!(output, "Search results for: \"{}\"", results.query).unwrap();
        writeln!(
            output,
            "Found {} results in {}ms\n",
            results.len(),
            results.duration_ms
        )
        .unwrap();

        for (i, hit) in results.hits.iter().enumerate() {
            writeln!(output, "{}. [Score: {:.3}]", i + 1, hit.score).unwrap();
            writeln!(output, "   Sender: {}", hit.payload.sender).unwrap();
            writeln!(output, "   When: {}", hit.payload.when).unwrap();
            writeln!(output, "   ---").unwrap();
            for line in preview(&hit.payload.content, 200).lines() {
                writeln!(output, "   {}", line).unwrap();
            }
            writeln!(output).unwrap();
        }

        output
    }

    fn format_datasets(&self, datasets: &[DatasetSummary]) -> String {
        let mut output = String::new();
        for dataset in datasets {
            writeln!(output, "{}", display_path(&dataset.path)).unwrap();
            writeln!(output, "  Messages: {}", dataset.total_messages).unwrap();
            writeln!(output, "  Clean messages: {}", dataset.clean_messages).unwrap();
            writeln!(output, "  Senders: {}", dataset.senders.join(", ")).unwrap();
        }
        if datasets.is_empty() {
            writeln!(output, "No datasets loaded.").unwrap();
        }
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}\n", error)
    }
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render<T: Serialize + ?Sized>(&self, value: &T) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        let mut out = rendered.unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e));
        out.push('\n');
        out
    }
}

impl Formatter for JsonFormatter {
    fn format_load_report(&self, report: &LoadReport, collection: &str) -> String {
        let json = serde_json::json!({
            "collection": collection,
            "files_total": report.files_total,
            "files_loaded": report.files_loaded,
            "files_skipped": report.skipped,
            "messages": report.messages,
            "clean_messages": report.clean_messages,
            "duration_ms": report.duration_ms,
        });
        self.render(&json)
    }

    fn format_search_results(&self, results: &SearchResults) -> String {
        self.render(results)
    }

    fn format_datasets(&self, datasets: &[DatasetSummary]) -> String {
        self.render(&serde_json::json!({ "datasets": datasets }))
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", serde_json::json!({"message": message}))
    }

    fn format_error(&self, error: &str) -> String {
        format!("{}\n", serde_json::json!({"error": error}))
    }
}

pub struct MarkdownFormatter;

impl Formatter for MarkdownFormatter {
    fn format_load_report(&self, report: &LoadReport, collection: &str) -> String {
        let mut output = String::new();
        writeln!(output, "## Loading Complete\n").unwrap();
        writeln!(output, "| Metric | Value |").unwrap();
        writeln!(output, "|--------|-------|").unwrap();
        writeln!(output, "| Collection | `{}` |", collection).unwrap();
        writeln!(output, "| Files | {} |", report.files_total).unwrap();
        writeln!(output, "| Files loaded | {} |", report.files_loaded).unwrap();
        writeln!(output, "| Files skipped | {} |", report.files_skipped()).unwrap();
        writeln!(output, "| Messages | {} |", report.messages).unwrap();
        writeln!(output, "| Messages indexed | {} |", report.clean_messages).unwrap();
        writeln!(output, "| Duration | {}ms |", report.duration_ms).unwrap();
        if !report.skipped.is_empty() {
            writeln!(output, "\n### Skipped files\n").unwrap();
            for skipped in &report.skipped {
                writeln!(output, "- `{}`: {}", skipped.path.display(), skipped.reason).unwrap();
            }
        }
        output
    }

    fn format_search_results(&self, results: &SearchResults) -> String {
        let mut output = String::new();
        writeln!(output, "## Search Results\n").unwrap();
        writeln!(output, "**Query:** \"{}\"", results.query).unwrap();
        writeln!(
            output,
            "**Results:** {} ({}ms)\n",
            results.len(),
            results.duration_ms
        )
        .unwrap();

        for (i, hit) in results.hits.iter().enumerate() {
            writeln!(
                output,
                "### {}. {} ({:.3})\n",
                i + 1,
                hit.payload.sender,
                hit.score
            )
            .unwrap();
            writeln!(output, "*{}*\n", hit.payload.when).unwrap();
            for line in preview(&hit.payload.content, 500).lines() {
                writeln!(output, "> {}", line).unwrap();
            }
            writeln!(output).unwrap();
        }
        output
    }

    fn format_datasets(&self, datasets: &[DatasetSummary]) -> String {
        let mut output = String::new();
        writeln!(output, "## Datasets\n").unwrap();
        writeln!(output, "| File | Messages | Clean | Senders |").unwrap();
        writeln!(output, "|------|----------|-------|---------|").unwrap();
        for dataset in datasets {
            writeln!(
                output,
                "| `{}` | {} | {} | {} |",
                display_path(&dataset.path),
                dataset.total_messages,
                dataset.clean_messages,
                dataset.senders.join(", ")
            )
            .unwrap();
        }
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("> {}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("> ⚠️ **Error:** {}\n", error)
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Markdown => Box::new(MarkdownFormatter),
    }
}
