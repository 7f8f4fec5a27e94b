use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::cli::output::{DatasetSummary, get_formatter};
use crate::models::{AppLanguage, OutputFormat};
use crate::services::{DataLoader, InMemoryPersister};

#[derive(Debug, Args)]
pub struct InspectArgs {
    #[arg(required = true, help = "Exported chat .txt files")]
    pub files: Vec<PathBuf>,

    #[arg(long, default_value_t = AppLanguage::En, help = "Language of the exporting app: en or it")]
    pub app_language: AppLanguage,

    #[arg(long, help = "Abort on the first unreadable file instead of skipping it")]
    pub raise_errors: bool,
}

pub async fn handle_inspect(args: InspectArgs, format: OutputFormat, _verbose: bool) -> Result<()> {
    let formatter = get_formatter(format);
    let loader = DataLoader::new(args.files)
        .with_language(args.app_language)
        .with_raise_errors(args.raise_errors);

    let mut memory = InMemoryPersister::new();
    let report = loader
        .load_data(&mut memory, false)
        .await
        .context("failed to parse exports")?;

    let summaries: Vec<DatasetSummary> =
        memory.datasets().iter().map(DatasetSummary::from).collect();
    print!("{}", formatter.format_datasets(&summaries));

    for skipped in &report.skipped {
        eprint!(
            "{}",
            formatter.format_error(&format!("skipped {}: {}", skipped.path.display(), skipped.reason))
        );
    }
    Ok(())
}
