use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use std::time::Instant;

use super::open_document_store;
use crate::cli::output::get_formatter;
use crate::models::{ConfigFile, DEFAULT_EMBEDDING_URL, MessageFilter, OutputFormat, SearchResults};
use crate::services::DocumentStore;

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[arg(required = true, help = "Profile name used when loading")]
    pub profile: String,

    #[arg(required = true, help = "Search query text")]
    pub query: String,

    #[arg(long, short = 'n', default_value_t = 5, help = "Maximum number of results to return")]
    pub limit: u64,

    #[arg(long, help = "Only messages sent by this sender")]
    pub sender: Option<String>,

    #[arg(long, help = "Only messages sent before this date (YYYY-MM-DD)")]
    pub before: Option<NaiveDate>,

    #[arg(long, help = "Only messages sent after this date (YYYY-MM-DD)")]
    pub after: Option<NaiveDate>,

    #[arg(long, env = "WHATSVECTOR_EMBEDDING_URL", default_value = DEFAULT_EMBEDDING_URL, help = "Embedding server URL")]
    pub embedding_url: String,
}

impl SearchArgs {
    fn filter(&self) -> MessageFilter {
        MessageFilter {
            sender_equals: self.sender.clone(),
            date_before: self.before,
            date_after: self.after,
        }
    }
}

pub async fn handle_search(args: SearchArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let query = args.query.trim();
    if query.is_empty() {
        anyhow::bail!("search query cannot be empty");
    }
    if args.limit == 0 {
        anyhow::bail!("limit must be at least 1");
    }
    if let (Some(after), Some(before)) = (args.after, args.before)
        && after >= before
    {
        anyhow::bail!("--after must be earlier than --before");
    }

    let config_file = ConfigFile::for_profile(&args.profile);
    let config = config_file.load().with_context(|| {
        format!(
            "no configuration for profile '{}', run `whatsvector load` first",
            args.profile
        )
    })?;

    let formatter = get_formatter(format);
    let filter = args.filter();
    let start_time = Instant::now();

    if verbose {
        eprintln!("Query: \"{query}\"");
        eprintln!("  Collection: {}", config.collection_name);
        eprintln!("  Limit: {}", args.limit);
        if let Some(ref sender) = filter.sender_equals {
            eprintln!("  Sender: {sender}");
        }
        if let Some(after) = filter.date_after {
            eprintln!("  After: {after}");
        }
        if let Some(before) = filter.date_before {
            eprintln!("  Before: {before}");
        }
    }

    let store = open_document_store(&config, &args.embedding_url)?;
    if !store
        .collection_exists(&config.collection_name)
        .await
        .context("failed to reach vector store")?
    {
        anyhow::bail!(
            "collection '{}' does not exist, load some chats first",
            config.collection_name
        );
    }

    let filter = (!filter.is_empty()).then_some(filter);
    let hits = store
        .query(&config.collection_name, query, args.limit, filter.as_ref())
        .await
        .context("search failed")?;

    let duration_ms = start_time.elapsed().as_millis() as u64;
    if verbose {
        eprintln!("Total: {duration_ms}ms");
        eprintln!();
    }

    let results = SearchResults::new(query.to_string(), hits, duration_ms);
    print!("{}", formatter.format_search_results(&results));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    #[test]
    fn test_filter_from_args() {
        let cli = Cli::try_parse_from([
            "whatsvector",
            "search",
            "family",
            "birthday",
            "--before",
            "2024-03-01",
        ])
        .unwrap();
        let Commands::Search(args) = cli.command else {
            panic!("expected search");
        };
        let filter = args.filter();
        assert_eq!(filter.sender_equals, None);
        assert_eq!(filter.date_before, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert!(filter.has_date_bounds());
    }
}
