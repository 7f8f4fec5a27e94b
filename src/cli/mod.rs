//! CLI module for whatsvector.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use crate::models::OutputFormat;

/// Semantic search over exported WhatsApp chats.
#[derive(Debug, Parser)]
#[command(name = "whatsvector")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(
        long,
        short = 'f',
        global = true,
        help = "Output format: text, json, or markdown"
    )]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Parse chat exports and load them into a vector store collection
    Load(commands::LoadArgs),

    /// Search a loaded collection
    Search(commands::SearchArgs),

    /// Parse chat exports and print what they contain
    Inspect(commands::InspectArgs),

    /// Show profile configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppLanguage;

    #[test]
    fn test_parse_load() {
        let cli = Cli::try_parse_from([
            "whatsvector",
            "load",
            "family",
            "a.txt",
            "b.txt",
            "-H",
            "qdrant.internal",
            "-c",
            "family_chats",
            "--app-language",
            "it",
            "--raise-errors",
        ])
        .unwrap();

        let Commands::Load(args) = cli.command else {
            panic!("expected load");
        };
        assert_eq!(args.profile, "family");
        assert_eq!(args.files.len(), 2);
        assert_eq!(args.qdrant_host.as_deref(), Some("qdrant.internal"));
        assert_eq!(args.qdrant_port, 6333);
        assert_eq!(args.collection_name, "family_chats");
        assert_eq!(args.app_language, AppLanguage::It);
        assert!(args.raise_errors);
        assert!(!args.no_progress);
    }

    #[test]
    fn test_load_requires_files() {
        assert!(Cli::try_parse_from(["whatsvector", "load", "family"]).is_err());
    }

    #[test]
    fn test_parse_search_with_filters() {
        let cli = Cli::try_parse_from([
            "whatsvector",
            "--format",
            "json",
            "search",
            "family",
            "dinner plans",
            "--sender",
            "Alice",
            "--after",
            "2024-01-01",
        ])
        .unwrap();

        assert_eq!(cli.format, Some(OutputFormat::Json));
        let Commands::Search(args) = cli.command else {
            panic!("expected search");
        };
        assert_eq!(args.limit, 5);
        assert_eq!(args.sender.as_deref(), Some("Alice"));
        assert!(args.after.is_some());
        assert!(args.before.is_none());
    }

    #[test]
    fn test_rejects_bad_date() {
        let result =
            Cli::try_parse_from(["whatsvector", "search", "p", "q", "--before", "01/02/2024"]);
        assert!(result.is_err());
    }
}
