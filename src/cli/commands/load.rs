use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use super::open_document_store;
use crate::cli::output::get_formatter;
use crate::models::{
    AppLanguage, Config, ConfigFile, DEFAULT_COLLECTION_NAME, DEFAULT_EMBEDDING_MODEL,
    DEFAULT_EMBEDDING_URL, DEFAULT_QDRANT_PORT, OutputFormat,
};
use crate::services::{DataLoader, VectorStorePersister};

#[derive(Debug, Args)]
pub struct LoadArgs {
    #[arg(required = true, help = "Profile name, selects .whatsvector/<profile>.yaml")]
    pub profile: String,

    #[arg(required = true, help = "Exported chat .txt files")]
    pub files: Vec<PathBuf>,

    #[arg(long, short = 'H', help = "Qdrant host")]
    pub qdrant_host: Option<String>,

    #[arg(long, short = 'p', default_value_t = DEFAULT_QDRANT_PORT, help = "Qdrant port")]
    pub qdrant_port: u16,

    #[arg(long, short = 'a', env = "QDRANT_API_KEY", hide_env_values = true, help = "Qdrant API key")]
    pub qdrant_api_key: Option<String>,

    #[arg(long, help = "Connect to Qdrant over https")]
    pub qdrant_https: bool,

    #[arg(
        long = "local-path",
        short = 'l',
        help = "Store collections locally under this directory (overrides the host options)"
    )]
    pub qdrant_local_path: Option<PathBuf>,

    #[arg(long, short = 'e', default_value = DEFAULT_EMBEDDING_MODEL, help = "Embedding model")]
    pub embedding_model: String,

    #[arg(long, short = 'c', default_value = DEFAULT_COLLECTION_NAME, help = "Collection name")]
    pub collection_name: String,

    #[arg(long, default_value_t = AppLanguage::En, help = "Language of the exporting app: en or it")]
    pub app_language: AppLanguage,

    #[arg(long, env = "WHATSVECTOR_EMBEDDING_URL", default_value = DEFAULT_EMBEDDING_URL, help = "Embedding server URL")]
    pub embedding_url: String,

    #[arg(long, help = "Hide the progress bar")]
    pub no_progress: bool,

    #[arg(long, help = "Abort on the first unreadable file instead of skipping it")]
    pub raise_errors: bool,
}

impl LoadArgs {
    fn to_config(&self) -> Config {
        Config {
            qdrant_host: self.qdrant_host.clone(),
            qdrant_port: Some(self.qdrant_port),
            qdrant_api_key: self.qdrant_api_key.clone(),
            qdrant_https: self.qdrant_https,
            qdrant_local_path: self.qdrant_local_path.clone(),
            embedding_model: self.embedding_model.clone(),
            collection_name: self.collection_name.clone(),
        }
    }
}

/// A saved profile wins over the command line options.
fn resolve_config(args: &LoadArgs, config_file: &ConfigFile) -> Result<Config> {
    if config_file.exists() {
        tracing::info!(path = %config_file.path().display(), "Using saved profile configuration.");
        config_file
            .load()
            .with_context(|| format!("failed to load {}", config_file.path().display()))
    } else {
        Ok(args.to_config())
    }
}

pub async fn handle_load(args: LoadArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let config_file = ConfigFile::for_profile(&args.profile);
    handle_load_with(args, &config_file, format, verbose).await
}

async fn handle_load_with(
    args: LoadArgs,
    config_file: &ConfigFile,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let formatter = get_formatter(format);
    let had_config = config_file.exists();
    let config = resolve_config(&args, config_file)?;

    if verbose {
        eprintln!("Profile: {}", args.profile);
        eprintln!("  Collection: {}", config.collection_name);
        eprintln!("  Embedding model: {}", config.embedding_model);
        eprintln!("  Files: {}", args.files.len());
    }

    let store = open_document_store(&config, &args.embedding_url)?;
    let mut persister = VectorStorePersister::new(store, config.collection_name.clone());
    let loader = DataLoader::new(args.files)
        .with_language(args.app_language)
        .with_raise_errors(args.raise_errors);

    let report = loader
        .load_data(&mut persister, !args.no_progress)
        .await
        .context("loading failed")?;

    if !had_config {
        config_file
            .save(&config)
            .with_context(|| format!("failed to save {}", config_file.path().display()))?;
        tracing::info!(path = %config_file.path().display(), "Saved profile configuration.");
    }

    print!(
        "{}",
        formatter.format_load_report(&report, persister.collection())
    );
    Ok(())
}
