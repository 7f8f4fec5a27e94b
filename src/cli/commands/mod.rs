mod config;
mod inspect;
mod load;
mod search;

pub use config::ConfigCommand;
pub use inspect::InspectArgs;
pub use load::LoadArgs;
pub use search::SearchArgs;

pub use config::handle_config;
pub use inspect::handle_inspect;
pub use load::handle_load;
pub use search::handle_search;

use anyhow::{Context, Result};

use crate::models::Config;
use crate::services::{EmbeddedDocumentStore, EmbeddingClient, create_backend};

/// Wire the embedding server and the configured vector store together.
pub(crate) fn open_document_store(
    config: &Config,
    embedding_url: &str,
) -> Result<EmbeddedDocumentStore> {
    let embedder = EmbeddingClient::new(embedding_url, config.embedding_model.clone())
        .context("failed to create embedding client")?;
    let store = create_backend(&config.connection()).context("failed to open vector store")?;
    Ok(EmbeddedDocumentStore::new(Box::new(embedder), store))
}
