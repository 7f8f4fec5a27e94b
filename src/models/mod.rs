mod config;
mod dataset;
mod message;
mod search;

pub use config::{
    CONFIG_DIR, Config, ConfigFile, Connection, DEFAULT_COLLECTION_NAME, DEFAULT_EMBEDDING_MODEL,
    DEFAULT_EMBEDDING_URL, DEFAULT_QDRANT_HOST, DEFAULT_QDRANT_PORT, QDRANT_GRPC_PORT,
};
pub use dataset::{AppLanguage, ChatDataset};
pub use message::{CENTURY, Message, WHEN_FORMAT, format_when, parse_when};
pub use search::{MessageFilter, MessagePayload, OutputFormat, SearchHit, SearchResults};
