use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Multilingual model, chats are rarely in a single language.
pub const DEFAULT_EMBEDDING_MODEL: &str = "jinaai/jina-embeddings-v3";
pub const DEFAULT_COLLECTION_NAME: &str = "whatsvector_collection";
pub const DEFAULT_QDRANT_HOST: &str = "localhost";
pub const DEFAULT_QDRANT_PORT: u16 = 6333;
/// Port of the gRPC API the qdrant client talks to.
pub const QDRANT_GRPC_PORT: u16 = 6334;
pub const DEFAULT_EMBEDDING_URL: &str = "http://localhost:11411";
pub const CONFIG_DIR: &str = ".whatsvector";

/// Persisted settings of one profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub qdrant_host: Option<String>,

    #[serde(default = "default_qdrant_port")]
    pub qdrant_port: Option<u16>,

    #[serde(default)]
    pub qdrant_api_key: Option<String>,

    #[serde(default)]
    pub qdrant_https: bool,

    #[serde(default)]
    pub qdrant_local_path: Option<PathBuf>,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_collection_name")]
    pub collection_name: String,
}

fn default_qdrant_port() -> Option<u16> {
    Some(DEFAULT_QDRANT_PORT)
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_collection_name() -> String {
    DEFAULT_COLLECTION_NAME.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            qdrant_host: None,
            qdrant_port: default_qdrant_port(),
            qdrant_api_key: None,
            qdrant_https: false,
            qdrant_local_path: None,
            embedding_model: default_embedding_model(),
            collection_name: default_collection_name(),
        }
    }
}

/// Where the vector store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Connection {
    /// On-disk collections under a local directory.
    Local(PathBuf),
    Remote {
        host: String,
        port: u16,
        https: bool,
        api_key: Option<String>,
    },
}

impl Connection {
    /// gRPC endpoint for a remote connection.
    ///
    /// The REST default port is dialed as the gRPC port.
    pub fn url(&self) -> Option<String> {
        match self {
            Connection::Local(_) => None,
            Connection::Remote {
                host, port, https, ..
            } => {
                let scheme = if *https { "https" } else { "http" };
                let port = if *port == DEFAULT_QDRANT_PORT {
                    QDRANT_GRPC_PORT
                } else {
                    *port
                };
                Some(format!("{scheme}://{host}:{port}"))
            }
        }
    }
}

impl Config {
    /// Resolve connection settings. A local path wins over every network
    /// parameter.
    pub fn connection(&self) -> Connection {
        if let Some(ref path) = self.qdrant_local_path {
            tracing::warn!(
                path = %path.display(),
                "Local path provided, using local instance. Host, port, https, and api_key parameters will be ignored."
            );
            return Connection::Local(path.clone());
        }

        Connection::Remote {
            host: self
                .qdrant_host
                .clone()
                .unwrap_or_else(|| DEFAULT_QDRANT_HOST.to_string()),
            port: self.qdrant_port.unwrap_or(DEFAULT_QDRANT_PORT),
            https: self.qdrant_https,
            api_key: self.qdrant_api_key.clone(),
        }
    }
}

/// YAML file holding one profile's [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `.whatsvector/<profile>.yaml` under the working directory.
    pub fn for_profile(profile: &str) -> Self {
        Self::in_dir(Path::new(CONFIG_DIR), profile)
    }

    pub fn in_dir(dir: &Path, profile: &str) -> Self {
        Self::new(dir.join(format!("{profile}.yaml")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn load(&self) -> Result<Config, ConfigError> {
        if !self.exists() {
            return Err(ConfigError::NotFound(self.path.clone()));
        }
        let content = std::fs::read_to_string(&self.path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(config)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}
