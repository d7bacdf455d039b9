use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origins: vec![],
            max_age: 3600,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

/// Where uploaded file-store blobs live.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub blob_dir: PathBuf,
    /// Largest blob accepted, in bytes. Default: 16 MiB.
    #[serde(default = "default_max_blob_size")]
    pub max_blob_size: u64,
}

fn default_max_blob_size() -> u64 {
    16 * 1024 * 1024
}

/// Draft file editor settings.
#[derive(Debug, Deserialize, Clone)]
pub struct EditorConfig {
    /// Drafts older than this are ignored. Default: 24 hours.
    #[serde(default = "default_draft_max_age_hours")]
    pub draft_max_age_hours: i64,
}

fn default_draft_max_age_hours() -> i64 {
    24
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            draft_max_age_hours: default_draft_max_age_hours(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub editor: EditorConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("storage.blob_dir", "./data/blobs")?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., COURSEWARE__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("COURSEWARE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
