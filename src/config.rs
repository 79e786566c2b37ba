//! Configuration management for the PDF engine server

use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub processing: ProcessingConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Client-submitted PDFs
    pub upload_dir: PathBuf,
    /// Operation outputs
    pub processed_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessingConfig {
    /// Upper bound on a single engine call
    pub timeout_secs: u64,
}

impl ProcessingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// API key for the first admin account, created only when no user exists
    pub bootstrap_api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            database: DatabaseConfig {
                url: "sqlite:./pdf_engine.db".to_string(),
            },
            storage: StorageConfig {
                upload_dir: PathBuf::from("uploads"),
                processed_dir: PathBuf::from("processed"),
            },
            processing: ProcessingConfig { timeout_secs: 300 },
            auth: AuthConfig {
                bootstrap_api_key: None,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        let defaults = Config::default();

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: env::var("SERVER_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(defaults.server.port),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(defaults.database.url),
            },
            storage: StorageConfig {
                upload_dir: env::var("UPLOAD_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.upload_dir),
                processed_dir: env::var("PROCESSED_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.processed_dir),
            },
            processing: ProcessingConfig {
                timeout_secs: env::var("PROCESSING_TIMEOUT_SECS")
                    .ok()
                    .and_then(|t| t.parse().ok())
                    .filter(|t| *t > 0)
                    .unwrap_or(defaults.processing.timeout_secs),
            },
            auth: AuthConfig {
                bootstrap_api_key: match env::var("BOOTSTRAP_API_KEY") {
                    Ok(key) if !key.trim().is_empty() => Some(key),
                    Ok(_) | Err(env::VarError::NotPresent) => None,
                    Err(e) => return Err(e),
                },
            },
        })
    }
}
