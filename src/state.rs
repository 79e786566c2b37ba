//! Application state management

use std::path::PathBuf;
use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::{IdentityResolver, SqliteIdentityResolver};
use crate::config::Config;
use crate::pdf::{PageRasterizer, PdfEngine};
use crate::storage::FileStore;

/// Error type for state initialization
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Storage directory does not exist: {}", .0.display())]
    MissingDirectory(PathBuf),
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    db: SqlitePool,
    engine: PdfEngine,
    resolver: Arc<dyn IdentityResolver>,
}

impl AppState {
    /// Create application state with the SQLite identity resolver.
    ///
    /// Both storage directories must already exist.
    pub fn new(config: Config, db: SqlitePool) -> Result<Self, StateError> {
        let resolver = Arc::new(SqliteIdentityResolver::new(db.clone()));
        let engine = PdfEngine::new(Self::file_store(&config)?);
        Ok(Self::from_parts(config, db, engine, resolver))
    }

    /// Same as [`AppState::new`] with a custom page rasterizer
    pub fn with_rasterizer(
        config: Config,
        db: SqlitePool,
        rasterizer: Arc<dyn PageRasterizer>,
    ) -> Result<Self, StateError> {
        let resolver = Arc::new(SqliteIdentityResolver::new(db.clone()));
        let engine = PdfEngine::with_rasterizer(Self::file_store(&config)?, rasterizer);
        Ok(Self::from_parts(config, db, engine, resolver))
    }

    fn file_store(config: &Config) -> Result<FileStore, StateError> {
        for dir in [&config.storage.upload_dir, &config.storage.processed_dir] {
            if !dir.is_dir() {
                return Err(StateError::MissingDirectory(dir.clone()));
            }
        }

        Ok(FileStore::new(
            config.storage.upload_dir.clone(),
            config.storage.processed_dir.clone(),
        ))
    }

    fn from_parts(
        config: Config,
        db: SqlitePool,
        engine: PdfEngine,
        resolver: Arc<dyn IdentityResolver>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                db,
                engine,
                resolver,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the database pool
    pub fn db(&self) -> &SqlitePool {
        &self.inner.db
    }

    /// Get the PDF engine
    pub fn engine(&self) -> &PdfEngine {
        &self.inner.engine
    }

    /// Get the file store
    pub fn store(&self) -> &FileStore {
        self.inner.engine.store()
    }

    /// Get the identity resolver
    pub fn resolver(&self) -> &dyn IdentityResolver {
        self.inner.resolver.as_ref()
    }
}
