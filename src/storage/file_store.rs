//! Two-zone local file store
//!
//! Uploaded PDFs live in the uploads zone, operation outputs in the processed
//! zone. Files are addressed by bare generated filenames and are written with
//! create-new semantics, so an existing artifact is never overwritten.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::Utc;
use uuid::Uuid;

/// Which half of the store a filename refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Uploads,
    Processed,
}

/// Local filesystem store rooted at two configured directories
#[derive(Debug, Clone)]
pub struct FileStore {
    upload_dir: PathBuf,
    processed_dir: PathBuf,
}

impl FileStore {
    pub fn new(upload_dir: impl Into<PathBuf>, processed_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            processed_dir: processed_dir.into(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn processed_dir(&self) -> &Path {
        &self.processed_dir
    }

    fn root(&self, zone: Zone) -> &Path {
        match zone {
            Zone::Uploads => &self.upload_dir,
            Zone::Processed => &self.processed_dir,
        }
    }

    /// Path a filename maps to inside `zone`, or `None` if the name could
    /// escape the zone root.
    pub fn path_for(&self, zone: Zone, name: &str) -> Option<PathBuf> {
        is_plain_filename(name).then(|| self.root(zone).join(name))
    }

    /// Path of an existing regular file inside `zone`
    pub fn resolve(&self, zone: Zone, name: &str) -> Option<PathBuf> {
        self.path_for(zone, name).filter(|path| path.is_file())
    }

    /// Write `bytes` to a new file in `zone`; fails if the name is taken.
    pub fn write_new(&self, zone: Zone, name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let path = self.path_for(zone, name).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("invalid filename: {}", name))
        })?;

        let mut file = OpenOptions::new().write(true).create_new(true).open(&path)?;
        file.write_all(bytes)?;
        file.sync_all()?;

        Ok(path)
    }

    /// Store an uploaded PDF under a fresh name derived from the client's name.
    pub async fn store_upload(&self, original_name: &str, bytes: &[u8]) -> io::Result<String> {
        let sanitized = sanitize_filename(original_name);
        let (stem, ext) = split_extension(&sanitized);
        let filename = generate_filename(stem, ext.unwrap_or("pdf"));
        let path = self.upload_dir.join(&filename);

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        tokio::io::AsyncWriteExt::write_all(&mut file, bytes).await?;
        file.sync_all().await?;

        tracing::info!(filename = %filename, size = bytes.len(), "File saved");
        Ok(filename)
    }

    /// Read a processed artifact for download
    pub async fn read_processed(&self, name: &str) -> io::Result<Vec<u8>> {
        let path = self
            .path_for(Zone::Processed, name)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, name.to_string()))?;
        tokio::fs::read(path).await
    }

    /// Delete regular files older than `max_age` from both zones.
    ///
    /// Directories and `.gitkeep` markers are left alone; a file that cannot be
    /// removed is logged and skipped. Returns the number of files removed.
    pub fn remove_older_than(&self, max_age: Duration) -> io::Result<usize> {
        let cutoff = SystemTime::now()
            .checked_sub(max_age)
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let mut removed = 0;

        for root in [&self.upload_dir, &self.processed_dir] {
            if !root.exists() {
                continue;
            }

            for entry in fs::read_dir(root)? {
                let entry = entry?;
                let path = entry.path();
                let metadata = entry.metadata()?;

                if metadata.is_dir() || entry.file_name() == ".gitkeep" {
                    continue;
                }

                if metadata.modified()? < cutoff {
                    match fs::remove_file(&path) {
                        Ok(()) => {
                            removed += 1;
                            tracing::debug!(path = %path.display(), "Removed old file");
                        }
                        Err(e) => {
                            tracing::warn!(path = %path.display(), error = %e, "Could not remove file");
                        }
                    }
                }
            }
        }

        tracing::info!(removed, "Cleanup completed");
        Ok(removed)
    }
}

/// Build a collision-free filename: `{stem}_{YYYYmmdd_HHMMSS}_{suffix}.{ext}`
pub fn generate_filename(stem: &str, ext: &str) -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}_{}.{}", stem, timestamp, &suffix[..8], ext)
}

/// Reduce a client-supplied filename to a safe ASCII basename.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);

    let cleaned: String = base
        .trim()
        .chars()
        .map(|c| match c {
            c if c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_' => c,
            c if c.is_whitespace() => '_',
            _ => '\0',
        })
        .filter(|c| *c != '\0')
        .collect();

    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

/// Split `name.ext` into stem and extension
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    }
}

/// A bare filename with no directory components
fn is_plain_filename(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}
