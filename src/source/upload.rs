//! Upload directory holding the document to answer from.

use super::{DocumentSource, UploadedDocument};
use crate::error::{EnkelError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A directory of uploaded files, wiped at session start.
#[derive(Debug, Clone)]
pub struct UploadDirectory {
    path: PathBuf,
}

impl UploadDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the directory with everything in it and create it empty.
    pub async fn reset(&self) -> Result<()> {
        if tokio::fs::try_exists(&self.path).await? {
            tokio::fs::remove_dir_all(&self.path).await?;
        }
        tokio::fs::create_dir_all(&self.path).await?;
        info!("Upload directory ready at {}", self.path.display());
        Ok(())
    }

    /// Write an uploaded document into the directory, returning its path.
    pub async fn store(&self, document: &UploadedDocument) -> Result<PathBuf> {
        let name = sanitize_filename(&document.filename)?;
        tokio::fs::create_dir_all(&self.path).await?;
        let target = self.path.join(name);
        tokio::fs::write(&target, &document.bytes).await?;
        debug!("Stored {} ({} bytes)", target.display(), document.bytes.len());
        Ok(target)
    }
}

/// Keep only the final path component; uploads cannot escape the directory.
fn sanitize_filename(filename: &str) -> Result<&str> {
    Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.starts_with('.'))
        .ok_or_else(|| EnkelError::InvalidInput(format!("Invalid upload file name: {}", filename)))
}

#[async_trait]
impl DocumentSource for UploadDirectory {
    async fn list_available(&self) -> Result<Vec<String>> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.path).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.starts_with('.') {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }

    async fn open(&self, name: &str) -> Result<UploadedDocument> {
        let name = sanitize_filename(name)?;
        UploadedDocument::from_path(&self.path.join(name)).await
    }
}
