//! Upload collaborator: pushes a finished archive to remote storage.

use crate::config::Config;
use crate::ui::messages::info;
use crate::utils::path::file_name_or;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("no upload destination configured")]
    NotConfigured,

    #[error("backup file not found: {0}")]
    NotFound(PathBuf),

    #[error("upload destination unavailable: {0}")]
    Unavailable(PathBuf),

    #[error("upload rejected: {0}")]
    Rejected(String),

    #[error("I/O error during upload: {0}")]
    Io(#[from] io::Error),
}

/// Anything that can take a local archive and return a remote identifier.
pub trait Uploader: Send + Sync {
    fn upload(&self, local: &Path) -> Result<String, UploadError>;
}

/// Uploads into a folder of a locally mounted cloud drive
/// (`<root>/<folder>/<archive name>`).
#[derive(Debug, Clone)]
pub struct FolderUploader {
    root: PathBuf,
    folder: String,
}

impl FolderUploader {
    pub fn new<P: Into<PathBuf>>(root: P, folder: &str) -> Self {
        Self {
            root: root.into(),
            folder: folder.to_string(),
        }
    }

    /// Destination folder, created on first use. The drive root itself must
    /// already be mounted.
    fn find_or_create_folder(&self) -> Result<PathBuf, UploadError> {
        if !self.root.is_dir() {
            return Err(UploadError::Unavailable(self.root.clone()));
        }

        let target = if self.folder.trim().is_empty() {
            self.root.clone()
        } else {
            self.root.join(&self.folder)
        };

        if !target.is_dir() {
            fs::create_dir_all(&target)?;
            info(format!("Created remote folder '{}'", target.display()));
        }
        Ok(target)
    }
}

impl Uploader for FolderUploader {
    fn upload(&self, local: &Path) -> Result<String, UploadError> {
        if !local.is_file() {
            return Err(UploadError::NotFound(local.to_path_buf()));
        }

        let folder = self.find_or_create_folder()?;
        let dest = folder.join(file_name_or(local, "backup.zip"));

        info(format!("Uploading {} ...", local.display()));
        let bytes = fs::copy(local, &dest)?;
        info(format!("Upload completed: {} ({} bytes)", dest.display(), bytes));

        Ok(dest.to_string_lossy().to_string())
    }
}

/// Stand-in used when no destination is configured: every upload fails, so
/// backups are kept locally only.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledUploader;

impl Uploader for DisabledUploader {
    fn upload(&self, _local: &Path) -> Result<String, UploadError> {
        Err(UploadError::NotConfigured)
    }
}

/// Pick the uploader described by the configuration.
pub fn uploader_from_config(cfg: &Config) -> Arc<dyn Uploader> {
    match cfg.upload_path() {
        Some(root) => Arc::new(FolderUploader::new(root, &cfg.remote_folder)),
        None => Arc::new(DisabledUploader),
    }
}
