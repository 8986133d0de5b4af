// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Uploaded image storage.
//!
//! Files are written flat into the upload directory under a generated name
//! `<unix_ts>_<16 hex chars><ext>`. The client-supplied file name only
//! contributes its extension.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Largest accepted upload (10 MiB).
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Accepted image extensions, lowercase with the leading dot.
pub const ALLOWED_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("file type not allowed, only .jpg, .jpeg and .png are accepted")]
    UnsupportedType,

    #[error("file exceeds the {MAX_UPLOAD_SIZE} byte limit")]
    TooLarge,

    #[error("file is empty")]
    Empty,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Lowercased extension (with dot) of an allowed image file name.
pub fn image_extension(file_name: &str) -> Result<String, MediaError> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .ok_or(MediaError::UnsupportedType)?;

    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(MediaError::UnsupportedType)
    }
}

fn unique_file_name(ext: &str) -> String {
    let ts = chrono::Utc::now().timestamp();
    let nonce = uuid::Uuid::new_v4();
    let digest = Sha256::digest(format!("{ext}{ts}{nonce}").as_bytes());
    let hex: String = digest.iter().take(8).map(|b| format!("{b:02x}")).collect();
    format!("{ts}_{hex}{ext}")
}

/// Upload directory handle.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the upload directory if needed.
    pub async fn initialize(&self) -> Result<(), MediaError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a stored file. Only the final component of `file_name` is used.
    pub fn path_of(&self, file_name: &str) -> PathBuf {
        let base = Path::new(file_name)
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_default();
        self.root.join(base)
    }

    /// Validate and write an upload. Returns the generated file name.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String, MediaError> {
        let ext = image_extension(original_name)?;
        if bytes.is_empty() {
            return Err(MediaError::Empty);
        }
        if bytes.len() > MAX_UPLOAD_SIZE {
            return Err(MediaError::TooLarge);
        }

        let file_name = unique_file_name(&ext);
        tokio::fs::write(self.path_of(&file_name), bytes).await?;

        tracing::debug!(file = %file_name, size = bytes.len(), "Stored upload");
        Ok(file_name)
    }

    /// Remove a stored file. A missing file is not an error.
    pub async fn delete(&self, file_name: &str) -> Result<(), MediaError> {
        match tokio::fs::remove_file(self.path_of(file_name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(file = %file_name, "Upload already gone");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
