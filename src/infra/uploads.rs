//! Runtime upload storage and retrieval helpers.

use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use slug::slugify;
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};
use tracing::warn;
use uuid::Uuid;

use crate::domain::types::ArtifactKind;

/// Errors that can occur while interacting with the upload storage backend.
#[derive(Debug, Error)]
pub enum UploadStorageError {
    #[error("invalid stored path")]
    InvalidPath,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("uploaded file is empty")]
    EmptyPayload,
    #[error("uploaded file size exceeds supported range")]
    SizeOverflow,
}

/// An upload accepted at the HTTP boundary, already validated against the
/// MIME allow-list and size limit.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Result of storing an upload payload.
#[derive(Debug, Clone)]
pub struct StoredUpload {
    /// Path relative to the upload root, e.g. `syllabus/<uuid>-intro.pdf`.
    pub stored_path: String,
    pub size_bytes: i64,
}

/// Filesystem-backed upload storage rooted at a configured directory, with
/// one subdirectory per artifact kind.
#[derive(Debug)]
pub struct UploadStorage {
    root: PathBuf,
}

impl UploadStorage {
    /// Initialise storage rooted at the provided directory, creating it and
    /// the per-kind subdirectories if necessary.
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        for kind in [
            ArtifactKind::Syllabus,
            ArtifactKind::QuestionPaper,
            ArtifactKind::Notes,
        ] {
            std::fs::create_dir_all(root.join(kind.directory()))?;
        }
        Ok(Self { root })
    }

    /// Store the payload under the kind's subdirectory and return metadata
    /// describing the stored asset.
    pub async fn store(
        &self,
        kind: ArtifactKind,
        original_name: &str,
        data: Bytes,
    ) -> Result<StoredUpload, UploadStorageError> {
        if data.is_empty() {
            return Err(UploadStorageError::EmptyPayload);
        }

        let stored_path = build_stored_path(kind, original_name);
        let absolute = self.resolve(&stored_path)?;

        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&absolute).await?;
        if let Err(err) = file.write_all(&data).await {
            drop(file);
            let _ = fs::remove_file(&absolute).await;
            return Err(err.into());
        }
        file.flush().await?;

        let size_bytes =
            i64::try_from(data.len()).map_err(|_| UploadStorageError::SizeOverflow)?;

        Ok(StoredUpload {
            stored_path,
            size_bytes,
        })
    }

    /// Attempt to read the stored payload into memory.
    pub async fn read(&self, stored_path: &str) -> Result<Bytes, UploadStorageError> {
        let absolute = self.resolve(stored_path)?;
        let data = fs::read(absolute).await?;
        Ok(Bytes::from(data))
    }

    /// Remove the stored payload. Missing files are treated as success.
    pub async fn delete(&self, stored_path: &str) -> Result<(), UploadStorageError> {
        let absolute = self.resolve(stored_path)?;
        match fs::remove_file(&absolute).await {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(UploadStorageError::Io(err)),
        }
    }

    /// Best-effort removal of a batch of stored files, logging failures.
    /// Used after cascade deletes, where the rows are already gone.
    pub async fn delete_many(&self, stored_paths: &[String]) {
        for stored_path in stored_paths {
            if let Err(error) = self.delete(stored_path).await {
                warn!(path = %stored_path, %error, "failed to remove cascaded artifact file");
            }
        }
    }

    pub async fn exists(&self, stored_path: &str) -> bool {
        match self.resolve(stored_path) {
            Ok(absolute) => fs::try_exists(absolute).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    /// True when no stored files exist under any kind subdirectory.
    pub async fn is_empty(&self) -> bool {
        for kind in [
            ArtifactKind::Syllabus,
            ArtifactKind::QuestionPaper,
            ArtifactKind::Notes,
        ] {
            let dir = self.root.join(kind.directory());
            let mut entries = match fs::read_dir(dir).await {
                Ok(entries) => entries,
                Err(_) => continue,
            };
            if entries.next_entry().await.ok().flatten().is_some() {
                return false;
            }
        }
        true
    }

    /// Resolve the absolute filesystem path for a stored upload.
    fn resolve(&self, stored_path: &str) -> Result<PathBuf, UploadStorageError> {
        let relative = Path::new(stored_path);
        if relative.is_absolute()
            || relative
                .components()
                .any(|component| matches!(component, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(UploadStorageError::InvalidPath);
        }

        Ok(self.root.join(relative))
    }
}

fn build_stored_path(kind: ArtifactKind, original_name: &str) -> String {
    let identifier = Uuid::new_v4();
    let filename = sanitize_filename(original_name);
    format!("{}/{identifier}-{filename}", kind.directory())
}

fn sanitize_filename(original: &str) -> String {
    let path = Path::new(original);
    let stem = path
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or("upload");
    let mut base = slugify(stem);
    if base.is_empty() {
        base = "upload".to_string();
    }

    let extension = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.trim_matches('.').to_ascii_lowercase())
        .filter(|value| !value.is_empty());

    match extension {
        Some(ext) => format!("{base}.{ext}"),
        None => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_storage() -> UploadStorage {
        let root = std::env::temp_dir().join(format!("ateneo-test-{}", Uuid::new_v4()));
        UploadStorage::new(root).expect("storage root")
    }

    #[tokio::test]
    async fn store_and_read_roundtrip() {
        let storage = temp_storage();

        let stored = storage
            .store(
                ArtifactKind::Syllabus,
                "Intro Syllabus.PDF",
                Bytes::from_static(b"%PDF-1.7"),
            )
            .await
            .expect("store");

        assert!(stored.stored_path.starts_with("syllabus/"));
        assert!(stored.stored_path.ends_with(".pdf"));
        assert_eq!(stored.size_bytes, 8);

        let data = storage.read(&stored.stored_path).await.expect("read");
        assert_eq!(&data[..], b"%PDF-1.7");
    }

    #[tokio::test]
    async fn delete_tolerates_missing_file() {
        let storage = temp_storage();
        storage
            .delete("notes/does-not-exist.pdf")
            .await
            .expect("missing file is success");
    }

    #[tokio::test]
    async fn traversal_paths_are_rejected() {
        let storage = temp_storage();
        let result = storage.read("../outside.pdf").await;
        assert!(matches!(result, Err(UploadStorageError::InvalidPath)));
    }

    #[tokio::test]
    async fn empty_payload_is_rejected() {
        let storage = temp_storage();
        let result = storage
            .store(ArtifactKind::Notes, "empty.pdf", Bytes::new())
            .await;
        assert!(matches!(result, Err(UploadStorageError::EmptyPayload)));
    }

    #[test]
    fn sanitizes_awkward_filenames() {
        assert_eq!(sanitize_filename("My Notes (v2).pdf"), "my-notes-v2.pdf");
        assert_eq!(sanitize_filename("..."), "upload");
        assert_eq!(sanitize_filename("über.PDF"), "uber.pdf");
    }
}
