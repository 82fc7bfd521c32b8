//! Image uploads stored on local disk under `{root}/images/{folder}`.

use std::path::{Component, Path, PathBuf};

use uuid::Uuid;

use crate::config::UploadsConfig;
use crate::error::{AppError, AppResult};

pub const IMAGES_DIR: &str = "images";

#[derive(Debug, Clone)]
pub struct FileStorageService {
    root: PathBuf,
    max_bytes: u64,
    allowed_extensions: Vec<String>,
    public_url: String,
}

impl FileStorageService {
    pub fn new(config: &UploadsConfig, public_url: &str) -> Self {
        Self {
            root: PathBuf::from(&config.root),
            max_bytes: config.max_bytes,
            allowed_extensions: config
                .allowed_extensions
                .iter()
                .map(|e| e.to_ascii_lowercase())
                .collect(),
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    /// Directory served under `/images`.
    pub fn images_dir(&self) -> PathBuf {
        self.root.join(IMAGES_DIR)
    }

    /// Checks extension and size, then writes the bytes under a fresh name.
    /// Returns the relative path `images/{folder}/{file}`.
    pub async fn save(&self, folder: &str, original_name: &str, bytes: &[u8]) -> AppResult<String> {
        let extension = self.check_extension(original_name)?;
        if bytes.len() as u64 > self.max_bytes {
            return Err(AppError::bad_request(format!(
                "Maximum allowed file size is {} bytes",
                self.max_bytes
            )));
        }
        if bytes.is_empty() {
            return Err(AppError::bad_request("Uploaded file is empty"));
        }
        check_relative(folder)?;

        let directory = self.images_dir().join(folder);
        tokio::fs::create_dir_all(&directory)
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e).context("Failed to create upload directory"),
            })?;

        let file_name = format!("{}{}", Uuid::new_v4(), extension);
        tokio::fs::write(directory.join(&file_name), bytes)
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e).context("Failed to write uploaded file"),
            })?;

        let relative = format!("{IMAGES_DIR}/{folder}/{file_name}");
        tracing::info!(path = %relative, size = bytes.len(), "Stored upload");
        Ok(relative)
    }

    /// Removes a previously stored file. Missing files are not an error.
    pub async fn delete(&self, relative: &str) -> AppResult<()> {
        check_relative(relative)?;

        match tokio::fs::remove_file(self.root.join(relative)).await {
            Ok(()) => {
                tracing::info!(path = %relative, "Deleted upload");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Internal {
                source: anyhow::Error::from(e).context("Failed to delete file"),
            }),
        }
    }

    /// Absolute URL for a stored relative path; full URLs pass through.
    pub fn absolute_url(&self, relative: Option<&str>) -> Option<String> {
        let relative = relative.filter(|r| !r.is_empty())?;
        if relative.starts_with("http://") || relative.starts_with("https://") {
            return Some(relative.to_string());
        }
        Some(format!(
            "{}/{}",
            self.public_url,
            relative.trim_start_matches('/')
        ))
    }

    fn check_extension(&self, original_name: &str) -> AppResult<String> {
        let extension = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_ascii_lowercase()))
            .unwrap_or_default();

        if extension.is_empty() || !self.allowed_extensions.contains(&extension) {
            return Err(AppError::bad_request(format!(
                "Only {} files are allowed",
                self.allowed_extensions.join(", ")
            )));
        }
        Ok(extension)
    }
}

/// Rejects absolute paths and any `..` component.
fn check_relative(path: &str) -> AppResult<()> {
    let escapes = Path::new(path)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if path.is_empty() || escapes {
        return Err(AppError::bad_request(format!("Invalid file path: {path}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage(dir: &TempDir) -> FileStorageService {
        let config = UploadsConfig {
            root: dir.path().to_string_lossy().into_owned(),
            max_bytes: 16,
            ..UploadsConfig::default()
        };
        FileStorageService::new(&config, "http://localhost:5000/")
    }

    #[tokio::test]
    async fn test_save_and_delete() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);

        let relative = storage.save("products", "Photo.PNG", b"png-bytes").await.unwrap();
        assert!(relative.starts_with("images/products/"));
        assert!(relative.ends_with(".png"));
        assert!(dir.path().join(&relative).exists());

        storage.delete(&relative).await.unwrap();
        assert!(!dir.path().join(&relative).exists());
    }

    #[tokio::test]
    async fn test_rejects_disallowed_extension() {
        let dir = TempDir::new().unwrap();
        let result = storage(&dir).save("products", "script.exe", b"x").await;
        assert!(matches!(result, Err(AppError::BadRequest { .. })));
    }

    #[tokio::test]
    async fn test_rejects_oversized_file() {
        let dir = TempDir::new().unwrap();
        let result = storage(&dir).save("products", "a.jpg", &[0u8; 17]).await;
        match result {
            Err(AppError::BadRequest { message }) => assert!(message.contains("16 bytes")),
            other => panic!("Expected BadRequest, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delete_missing_file_is_ok() {
        let dir = TempDir::new().unwrap();
        assert!(storage(&dir).delete("images/products/nope.png").await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_rejects_escaping_paths() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        assert!(storage.delete("../etc/passwd").await.is_err());
        assert!(storage.delete("/etc/passwd").await.is_err());
        assert!(storage.delete("images/../../x").await.is_err());
    }

    #[test]
    fn test_absolute_url() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        assert_eq!(
            storage.absolute_url(Some("images/products/a.png")).as_deref(),
            Some("http://localhost:5000/images/products/a.png")
        );
        assert_eq!(
            storage.absolute_url(Some("https://cdn.test/a.png")).as_deref(),
            Some("https://cdn.test/a.png")
        );
        assert_eq!(storage.absolute_url(None), None);
        assert_eq!(storage.absolute_url(Some("")), None);
    }
}
