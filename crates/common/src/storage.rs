//! Object storage for uploaded files.
//!
//! Files live in named buckets. Public buckets are served to anyone; the
//! certificates bucket is only reachable through signed URLs.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{AppError, AppResult};

/// Storage bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    /// Issued certificate documents (private).
    Certificates,
    /// Site logos.
    Logos,
    /// News covers and record images.
    News,
    /// Candidate images.
    Candidates,
    /// Category and subcategory images.
    Categories,
}

impl Bucket {
    /// Every bucket, in directory-creation order.
    pub const ALL: [Self; 5] = [
        Self::Certificates,
        Self::Logos,
        Self::News,
        Self::Candidates,
        Self::Categories,
    ];

    /// Directory and URL segment name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Certificates => "certificates",
            Self::Logos => "logos",
            Self::News => "news",
            Self::Candidates => "candidates",
            Self::Categories => "categories",
        }
    }

    /// Whether files may be fetched without a signature.
    #[must_use]
    pub const fn is_public(self) -> bool {
        !matches!(self, Self::Certificates)
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Bucket {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| AppError::NotFound(format!("Unknown bucket: {s}")))
    }
}

/// Uploaded file metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    /// Bucket the file was written to.
    pub bucket: Bucket,
    /// Object key within the bucket.
    pub key: String,
    /// Public URL, or a signed link for private buckets.
    pub url: String,
    /// File size in bytes.
    pub size: u64,
    /// MIME content type.
    pub content_type: String,
    /// MD5 hash of the file.
    pub md5: String,
}

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Write a file, replacing any previous object with the same key.
    async fn upload(
        &self,
        bucket: Bucket,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> AppResult<UploadedFile>;

    /// Read a whole file.
    async fn read(&self, bucket: Bucket, key: &str) -> AppResult<Vec<u8>>;

    /// Delete a file. Deleting a missing file is not an error.
    async fn delete(&self, bucket: Bucket, key: &str) -> AppResult<()>;

    /// Unsigned URL for a key.
    fn public_url(&self, bucket: Bucket, key: &str) -> String;

    /// Check if a file exists.
    async fn exists(&self, bucket: Bucket, key: &str) -> AppResult<bool>;
}

/// Local filesystem storage backend.
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf, base_url: String) -> Self {
        Self {
            base_path,
            base_url,
        }
    }

    fn path_for(&self, bucket: Bucket, key: &str) -> AppResult<PathBuf> {
        validate_key(key)?;
        Ok(self.base_path.join(bucket.as_str()).join(key))
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn upload(
        &self,
        bucket: Bucket,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> AppResult<UploadedFile> {
        let path = self.path_for(bucket, key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write file: {e}")))?;

        let md5 = format!("{:x}", md5::compute(data));
        tracing::debug!(bucket = %bucket, key = %key, size = data.len(), "Stored file");

        Ok(UploadedFile {
            bucket,
            key: key.to_string(),
            url: self.public_url(bucket, key),
            size: data.len() as u64,
            content_type: content_type.to_string(),
            md5,
        })
    }

    async fn read(&self, bucket: Bucket, key: &str) -> AppResult<Vec<u8>> {
        let path = self.path_for(bucket, key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound(format!("File not found: {bucket}/{key}")))
            }
            Err(e) => Err(AppError::Storage(format!("Failed to read file: {e}"))),
        }
    }

    async fn delete(&self, bucket: Bucket, key: &str) -> AppResult<()> {
        let path = self.path_for(bucket, key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!("Failed to delete file: {e}"))),
        }
    }

    fn public_url(&self, bucket: Bucket, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            bucket,
            encode_key(key)
        )
    }

    async fn exists(&self, bucket: Bucket, key: &str) -> AppResult<bool> {
        let path = self.path_for(bucket, key)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to stat file: {e}")))
    }
}

/// Reject keys that could escape the bucket directory.
pub fn validate_key(key: &str) -> AppResult<()> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if bad {
        return Err(AppError::BadRequest(format!("Invalid storage key: {key}")));
    }
    Ok(())
}

/// Percent-encode each path segment of a key.
#[must_use]
pub fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Generate a unique storage key for a file.
#[must_use]
pub fn generate_storage_key(original_name: &str) -> String {
    use chrono::Utc;

    let date_path = Utc::now().format("%Y/%m/%d").to_string();

    let extension = original_name
        .rfind('.')
        .filter(|&pos| pos > 0 && pos < original_name.len() - 1)
        .map(|pos| &original_name[pos + 1..])
        .filter(|ext| ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map_or_else(|| "bin".to_string(), str::to_ascii_lowercase);

    format!("{date_path}/{}.{extension}", uuid::Uuid::new_v4())
}

/// Guess a MIME type from a key's extension.
#[must_use]
pub fn content_type_for(key: &str) -> &'static str {
    let ext = key.rsplit('.').next().unwrap_or_default().to_ascii_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}
