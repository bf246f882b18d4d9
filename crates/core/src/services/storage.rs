//! Bucketed file uploads, signed links and file serving.

use std::sync::Arc;

use chrono::Utc;
use owr_common::{
    AppError, AppResult, Bucket, StorageBackend, UploadedFile, UrlSigner, generate_storage_key,
    storage::content_type_for,
};

/// A file ready to be written to the response.
#[derive(Debug)]
pub struct ServedFile {
    pub data: Vec<u8>,
    pub content_type: &'static str,
}

/// Optional signature presented with a file request.
#[derive(Debug, Default, Clone)]
pub struct FileSignature {
    pub expires: Option<i64>,
    pub signature: Option<String>,
}

/// Storage service.
#[derive(Clone)]
pub struct StorageService {
    backend: Arc<dyn StorageBackend>,
    signer: UrlSigner,
    max_upload_bytes: usize,
}

impl StorageService {
    /// Create a new storage service.
    #[must_use]
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        signer: UrlSigner,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            backend,
            signer,
            max_upload_bytes,
        }
    }

    /// Store an upload under a generated key.
    ///
    /// Public buckets get a plain URL; private ones get a signed link.
    pub async fn upload(
        &self,
        bucket: Bucket,
        original_name: &str,
        data: &[u8],
    ) -> AppResult<UploadedFile> {
        if data.is_empty() {
            return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
        }
        if data.len() > self.max_upload_bytes {
            return Err(AppError::BadRequest(format!(
                "File exceeds the {} byte upload limit",
                self.max_upload_bytes
            )));
        }

        let key = generate_storage_key(original_name);
        let content_type = content_type_for(&key);
        let mut uploaded = self.backend.upload(bucket, &key, data, content_type).await?;

        if !bucket.is_public() {
            uploaded.url = self.signer.sign(bucket, &key, Utc::now())?.url;
        }

        tracing::info!(bucket = %bucket, key = %key, size = uploaded.size, "File uploaded");
        Ok(uploaded)
    }

    /// Read a file for download. Private buckets need a valid signature.
    pub async fn serve(
        &self,
        bucket: Bucket,
        key: &str,
        signature: FileSignature,
    ) -> AppResult<ServedFile> {
        if !bucket.is_public() {
            let (Some(expires), Some(signature)) = (signature.expires, signature.signature) else {
                return Err(AppError::Forbidden(
                    "A signed URL is required for this file".to_string(),
                ));
            };
            self.signer
                .verify(bucket, key, expires, &signature, Utc::now())?;
        }

        let data = self.backend.read(bucket, key).await?;
        Ok(ServedFile {
            data,
            content_type: content_type_for(key),
        })
    }
}

/// Whether a file name carries a common image extension.
#[must_use]
pub fn is_image(file_name: &str) -> bool {
    content_type_for(file_name).starts_with("image/")
}
