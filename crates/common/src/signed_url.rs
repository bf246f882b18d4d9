//! Time-limited signed URLs for stored files.
//!
//! A signature is `hex(HMAC-SHA256(secret, "{bucket}/{key}:{expires}"))`
//! where `expires` is a unix timestamp in seconds.

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;

use crate::storage::{Bucket, encode_key};
use crate::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

/// A signed link and the moment it stops working.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUrl {
    /// Absolute or base-relative URL including the signature query.
    pub url: String,
    /// Expiry instant.
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies file URLs.
#[derive(Clone)]
pub struct UrlSigner {
    secret: Vec<u8>,
    base_url: String,
    ttl: Duration,
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner")
            .field("base_url", &self.base_url)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl UrlSigner {
    /// Create a signer. An empty secret is a configuration error.
    pub fn new(secret: &str, base_url: impl Into<String>, ttl_secs: i64) -> AppResult<Self> {
        if secret.is_empty() {
            return Err(AppError::Config(
                "storage.signing_secret must not be empty".to_string(),
            ));
        }
        if ttl_secs <= 0 {
            return Err(AppError::Config(
                "storage.signed_url_ttl_secs must be positive".to_string(),
            ));
        }
        Ok(Self {
            secret: secret.as_bytes().to_vec(),
            base_url: base_url.into(),
            ttl: Duration::seconds(ttl_secs),
        })
    }

    /// Sign a URL valid for the configured lifetime from `now`.
    pub fn sign(&self, bucket: Bucket, key: &str, now: DateTime<Utc>) -> AppResult<SignedUrl> {
        let expires_at = now + self.ttl;
        let expires = expires_at.timestamp();
        let signature = hex::encode(self.mac(bucket, key, expires)?.finalize().into_bytes());

        Ok(SignedUrl {
            url: format!(
                "{}/{}/{}?expires={expires}&signature={signature}",
                self.base_url.trim_end_matches('/'),
                bucket,
                encode_key(key)
            ),
            expires_at,
        })
    }

    /// Check a presented signature. Expired or mismatched links are `Forbidden`.
    pub fn verify(
        &self,
        bucket: Bucket,
        key: &str,
        expires: i64,
        signature: &str,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        if now.timestamp() > expires {
            return Err(AppError::Forbidden("Signed URL has expired".to_string()));
        }

        let presented = hex::decode(signature)
            .map_err(|_| AppError::Forbidden("Malformed signature".to_string()))?;

        self.mac(bucket, key, expires)?
            .verify_slice(&presented)
            .map_err(|_| AppError::Forbidden("Invalid signature".to_string()))
    }

    fn mac(&self, bucket: Bucket, key: &str, expires: i64) -> AppResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AppError::Internal(format!("HMAC key error: {e}")))?;
        mac.update(format!("{bucket}/{key}:{expires}").as_bytes());
        Ok(mac)
    }
}
