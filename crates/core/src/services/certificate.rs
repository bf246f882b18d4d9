//! Certificate requests, review and download.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use owr_common::{AppError, AppResult, Bucket, IdGenerator, SignedUrl, StorageBackend, UrlSigner};
use owr_db::{
    entities::{ReviewStatus, certificate, user},
    repositories::{CandidateRepository, CertificateRepository, UserRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::email::{self, Mailer};
use super::review::{Decision, ensure_transition, lost_race};

/// Input for requesting a certificate.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RequestCertificateInput {
    #[validate(length(min = 1, max = 64))]
    pub candidate_id: Option<String>,
    #[validate(length(min = 1, max = 256))]
    pub title: Option<String>,
}

/// Input for approving a certificate.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApproveCertificateInput {
    /// Key of an uploaded file in the certificates bucket.
    #[validate(length(min = 1, max = 512))]
    pub file_key: String,
}

/// Input for sending a certificate directly, skipping the request step.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IssueCertificateInput {
    #[validate(length(min = 1, max = 64))]
    pub user_id: String,
    #[validate(length(min = 1, max = 512))]
    pub file_key: String,
    #[validate(length(min = 1, max = 64))]
    pub candidate_id: Option<String>,
    #[validate(length(min = 1, max = 256))]
    pub title: Option<String>,
}

/// Admin listing row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateListItem {
    #[serde(flatten)]
    pub certificate: certificate::Model,
    pub user_email: Option<String>,
    pub candidate_name: Option<String>,
}

/// Certificate service.
#[derive(Clone)]
pub struct CertificateService {
    certificate_repo: CertificateRepository,
    user_repo: UserRepository,
    candidate_repo: CandidateRepository,
    storage: Arc<dyn StorageBackend>,
    signer: UrlSigner,
    mailer: Arc<dyn Mailer>,
    id_gen: IdGenerator,
}

impl CertificateService {
    /// Create a new certificate service.
    #[must_use]
    pub fn new(
        certificate_repo: CertificateRepository,
        user_repo: UserRepository,
        candidate_repo: CandidateRepository,
        storage: Arc<dyn StorageBackend>,
        signer: UrlSigner,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            certificate_repo,
            user_repo,
            candidate_repo,
            storage,
            signer,
            mailer,
            id_gen: IdGenerator::new(),
        }
    }

    /// Ask for a certificate. It starts out pending.
    pub async fn request(
        &self,
        user_id: &str,
        input: RequestCertificateInput,
    ) -> AppResult<certificate::Model> {
        input.validate()?;
        if let Some(candidate_id) = &input.candidate_id {
            self.candidate_repo.get_by_id(candidate_id).await?;
        }

        let model = certificate::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            candidate_id: Set(input.candidate_id),
            title: Set(input.title),
            status: Set(ReviewStatus::Pending),
            file_key: Set(None),
            requested_at: Set(Utc::now()),
            issued_at: Set(None),
            updated_at: Set(None),
        };

        let certificate = self.certificate_repo.create(model).await?;
        tracing::info!(
            certificate_id = %certificate.id,
            user_id = %user_id,
            "Certificate requested",
        );
        Ok(certificate)
    }

    /// The caller's certificates, newest request first.
    pub async fn my_certificates(&self, user_id: &str) -> AppResult<Vec<certificate::Model>> {
        self.certificate_repo.list_by_user(user_id).await
    }

    /// Every certificate with its owner's email and candidate name.
    pub async fn list_all(&self, limit: u64, offset: u64) -> AppResult<Vec<CertificateListItem>> {
        let certificates = self.certificate_repo.list_all(limit, offset).await?;

        let user_ids = unique(certificates.iter().map(|c| c.user_id.clone()));
        let candidate_ids = unique(certificates.iter().filter_map(|c| c.candidate_id.clone()));

        let emails: HashMap<String, String> = self
            .user_repo
            .find_by_ids(&user_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.email))
            .collect();
        let names: HashMap<String, String> = self
            .candidate_repo
            .find_by_ids(&candidate_ids)
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        Ok(certificates
            .into_iter()
            .map(|certificate| CertificateListItem {
                user_email: emails.get(&certificate.user_id).cloned(),
                candidate_name: certificate
                    .candidate_id
                    .as_ref()
                    .and_then(|id| names.get(id).cloned()),
                certificate,
            })
            .collect())
    }

    /// Approve a pending certificate, attaching its file.
    pub async fn approve(
        &self,
        id: &str,
        input: ApproveCertificateInput,
    ) -> AppResult<certificate::Model> {
        input.validate()?;
        self.ensure_file_exists(&input.file_key).await?;

        let current = self.certificate_repo.get_by_id(id).await?;
        ensure_transition("Certificate", id, current.status, ReviewStatus::Approved)?;

        let now = Utc::now();
        let changes = certificate::ActiveModel {
            status: Set(ReviewStatus::Approved),
            file_key: Set(Some(input.file_key.clone())),
            issued_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        };
        if !self
            .certificate_repo
            .transition_from_pending(id, changes)
            .await?
        {
            return Err(lost_race("Certificate", id));
        }

        let approved = certificate::Model {
            status: ReviewStatus::Approved,
            file_key: Some(input.file_key),
            issued_at: Some(now),
            updated_at: Some(now),
            ..current
        };

        tracing::info!(certificate_id = %id, "Certificate approved");
        self.notify_ready(&approved);
        Ok(approved)
    }

    /// Reject a pending certificate.
    pub async fn reject(&self, id: &str) -> AppResult<certificate::Model> {
        let current = self.certificate_repo.get_by_id(id).await?;
        ensure_transition("Certificate", id, current.status, Decision::Reject.target())?;

        let now = Utc::now();
        let changes = certificate::ActiveModel {
            status: Set(ReviewStatus::Rejected),
            updated_at: Set(Some(now)),
            ..Default::default()
        };
        if !self
            .certificate_repo
            .transition_from_pending(id, changes)
            .await?
        {
            return Err(lost_race("Certificate", id));
        }

        tracing::info!(certificate_id = %id, "Certificate rejected");
        Ok(certificate::Model {
            status: ReviewStatus::Rejected,
            updated_at: Some(now),
            ..current
        })
    }

    /// Create an already approved certificate for a user.
    pub async fn issue(&self, input: IssueCertificateInput) -> AppResult<certificate::Model> {
        input.validate()?;
        self.user_repo.get_by_id(&input.user_id).await?;
        if let Some(candidate_id) = &input.candidate_id {
            self.candidate_repo.get_by_id(candidate_id).await?;
        }
        self.ensure_file_exists(&input.file_key).await?;

        let now = Utc::now();
        let model = certificate::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(input.user_id),
            candidate_id: Set(input.candidate_id),
            title: Set(input.title),
            status: Set(ReviewStatus::Approved),
            file_key: Set(Some(input.file_key)),
            requested_at: Set(now),
            issued_at: Set(Some(now)),
            updated_at: Set(None),
        };

        let certificate = self.certificate_repo.create(model).await?;
        tracing::info!(
            certificate_id = %certificate.id,
            user_id = %certificate.user_id,
            "Certificate issued",
        );
        self.notify_ready(&certificate);
        Ok(certificate)
    }

    /// Signed download link for an approved certificate.
    ///
    /// Only the owner or an administrator may ask.
    pub async fn download(
        &self,
        caller: &user::Model,
        caller_is_admin: bool,
        id: &str,
    ) -> AppResult<SignedUrl> {
        let certificate = self.certificate_repo.get_by_id(id).await?;
        if certificate.user_id != caller.id && !caller_is_admin {
            return Err(AppError::Forbidden(
                "You do not own this certificate".to_string(),
            ));
        }

        match (&certificate.status, &certificate.file_key) {
            (ReviewStatus::Approved, Some(key)) => {
                self.signer.sign(Bucket::Certificates, key, Utc::now())
            }
            _ => Err(AppError::BadRequest(
                "Certificate has not been issued yet".to_string(),
            )),
        }
    }

    async fn ensure_file_exists(&self, key: &str) -> AppResult<()> {
        if self.storage.exists(Bucket::Certificates, key).await? {
            Ok(())
        } else {
            Err(AppError::BadRequest(format!(
                "No uploaded certificate file at {key}"
            )))
        }
    }

    fn notify_ready(&self, certificate: &certificate::Model) {
        let Some(key) = certificate.file_key.clone() else {
            return;
        };
        let user_repo = self.user_repo.clone();
        let signer = self.signer.clone();
        let mailer = self.mailer.clone();
        let user_id = certificate.user_id.clone();
        let certificate_id = certificate.id.clone();

        tokio::spawn(async move {
            let owner = match user_repo.find_by_id(&user_id).await {
                Ok(Some(owner)) => owner,
                Ok(None) => return,
                Err(e) => {
                    tracing::warn!(
                        certificate_id = %certificate_id,
                        error = %e,
                        "Could not load certificate owner",
                    );
                    return;
                }
            };
            let link = match signer.sign(Bucket::Certificates, &key, Utc::now()) {
                Ok(link) => link,
                Err(e) => {
                    tracing::warn!(
                        certificate_id = %certificate_id,
                        error = %e,
                        "Could not sign certificate link",
                    );
                    return;
                }
            };
            let message = email::certificate_ready(
                &owner.email,
                owner.full_name.as_deref(),
                &link.url,
                link.expires_at,
            );
            if let Err(e) = mailer.send(message).await {
                tracing::warn!(
                    certificate_id = %certificate_id,
                    error = %e,
                    "Certificate email failed",
                );
            }
        });
    }
}

fn unique(ids: impl Iterator<Item = String>) -> Vec<String> {
    let mut ids: Vec<String> = ids.collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}
