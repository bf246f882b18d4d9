//! API middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use owr_common::{AppResult, Config, LocalStorage, StorageBackend, UrlSigner};
use owr_core::{
    AnalyticsService, AppointmentService, CatalogService, CertificateService, Mailer,
    NewsService, RecordService, SettingsService, SocialLinkService, StorageService,
    TranslationService, UserService, VoteService,
};
use owr_db::repositories::{
    AppSettingRepository, AppointmentRepository, CandidateRepository, CategoryRepository,
    CertificateRepository, NewsRepository, RecordRepository, SocialLinkRepository,
    SubcategoryRepository, UserRepository, UserRoleRepository, VoteRepository,
};
use sea_orm::DatabaseConnection;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub catalog_service: CatalogService,
    pub vote_service: VoteService,
    pub certificate_service: CertificateService,
    pub appointment_service: AppointmentService,
    pub news_service: NewsService,
    pub record_service: RecordService,
    pub social_link_service: SocialLinkService,
    pub settings_service: SettingsService,
    pub storage_service: StorageService,
    pub translation_service: TranslationService,
    pub analytics_service: AnalyticsService,
}

impl AppState {
    /// Wire every service over one connection pool.
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: &Config,
        mailer: Arc<dyn Mailer>,
    ) -> AppResult<Self> {
        let user_repo = UserRepository::new(Arc::clone(&db));
        let role_repo = UserRoleRepository::new(Arc::clone(&db));
        let category_repo = CategoryRepository::new(Arc::clone(&db));
        let subcategory_repo = SubcategoryRepository::new(Arc::clone(&db));
        let candidate_repo = CandidateRepository::new(Arc::clone(&db));
        let vote_repo = VoteRepository::new(Arc::clone(&db));
        let certificate_repo = CertificateRepository::new(Arc::clone(&db));
        let appointment_repo = AppointmentRepository::new(Arc::clone(&db));
        let news_repo = NewsRepository::new(Arc::clone(&db));
        let record_repo = RecordRepository::new(Arc::clone(&db));
        let link_repo = SocialLinkRepository::new(Arc::clone(&db));
        let setting_repo = AppSettingRepository::new(db);

        let backend: Arc<dyn StorageBackend> = Arc::new(LocalStorage::new(
            config.storage.base_path.clone(),
            config.storage.public_base_url.clone(),
        ));
        let signer = UrlSigner::new(
            &config.storage.signing_secret,
            config.storage.absolute_files_url(&config.server.url),
            config.storage.signed_url_ttl_secs,
        )?;
        let storage_service = StorageService::new(
            Arc::clone(&backend),
            signer.clone(),
            config.server.max_upload_bytes,
        );

        Ok(Self {
            user_service: UserService::new(
                user_repo.clone(),
                role_repo,
                config.admin.clone(),
            ),
            catalog_service: CatalogService::new(
                category_repo,
                subcategory_repo,
                candidate_repo.clone(),
            ),
            vote_service: VoteService::new(candidate_repo.clone(), vote_repo.clone()),
            certificate_service: CertificateService::new(
                certificate_repo.clone(),
                user_repo.clone(),
                candidate_repo.clone(),
                backend,
                signer,
                Arc::clone(&mailer),
            ),
            appointment_service: AppointmentService::new(appointment_repo, mailer),
            news_service: NewsService::new(news_repo),
            record_service: RecordService::new(record_repo),
            social_link_service: SocialLinkService::new(link_repo),
            settings_service: SettingsService::new(setting_repo, storage_service.clone()),
            storage_service,
            translation_service: TranslationService::new(&config.translation)?,
            analytics_service: AnalyticsService::new(
                user_repo,
                vote_repo,
                certificate_repo,
                candidate_repo,
            ),
        })
    }
}

/// Authentication middleware.
///
/// Attaches the caller to the request when a valid bearer token is present.
/// Unknown tokens and banned accounts leave the request anonymous.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get(header::AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.user_service.authenticate_by_token(token.trim()).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) if e.is_server_error() => {
                tracing::warn!(error = %e, "Token lookup failed");
            }
            Err(_) => {}
        }
    }

    next.run(req).await
}
