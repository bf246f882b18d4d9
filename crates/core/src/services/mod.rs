//! Business logic services.

#![allow(missing_docs)]

pub mod analytics;
pub mod appointment;
pub mod catalog;
pub mod certificate;
pub mod content;
pub mod email;
pub mod review;
pub mod settings;
pub mod storage;
pub mod translation;
pub mod user;
pub mod validation;
pub mod vote;

pub use analytics::{AnalyticsService, AnalyticsSummary};
pub use appointment::{AppointmentService, BookAppointmentInput};
pub use catalog::{
    CandidateView, CatalogService, CategoryDeletion, CategoryInput, CreateCandidateInput,
    SubcategoryInput, UpdateCandidateInput,
};
pub use certificate::{
    ApproveCertificateInput, CertificateListItem, CertificateService, IssueCertificateInput,
    RequestCertificateInput,
};
pub use content::{
    CreateNewsInput, NewsService, RecordInput, RecordService, SocialLinkInput, SocialLinkService,
    UpdateNewsInput,
};
pub use email::{EmailMessage, EmailService, Mailer};
pub use review::Decision;
pub use settings::{Logo, SetSettingInput, SettingsService};
pub use storage::{FileSignature, ServedFile, StorageService};
pub use translation::{
    ChatCompletionsGateway, TranslateInput, TranslationGateway, TranslationResponse,
    TranslationService,
};
pub use user::{AuthSession, SignInInput, SignUpInput, UserProfile, UserService};
pub use vote::{CastVoteInput, VoteReceipt, VoteService};
