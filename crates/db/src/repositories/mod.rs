//! Repository layer.

mod app_setting;
mod appointment;
mod candidate;
mod catalog;
mod certificate;
mod content;
mod user;
mod vote;

pub use app_setting::AppSettingRepository;
pub use appointment::AppointmentRepository;
pub use candidate::{CandidateRepository, CandidateWithImages};
pub use catalog::{CategoryRepository, SubcategoryRepository};
pub use certificate::CertificateRepository;
pub use content::{NewsRepository, RecordRepository, SocialLinkRepository};
pub use user::{UserRepository, UserRoleRepository};
pub use vote::{CastVote, VoteRepository};
