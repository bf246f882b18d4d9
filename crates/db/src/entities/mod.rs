//! Database entities.

#![allow(missing_docs)]

pub mod app_setting;
pub mod appointment;
pub mod candidate;
pub mod candidate_image;
pub mod category;
pub mod certificate;
pub mod news;
pub mod record;
pub mod social_media_link;
pub mod status;
pub mod subcategory;
pub mod user;
pub mod user_role;
pub mod vote;

pub use app_setting::Entity as AppSetting;
pub use appointment::Entity as Appointment;
pub use candidate::Entity as Candidate;
pub use candidate_image::Entity as CandidateImage;
pub use category::Entity as Category;
pub use certificate::Entity as Certificate;
pub use news::Entity as News;
pub use record::Entity as Record;
pub use social_media_link::Entity as SocialMediaLink;
pub use status::ReviewStatus;
pub use subcategory::Entity as Subcategory;
pub use user::Entity as User;
pub use user_role::Entity as UserRole;
pub use vote::Entity as Vote;
