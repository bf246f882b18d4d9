//! Common utilities and shared types for the OWR service.
//!
//! This crate provides foundational components used across all OWR crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Storage**: Bucketed file storage via [`StorageBackend`]
//! - **Signed URLs**: Time-limited file links via [`UrlSigner`]
//!
//! # Example
//!
//! ```no_run
//! use owr_common::{AppResult, Config, IdGenerator};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     println!("{} listening on port {}", id_gen.generate(), config.server.port);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod signed_url;
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use signed_url::{SignedUrl, UrlSigner};
pub use storage::{Bucket, LocalStorage, StorageBackend, UploadedFile, generate_storage_key};
