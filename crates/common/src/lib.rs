//! Shared building blocks for the BoroHub Media crates: configuration
//! ([`Config`]), the error type every layer returns ([`AppError`]), row ID
//! generation and the media storage backend.

pub mod config;
pub mod error;
pub mod id;
pub mod storage;

pub use config::{AuthConfig, Config, DatabaseConfig, ServerConfig, StorageSettings};
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use storage::{LocalStorage, StorageBackend, UploadedFile, generate_storage_key};
