//! Core business logic for borohub.

pub mod services;

pub use services::*;
