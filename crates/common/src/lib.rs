//! Common utilities and shared types for storyvault.
//!
//! This crate provides foundational components used across all storyvault crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID entity ids and story access tokens via [`IdGenerator`]
//! - **Story lifetimes**: Named time-to-live tokens via [`StoryLifetime`] and
//!   bounded expiry windows via [`ExpiryWindow`]
//!
//! # Example
//!
//! ```
//! use storyvault_common::{IdGenerator, StoryLifetime};
//! use chrono::Utc;
//!
//! let id_gen = IdGenerator::new();
//! let access_token = id_gen.generate_access_token();
//! assert_eq!(access_token.len(), 10);
//!
//! let expires_at = StoryLifetime::parse("1h").expires_at(Utc::now());
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod lifetime;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use lifetime::{ExpiryWindow, StoryLifetime};
