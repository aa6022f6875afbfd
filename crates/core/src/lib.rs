//! Core business logic for storyvault.

pub mod services;

pub use services::*;
