//! Per-role feature mappers and loaders.
//!
//! # Responsibility
//! - Own the raw DTOs of each screen, tolerant of historical field aliases.
//! - Map DTOs onto display records with pure functions.
//! - Load data through [`crate::api::ApiClient`].
//!
//! # Invariants
//! - Mappers never fail; every optional field has a display fallback.
//! - Loaders that re-throw wrap the cause in a localized
//!   [`crate::api::FeatureError`].

pub mod admin;
pub mod client;
pub mod courier;
pub mod merchant;
pub mod notifications;
pub mod provider;

use crate::api::{ApiError, FeatureError};
use log::error;

/// Logs a failed request and wraps it with the localized `message`.
pub(crate) fn failure(event: &str, message: &str, err: ApiError) -> FeatureError {
    error!(
        "event={} module=features status=error code={} error={}",
        event,
        err.code(),
        err
    );
    FeatureError::new(message, err)
}
