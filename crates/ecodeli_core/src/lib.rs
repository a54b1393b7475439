//! Core domain logic for the EcoDeli logistics marketplace.
//! This crate is the single source of truth for normalization, the
//! notification feed model and per-role view mapping.

pub mod api;
pub mod config;
pub mod export;
pub mod features;
pub mod feed;
pub mod logging;
pub mod model;
pub mod normalize;

pub use api::{
    ApiClient, ApiError, ApiResult, ApiTransport, FeatureError, Page, PageRequest,
    ReqwestTransport,
};
pub use config::{ApiConfig, AppConfig, ConfigError, OidcConfig};
pub use export::{write_export, ExportError};
pub use feed::{FeedFilter, NotificationFeed, SearchKey, Visibility};
pub use features::notifications::{
    fetch_notification_activity, fetch_notification_feed, map_notification, NotificationRole,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::notification::{NotificationActivityItem, NotificationFeedItem, Severity};
pub use model::view::{ActivityRecord, AdminStatus, StatCard};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
