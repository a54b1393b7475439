//! Notification feed record.
//!
//! # Invariants
//! - `severity` presence doubles as the unread flag; clearing it is the only
//!   "mark as read" transition.
//! - `id` is expected to be unique but duplicates are tolerated.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Notification criticality. Presence also means "unread".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Success,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Success => "success",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of a role notification feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationFeedItem {
    pub id: String,
    pub title: String,
    pub message: String,
    /// Pre-formatted display string (relative or absolute).
    pub timestamp: String,
    /// Free-text channel label, matched by feed filters.
    pub source: Option<String>,
    pub category: Option<String>,
    /// `None` means read.
    pub severity: Option<Severity>,
    /// Presentational icon key resolved by the UI shell.
    pub icon: Option<String>,
}

impl NotificationFeedItem {
    /// Builds an unread-agnostic item with only the mandatory text fields.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            message: message.into(),
            timestamp: timestamp.into(),
            source: None,
            category: None,
            severity: None,
            icon: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn is_unread(&self) -> bool {
        self.severity.is_some()
    }
}

/// Activity log line shown next to a notification feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationActivityItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::{NotificationFeedItem, Severity};

    #[test]
    fn severity_serializes_in_lowercase() {
        let json = serde_json::to_string(&Severity::Warning).expect("serialize severity");
        assert_eq!(json, "\"warning\"");
    }

    #[test]
    fn unread_follows_severity_presence() {
        let item = NotificationFeedItem::new("n-1", "Titre", "Message", "Il y a 2 min");
        assert!(!item.is_unread());
        assert!(item.with_severity(Severity::Info).is_unread());
    }
}
