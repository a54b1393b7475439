//! Small view records shared by dashboard-style mappers.

use serde::{Deserialize, Serialize};

/// Stat card: label, headline value, optional helper line and icon key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatCard {
    pub label: String,
    pub value: String,
    pub helper: Option<String>,
    pub icon: Option<String>,
}

impl StatCard {
    pub fn new(label: &str, value: impl Into<String>, helper: impl Into<String>) -> Self {
        Self {
            label: label.to_string(),
            value: value.into(),
            helper: Some(helper.into()),
            icon: None,
        }
    }

    pub fn with_icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }
}

/// Timestamped activity line (payments, live deliveries, document reviews).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub timestamp: String,
}

/// Status vocabulary shared by admin tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminStatus {
    Pending,
    Review,
    Approved,
    Rejected,
    Paused,
    Scheduled,
    Active,
    Delivered,
    Cancelled,
    Delayed,
    Paid,
    Due,
    Overdue,
    Draft,
}

impl AdminStatus {
    /// French chip label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "En attente",
            Self::Review => "En revue",
            Self::Approved => "Validé",
            Self::Rejected => "Refusé",
            Self::Paused => "Suspendu",
            Self::Scheduled => "Planifiée",
            Self::Active => "En cours",
            Self::Delivered => "Livrée",
            Self::Cancelled => "Annulée",
            Self::Delayed => "Retard",
            Self::Paid => "Payée",
            Self::Due => "À régler",
            Self::Overdue => "En retard",
            Self::Draft => "Brouillon",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Review => "review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Paused => "paused",
            Self::Scheduled => "scheduled",
            Self::Active => "active",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Delayed => "delayed",
            Self::Paid => "paid",
            Self::Due => "due",
            Self::Overdue => "overdue",
            Self::Draft => "draft",
        }
    }
}
