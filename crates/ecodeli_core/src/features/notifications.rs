//! Role notification feeds.
//!
//! # Responsibility
//! - Map notification DTOs of all five roles onto [`NotificationFeedItem`].
//! - Load feed and activity lists for a role.
//!
//! # Invariants
//! - Every mapping is total: unknown sources fall back to the role default,
//!   unknown severities map to `None` (read), except for admin feeds where
//!   any present value maps to `Info`.
//! - Role feeds show relative timestamps; the admin feed shows absolute ones.

use crate::api::{ApiClient, ApiError, ApiTransport, FeatureError, PageRequest};
use crate::model::notification::{NotificationActivityItem, NotificationFeedItem, Severity};
use crate::normalize::format::{format_date_time, format_relative};
use crate::normalize::{
    normalize_enum, normalize_optional_enum, pick_first_defined, sanitize_key, text_or, AliasTable,
    IdValue,
};
use chrono::{DateTime, Utc};
use log::{error, info};
use serde::Deserialize;

/// Notification DTO; the union of every historical field name.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationDto {
    pub id: IdValue,
    pub title: Option<String>,
    pub message: Option<String>,
    pub body: Option<String>,
    pub content: Option<String>,
    pub description: Option<String>,
    pub created_at: Option<String>,
    pub created_on: Option<String>,
    pub timestamp: Option<String>,
    pub source: Option<String>,
    pub category: Option<String>,
    pub domain: Option<String>,
    pub channel: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub module: Option<String>,
    pub topic: Option<String>,
    pub severity: Option<String>,
    pub severity_level: Option<String>,
    pub level: Option<String>,
    pub icon: Option<String>,
    pub icon_key: Option<String>,
}

/// Role owning a notification page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationRole {
    Admin,
    Client,
    Courier,
    Merchant,
    Provider,
}

const ADMIN_SOURCES: &AliasTable<&str> = &[
    ("DELIVERIES", "Livraisons"),
    ("DELIVERY", "Livraisons"),
    ("OPERATIONS", "Livraisons"),
    ("CAMPAIGN", "Campagnes"),
    ("CAMPAIGNS", "Campagnes"),
    ("MARKETING", "Campagnes"),
    ("FINANCE", "Finance"),
    ("BILLING", "Finance"),
    ("PAYMENT", "Finance"),
    ("PAYMENTS", "Finance"),
    ("COURIER", "Livreurs"),
    ("COURIERS", "Livreurs"),
    ("ONBOARDING", "Livreurs"),
];

const CLIENT_SOURCES: &AliasTable<&str> = &[
    ("ETA", "Suivi & ETA"),
    ("TRACKING", "Suivi & ETA"),
    ("SUIVI", "Suivi & ETA"),
    ("PAYMENT", "Paiement"),
    ("BILLING", "Paiement"),
    ("FACTURATION", "Paiement"),
    ("CAMPAIGN", "Annonces & offres"),
    ("PROMOTION", "Annonces & offres"),
    ("MARKETING", "Annonces & offres"),
    ("SUPPORT", "Support"),
    ("HELP", "Support"),
    ("SECURITY", "Compte & sécurité"),
    ("ACCOUNT", "Compte & sécurité"),
    ("SECURITE", "Compte & sécurité"),
];

const COURIER_SOURCES: &AliasTable<&str> = &[
    ("REAL_TIME", "Temps réel"),
    ("REALTIME", "Temps réel"),
    ("TEMPS_REEL", "Temps réel"),
    ("PROOF", "Preuves de livraison"),
    ("DELIVERY_PROOF", "Preuves de livraison"),
    ("PREUVES", "Preuves de livraison"),
    ("EARNINGS", "Gains"),
    ("PAYMENTS", "Gains"),
    ("GAINS", "Gains"),
    ("QUALITY", "Qualité & sécurité"),
    ("SECURITY", "Qualité & sécurité"),
    ("QUALITE", "Qualité & sécurité"),
    ("COMPLIANCE", "Conformité & dossiers"),
    ("CONFORMITE", "Conformité & dossiers"),
    ("DOCUMENTS", "Conformité & dossiers"),
];

const MERCHANT_SOURCES: &AliasTable<&str> = &[
    ("LOGISTICS", "Livraisons & exécution"),
    ("DELIVERY", "Livraisons & exécution"),
    ("LIVRAISON", "Livraisons & exécution"),
    ("CAPACITY", "Capacité & planning"),
    ("PLANNING", "Capacité & planning"),
    ("PLANIFICATION", "Capacité & planning"),
    ("FINANCE", "Finance & facturation"),
    ("BILLING", "Finance & facturation"),
    ("FACTURATION", "Finance & facturation"),
    ("QUALITY", "Qualité & retours clients"),
    ("CUSTOMER_FEEDBACK", "Qualité & retours clients"),
    ("ACCOUNT", "Compte & équipe"),
    ("TEAM", "Compte & équipe"),
    ("COMPTE", "Compte & équipe"),
];

/// Compared against the accent-free, uppercased key.
const PROVIDER_SOURCES: &AliasTable<&str> = &[
    ("ASSIGNMENT", "Affectations"),
    ("AFFECTATIONS", "Affectations"),
    ("MISSION", "Affectations"),
    ("MISSIONS", "Affectations"),
    ("DISPATCH", "Affectations"),
    ("ROUTING", "Affectations"),
    ("PERFORMANCE", "Performance"),
    ("OPERATIONS", "Performance"),
    ("KPI", "Performance"),
    ("OPERATIONSCORE", "Performance"),
    ("ANALYTICS", "Performance"),
    ("FINANCE", "Finance"),
    ("BILLING", "Finance"),
    ("FACTURATION", "Finance"),
    ("PAYMENTS", "Finance"),
    ("TRESORERIE", "Finance"),
    ("COMPLIANCE", "Conformité & contrats"),
    ("CONFORMITE", "Conformité & contrats"),
    ("CONTRATS", "Conformité & contrats"),
    ("CONTRACTS", "Conformité & contrats"),
    ("LEGAL", "Conformité & contrats"),
    ("INTEGRATIONS", "Intégrations techniques"),
    ("INTEGRATION", "Intégrations techniques"),
    ("TECHNIQUE", "Intégrations techniques"),
    ("TECHNICAL", "Intégrations techniques"),
    ("API", "Intégrations techniques"),
];

const ROLE_SEVERITIES: &AliasTable<Severity> = &[
    ("ERROR", Severity::Error),
    ("DANGER", Severity::Error),
    ("CRITICAL", Severity::Error),
    ("WARNING", Severity::Warning),
    ("WARN", Severity::Warning),
    ("SUCCESS", Severity::Success),
    ("POSITIVE", Severity::Success),
    ("INFO", Severity::Info),
    ("INFORMATION", Severity::Info),
];

const ADMIN_SEVERITIES: &AliasTable<Severity> = &[
    ("ERROR", Severity::Error),
    ("CRITICAL", Severity::Error),
    ("WARNING", Severity::Warning),
    ("WARN", Severity::Warning),
    ("SUCCESS", Severity::Success),
    ("OK", Severity::Success),
];

const PROVIDER_SEVERITIES: &AliasTable<Severity> = &[
    ("ERROR", Severity::Error),
    ("CRITICAL", Severity::Error),
    ("DANGER", Severity::Error),
    ("ALERTE", Severity::Error),
    ("WARNING", Severity::Warning),
    ("WARN", Severity::Warning),
    ("AVERTISSEMENT", Severity::Warning),
    ("SUCCESS", Severity::Success),
    ("OK", Severity::Success),
    ("POSITIVE", Severity::Success),
    ("VALIDE", Severity::Success),
    ("INFO", Severity::Info),
    ("INFORMATION", Severity::Info),
];

const COURIER_ICONS: &AliasTable<&str> = &[
    ("REALTIME", "realtime"),
    ("REAL_TIME", "realtime"),
    ("TEMPS_REEL", "realtime"),
    ("PROOF", "proof"),
    ("DELIVERY_PROOF", "proof"),
    ("EARNINGS", "earnings"),
    ("BONUS", "earnings"),
    ("QUALITY", "quality"),
    ("SECURITY", "quality"),
    ("COMPLIANCE", "compliance"),
    ("DOCUMENTS", "compliance"),
];

/// `(source label, icon key)` in display order; the first entry is the default.
const ADMIN_ICONS: &[(&str, &str)] = &[
    ("Livraisons", "delivery"),
    ("Campagnes", "campaign"),
    ("Finance", "finance"),
    ("Livreurs", "courier"),
];

const CLIENT_ICONS: &[(&str, &str)] = &[
    ("Commande & livraison", "orders"),
    ("Suivi & ETA", "eta"),
    ("Paiement", "payment"),
    ("Annonces & offres", "campaign"),
    ("Support", "support"),
    ("Compte & sécurité", "security"),
];

const COURIER_SOURCE_LABELS: &[(&str, &str)] = &[
    ("Missions", "missions"),
    ("Temps réel", "realtime"),
    ("Preuves de livraison", "proof"),
    ("Gains", "earnings"),
    ("Qualité & sécurité", "quality"),
    ("Conformité & dossiers", "compliance"),
];

const MERCHANT_ICONS: &[(&str, &str)] = &[
    ("Campagnes & annonces", "campaign"),
    ("Livraisons & exécution", "logistics"),
    ("Capacité & planning", "capacity"),
    ("Finance & facturation", "finance"),
    ("Qualité & retours clients", "quality"),
    ("Compte & équipe", "account"),
];

const PROVIDER_ICONS: &[(&str, &str)] = &[
    ("Disponibilités", "availability"),
    ("Affectations", "assignment"),
    ("Performance", "performance"),
    ("Finance", "finance"),
    ("Conformité & contrats", "compliance"),
    ("Intégrations techniques", "integrations"),
];

const NOTIFICATIONS_ENDPOINT: &str = "/notifications";

impl NotificationRole {
    pub const ALL: [NotificationRole; 5] = [
        Self::Admin,
        Self::Client,
        Self::Courier,
        Self::Merchant,
        Self::Provider,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "client" => Some(Self::Client),
            "courier" => Some(Self::Courier),
            "merchant" => Some(Self::Merchant),
            "provider" => Some(Self::Provider),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Client => "client",
            Self::Courier => "courier",
            Self::Merchant => "merchant",
            Self::Provider => "provider",
        }
    }

    fn source_icons(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Admin => ADMIN_ICONS,
            Self::Client => CLIENT_ICONS,
            Self::Courier => COURIER_SOURCE_LABELS,
            Self::Merchant => MERCHANT_ICONS,
            Self::Provider => PROVIDER_ICONS,
        }
    }

    /// Localized source labels, default first. Used as feed filter options.
    pub fn sources(self) -> Vec<&'static str> {
        self.source_icons().iter().map(|(label, _)| *label).collect()
    }

    pub fn default_source(self) -> &'static str {
        self.source_icons()[0].0
    }

    /// Feed endpoint and its query.
    pub fn feed_request(self) -> (String, PageRequest) {
        match self {
            Self::Admin | Self::Provider => (
                NOTIFICATIONS_ENDPOINT.to_string(),
                PageRequest::new().filter("mine", true),
            ),
            Self::Client => (
                NOTIFICATIONS_ENDPOINT.to_string(),
                PageRequest::new().filter("mine", true).sort("createdAt,desc"),
            ),
            Self::Courier | Self::Merchant => (
                format!("/{}/notifications", self.as_str()),
                PageRequest::first(50, "createdAt,desc"),
            ),
        }
    }

    /// Activity endpoint and its query.
    pub fn activity_request(self) -> (String, PageRequest) {
        match self {
            Self::Courier | Self::Merchant => (
                format!("/{}/notifications/activity", self.as_str()),
                PageRequest::first(20, "createdAt,desc"),
            ),
            other => other.feed_request(),
        }
    }

    /// Whether a 404 on the activity endpoint means "no activity yet".
    pub fn tolerates_missing_activity(self) -> bool {
        !matches!(self, Self::Admin)
    }

    fn default_title(self) -> &'static str {
        match self {
            Self::Admin => "Notification",
            Self::Client | Self::Courier => "Notification EcoDeli",
            Self::Merchant => "Notification commerçant",
            Self::Provider => "Notification prestataire",
        }
    }

    fn default_message(self) -> &'static str {
        match self {
            Self::Admin => "Nouvelle notification",
            Self::Courier => "Nouvelle mise à jour disponible.",
            Self::Client | Self::Merchant | Self::Provider => "Nouvelle notification disponible.",
        }
    }

    fn default_activity_title(self) -> &'static str {
        match self {
            Self::Admin => "Notification système",
            Self::Courier => "Suivi activité",
            Self::Client | Self::Merchant => "Suivi notification",
            Self::Provider => "Suivi prestataire",
        }
    }

    fn default_activity_description(self) -> &'static str {
        match self {
            Self::Admin => "Mise à jour récente",
            _ => "Mise à jour disponible.",
        }
    }

    pub fn feed_failure_message(self) -> &'static str {
        match self {
            Self::Admin => "Impossible de récupérer les notifications administrateur",
            Self::Client => "Impossible de récupérer les notifications client",
            Self::Courier => "Impossible de récupérer les notifications coursier",
            Self::Merchant => "Impossible de récupérer les notifications commerçant",
            Self::Provider => "Impossible de récupérer les notifications prestataire",
        }
    }

    pub fn activity_failure_message(self) -> &'static str {
        match self {
            Self::Admin => "Impossible de récupérer le journal des notifications administrateur",
            Self::Client => "Impossible de récupérer le journal des notifications client",
            Self::Courier => "Impossible de récupérer le journal des notifications",
            Self::Merchant => "Impossible de récupérer le journal des notifications commerçant",
            Self::Provider => "Impossible de récupérer le journal des notifications prestataire",
        }
    }

    /// Resolves the localized source label of `dto`.
    pub fn normalize_source(self, dto: &NotificationDto) -> &'static str {
        let default = self.default_source();
        match self {
            Self::Admin => {
                let raw = pick_first_defined(&[
                    dto.domain.as_deref(),
                    dto.category.as_deref(),
                    dto.channel.as_deref(),
                ]);
                normalize_admin_source(raw)
            }
            Self::Client => normalize_enum(dto.source.as_deref(), CLIENT_SOURCES, default),
            Self::Courier => normalize_enum(dto.source.as_deref(), COURIER_SOURCES, default),
            Self::Merchant => {
                let raw = pick_first_defined(&[
                    dto.source.as_deref(),
                    dto.kind.as_deref(),
                    dto.category.as_deref(),
                ]);
                normalize_enum(raw, MERCHANT_SOURCES, default)
            }
            Self::Provider => {
                let raw = pick_first_defined(&[
                    dto.source.as_deref(),
                    dto.category.as_deref(),
                    dto.kind.as_deref(),
                    dto.module.as_deref(),
                    dto.topic.as_deref(),
                ]);
                let key = sanitize_key(raw);
                normalize_enum(Some(key.as_str()), PROVIDER_SOURCES, default)
            }
        }
    }

    /// Resolves the icon key for `source`, or from the DTO for couriers.
    pub fn icon(self, source: &str, dto: &NotificationDto) -> &'static str {
        if self == Self::Courier {
            let raw = pick_first_defined(&[dto.icon.as_deref(), dto.icon_key.as_deref()]);
            return normalize_enum(raw, COURIER_ICONS, "missions");
        }
        let icons = self.source_icons();
        icons
            .iter()
            .find(|(label, _)| *label == source)
            .map(|(_, icon)| *icon)
            .unwrap_or(icons[0].1)
    }

    pub fn normalize_severity(self, dto: &NotificationDto) -> Option<Severity> {
        match self {
            Self::Admin => {
                let raw = dto.severity.as_deref().filter(|value| !value.is_empty())?;
                Some(normalize_enum(Some(raw), ADMIN_SEVERITIES, Severity::Info))
            }
            Self::Client => {
                let raw = pick_first_defined(&[
                    dto.severity.as_deref(),
                    dto.severity_level.as_deref(),
                    dto.level.as_deref(),
                ]);
                normalize_optional_enum(raw, ROLE_SEVERITIES)
            }
            Self::Courier | Self::Merchant => {
                let raw = pick_first_defined(&[dto.severity.as_deref(), dto.level.as_deref()]);
                normalize_optional_enum(raw, ROLE_SEVERITIES)
            }
            Self::Provider => {
                let raw = pick_first_defined(&[dto.severity.as_deref(), dto.level.as_deref()]);
                let key = sanitize_key(raw);
                normalize_optional_enum(Some(key.as_str()), PROVIDER_SEVERITIES)
            }
        }
    }

    fn format_timestamp(self, raw: Option<&str>, now: DateTime<Utc>) -> String {
        match self {
            Self::Admin => format_date_time(raw),
            _ => format_relative(raw, now),
        }
    }
}

fn normalize_admin_source(raw: Option<&str>) -> &'static str {
    let default = ADMIN_ICONS[0].0;
    let Some(raw) = raw.filter(|value| !value.is_empty()) else {
        return default;
    };
    if let Some(source) = normalize_optional_enum(Some(raw), ADMIN_SOURCES) {
        return source;
    }
    let lowered = raw.to_lowercase();
    if lowered.contains("finance") {
        "Finance"
    } else if lowered.contains("campaign") {
        "Campagnes"
    } else if lowered.contains("courier") || lowered.contains("livreur") {
        "Livreurs"
    } else {
        default
    }
}

/// Maps one DTO onto a feed item for `role`.
pub fn map_notification(
    role: NotificationRole,
    dto: &NotificationDto,
    now: DateTime<Utc>,
) -> NotificationFeedItem {
    let source = role.normalize_source(dto);
    let message = match role {
        NotificationRole::Client => text_or(
            &[
                dto.message.as_deref(),
                dto.body.as_deref(),
                dto.content.as_deref(),
            ],
            role.default_message(),
        ),
        _ => text_or(&[dto.message.as_deref()], role.default_message()),
    };
    let raw_timestamp = match role {
        NotificationRole::Admin => dto.created_at.as_deref(),
        NotificationRole::Client => pick_first_defined(&[
            dto.created_at.as_deref(),
            dto.created_on.as_deref(),
            dto.timestamp.as_deref(),
        ]),
        _ => pick_first_defined(&[dto.created_at.as_deref(), dto.timestamp.as_deref()]),
    };
    let category = match role {
        NotificationRole::Client | NotificationRole::Provider => {
            pick_first_defined(&[dto.category.clone(), dto.kind.clone()])
        }
        _ => dto.category.clone(),
    };

    NotificationFeedItem {
        id: dto.id.to_string(),
        title: text_or(&[dto.title.as_deref()], role.default_title()),
        message,
        timestamp: role.format_timestamp(raw_timestamp, now),
        source: Some(source.to_string()),
        category,
        severity: role.normalize_severity(dto),
        icon: Some(role.icon(source, dto).to_string()),
    }
}

/// Maps one DTO onto an activity line for `role`.
pub fn map_notification_activity(
    role: NotificationRole,
    dto: &NotificationDto,
    now: DateTime<Utc>,
) -> NotificationActivityItem {
    let (description, raw_timestamp) = match role {
        NotificationRole::Admin => (dto.message.as_deref(), dto.created_at.as_deref()),
        _ => (
            dto.description.as_deref(),
            pick_first_defined(&[dto.created_at.as_deref(), dto.timestamp.as_deref()]),
        ),
    };
    NotificationActivityItem {
        id: dto.id.to_string(),
        title: text_or(&[dto.title.as_deref()], role.default_activity_title()),
        description: text_or(&[description], role.default_activity_description()),
        timestamp: role.format_timestamp(raw_timestamp, now),
    }
}

/// Loads the notification feed of `role`.
///
/// # Errors
/// Any request failure, re-thrown with the role's localized message.
pub async fn fetch_notification_feed<T: ApiTransport>(
    client: &ApiClient<T>,
    role: NotificationRole,
    now: DateTime<Utc>,
) -> Result<Vec<NotificationFeedItem>, FeatureError> {
    let (path, request) = role.feed_request();
    match client.get_list::<NotificationDto>(&path, &request).await {
        Ok(page) => {
            info!(
                "event=notifications_fetch module=features status=ok role={} count={}",
                role.as_str(),
                page.content.len()
            );
            Ok(page
                .content
                .iter()
                .map(|dto| map_notification(role, dto, now))
                .collect())
        }
        Err(err) => Err(feature_failure(
            "notifications_fetch",
            role,
            role.feed_failure_message(),
            err,
        )),
    }
}

/// Loads the notification activity log of `role`.
///
/// # Errors
/// Request failures other than a tolerated 404, re-thrown localized.
pub async fn fetch_notification_activity<T: ApiTransport>(
    client: &ApiClient<T>,
    role: NotificationRole,
    now: DateTime<Utc>,
) -> Result<Vec<NotificationActivityItem>, FeatureError> {
    let (path, request) = role.activity_request();
    match client.get_list::<NotificationDto>(&path, &request).await {
        Ok(page) => Ok(page
            .content
            .iter()
            .map(|dto| map_notification_activity(role, dto, now))
            .collect()),
        Err(err) if err.is_not_found() && role.tolerates_missing_activity() => {
            info!(
                "event=notifications_activity module=features status=empty role={} \
                 reason=not_found",
                role.as_str()
            );
            Ok(Vec::new())
        }
        Err(err) => Err(feature_failure(
            "notifications_activity",
            role,
            role.activity_failure_message(),
            err,
        )),
    }
}

fn feature_failure(
    event: &str,
    role: NotificationRole,
    message: &str,
    err: ApiError,
) -> FeatureError {
    error!(
        "event={} module=features status=error role={} code={} error={}",
        event,
        role.as_str(),
        err.code(),
        err
    );
    FeatureError::new(message, err)
}
