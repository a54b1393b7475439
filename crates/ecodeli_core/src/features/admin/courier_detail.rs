//! Admin view of one courier: profile, compliance documents and activity.
//!
//! # Invariants
//! - A blank or `unknown` courier id issues no request.
//! - Every failure degrades to `None` or an empty list, logged at warn.

use crate::api::{ApiClient, ApiError, ApiTransport, PageRequest};
use crate::features::admin::couriers::{
    normalize_level, normalize_review_status, CourierLevel, COURIERS_ENDPOINT,
    COURIER_DOCUMENTS_ENDPOINT,
};
use crate::features::notifications::NotificationDto;
use crate::model::view::{ActivityRecord, AdminStatus};
use crate::normalize::format::{
    format_date_time, format_date_time_value, format_day_short_month, parse_timestamp,
};
use crate::normalize::{normalize_enum, pick_first_non_blank, text_or, AliasTable, IdValue};
use log::{info, warn};
use serde::{Deserialize, Serialize};

pub const UNKNOWN_COURIER_ID: &str = "unknown";
pub const COURIER_ACTIVITY_ENDPOINT: &str = "/notifications";

const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CourierProfileDto {
    pub id: IdValue,
    pub full_name: Option<String>,
    pub company_name: Option<String>,
    pub zone: Option<String>,
    pub level: Option<String>,
    pub status: Option<String>,
    pub completed_deliveries: Option<u32>,
    pub average_sla_minutes: Option<i64>,
    pub rating: Option<f64>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CourierDocumentDto {
    pub id: IdValue,
    pub document_type: Option<String>,
    pub description: Option<String>,
    pub uploaded_at: Option<String>,
    pub status: Option<String>,
    pub file_name: Option<String>,
    pub expires_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminCourierProfile {
    pub id: String,
    pub name: String,
    pub company: String,
    pub zone: String,
    pub level: CourierLevel,
    pub status: AdminStatus,
    pub deliveries: u32,
    pub rating: String,
    pub average_sla: String,
    pub contact_email: String,
    pub contact_phone: String,
}

/// Review state of one compliance document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentReviewStatus {
    Validated,
    InReview,
    Expired,
    Rejected,
    Draft,
    ToVerify,
}

const DOCUMENT_STATUSES: &AliasTable<DocumentReviewStatus> = &[
    ("APPROVED", DocumentReviewStatus::Validated),
    ("VALIDATED", DocumentReviewStatus::Validated),
    ("PENDING", DocumentReviewStatus::InReview),
    ("UNDER_REVIEW", DocumentReviewStatus::InReview),
    ("EXPIRED", DocumentReviewStatus::Expired),
    ("REJECTED", DocumentReviewStatus::Rejected),
    ("DRAFT", DocumentReviewStatus::Draft),
];

impl DocumentReviewStatus {
    pub fn parse(raw: Option<&str>) -> Self {
        normalize_enum(raw, DOCUMENT_STATUSES, Self::ToVerify)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Validated => "Validé",
            Self::InReview => "En revue",
            Self::Expired => "Expiré",
            Self::Rejected => "Rejeté",
            Self::Draft => "Brouillon",
            Self::ToVerify => "À vérifier",
        }
    }

    /// Chip palette key.
    pub fn tone(self) -> &'static str {
        match self {
            Self::Validated => "success",
            Self::InReview => "warning",
            Self::Expired | Self::Rejected => "error",
            Self::Draft => "default",
            Self::ToVerify => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourierDocument {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub meta: String,
    pub status: DocumentReviewStatus,
    pub file_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdminCourierDetail {
    pub profile: Option<AdminCourierProfile>,
    pub documents: Vec<CourierDocument>,
    pub activity: Vec<ActivityRecord>,
}

pub fn is_valid_courier_id(courier_id: &str) -> bool {
    let courier_id = courier_id.trim();
    !courier_id.is_empty() && courier_id != UNKNOWN_COURIER_ID
}

/// `N min`, `Nh N min`, or `N/A` when absent or zero.
pub fn format_sla(minutes: Option<i64>) -> String {
    match minutes.filter(|minutes| *minutes != 0) {
        None => NOT_AVAILABLE.to_string(),
        Some(minutes) if minutes / 60 == 0 => format!("{} min", minutes % 60),
        Some(minutes) => format!("{}h {} min", minutes / 60, minutes % 60),
    }
}

pub fn format_rating(rating: Option<f64>) -> String {
    match rating.filter(|rating| rating.is_finite()) {
        Some(rating) => format!("{rating:.1}/5"),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// `Ajouté le … • Expire le …`, skipping absent or unparsable sides.
pub fn document_meta(uploaded_at: Option<&str>, expires_at: Option<&str>) -> String {
    let uploaded = uploaded_at
        .and_then(parse_timestamp)
        .map(|value| format!("Ajouté le {}", format_date_time_value(&value)));
    let expires = expires_at
        .and_then(parse_timestamp)
        .map(|value| format!("Expire le {}", format_day_short_month(&value)));
    [uploaded, expires]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" • ")
}

pub fn map_courier_profile(dto: &CourierProfileDto) -> AdminCourierProfile {
    AdminCourierProfile {
        id: dto.id.to_string(),
        name: text_or(&[dto.full_name.as_deref()], "Livreur"),
        company: text_or(&[dto.company_name.as_deref()], "Entreprise non renseignée"),
        zone: text_or(&[dto.zone.as_deref()], "Zone non renseignée"),
        level: normalize_level(dto.level.as_deref()),
        status: normalize_review_status(dto.status.as_deref()),
        deliveries: dto.completed_deliveries.unwrap_or(0),
        rating: format_rating(dto.rating),
        average_sla: format_sla(dto.average_sla_minutes),
        contact_email: text_or(&[dto.email.as_deref()], "contact@ecodeli.fr"),
        contact_phone: text_or(&[dto.phone_number.as_deref()], "+33 1 80 02 12 34"),
    }
}

pub fn map_courier_document(dto: &CourierDocumentDto) -> CourierDocument {
    let title = text_or(&[dto.document_type.as_deref()], "Document");
    let file_name = match pick_first_non_blank(&[dto.file_name.as_deref()]) {
        Some(file_name) => file_name.to_string(),
        None => format!(
            "{}.pdf",
            text_or(&[dto.document_type.as_deref()], "document")
        ),
    };
    CourierDocument {
        id: dto.id.to_string(),
        title,
        description: pick_first_non_blank(&[dto.description.as_deref()]).map(str::to_string),
        meta: document_meta(dto.uploaded_at.as_deref(), dto.expires_at.as_deref()),
        status: DocumentReviewStatus::parse(dto.status.as_deref()),
        file_name,
    }
}

pub fn map_courier_activity(dto: &NotificationDto) -> ActivityRecord {
    ActivityRecord {
        id: dto.id.to_string(),
        title: text_or(
            &[dto.title.as_deref(), dto.category.as_deref()],
            "Notification",
        ),
        description: text_or(&[dto.message.as_deref()], "Mise à jour backoffice"),
        timestamp: format_date_time(dto.created_at.as_deref()),
    }
}

fn degraded(event: &str, err: &ApiError) {
    warn!(
        "event={} module=features status=degraded code={} error={}",
        event,
        err.code(),
        err
    );
}

/// Courier profile; `None` for an invalid id, a 404 or any failure.
pub async fn fetch_admin_courier_profile<T: ApiTransport>(
    client: &ApiClient<T>,
    courier_id: &str,
) -> Option<AdminCourierProfile> {
    if !is_valid_courier_id(courier_id) {
        return None;
    }
    let path = format!("{COURIERS_ENDPOINT}/{}", courier_id.trim());
    match client.get_optional::<CourierProfileDto>(&path).await {
        Ok(dto) => dto.as_ref().map(map_courier_profile),
        Err(err) => {
            degraded("admin_courier_profile", &err);
            None
        }
    }
}

pub async fn fetch_admin_courier_documents<T: ApiTransport>(
    client: &ApiClient<T>,
    courier_id: &str,
) -> Vec<CourierDocument> {
    if !is_valid_courier_id(courier_id) {
        return Vec::new();
    }
    let request =
        PageRequest::first(20, "uploadedAt,desc").filter("courierUserId", courier_id.trim());
    match client
        .get_list::<CourierDocumentDto>(COURIER_DOCUMENTS_ENDPOINT, &request)
        .await
    {
        Ok(page) => page.content.iter().map(map_courier_document).collect(),
        Err(err) => {
            degraded("admin_courier_documents", &err);
            Vec::new()
        }
    }
}

pub async fn fetch_admin_courier_activity<T: ApiTransport>(
    client: &ApiClient<T>,
    courier_id: &str,
) -> Vec<ActivityRecord> {
    if !is_valid_courier_id(courier_id) {
        return Vec::new();
    }
    let request = PageRequest::first(10, "createdAt,desc")
        .filter("mine", true)
        .filter("courierUserId", courier_id.trim());
    match client
        .get_list::<NotificationDto>(COURIER_ACTIVITY_ENDPOINT, &request)
        .await
    {
        Ok(page) => page.content.iter().map(map_courier_activity).collect(),
        Err(err) => {
            degraded("admin_courier_activity", &err);
            Vec::new()
        }
    }
}

/// Loads profile, documents and activity concurrently.
pub async fn fetch_admin_courier_detail<T: ApiTransport>(
    client: &ApiClient<T>,
    courier_id: &str,
) -> AdminCourierDetail {
    let (profile, documents, activity) = tokio::join!(
        fetch_admin_courier_profile(client, courier_id),
        fetch_admin_courier_documents(client, courier_id),
        fetch_admin_courier_activity(client, courier_id),
    );
    info!(
        "event=admin_courier_detail module=features status=ok found={} documents={} activity={}",
        profile.is_some(),
        documents.len(),
        activity.len()
    );
    AdminCourierDetail {
        profile,
        documents,
        activity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn courier_id_guard() {
        assert!(is_valid_courier_id("42"));
        assert!(!is_valid_courier_id(""));
        assert!(!is_valid_courier_id("  "));
        assert!(!is_valid_courier_id("unknown"));
    }

    #[test]
    fn sla_and_rating_labels() {
        assert_eq!(format_sla(None), "N/A");
        assert_eq!(format_sla(Some(0)), "N/A");
        assert_eq!(format_sla(Some(45)), "45 min");
        assert_eq!(format_sla(Some(125)), "2h 5 min");
        assert_eq!(format_rating(Some(4.87)), "4.9/5");
        assert_eq!(format_rating(None), "N/A");
    }

    #[test]
    fn profile_defaults() {
        let profile = map_courier_profile(&CourierProfileDto::default());
        assert_eq!(profile.name, "Livreur");
        assert_eq!(profile.company, "Entreprise non renseignée");
        assert_eq!(profile.level, CourierLevel::Bronze);
        assert_eq!(profile.status, AdminStatus::Pending);
        assert_eq!(profile.contact_email, "contact@ecodeli.fr");
        assert_eq!(profile.average_sla, "N/A");
    }

    #[test]
    fn document_meta_and_file_name() {
        let dto: CourierDocumentDto = serde_json::from_value(json!({
            "id": 3,
            "documentType": "Permis",
            "status": "validated",
            "uploadedAt": "2025-12-08T09:30:00Z",
            "expiresAt": "2026-02-03"
        }))
        .expect("document dto");
        let document = map_courier_document(&dto);
        assert_eq!(document.meta, "Ajouté le 08 déc., 09:30 • Expire le 03 févr.");
        assert_eq!(document.file_name, "Permis.pdf");
        assert_eq!(document.status.label(), "Validé");
        assert_eq!(document.status.tone(), "success");

        let bare = map_courier_document(&CourierDocumentDto::default());
        assert_eq!(bare.meta, "");
        assert_eq!(bare.file_name, "document.pdf");
        assert_eq!(bare.status, DocumentReviewStatus::ToVerify);
    }

    #[test]
    fn activity_title_falls_back_to_category() {
        let dto: NotificationDto =
            serde_json::from_value(json!({ "id": 1, "category": "Conformité" })).expect("dto");
        let line = map_courier_activity(&dto);
        assert_eq!(line.title, "Conformité");
        assert_eq!(line.description, "Mise à jour backoffice");
        assert_eq!(line.timestamp, "—");
    }
}
