//! Courier onboarding review.
//!
//! # Responsibility
//! - Map courier applications onto review rows.
//! - Compute queue metrics from a five-way settle-all join.
//!
//! # Invariants
//! - Unknown review statuses fold to `pending`, unknown levels to Bronze.
//! - Validation time ignores couriers without both timestamps and clamps
//!   negative durations to zero.

use crate::api::{settle, ApiClient, ApiTransport, Page, PageRequest};
use crate::features::admin::{rows, total_or_len};
use crate::model::view::{ActivityRecord, AdminStatus, StatCard};
use crate::normalize::format::{format_date_time, format_day_month, parse_timestamp};
use crate::normalize::{
    normalize_enum, pick_first_non_blank, text_or, AliasTable, IdValue, DASH_PLACEHOLDER,
};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

pub const COURIERS_ENDPOINT: &str = "/admin/couriers";
pub const COURIER_DOCUMENTS_ENDPOINT: &str = "/admin/courier-documents";

const VALIDATION_ACTIVITY_LIMIT: usize = 6;
const MS_PER_HOUR: f64 = 3_600_000.0;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminCourierDto {
    pub id: IdValue,
    pub full_name: Option<String>,
    pub company_name: Option<String>,
    pub zone: Option<String>,
    pub level: Option<String>,
    pub status: Option<String>,
    pub documents_verified: Option<u32>,
    pub documents_total: Option<u32>,
    pub updated_at: Option<String>,
    pub submitted_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminCourierDocumentDto {
    pub id: IdValue,
    pub courier_id: Option<IdValue>,
    pub document_type: Option<String>,
    pub status: Option<String>,
    pub updated_at: Option<String>,
    pub reviewer_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CourierLevel {
    Bronze,
    Argent,
    Or,
}

impl CourierLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Bronze => "Bronze",
            Self::Argent => "Argent",
            Self::Or => "Or",
        }
    }
}

const REVIEW_STATUSES: &AliasTable<AdminStatus> = &[
    ("PENDING", AdminStatus::Pending),
    ("UNDER_REVIEW", AdminStatus::Review),
    ("REVIEW", AdminStatus::Review),
    ("APPROVED", AdminStatus::Approved),
    ("VALIDATED", AdminStatus::Approved),
    ("REJECTED", AdminStatus::Rejected),
    ("PAUSED", AdminStatus::Paused),
];

const LEVELS: &AliasTable<CourierLevel> = &[
    ("GOLD", CourierLevel::Or),
    ("OR", CourierLevel::Or),
    ("SILVER", CourierLevel::Argent),
    ("ARGENT", CourierLevel::Argent),
    ("BRONZE", CourierLevel::Bronze),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminCourierRow {
    pub id: String,
    pub name: String,
    pub company: String,
    pub zone: String,
    pub level: CourierLevel,
    pub status: AdminStatus,
    pub documents_verified: u32,
    pub documents_total: u32,
    pub last_update: String,
    pub submitted_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdminCouriersData {
    pub metrics: Vec<StatCard>,
    pub couriers: Vec<AdminCourierRow>,
    pub validation_activity: Vec<ActivityRecord>,
}

/// The five independent slices of the review screen.
#[derive(Debug, Clone, Default)]
pub struct CourierReviewSlices {
    pub couriers: Option<Page<AdminCourierDto>>,
    pub pending: Option<Page<AdminCourierDto>>,
    pub approved: Option<Page<AdminCourierDto>>,
    pub rejected: Option<Page<AdminCourierDto>>,
    pub documents: Option<Page<AdminCourierDocumentDto>>,
}

pub fn normalize_review_status(raw: Option<&str>) -> AdminStatus {
    normalize_enum(raw, REVIEW_STATUSES, AdminStatus::Pending)
}

pub fn normalize_level(raw: Option<&str>) -> CourierLevel {
    normalize_enum(raw, LEVELS, CourierLevel::Bronze)
}

/// `Il y a N min`, `Il y a N h`, then `DD/MM`; `—` when absent or invalid.
pub fn format_review_time(raw: Option<&str>, now: DateTime<Utc>) -> String {
    let Some(value) = raw.and_then(parse_timestamp) else {
        return DASH_PLACEHOLDER.to_string();
    };
    let diff_ms = (now - value.with_timezone(&Utc)).num_milliseconds();
    let minutes = (diff_ms as f64 / 60_000.0).round() as i64;
    if minutes < 60 {
        return format!("Il y a {minutes} min");
    }
    let hours = (minutes as f64 / 60.0).round() as i64;
    if hours < 24 {
        return format!("Il y a {hours} h");
    }
    format_day_month(&value)
}

pub fn map_courier_row(dto: &AdminCourierDto, now: DateTime<Utc>) -> AdminCourierRow {
    let verified = dto.documents_verified.unwrap_or(0);
    AdminCourierRow {
        id: dto.id.to_string(),
        name: text_or(&[dto.full_name.as_deref()], DASH_PLACEHOLDER),
        company: text_or(&[dto.company_name.as_deref()], DASH_PLACEHOLDER),
        zone: text_or(&[dto.zone.as_deref()], DASH_PLACEHOLDER),
        level: normalize_level(dto.level.as_deref()),
        status: normalize_review_status(dto.status.as_deref()),
        documents_verified: verified,
        documents_total: dto.documents_total.unwrap_or(verified),
        last_update: format_review_time(dto.updated_at.as_deref(), now),
        submitted_at: format_review_time(dto.submitted_at.as_deref(), now),
    }
}

pub fn map_document_activity(dto: &AdminCourierDocumentDto) -> ActivityRecord {
    let status = pick_first_non_blank(&[dto.status.as_deref()]);
    let description = match (pick_first_non_blank(&[dto.reviewer_name.as_deref()]), status) {
        (Some(reviewer), Some(status)) => format!("{reviewer} • {}", status.to_lowercase()),
        (Some(reviewer), None) => reviewer.to_string(),
        (None, Some(status)) => status.to_string(),
        (None, None) => "Mise à jour".to_string(),
    };
    ActivityRecord {
        id: dto.id.to_string(),
        title: text_or(&[dto.document_type.as_deref()], "Document"),
        description,
        timestamp: format_date_time(dto.updated_at.as_deref()),
    }
}

/// Mean submission-to-update delay of approved couriers: `Nh`, `Nj Nh` or `—`.
pub fn average_validation_time(couriers: &[AdminCourierDto]) -> String {
    let durations: Vec<i64> = couriers
        .iter()
        .filter(|dto| normalize_review_status(dto.status.as_deref()) == AdminStatus::Approved)
        .filter_map(|dto| {
            let submitted = parse_timestamp(dto.submitted_at.as_deref()?)?;
            let updated = parse_timestamp(dto.updated_at.as_deref()?)?;
            Some((updated - submitted).num_milliseconds().max(0))
        })
        .collect();
    if durations.is_empty() {
        return DASH_PLACEHOLDER.to_string();
    }

    let average = durations.iter().sum::<i64>() as f64 / durations.len() as f64;
    let hours = (average / MS_PER_HOUR).round() as i64;
    let days = hours / 24;
    let remainder = hours % 24;
    if days == 0 {
        format!("{remainder}h")
    } else {
        format!("{days}j {remainder}h")
    }
}

pub fn compute_courier_metrics(slices: &CourierReviewSlices) -> Vec<StatCard> {
    vec![
        StatCard::new(
            "Dossiers en attente",
            total_or_len(slices.pending.as_ref()).to_string(),
            format!("{} en file", rows(slices.pending.as_ref()).len()),
        )
        .with_icon("shield"),
        StatCard::new(
            "Validés",
            total_or_len(slices.approved.as_ref()).to_string(),
            "Sur la période courante",
        )
        .with_icon("verified"),
        StatCard::new(
            "Dossiers refusés",
            total_or_len(slices.rejected.as_ref()).to_string(),
            "Documents non conformes",
        )
        .with_icon("rejected"),
        StatCard::new(
            "Temps moyen validation",
            average_validation_time(rows(slices.couriers.as_ref())),
            "Entre soumission et validation",
        )
        .with_icon("timer"),
    ]
}

pub fn build_admin_couriers(slices: &CourierReviewSlices, now: DateTime<Utc>) -> AdminCouriersData {
    AdminCouriersData {
        metrics: compute_courier_metrics(slices),
        couriers: rows(slices.couriers.as_ref())
            .iter()
            .map(|dto| map_courier_row(dto, now))
            .collect(),
        validation_activity: rows(slices.documents.as_ref())
            .iter()
            .take(VALIDATION_ACTIVITY_LIMIT)
            .map(map_document_activity)
            .collect(),
    }
}

fn count_request(status: &str) -> PageRequest {
    PageRequest::new().filter("status", status).page(0).size(1)
}

/// Loads the review list, three status counts and pending documents concurrently.
pub async fn fetch_admin_couriers<T: ApiTransport>(
    client: &ApiClient<T>,
    now: DateTime<Utc>,
) -> AdminCouriersData {
    let list_request = PageRequest::first(50, "submittedAt,desc");
    let pending_request = count_request("PENDING");
    let approved_request = count_request("APPROVED");
    let rejected_request = count_request("REJECTED");
    let documents_request = PageRequest::new()
        .filter("status", "PENDING")
        .page(0)
        .size(10)
        .sort("updatedAt,desc");

    let (couriers, pending, approved, rejected, documents) = tokio::join!(
        settle(
            "admin_couriers",
            client.get_list::<AdminCourierDto>(COURIERS_ENDPOINT, &list_request)
        ),
        settle(
            "admin_couriers_pending",
            client.get_list::<AdminCourierDto>(COURIERS_ENDPOINT, &pending_request)
        ),
        settle(
            "admin_couriers_approved",
            client.get_list::<AdminCourierDto>(COURIERS_ENDPOINT, &approved_request)
        ),
        settle(
            "admin_couriers_rejected",
            client.get_list::<AdminCourierDto>(COURIERS_ENDPOINT, &rejected_request)
        ),
        settle(
            "admin_courier_documents",
            client.get_list::<AdminCourierDocumentDto>(
                COURIER_DOCUMENTS_ENDPOINT,
                &documents_request
            )
        ),
    );

    let slices = CourierReviewSlices {
        couriers: couriers.into_option(),
        pending: pending.into_option(),
        approved: approved.into_option(),
        rejected: rejected.into_option(),
        documents: documents.into_option(),
    };
    let data = build_admin_couriers(&slices, now);
    info!(
        "event=admin_couriers_fetch module=features status=ok couriers={} documents={}",
        data.couriers.len(),
        data.validation_activity.len()
    );
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 9, 12, 0, 0).single().expect("valid now")
    }

    fn courier(value: serde_json::Value) -> AdminCourierDto {
        serde_json::from_value(value).expect("courier dto")
    }

    #[test]
    fn status_and_level_defaults() {
        assert_eq!(normalize_review_status(Some("under_review")), AdminStatus::Review);
        assert_eq!(normalize_review_status(Some("???")), AdminStatus::Pending);
        assert_eq!(normalize_level(Some("gold")), CourierLevel::Or);
        assert_eq!(normalize_level(None), CourierLevel::Bronze);
    }

    #[test]
    fn review_time_thresholds() {
        assert_eq!(format_review_time(None, now()), "—");
        assert_eq!(format_review_time(Some("garbage"), now()), "—");
        assert_eq!(format_review_time(Some("2025-12-09T11:40:00Z"), now()), "Il y a 20 min");
        assert_eq!(format_review_time(Some("2025-12-09T07:00:00Z"), now()), "Il y a 5 h");
        assert_eq!(format_review_time(Some("2025-12-01T07:00:00Z"), now()), "01/12");
    }

    #[test]
    fn row_documents_total_falls_back_to_verified() {
        let row = map_courier_row(
            &courier(json!({ "id": 9, "fullName": "Ana", "documentsVerified": 3 })),
            now(),
        );
        assert_eq!(row.documents_total, 3);
        assert_eq!(row.company, "—");
        assert_eq!(row.level, CourierLevel::Bronze);
    }

    #[test]
    fn average_validation_time_formats_days_and_hours() {
        let couriers = vec![
            courier(json!({
                "id": 1,
                "status": "APPROVED",
                "submittedAt": "2025-12-01T00:00:00Z",
                "updatedAt": "2025-12-02T02:00:00Z"
            })),
            courier(json!({
                "id": 2,
                "status": "validated",
                "submittedAt": "2025-12-01T00:00:00Z",
                "updatedAt": "2025-12-01T22:00:00Z"
            })),
            courier(json!({
                "id": 3,
                "status": "PENDING",
                "submittedAt": "2025-12-01T00:00:00Z",
                "updatedAt": "2025-12-09T00:00:00Z"
            })),
        ];
        assert_eq!(average_validation_time(&couriers), "1j 0h");
        assert_eq!(average_validation_time(&couriers[1..2]), "22h");
        assert_eq!(average_validation_time(&[]), "—");
    }

    #[test]
    fn document_activity_description() {
        let doc: AdminCourierDocumentDto = serde_json::from_value(json!({
            "id": 4,
            "reviewerName": "Léa",
            "status": "PENDING",
            "updatedAt": "2025-12-08T09:30:00Z"
        }))
        .expect("document dto");
        let line = map_document_activity(&doc);
        assert_eq!(line.title, "Document");
        assert_eq!(line.description, "Léa • pending");
        assert_eq!(line.timestamp, "08 déc., 09:30");
        let blank = map_document_activity(&AdminCourierDocumentDto::default());
        assert_eq!(blank.description, "Mise à jour");
    }

    #[test]
    fn metrics_survive_failed_slices() {
        let mut pending = Page::of(vec![AdminCourierDto::default()]);
        pending.total_elements = 7;
        let slices = CourierReviewSlices {
            pending: Some(pending),
            ..CourierReviewSlices::default()
        };
        let data = build_admin_couriers(&slices, now());
        assert_eq!(data.metrics[0].value, "7");
        assert_eq!(data.metrics[0].helper.as_deref(), Some("1 en file"));
        assert_eq!(data.metrics[0].icon.as_deref(), Some("shield"));
        assert_eq!(data.metrics[1].value, "0");
        assert_eq!(data.metrics[3].value, "—");
        assert!(data.couriers.is_empty());
    }
}
