//! Service provider assignments, unavailabilities and invoices.
//!
//! # Responsibility
//! - Map assignments and invoices onto display records.
//! - Issue assignment confirmations, status updates and unavailability
//!   requests.
//!
//! # Invariants
//! - An unavailability whose end is not after its start is rejected before
//!   any request is sent.
//! - Recurrence `NONE` is omitted from the request body.

use crate::api::{ApiClient, ApiError, ApiTransport, FeatureError, PageRequest};
use crate::features::failure;
use crate::normalize::format::{format_date, format_date_time};
use crate::normalize::{
    normalize_enum, pick_first_non_blank, resolve_amount, text_or, AliasTable, IdValue,
    DASH_PLACEHOLDER,
};
use chrono::{DateTime, SecondsFormat, Utc};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter};

pub const ASSIGNMENTS_ENDPOINT: &str = "/providers/me/assignments";
pub const INVOICES_ENDPOINT: &str = "/providers/me/invoices";

const ASSIGNMENTS_FAILURE_MESSAGE: &str = "Impossible de récupérer vos affectations";
const INVOICES_FAILURE_MESSAGE: &str = "Impossible de récupérer vos factures";
const CONFIRM_FAILURE_MESSAGE: &str = "Impossible de confirmer cette mission.";
const STATUS_FAILURE_MESSAGE: &str = "Impossible de mettre à jour cette mission.";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderAssignmentDto {
    pub id: IdValue,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub scheduled_at: Option<String>,
    pub completed_at: Option<String>,
    pub client_name: Option<String>,
    pub client_contact: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

const ASSIGNMENT_STATUSES: &AliasTable<AssignmentStatus> = &[
    ("PENDING", AssignmentStatus::Pending),
    ("CONFIRMED", AssignmentStatus::Confirmed),
    ("IN_PROGRESS", AssignmentStatus::InProgress),
    ("COMPLETED", AssignmentStatus::Completed),
    ("CANCELLED", AssignmentStatus::Cancelled),
    ("CANCELED", AssignmentStatus::Cancelled),
];

impl AssignmentStatus {
    pub fn parse(raw: Option<&str>) -> Self {
        normalize_enum(raw, ASSIGNMENT_STATUSES, Self::Pending)
    }

    pub fn as_wire(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "À confirmer",
            Self::Confirmed => "Confirmée",
            Self::InProgress => "En cours",
            Self::Completed => "Terminée",
            Self::Cancelled => "Annulée",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderAssignment {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: AssignmentStatus,
    pub scheduled_at: String,
    pub completed_at: Option<String>,
    pub client_name: String,
    pub client_contact: Option<String>,
}

pub fn map_assignment(dto: &ProviderAssignmentDto) -> ProviderAssignment {
    ProviderAssignment {
        id: dto.id.to_string(),
        title: text_or(&[dto.title.as_deref()], "Mission EcoDeli"),
        description: pick_first_non_blank(&[dto.description.as_deref()]).map(str::to_string),
        status: AssignmentStatus::parse(dto.status.as_deref()),
        scheduled_at: format_date_time(dto.scheduled_at.as_deref()),
        completed_at: dto
            .completed_at
            .as_deref()
            .map(|raw| format_date_time(Some(raw))),
        client_name: text_or(&[dto.client_name.as_deref()], DASH_PLACEHOLDER),
        client_contact: pick_first_non_blank(&[dto.client_contact.as_deref()]).map(str::to_string),
    }
}

/// Assignments still waiting for a confirmation.
pub fn pending_assignments(assignments: &[ProviderAssignment]) -> Vec<&ProviderAssignment> {
    assignments
        .iter()
        .filter(|assignment| assignment.status == AssignmentStatus::Pending)
        .collect()
}

/// Local update applied after a successful confirmation.
pub fn mark_confirmed(assignments: &mut [ProviderAssignment], assignment_id: &str) {
    for assignment in assignments.iter_mut().filter(|item| item.id == assignment_id) {
        assignment.status = AssignmentStatus::Confirmed;
    }
}

/// Optional confirmation note and arrival estimate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssignmentConfirmation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta: Option<String>,
}

impl AssignmentConfirmation {
    /// Blank messages are dropped; `eta` is sent as an ISO timestamp.
    pub fn new(message: &str, eta: Option<DateTime<Utc>>) -> Self {
        Self {
            message: pick_first_non_blank(&[Some(message)]).map(str::to_string),
            eta: eta.map(|value| value.to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recurrence {
    None,
    Daily,
    Weekly,
    Monthly,
}

impl Recurrence {
    pub fn label(self) -> &'static str {
        match self {
            Self::None => "Aucune",
            Self::Daily => "Tous les jours",
            Self::Weekly => "Toutes les semaines",
            Self::Monthly => "Tous les mois",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnavailabilityRequest {
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub reason: String,
    pub recurrence: Recurrence,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnavailabilityBody {
    pub start_at: String,
    pub end_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Recurrence>,
}

#[derive(Debug)]
pub enum UnavailabilityError {
    EndNotAfterStart,
    Request(ApiError),
}

impl UnavailabilityError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EndNotAfterStart => "La date de fin doit être postérieure au début.",
            Self::Request(_) => "Impossible de planifier cette indisponibilité.",
        }
    }
}

impl Display for UnavailabilityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EndNotAfterStart => f.write_str("unavailability end must be after its start"),
            Self::Request(err) => write!(f, "unavailability request failed: {err}"),
        }
    }
}

impl std::error::Error for UnavailabilityError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::EndNotAfterStart => None,
            Self::Request(err) => Some(err),
        }
    }
}

impl From<ApiError> for UnavailabilityError {
    fn from(value: ApiError) -> Self {
        Self::Request(value)
    }
}

impl UnavailabilityRequest {
    /// Validates chronology and builds the wire body.
    pub fn to_body(&self) -> Result<UnavailabilityBody, UnavailabilityError> {
        if self.end_at <= self.start_at {
            return Err(UnavailabilityError::EndNotAfterStart);
        }
        Ok(UnavailabilityBody {
            start_at: self.start_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            end_at: self.end_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            reason: pick_first_non_blank(&[Some(self.reason.as_str())]).map(str::to_string),
            recurrence: match self.recurrence {
                Recurrence::None => None,
                other => Some(other),
            },
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderInvoiceDto {
    pub id: IdValue,
    pub status: Option<String>,
    pub period_start: Option<String>,
    pub period_end: Option<String>,
    pub total_cents: Option<i64>,
    pub total: Option<f64>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub document_id: Option<IdValue>,
    pub issued_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderInvoiceStatus {
    Due,
    Paid,
    Processing,
}

const PROVIDER_INVOICE_STATUSES: &AliasTable<ProviderInvoiceStatus> = &[
    ("DUE", ProviderInvoiceStatus::Due),
    ("PAID", ProviderInvoiceStatus::Paid),
    ("PROCESSING", ProviderInvoiceStatus::Processing),
];

impl ProviderInvoiceStatus {
    pub fn parse(raw: Option<&str>) -> Self {
        normalize_enum(raw, PROVIDER_INVOICE_STATUSES, Self::Due)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Due => "À régler",
            Self::Paid => "Payée",
            Self::Processing => "En traitement",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderInvoice {
    pub id: String,
    pub status: ProviderInvoiceStatus,
    pub period: String,
    pub amount: f64,
    pub currency: String,
    pub document_id: Option<String>,
    pub issued_at: String,
}

/// `start - end`, a single bound, or `—`.
pub fn period_label(start: Option<&str>, end: Option<&str>) -> String {
    let known = |label: &String| label != DASH_PLACEHOLDER;
    let start = Some(format_date(start)).filter(known);
    let end = Some(format_date(end)).filter(known);
    match (start, end) {
        (Some(start), Some(end)) => format!("{start} - {end}"),
        (Some(side), None) | (None, Some(side)) => side,
        (None, None) => DASH_PLACEHOLDER.to_string(),
    }
}

pub fn map_provider_invoice(dto: &ProviderInvoiceDto) -> ProviderInvoice {
    ProviderInvoice {
        id: dto.id.to_string(),
        status: ProviderInvoiceStatus::parse(dto.status.as_deref()),
        period: period_label(dto.period_start.as_deref(), dto.period_end.as_deref()),
        amount: resolve_amount(dto.total_cents, &[dto.total, dto.amount]),
        currency: text_or(&[dto.currency.as_deref()], "EUR"),
        document_id: dto.document_id.as_ref().map(IdValue::to_string),
        issued_at: format_date(dto.issued_at.as_deref()),
    }
}

pub async fn fetch_provider_assignments<T: ApiTransport>(
    client: &ApiClient<T>,
) -> Result<Vec<ProviderAssignment>, FeatureError> {
    let page = client
        .get_list::<ProviderAssignmentDto>(ASSIGNMENTS_ENDPOINT, &PageRequest::new())
        .await
        .map_err(|err| failure("provider_assignments_fetch", ASSIGNMENTS_FAILURE_MESSAGE, err))?;
    info!(
        "event=provider_assignments_fetch module=features status=ok count={}",
        page.content.len()
    );
    Ok(page.content.iter().map(map_assignment).collect())
}

pub async fn update_assignment_status<T: ApiTransport>(
    client: &ApiClient<T>,
    assignment_id: &str,
    status: AssignmentStatus,
) -> Result<ProviderAssignment, FeatureError> {
    let path = format!("{ASSIGNMENTS_ENDPOINT}/{assignment_id}");
    let body = serde_json::json!({ "status": status.as_wire() });
    let dto: ProviderAssignmentDto = client
        .patch_json(&path, &body)
        .await
        .map_err(|err| failure("provider_assignment_status", STATUS_FAILURE_MESSAGE, err))?;
    info!(
        "event=provider_assignment_status module=features status=ok id={} next={}",
        assignment_id,
        status.as_wire()
    );
    Ok(map_assignment(&dto))
}

pub async fn confirm_assignment<T: ApiTransport>(
    client: &ApiClient<T>,
    assignment_id: &str,
    confirmation: &AssignmentConfirmation,
) -> Result<(), FeatureError> {
    let path = format!("/assignments/{assignment_id}/confirm");
    client
        .post_json::<_, Value>(&path, confirmation)
        .await
        .map_err(|err| failure("provider_assignment_confirm", CONFIRM_FAILURE_MESSAGE, err))?;
    info!(
        "event=provider_assignment_confirm module=features status=ok id={} with_eta={}",
        assignment_id,
        confirmation.eta.is_some()
    );
    Ok(())
}

/// Validates then posts an unavailability window.
pub async fn create_unavailability<T: ApiTransport>(
    client: &ApiClient<T>,
    provider_id: &str,
    request: &UnavailabilityRequest,
) -> Result<(), UnavailabilityError> {
    let body = match request.to_body() {
        Ok(body) => body,
        Err(err) => {
            warn!(
                "event=provider_unavailability module=features status=rejected reason=chronology"
            );
            return Err(err);
        }
    };
    let path = format!("/providers/{provider_id}/unavailabilities");
    if let Err(err) = client.post_json::<_, Value>(&path, &body).await {
        error!(
            "event=provider_unavailability module=features status=error code={} error={}",
            err.code(),
            err
        );
        return Err(err.into());
    }
    info!(
        "event=provider_unavailability module=features status=ok recurring={}",
        body.recurrence.is_some()
    );
    Ok(())
}

pub async fn fetch_provider_invoices<T: ApiTransport>(
    client: &ApiClient<T>,
) -> Result<Vec<ProviderInvoice>, FeatureError> {
    let page = client
        .get_list::<ProviderInvoiceDto>(INVOICES_ENDPOINT, &PageRequest::new())
        .await
        .map_err(|err| failure("provider_invoices_fetch", INVOICES_FAILURE_MESSAGE, err))?;
    Ok(page.content.iter().map(map_provider_invoice).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 10, hour, 0, 0).single().expect("valid time")
    }

    #[test]
    fn assignment_status_defaults_to_pending() {
        assert_eq!(AssignmentStatus::parse(Some("in_progress")), AssignmentStatus::InProgress);
        assert_eq!(AssignmentStatus::parse(Some("other")), AssignmentStatus::Pending);
        assert_eq!(AssignmentStatus::parse(None), AssignmentStatus::Pending);
    }

    #[test]
    fn mark_confirmed_updates_matching_rows() {
        let mut rows: Vec<ProviderAssignment> = [1, 2]
            .iter()
            .map(|id| {
                map_assignment(&ProviderAssignmentDto {
                    id: IdValue::from(*id as i64),
                    ..ProviderAssignmentDto::default()
                })
            })
            .collect();
        assert_eq!(pending_assignments(&rows).len(), 2);
        mark_confirmed(&mut rows, "2");
        assert_eq!(rows[1].status, AssignmentStatus::Confirmed);
        assert_eq!(pending_assignments(&rows).len(), 1);
        assert_eq!(rows[0].title, "Mission EcoDeli");
    }

    #[test]
    fn unavailability_rejects_inverted_window() {
        let request = UnavailabilityRequest {
            start_at: at(10),
            end_at: at(10),
            reason: String::new(),
            recurrence: Recurrence::None,
        };
        let err = request.to_body().expect_err("same instant is rejected");
        assert!(matches!(err, UnavailabilityError::EndNotAfterStart));
        assert_eq!(err.user_message(), "La date de fin doit être postérieure au début.");
    }

    #[test]
    fn unavailability_body_omits_none_recurrence_and_blank_reason() {
        let request = UnavailabilityRequest {
            start_at: at(9),
            end_at: at(10),
            reason: "  ".to_string(),
            recurrence: Recurrence::None,
        };
        let body = serde_json::to_value(request.to_body().expect("valid window")).expect("json");
        assert_eq!(
            body,
            json!({ "startAt": "2025-12-10T09:00:00.000Z", "endAt": "2025-12-10T10:00:00.000Z" })
        );

        let weekly = UnavailabilityRequest {
            recurrence: Recurrence::Weekly,
            reason: "Congés".to_string(),
            ..request
        };
        let body = serde_json::to_value(weekly.to_body().expect("valid window")).expect("json");
        assert_eq!(body["recurrence"], "WEEKLY");
        assert_eq!(body["reason"], "Congés");
    }

    #[test]
    fn confirmation_drops_blank_message() {
        let payload = AssignmentConfirmation::new(" ", Some(at(14)));
        assert_eq!(
            serde_json::to_value(&payload).expect("json"),
            json!({ "eta": "2025-12-10T14:00:00.000Z" })
        );
    }

    #[test]
    fn invoice_mapping() {
        let dto: ProviderInvoiceDto = serde_json::from_value(json!({
            "id": 77,
            "status": "paid",
            "periodStart": "2025-11-01",
            "periodEnd": "2025-11-30",
            "totalCents": 125000,
            "documentId": 12
        }))
        .expect("invoice dto");
        let invoice = map_provider_invoice(&dto);
        assert_eq!(invoice.status, ProviderInvoiceStatus::Paid);
        assert_eq!(invoice.period, "01 nov. 2025 - 30 nov. 2025");
        assert_eq!(invoice.amount, 1250.0);
        assert_eq!(invoice.document_id.as_deref(), Some("12"));
        assert_eq!(period_label(None, None), "—");
        assert_eq!(ProviderInvoiceStatus::parse(None), ProviderInvoiceStatus::Due);
    }
}
