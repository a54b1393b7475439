//! Published announcements a courier can take over.
//!
//! # Invariants
//! - Only `PUBLISHED` announcements are offered, whatever the backend returns.
//! - Take-over re-reads the announcement first; a missing or no longer
//!   published announcement fails without an assignment request.

use crate::api::{ApiClient, ApiError, ApiTransport, FeatureError, PageRequest};
use crate::features::client::{
    announcement_type_label, locality, AnnouncementStatus, ANNOUNCEMENTS_ENDPOINT,
};
use crate::features::failure;
use crate::model::address::AddressDto;
use crate::normalize::format::{
    format_date_time, format_day_short_month, format_time, parse_timestamp,
};
use crate::normalize::{pick_first_non_blank, resolve_amount, text_or, IdValue, DASH_PLACEHOLDER};
use log::info;
use serde::{Deserialize, Serialize};

const LIST_FAILURE_MESSAGE: &str = "Impossible de récupérer les annonces disponibles";
const NOT_FOUND_MESSAGE: &str = "Annonce introuvable";
const UNAVAILABLE_MESSAGE: &str = "Cette annonce n'est plus disponible";
const TAKE_OVER_FAILURE_MESSAGE: &str = "Impossible de prendre en charge cette annonce";
const TAKE_OVER_MESSAGE: &str = "Vous avez pris en charge cette annonce. Le client a été notifié.";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientRefDto {
    pub display_name: Option<String>,
    pub company_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AvailableAnnouncementDto {
    pub id: IdValue,
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub from_address: Option<AddressDto>,
    pub to_address: Option<AddressDto>,
    pub pickup_start: Option<String>,
    pub pickup_end: Option<String>,
    pub delivery_start: Option<String>,
    pub delivery_end: Option<String>,
    pub earliest_at: Option<String>,
    pub latest_at: Option<String>,
    pub distance_km: Option<f64>,
    pub budget_cents: Option<i64>,
    pub budget_amount: Option<f64>,
    pub budget: Option<f64>,
    pub carbon_saving_kg: Option<f64>,
    pub client: Option<ClientRefDto>,
    pub client_name: Option<String>,
    pub client_rating: Option<f64>,
    pub equipment: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourierAvailableAnnouncement {
    pub id: String,
    pub title: String,
    pub kind: String,
    pub origin: String,
    pub destination: String,
    pub pickup_window: String,
    pub delivery_window: String,
    pub distance_km: f64,
    pub budget: f64,
    pub carbon_saving_kg: f64,
    pub client_name: String,
    pub client_rating: f64,
    pub equipment: Vec<String>,
    pub status: AnnouncementStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssignmentResponseDto {
    pub id: Option<IdValue>,
    pub assignment_id: Option<IdValue>,
    pub assigned_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourierAssignmentResult {
    pub announcement_id: String,
    pub assignment_id: String,
    pub assigned_at: String,
    pub pickup_eta: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct AssignBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'a str>,
}

/// `05 déc. • 13:00 - 14:00`, a single side, or `—`.
pub fn slot_label(start: Option<&str>, end: Option<&str>) -> String {
    let Some(begin) = start.and_then(parse_timestamp) else {
        return match end.and_then(parse_timestamp) {
            Some(_) => format_date_time(end),
            None => DASH_PLACEHOLDER.to_string(),
        };
    };
    let day = format_day_short_month(&begin);
    match end.filter(|raw| parse_timestamp(raw).is_some()) {
        Some(end) => format!("{day} • {} - {}", format_time(start), format_time(Some(end))),
        None => format!("{day} • {}", format_time(start)),
    }
}

fn client_name(dto: &AvailableAnnouncementDto) -> String {
    let client = dto.client.as_ref();
    if let Some(name) = pick_first_non_blank(&[
        dto.client_name.as_deref(),
        client.and_then(|c| c.display_name.as_deref()),
        client.and_then(|c| c.company_name.as_deref()),
    ]) {
        return name.trim().to_string();
    }
    let full = [
        client.and_then(|c| c.first_name.as_deref()),
        client.and_then(|c| c.last_name.as_deref()),
    ]
    .into_iter()
    .filter_map(|part| pick_first_non_blank(&[part]))
    .map(str::trim)
    .collect::<Vec<_>>()
    .join(" ");
    text_or(&[Some(full.as_str())], "Client EcoDeli")
}

fn non_negative(value: Option<f64>) -> f64 {
    value.filter(|value| value.is_finite() && *value >= 0.0).unwrap_or(0.0)
}

pub fn map_available_announcement(dto: &AvailableAnnouncementDto) -> CourierAvailableAnnouncement {
    let origin = locality(dto.from_address.as_ref());
    let destination = locality(dto.to_address.as_ref());
    CourierAvailableAnnouncement {
        id: dto.id.to_string(),
        title: text_or(&[dto.title.as_deref()], &format!("{origin} → {destination}")),
        kind: announcement_type_label(dto.kind.as_deref(), dto.category.as_deref()),
        pickup_window: slot_label(
            pick_first_non_blank(&[dto.pickup_start.as_deref(), dto.earliest_at.as_deref()]),
            dto.pickup_end.as_deref(),
        ),
        delivery_window: slot_label(
            dto.delivery_start.as_deref(),
            pick_first_non_blank(&[dto.delivery_end.as_deref(), dto.latest_at.as_deref()]),
        ),
        distance_km: non_negative(dto.distance_km),
        budget: resolve_amount(dto.budget_cents, &[dto.budget_amount, dto.budget]),
        carbon_saving_kg: non_negative(dto.carbon_saving_kg),
        client_name: client_name(dto),
        client_rating: non_negative(rating_of(dto)),
        equipment: dto
            .equipment
            .iter()
            .map(|item| item.trim())
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
        status: AnnouncementStatus::parse(dto.status.as_deref()),
        origin,
        destination,
    }
}

fn rating_of(dto: &AvailableAnnouncementDto) -> Option<f64> {
    dto.client_rating
        .or_else(|| dto.client.as_ref().and_then(|client| client.rating))
}

/// Published announcements open to couriers.
pub async fn fetch_courier_available_announcements<T: ApiTransport>(
    client: &ApiClient<T>,
) -> Result<Vec<CourierAvailableAnnouncement>, FeatureError> {
    let request = PageRequest::new().filter("status", "PUBLISHED");
    let page = client
        .get_list::<AvailableAnnouncementDto>(ANNOUNCEMENTS_ENDPOINT, &request)
        .await
        .map_err(|err| failure("courier_announcements_fetch", LIST_FAILURE_MESSAGE, err))?;
    let announcements: Vec<CourierAvailableAnnouncement> = page
        .content
        .iter()
        .map(map_available_announcement)
        .filter(|announcement| announcement.status == AnnouncementStatus::Published)
        .collect();
    info!(
        "event=courier_announcements_fetch module=features status=ok received={} available={}",
        page.content.len(),
        announcements.len()
    );
    Ok(announcements)
}

/// Assigns the announcement to the signed-in courier.
///
/// # Errors
/// `Annonce introuvable` (404), `Cette annonce n'est plus disponible` (409)
/// when it left the published state, or a failed request.
pub async fn take_over_announcement<T: ApiTransport>(
    client: &ApiClient<T>,
    announcement_id: &str,
    note: Option<&str>,
) -> Result<CourierAssignmentResult, FeatureError> {
    let path = format!("{ANNOUNCEMENTS_ENDPOINT}/{announcement_id}");
    let Some(dto) = client
        .get_optional::<AvailableAnnouncementDto>(&path)
        .await
        .map_err(|err| failure("courier_announcement_take_over", NOT_FOUND_MESSAGE, err))?
    else {
        info!(
            "event=courier_announcement_take_over module=features status=rejected \
             reason=not_found id={}",
            announcement_id
        );
        return Err(FeatureError::new(
            NOT_FOUND_MESSAGE,
            ApiError::status(404, NOT_FOUND_MESSAGE),
        ));
    };
    let announcement = map_available_announcement(&dto);
    if announcement.status != AnnouncementStatus::Published {
        info!(
            "event=courier_announcement_take_over module=features status=rejected \
             reason=unavailable id={} current={:?}",
            announcement_id, announcement.status
        );
        return Err(FeatureError::new(
            UNAVAILABLE_MESSAGE,
            ApiError::status(409, UNAVAILABLE_MESSAGE),
        ));
    }

    let assign_path = format!("{path}/assign");
    let body = AssignBody {
        note: note.map(str::trim).filter(|note| !note.is_empty()),
    };
    let response: Option<AssignmentResponseDto> = client
        .post_json(&assign_path, &body)
        .await
        .map_err(|err| {
            failure("courier_announcement_take_over", TAKE_OVER_FAILURE_MESSAGE, err)
        })?;
    let response = response.unwrap_or_default();
    let assignment_id = response
        .assignment_id
        .or(response.id)
        .map_or_else(|| DASH_PLACEHOLDER.to_string(), |id| id.to_string());
    info!(
        "event=courier_announcement_take_over module=features status=ok id={} assignment={}",
        announcement_id, assignment_id
    );
    Ok(CourierAssignmentResult {
        announcement_id: announcement.id,
        assignment_id,
        assigned_at: format_date_time(response.assigned_at.as_deref()),
        pickup_eta: announcement.pickup_window,
        message: TAKE_OVER_MESSAGE.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dto(value: serde_json::Value) -> AvailableAnnouncementDto {
        serde_json::from_value(value).expect("announcement dto")
    }

    #[test]
    fn slot_labels() {
        assert_eq!(
            slot_label(Some("2025-12-15T07:30:00Z"), Some("2025-12-15T09:00:00Z")),
            "15 déc. • 07:30 - 09:00"
        );
        assert_eq!(slot_label(Some("2025-12-15T07:30:00Z"), None), "15 déc. • 07:30");
        assert_eq!(slot_label(None, Some("2025-12-15T19:00:00Z")), "15 déc., 19:00");
        assert_eq!(slot_label(Some("demain"), None), "—");
    }

    #[test]
    fn card_mapping_with_nested_client() {
        let card = map_available_announcement(&dto(json!({
            "id": "ANN-012",
            "type": "PARCEL_TRANSPORT",
            "status": "published",
            "fromAddress": { "city": "Bordeaux", "postalCode": "33000" },
            "toAddress": { "city": "Nantes", "postalCode": "44000" },
            "pickupStart": "2025-12-15T07:30:00Z",
            "pickupEnd": "2025-12-15T09:00:00Z",
            "latestAt": "2025-12-15T19:00:00Z",
            "distanceKm": 347,
            "budgetCents": 21000,
            "carbonSavingKg": 16.5,
            "client": { "firstName": "Louise", "lastName": " Bois ", "rating": 4.8 },
            "equipment": ["Transpalette", " "]
        })));
        assert_eq!(card.title, "Bordeaux 33000 → Nantes 44000");
        assert_eq!(card.kind, "Transport de colis");
        assert_eq!(card.pickup_window, "15 déc. • 07:30 - 09:00");
        assert_eq!(card.delivery_window, "15 déc., 19:00");
        assert_eq!(card.budget, 210.0);
        assert_eq!(card.client_name, "Louise Bois");
        assert_eq!(card.client_rating, 4.8);
        assert_eq!(card.equipment, vec!["Transpalette".to_string()]);
        assert_eq!(card.status, AnnouncementStatus::Published);
    }

    #[test]
    fn card_fallbacks() {
        let card = map_available_announcement(&dto(json!({
            "id": 3,
            "clientName": "Atelier Girard",
            "distanceKm": -4.0
        })));
        assert_eq!(card.client_name, "Atelier Girard");
        assert_eq!(card.distance_km, 0.0);
        assert_eq!(card.pickup_window, "—");
        assert_eq!(card.status, AnnouncementStatus::Draft);

        let anonymous = map_available_announcement(&AvailableAnnouncementDto::default());
        assert_eq!(anonymous.client_name, "Client EcoDeli");
        assert!(anonymous.equipment.is_empty());
    }
}
