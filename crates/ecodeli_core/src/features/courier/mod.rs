//! Courier delivery missions; open announcements live in `announcements`.
//!
//! # Responsibility
//! - Map backend deliveries onto mission cards and detail views.
//! - Advance a mission along `ACCEPTED → PICKED_UP → IN_TRANSIT → DELIVERED`.
//!
//! # Invariants
//! - Unknown statuses fold to `ACCEPTED`.
//! - A terminal mission is returned unchanged; no request is issued.

pub mod announcements;

use crate::api::{ApiClient, ApiError, ApiTransport, FeatureError, PageRequest};
use crate::features::failure;
use crate::model::address::{address_label, AddressDto};
use crate::normalize::format::format_date_time;
use crate::normalize::{
    normalize_enum, pick_first_non_blank, resolve_amount, text_or, AliasTable, IdValue,
    ADDRESS_PLACEHOLDER, DASH_PLACEHOLDER,
};
use log::info;
use serde::{Deserialize, Serialize};

pub const DELIVERIES_ENDPOINT: &str = "/deliveries";

const NOT_FOUND_MESSAGE: &str = "Livraison introuvable";
const LIST_FAILURE_MESSAGE: &str = "Impossible de récupérer vos livraisons";
const UPDATE_FAILURE_MESSAGE: &str = "Impossible de mettre à jour la livraison";
const PENDING_STEP_LABEL: &str = "En attente";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeliveryDto {
    pub id: IdValue,
    pub announcement_id: Option<IdValue>,
    pub parcel_id: Option<IdValue>,
    pub shipper_user_id: Option<IdValue>,
    pub courier_user_id: Option<IdValue>,
    pub status: Option<String>,
    pub pickup_address: Option<AddressDto>,
    pub dropoff_address: Option<AddressDto>,
    pub recipient_name: Option<String>,
    pub recipient_phone: Option<String>,
    pub instructions: Option<String>,
    pub price_cents: Option<i64>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub pickup_at: Option<String>,
    pub delivered_at: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    Accepted,
    PickedUp,
    InTransit,
    Delivered,
}

pub const STATUS_FLOW: [DeliveryStatus; 4] = [
    DeliveryStatus::Accepted,
    DeliveryStatus::PickedUp,
    DeliveryStatus::InTransit,
    DeliveryStatus::Delivered,
];

const DELIVERY_STATUSES: &AliasTable<DeliveryStatus> = &[
    ("ACCEPTED", DeliveryStatus::Accepted),
    ("PICKED_UP", DeliveryStatus::PickedUp),
    ("PICKUP_CONFIRMED", DeliveryStatus::PickedUp),
    ("IN_TRANSIT", DeliveryStatus::InTransit),
    ("ON_ROUTE", DeliveryStatus::InTransit),
    ("DELIVERED", DeliveryStatus::Delivered),
];

impl DeliveryStatus {
    pub fn parse(raw: Option<&str>) -> Self {
        normalize_enum(raw, DELIVERY_STATUSES, Self::Accepted)
    }

    pub fn as_wire(self) -> &'static str {
        match self {
            Self::Accepted => "ACCEPTED",
            Self::PickedUp => "PICKED_UP",
            Self::InTransit => "IN_TRANSIT",
            Self::Delivered => "DELIVERED",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Accepted => "Acceptée",
            Self::PickedUp => "Collectée",
            Self::InTransit => "En transit",
            Self::Delivered => "Livrée",
        }
    }

    fn step_label(self) -> &'static str {
        match self {
            Self::Accepted => "Mission acceptee",
            Self::PickedUp => "Colis collecte",
            Self::InTransit => "En cours de livraison",
            Self::Delivered => "Livraison effectuee",
        }
    }

    fn index(self) -> usize {
        STATUS_FLOW
            .iter()
            .position(|status| *status == self)
            .unwrap_or(0)
    }

    /// Next status of the flow; `None` once delivered.
    pub fn next(self) -> Option<Self> {
        STATUS_FLOW.get(self.index() + 1).copied()
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineStep {
    pub status: DeliveryStatus,
    pub label: String,
    pub date_label: String,
    pub completed: bool,
    pub current: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourierDelivery {
    pub id: String,
    pub title: String,
    pub client_name: String,
    pub pickup_address: String,
    pub dropoff_address: String,
    pub pickup_window: String,
    pub earnings: f64,
    pub currency: String,
    pub status: DeliveryStatus,
    pub assignment_date: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourierDeliveryDetail {
    pub delivery: CourierDelivery,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub delivered_at: String,
    pub timeline: Vec<TimelineStep>,
}

/// Marks every step up to `current` completed and flags the current one.
pub fn sync_timeline(timeline: &[TimelineStep], current: DeliveryStatus) -> Vec<TimelineStep> {
    let current_index = current.index();
    timeline
        .iter()
        .map(|step| {
            let index = step.status.index();
            TimelineStep {
                completed: index <= current_index,
                current: index == current_index,
                ..step.clone()
            }
        })
        .collect()
}

fn delivery_title(dto: &DeliveryDto) -> String {
    let city = |address: Option<&AddressDto>| {
        address.and_then(|address| {
            pick_first_non_blank(&[address.city.as_deref()]).map(str::to_string)
        })
    };
    match (
        city(dto.pickup_address.as_ref()),
        city(dto.dropoff_address.as_ref()),
    ) {
        (Some(from), Some(to)) => format!("{from} → {to}"),
        _ => format!("Livraison #{}", dto.id),
    }
}

pub fn map_courier_delivery(dto: &DeliveryDto) -> CourierDelivery {
    CourierDelivery {
        id: dto.id.to_string(),
        title: delivery_title(dto),
        client_name: text_or(&[dto.recipient_name.as_deref()], DASH_PLACEHOLDER),
        pickup_address: address_label(dto.pickup_address.as_ref(), ADDRESS_PLACEHOLDER),
        dropoff_address: address_label(dto.dropoff_address.as_ref(), ADDRESS_PLACEHOLDER),
        pickup_window: format_date_time(dto.pickup_at.as_deref()),
        earnings: resolve_amount(dto.price_cents, &[dto.price]),
        currency: text_or(&[dto.currency.as_deref()], "EUR"),
        status: DeliveryStatus::parse(dto.status.as_deref()),
        assignment_date: format_date_time(dto.created_at.as_deref()),
        notes: pick_first_non_blank(&[dto.instructions.as_deref()]).map(str::to_string),
    }
}

pub fn map_courier_delivery_detail(dto: &DeliveryDto) -> CourierDeliveryDetail {
    let delivery = map_courier_delivery(dto);
    let stamp = |raw: Option<&str>| match raw.map(|value| format_date_time(Some(value))) {
        Some(label) if label != DASH_PLACEHOLDER => label,
        _ => PENDING_STEP_LABEL.to_string(),
    };
    let steps: Vec<TimelineStep> = STATUS_FLOW
        .iter()
        .map(|status| {
            let raw = match status {
                DeliveryStatus::Accepted => dto.created_at.as_deref(),
                DeliveryStatus::PickedUp => dto.pickup_at.as_deref(),
                DeliveryStatus::InTransit if delivery.status == DeliveryStatus::InTransit => {
                    dto.updated_at.as_deref()
                }
                DeliveryStatus::InTransit => None,
                DeliveryStatus::Delivered => dto.delivered_at.as_deref(),
            };
            TimelineStep {
                status: *status,
                label: status.step_label().to_string(),
                date_label: stamp(raw),
                completed: false,
                current: false,
            }
        })
        .collect();
    let timeline = sync_timeline(&steps, delivery.status);

    CourierDeliveryDetail {
        recipient_name: text_or(&[dto.recipient_name.as_deref()], DASH_PLACEHOLDER),
        recipient_phone: text_or(&[dto.recipient_phone.as_deref()], DASH_PLACEHOLDER),
        delivered_at: format_date_time(dto.delivered_at.as_deref()),
        timeline,
        delivery,
    }
}

/// Lists the courier's missions in `status`.
pub async fn fetch_courier_deliveries<T: ApiTransport>(
    client: &ApiClient<T>,
    status: DeliveryStatus,
) -> Result<Vec<CourierDelivery>, FeatureError> {
    let request = PageRequest::new().filter("status", status.as_wire());
    let page = client
        .get_list::<DeliveryDto>(DELIVERIES_ENDPOINT, &request)
        .await
        .map_err(|err| failure("courier_deliveries_fetch", LIST_FAILURE_MESSAGE, err))?;
    info!(
        "event=courier_deliveries_fetch module=features status=ok filter={} count={}",
        status.as_wire(),
        page.content.len()
    );
    Ok(page.content.iter().map(map_courier_delivery).collect())
}

/// Mission detail; `None` when the backend answers 404.
pub async fn fetch_courier_delivery_detail<T: ApiTransport>(
    client: &ApiClient<T>,
    delivery_id: &str,
) -> Result<Option<CourierDeliveryDetail>, FeatureError> {
    let path = format!("{DELIVERIES_ENDPOINT}/{delivery_id}");
    let dto = client
        .get_optional::<DeliveryDto>(&path)
        .await
        .map_err(|err| failure("courier_delivery_detail", NOT_FOUND_MESSAGE, err))?;
    Ok(dto.as_ref().map(map_courier_delivery_detail))
}

/// Moves the mission one step forward.
///
/// # Errors
/// Unknown mission, or a failed status update.
pub async fn advance_courier_delivery<T: ApiTransport>(
    client: &ApiClient<T>,
    delivery_id: &str,
) -> Result<CourierDeliveryDetail, FeatureError> {
    let Some(detail) = fetch_courier_delivery_detail(client, delivery_id).await? else {
        return Err(FeatureError::new(
            NOT_FOUND_MESSAGE,
            ApiError::status(404, NOT_FOUND_MESSAGE),
        ));
    };
    let Some(next) = detail.delivery.status.next() else {
        info!(
            "event=courier_delivery_advance module=features status=skipped reason=terminal id={}",
            delivery_id
        );
        return Ok(detail);
    };

    let path = format!("{DELIVERIES_ENDPOINT}/{delivery_id}/status");
    let updated: DeliveryDto = client
        .patch_json(&path, &next.as_wire())
        .await
        .map_err(|err| failure("courier_delivery_advance", UPDATE_FAILURE_MESSAGE, err))?;
    info!(
        "event=courier_delivery_advance module=features status=ok id={} next={}",
        delivery_id,
        next.as_wire()
    );
    Ok(map_courier_delivery_detail(&updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dto(value: serde_json::Value) -> DeliveryDto {
        serde_json::from_value(value).expect("delivery dto")
    }

    #[test]
    fn status_flow_stops_at_delivered() {
        assert_eq!(DeliveryStatus::parse(Some("picked_up")), DeliveryStatus::PickedUp);
        assert_eq!(DeliveryStatus::parse(Some("CREATED")), DeliveryStatus::Accepted);
        assert_eq!(DeliveryStatus::parse(Some("on_route")), DeliveryStatus::InTransit);
        assert_eq!(DeliveryStatus::Accepted.next(), Some(DeliveryStatus::PickedUp));
        assert_eq!(DeliveryStatus::Delivered.next(), None);
        assert!(DeliveryStatus::Delivered.is_terminal());
    }

    #[test]
    fn card_uses_cents_and_address_placeholders() {
        let card = map_courier_delivery(&dto(json!({
            "id": 201,
            "status": "IN_TRANSIT",
            "pickupAddress": {
                "line1": "18 Rue Oberkampf",
                "postalCode": "75011",
                "city": "Paris"
            },
            "priceCents": 3800,
            "currency": "EUR"
        })));
        assert_eq!(card.earnings, 38.0);
        assert_eq!(card.title, "Livraison #201");
        assert_eq!(card.pickup_address, "18 Rue Oberkampf, 75011, Paris");
        assert_eq!(card.dropoff_address, ADDRESS_PLACEHOLDER);
        assert_eq!(card.client_name, "—");
        assert_eq!(card.notes, None);
    }

    #[test]
    fn detail_timeline_tracks_current_status() {
        let detail = map_courier_delivery_detail(&dto(json!({
            "id": 5,
            "status": "PICKED_UP",
            "pickupAddress": { "city": "Lille" },
            "dropoffAddress": { "city": "Roubaix" },
            "createdAt": "2025-12-08T09:20:00Z",
            "pickupAt": "2025-12-09T17:00:00Z"
        })));
        assert_eq!(detail.delivery.title, "Lille → Roubaix");
        let flags: Vec<(bool, bool)> = detail
            .timeline
            .iter()
            .map(|step| (step.completed, step.current))
            .collect();
        assert_eq!(flags, vec![(true, false), (true, true), (false, false), (false, false)]);
        assert_eq!(detail.timeline[0].date_label, "08 déc., 09:20");
        assert_eq!(detail.timeline[2].date_label, "En attente");
        assert_eq!(detail.timeline[3].label, "Livraison effectuee");
    }

    #[test]
    fn sync_timeline_moves_current_flag() {
        let detail = map_courier_delivery_detail(&dto(json!({ "id": 1 })));
        let synced = sync_timeline(&detail.timeline, DeliveryStatus::Delivered);
        assert!(synced.iter().all(|step| step.completed));
        assert!(synced[3].current);
        assert!(!synced[0].current);
    }
}
