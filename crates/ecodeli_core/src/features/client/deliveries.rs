//! Client deliveries: list rows, dashboard lines and the tracking detail.
//!
//! # Responsibility
//! - Map the client's deliveries, tolerant of the courier, address and ETA
//!   aliases the backend has used over time.
//! - Build the four-step tracking timeline.
//!
//! # Invariants
//! - Statuses share the courier flow vocabulary; unknown values fold to
//!   `ACCEPTED`.
//! - A missing delivery is `None`, never an error.

use crate::api::{ApiClient, ApiTransport, FeatureError, PageRequest};
use crate::features::client::{announcement_type_label, locality};
use crate::features::courier::{
    sync_timeline, DeliveryStatus, TimelineStep, DELIVERIES_ENDPOINT, STATUS_FLOW,
};
use crate::features::failure;
use crate::model::address::{address_label, AddressDto};
use crate::normalize::format::{format_date, format_date_time};
use crate::normalize::{
    pick_first_non_blank, resolve_amount, text_or, IdValue, ADDRESS_PLACEHOLDER,
    DASH_PLACEHOLDER,
};
use log::info;
use serde::{Deserialize, Serialize};

const LIST_FAILURE_MESSAGE: &str = "Impossible de récupérer vos livraisons";
const DETAIL_FAILURE_MESSAGE: &str = "Impossible de récupérer la livraison";
const DEFAULT_COURIER_NAME: &str = "Livreur EcoDeli";
const PLACE_TO_CONFIRM: &str = "Lieu à confirmer";
const DURATION_TO_CONFIRM: &str = "Durée à confirmer";
const PENDING_STEP_LABEL: &str = "En attente";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CourierRefDto {
    pub full_name: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub rating: Option<f64>,
    pub total_deliveries: Option<u32>,
    pub vehicle: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientDeliveryDto {
    pub id: IdValue,
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub delivery_status: Option<String>,
    pub driver: Option<String>,
    pub courier_name: Option<String>,
    pub courier: Option<CourierRefDto>,
    pub assigned_courier: Option<CourierRefDto>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub from_address: Option<AddressDto>,
    pub to_address: Option<AddressDto>,
    pub pickup_address: Option<AddressDto>,
    pub dropoff_address: Option<AddressDto>,
    pub pickup_city: Option<String>,
    pub delivery_city: Option<String>,
    pub sender_name: Option<String>,
    pub sender_phone: Option<String>,
    pub recipient_name: Option<String>,
    pub recipient_phone: Option<String>,
    pub eta: Option<String>,
    pub estimated_time: Option<String>,
    pub estimated_arrival_at: Option<String>,
    pub estimated_duration_minutes: Option<i64>,
    pub delivery_date: Option<String>,
    pub pickup_at: Option<String>,
    pub delivered_at: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub price_cents: Option<i64>,
    pub price: Option<f64>,
    pub service_fee_cents: Option<i64>,
    pub service_fee: Option<f64>,
    pub currency: Option<String>,
    pub pickup_proof_url: Option<String>,
    pub delivery_proof_url: Option<String>,
}

impl ClientDeliveryDto {
    /// `status`, else `deliveryStatus`, on the courier flow vocabulary.
    pub fn normalized_status(&self) -> DeliveryStatus {
        DeliveryStatus::parse(pick_first_non_blank(&[
            self.status.as_deref(),
            self.delivery_status.as_deref(),
        ]))
    }

    fn origin(&self) -> Option<&AddressDto> {
        self.from_address.as_ref().or(self.pickup_address.as_ref())
    }

    fn destination(&self) -> Option<&AddressDto> {
        self.to_address.as_ref().or(self.dropoff_address.as_ref())
    }

    fn couriers(&self) -> [Option<&CourierRefDto>; 2] {
        [self.courier.as_ref(), self.assigned_courier.as_ref()]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientDelivery {
    pub id: String,
    pub origin: String,
    pub destination: String,
    pub courier_name: String,
    pub date: String,
    pub estimated_time: String,
    pub price: f64,
    pub status: DeliveryStatus,
}

/// Compact delivery line of the client dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardDelivery {
    pub id: String,
    pub title: String,
    pub driver: String,
    pub from: String,
    pub to: String,
    pub estimated_time: String,
    pub status: DeliveryStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactPoint {
    pub address: String,
    pub contact_name: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryDriver {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub rating: f64,
    pub total_deliveries: u32,
    pub vehicle: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryPrice {
    pub total: f64,
    pub base: f64,
    pub service_fees: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeliveryProofs {
    pub pickup: bool,
    pub delivery: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientDeliveryDetail {
    pub id: String,
    pub status: DeliveryStatus,
    pub title: String,
    pub type_label: String,
    pub pickup_time_label: String,
    pub estimated_delivery_label: String,
    pub actual_delivery_label: Option<String>,
    pub from: ContactPoint,
    pub to: ContactPoint,
    pub driver: DeliveryDriver,
    pub price: DeliveryPrice,
    pub proofs: DeliveryProofs,
    pub timeline: Vec<TimelineStep>,
}

/// First courier name across the flat and nested aliases.
pub fn courier_name(dto: &ClientDeliveryDto) -> String {
    let [courier, assigned] = dto.couriers();
    text_or(
        &[
            dto.courier_name.as_deref(),
            courier.and_then(|c| c.full_name.as_deref()),
            courier.and_then(|c| c.name.as_deref()),
            assigned.and_then(|c| c.full_name.as_deref()),
            assigned.and_then(|c| c.name.as_deref()),
            dto.driver.as_deref(),
        ],
        DEFAULT_COURIER_NAME,
    )
}

/// `line1, postal code, city`, with flat fallbacks for the line and the city.
pub fn place_label(
    address: Option<&AddressDto>,
    fallback_line: Option<&str>,
    fallback_city: Option<&str>,
) -> String {
    let parts: Vec<&str> = [
        pick_first_non_blank(&[address.and_then(|a| a.line1.as_deref()), fallback_line]),
        pick_first_non_blank(&[address.and_then(|a| a.postal_code.as_deref())]),
        pick_first_non_blank(&[address.and_then(|a| a.city.as_deref()), fallback_city]),
    ]
    .into_iter()
    .flatten()
    .map(str::trim)
    .collect();
    if parts.is_empty() {
        PLACE_TO_CONFIRM.to_string()
    } else {
        parts.join(", ")
    }
}

/// Explicit ETA text wins; otherwise `45 min` or `2h 05min` from minutes.
pub fn format_duration(minutes: Option<i64>, explicit: Option<&str>) -> String {
    if let Some(text) = pick_first_non_blank(&[explicit]) {
        return text.to_string();
    }
    match minutes {
        Some(minutes) if minutes >= 0 => {
            let (hours, rest) = (minutes / 60, minutes % 60);
            if hours == 0 {
                format!("{rest} min")
            } else {
                format!("{hours}h {rest:02}min")
            }
        }
        _ => DURATION_TO_CONFIRM.to_string(),
    }
}

fn explicit_eta(dto: &ClientDeliveryDto) -> Option<&str> {
    pick_first_non_blank(&[
        dto.estimated_time.as_deref(),
        dto.eta.as_deref(),
        dto.estimated_arrival_at.as_deref(),
    ])
}

fn price_of(dto: &ClientDeliveryDto) -> f64 {
    resolve_amount(dto.price_cents, &[dto.price])
}

pub fn map_client_delivery(dto: &ClientDeliveryDto) -> ClientDelivery {
    let status = dto.normalized_status();
    let estimated_time = if status == DeliveryStatus::Delivered {
        "Livré".to_string()
    } else {
        format_duration(dto.estimated_duration_minutes, explicit_eta(dto))
    };
    ClientDelivery {
        id: dto.id.to_string(),
        origin: locality(dto.origin()),
        destination: locality(dto.destination()),
        courier_name: courier_name(dto),
        date: format_date(pick_first_non_blank(&[
            dto.delivery_date.as_deref(),
            dto.pickup_at.as_deref(),
            dto.created_at.as_deref(),
        ])),
        estimated_time,
        price: price_of(dto),
        status,
    }
}

pub fn map_dashboard_delivery(dto: &ClientDeliveryDto) -> DashboardDelivery {
    DashboardDelivery {
        id: dto.id.to_string(),
        title: text_or(&[dto.title.as_deref()], "Livraison EcoDeli"),
        driver: courier_name(dto),
        from: place_label(dto.origin(), dto.from.as_deref(), dto.pickup_city.as_deref()),
        to: place_label(dto.destination(), dto.to.as_deref(), dto.delivery_city.as_deref()),
        estimated_time: format_duration(dto.estimated_duration_minutes, explicit_eta(dto)),
        status: dto.normalized_status(),
    }
}

fn step_label(status: DeliveryStatus) -> &'static str {
    match status {
        DeliveryStatus::Accepted => "Livraison acceptée",
        DeliveryStatus::PickedUp => "Colis collecté",
        DeliveryStatus::InTransit => "En cours de livraison",
        DeliveryStatus::Delivered => "Livraison effectuée",
    }
}

fn stamp(raw: Option<&str>) -> Option<String> {
    raw.map(|value| format_date_time(Some(value)))
        .filter(|label| label != DASH_PLACEHOLDER)
}

fn tracking_timeline(dto: &ClientDeliveryDto, status: DeliveryStatus) -> Vec<TimelineStep> {
    let estimate = stamp(dto.estimated_arrival_at.as_deref().or(dto.eta.as_deref()));
    let steps: Vec<TimelineStep> = STATUS_FLOW
        .iter()
        .map(|step| {
            let date_label = match step {
                DeliveryStatus::Accepted => stamp(dto.created_at.as_deref()),
                DeliveryStatus::PickedUp => stamp(dto.pickup_at.as_deref()),
                DeliveryStatus::InTransit if status == DeliveryStatus::InTransit => {
                    stamp(dto.updated_at.as_deref())
                }
                DeliveryStatus::InTransit => None,
                DeliveryStatus::Delivered => stamp(dto.delivered_at.as_deref())
                    .map(|label| format!("Livré le {label}"))
                    .or_else(|| estimate.as_ref().map(|label| format!("Estimation: {label}"))),
            };
            TimelineStep {
                status: *step,
                label: step_label(*step).to_string(),
                date_label: date_label.unwrap_or_else(|| PENDING_STEP_LABEL.to_string()),
                completed: false,
                current: false,
            }
        })
        .collect();
    sync_timeline(&steps, status)
}

fn city_of(address: Option<&AddressDto>) -> Option<&str> {
    pick_first_non_blank(&[address.and_then(|a| a.city.as_deref())])
}

fn delivery_title(dto: &ClientDeliveryDto) -> String {
    if let Some(title) = pick_first_non_blank(&[dto.title.as_deref()]) {
        return title.to_string();
    }
    match (city_of(dto.origin()), city_of(dto.destination())) {
        (Some(from), Some(to)) => format!("Colis {from} → {to}"),
        _ => format!("Livraison #{}", dto.id),
    }
}

fn contact(address: Option<&AddressDto>, name: Option<&str>, phone: Option<&str>) -> ContactPoint {
    ContactPoint {
        address: address_label(address, ADDRESS_PLACEHOLDER),
        contact_name: text_or(&[name], DASH_PLACEHOLDER),
        phone: text_or(&[phone], DASH_PLACEHOLDER),
    }
}

fn driver(dto: &ClientDeliveryDto) -> DeliveryDriver {
    let [courier, assigned] = dto.couriers();
    let profile = courier.or(assigned);
    let field = |pick: fn(&CourierRefDto) -> Option<&str>| {
        text_or(&[profile.and_then(pick)], DASH_PLACEHOLDER)
    };
    DeliveryDriver {
        name: courier_name(dto),
        phone: field(|c| c.phone.as_deref()),
        email: field(|c| c.email.as_deref()),
        rating: profile
            .and_then(|c| c.rating)
            .filter(|rating| rating.is_finite())
            .unwrap_or(0.0),
        total_deliveries: profile.and_then(|c| c.total_deliveries).unwrap_or(0),
        vehicle: field(|c| c.vehicle.as_deref()),
    }
}

pub fn map_client_delivery_detail(dto: &ClientDeliveryDto) -> ClientDeliveryDetail {
    let status = dto.normalized_status();
    let total = price_of(dto);
    let service_fees = resolve_amount(dto.service_fee_cents, &[dto.service_fee]);
    ClientDeliveryDetail {
        id: dto.id.to_string(),
        status,
        title: delivery_title(dto),
        type_label: announcement_type_label(dto.kind.as_deref(), dto.category.as_deref()),
        pickup_time_label: format_date_time(dto.pickup_at.as_deref()),
        estimated_delivery_label: format_date_time(
            dto.estimated_arrival_at.as_deref().or(dto.eta.as_deref()),
        ),
        actual_delivery_label: stamp(dto.delivered_at.as_deref()),
        from: contact(
            dto.origin(),
            dto.sender_name.as_deref(),
            dto.sender_phone.as_deref(),
        ),
        to: contact(
            dto.destination(),
            dto.recipient_name.as_deref(),
            dto.recipient_phone.as_deref(),
        ),
        driver: driver(dto),
        price: DeliveryPrice {
            total,
            base: (total - service_fees).max(0.0),
            service_fees,
        },
        proofs: DeliveryProofs {
            pickup: pick_first_non_blank(&[dto.pickup_proof_url.as_deref()]).is_some(),
            delivery: pick_first_non_blank(&[dto.delivery_proof_url.as_deref()]).is_some(),
        },
        timeline: tracking_timeline(dto, status),
    }
}

pub(crate) fn client_deliveries_request() -> PageRequest {
    PageRequest::new()
        .filter("mine", true)
        .sort("deliveryDate,desc")
}

pub async fn fetch_client_deliveries<T: ApiTransport>(
    client: &ApiClient<T>,
) -> Result<Vec<ClientDelivery>, FeatureError> {
    let page = client
        .get_list::<ClientDeliveryDto>(DELIVERIES_ENDPOINT, &client_deliveries_request())
        .await
        .map_err(|err| failure("client_deliveries_fetch", LIST_FAILURE_MESSAGE, err))?;
    info!(
        "event=client_deliveries_fetch module=features status=ok count={}",
        page.content.len()
    );
    Ok(page.content.iter().map(map_client_delivery).collect())
}

/// Tracking detail; `None` when the delivery does not exist.
pub async fn fetch_client_delivery_detail<T: ApiTransport>(
    client: &ApiClient<T>,
    delivery_id: &str,
) -> Result<Option<ClientDeliveryDetail>, FeatureError> {
    let path = format!("{DELIVERIES_ENDPOINT}/{delivery_id}");
    let dto = client
        .get_optional::<ClientDeliveryDto>(&path)
        .await
        .map_err(|err| failure("client_delivery_detail", DETAIL_FAILURE_MESSAGE, err))?;
    Ok(dto.as_ref().map(map_client_delivery_detail))
}
