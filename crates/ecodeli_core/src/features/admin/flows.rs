//! Admin overview of merchant campaigns and deliveries.
//!
//! # Responsibility
//! - Merge announcements and deliveries into one flow table.
//! - Derive overview stats, the planning snapshot and live activity.
//!
//! # Invariants
//! - The flow table holds at most ten rows, announcements first.
//! - Unknown statuses fold to `scheduled`.

use crate::api::{settle, ApiClient, ApiTransport, Page, PageRequest};
use crate::features::admin::{rows, total_or_len};
use crate::model::view::{ActivityRecord, AdminStatus, StatCard};
use crate::normalize::format::{format_date_time, format_time, format_window, parse_timestamp};
use crate::normalize::{normalize_enum, text_or, AliasTable, IdValue, DASH_PLACEHOLDER};
use log::info;
use serde::{Deserialize, Serialize};

pub const ANNOUNCEMENTS_ENDPOINT: &str = "/admin/announcements";
pub const DELIVERIES_ENDPOINT: &str = "/admin/deliveries";

const FLOW_TABLE_LIMIT: usize = 10;
const LIVE_ACTIVITY_LIMIT: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminAnnouncementDto {
    pub id: IdValue,
    pub title: Option<String>,
    pub merchant_name: Option<String>,
    pub status: Option<String>,
    pub zone: Option<String>,
    pub start_at: Option<String>,
    pub end_at: Option<String>,
    pub expected_volume: Option<i64>,
    pub couriers_assigned: Option<i64>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminDeliveryDto {
    pub id: IdValue,
    pub reference: Option<String>,
    pub merchant_name: Option<String>,
    pub status: Option<String>,
    pub eta: Option<String>,
    pub zone: Option<String>,
    pub planned_window_start: Option<String>,
    pub planned_window_end: Option<String>,
    pub parcels: Option<i64>,
    pub couriers_assigned: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowType {
    Announcement,
    Delivery,
}

impl FlowType {
    pub fn label(self) -> &'static str {
        match self {
            Self::Announcement => "Annonce",
            Self::Delivery => "Livraison",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminFlowRow {
    pub id: String,
    pub kind: FlowType,
    pub title: String,
    pub merchant: String,
    pub zone: String,
    pub window: String,
    pub status: AdminStatus,
    pub volume: String,
    pub couriers: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdminFlowsData {
    pub overview_stats: Vec<StatCard>,
    pub flow_rows: Vec<AdminFlowRow>,
    pub planning_snapshot: Vec<StatCard>,
    pub live_activity: Vec<ActivityRecord>,
}

const FLOW_STATUSES: &AliasTable<AdminStatus> = &[
    ("ACTIVE", AdminStatus::Active),
    ("IN_PROGRESS", AdminStatus::Active),
    ("IN_TRANSIT", AdminStatus::Active),
    ("REVIEW", AdminStatus::Review),
    ("PENDING", AdminStatus::Pending),
    ("SCHEDULED", AdminStatus::Scheduled),
    ("PAUSED", AdminStatus::Paused),
    ("DELIVERED", AdminStatus::Delivered),
    ("COMPLETED", AdminStatus::Delivered),
    ("CANCELLED", AdminStatus::Cancelled),
    ("CANCELED", AdminStatus::Cancelled),
    ("DELAYED", AdminStatus::Delayed),
    ("LATE", AdminStatus::Delayed),
];

pub fn normalize_flow_status(raw: Option<&str>) -> AdminStatus {
    normalize_enum(raw, FLOW_STATUSES, AdminStatus::Scheduled)
}

pub fn map_announcement_row(dto: &AdminAnnouncementDto) -> AdminFlowRow {
    AdminFlowRow {
        id: dto.id.to_string(),
        kind: FlowType::Announcement,
        title: text_or(&[dto.title.as_deref()], "Campagne"),
        merchant: text_or(&[dto.merchant_name.as_deref()], DASH_PLACEHOLDER),
        zone: text_or(&[dto.zone.as_deref()], DASH_PLACEHOLDER),
        window: format_window(dto.start_at.as_deref(), dto.end_at.as_deref()),
        status: normalize_flow_status(dto.status.as_deref()),
        volume: format!("{} colis", dto.expected_volume.unwrap_or(0)),
        couriers: dto.couriers_assigned.unwrap_or(0),
    }
}

pub fn map_delivery_row(dto: &AdminDeliveryDto) -> AdminFlowRow {
    let window = match dto.eta.as_deref().filter(|eta| parse_timestamp(eta).is_some()) {
        Some(eta) => format!("ETA {}", format_time(Some(eta))),
        None => format_window(
            dto.planned_window_start.as_deref(),
            dto.planned_window_end.as_deref(),
        ),
    };
    AdminFlowRow {
        id: dto.id.to_string(),
        kind: FlowType::Delivery,
        title: text_or(&[dto.reference.as_deref()], "Livraison"),
        merchant: text_or(&[dto.merchant_name.as_deref()], DASH_PLACEHOLDER),
        zone: text_or(&[dto.zone.as_deref()], DASH_PLACEHOLDER),
        window,
        status: normalize_flow_status(dto.status.as_deref()),
        volume: format!("{} colis", dto.parcels.unwrap_or(0)),
        couriers: dto.couriers_assigned.unwrap_or(0),
    }
}

pub fn map_live_activity(dto: &AdminDeliveryDto) -> ActivityRecord {
    ActivityRecord {
        id: dto.id.to_string(),
        title: text_or(&[dto.reference.as_deref()], "Livraison"),
        description: text_or(
            &[dto.merchant_name.as_deref(), dto.zone.as_deref()],
            "Suivi EcoDeli",
        ),
        timestamp: format_date_time(dto.eta.as_deref()),
    }
}

/// First ten announcements, then first ten deliveries, truncated to ten.
pub fn build_flow_rows(
    announcements: &[AdminAnnouncementDto],
    deliveries: &[AdminDeliveryDto],
) -> Vec<AdminFlowRow> {
    announcements
        .iter()
        .take(FLOW_TABLE_LIMIT)
        .map(map_announcement_row)
        .chain(deliveries.iter().take(FLOW_TABLE_LIMIT).map(map_delivery_row))
        .take(FLOW_TABLE_LIMIT)
        .collect()
}

pub fn compute_overview_stats(
    announcements: Option<&Page<AdminAnnouncementDto>>,
    deliveries: Option<&Page<AdminDeliveryDto>>,
) -> Vec<StatCard> {
    let campaigns = rows(announcements);
    let shipments = rows(deliveries);
    let campaign_status =
        |dto: &&AdminAnnouncementDto| normalize_flow_status(dto.status.as_deref());

    let active_campaigns = campaigns
        .iter()
        .filter(|dto| campaign_status(dto) == AdminStatus::Active)
        .count();
    let preparing = campaigns
        .iter()
        .filter(|dto| {
            matches!(
                campaign_status(dto),
                AdminStatus::Scheduled | AdminStatus::Review | AdminStatus::Pending
            )
        })
        .count();
    let active_deliveries = shipments
        .iter()
        .filter(|dto| normalize_flow_status(dto.status.as_deref()) == AdminStatus::Active)
        .count();
    let delayed = shipments
        .iter()
        .filter(|dto| normalize_flow_status(dto.status.as_deref()) == AdminStatus::Delayed)
        .count();

    let total_campaigns = total_or_len(announcements);
    let completion = if total_campaigns == 0 {
        0
    } else {
        (active_campaigns as f64 / total_campaigns as f64 * 100.0).round() as i64
    };

    vec![
        StatCard::new(
            "Campagnes actives",
            active_campaigns.to_string(),
            format!("{preparing} en préparation"),
        ),
        StatCard::new(
            "Livraisons suivies",
            shipments.len().to_string(),
            format!("{active_deliveries} en cours"),
        ),
        StatCard::new(
            "Retards détectés",
            delayed.to_string(),
            "Actions recommandées ASAP",
        ),
        StatCard::new(
            "Taux de complétion",
            format!("{completion}%"),
            format!("{total_campaigns} campagnes en cours"),
        ),
    ]
}

pub fn compute_planning_snapshot(
    announcements: &[AdminAnnouncementDto],
    deliveries: &[AdminDeliveryDto],
) -> Vec<StatCard> {
    let critical = deliveries
        .iter()
        .filter(|dto| {
            let raw = dto.status.as_deref().unwrap_or_default().trim().to_uppercase();
            raw == "DELAYED" || raw == "CANCELLED"
        })
        .count();
    let multi_zone = announcements
        .iter()
        .filter(|dto| dto.zone.as_deref().is_some_and(|zone| zone.contains(',')))
        .count();
    let volume: i64 = announcements
        .iter()
        .map(|dto| dto.expected_volume.unwrap_or(0))
        .chain(deliveries.iter().map(|dto| dto.parcels.unwrap_or(0)))
        .sum();

    vec![
        StatCard::new(
            "Fenêtres critiques",
            critical.to_string(),
            "Livraisons à prioriser",
        ),
        StatCard::new(
            "Campagnes multi-zones",
            multi_zone.to_string(),
            "Coordination hub à prévoir",
        ),
        StatCard::new("Volume global", format!("{volume} colis"), "Horizon 48h"),
    ]
}

pub fn build_admin_flows(
    announcements: Option<Page<AdminAnnouncementDto>>,
    deliveries: Option<Page<AdminDeliveryDto>>,
) -> AdminFlowsData {
    let campaigns = rows(announcements.as_ref());
    let shipments = rows(deliveries.as_ref());
    AdminFlowsData {
        overview_stats: compute_overview_stats(announcements.as_ref(), deliveries.as_ref()),
        flow_rows: build_flow_rows(campaigns, shipments),
        planning_snapshot: compute_planning_snapshot(campaigns, shipments),
        live_activity: shipments
            .iter()
            .take(LIVE_ACTIVITY_LIMIT)
            .map(map_live_activity)
            .collect(),
    }
}

/// Loads announcements and deliveries concurrently.
pub async fn fetch_admin_flows<T: ApiTransport>(client: &ApiClient<T>) -> AdminFlowsData {
    let announcements_request = PageRequest::first(25, "startAt,asc");
    let deliveries_request = PageRequest::first(25, "plannedWindowStart,asc");
    let (announcements, deliveries) = tokio::join!(
        settle(
            "admin_announcements",
            client.get_list::<AdminAnnouncementDto>(ANNOUNCEMENTS_ENDPOINT, &announcements_request)
        ),
        settle(
            "admin_deliveries",
            client.get_list::<AdminDeliveryDto>(DELIVERIES_ENDPOINT, &deliveries_request)
        ),
    );
    let data = build_admin_flows(announcements.into_option(), deliveries.into_option());
    info!(
        "event=admin_flows_fetch module=features status=ok rows={}",
        data.flow_rows.len()
    );
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn announcements() -> Page<AdminAnnouncementDto> {
        serde_json::from_value(json!({
            "content": [
                {
                    "id": 1,
                    "title": "Noël",
                    "status": "ACTIVE",
                    "zone": "Paris, Lyon",
                    "expectedVolume": 120,
                    "couriersAssigned": 4
                },
                { "id": 2, "status": "review", "startAt": "2025-12-12T07:00:00Z" },
                { "id": 3, "status": "mystery", "expectedVolume": 30 }
            ],
            "totalElements": 4
        }))
        .expect("announcement page")
    }

    fn deliveries() -> Page<AdminDeliveryDto> {
        serde_json::from_value(json!([
            {
                "id": "D-1",
                "reference": "DLV-1",
                "status": "in_transit",
                "eta": "2025-12-09T14:05:00Z",
                "parcels": 3
            },
            { "id": "D-2", "status": "DELAYED", "zone": "Lille", "parcels": 2 },
            { "id": "D-3", "status": "LATE" }
        ]))
        .map(|content: Vec<AdminDeliveryDto>| Page::of(content))
        .expect("delivery list")
    }

    #[test]
    fn unknown_flow_status_is_scheduled() {
        assert_eq!(normalize_flow_status(Some("mystery")), AdminStatus::Scheduled);
        assert_eq!(normalize_flow_status(Some("canceled")), AdminStatus::Cancelled);
        assert_eq!(normalize_flow_status(None), AdminStatus::Scheduled);
    }

    #[test]
    fn delivery_window_prefers_eta() {
        let rows = build_flow_rows(&announcements().content, &deliveries().content);
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0].kind, FlowType::Announcement);
        assert_eq!(rows[1].title, "Campagne");
        assert_eq!(rows[1].window, "12 déc., 07:00");
        assert_eq!(rows[3].window, "ETA 14:05");
        assert_eq!(rows[4].window, "—");
        assert_eq!(rows[4].title, "Livraison");
    }

    #[test]
    fn flow_table_is_capped_at_ten() {
        let many: Vec<AdminAnnouncementDto> = (0..12_i64)
            .map(|id| AdminAnnouncementDto {
                id: IdValue::from(id),
                ..AdminAnnouncementDto::default()
            })
            .collect();
        let rows = build_flow_rows(&many, &deliveries().content);
        assert_eq!(rows.len(), 10);
        assert!(rows.iter().all(|row| row.kind == FlowType::Announcement));
    }

    #[test]
    fn overview_and_planning() {
        let data = build_admin_flows(Some(announcements()), Some(deliveries()));
        assert_eq!(data.overview_stats[0].value, "1");
        assert_eq!(data.overview_stats[0].helper.as_deref(), Some("2 en préparation"));
        assert_eq!(data.overview_stats[1].helper.as_deref(), Some("1 en cours"));
        assert_eq!(data.overview_stats[2].value, "2");
        assert_eq!(data.overview_stats[3].value, "25%");
        assert_eq!(data.planning_snapshot[0].value, "1");
        assert_eq!(data.planning_snapshot[1].value, "1");
        assert_eq!(data.planning_snapshot[2].value, "155 colis");
        assert_eq!(data.live_activity.len(), 3);
        assert_eq!(data.live_activity[1].description, "Lille");
        assert_eq!(data.live_activity[2].description, "Suivi EcoDeli");
    }

    #[test]
    fn failed_slices_yield_zero_completion() {
        let data = build_admin_flows(None, None);
        assert_eq!(data.overview_stats[3].value, "0%");
        assert!(data.flow_rows.is_empty());
    }
}
