//! Back-office home dashboard.
//!
//! # Responsibility
//! - Summarize the courier queue, live deliveries, due invoices and recent
//!   campaigns in four stat cards.
//! - List pending couriers, campaign activity and delivery alerts.
//!
//! # Invariants
//! - Five requests run as one settle-all join; the dashboard never fails.
//! - Alerts only cover `DELAYED` and `CANCELLED` deliveries, at most three.

use crate::api::{settle, ApiClient, ApiTransport, Page, PageRequest};
use crate::features::admin::couriers::{AdminCourierDto, COURIERS_ENDPOINT};
use crate::features::admin::flows::{
    AdminAnnouncementDto, AdminDeliveryDto, ANNOUNCEMENTS_ENDPOINT, DELIVERIES_ENDPOINT,
};
use crate::features::admin::invoices::{AdminInvoiceDto, INVOICES_ENDPOINT};
use crate::features::admin::rows;
use crate::model::notification::Severity;
use crate::model::view::{ActivityRecord, StatCard};
use crate::normalize::format::{format_currency_whole, format_short_date_time};
use crate::normalize::{text_or, DASH_PLACEHOLDER};
use log::info;
use serde::Serialize;

const CAMPAIGN_ACTIVITY_LIMIT: usize = 4;
const ALERT_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingCourier {
    pub id: String,
    pub name: String,
    pub company: String,
    pub submitted_at: String,
    pub documents: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardAlert {
    pub id: String,
    pub label: String,
    pub detail: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdminDashboardData {
    pub stats: Vec<StatCard>,
    pub pending_couriers: Vec<PendingCourier>,
    pub activity_items: Vec<ActivityRecord>,
    pub global_alerts: Vec<DashboardAlert>,
}

/// The five independent slices of the home dashboard.
#[derive(Debug, Clone, Default)]
pub struct DashboardSlices {
    pub pending_couriers: Option<Page<AdminCourierDto>>,
    pub approved_couriers: Option<Page<AdminCourierDto>>,
    pub deliveries: Option<Page<AdminDeliveryDto>>,
    pub due_invoices: Option<Page<AdminInvoiceDto>>,
    pub announcements: Option<Page<AdminAnnouncementDto>>,
}

pub fn map_pending_courier(dto: &AdminCourierDto) -> PendingCourier {
    PendingCourier {
        id: dto.id.to_string(),
        name: text_or(&[dto.full_name.as_deref()], DASH_PLACEHOLDER),
        company: text_or(
            &[dto.company_name.as_deref(), dto.zone.as_deref()],
            DASH_PLACEHOLDER,
        ),
        submitted_at: format_short_date_time(dto.submitted_at.as_deref()),
        documents: dto.documents_verified.unwrap_or(0),
    }
}

pub fn map_campaign_activity(dto: &AdminAnnouncementDto) -> ActivityRecord {
    ActivityRecord {
        id: dto.id.to_string(),
        title: text_or(&[dto.title.as_deref()], "Campagne"),
        description: text_or(&[dto.merchant_name.as_deref()], "Annonce EcoDeli"),
        timestamp: format_short_date_time(dto.created_at.as_deref()),
    }
}

/// Alert for a delayed or cancelled delivery; `None` for any other status.
pub fn delivery_alert(dto: &AdminDeliveryDto) -> Option<DashboardAlert> {
    let status = dto.status.as_deref().unwrap_or_default().trim().to_uppercase();
    let severity = match status.as_str() {
        "CANCELLED" => Severity::Error,
        "DELAYED" => Severity::Warning,
        _ => return None,
    };
    Some(DashboardAlert {
        id: dto.id.to_string(),
        label: text_or(&[dto.reference.as_deref()], "Livraison"),
        detail: text_or(
            &[dto.merchant_name.as_deref(), dto.zone.as_deref()],
            "Suivi requis",
        ),
        severity,
    })
}

fn total_of<T>(page: Option<&Page<T>>) -> u64 {
    page.map_or(0, |page| page.total_elements)
}

pub fn compute_dashboard_stats(slices: &DashboardSlices) -> Vec<StatCard> {
    let pending_total = total_of(slices.pending_couriers.as_ref());
    let pending_loaded = rows(slices.pending_couriers.as_ref()).len() as u64;
    let due_amount: f64 = rows(slices.due_invoices.as_ref())
        .iter()
        .filter_map(|invoice| invoice.amount.filter(|amount| amount.is_finite()))
        .sum();

    vec![
        StatCard::new(
            "Livreurs en attente",
            pending_total.to_string(),
            format!("{} dossiers à traiter", pending_total.min(pending_loaded)),
        )
        .with_icon("pendingCouriers"),
        StatCard::new(
            "Validations traitées",
            total_of(slices.approved_couriers.as_ref()).to_string(),
            "Conformité couriers approuvés",
        )
        .with_icon("validations"),
        StatCard::new(
            "Livraisons en cours",
            total_of(slices.deliveries.as_ref()).to_string(),
            format!(
                "{} suivies récemment",
                rows(slices.deliveries.as_ref()).len()
            ),
        )
        .with_icon("deliveries"),
        StatCard::new(
            "Montant factures dues",
            format_currency_whole(due_amount),
            format!(
                "{} factures en attente",
                total_of(slices.due_invoices.as_ref())
            ),
        )
        .with_icon("billing"),
    ]
}

pub fn build_admin_dashboard(slices: &DashboardSlices) -> AdminDashboardData {
    AdminDashboardData {
        stats: compute_dashboard_stats(slices),
        pending_couriers: rows(slices.pending_couriers.as_ref())
            .iter()
            .map(map_pending_courier)
            .collect(),
        activity_items: rows(slices.announcements.as_ref())
            .iter()
            .take(CAMPAIGN_ACTIVITY_LIMIT)
            .map(map_campaign_activity)
            .collect(),
        global_alerts: rows(slices.deliveries.as_ref())
            .iter()
            .filter_map(delivery_alert)
            .take(ALERT_LIMIT)
            .collect(),
    }
}

/// Loads the five dashboard slices concurrently.
pub async fn fetch_admin_dashboard<T: ApiTransport>(client: &ApiClient<T>) -> AdminDashboardData {
    let pending_request = PageRequest::first(5, "submittedAt,desc").filter("status", "PENDING");
    let approved_request = PageRequest::new()
        .filter("status", "APPROVED")
        .page(0)
        .size(1);
    let deliveries_request =
        PageRequest::first(10, "updatedAt,desc").filter("status", "IN_PROGRESS");
    let invoices_request = PageRequest::first(20, "dueAt,asc").filter("status", "DUE");
    let announcements_request = PageRequest::first(5, "createdAt,desc");

    let (pending, approved, deliveries, invoices, announcements) = tokio::join!(
        settle(
            "admin_dashboard_pending_couriers",
            client.get_list::<AdminCourierDto>(COURIERS_ENDPOINT, &pending_request)
        ),
        settle(
            "admin_dashboard_approved_couriers",
            client.get_list::<AdminCourierDto>(COURIERS_ENDPOINT, &approved_request)
        ),
        settle(
            "admin_dashboard_deliveries",
            client.get_list::<AdminDeliveryDto>(DELIVERIES_ENDPOINT, &deliveries_request)
        ),
        settle(
            "admin_dashboard_invoices",
            client.get_list::<AdminInvoiceDto>(INVOICES_ENDPOINT, &invoices_request)
        ),
        settle(
            "admin_dashboard_announcements",
            client.get_list::<AdminAnnouncementDto>(
                ANNOUNCEMENTS_ENDPOINT,
                &announcements_request
            )
        ),
    );

    let slices = DashboardSlices {
        pending_couriers: pending.into_option(),
        approved_couriers: approved.into_option(),
        deliveries: deliveries.into_option(),
        due_invoices: invoices.into_option(),
        announcements: announcements.into_option(),
    };
    let data = build_admin_dashboard(&slices);
    info!(
        "event=admin_dashboard_fetch module=features status=ok pending={} alerts={}",
        data.pending_couriers.len(),
        data.global_alerts.len()
    );
    data
}
