//! Client home dashboard.
//!
//! # Responsibility
//! - Join the client's announcements, deliveries and invoices into three
//!   stat cards and three recent-item lists.
//!
//! # Invariants
//! - The three requests run as one settle-all join; a failed slice is empty.
//! - Only a dashboard whose three requests all failed is an error.

use crate::api::{settle, ApiClient, ApiTransport, FeatureError, PageRequest, Settled};
use crate::features::client::deliveries::{
    client_deliveries_request, map_dashboard_delivery, ClientDeliveryDto, DashboardDelivery,
};
use crate::features::client::payments::{
    map_dashboard_payment, payment_status, ClientInvoiceDto, DashboardPayment,
    CLIENT_INVOICES_ENDPOINT,
};
use crate::features::client::{
    announcement_type_label, date_or_to_confirm, AnnouncementDto, AnnouncementStatus,
    ANNOUNCEMENTS_ENDPOINT,
};
use crate::features::courier::{DeliveryStatus, DELIVERIES_ENDPOINT};
use crate::features::failure;
use crate::model::view::StatCard;
use crate::normalize::format::format_currency;
use crate::normalize::{pick_first_non_blank, resolve_amount, text_or};
use log::info;
use serde::Serialize;

const FAILURE_MESSAGE: &str = "Impossible de charger votre tableau de bord";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardAnnouncement {
    pub id: String,
    pub title: String,
    pub kind: String,
    pub deadline: String,
    pub budget: String,
    pub status: AnnouncementStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClientDashboardData {
    pub stats: Vec<StatCard>,
    pub announcements: Vec<DashboardAnnouncement>,
    pub deliveries: Vec<DashboardDelivery>,
    pub payments: Vec<DashboardPayment>,
}

/// Dashboard reading of an announcement status: anything not a draft or
/// cancelled counts as published.
pub fn dashboard_announcement_status(raw: Option<&str>) -> AnnouncementStatus {
    match raw.unwrap_or_default().trim().to_uppercase().as_str() {
        "DRAFT" => AnnouncementStatus::Draft,
        "CANCELLED" | "CANCELED" => AnnouncementStatus::Cancelled,
        _ => AnnouncementStatus::Published,
    }
}

pub fn map_dashboard_announcement(dto: &AnnouncementDto) -> DashboardAnnouncement {
    DashboardAnnouncement {
        id: dto.id.to_string(),
        title: text_or(&[dto.title.as_deref()], "Annonce EcoDeli"),
        kind: announcement_type_label(dto.kind.as_deref(), dto.category.as_deref()),
        deadline: date_or_to_confirm(pick_first_non_blank(&[
            dto.latest_at.as_deref(),
            dto.due_date.as_deref(),
            dto.deadline.as_deref(),
        ])),
        budget: format_currency(
            Some(resolve_amount(dto.budget_cents, &[dto.budget_amount, dto.budget])),
            dto.currency.as_deref(),
        ),
        status: dashboard_announcement_status(dto.status.as_deref()),
    }
}

fn count_card(label: &str, count: usize, icon: &str) -> StatCard {
    StatCard {
        label: label.to_string(),
        value: count.to_string(),
        helper: None,
        icon: Some(icon.to_string()),
    }
}

pub fn compute_client_stats(
    announcements: &[AnnouncementDto],
    deliveries: &[ClientDeliveryDto],
    invoices: &[ClientInvoiceDto],
) -> Vec<StatCard> {
    let active = announcements
        .iter()
        .filter(|dto| {
            dashboard_announcement_status(dto.status.as_deref()) == AnnouncementStatus::Published
        })
        .count();
    let in_progress = deliveries
        .iter()
        .filter(|dto| dto.normalized_status() != DeliveryStatus::Delivered)
        .count();
    let awaiting_payment = invoices
        .iter()
        .filter(|dto| payment_status(dto).is_outstanding())
        .count();
    vec![
        count_card("Annonces actives", active, "announcements"),
        count_card("Livraisons en cours", in_progress, "deliveries"),
        count_card("En attente de paiement", awaiting_payment, "payments"),
    ]
}

pub fn build_client_dashboard(
    announcements: &[AnnouncementDto],
    deliveries: &[ClientDeliveryDto],
    invoices: &[ClientInvoiceDto],
) -> ClientDashboardData {
    ClientDashboardData {
        stats: compute_client_stats(announcements, deliveries, invoices),
        announcements: announcements.iter().map(map_dashboard_announcement).collect(),
        deliveries: deliveries.iter().map(map_dashboard_delivery).collect(),
        payments: invoices.iter().map(map_dashboard_payment).collect(),
    }
}

/// Loads the three dashboard slices concurrently.
///
/// # Errors
/// Only when all three requests fail; the first failure is carried.
pub async fn fetch_client_dashboard<T: ApiTransport>(
    client: &ApiClient<T>,
) -> Result<ClientDashboardData, FeatureError> {
    let announcements_request = PageRequest::new()
        .filter("mine", true)
        .sort("createdAt,desc");
    let deliveries_request = client_deliveries_request();
    let invoices_request = PageRequest::new()
        .filter("mine", true)
        .sort("issuedAt,desc");

    let (announcements, deliveries, invoices) = tokio::join!(
        settle(
            "client_dashboard_announcements",
            client.get_list::<AnnouncementDto>(ANNOUNCEMENTS_ENDPOINT, &announcements_request)
        ),
        settle(
            "client_dashboard_deliveries",
            client.get_list::<ClientDeliveryDto>(DELIVERIES_ENDPOINT, &deliveries_request)
        ),
        settle(
            "client_dashboard_invoices",
            client.get_list::<ClientInvoiceDto>(CLIENT_INVOICES_ENDPOINT, &invoices_request)
        ),
    );

    if let (Settled::Rejected(err), Settled::Rejected(_), Settled::Rejected(_)) =
        (&announcements, &deliveries, &invoices)
    {
        return Err(failure("client_dashboard_fetch", FAILURE_MESSAGE, err.clone()));
    }

    let announcements = announcements.ok_or_default().content;
    let deliveries = deliveries.ok_or_default().content;
    let invoices = invoices.ok_or_default().content;
    let data = build_client_dashboard(&announcements, &deliveries, &invoices);
    info!(
        "event=client_dashboard_fetch module=features status=ok counts={}/{}/{}",
        data.announcements.len(),
        data.deliveries.len(),
        data.payments.len()
    );
    Ok(data)
}
