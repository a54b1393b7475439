//! Admin invoicing dashboard.
//!
//! # Responsibility
//! - Map invoice and payment DTOs onto table rows and activity lines.
//! - Derive the four headline stats and the four summary items.
//!
//! # Invariants
//! - Amounts absent from the payload count as `0`.
//! - "Due soon" means a parsable `dueAt` between 0 and 7 whole days ahead
//!   of the caller-supplied `now`.

use crate::api::{settle, ApiClient, ApiTransport, Page, PageRequest};
use crate::features::admin::{rows, total_or_len};
use crate::model::view::{ActivityRecord, AdminStatus, StatCard};
use crate::normalize::format::{format_currency, format_date, format_date_time, parse_timestamp};
use crate::normalize::{normalize_enum, text_or, AliasTable, IdValue, DASH_PLACEHOLDER};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

pub const INVOICES_ENDPOINT: &str = "/admin/invoices";
pub const PAYMENTS_ENDPOINT: &str = "/admin/payments";

const DUE_SOON_DAYS: i64 = 7;
const CRITICAL_OVERDUE_DAYS: i64 = 15;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminInvoiceDto {
    pub id: IdValue,
    pub entity_type: Option<String>,
    pub counterpart_name: Option<String>,
    pub billing_period: Option<String>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub status: Option<String>,
    pub issued_at: Option<String>,
    pub due_at: Option<String>,
    pub overdue_days: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentLogDto {
    pub id: IdValue,
    pub title: Option<String>,
    pub message: Option<String>,
    pub created_at: Option<String>,
}

/// Billed party of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceEntity {
    Merchant,
    Courier,
}

impl InvoiceEntity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Merchant => "merchant",
            Self::Courier => "courier",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Merchant => "Commerçant",
            Self::Courier => "Livreur",
        }
    }
}

const INVOICE_STATUSES: &AliasTable<AdminStatus> = &[
    ("PAID", AdminStatus::Paid),
    ("OVERDUE", AdminStatus::Overdue),
    ("LATE", AdminStatus::Overdue),
    ("DUE", AdminStatus::Due),
];

const INVOICE_ENTITIES: &AliasTable<InvoiceEntity> = &[
    ("COURIER", InvoiceEntity::Courier),
    ("MERCHANT", InvoiceEntity::Merchant),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminInvoiceRow {
    pub id: String,
    pub entity: InvoiceEntity,
    pub counterpart: String,
    pub period: String,
    /// Formatted amount.
    pub amount: String,
    /// Raw amount kept for reports.
    pub amount_value: f64,
    pub currency: Option<String>,
    pub status: AdminStatus,
    pub issued_at: String,
    pub due_at: String,
    pub overdue_days: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdminInvoicesData {
    pub stats: Vec<StatCard>,
    pub invoices: Vec<AdminInvoiceRow>,
    pub payment_activity: Vec<ActivityRecord>,
    pub summary_items: Vec<StatCard>,
}

pub fn normalize_invoice_status(raw: Option<&str>) -> AdminStatus {
    normalize_enum(raw, INVOICE_STATUSES, AdminStatus::Due)
}

pub fn normalize_invoice_entity(raw: Option<&str>) -> InvoiceEntity {
    normalize_enum(raw, INVOICE_ENTITIES, InvoiceEntity::Merchant)
}

pub fn map_invoice_row(dto: &AdminInvoiceDto) -> AdminInvoiceRow {
    let amount_value = dto.amount.filter(|value| value.is_finite()).unwrap_or(0.0);
    AdminInvoiceRow {
        id: dto.id.to_string(),
        entity: normalize_invoice_entity(dto.entity_type.as_deref()),
        counterpart: text_or(&[dto.counterpart_name.as_deref()], DASH_PLACEHOLDER),
        period: text_or(&[dto.billing_period.as_deref()], DASH_PLACEHOLDER),
        amount: format_currency(Some(amount_value), dto.currency.as_deref()),
        amount_value,
        currency: dto.currency.clone(),
        status: normalize_invoice_status(dto.status.as_deref()),
        issued_at: format_date(dto.issued_at.as_deref()),
        due_at: format_date(dto.due_at.as_deref()),
        overdue_days: dto.overdue_days.unwrap_or(0),
    }
}

pub fn map_payment_log(dto: &PaymentLogDto) -> ActivityRecord {
    ActivityRecord {
        id: dto.id.to_string(),
        title: text_or(&[dto.title.as_deref()], "Mouvement financier"),
        description: text_or(&[dto.message.as_deref()], "Mise à jour de paiement"),
        timestamp: format_date_time(dto.created_at.as_deref()),
    }
}

fn amount_of(dto: &AdminInvoiceDto) -> f64 {
    dto.amount.filter(|value| value.is_finite()).unwrap_or(0.0)
}

fn sum_amounts<'a>(invoices: impl Iterator<Item = &'a AdminInvoiceDto>) -> (usize, f64) {
    invoices.fold((0, 0.0), |(count, total), dto| (count + 1, total + amount_of(dto)))
}

/// The four headline cards.
pub fn compute_invoice_stats(page: Option<&Page<AdminInvoiceDto>>) -> Vec<StatCard> {
    let invoices = rows(page);
    let by_status = |status: AdminStatus| {
        sum_amounts(
            invoices
                .iter()
                .filter(move |dto| normalize_invoice_status(dto.status.as_deref()) == status),
        )
    };
    let (pending_count, pending_amount) = by_status(AdminStatus::Due);
    let (paid_count, paid_amount) = by_status(AdminStatus::Paid);
    let (overdue_count, overdue_amount) = by_status(AdminStatus::Overdue);

    vec![
        StatCard::new(
            "Factures en attente",
            pending_count.to_string(),
            format!("{} à encaisser", format_currency(Some(pending_amount), None)),
        ),
        StatCard::new(
            "Montant encaissé",
            format_currency(Some(paid_amount), None),
            format!("{paid_count} factures payées"),
        ),
        StatCard::new(
            "Factures en retard",
            overdue_count.to_string(),
            format!("{} à relancer", format_currency(Some(overdue_amount), None)),
        ),
        StatCard::new(
            "Factures totales",
            invoices.len().to_string(),
            format!("{} sur la période", total_or_len(page)),
        ),
    ]
}

/// Summary column: due soon, courier reversements, critical reminders, gross total.
pub fn compute_invoice_summary(
    page: Option<&Page<AdminInvoiceDto>>,
    now: DateTime<Utc>,
) -> Vec<StatCard> {
    let invoices = rows(page);
    let (due_soon_count, due_soon_amount) = sum_amounts(invoices.iter().filter(|dto| {
        dto.due_at
            .as_deref()
            .and_then(parse_timestamp)
            .map(|due| {
                let diff_ms = (due.with_timezone(&Utc) - now).num_milliseconds();
                let days = (diff_ms as f64 / 86_400_000.0).round() as i64;
                (0..=DUE_SOON_DAYS).contains(&days)
            })
            .unwrap_or(false)
    }));
    let (courier_count, courier_amount) = sum_amounts(invoices.iter().filter(|dto| {
        normalize_invoice_entity(dto.entity_type.as_deref()) == InvoiceEntity::Courier
    }));
    let disputes = invoices
        .iter()
        .filter(|dto| dto.overdue_days.unwrap_or(0) > CRITICAL_OVERDUE_DAYS)
        .count();
    let (_, gross) = sum_amounts(invoices.iter());

    vec![
        StatCard::new(
            "Échéances 7 jours",
            format_currency(Some(due_soon_amount), None),
            format!("{due_soon_count} factures concernées"),
        ),
        StatCard::new(
            "Reversements livreurs",
            format_currency(Some(courier_amount), None),
            format!("{courier_count} dossiers"),
        ),
        StatCard::new(
            "Relances critiques",
            disputes.to_string(),
            "Retards > 15 jours",
        ),
        StatCard::new(
            "Total factures",
            format_currency(Some(gross), None),
            "Montant brut période",
        ),
    ]
}

/// Assembles the dashboard from the two (possibly failed) slices.
pub fn build_admin_invoices(
    invoices: Option<Page<AdminInvoiceDto>>,
    payments: Option<Page<PaymentLogDto>>,
    now: DateTime<Utc>,
) -> AdminInvoicesData {
    AdminInvoicesData {
        stats: compute_invoice_stats(invoices.as_ref()),
        invoices: rows(invoices.as_ref()).iter().map(map_invoice_row).collect(),
        payment_activity: rows(payments.as_ref()).iter().map(map_payment_log).collect(),
        summary_items: compute_invoice_summary(invoices.as_ref(), now),
    }
}

/// Loads invoices and recent payments concurrently.
pub async fn fetch_admin_invoices<T: ApiTransport>(
    client: &ApiClient<T>,
    now: DateTime<Utc>,
) -> AdminInvoicesData {
    let invoices_request = PageRequest::first(50, "issuedAt,desc");
    let payments_request = PageRequest::first(10, "createdAt,desc");
    let (invoices, payments) = tokio::join!(
        settle(
            "admin_invoices",
            client.get_list::<AdminInvoiceDto>(INVOICES_ENDPOINT, &invoices_request)
        ),
        settle(
            "admin_payments",
            client.get_list::<PaymentLogDto>(PAYMENTS_ENDPOINT, &payments_request)
        ),
    );
    let data = build_admin_invoices(invoices.into_option(), payments.into_option(), now);
    info!(
        "event=admin_invoices_fetch module=features status=ok invoices={} payments={}",
        data.invoices.len(),
        data.payment_activity.len()
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

    fn page() -> Page<AdminInvoiceDto> {
        serde_json::from_value(json!({
            "content": [
                {
                    "id": 1,
                    "entityType": "COURIER",
                    "amount": 100.0,
                    "status": "PAID",
                    "dueAt": "2025-12-12T12:00:00Z"
                },
                {
                    "id": 2,
                    "entityType": "merchant",
                    "amount": 250.5,
                    "status": "late",
                    "overdueDays": 20
                },
                { "id": 3, "amount": 49.5, "dueAt": "2025-12-20T12:00:00Z" },
                {
                    "id": 4,
                    "entityType": "courier",
                    "status": "DUE",
                    "dueAt": "2025-12-15T12:00:00Z"
                }
            ],
            "totalElements": 12
        }))
        .expect("invoice page")
    }

    #[test]
    fn status_and_entity_default_safely() {
        assert_eq!(normalize_invoice_status(Some("late")), AdminStatus::Overdue);
        assert_eq!(normalize_invoice_status(Some("whatever")), AdminStatus::Due);
        assert_eq!(normalize_invoice_status(None), AdminStatus::Due);
        assert_eq!(normalize_invoice_entity(None), InvoiceEntity::Merchant);
    }

    #[test]
    fn row_fills_placeholders() {
        let row = map_invoice_row(&AdminInvoiceDto {
            id: IdValue::from("INV-9"),
            amount: Some(1234.5),
            issued_at: Some("2025-12-05T10:00:00Z".to_string()),
            ..AdminInvoiceDto::default()
        });
        assert_eq!(row.counterpart, "—");
        assert_eq!(row.period, "—");
        assert_eq!(row.amount, "1\u{202f}234,50\u{a0}€");
        assert_eq!(row.issued_at, "05 déc. 2025");
        assert_eq!(row.due_at, "—");
    }

    #[test]
    fn stats_group_by_status() {
        let stats = compute_invoice_stats(Some(&page()));
        assert_eq!(stats[0].value, "2");
        assert_eq!(stats[0].helper.as_deref(), Some("49,50\u{a0}€ à encaisser"));
        assert_eq!(stats[1].value, "100,00\u{a0}€");
        assert_eq!(stats[2].value, "1");
        assert_eq!(stats[3].helper.as_deref(), Some("12 sur la période"));
    }

    #[test]
    fn summary_uses_now_for_due_window() {
        let summary = compute_invoice_summary(Some(&page()), now());
        assert_eq!(summary[0].helper.as_deref(), Some("2 factures concernées"));
        assert_eq!(summary[0].value, "100,00\u{a0}€");
        assert_eq!(summary[1].helper.as_deref(), Some("2 dossiers"));
        assert_eq!(summary[2].value, "1");
        assert_eq!(summary[3].value, "400,00\u{a0}€");
    }

    #[test]
    fn failed_slices_render_empty_dashboard() {
        let data = build_admin_invoices(None, None, now());
        assert!(data.invoices.is_empty());
        assert_eq!(data.stats[3].helper.as_deref(), Some("0 sur la période"));
        assert_eq!(data.summary_items[3].value, "0,00\u{a0}€");
    }

    #[test]
    fn payment_log_defaults() {
        let line = map_payment_log(&PaymentLogDto::default());
        assert_eq!(line.title, "Mouvement financier");
        assert_eq!(line.description, "Mise à jour de paiement");
        assert_eq!(line.timestamp, "—");
    }
}
