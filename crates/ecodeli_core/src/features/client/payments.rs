//! Client payments backed by the invoices endpoint.
//!
//! # Responsibility
//! - Map client invoices onto payment rows, details and dashboard lines.
//!
//! # Invariants
//! - Unknown statuses fold to `due`.
//! - Integer cents win over decimal amounts.

use crate::api::{ApiClient, ApiTransport, FeatureError, PageRequest};
use crate::features::client::date_or_to_confirm;
use crate::features::failure;
use crate::normalize::format::{format_currency, format_date, format_date_time};
use crate::normalize::{
    cents_to_amount, normalize_enum, pick_first_defined, pick_first_non_blank, resolve_amount,
    text_or, AliasTable, IdValue, DASH_PLACEHOLDER,
};
use log::info;
use serde::{Deserialize, Serialize};

pub const CLIENT_INVOICES_ENDPOINT: &str = "/invoices";

const LIST_FAILURE_MESSAGE: &str = "Impossible de récupérer vos paiements";
const DETAIL_FAILURE_MESSAGE: &str = "Impossible de récupérer le paiement";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientInvoiceDto {
    pub id: IdValue,
    pub title: Option<String>,
    pub reference: Option<String>,
    pub delivery_id: Option<IdValue>,
    pub delivery_title: Option<String>,
    pub due_date: Option<String>,
    pub due_on: Option<String>,
    pub issued_at: Option<String>,
    pub paid_at: Option<String>,
    pub amount: Option<f64>,
    pub total: Option<f64>,
    pub total_amount: Option<f64>,
    pub amount_cents: Option<i64>,
    pub total_cents: Option<i64>,
    pub service_fee: Option<f64>,
    pub service_fee_cents: Option<i64>,
    pub currency: Option<String>,
    pub status: Option<String>,
    pub state: Option<String>,
    pub transaction_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientPaymentStatus {
    Due,
    Processing,
    Paid,
    Failed,
}

const PAYMENT_STATUSES: &AliasTable<ClientPaymentStatus> = &[
    ("DUE", ClientPaymentStatus::Due),
    ("AWAITING_PAYMENT", ClientPaymentStatus::Due),
    ("PROCESSING", ClientPaymentStatus::Processing),
    ("IN_PROGRESS", ClientPaymentStatus::Processing),
    ("PENDING", ClientPaymentStatus::Processing),
    ("PAID", ClientPaymentStatus::Paid),
    ("COMPLETED", ClientPaymentStatus::Paid),
    ("FAILED", ClientPaymentStatus::Failed),
    ("ERROR", ClientPaymentStatus::Failed),
];

impl ClientPaymentStatus {
    pub fn parse(raw: Option<&str>) -> Self {
        normalize_enum(raw, PAYMENT_STATUSES, Self::Due)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Due => "À régler",
            Self::Processing => "En cours",
            Self::Paid => "Payé",
            Self::Failed => "Échec",
        }
    }

    /// Still waiting on the client or the payment provider.
    pub fn is_outstanding(self) -> bool {
        matches!(self, Self::Due | Self::Processing)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientPayment {
    pub id: String,
    pub reference: String,
    pub delivery_title: String,
    pub amount: f64,
    pub due_date: String,
    pub status: ClientPaymentStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientPaymentDetail {
    pub payment: ClientPayment,
    pub delivery_id: String,
    pub service_fee: f64,
    pub total: f64,
    pub transaction_id: String,
    pub paid_at: Option<String>,
}

/// Compact payment line of the client dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardPayment {
    pub id: String,
    pub title: String,
    pub due_date: String,
    pub amount: String,
}

fn optional_amount(cents: Option<i64>, amounts: &[Option<f64>]) -> Option<f64> {
    if let Some(cents) = cents {
        return Some(cents_to_amount(cents));
    }
    amounts.iter().flatten().copied().find(|value| value.is_finite())
}

fn due_date_raw(dto: &ClientInvoiceDto) -> Option<&str> {
    pick_first_non_blank(&[
        dto.due_date.as_deref(),
        dto.due_on.as_deref(),
        dto.issued_at.as_deref(),
    ])
}

pub fn payment_status(dto: &ClientInvoiceDto) -> ClientPaymentStatus {
    ClientPaymentStatus::parse(pick_first_non_blank(&[
        dto.status.as_deref(),
        dto.state.as_deref(),
    ]))
}

fn service_fee_of(dto: &ClientInvoiceDto) -> f64 {
    resolve_amount(dto.service_fee_cents, &[dto.service_fee])
}

/// Delivery price before fees: explicit amount, else the total minus fees.
fn base_amount(dto: &ClientInvoiceDto) -> f64 {
    if let Some(amount) = optional_amount(dto.amount_cents, &[dto.amount]) {
        return amount;
    }
    optional_amount(dto.total_cents, &[dto.total, dto.total_amount])
        .map_or(0.0, |total| (total - service_fee_of(dto)).max(0.0))
}

pub fn map_client_payment(dto: &ClientInvoiceDto) -> ClientPayment {
    ClientPayment {
        id: dto.id.to_string(),
        reference: text_or(&[dto.reference.as_deref()], &dto.id.to_string()),
        delivery_title: text_or(
            &[dto.delivery_title.as_deref(), dto.title.as_deref()],
            "Livraison EcoDeli",
        ),
        amount: base_amount(dto),
        due_date: format_date(due_date_raw(dto)),
        status: payment_status(dto),
    }
}

pub fn map_client_payment_detail(dto: &ClientInvoiceDto) -> ClientPaymentDetail {
    let payment = map_client_payment(dto);
    let service_fee = service_fee_of(dto);
    let total = optional_amount(dto.total_cents, &[dto.total, dto.total_amount])
        .unwrap_or(payment.amount + service_fee);
    ClientPaymentDetail {
        delivery_id: dto
            .delivery_id
            .as_ref()
            .map_or_else(|| payment.id.clone(), IdValue::to_string),
        transaction_id: text_or(&[dto.transaction_id.as_deref()], &payment.reference),
        paid_at: dto
            .paid_at
            .as_deref()
            .map(|raw| format_date_time(Some(raw)))
            .filter(|label| label != DASH_PLACEHOLDER),
        service_fee,
        total,
        payment,
    }
}

pub fn map_dashboard_payment(dto: &ClientInvoiceDto) -> DashboardPayment {
    let amount = resolve_amount(
        pick_first_defined(&[dto.total_cents, dto.amount_cents]),
        &[dto.amount, dto.total, dto.total_amount],
    );
    DashboardPayment {
        id: dto.id.to_string(),
        title: text_or(
            &[dto.title.as_deref(), dto.reference.as_deref()],
            "Paiement EcoDeli",
        ),
        due_date: date_or_to_confirm(due_date_raw(dto)),
        amount: format_currency(Some(amount), dto.currency.as_deref()),
    }
}

/// The client's invoices, most recent first.
pub async fn fetch_client_payments<T: ApiTransport>(
    client: &ApiClient<T>,
) -> Result<Vec<ClientPayment>, FeatureError> {
    let request = PageRequest::new()
        .filter("mine", true)
        .sort("issuedAt,desc");
    let page = client
        .get_list::<ClientInvoiceDto>(CLIENT_INVOICES_ENDPOINT, &request)
        .await
        .map_err(|err| failure("client_payments_fetch", LIST_FAILURE_MESSAGE, err))?;
    info!(
        "event=client_payments_fetch module=features status=ok count={}",
        page.content.len()
    );
    Ok(page.content.iter().map(map_client_payment).collect())
}

/// Payment detail; `None` when the invoice does not exist.
pub async fn fetch_client_payment_detail<T: ApiTransport>(
    client: &ApiClient<T>,
    payment_id: &str,
) -> Result<Option<ClientPaymentDetail>, FeatureError> {
    let path = format!("{CLIENT_INVOICES_ENDPOINT}/{payment_id}");
    let dto = client
        .get_optional::<ClientInvoiceDto>(&path)
        .await
        .map_err(|err| failure("client_payment_detail", DETAIL_FAILURE_MESSAGE, err))?;
    Ok(dto.as_ref().map(map_client_payment_detail))
}
