//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Own the process-wide notification feed shown by the active role page.
//! - Flatten core errors into envelopes with `ok` + a displayable message.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Network calls run on FRB worker threads, never on the UI thread.
//! - Feed calls are sync and never touch the network.

use chrono::Utc;
use ecodeli_core::export::csv::{
    build_invoice_report, export_flows_csv, invoice_report_file_name, InvoiceReportInput,
    FLOWS_CSV_FILE_NAME,
};
use ecodeli_core::export::pdf::{
    admin_invoice_file_name, draw_admin_invoice, draw_merchant_contract, draw_payment_invoice,
    draw_provider_invoice, merchant_contract_file_name, payment_invoice_file_name,
    provider_invoice_file_name, PaymentInvoicePdf, ProviderInvoicePdf, RecordingCanvas,
};
use ecodeli_core::features::admin::flows::fetch_admin_flows;
use ecodeli_core::features::admin::invoices::fetch_admin_invoices;
use ecodeli_core::features::client::payments::fetch_client_payment_detail;
use ecodeli_core::features::courier::advance_courier_delivery;
use ecodeli_core::features::courier::announcements::take_over_announcement;
use ecodeli_core::features::merchant::fetch_merchant_contract;
use ecodeli_core::features::provider::fetch_provider_invoices;
use ecodeli_core::{
    core_version as core_version_inner, fetch_notification_feed, init_logging as init_logging_inner,
    ping as ping_inner, write_export, ApiClient, AppConfig, NotificationFeed, NotificationFeedItem,
    NotificationRole, ReqwestTransport, Visibility,
};
use log::{info, warn};
use std::future::Future;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use tokio::runtime::{Builder, Runtime};

const FEED_NOT_LOADED: &str = "Aucun fil de notifications chargé.";
const NOTHING_TO_EXPORT: &str = "Aucune ligne à exporter.";

static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();
static RUNTIME: OnceLock<Runtime> = OnceLock::new();
static ACCESS_TOKEN: Mutex<Option<String>> = Mutex::new(None);
static FEED: Mutex<Option<NotificationFeed>> = Mutex::new(None);

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Stores the bearer token obtained by the identity flow; blank clears it.
#[flutter_rust_bridge::frb(sync)]
pub fn set_access_token(token: String) {
    let token = token.trim().to_string();
    *lock(&ACCESS_TOKEN) = (!token.is_empty()).then_some(token);
}

/// Notification line as displayed by the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItemView {
    pub id: String,
    pub title: String,
    pub message: String,
    pub timestamp: String,
    pub source: Option<String>,
    pub category: Option<String>,
    /// `error|warning|info|success`; absent once read.
    pub severity: Option<String>,
    pub icon: Option<String>,
}

/// Current filtered view of the feed plus its inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSnapshot {
    pub ok: bool,
    pub items: Vec<FeedItemView>,
    pub unread_count: u32,
    pub total_count: u32,
    pub filter: String,
    pub visibility: String,
    pub search_term: String,
    /// Empty on success.
    pub message: String,
}

impl FeedSnapshot {
    fn of(feed: &NotificationFeed) -> Self {
        Self {
            ok: true,
            items: feed.filtered_items().into_iter().map(to_feed_item_view).collect(),
            unread_count: feed.unread_count() as u32,
            total_count: feed.total_count() as u32,
            filter: feed.filter().as_str().to_string(),
            visibility: feed.visibility().as_str().to_string(),
            search_term: feed.search_term().to_string(),
            message: String::new(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            items: Vec::new(),
            unread_count: 0,
            total_count: 0,
            filter: String::new(),
            visibility: String::new(),
            search_term: String::new(),
            message: message.into(),
        }
    }
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Optional value produced by the action (new status, written path).
    pub value: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, value: String) -> Self {
        Self {
            ok: true,
            value: Some(value),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            value: None,
            message: message.into(),
        }
    }
}

/// Recorded PDF page handed to the shell rasterizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfDocumentResponse {
    pub ok: bool,
    pub file_name: String,
    /// JSON array of draw operations.
    pub ops_json: String,
    pub message: String,
}

impl PdfDocumentResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            file_name: String::new(),
            ops_json: String::new(),
            message: message.into(),
        }
    }
}

/// Loads the notification feed of `role` and makes it the active feed.
///
/// # FFI contract
/// - Async call on an FRB worker thread; performs one HTTP request.
/// - Never panics.
/// - On failure the previous feed is kept and the localized message returned.
pub fn feed_load(role: String, initial_filter: String) -> FeedSnapshot {
    let Some(role) = NotificationRole::parse(&role) else {
        return FeedSnapshot::failure(format!("feed_load failed: unknown role `{role}`"));
    };
    let items = match with_client(|client| async move {
        fetch_notification_feed(&client, role, Utc::now())
            .await
            .map_err(|err| err.to_string())
    }) {
        Ok(items) => items,
        Err(message) => return FeedSnapshot::failure(message),
    };
    info!(
        "event=ffi_feed_load module=ffi status=ok role={} count={}",
        role.as_str(),
        items.len()
    );
    install_feed(items, initial_filter.as_str())
}

fn install_feed(items: Vec<NotificationFeedItem>, initial_filter: &str) -> FeedSnapshot {
    let feed = NotificationFeed::new(items, initial_filter);
    let snapshot = FeedSnapshot::of(&feed);
    *lock(&FEED) = Some(feed);
    snapshot
}

/// Current feed view.
#[flutter_rust_bridge::frb(sync)]
pub fn feed_snapshot() -> FeedSnapshot {
    with_feed(|_| {})
}

/// Sets the category/criticality filter (`all`, `critical`, or a source value).
#[flutter_rust_bridge::frb(sync)]
pub fn feed_set_filter(value: String) -> FeedSnapshot {
    with_feed(|feed| feed.set_filter(value.as_str()))
}

/// Sets the visibility toggle (`all` or `unread`).
#[flutter_rust_bridge::frb(sync)]
pub fn feed_set_visibility(value: String) -> FeedSnapshot {
    with_feed(|feed| feed.set_visibility(Visibility::parse(&value)))
}

#[flutter_rust_bridge::frb(sync)]
pub fn feed_set_search_term(value: String) -> FeedSnapshot {
    with_feed(|feed| feed.set_search_term(value))
}

#[flutter_rust_bridge::frb(sync)]
pub fn feed_mark_as_read(id: String) -> FeedSnapshot {
    with_feed(|feed| feed.mark_as_read(&id))
}

#[flutter_rust_bridge::frb(sync)]
pub fn feed_dismiss(id: String) -> FeedSnapshot {
    with_feed(|feed| feed.dismiss(&id))
}

#[flutter_rust_bridge::frb(sync)]
pub fn feed_mark_all_as_read() -> FeedSnapshot {
    with_feed(NotificationFeed::mark_all_as_read)
}

#[flutter_rust_bridge::frb(sync)]
pub fn feed_clear_all() -> FeedSnapshot {
    with_feed(NotificationFeed::clear_all)
}

/// Moves a courier mission one step forward.
///
/// # FFI contract
/// - Async call on an FRB worker thread.
/// - `value` carries the resulting status token (`ACCEPTED|PICKED_UP|IN_TRANSIT|DELIVERED`).
pub fn courier_advance_delivery(delivery_id: String) -> ActionResponse {
    let result = with_client(|client| async move {
        advance_courier_delivery(&client, delivery_id.trim())
            .await
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(detail) => ActionResponse::success(
            detail.delivery.status.label(),
            detail.delivery.status.as_wire().to_string(),
        ),
        Err(message) => ActionResponse::failure(message),
    }
}

/// Assigns a published announcement to the signed-in courier.
///
/// `value` carries the assignment id.
pub fn courier_take_over_announcement(announcement_id: String, note: String) -> ActionResponse {
    let result = with_client(|client| async move {
        take_over_announcement(&client, announcement_id.trim(), Some(note.as_str()))
            .await
            .map_err(|err| err.message)
    });
    match result {
        Ok(assignment) => ActionResponse::success(assignment.message, assignment.assignment_id),
        Err(message) => ActionResponse::failure(message),
    }
}

/// Exports the admin announcements/deliveries table into `output_dir`.
///
/// `value` carries the written file path.
pub fn export_admin_flows(output_dir: String) -> ActionResponse {
    let data = match with_client(|client| async move { Ok(fetch_admin_flows(&client).await) }) {
        Ok(data) => data,
        Err(message) => return ActionResponse::failure(message),
    };
    let Some(csv) = export_flows_csv(&data.flow_rows) else {
        return ActionResponse::failure(NOTHING_TO_EXPORT);
    };
    write_csv(PathBuf::from(output_dir).join(FLOWS_CSV_FILE_NAME), &csv)
}

/// Exports the admin invoice synthesis report into `output_dir`.
pub fn export_admin_invoice_report(output_dir: String, period_label: String) -> ActionResponse {
    let now = Utc::now();
    let data =
        match with_client(|client| async move { Ok(fetch_admin_invoices(&client, now).await) }) {
            Ok(data) => data,
            Err(message) => return ActionResponse::failure(message),
        };
    let generated_at = now.fixed_offset();
    let input = InvoiceReportInput {
        invoices: &data.invoices,
        period_label: period_label.trim(),
        generated_at,
    };
    let Some(report) = build_invoice_report(&input) else {
        return ActionResponse::failure(NOTHING_TO_EXPORT);
    };
    let file_name = invoice_report_file_name(input.period_label, generated_at);
    write_csv(PathBuf::from(output_dir).join(file_name), &report)
}

/// Records the provider invoice summary page for `invoice_id`.
///
/// `logo_png` is the brand logo; absent or undecodable bytes use the text fallback.
pub fn provider_invoice_pdf(invoice_id: String, logo_png: Option<Vec<u8>>) -> PdfDocumentResponse {
    let invoices = match with_client(|client| async move {
        fetch_provider_invoices(&client)
            .await
            .map_err(|err| err.to_string())
    }) {
        Ok(invoices) => invoices,
        Err(message) => return PdfDocumentResponse::failure(message),
    };
    let Some(invoice) = invoices.iter().find(|invoice| invoice.id == invoice_id) else {
        return PdfDocumentResponse::failure(format!("Facture {invoice_id} introuvable."));
    };

    let mut canvas = RecordingCanvas::new();
    draw_provider_invoice(
        &mut canvas,
        &ProviderInvoicePdf::from(invoice),
        logo_png.as_deref(),
    );
    recorded(canvas, provider_invoice_file_name(&invoice.id))
}

/// Records the merchant contract page for one contract document.
///
/// An empty `document_id` selects the first document of the current contract.
pub fn merchant_contract_pdf(
    document_id: String,
    logo_png: Option<Vec<u8>>,
) -> PdfDocumentResponse {
    let contract = match with_client(|client| async move {
        fetch_merchant_contract(&client)
            .await
            .map_err(|err| err.to_string())
    }) {
        Ok(Some(contract)) => contract,
        Ok(None) => return PdfDocumentResponse::failure("Aucun contrat disponible."),
        Err(message) => return PdfDocumentResponse::failure(message),
    };
    let wanted = document_id.trim();
    let document = contract
        .documents
        .iter()
        .find(|document| wanted.is_empty() || document.id == wanted);
    let Some(document) = document else {
        return PdfDocumentResponse::failure(format!("Document {wanted} introuvable."));
    };

    let mut canvas = RecordingCanvas::new();
    draw_merchant_contract(&mut canvas, &contract, document, logo_png.as_deref());
    recorded(canvas, merchant_contract_file_name(&contract.id, &document.label))
}

/// Records the back-office invoice page for `invoice_id`.
pub fn admin_invoice_pdf(invoice_id: String, logo_png: Option<Vec<u8>>) -> PdfDocumentResponse {
    let now = Utc::now();
    let data =
        match with_client(|client| async move { Ok(fetch_admin_invoices(&client, now).await) }) {
            Ok(data) => data,
            Err(message) => return PdfDocumentResponse::failure(message),
        };
    let wanted = invoice_id.trim();
    let Some(row) = data.invoices.iter().find(|row| row.id == wanted) else {
        return PdfDocumentResponse::failure(format!("Facture {wanted} introuvable."));
    };

    let mut canvas = RecordingCanvas::new();
    draw_admin_invoice(&mut canvas, row, logo_png.as_deref());
    recorded(canvas, admin_invoice_file_name(&row.id))
}

/// Records the client receipt of one payment, addressed to `cardholder`.
pub fn client_payment_invoice_pdf(payment_id: String, cardholder: String) -> PdfDocumentResponse {
    let detail = match with_client(|client| async move {
        fetch_client_payment_detail(&client, payment_id.trim())
            .await
            .map_err(|err| err.to_string())
    }) {
        Ok(Some(detail)) => detail,
        Ok(None) => return PdfDocumentResponse::failure("Paiement introuvable."),
        Err(message) => return PdfDocumentResponse::failure(message),
    };

    let invoice = PaymentInvoicePdf::from_detail(&detail, cardholder.trim());
    let mut canvas = RecordingCanvas::new();
    draw_payment_invoice(&mut canvas, &invoice);
    recorded(canvas, payment_invoice_file_name(&invoice.delivery_id))
}

fn recorded(canvas: RecordingCanvas, file_name: String) -> PdfDocumentResponse {
    match serde_json::to_string(canvas.ops()) {
        Ok(ops_json) => PdfDocumentResponse {
            ok: true,
            file_name,
            ops_json,
            message: String::new(),
        },
        Err(err) => PdfDocumentResponse::failure(format!("pdf encoding failed: {err}")),
    }
}

fn write_csv(path: PathBuf, content: &str) -> ActionResponse {
    match write_export(&path, content.as_bytes()) {
        Ok(path) => ActionResponse::success("Export terminé.", path.display().to_string()),
        Err(err) => ActionResponse::failure(format!("export failed: {err}")),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn with_feed(action: impl FnOnce(&mut NotificationFeed)) -> FeedSnapshot {
    let mut guard = lock(&FEED);
    match guard.as_mut() {
        Some(feed) => {
            action(feed);
            FeedSnapshot::of(feed)
        }
        None => FeedSnapshot::failure(FEED_NOT_LOADED),
    }
}

fn app_config() -> Result<&'static AppConfig, String> {
    if let Some(config) = APP_CONFIG.get() {
        return Ok(config);
    }
    let config = AppConfig::from_env().map_err(|err| format!("configuration invalid: {err}"))?;
    Ok(APP_CONFIG.get_or_init(|| config))
}

fn runtime() -> Result<&'static Runtime, String> {
    if let Some(runtime) = RUNTIME.get() {
        return Ok(runtime);
    }
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("async runtime unavailable: {err}"))?;
    Ok(RUNTIME.get_or_init(|| runtime))
}

/// Builds a client with the current token and drives `task` to completion.
fn with_client<F, Fut, R>(task: F) -> Result<R, String>
where
    F: FnOnce(ApiClient<ReqwestTransport>) -> Fut,
    Fut: Future<Output = Result<R, String>>,
{
    let config = app_config()?;
    let mut transport =
        ReqwestTransport::new(&config.api).map_err(|err| format!("api client invalid: {err}"))?;
    if let Some(token) = lock(&ACCESS_TOKEN).clone() {
        transport = transport.with_bearer_token(token);
    }
    let client = ApiClient::new(transport);
    let result = runtime()?.block_on(task(client));
    if let Err(message) = &result {
        warn!("event=ffi_call module=ffi status=error error={}", message);
    }
    result
}

fn to_feed_item_view(item: &NotificationFeedItem) -> FeedItemView {
    FeedItemView {
        id: item.id.clone(),
        title: item.title.clone(),
        message: item.message.clone(),
        timestamp: item.timestamp.clone(),
        source: item.source.clone(),
        category: item.category.clone(),
        severity: item.severity.map(|severity| severity.as_str().to_string()),
        icon: item.icon.clone(),
    }
}
