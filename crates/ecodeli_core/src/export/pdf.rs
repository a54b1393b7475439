//! Fixed-layout PDF documents drawn against a page canvas.
//!
//! # Responsibility
//! - Describe each document as a sequence of canvas calls at absolute
//!   coordinates (millimetres, A4 portrait, origin top-left).
//! - Record those calls as [`DrawOp`] values the UI shell rasterizes.
//!
//! # Invariants
//! - Coordinates accumulate top to bottom; there is no layout engine.
//! - The only failure path is logo embedding, which falls back to text.

use crate::features::admin::invoices::{AdminInvoiceRow, InvoiceEntity};
use crate::features::client::payments::ClientPaymentDetail;
use crate::features::merchant::{ContractDocument, MerchantContract};
use crate::features::provider::{ProviderInvoice, ProviderInvoiceStatus};
use crate::normalize::format::format_amount_plain;
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const BRAND_GREEN: Rgb = Rgb(47, 127, 51);
const BLACK: Rgb = Rgb(0, 0, 0);
const SEPARATOR_GREY: Rgb = Rgb(200, 200, 200);
const SIGNATURE_GREY: Rgb = Rgb(120, 120, 120);

const LOGO_X: f32 = 20.0;
const LOGO_Y: f32 = 14.0;
const LOGO_SIZE: f32 = 24.0;
const LEFT_MARGIN: f32 = 20.0;
const RIGHT_MARGIN: f32 = 190.0;
const PAGE_CENTER: f32 = 105.0;
const INFO_LINE_SPACING: f32 = 8.0;

const DEFAULT_PROVIDER_NAME: &str = "Prestataire EcoDeli";
const DEFAULT_IBAN: &str = "FR76 XXXX XXXX XXXX XXXX XXXX XXX";

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
/// Average Helvetica glyph width, in em.
const AVERAGE_GLYPH_EM: f32 = 0.5;
const POINT_TO_MM: f32 = 25.4 / 72.0;

static LABEL_UNSAFE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid label regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FontFamily {
    Helvetica,
    Courier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    Normal,
    Bold,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Image payload the canvas could not embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanvasError {
    UnsupportedImage { bytes: usize },
}

impl Display for CanvasError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedImage { bytes } => {
                write!(f, "unsupported image payload ({bytes} bytes, PNG expected)")
            }
        }
    }
}

impl Error for CanvasError {}

/// Imperative page drawing surface.
pub trait PageCanvas {
    fn set_font(&mut self, family: FontFamily, style: FontStyle);
    fn set_font_size(&mut self, size: f32);
    fn set_text_color(&mut self, color: Rgb);
    fn set_draw_color(&mut self, color: Rgb);
    fn text(&mut self, x: f32, y: f32, text: &str, align: Align);
    fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32);
    fn image(&mut self, png: &[u8], x: f32, y: f32, width: f32, height: f32)
        -> Result<(), CanvasError>;
}

/// One recorded canvas call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    Font { family: FontFamily, style: FontStyle },
    FontSize { size: f32 },
    TextColor { color: Rgb },
    DrawColor { color: Rgb },
    Text { x: f32, y: f32, text: String, align: Align },
    Line { x1: f32, y1: f32, x2: f32, y2: f32 },
    Image { x: f32, y: f32, width: f32, height: f32, bytes: usize },
}

/// Canvas that keeps every call for later rasterization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordingCanvas {
    ops: Vec<DrawOp>,
    font_size: f32,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            font_size: 16.0,
        }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<DrawOp> {
        self.ops
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    /// Text runs in drawing order.
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Default for RecordingCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl PageCanvas for RecordingCanvas {
    fn set_font(&mut self, family: FontFamily, style: FontStyle) {
        self.ops.push(DrawOp::Font { family, style });
    }

    fn set_font_size(&mut self, size: f32) {
        self.font_size = size;
        self.ops.push(DrawOp::FontSize { size });
    }

    fn set_text_color(&mut self, color: Rgb) {
        self.ops.push(DrawOp::TextColor { color });
    }

    fn set_draw_color(&mut self, color: Rgb) {
        self.ops.push(DrawOp::DrawColor { color });
    }

    fn text(&mut self, x: f32, y: f32, text: &str, align: Align) {
        self.ops.push(DrawOp::Text {
            x,
            y,
            text: text.to_string(),
            align,
        });
    }

    fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.ops.push(DrawOp::Line { x1, y1, x2, y2 });
    }

    fn image(
        &mut self,
        png: &[u8],
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Result<(), CanvasError> {
        if !png.starts_with(&PNG_SIGNATURE) {
            return Err(CanvasError::UnsupportedImage { bytes: png.len() });
        }
        self.ops.push(DrawOp::Image {
            x,
            y,
            width,
            height,
            bytes: png.len(),
        });
        Ok(())
    }
}

/// Draws the logo (or the brand text fallback) and returns its bottom edge.
fn draw_logo(canvas: &mut dyn PageCanvas, logo: Option<&[u8]>) -> f32 {
    let embedded = match logo {
        Some(png) => match canvas.image(png, LOGO_X, LOGO_Y, LOGO_SIZE, LOGO_SIZE) {
            Ok(()) => true,
            Err(err) => {
                warn!("event=pdf_logo module=export status=fallback error={}", err);
                false
            }
        },
        None => false,
    };
    if !embedded {
        canvas.set_font(FontFamily::Helvetica, FontStyle::Bold);
        canvas.set_text_color(BRAND_GREEN);
        canvas.text(LOGO_X, LOGO_Y + LOGO_SIZE - 6.0, "EcoDeli", Align::Left);
    }
    canvas.set_text_color(BLACK);
    canvas.set_font(FontFamily::Helvetica, FontStyle::Normal);
    LOGO_Y + LOGO_SIZE
}

/// Greedy word wrap estimated from the average glyph width at `font_size`.
pub fn wrap_text(text: &str, max_width: f32, font_size: f32) -> Vec<String> {
    let glyph_width = font_size * POINT_TO_MM * AVERAGE_GLYPH_EM;
    let max_chars = ((max_width / glyph_width).floor() as usize).max(1);

    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate_len = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if candidate_len > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Provider invoice summary fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderInvoicePdf {
    pub id: String,
    pub provider_name: Option<String>,
    pub period: String,
    pub issued_at: String,
    pub status_label: String,
    pub amount: f64,
    pub iban: Option<String>,
    pub payout_reference: Option<String>,
}

impl From<&ProviderInvoice> for ProviderInvoicePdf {
    fn from(invoice: &ProviderInvoice) -> Self {
        Self {
            id: invoice.id.clone(),
            provider_name: None,
            period: invoice.period.clone(),
            issued_at: invoice.issued_at.clone(),
            status_label: invoice.status.label().to_string(),
            amount: invoice.amount,
            iban: None,
            payout_reference: (invoice.status == ProviderInvoiceStatus::Paid)
                .then(|| format!("VIR-{}", invoice.id)),
        }
    }
}

pub fn draw_provider_invoice(
    canvas: &mut dyn PageCanvas,
    invoice: &ProviderInvoicePdf,
    logo: Option<&[u8]>,
) {
    let logo_bottom = draw_logo(canvas, logo);
    canvas.set_font_size(18.0);
    let title_y = logo_bottom - 4.0;
    canvas.text(PAGE_CENTER, title_y, "Recapitulatif de facturation", Align::Center);

    canvas.set_font_size(12.0);
    let info_y = title_y.max(logo_bottom) + 12.0;
    let provider = invoice.provider_name.as_deref().unwrap_or(DEFAULT_PROVIDER_NAME);
    let info = [
        format!("Facture #{}", invoice.id),
        format!("Prestataire: {provider}"),
        format!("Periode: {}", invoice.period),
        format!("Emise le: {}", invoice.issued_at),
    ];
    for (index, line) in info.iter().enumerate() {
        canvas.text(LEFT_MARGIN, info_y + index as f32 * INFO_LINE_SPACING, line, Align::Left);
    }

    canvas.set_draw_color(SEPARATOR_GREY);
    let separator_y = info_y + 30.0;
    canvas.line(LEFT_MARGIN, separator_y, RIGHT_MARGIN, separator_y);

    canvas.set_font(FontFamily::Helvetica, FontStyle::Bold);
    canvas.text(LEFT_MARGIN, separator_y + 12.0, "Details financiers", Align::Left);
    canvas.set_font(FontFamily::Helvetica, FontStyle::Normal);

    let mut rows = vec![
        ("Statut de la facture", invoice.status_label.clone()),
        ("Montant total", format_amount_plain(invoice.amount)),
        (
            "IBAN de versement",
            invoice.iban.clone().unwrap_or_else(|| DEFAULT_IBAN.to_string()),
        ),
    ];
    if let Some(reference) = invoice.payout_reference.as_ref().filter(|r| !r.trim().is_empty()) {
        rows.push(("Reference virement", reference.clone()));
    }

    let mut y = separator_y + 24.0;
    for (label, value) in &rows {
        canvas.text(LEFT_MARGIN, y, label, Align::Left);
        canvas.text(RIGHT_MARGIN, y, value, Align::Right);
        y += INFO_LINE_SPACING;
    }

    canvas.set_font_size(10.0);
    canvas.set_font(FontFamily::Helvetica, FontStyle::Italic);
    canvas.text(
        LEFT_MARGIN,
        y + 6.0,
        "Ce document est genere automatiquement. Conservez-le pour vos archives comptables.",
        Align::Left,
    );
    info!(
        "event=pdf_provider_invoice module=export status=ok rows={}",
        rows.len()
    );
}

pub fn provider_invoice_file_name(invoice_id: &str) -> String {
    format!("facture-prestataire-{invoice_id}.pdf")
}

const DETAIL_LABEL_X: f32 = 20.0;
const DETAIL_VALUE_X: f32 = 60.0;
const DETAIL_VALUE_WIDTH: f32 = 150.0;
const DETAIL_LINE_SPACING: f32 = 6.0;

pub fn draw_merchant_contract(
    canvas: &mut dyn PageCanvas,
    contract: &MerchantContract,
    document: &ContractDocument,
    logo: Option<&[u8]>,
) {
    let logo_bottom = draw_logo(canvas, logo);
    canvas.set_font_size(18.0);
    let title_y = logo_bottom - 4.0;
    canvas.text(
        PAGE_CENTER,
        title_y,
        "Contrat EcoDeli - Espace Commerçant",
        Align::Center,
    );

    canvas.set_font_size(12.0);
    let info = [
        format!("Entreprise: {}", contract.company_name),
        format!("Identifiant contrat: {}", contract.id),
        format!("Statut: {}", contract.status_label),
        format!("Date: {}", contract.last_update),
    ];
    let mut cursor_y = title_y.max(logo_bottom) + 12.0;
    for line in &info {
        canvas.text(LEFT_MARGIN, cursor_y, line, Align::Left);
        cursor_y += INFO_LINE_SPACING;
    }

    cursor_y += 4.0;
    canvas.set_draw_color(SEPARATOR_GREY);
    canvas.line(LEFT_MARGIN, cursor_y, RIGHT_MARGIN, cursor_y);
    cursor_y += 14.0;

    canvas.set_font_size(14.0);
    canvas.set_font(FontFamily::Helvetica, FontStyle::Bold);
    canvas.text(LEFT_MARGIN, cursor_y, "Document sélectionné", Align::Left);
    canvas.set_font(FontFamily::Helvetica, FontStyle::Normal);
    canvas.set_font_size(12.0);
    cursor_y += 10.0;

    let details = [
        ("Intitulé", document.label.as_str()),
        ("Type", document.kind.label()),
        ("Dernière mise à jour", document.updated_at.as_str()),
    ];
    let mut y = cursor_y;
    for (label, value) in details {
        let lines = wrap_text(value, DETAIL_VALUE_WIDTH, 12.0);
        canvas.text(DETAIL_LABEL_X, y, &format!("{label}:"), Align::Left);
        for (index, line) in lines.iter().enumerate() {
            canvas.text(
                DETAIL_VALUE_X,
                y + index as f32 * DETAIL_LINE_SPACING,
                line,
                Align::Left,
            );
        }
        y += DETAIL_LINE_SPACING * lines.len() as f32 + 4.0;
    }

    canvas.set_font(FontFamily::Helvetica, FontStyle::Italic);
    canvas.text(
        LEFT_MARGIN,
        y + 6.0,
        "Document généré automatiquement depuis votre espace EcoDeli.",
        Align::Left,
    );

    let signature_top = y + 30.0;
    canvas.set_font(FontFamily::Helvetica, FontStyle::Bold);
    canvas.text(LEFT_MARGIN, signature_top, "Signature commerçant", Align::Left);
    canvas.set_draw_color(SIGNATURE_GREY);
    canvas.line(LEFT_MARGIN, signature_top + 18.0, 90.0, signature_top + 18.0);
    canvas.set_font(FontFamily::Courier, FontStyle::Italic);
    canvas.set_font_size(14.0);
    canvas.text(22.0, signature_top + 14.0, "J. Exemple", Align::Left);
    canvas.set_font(FontFamily::Helvetica, FontStyle::Normal);
    canvas.set_font_size(12.0);

    info!(
        "event=pdf_merchant_contract module=export status=ok documents={}",
        contract.documents.len()
    );
}

/// `contrat-<id>-<label>.pdf` with non-alphanumeric runs of the label dashed.
pub fn merchant_contract_file_name(contract_id: &str, document_label: &str) -> String {
    let label = LABEL_UNSAFE_RE.replace_all(&document_label.to_lowercase(), "-").into_owned();
    format!("contrat-{contract_id}-{label}.pdf")
}

const ADMIN_HEADER_MIN_TOP: f32 = 28.0;
const ADMIN_VALUE_X: f32 = 120.0;

/// Back-office invoice: header, five detail rows and an ERP reminder.
pub fn draw_admin_invoice(
    canvas: &mut dyn PageCanvas,
    row: &AdminInvoiceRow,
    logo: Option<&[u8]>,
) {
    let logo_bottom = draw_logo(canvas, logo);
    let header_top = (logo_bottom + 6.0).max(ADMIN_HEADER_MIN_TOP);
    canvas.set_font_size(18.0);
    canvas.set_font(FontFamily::Helvetica, FontStyle::Bold);
    canvas.text(PAGE_CENTER, header_top, "EcoDeli - Facture", Align::Center);

    canvas.set_font_size(12.0);
    canvas.set_font(FontFamily::Helvetica, FontStyle::Normal);
    let category = match row.entity {
        InvoiceEntity::Merchant => "Commercant",
        InvoiceEntity::Courier => "Livreur",
    };
    let info = [
        format!("Reference: {}", row.id),
        format!("Periode: {}", row.period),
        format!("Categorie: {category}"),
    ];
    let mut y = header_top + 12.0;
    for line in &info {
        canvas.text(LEFT_MARGIN, y, line, Align::Left);
        y += INFO_LINE_SPACING;
    }

    let separator_y = y + 6.0;
    canvas.set_draw_color(SEPARATOR_GREY);
    canvas.line(LEFT_MARGIN, separator_y, RIGHT_MARGIN, separator_y);

    let title_y = separator_y + 10.0;
    canvas.set_font(FontFamily::Helvetica, FontStyle::Bold);
    canvas.text(LEFT_MARGIN, title_y, "Details de la facture", Align::Left);
    canvas.set_font(FontFamily::Helvetica, FontStyle::Normal);

    let rows = [
        ("Destinataire", row.counterpart.as_str()),
        ("Montant total", row.amount.as_str()),
        ("Statut", row.status.label()),
        ("Emise le", row.issued_at.as_str()),
        ("Echeance le", row.due_at.as_str()),
    ];
    let mut y = title_y + 10.0;
    for (label, value) in rows {
        canvas.text(LEFT_MARGIN, y, label, Align::Left);
        canvas.text(ADMIN_VALUE_X, y, value, Align::Left);
        y += INFO_LINE_SPACING;
    }

    canvas.set_font_size(10.0);
    canvas.set_font(FontFamily::Helvetica, FontStyle::Italic);
    canvas.text(
        LEFT_MARGIN,
        y + 12.0,
        "Document genere automatiquement - Merci de verifier dans l'ERP avant envoi.",
        Align::Left,
    );
    info!(
        "event=pdf_admin_invoice module=export status=ok id={} entity={}",
        row.id,
        row.entity.as_str()
    );
}

pub fn admin_invoice_file_name(invoice_id: &str) -> String {
    format!("facture-{invoice_id}.pdf")
}

/// Client receipt for one paid delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentInvoicePdf {
    pub delivery_id: String,
    pub delivery_title: String,
    pub amount: f64,
    pub service_fee: f64,
    pub total: f64,
    pub transaction_id: String,
    pub payment_date: String,
    pub cardholder: String,
}

impl PaymentInvoicePdf {
    /// Dated with the payment time, or the due date while unpaid.
    pub fn from_detail(detail: &ClientPaymentDetail, cardholder: &str) -> Self {
        Self {
            delivery_id: detail.delivery_id.clone(),
            delivery_title: detail.payment.delivery_title.clone(),
            amount: detail.payment.amount,
            service_fee: detail.service_fee,
            total: detail.total,
            transaction_id: detail.transaction_id.clone(),
            payment_date: detail
                .paid_at
                .clone()
                .unwrap_or_else(|| detail.payment.due_date.clone()),
            cardholder: cardholder.to_string(),
        }
    }
}

const PAYMENT_ROWS_TOP: f32 = 76.0;
const PAYMENT_VALUE_WIDTH: f32 = 120.0;

pub fn draw_payment_invoice(canvas: &mut dyn PageCanvas, invoice: &PaymentInvoicePdf) {
    canvas.set_font_size(18.0);
    canvas.text(PAGE_CENTER, 20.0, "Facture EcoDeli", Align::Center);

    canvas.set_font_size(12.0);
    canvas.text(LEFT_MARGIN, 32.0, &format!("Livraison #{}", invoice.delivery_id), Align::Left);
    canvas.text(
        LEFT_MARGIN,
        40.0,
        &format!("Destinataire: {}", invoice.cardholder),
        Align::Left,
    );
    canvas.text(LEFT_MARGIN, 48.0, &format!("Date: {}", invoice.payment_date), Align::Left);

    canvas.set_draw_color(SEPARATOR_GREY);
    canvas.line(LEFT_MARGIN, 54.0, RIGHT_MARGIN, 54.0);

    canvas.set_font(FontFamily::Helvetica, FontStyle::Bold);
    canvas.text(LEFT_MARGIN, 64.0, "Details du paiement", Align::Left);
    canvas.set_font(FontFamily::Helvetica, FontStyle::Normal);

    let rows = [
        ("Numéro de transaction", invoice.transaction_id.clone()),
        ("Livraison", invoice.delivery_title.clone()),
        ("Prix de la livraison", format_amount_plain(invoice.amount)),
        ("Frais de service", format_amount_plain(invoice.service_fee)),
        ("Total", format_amount_plain(invoice.total)),
    ];
    let mut y = PAYMENT_ROWS_TOP;
    for (label, value) in &rows {
        let lines = wrap_text(value, PAYMENT_VALUE_WIDTH, 12.0);
        canvas.text(LEFT_MARGIN, y, label, Align::Left);
        for (index, line) in lines.iter().enumerate() {
            canvas.text(
                RIGHT_MARGIN,
                y + index as f32 * DETAIL_LINE_SPACING,
                line,
                Align::Right,
            );
        }
        y += DETAIL_LINE_SPACING * lines.len() as f32 + 2.0;
    }

    canvas.set_font(FontFamily::Helvetica, FontStyle::Italic);
    canvas.text(LEFT_MARGIN, y + 6.0, "Merci pour votre confiance.", Align::Left);
    info!(
        "event=pdf_payment_invoice module=export status=ok delivery={}",
        invoice.delivery_id
    );
}

pub fn payment_invoice_file_name(delivery_id: &str) -> String {
    format!("facture-{delivery_id}.pdf")
}
