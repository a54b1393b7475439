//! Semicolon-delimited CSV exports.
//!
//! # Invariants
//! - Cells containing `"`, `;` or a newline are quoted; inner quotes are doubled.
//! - Lines are joined with `\n`, without a trailing newline.
//! - Builders return `None` for an empty source list.

use crate::features::admin::flows::AdminFlowRow;
use crate::features::admin::invoices::{AdminInvoiceRow, InvoiceEntity};
use crate::model::view::AdminStatus;
use crate::normalize::format::{format_currency, format_generated_at, format_percent};
use crate::normalize::sanitize_key;
use chrono::{DateTime, FixedOffset, Utc};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;

pub const FLOWS_CSV_FILE_NAME: &str = "export-annonces-livraisons.csv";

const DELIMITER: &str = ";";

static FILE_NAME_UNSAFE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_-]+").expect("valid file name regex"));
static DASH_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").expect("valid dash regex"));

/// Quotes a cell when it contains a delimiter, a quote or a newline.
pub fn format_cell(value: &str) -> String {
    let escaped = value.replace('"', "\"\"");
    if escaped.contains(['"', ';', '\n']) {
        format!("\"{escaped}\"")
    } else {
        escaped
    }
}

/// Header labels plus data rows, rendered as one UTF-8 text blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvDocument {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvDocument {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|header| header.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        lines.push(self.headers.join(DELIMITER));
        lines.extend(self.rows.iter().map(|row| {
            row.iter()
                .map(|cell| format_cell(cell))
                .collect::<Vec<_>>()
                .join(DELIMITER)
        }));
        lines.join("\n")
    }
}

const FLOW_HEADERS: [&str; 9] = [
    "Identifiant",
    "Type",
    "Titre",
    "Commerçant",
    "Zone",
    "Fenêtre",
    "Statut",
    "Volume",
    "Livreurs",
];

/// Admin announcements/deliveries table export.
pub fn export_flows_csv(rows: &[AdminFlowRow]) -> Option<String> {
    if rows.is_empty() {
        return None;
    }
    let mut document = CsvDocument::new(&FLOW_HEADERS);
    for row in rows {
        document.push_row([
            row.id.clone(),
            row.kind.label().to_string(),
            row.title.clone(),
            row.merchant.clone(),
            row.zone.clone(),
            row.window.clone(),
            row.status.label().to_string(),
            row.volume.clone(),
            row.couriers.to_string(),
        ]);
    }
    info!(
        "event=export_flows_csv module=export status=ok rows={}",
        rows.len()
    );
    Some(document.render())
}

/// Invoice rows plus the period they cover.
#[derive(Debug, Clone, Copy)]
pub struct InvoiceReportInput<'a> {
    pub invoices: &'a [AdminInvoiceRow],
    pub period_label: &'a str,
    pub generated_at: DateTime<FixedOffset>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Bucket {
    count: usize,
    amount: f64,
}

impl Bucket {
    fn add(&mut self, amount: f64) {
        self.count += 1;
        self.amount += amount;
    }
}

fn euros(amount: f64) -> String {
    format_currency(Some(amount), Some("EUR"))
}

fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

/// Section/Indicateur/Valeur synthesis of the invoice table.
///
/// Status details follow first-appearance order; the profile breakdown always
/// lists merchants then couriers.
pub fn build_invoice_report(input: &InvoiceReportInput<'_>) -> Option<String> {
    let invoices = input.invoices;
    if invoices.is_empty() {
        return None;
    }

    let mut by_status: Vec<(AdminStatus, Bucket)> = Vec::new();
    let mut merchants = Bucket::default();
    let mut couriers = Bucket::default();
    let mut total_amount = 0.0;
    for invoice in invoices {
        let amount = if invoice.amount_value.is_finite() {
            invoice.amount_value
        } else {
            0.0
        };
        total_amount += amount;
        match by_status.iter_mut().find(|(status, _)| *status == invoice.status) {
            Some((_, bucket)) => bucket.add(amount),
            None => {
                let mut bucket = Bucket::default();
                bucket.add(amount);
                by_status.push((invoice.status, bucket));
            }
        }
        match invoice.entity {
            InvoiceEntity::Merchant => merchants.add(amount),
            InvoiceEntity::Courier => couriers.add(amount),
        }
    }

    let bucket_of = |status: AdminStatus| {
        by_status
            .iter()
            .find(|(candidate, _)| *candidate == status)
            .map(|(_, bucket)| *bucket)
            .unwrap_or_default()
    };
    let total = invoices.len();
    let paid = bucket_of(AdminStatus::Paid);
    let due = bucket_of(AdminStatus::Due);
    let overdue = bucket_of(AdminStatus::Overdue);

    let mut document = CsvDocument::new(&["Section", "Indicateur", "Valeur"]);
    document.push_row(["Periode", "Periode analysee", input.period_label]);
    document.push_row([
        "Periode".to_string(),
        "Generation".to_string(),
        format_generated_at(&input.generated_at),
    ]);
    document.push_row([
        "Periode".to_string(),
        "Factures prises en compte".to_string(),
        total.to_string(),
    ]);

    document.push_row([
        "Volume".to_string(),
        "Factures payees".to_string(),
        paid.count.to_string(),
    ]);
    document.push_row([
        "Volume".to_string(),
        "Factures a regler".to_string(),
        due.count.to_string(),
    ]);
    document.push_row([
        "Volume".to_string(),
        "Factures en retard".to_string(),
        overdue.count.to_string(),
    ]);

    document.push_row(["Montants".to_string(), "Montant total".to_string(), euros(total_amount)]);
    document.push_row(["Montants".to_string(), "Montant paye".to_string(), euros(paid.amount)]);
    document.push_row([
        "Montants".to_string(),
        "Montant en attente".to_string(),
        euros(due.amount),
    ]);
    document.push_row([
        "Montants".to_string(),
        "Montant en retard".to_string(),
        euros(overdue.amount),
    ]);
    document.push_row([
        "Montants".to_string(),
        "Montant moyen facture".to_string(),
        euros(total_amount / total as f64),
    ]);

    document.push_row([
        "Performance".to_string(),
        "Taux de paiement".to_string(),
        format_percent(ratio(paid.count, total)),
    ]);
    document.push_row([
        "Performance".to_string(),
        "Taux d echeance depassee".to_string(),
        format_percent(ratio(overdue.count, total)),
    ]);

    document.push_row([
        "Litiges".to_string(),
        "Litiges en cours".to_string(),
        overdue.count.to_string(),
    ]);

    for (status, bucket) in &by_status {
        document.push_row([
            "Details statut".to_string(),
            format!("Volume {}", status.label()),
            bucket.count.to_string(),
        ]);
        document.push_row([
            "Details statut".to_string(),
            format!("Montant {}", status.label()),
            euros(bucket.amount),
        ]);
    }

    for (label, bucket) in [("Commercants", merchants), ("Livreurs", couriers)] {
        document.push_row([
            "Ventilation profils".to_string(),
            format!("{label} - volume"),
            bucket.count.to_string(),
        ]);
        document.push_row([
            "Ventilation profils".to_string(),
            format!("{label} - montant"),
            euros(bucket.amount),
        ]);
    }

    info!(
        "event=export_invoice_report module=export status=ok invoices={} statuses={}",
        total,
        by_status.len()
    );
    Some(document.render())
}

/// Accent-free, dash-separated lowercase slug usable in a file name.
pub fn file_name_slug(value: &str) -> String {
    let plain = sanitize_key(Some(value));
    let replaced = FILE_NAME_UNSAFE_RE.replace_all(&plain, "-");
    DASH_RUN_RE
        .replace_all(&replaced, "-")
        .trim_matches('-')
        .to_string()
}

/// `rapport-factures-<slug>-<YYYY-MM-DD>.csv`; the slug part is dropped when blank.
pub fn invoice_report_file_name(period_label: &str, generated_at: DateTime<FixedOffset>) -> String {
    let stamp = generated_at.with_timezone(&Utc).format("%Y-%m-%d");
    let slug = file_name_slug(period_label);
    if slug.is_empty() {
        format!("rapport-factures-{stamp}.csv")
    } else {
        format!("rapport-factures-{slug}-{stamp}.csv")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::admin::flows::FlowType;
    use crate::normalize::format::parse_timestamp;

    fn invoice(
        id: &str,
        entity: InvoiceEntity,
        amount: f64,
        status: AdminStatus,
    ) -> AdminInvoiceRow {
        AdminInvoiceRow {
            id: id.to_string(),
            entity,
            counterpart: "Maison Verte".to_string(),
            period: "Décembre 2025".to_string(),
            amount: euros(amount),
            amount_value: amount,
            currency: Some("EUR".to_string()),
            status,
            issued_at: "01 déc. 2025".to_string(),
            due_at: "15 déc. 2025".to_string(),
            overdue_days: 0,
        }
    }

    fn generated_at() -> DateTime<FixedOffset> {
        parse_timestamp("2025-12-09T14:05:00+01:00").expect("stamp")
    }

    #[test]
    fn cells_are_quoted_only_when_needed() {
        assert_eq!(format_cell("plain"), "plain");
        assert_eq!(format_cell("a;b"), "\"a;b\"");
        assert_eq!(format_cell("line\nbreak"), "\"line\nbreak\"");
        assert_eq!(format_cell("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn flows_export_uses_labels() {
        let row = AdminFlowRow {
            id: "ANN-1".to_string(),
            kind: FlowType::Announcement,
            title: "Tournée; express".to_string(),
            merchant: "Maison Verte".to_string(),
            zone: "Paris".to_string(),
            window: "—".to_string(),
            status: AdminStatus::Scheduled,
            volume: "12 colis".to_string(),
            couriers: 2,
        };
        let csv = export_flows_csv(&[row]).expect("one row");
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "Identifiant;Type;Titre;Commerçant;Zone;Fenêtre;Statut;Volume;Livreurs"
        );
        assert_eq!(
            lines[1],
            "ANN-1;Annonce;\"Tournée; express\";Maison Verte;Paris;—;Planifiée;12 colis;2"
        );
        assert!(export_flows_csv(&[]).is_none());
    }

    #[test]
    fn invoice_report_aggregates_by_status_and_profile() {
        let invoices = vec![
            invoice("F-1", InvoiceEntity::Merchant, 100.0, AdminStatus::Overdue),
            invoice("F-2", InvoiceEntity::Courier, 50.0, AdminStatus::Paid),
            invoice("F-3", InvoiceEntity::Merchant, 150.0, AdminStatus::Paid),
        ];
        let input = InvoiceReportInput {
            invoices: &invoices,
            period_label: "Décembre 2025",
            generated_at: generated_at(),
        };
        let csv = build_invoice_report(&input).expect("report");
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "Section;Indicateur;Valeur");
        assert_eq!(lines[1], "Periode;Periode analysee;Décembre 2025");
        assert_eq!(lines[2], "Periode;Generation;9 déc. 2025, 14:05");
        assert!(lines.contains(&"Volume;Factures payees;2"));
        assert!(lines.contains(&"Montants;Montant total;300,00\u{a0}€"));
        assert!(lines.contains(&"Montants;Montant moyen facture;100,00\u{a0}€"));
        assert!(lines.contains(&"Performance;Taux de paiement;66,67\u{202f}%"));
        assert!(lines.contains(&"Litiges;Litiges en cours;1"));

        let overdue = lines
            .iter()
            .position(|line| *line == "Details statut;Volume En retard;1")
            .expect("overdue detail");
        let paid = lines
            .iter()
            .position(|line| *line == "Details statut;Volume Payée;2")
            .expect("paid detail");
        assert!(overdue < paid);
        assert_eq!(
            lines[lines.len() - 2..],
            [
                "Ventilation profils;Livreurs - volume;1",
                "Ventilation profils;Livreurs - montant;50,00\u{a0}€"
            ]
        );
    }

    #[test]
    fn empty_invoice_report_is_none() {
        let input = InvoiceReportInput {
            invoices: &[],
            period_label: "Décembre 2025",
            generated_at: generated_at(),
        };
        assert!(build_invoice_report(&input).is_none());
    }

    #[test]
    fn report_file_name_slugifies_period() {
        assert_eq!(
            invoice_report_file_name("Décembre 2025 / Île-de-France", generated_at()),
            "rapport-factures-decembre-2025-ile-de-france-2025-12-09.csv"
        );
        assert_eq!(
            invoice_report_file_name("  ", generated_at()),
            "rapport-factures-2025-12-09.csv"
        );
    }
}
