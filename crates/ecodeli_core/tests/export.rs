use chrono::{DateTime, TimeZone, Utc};
use ecodeli_core::export::csv::{
    build_invoice_report, export_flows_csv, invoice_report_file_name, InvoiceReportInput,
    FLOWS_CSV_FILE_NAME,
};
use ecodeli_core::export::pdf::{
    draw_merchant_contract, merchant_contract_file_name, RecordingCanvas,
};
use ecodeli_core::features::admin::flows::{
    build_admin_flows, AdminAnnouncementDto, AdminDeliveryDto,
};
use ecodeli_core::features::admin::invoices::{build_admin_invoices, AdminInvoiceDto};
use ecodeli_core::features::merchant::{map_contract, select_current_contract, MerchantContractDto};
use ecodeli_core::{write_export, Page};
use serde_json::json;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 12, 9, 12, 0, 0).unwrap()
}

#[test]
fn flows_csv_is_written_under_a_fresh_directory() {
    let announcements: Page<AdminAnnouncementDto> = serde_json::from_value(json!({
        "content": [{ "id": 1, "title": "Tournée \"Noël\"", "status": "ACTIVE" }]
    }))
    .unwrap();
    let deliveries: Page<AdminDeliveryDto> = serde_json::from_value(json!({
        "content": [{ "id": 2, "status": "IN_TRANSIT" }]
    }))
    .unwrap();
    let data = build_admin_flows(Some(announcements), Some(deliveries));
    let csv = export_flows_csv(&data.flow_rows).unwrap();
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.contains("\"Tournée \"\"Noël\"\"\""));

    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("exports").join(FLOWS_CSV_FILE_NAME);
    let written = write_export(&target, csv.as_bytes()).unwrap();
    assert_eq!(written, target);
    assert_eq!(std::fs::read_to_string(&target).unwrap(), csv);
}

#[test]
fn invoice_report_round_trip_to_disk() {
    let invoices: Page<AdminInvoiceDto> = serde_json::from_value(json!({
        "content": [
            { "id": 1, "amount": 120.0, "status": "PAID", "entityType": "MERCHANT" },
            { "id": 2, "amount": 80.0, "status": "DUE", "entityType": "COURIER" }
        ]
    }))
    .unwrap();
    let data = build_admin_invoices(Some(invoices), None, now());
    let generated_at = now().fixed_offset();
    let input = InvoiceReportInput {
        invoices: &data.invoices,
        period_label: "Décembre 2025",
        generated_at,
    };
    let report = build_invoice_report(&input).unwrap();
    assert!(report.starts_with("Section;Indicateur;Valeur\n"));
    assert!(report.contains("Volume;Factures a regler;1"));

    let dir = tempfile::tempdir().unwrap();
    let name = invoice_report_file_name(input.period_label, generated_at);
    assert_eq!(name, "rapport-factures-decembre-2025-2025-12-09.csv");
    let path = write_export(dir.path().join(&name), report.as_bytes()).unwrap();
    assert!(path.exists());
}

#[test]
fn overwriting_an_export_replaces_its_content() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("report.csv");
    write_export(&target, b"first").unwrap();
    write_export(&target, b"second").unwrap();
    assert_eq!(std::fs::read(&target).unwrap(), b"second");
}

#[test]
fn contract_pdf_ops_serialize_for_the_shell() {
    let contracts: Vec<MerchantContractDto> = serde_json::from_value(json!([
        { "id": 12, "status": "ACTIVE", "companyName": "Maison Verte",
          "updatedAt": "2025-12-01T09:00:00Z",
          "documents": [{ "id": "D-1", "label": "Annexe tarifaire 2025", "type": "ANNEX" }] }
    ]))
    .unwrap();
    let contract = map_contract(select_current_contract(&contracts).unwrap());
    let document = &contract.documents[0];

    let mut canvas = RecordingCanvas::new();
    draw_merchant_contract(&mut canvas, &contract, document, None);
    let texts = canvas.texts();
    assert!(texts.contains(&"Entreprise: Maison Verte"));
    assert!(texts.contains(&"Statut: Contrat actif"));
    assert!(texts.contains(&"Annexe"));

    let ops = serde_json::to_value(canvas.ops()).unwrap();
    assert_eq!(ops[0]["op"], "font");
    assert_eq!(ops[0]["style"], "bold");
    assert_eq!(
        merchant_contract_file_name(&contract.id, &document.label),
        "contrat-12-annexe-tarifaire-2025.pdf"
    );
}
