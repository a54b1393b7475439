//! Operator CLI for the EcoDeli core.
//!
//! # Responsibility
//! - Keep the `ping` probe to verify `ecodeli_core` linkage without Flutter/FFI.
//! - Run role loaders and admin exports against a live API from a terminal.
//! - Keep output line-oriented and deterministic for scripting.

use chrono::Utc;
use clap::{Parser, Subcommand};
use ecodeli_core::export::csv::{
    build_invoice_report, export_flows_csv, invoice_report_file_name, InvoiceReportInput,
    FLOWS_CSV_FILE_NAME,
};
use ecodeli_core::features::admin::flows::fetch_admin_flows;
use ecodeli_core::features::admin::invoices::fetch_admin_invoices;
use ecodeli_core::features::courier::advance_courier_delivery;
use ecodeli_core::{
    default_log_level, fetch_notification_feed, init_logging, write_export, ApiClient, AppConfig,
    NotificationFeed, NotificationRole, ReqwestTransport, Visibility,
};
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "ecodeli")]
#[command(about = "EcoDeli core probe and admin tooling")]
#[command(version)]
struct Cli {
    /// Bearer token sent with API requests.
    #[arg(long, global = true)]
    token: Option<String>,

    /// Directory for rolling log files; logging stays off when omitted.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Print core linkage info.
    Ping,
    /// Print the notification feed of a role.
    Notifications {
        #[arg(long)]
        role: String,
        #[arg(long, default_value = "all")]
        filter: String,
        /// Only unread items.
        #[arg(long)]
        unread: bool,
        #[arg(long)]
        search: Option<String>,
    },
    /// Move a courier mission to its next status.
    Advance { delivery_id: String },
    /// Write admin CSV exports.
    #[command(subcommand)]
    Export(ExportCommand),
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum ExportCommand {
    /// Announcements and deliveries table.
    Flows {
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Invoice synthesis report.
    Invoices {
        #[arg(long, default_value = ".")]
        out: PathBuf,
        #[arg(long, default_value = "")]
        period: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        if let Err(err) = init_logging(level, &log_dir.to_string_lossy()) {
            eprintln!("logging disabled: {err}");
        }
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli_command module=cli status=error error={}", message);
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    if cli.command == Command::Ping {
        println!("ecodeli_core ping={}", ecodeli_core::ping());
        println!("ecodeli_core version={}", ecodeli_core::core_version());
        return Ok(());
    }

    let client = build_client(cli.token)?;
    match cli.command {
        Command::Ping => Ok(()),
        Command::Notifications {
            role,
            filter,
            unread,
            search,
        } => {
            let role = NotificationRole::parse(&role)
                .ok_or_else(|| format!("unknown role `{role}`"))?;
            let items = fetch_notification_feed(&client, role, Utc::now())
                .await
                .map_err(|err| err.to_string())?;
            let visibility = if unread {
                Visibility::Unread
            } else {
                Visibility::All
            };
            let mut feed =
                NotificationFeed::new(items, filter.as_str()).with_visibility(visibility);
            if let Some(search) = search {
                feed.set_search_term(search);
            }
            for item in feed.filtered_items() {
                let severity = item.severity.map_or("read", |severity| severity.as_str());
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    item.id,
                    severity,
                    item.timestamp,
                    item.title,
                    item.message
                );
            }
            println!("unread={} total={}", feed.unread_count(), feed.total_count());
            Ok(())
        }
        Command::Advance { delivery_id } => {
            let detail = advance_courier_delivery(&client, delivery_id.trim())
                .await
                .map_err(|err| err.to_string())?;
            println!(
                "delivery={} status={} label={}",
                detail.delivery.id,
                detail.delivery.status.as_wire(),
                detail.delivery.status.label()
            );
            Ok(())
        }
        Command::Export(ExportCommand::Flows { out }) => {
            let data = fetch_admin_flows(&client).await;
            let csv = export_flows_csv(&data.flow_rows).ok_or("nothing to export")?;
            let path = write_export(out.join(FLOWS_CSV_FILE_NAME), csv.as_bytes())
                .map_err(|err| err.to_string())?;
            println!("written={}", path.display());
            Ok(())
        }
        Command::Export(ExportCommand::Invoices { out, period }) => {
            let now = Utc::now();
            let data = fetch_admin_invoices(&client, now).await;
            let input = InvoiceReportInput {
                invoices: &data.invoices,
                period_label: period.trim(),
                generated_at: now.fixed_offset(),
            };
            let report = build_invoice_report(&input).ok_or("nothing to export")?;
            let file_name = invoice_report_file_name(input.period_label, input.generated_at);
            let path = write_export(out.join(file_name), report.as_bytes())
                .map_err(|err| err.to_string())?;
            println!("written={}", path.display());
            Ok(())
        }
    }
}

fn build_client(token: Option<String>) -> Result<ApiClient<ReqwestTransport>, String> {
    let config = AppConfig::from_env().map_err(|err| err.to_string())?;
    let mut transport = ReqwestTransport::new(&config.api).map_err(|err| err.to_string())?;
    if let Some(token) = token.filter(|token| !token.trim().is_empty()) {
        transport = transport.with_bearer_token(token);
    }
    Ok(ApiClient::new(transport))
}
