//! French (`fr-FR`) display formatting for dates, amounts and ratios.
//!
//! # Invariants
//! - Absent or unparsable timestamps never fail; they render a placeholder.
//! - Timestamps are rendered in the offset they were sent with.
//! - Relative formatting takes `now` from the caller.

use super::DASH_PLACEHOLDER;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, Timelike, Utc};

/// Thousands separator used by `fr-FR` number formatting (narrow no-break space).
pub const GROUP_SEPARATOR: char = '\u{202f}';
/// Space placed between an amount and its currency symbol.
pub const CURRENCY_SPACE: char = '\u{a0}';

pub const JUST_NOW_LABEL: &str = "Il y a quelques instants";

const MONTHS_SHORT: [&str; 12] = [
    "janv.", "févr.", "mars", "avr.", "mai", "juin", "juil.", "août", "sept.", "oct.", "nov.",
    "déc.",
];

/// Parses RFC 3339, naive ISO date-time (UTC) or bare `YYYY-MM-DD` values.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed);
    }
    let utc = FixedOffset::east_opt(0)?;
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, pattern) {
            return Some(naive.and_utc().with_timezone(&utc));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().with_timezone(&utc))
}

fn month_label(month: u32) -> &'static str {
    MONTHS_SHORT
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("")
}

/// `05 déc. 2025`, or `—`.
pub fn format_date(raw: Option<&str>) -> String {
    match raw.and_then(parse_timestamp) {
        Some(value) => format_date_value(&value),
        None => DASH_PLACEHOLDER.to_string(),
    }
}

pub fn format_date_value(value: &DateTime<FixedOffset>) -> String {
    format!(
        "{:02} {} {}",
        value.day(),
        month_label(value.month()),
        value.year()
    )
}

/// `05 déc., 14:05`, or `—`.
pub fn format_date_time(raw: Option<&str>) -> String {
    match raw.and_then(parse_timestamp) {
        Some(value) => format_date_time_value(&value),
        None => DASH_PLACEHOLDER.to_string(),
    }
}

pub fn format_date_time_value(value: &DateTime<FixedOffset>) -> String {
    format!(
        "{:02} {}, {:02}:{:02}",
        value.day(),
        month_label(value.month()),
        value.hour(),
        value.minute()
    )
}

/// `9 déc. 2025, 14:05`, the medium stamp printed in generated reports.
pub fn format_generated_at(value: &DateTime<FixedOffset>) -> String {
    format!(
        "{} {} {}, {:02}:{:02}",
        value.day(),
        month_label(value.month()),
        value.year(),
        value.hour(),
        value.minute()
    )
}

/// `14:05`, or `—`.
pub fn format_time(raw: Option<&str>) -> String {
    match raw.and_then(parse_timestamp) {
        Some(value) => format!("{:02}:{:02}", value.hour(), value.minute()),
        None => DASH_PLACEHOLDER.to_string(),
    }
}

/// `08 déc.` day and short month.
pub fn format_day_short_month(value: &DateTime<FixedOffset>) -> String {
    format!("{:02} {}", value.day(), month_label(value.month()))
}

/// `DD/MM` short date used by courier review tables.
pub fn format_day_month(value: &DateTime<FixedOffset>) -> String {
    format!("{:02}/{:02}", value.day(), value.month())
}

/// `09/12 14:05` compact stamp used by dashboard lists, or `—`.
pub fn format_short_date_time(raw: Option<&str>) -> String {
    match raw.and_then(parse_timestamp) {
        Some(value) => format!(
            "{} {:02}:{:02}",
            format_day_month(&value),
            value.hour(),
            value.minute()
        ),
        None => DASH_PLACEHOLDER.to_string(),
    }
}

/// `start • end`, a single side, or `—` when neither side parses.
pub fn format_window(start: Option<&str>, end: Option<&str>) -> String {
    let start = start.and_then(parse_timestamp).map(|v| format_date_time_value(&v));
    let end = end.and_then(parse_timestamp).map(|v| format_date_time_value(&v));
    match (start, end) {
        (Some(start), Some(end)) => format!("{start} • {end}"),
        (Some(side), None) | (None, Some(side)) => side,
        (None, None) => DASH_PLACEHOLDER.to_string(),
    }
}

/// Relative "Il y a ..." label used by role notification feeds.
pub fn format_relative(raw: Option<&str>, now: DateTime<Utc>) -> String {
    let Some(value) = raw.and_then(parse_timestamp) else {
        return JUST_NOW_LABEL.to_string();
    };

    let diff_ms = (now - value.with_timezone(&Utc)).num_milliseconds();
    let minutes = (diff_ms as f64 / 60_000.0).round() as i64;
    if minutes <= 0 {
        return JUST_NOW_LABEL.to_string();
    }
    if minutes < 60 {
        return format!("Il y a {minutes} min");
    }
    let hours = (minutes as f64 / 60.0).round() as i64;
    if hours < 24 {
        return format!("Il y a {hours} h");
    }
    let days = (hours as f64 / 24.0).round() as i64;
    if days < 7 {
        return format!("Il y a {days} j");
    }
    format_date_time_value(&value)
}

/// Currency amount, e.g. `1 234,50 €`. Absent or NaN renders `0 €`.
pub fn format_currency(amount: Option<f64>, currency: Option<&str>) -> String {
    let symbol = currency_symbol(currency.unwrap_or("EUR"));
    let Some(amount) = amount.filter(|value| value.is_finite()) else {
        return format!("0{CURRENCY_SPACE}€");
    };
    format!("{}{CURRENCY_SPACE}{symbol}", format_decimal(amount, 2, 2))
}

/// Whole-euro amount for headline cards, e.g. `1 235 €`.
pub fn format_currency_whole(amount: f64) -> String {
    let amount = if amount.is_finite() { amount } else { 0.0 };
    format!("{}{CURRENCY_SPACE}€", format_decimal(amount, 0, 0))
}

/// Plain `42.50 €` label used in generated documents.
pub fn format_amount_plain(amount: f64) -> String {
    format!("{amount:.2} €")
}

/// Ratio as a percentage with up to two decimals, e.g. `33,33 %`.
pub fn format_percent(ratio: f64) -> String {
    let ratio = if ratio.is_finite() { ratio } else { 0.0 };
    format!("{}{GROUP_SEPARATOR}%", format_decimal(ratio * 100.0, 0, 2))
}

fn currency_symbol(code: &str) -> String {
    match code.trim().to_uppercase().as_str() {
        "" | "EUR" => "€".to_string(),
        "USD" => "$".to_string(),
        "GBP" => "£".to_string(),
        other => other.to_string(),
    }
}

/// Formats with `fr-FR` grouping and a decimal comma.
fn format_decimal(value: f64, min_fraction: usize, max_fraction: usize) -> String {
    let scale = 10_i64.pow(max_fraction as u32);
    let scaled = (value.abs() * scale as f64).round() as i64;
    let integer = scaled / scale;
    let mut fraction = format!("{:0width$}", scaled % scale, width = max_fraction);
    while fraction.len() > min_fraction && fraction.ends_with('0') {
        fraction.pop();
    }

    let digits = integer.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(GROUP_SEPARATOR);
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && scaled != 0 { "-" } else { "" };
    if fraction.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped},{fraction}")
    }
}
