//! Response normalization primitives shared by every feature mapper.
//!
//! # Responsibility
//! - Tolerate historical field aliases ("first non-empty value wins").
//! - Fold loosely cased backend enum values onto closed token sets.
//! - Convert integer cents and address fragments into display values.
//!
//! # Invariants
//! - Every function here is total: absent or unknown input yields the
//!   documented default, never a panic.

pub mod format;

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Placeholder used by delivery/announcement address blocks.
pub const ADDRESS_PLACEHOLDER: &str = "Adresse non renseignée";
/// Placeholder used by admin tables and generic absent values.
pub const DASH_PLACEHOLDER: &str = "—";

/// Alias table for enum normalization: `(UPPERCASE_ALIAS, token)` pairs.
pub type AliasTable<T> = [(&'static str, T)];

/// Returns the first `Some` candidate.
pub fn pick_first_defined<T: Clone>(candidates: &[Option<T>]) -> Option<T> {
    candidates.iter().find_map(Clone::clone)
}

/// Returns the first candidate whose trimmed text is non-empty.
pub fn pick_first_non_blank<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
    candidates
        .iter()
        .flatten()
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
}

/// Same as [`pick_first_non_blank`] with an owned fallback.
pub fn text_or(candidates: &[Option<&str>], fallback: &str) -> String {
    pick_first_non_blank(candidates)
        .unwrap_or(fallback)
        .to_string()
}

/// Maps `raw` onto a closed token set by uppercase comparison.
///
/// Absent, blank and unknown values resolve to `default`.
pub fn normalize_enum<T: Copy>(raw: Option<&str>, table: &AliasTable<T>, default: T) -> T {
    normalize_optional_enum(raw, table).unwrap_or(default)
}

/// Like [`normalize_enum`] but keeps "unknown" distinguishable as `None`.
pub fn normalize_optional_enum<T: Copy>(raw: Option<&str>, table: &AliasTable<T>) -> Option<T> {
    let key = raw?.trim().to_uppercase();
    if key.is_empty() {
        return None;
    }
    table
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, token)| *token)
}

/// Integer cents to a decimal amount.
pub fn cents_to_amount(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Prefers integer cents, then the first defined decimal amount, else `0`.
pub fn resolve_amount(amount_cents: Option<i64>, amounts: &[Option<f64>]) -> f64 {
    if let Some(cents) = amount_cents {
        return cents_to_amount(cents);
    }
    amounts
        .iter()
        .flatten()
        .copied()
        .find(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// Joins non-empty address parts with `, `, else returns `placeholder`.
pub fn format_address(parts: &[Option<&str>], placeholder: &str) -> String {
    let joined = parts
        .iter()
        .flatten()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    if joined.is_empty() {
        placeholder.to_string()
    } else {
        joined
    }
}

/// Lowercase, accent-free, trimmed key used for fuzzy source matching.
pub fn sanitize_key(raw: Option<&str>) -> String {
    raw.unwrap_or_default()
        .trim()
        .nfd()
        .filter(|ch| !is_combining_mark(*ch))
        .collect::<String>()
        .to_lowercase()
}

/// Backend identifiers arrive as JSON numbers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdValue {
    Number(i64),
    Text(String),
}

impl Display for IdValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl Default for IdValue {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl From<&str> for IdValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for IdValue {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}
