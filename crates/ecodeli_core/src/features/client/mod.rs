//! Client space: announcements, plus the dashboard, deliveries, payments and
//! announcement form submodules.
//!
//! # Responsibility
//! - Map backend announcements onto list rows and detail views.
//! - Filter, search and paginate the list in memory.
//!
//! # Invariants
//! - Unknown statuses fold to `DRAFT`.
//! - A filtered list always reports at least one page.

pub mod announcement_form;
pub mod dashboard;
pub mod deliveries;
pub mod payments;

use crate::api::{ApiClient, ApiTransport, FeatureError, PageRequest};
use crate::features::failure;
use crate::model::address::{address_label, AddressDto};
use crate::normalize::format::{format_date, format_date_value, format_time, parse_timestamp};
use crate::normalize::{
    normalize_enum, pick_first_non_blank, resolve_amount, text_or, AliasTable, IdValue,
    ADDRESS_PLACEHOLDER,
};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const ANNOUNCEMENTS_ENDPOINT: &str = "/announcements";
pub const ANNOUNCEMENTS_PER_PAGE: usize = 10;

const LIST_FAILURE_MESSAGE: &str = "Impossible de récupérer vos annonces";
const DETAIL_FAILURE_MESSAGE: &str = "Impossible de récupérer l'annonce";
const DATE_TO_CONFIRM: &str = "Date à confirmer";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnnouncementDto {
    pub id: IdValue,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub from_address: Option<AddressDto>,
    pub to_address: Option<AddressDto>,
    pub earliest_at: Option<String>,
    pub latest_at: Option<String>,
    pub due_date: Option<String>,
    pub deadline: Option<String>,
    pub budget_cents: Option<i64>,
    pub budget_amount: Option<f64>,
    pub budget: Option<f64>,
    pub currency: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnnouncementStatus {
    Draft,
    Published,
    Assigned,
    Completed,
    Cancelled,
}

const ANNOUNCEMENT_STATUSES: &AliasTable<AnnouncementStatus> = &[
    ("DRAFT", AnnouncementStatus::Draft),
    ("PUBLISHED", AnnouncementStatus::Published),
    ("ASSIGNED", AnnouncementStatus::Assigned),
    ("COMPLETED", AnnouncementStatus::Completed),
    ("CANCELLED", AnnouncementStatus::Cancelled),
    ("CANCELED", AnnouncementStatus::Cancelled),
];

impl AnnouncementStatus {
    pub fn parse(raw: Option<&str>) -> Self {
        normalize_enum(raw, ANNOUNCEMENT_STATUSES, Self::Draft)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Draft => "Brouillon",
            Self::Published => "Publiée",
            Self::Assigned => "Assignée",
            Self::Completed => "Terminée",
            Self::Cancelled => "Annulée",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Announcement {
    pub id: String,
    pub title: String,
    pub kind: String,
    pub origin: String,
    pub destination: String,
    pub created_at: String,
    pub due_date: String,
    pub budget: f64,
    pub status: AnnouncementStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnouncementDetail {
    pub announcement: Announcement,
    pub from_address: String,
    pub to_address: String,
    pub pickup_date: String,
    pub pickup_time: String,
    pub delivery_date: String,
    pub delivery_time: String,
    pub description: Option<String>,
}

/// `05 déc. 2025`, or `Date à confirmer` when absent or unparsable.
pub(crate) fn date_or_to_confirm(raw: Option<&str>) -> String {
    match raw.and_then(parse_timestamp) {
        Some(value) => format_date_value(&value),
        None => DATE_TO_CONFIRM.to_string(),
    }
}

/// Service label of a backend announcement type; other values fall back to
/// `category`, then `Livraison`.
pub fn announcement_type_label(kind: Option<&str>, category: Option<&str>) -> String {
    let key = pick_first_non_blank(&[kind, category])
        .unwrap_or_default()
        .trim()
        .to_uppercase();
    match key.as_str() {
        "PARCEL_TRANSPORT" => "Transport de colis".to_string(),
        "ON_DEMAND_SERVICE" => "Service à la demande".to_string(),
        _ => text_or(&[category], "Livraison"),
    }
}

/// `city postal code` short label.
pub(crate) fn locality(address: Option<&AddressDto>) -> String {
    let parts: Vec<&str> = address
        .map(|address| {
            [address.city.as_deref(), address.postal_code.as_deref()]
                .into_iter()
                .filter_map(|part| pick_first_non_blank(&[part]))
                .collect()
        })
        .unwrap_or_default();
    if parts.is_empty() {
        ADDRESS_PLACEHOLDER.to_string()
    } else {
        parts.join(" ")
    }
}

pub fn map_announcement(dto: &AnnouncementDto) -> Announcement {
    Announcement {
        id: dto.id.to_string(),
        title: text_or(&[dto.title.as_deref()], "Annonce sans titre"),
        kind: text_or(&[dto.kind.as_deref()], "Livraison"),
        origin: locality(dto.from_address.as_ref()),
        destination: locality(dto.to_address.as_ref()),
        created_at: format_date(dto.created_at.as_deref()),
        due_date: format_date(dto.latest_at.as_deref()),
        budget: resolve_amount(dto.budget_cents, &[dto.budget]),
        status: AnnouncementStatus::parse(dto.status.as_deref()),
    }
}

pub fn map_announcement_detail(dto: &AnnouncementDto) -> AnnouncementDetail {
    AnnouncementDetail {
        announcement: map_announcement(dto),
        from_address: address_label(dto.from_address.as_ref(), ADDRESS_PLACEHOLDER),
        to_address: address_label(dto.to_address.as_ref(), ADDRESS_PLACEHOLDER),
        pickup_date: format_date(dto.earliest_at.as_deref()),
        pickup_time: format_time(dto.earliest_at.as_deref()),
        delivery_date: format_date(dto.latest_at.as_deref()),
        delivery_time: format_time(dto.latest_at.as_deref()),
        description: pick_first_non_blank(&[dto.description.as_deref()]).map(str::to_string),
    }
}

/// In-memory list query; `None` filters mean "all".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncementQuery {
    pub search: String,
    pub status: Option<AnnouncementStatus>,
    pub kind: Option<String>,
    /// 1-based.
    pub page: usize,
}

impl Default for AnnouncementQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: None,
            kind: None,
            page: 1,
        }
    }
}

impl AnnouncementQuery {
    pub fn has_active_filters(&self) -> bool {
        !self.search.is_empty() || self.status.is_some() || self.kind.is_some()
    }

    fn matches(&self, announcement: &Announcement) -> bool {
        let needle = self.search.to_lowercase();
        let matches_search = needle.is_empty()
            || [&announcement.title, &announcement.origin, &announcement.destination]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
        let matches_status = self.status.map_or(true, |status| announcement.status == status);
        let matches_kind = self
            .kind
            .as_deref()
            .map_or(true, |kind| announcement.kind == kind);
        matches_search && matches_status && matches_kind
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnouncementPage {
    pub items: Vec<Announcement>,
    pub total_matches: usize,
    pub total_pages: usize,
    pub page: usize,
}

/// Distinct announcement types, sorted.
pub fn announcement_types(announcements: &[Announcement]) -> Vec<String> {
    announcements
        .iter()
        .map(|announcement| announcement.kind.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Filters then slices one page; out-of-range pages clamp to the nearest valid page.
pub fn filter_announcements(
    announcements: &[Announcement],
    query: &AnnouncementQuery,
) -> AnnouncementPage {
    let matching: Vec<&Announcement> = announcements
        .iter()
        .filter(|announcement| query.matches(announcement))
        .collect();
    let total_pages = matching.len().div_ceil(ANNOUNCEMENTS_PER_PAGE).max(1);
    let page = query.page.clamp(1, total_pages);
    let items = matching
        .iter()
        .skip((page - 1).saturating_mul(ANNOUNCEMENTS_PER_PAGE))
        .take(ANNOUNCEMENTS_PER_PAGE)
        .map(|announcement| (*announcement).clone())
        .collect();
    AnnouncementPage {
        items,
        total_matches: matching.len(),
        total_pages,
        page,
    }
}

pub async fn fetch_client_announcements<T: ApiTransport>(
    client: &ApiClient<T>,
) -> Result<Vec<Announcement>, FeatureError> {
    let page = client
        .get_list::<AnnouncementDto>(ANNOUNCEMENTS_ENDPOINT, &PageRequest::new())
        .await
        .map_err(|err| failure("client_announcements_fetch", LIST_FAILURE_MESSAGE, err))?;
    info!(
        "event=client_announcements_fetch module=features status=ok count={}",
        page.content.len()
    );
    Ok(page.content.iter().map(map_announcement).collect())
}

/// Announcement detail; `None` when the backend answers 404.
pub async fn fetch_client_announcement_detail<T: ApiTransport>(
    client: &ApiClient<T>,
    announcement_id: &str,
) -> Result<Option<AnnouncementDetail>, FeatureError> {
    let path = format!("{ANNOUNCEMENTS_ENDPOINT}/{announcement_id}");
    let dto = client
        .get_optional::<AnnouncementDto>(&path)
        .await
        .map_err(|err| failure("client_announcement_detail", DETAIL_FAILURE_MESSAGE, err))?;
    Ok(dto.as_ref().map(map_announcement_detail))
}
