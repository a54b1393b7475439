//! Merchant home-delivery announcements: form validation, creation and list.
//!
//! # Responsibility
//! - Validate the home-delivery campaign form field by field.
//! - Publish or save a draft, then phrase the confirmation.
//! - Map the merchant's announcements onto list cards.
//!
//! # Invariants
//! - An invalid form never reaches the backend.
//! - The confirmation reference falls back to the typed reference, then the id.

use crate::api::{ApiClient, ApiError, ApiTransport, FeatureError, PageRequest};
use crate::features::failure;
use crate::normalize::format::format_date_time;
use crate::normalize::{
    normalize_enum, pick_first_non_blank, resolve_amount, text_or, AliasTable, IdValue,
    DASH_PLACEHOLDER,
};
use log::{error, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

pub const MERCHANT_ANNOUNCEMENTS_ENDPOINT: &str = "/merchants/me/announcements";
pub const MERCHANT_HOME_DELIVERY_TYPE: &str = "MERCHANT_HOME_DELIVERY";
pub const NOTIFICATION_MESSAGE_MAX_CHARS: usize = 160;
pub const INSTRUCTIONS_MAX_CHARS: usize = 600;

const REQUIRED_MESSAGE: &str = "Champ requis";
const POSITIVE_MESSAGE: &str = "La valeur doit être supérieure à 0";
const NOTIFICATION_TOO_LONG_MESSAGE: &str = "160 caractères maximum";
const INSTRUCTIONS_TOO_LONG_MESSAGE: &str = "600 caractères maximum";
const INVALID_EMAIL_MESSAGE: &str = "Email invalide";
const LIST_FAILURE_MESSAGE: &str = "Impossible de récupérer vos annonces";

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_.-]+@([A-Za-z0-9_-]+\.)+[A-Za-z0-9_-]{2,4}$")
        .expect("valid email regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceLevel {
    #[default]
    Standard,
    Express,
}

const SERVICE_LEVELS: &AliasTable<ServiceLevel> = &[
    ("STANDARD", ServiceLevel::Standard),
    ("EXPRESS", ServiceLevel::Express),
];

impl ServiceLevel {
    pub fn parse(raw: Option<&str>) -> Self {
        normalize_enum(raw, SERVICE_LEVELS, Self::Standard)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::Express => "Express",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MerchantAnnouncementStatus {
    Draft,
    Published,
}

const ANNOUNCEMENT_STATUSES: &AliasTable<MerchantAnnouncementStatus> = &[
    ("DRAFT", MerchantAnnouncementStatus::Draft),
    ("PUBLISHED", MerchantAnnouncementStatus::Published),
];

impl MerchantAnnouncementStatus {
    pub fn parse(raw: Option<&str>) -> Self {
        normalize_enum(raw, ANNOUNCEMENT_STATUSES, Self::Draft)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Draft => "Brouillon",
            Self::Published => "Publiée",
        }
    }
}

/// Form field keys, serialized the way the form names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    CampaignName,
    PickupAddress,
    PickupCity,
    PickupPostalCode,
    PickupDate,
    PickupTimeStart,
    PickupTimeEnd,
    DeliveryDate,
    DeliveryTimeStart,
    DeliveryTimeEnd,
    DeliveryCity,
    DeliveryRadiusKm,
    PackagesCount,
    AverageWeight,
    Budget,
    Instructions,
    NotificationMessage,
    ContactName,
    ContactPhone,
    ContactEmail,
}

const REQUIRED_FIELDS: [FormField; 17] = [
    FormField::CampaignName,
    FormField::PickupAddress,
    FormField::PickupCity,
    FormField::PickupPostalCode,
    FormField::PickupDate,
    FormField::PickupTimeStart,
    FormField::PickupTimeEnd,
    FormField::DeliveryDate,
    FormField::DeliveryTimeStart,
    FormField::DeliveryTimeEnd,
    FormField::DeliveryCity,
    FormField::DeliveryRadiusKm,
    FormField::PackagesCount,
    FormField::Budget,
    FormField::ContactName,
    FormField::ContactPhone,
    FormField::ContactEmail,
];

const NUMERIC_FIELDS: [FormField; 4] = [
    FormField::DeliveryRadiusKm,
    FormField::PackagesCount,
    FormField::AverageWeight,
    FormField::Budget,
];

/// Field errors keyed by field, one message each.
pub type FormErrors = BTreeMap<FormField, &'static str>;

/// Home-delivery campaign form; numbers stay as typed text until validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MerchantHomeDeliveryFormValues {
    pub service_level: ServiceLevel,
    pub campaign_name: String,
    pub reference: String,
    pub pickup_address: String,
    pub pickup_city: String,
    pub pickup_postal_code: String,
    pub pickup_date: String,
    pub pickup_time_start: String,
    pub pickup_time_end: String,
    pub delivery_date: String,
    pub delivery_time_start: String,
    pub delivery_time_end: String,
    pub delivery_city: String,
    pub delivery_radius_km: String,
    pub packages_count: String,
    pub average_weight: String,
    pub budget: String,
    pub instructions: String,
    pub notification_message: String,
    pub contact_name: String,
    pub contact_phone: String,
    pub contact_email: String,
    pub allow_partial_deliveries: bool,
    pub requires_signature: bool,
    pub temperature_controlled: bool,
}

impl Default for MerchantHomeDeliveryFormValues {
    fn default() -> Self {
        Self {
            service_level: ServiceLevel::Standard,
            campaign_name: String::new(),
            reference: String::new(),
            pickup_address: String::new(),
            pickup_city: String::new(),
            pickup_postal_code: String::new(),
            pickup_date: String::new(),
            pickup_time_start: String::new(),
            pickup_time_end: String::new(),
            delivery_date: String::new(),
            delivery_time_start: String::new(),
            delivery_time_end: String::new(),
            delivery_city: String::new(),
            delivery_radius_km: String::new(),
            packages_count: String::new(),
            average_weight: String::new(),
            budget: String::new(),
            instructions: String::new(),
            notification_message: String::new(),
            contact_name: String::new(),
            contact_phone: String::new(),
            contact_email: String::new(),
            allow_partial_deliveries: false,
            requires_signature: true,
            temperature_controlled: false,
        }
    }
}

impl MerchantHomeDeliveryFormValues {
    pub fn field(&self, field: FormField) -> &str {
        match field {
            FormField::CampaignName => &self.campaign_name,
            FormField::PickupAddress => &self.pickup_address,
            FormField::PickupCity => &self.pickup_city,
            FormField::PickupPostalCode => &self.pickup_postal_code,
            FormField::PickupDate => &self.pickup_date,
            FormField::PickupTimeStart => &self.pickup_time_start,
            FormField::PickupTimeEnd => &self.pickup_time_end,
            FormField::DeliveryDate => &self.delivery_date,
            FormField::DeliveryTimeStart => &self.delivery_time_start,
            FormField::DeliveryTimeEnd => &self.delivery_time_end,
            FormField::DeliveryCity => &self.delivery_city,
            FormField::DeliveryRadiusKm => &self.delivery_radius_km,
            FormField::PackagesCount => &self.packages_count,
            FormField::AverageWeight => &self.average_weight,
            FormField::Budget => &self.budget,
            FormField::Instructions => &self.instructions,
            FormField::NotificationMessage => &self.notification_message,
            FormField::ContactName => &self.contact_name,
            FormField::ContactPhone => &self.contact_phone,
            FormField::ContactEmail => &self.contact_email,
        }
    }

    /// All field errors; an empty map means the form can be sent.
    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::new();
        for field in REQUIRED_FIELDS {
            if self.field(field).trim().is_empty() {
                errors.insert(field, REQUIRED_MESSAGE);
            }
        }
        for field in NUMERIC_FIELDS {
            let raw = self.field(field).trim();
            if raw.is_empty() {
                continue;
            }
            let positive = raw
                .replace(',', ".")
                .parse::<f64>()
                .is_ok_and(|value| value.is_finite() && value > 0.0);
            if !positive {
                errors.insert(field, POSITIVE_MESSAGE);
            }
        }
        if self.notification_message.chars().count() > NOTIFICATION_MESSAGE_MAX_CHARS {
            errors.insert(FormField::NotificationMessage, NOTIFICATION_TOO_LONG_MESSAGE);
        }
        if self.instructions.chars().count() > INSTRUCTIONS_MAX_CHARS {
            errors.insert(FormField::Instructions, INSTRUCTIONS_TOO_LONG_MESSAGE);
        }
        let email = self.contact_email.trim();
        if !email.is_empty() && !EMAIL_RE.is_match(email) {
            errors.insert(FormField::ContactEmail, INVALID_EMAIL_MESSAGE);
        }
        errors
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeDeliveryAnnouncementBody<'a> {
    pub service_type: &'static str,
    pub status: MerchantAnnouncementStatus,
    #[serde(flatten)]
    pub values: &'a MerchantHomeDeliveryFormValues,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HomeDeliveryAnnouncementResponse {
    pub id: IdValue,
    pub status: Option<String>,
    pub reference: Option<String>,
    pub published_at: Option<String>,
}

/// Outcome shown after a successful submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HomeDeliveryReceipt {
    pub id: String,
    pub status: MerchantAnnouncementStatus,
    pub reference: String,
    pub published_at: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HomeDeliveryError {
    Invalid(FormErrors),
    Request(ApiError),
}

impl HomeDeliveryError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Invalid(_) => "Veuillez corriger les champs signalés.",
            Self::Request(_) => "Impossible d'enregistrer votre annonce pour le moment.",
        }
    }
}

impl Display for HomeDeliveryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(errors) => {
                write!(f, "home delivery form has {} invalid fields", errors.len())
            }
            Self::Request(err) => write!(f, "home delivery announcement request failed: {err}"),
        }
    }
}

impl std::error::Error for HomeDeliveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Invalid(_) => None,
            Self::Request(err) => Some(err),
        }
    }
}

impl From<ApiError> for HomeDeliveryError {
    fn from(value: ApiError) -> Self {
        Self::Request(value)
    }
}

pub fn map_receipt(
    response: &HomeDeliveryAnnouncementResponse,
    requested: MerchantAnnouncementStatus,
    values: &MerchantHomeDeliveryFormValues,
) -> HomeDeliveryReceipt {
    let id = response.id.to_string();
    let status = match response.status.as_deref() {
        Some(raw) if !raw.trim().is_empty() => MerchantAnnouncementStatus::parse(Some(raw)),
        _ => requested,
    };
    let reference = text_or(
        &[response.reference.as_deref(), Some(values.reference.as_str())],
        &id,
    );
    let message = match status {
        MerchantAnnouncementStatus::Published => {
            format!("Annonce publiée sous la référence {reference}.")
        }
        MerchantAnnouncementStatus::Draft => {
            format!("Brouillon enregistré sous la référence {reference}.")
        }
    };
    HomeDeliveryReceipt {
        id,
        status,
        reference,
        published_at: pick_first_non_blank(&[response.published_at.as_deref()])
            .map(str::to_string),
        message,
    }
}

/// Validates then publishes (or saves as draft) a home-delivery campaign.
///
/// # Errors
/// [`HomeDeliveryError::Invalid`] before any request, or the failed request.
pub async fn create_home_delivery_announcement<T: ApiTransport>(
    client: &ApiClient<T>,
    status: MerchantAnnouncementStatus,
    values: &MerchantHomeDeliveryFormValues,
) -> Result<HomeDeliveryReceipt, HomeDeliveryError> {
    let errors = values.validate();
    if !errors.is_empty() {
        warn!(
            "event=merchant_announcement_create module=features status=rejected invalid_fields={}",
            errors.len()
        );
        return Err(HomeDeliveryError::Invalid(errors));
    }
    let body = HomeDeliveryAnnouncementBody {
        service_type: MERCHANT_HOME_DELIVERY_TYPE,
        status,
        values,
    };
    let response: HomeDeliveryAnnouncementResponse = client
        .post_json(MERCHANT_ANNOUNCEMENTS_ENDPOINT, &body)
        .await
        .map_err(|err| {
            error!(
                "event=merchant_announcement_create module=features status=error code={} error={}",
                err.code(),
                err
            );
            HomeDeliveryError::from(err)
        })?;
    let receipt = map_receipt(&response, status, values);
    info!(
        "event=merchant_announcement_create module=features status=ok id={} published={}",
        receipt.id,
        receipt.status == MerchantAnnouncementStatus::Published
    );
    Ok(receipt)
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimeWindowDto {
    pub date: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MerchantAnnouncementDto {
    pub id: IdValue,
    pub campaign_name: Option<String>,
    pub reference: Option<String>,
    pub service_level: Option<String>,
    pub status: Option<String>,
    pub pickup_window: Option<TimeWindowDto>,
    pub delivery_window: Option<TimeWindowDto>,
    pub delivery_city: Option<String>,
    pub delivery_radius_km: Option<f64>,
    pub packages_count: Option<u32>,
    pub average_weight: Option<f64>,
    pub budget_cents: Option<i64>,
    pub budget: Option<f64>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub date: String,
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MerchantAnnouncement {
    pub id: String,
    pub campaign_name: String,
    pub reference: String,
    pub service_level: ServiceLevel,
    pub status: MerchantAnnouncementStatus,
    pub pickup_window: TimeWindow,
    pub delivery_window: TimeWindow,
    pub delivery_city: String,
    pub delivery_radius_km: f64,
    pub packages_count: u32,
    pub average_weight: f64,
    pub budget: f64,
    pub updated_at: String,
}

fn map_window(window: Option<&TimeWindowDto>) -> TimeWindow {
    let window = window.cloned().unwrap_or_default();
    TimeWindow {
        date: text_or(&[window.date.as_deref()], DASH_PLACEHOLDER),
        start: text_or(&[window.start.as_deref()], DASH_PLACEHOLDER),
        end: text_or(&[window.end.as_deref()], DASH_PLACEHOLDER),
    }
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|value| value.is_finite()).unwrap_or(0.0)
}

pub fn map_merchant_announcement(dto: &MerchantAnnouncementDto) -> MerchantAnnouncement {
    MerchantAnnouncement {
        id: dto.id.to_string(),
        campaign_name: text_or(&[dto.campaign_name.as_deref()], "Campagne sans nom"),
        reference: text_or(&[dto.reference.as_deref()], DASH_PLACEHOLDER),
        service_level: ServiceLevel::parse(dto.service_level.as_deref()),
        status: MerchantAnnouncementStatus::parse(dto.status.as_deref()),
        pickup_window: map_window(dto.pickup_window.as_ref()),
        delivery_window: map_window(dto.delivery_window.as_ref()),
        delivery_city: text_or(&[dto.delivery_city.as_deref()], DASH_PLACEHOLDER),
        delivery_radius_km: finite_or_zero(dto.delivery_radius_km),
        packages_count: dto.packages_count.unwrap_or(0),
        average_weight: finite_or_zero(dto.average_weight),
        budget: resolve_amount(dto.budget_cents, &[dto.budget]),
        updated_at: format_date_time(dto.updated_at.as_deref()),
    }
}

/// The merchant's home-delivery campaigns, most recently updated first.
pub async fn fetch_merchant_announcements<T: ApiTransport>(
    client: &ApiClient<T>,
) -> Result<Vec<MerchantAnnouncement>, FeatureError> {
    let request = PageRequest::new().sort("updatedAt,desc");
    let page = client
        .get_list::<MerchantAnnouncementDto>(MERCHANT_ANNOUNCEMENTS_ENDPOINT, &request)
        .await
        .map_err(|err| failure("merchant_announcements_fetch", LIST_FAILURE_MESSAGE, err))?;
    info!(
        "event=merchant_announcements_fetch module=features status=ok count={}",
        page.content.len()
    );
    Ok(page.content.iter().map(map_merchant_announcement).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_form() -> MerchantHomeDeliveryFormValues {
        MerchantHomeDeliveryFormValues {
            service_level: ServiceLevel::Express,
            campaign_name: "Opération Noël".to_string(),
            pickup_address: "12 rue du Commerce".to_string(),
            pickup_city: "Paris".to_string(),
            pickup_postal_code: "75015".to_string(),
            pickup_date: "2025-12-12".to_string(),
            pickup_time_start: "07:00".to_string(),
            pickup_time_end: "08:00".to_string(),
            delivery_date: "2025-12-12".to_string(),
            delivery_time_start: "09:00".to_string(),
            delivery_time_end: "14:00".to_string(),
            delivery_city: "Paris".to_string(),
            delivery_radius_km: "8".to_string(),
            packages_count: "120".to_string(),
            budget: "1450".to_string(),
            contact_name: "Claire Roux".to_string(),
            contact_phone: "+33 6 33 22 11 00".to_string(),
            contact_email: "claire.roux@maison-verte.fr".to_string(),
            ..MerchantHomeDeliveryFormValues::default()
        }
    }

    #[test]
    fn defaults_require_signature() {
        let values = MerchantHomeDeliveryFormValues::default();
        assert!(values.requires_signature);
        assert!(!values.allow_partial_deliveries);
        assert_eq!(values.service_level, ServiceLevel::Standard);
    }

    #[test]
    fn empty_form_flags_every_required_field() {
        let errors = MerchantHomeDeliveryFormValues::default().validate();
        assert_eq!(errors.len(), REQUIRED_FIELDS.len());
        assert_eq!(errors.get(&FormField::ContactEmail), Some(&"Champ requis"));
        assert!(!errors.contains_key(&FormField::AverageWeight));
        assert!(valid_form().validate().is_empty());
    }

    #[test]
    fn numbers_lengths_and_email_are_checked() {
        let values = MerchantHomeDeliveryFormValues {
            delivery_radius_km: "0".to_string(),
            average_weight: "-2".to_string(),
            packages_count: "beaucoup".to_string(),
            budget: "12,5".to_string(),
            notification_message: "é".repeat(161),
            instructions: "x".repeat(600),
            contact_email: "claire@roux".to_string(),
            ..valid_form()
        };
        let errors = values.validate();
        assert_eq!(
            errors.get(&FormField::DeliveryRadiusKm),
            Some(&"La valeur doit être supérieure à 0")
        );
        assert!(errors.contains_key(&FormField::AverageWeight));
        assert!(errors.contains_key(&FormField::PackagesCount));
        assert!(!errors.contains_key(&FormField::Budget));
        assert_eq!(
            errors.get(&FormField::NotificationMessage),
            Some(&"160 caractères maximum")
        );
        assert!(!errors.contains_key(&FormField::Instructions));
        assert_eq!(errors.get(&FormField::ContactEmail), Some(&"Email invalide"));
    }

    #[test]
    fn body_flattens_values_next_to_service_type() {
        let values = valid_form();
        let body = HomeDeliveryAnnouncementBody {
            service_type: MERCHANT_HOME_DELIVERY_TYPE,
            status: MerchantAnnouncementStatus::Published,
            values: &values,
        };
        let json = serde_json::to_value(&body).expect("body json");
        assert_eq!(json["serviceType"], "MERCHANT_HOME_DELIVERY");
        assert_eq!(json["status"], "PUBLISHED");
        assert_eq!(json["serviceLevel"], "EXPRESS");
        assert_eq!(json["deliveryRadiusKm"], "8");
        assert_eq!(json["requiresSignature"], true);
    }

    #[test]
    fn receipt_reference_fallbacks_and_messages() {
        let mut values = valid_form();
        let response: HomeDeliveryAnnouncementResponse =
            serde_json::from_value(json!({ "id": "MHD-7" })).expect("response");
        let receipt = map_receipt(&response, MerchantAnnouncementStatus::Draft, &values);
        assert_eq!(receipt.reference, "MHD-7");
        assert_eq!(receipt.message, "Brouillon enregistré sous la référence MHD-7.");

        values.reference = "XMAS-P15".to_string();
        let response: HomeDeliveryAnnouncementResponse = serde_json::from_value(json!({
            "id": 9,
            "status": "PUBLISHED",
            "publishedAt": "2025-12-09T08:15:00Z"
        }))
        .expect("response");
        let receipt = map_receipt(&response, MerchantAnnouncementStatus::Draft, &values);
        assert_eq!(receipt.status, MerchantAnnouncementStatus::Published);
        assert_eq!(receipt.message, "Annonce publiée sous la référence XMAS-P15.");
        assert_eq!(receipt.published_at.as_deref(), Some("2025-12-09T08:15:00Z"));
    }

    #[test]
    fn list_card_mapping() {
        let dto: MerchantAnnouncementDto = serde_json::from_value(json!({
            "id": "MHD-001",
            "campaignName": "Opération Noël - Paris 15",
            "serviceLevel": "express",
            "status": "PUBLISHED",
            "pickupWindow": { "date": "2025-12-12", "start": "07:00", "end": "08:00" },
            "deliveryCity": "Paris",
            "deliveryRadiusKm": 8,
            "packagesCount": 120,
            "budgetCents": 145000,
            "updatedAt": "2025-12-09T08:15:00Z"
        }))
        .expect("announcement dto");
        let card = map_merchant_announcement(&dto);
        assert_eq!(card.service_level, ServiceLevel::Express);
        assert_eq!(card.pickup_window.start, "07:00");
        assert_eq!(card.delivery_window.date, "—");
        assert_eq!(card.reference, "—");
        assert_eq!(card.budget, 1450.0);
        assert_eq!(card.average_weight, 0.0);
        assert_eq!(card.updated_at, "09 déc., 08:15");

        let blank = map_merchant_announcement(&MerchantAnnouncementDto::default());
        assert_eq!(blank.campaign_name, "Campagne sans nom");
        assert_eq!(blank.status, MerchantAnnouncementStatus::Draft);
    }
}
