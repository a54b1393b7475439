//! Announcement edit form: typed parcel sizes and the round trip between a
//! list row and the form fields.

use crate::features::client::Announcement;
use crate::normalize::DASH_PLACEHOLDER;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnnouncementType {
    Document,
    Small,
    Medium,
    Large,
    Pallet,
}

impl AnnouncementType {
    pub const ALL: [Self; 5] = [
        Self::Document,
        Self::Small,
        Self::Medium,
        Self::Large,
        Self::Pallet,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Document => "Document",
            Self::Small => "Petite livraison",
            Self::Medium => "Livraison moyenne",
            Self::Large => "Grande livraison",
            Self::Pallet => "Palette",
        }
    }

    /// Reverse of [`Self::label`], ignoring case and surrounding blanks.
    pub fn from_label(label: &str) -> Option<Self> {
        let key = label.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.label().to_lowercase() == key)
    }
}

/// Raw form fields; every value is kept as typed text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementFormValues {
    #[serde(rename = "type")]
    pub kind: Option<AnnouncementType>,
    pub from_address: String,
    pub to_address: String,
    pub pickup_date: String,
    pub pickup_time_start: String,
    pub pickup_time_end: String,
    pub delivery_date: String,
    pub delivery_time_start: String,
    pub delivery_time_end: String,
    pub budget: String,
    pub description: String,
}

fn field(value: &str) -> String {
    if value == DASH_PLACEHOLDER {
        String::new()
    } else {
        value.to_string()
    }
}

/// Prefills the edit form from a list row. Time windows and the
/// description are not part of the row and start empty.
pub fn announcement_to_form_values(announcement: &Announcement) -> AnnouncementFormValues {
    AnnouncementFormValues {
        kind: AnnouncementType::from_label(&announcement.kind),
        from_address: announcement.origin.clone(),
        to_address: announcement.destination.clone(),
        pickup_date: field(&announcement.created_at),
        delivery_date: field(&announcement.due_date),
        budget: if announcement.budget.is_finite() {
            announcement.budget.to_string()
        } else {
            String::new()
        },
        ..AnnouncementFormValues::default()
    }
}

fn parse_budget(raw: &str) -> Option<f64> {
    raw.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Applies edited fields to a row. A blank delivery date or an unparsable
/// budget keeps the previous value.
pub fn apply_form_values(
    announcement: &Announcement,
    values: &AnnouncementFormValues,
) -> Announcement {
    let due_date = values.delivery_date.trim();
    Announcement {
        kind: values
            .kind
            .map_or_else(|| announcement.kind.clone(), |kind| kind.label().to_string()),
        origin: values.from_address.clone(),
        destination: values.to_address.clone(),
        due_date: if due_date.is_empty() {
            announcement.due_date.clone()
        } else {
            due_date.to_string()
        },
        budget: parse_budget(&values.budget).unwrap_or(announcement.budget),
        ..announcement.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::client::AnnouncementStatus;

    fn row() -> Announcement {
        Announcement {
            id: "12".to_string(),
            title: "Colis".to_string(),
            kind: "grande LIVRAISON ".to_string(),
            origin: "Paris 75001".to_string(),
            destination: "Lyon".to_string(),
            created_at: "02 déc. 2025".to_string(),
            due_date: "—".to_string(),
            budget: 42.5,
            status: AnnouncementStatus::Published,
        }
    }

    #[test]
    fn labels_round_trip_case_insensitively() {
        for kind in AnnouncementType::ALL {
            assert_eq!(AnnouncementType::from_label(kind.label()), Some(kind));
        }
        assert_eq!(AnnouncementType::from_label(" PALETTE"), Some(AnnouncementType::Pallet));
        assert_eq!(AnnouncementType::from_label("Transport de colis"), None);
    }

    #[test]
    fn form_prefill_from_row() {
        let values = announcement_to_form_values(&row());
        assert_eq!(values.kind, Some(AnnouncementType::Large));
        assert_eq!(values.from_address, "Paris 75001");
        assert_eq!(values.pickup_date, "02 déc. 2025");
        assert_eq!(values.delivery_date, "");
        assert_eq!(values.budget, "42.5");
        assert!(values.pickup_time_start.is_empty());
        assert!(values.description.is_empty());
    }

    #[test]
    fn applying_values_keeps_previous_fields_when_blank() {
        let values = AnnouncementFormValues {
            kind: None,
            from_address: "Lille".to_string(),
            to_address: "Nantes".to_string(),
            budget: "abc".to_string(),
            ..AnnouncementFormValues::default()
        };
        let updated = apply_form_values(&row(), &values);
        assert_eq!(updated.kind, "grande LIVRAISON ");
        assert_eq!(updated.origin, "Lille");
        assert_eq!(updated.destination, "Nantes");
        assert_eq!(updated.due_date, "—");
        assert_eq!(updated.budget, 42.5);
        assert_eq!(updated.id, "12");

        let values = AnnouncementFormValues {
            kind: Some(AnnouncementType::Small),
            delivery_date: "2025-12-20".to_string(),
            budget: "18,90".to_string(),
            ..values
        };
        let updated = apply_form_values(&row(), &values);
        assert_eq!(updated.kind, "Petite livraison");
        assert_eq!(updated.due_date, "2025-12-20");
        assert_eq!(updated.budget, 18.9);
    }
}
