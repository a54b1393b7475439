//! Backend address object.

use crate::normalize::{format_address, IdValue};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressDto {
    pub id: Option<IdValue>,
    pub label: Option<String>,
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub country_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl AddressDto {
    /// `line1, line2, postal code, city`, skipping blanks.
    pub fn display(&self, placeholder: &str) -> String {
        format_address(
            &[
                self.line1.as_deref(),
                self.line2.as_deref(),
                self.postal_code.as_deref(),
                self.city.as_deref(),
            ],
            placeholder,
        )
    }
}

/// Display label of an optional address.
pub fn address_label(address: Option<&AddressDto>, placeholder: &str) -> String {
    match address {
        Some(address) => address.display(placeholder),
        None => placeholder.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{address_label, AddressDto};
    use crate::normalize::ADDRESS_PLACEHOLDER;

    #[test]
    fn display_skips_blank_parts() {
        let address: AddressDto = serde_json::from_value(serde_json::json!({
            "line1": "18 Rue Oberkampf",
            "line2": "",
            "postalCode": "75011",
            "city": "Paris"
        }))
        .expect("address");
        assert_eq!(address.display(ADDRESS_PLACEHOLDER), "18 Rue Oberkampf, 75011, Paris");
        assert_eq!(address_label(None, ADDRESS_PLACEHOLDER), ADDRESS_PLACEHOLDER);
    }
}
