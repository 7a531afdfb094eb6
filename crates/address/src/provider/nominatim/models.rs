//! Nominatim API response structures.

use serde::Deserialize;

use crate::models::{join_street, AddressSuggestion, ProviderKind};

/// One place from `/search` or `/reverse` (`format=jsonv2`).
#[derive(Debug, Deserialize)]
pub(super) struct NominatimPlace {
    pub place_id: Option<u64>,
    /// Decimal degrees, encoded as a string.
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub display_name: String,
    /// `jsonv2` reports the class as `category`, older formats as `class`.
    #[serde(default, alias = "class")]
    pub category: Option<String>,
    #[serde(default, rename = "type")]
    pub place_type: Option<String>,
    #[serde(default, rename = "addresstype")]
    pub address_type: Option<String>,
    #[serde(default)]
    pub address: Option<NominatimAddress>,
}

/// `addressdetails=1` breakdown.
#[derive(Debug, Default, Deserialize)]
pub(super) struct NominatimAddress {
    pub house_number: Option<String>,
    pub road: Option<String>,
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub hamlet: Option<String>,
    pub municipality: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
    pub country_code: Option<String>,
}

/// `/reverse` answers 200 with `{"error": "..."}` when nothing is there.
#[derive(Debug, Deserialize)]
pub(super) struct NominatimError {
    pub error: String,
}

impl NominatimAddress {
    fn locality(&self) -> Option<&str> {
        [
            &self.city,
            &self.town,
            &self.village,
            &self.hamlet,
            &self.municipality,
        ]
        .into_iter()
        .find_map(|value| value.as_deref())
    }
}

impl NominatimPlace {
    /// Country filter check; places without a country code are kept.
    pub fn in_country(&self, country_code: &str) -> bool {
        self.address
            .as_ref()
            .and_then(|address| address.country_code.as_deref())
            .map(|code| code.eq_ignore_ascii_case(country_code))
            .unwrap_or(true)
    }

    /// Normalize into the shared model. `None` when coordinates are unusable.
    pub fn into_suggestion(self) -> Option<AddressSuggestion> {
        let latitude = self.lat.trim().parse::<f64>().ok()?;
        let longitude = self.lon.trim().parse::<f64>().ok()?;
        let address = self.address.unwrap_or_default();

        let place_type = self
            .address_type
            .or(self.place_type)
            .or(self.category)
            .unwrap_or_default();

        Some(AddressSuggestion {
            id: self.place_id.map(|id| id.to_string()).unwrap_or_default(),
            display_name: self.display_name,
            street_address: join_street(address.house_number.as_deref(), address.road.as_deref()),
            city: address.locality().unwrap_or_default().to_string(),
            state: address.state.clone().unwrap_or_default(),
            zip: address.postcode.clone().unwrap_or_default(),
            latitude,
            longitude,
            place_type,
            provider: ProviderKind::Primary,
        })
    }
}
