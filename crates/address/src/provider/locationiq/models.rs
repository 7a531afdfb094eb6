use serde::Deserialize;

use crate::models::{join_street, AddressSuggestion, ProviderKind};

/// Place returned by `/autocomplete`, `/search` and `/reverse`.
#[derive(Debug, Deserialize)]
pub(super) struct LocationIqPlace {
    #[serde(default)]
    pub place_id: Option<String>,
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default, rename = "type")]
    pub place_type: Option<String>,
    #[serde(default)]
    pub address: Option<LocationIqAddress>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct LocationIqAddress {
    /// Street-level name when the place has no road (e.g. a POI).
    pub name: Option<String>,
    pub house_number: Option<String>,
    pub road: Option<String>,
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
    pub country_code: Option<String>,
}

impl LocationIqPlace {
    pub fn in_country(&self, country_code: &str) -> bool {
        match self.address.as_ref().and_then(|a| a.country_code.as_deref()) {
            Some(code) => code.eq_ignore_ascii_case(country_code),
            None => true,
        }
    }

    pub fn into_suggestion(self) -> Option<AddressSuggestion> {
        let latitude = self.lat.trim().parse::<f64>().ok()?;
        let longitude = self.lon.trim().parse::<f64>().ok()?;
        let address = self.address.unwrap_or_default();

        let road = address.road.as_deref().or(address.name.as_deref());
        let street_address = join_street(address.house_number.as_deref(), road);
        let city = address
            .city
            .or(address.town)
            .or(address.village)
            .unwrap_or_default();

        Some(AddressSuggestion {
            id: self.place_id.unwrap_or_default(),
            display_name: self.display_name,
            street_address,
            city,
            state: address.state.unwrap_or_default(),
            zip: address.postcode.unwrap_or_default(),
            latitude,
            longitude,
            place_type: self.place_type.or(self.class).unwrap_or_default(),
            provider: ProviderKind::Secondary,
        })
    }
}
