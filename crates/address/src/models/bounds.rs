//! Metro bounding box used to bias geocoding results.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AddressError;

/// Longitude/latitude rectangle. Results inside it are preferred but results
/// outside are not discarded.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Result<Self, AddressError> {
        if !(-180.0..=180.0).contains(&min_lon) || !(-180.0..=180.0).contains(&max_lon) {
            return Err(AddressError::InvalidInput(
                "bounding box longitude out of range".to_string(),
            ));
        }
        if !(-90.0..=90.0).contains(&min_lat) || !(-90.0..=90.0).contains(&max_lat) {
            return Err(AddressError::InvalidInput(
                "bounding box latitude out of range".to_string(),
            ));
        }
        if min_lon >= max_lon || min_lat >= max_lat {
            return Err(AddressError::InvalidInput(
                "bounding box min corner must be below and left of max corner".to_string(),
            ));
        }
        Ok(Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        })
    }

    /// Kansas City metro.
    pub fn kansas_city() -> Self {
        Self {
            min_lon: -95.0,
            min_lat: 38.8,
            max_lon: -94.2,
            max_lat: 39.4,
        }
    }

    /// `viewbox` query value in `x1,y1,x2,y2` order.
    pub fn viewbox_param(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

impl FromStr for BoundingBox {
    type Err = AddressError;

    /// Parse `min_lon,min_lat,max_lon,max_lat`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AddressError::InvalidInput(format!("invalid viewbox '{}': {}", s, e)))?;

        match values.as_slice() {
            [min_lon, min_lat, max_lon, max_lat] => {
                Self::new(*min_lon, *min_lat, *max_lon, *max_lat)
            }
            _ => Err(AddressError::InvalidInput(format!(
                "viewbox '{}' must have four comma-separated numbers",
                s
            ))),
        }
    }
}

/// True when the pair is a valid WGS84 coordinate.
pub fn is_valid_coordinate(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude)
}
