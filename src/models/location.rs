use failure::Error as FailureError;
use geo::Point as GeoPoint;

use errors::Error;

/// Fixed origin of every delivery; x is longitude, y is latitude.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HubLocation {
    pub location: GeoPoint<f64>,
    pub postcode: Option<String>,
}

impl HubLocation {
    pub fn new(longitude: f64, latitude: f64, postcode: Option<String>) -> Result<Self, FailureError> {
        if !valid_coordinate(longitude, latitude) {
            return Err(format_err!(
                "Hub coordinates invalid or missing: hub_longitude={}, hub_latitude={}",
                longitude,
                latitude
            ).context(Error::Configuration)
                .into());
        }
        Ok(Self {
            location: GeoPoint::new(longitude, latitude),
            postcode,
        })
    }

    pub fn longitude(&self) -> f64 {
        self.location.x()
    }

    pub fn latitude(&self) -> f64 {
        self.location.y()
    }
}

/// Coordinate to classify, with the country label the geocoder attached to it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeliveryTarget {
    pub location: GeoPoint<f64>,
    pub country: Option<String>,
}

impl DeliveryTarget {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            location: GeoPoint::new(longitude, latitude),
            country: None,
        }
    }

    pub fn with_country(mut self, country: Option<String>) -> Self {
        self.country = country;
        self
    }

    pub fn longitude(&self) -> f64 {
        self.location.x()
    }

    pub fn latitude(&self) -> f64 {
        self.location.y()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeocodedLocation {
    pub postcode: String,
    pub latitude: f64,
    pub longitude: f64,
    pub district: Option<String>,
    pub ward: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
}

impl GeocodedLocation {
    pub fn target(&self) -> DeliveryTarget {
        DeliveryTarget::new(self.latitude, self.longitude).with_country(self.country.clone())
    }

    pub fn point(&self) -> GeoPoint<f64> {
        GeoPoint::new(self.longitude, self.latitude)
    }
}

pub fn valid_coordinate(longitude: f64, latitude: f64) -> bool {
    longitude.is_finite() && latitude.is_finite() && longitude.abs() <= 180.0 && latitude.abs() <= 90.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hub_keeps_lng_lat_order() {
        let hub = HubLocation::new(-1.5491, 53.8008, None).unwrap();
        assert_eq!(hub.longitude(), -1.5491);
        assert_eq!(hub.latitude(), 53.8008);
    }

    #[test]
    fn hub_rejects_swapped_or_missing_values() {
        assert!(HubLocation::new(53.8008, 181.0, None).is_err());
        assert!(HubLocation::new(::std::f64::NAN, 53.8, None).is_err());
    }

    #[test]
    fn geocoded_location_carries_country_to_target() {
        let location = GeocodedLocation {
            postcode: "EH1 1YZ".to_string(),
            latitude: 55.95,
            longitude: -3.19,
            district: Some("City of Edinburgh".to_string()),
            ward: None,
            region: None,
            country: Some("Scotland".to_string()),
        };
        let target = location.target();
        assert_eq!(target.latitude(), 55.95);
        assert_eq!(target.longitude(), -3.19);
        assert_eq!(target.country, Some("Scotland".to_string()));
    }
}
