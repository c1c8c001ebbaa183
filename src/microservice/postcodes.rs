use failure::{Error as FailureError, Fail};
use futures::Future;
use hyper::StatusCode;

use super::ApiFuture;

use errors::{error_kind, Error};
use http::{HttpClient, Response};
use models::{GeocodedLocation, Postcode};

/// Postcode to coordinate lookup.
pub trait Geocoder {
    fn geocode(&self, postcode: &Postcode) -> ApiFuture<GeocodedLocation>;
}

#[derive(Deserialize, Debug)]
struct LookupResponse {
    status: u16,
    result: Option<LookupResult>,
}

#[derive(Deserialize, Debug)]
struct LookupResult {
    postcode: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    admin_district: Option<String>,
    admin_ward: Option<String>,
    region: Option<String>,
    country: Option<String>,
}

/// postcodes.io lookup: `GET {url}/postcodes/{postcode}`.
pub struct PostcodesIoGeocoder {
    http_client: Box<dyn HttpClient>,
    url: String,
}

impl PostcodesIoGeocoder {
    pub fn new(http_client: Box<dyn HttpClient>, url: String) -> Self {
        Self { http_client, url }
    }

    fn lookup_url(&self, postcode: &Postcode) -> String {
        format!(
            "{}/postcodes/{}%20{}",
            self.url.trim_end_matches('/'),
            postcode.outward(),
            postcode.inward()
        )
    }
}

impl Geocoder for PostcodesIoGeocoder {
    fn geocode(&self, postcode: &Postcode) -> ApiFuture<GeocodedLocation> {
        let url = self.lookup_url(postcode);
        let requested = postcode.clone();
        debug!("Looking up postcode {}", postcode);
        Box::new(
            self.http_client
                .get(url, None)
                .map_err(|e| match error_kind(&e) {
                    Some(Error::HttpTimeout) => FailureError::from(e.context(Error::GeocoderTimeout)),
                    _ => FailureError::from(e.context(Error::GeocoderUnavailable)),
                })
                .and_then(move |response| location_from_response(&requested, &response)),
        )
    }
}

fn location_from_response(requested: &Postcode, response: &Response) -> Result<GeocodedLocation, FailureError> {
    if response.status == StatusCode::NotFound {
        info!("Postcode {} is not known to the lookup service", requested);
        return Err(format_err!("Postcode {} not found", requested)
            .context(Error::PostcodeNotFound)
            .into());
    }
    if !response.status.is_success() {
        return Err(format_err!("Postcode lookup answered {}: {}", response.status, response.body)
            .context(Error::GeocoderUnavailable)
            .into());
    }

    let lookup = response
        .parse::<LookupResponse>()
        .map_err(|e| FailureError::from(e.context("Malformed postcode lookup response").context(Error::GeocoderUnavailable)))?;
    let result = match (lookup.status, lookup.result) {
        (200, Some(result)) => result,
        (status, _) => {
            return Err(format_err!("Postcode {} lookup returned status {}", requested, status)
                .context(Error::PostcodeNotFound)
                .into())
        }
    };
    match (result.latitude, result.longitude) {
        (Some(latitude), Some(longitude)) => Ok(GeocodedLocation {
            postcode: result.postcode,
            latitude,
            longitude,
            district: result.admin_district,
            ward: result.admin_ward,
            region: result.region,
            country: result.country,
        }),
        _ => Err(format_err!("Postcode {} has no coordinates", requested)
            .context(Error::PostcodeNotFound)
            .into()),
    }
}
