use failure::{Error as FailureError, Fail};
use futures::Future;
use geo::Point as GeoPoint;
use hyper::header::{Authorization, Headers};
use hyper::{Method, StatusCode};

use super::ApiFuture;

use errors::{error_kind, Error};
use http::{HttpClient, Response};

/// Driving time between two (lng, lat) points.
pub trait TravelTimeOracle {
    fn duration_seconds(&self, from: GeoPoint<f64>, to: GeoPoint<f64>) -> ApiFuture<f64>;
}

#[derive(Serialize, Debug)]
struct MatrixRequest {
    locations: Vec<[f64; 2]>,
    metrics: Vec<&'static str>,
}

#[derive(Deserialize, Debug)]
struct MatrixResponse {
    durations: Vec<Vec<Option<f64>>>,
}

/// OpenRouteService matrix endpoint: `POST {url}/v2/matrix/{profile}`.
pub struct OpenRouteServiceOracle {
    http_client: Box<dyn HttpClient>,
    url: String,
    api_key: String,
    profile: String,
}

impl OpenRouteServiceOracle {
    pub fn new(http_client: Box<dyn HttpClient>, url: String, api_key: String, profile: String) -> Self {
        Self {
            http_client,
            url,
            api_key,
            profile,
        }
    }

    fn matrix_url(&self) -> String {
        format!("{}/v2/matrix/{}", self.url.trim_end_matches('/'), self.profile)
    }
}

impl TravelTimeOracle for OpenRouteServiceOracle {
    fn duration_seconds(&self, from: GeoPoint<f64>, to: GeoPoint<f64>) -> ApiFuture<f64> {
        let payload = MatrixRequest {
            locations: vec![[from.x(), from.y()], [to.x(), to.y()]],
            metrics: vec!["duration"],
        };
        let mut headers = Headers::new();
        headers.set(Authorization(self.api_key.clone()));

        debug!("Requesting driving duration from {:?} to {:?}", from.x_y(), to.x_y());
        Box::new(
            super::request(&*self.http_client, Method::Post, self.matrix_url(), Some(payload), Some(headers))
                .map_err(classify_transport_error)
                .and_then(|response| duration_from_response(&response)),
        )
    }
}

fn classify_transport_error(e: FailureError) -> FailureError {
    match error_kind(&e) {
        Some(Error::HttpTimeout) => e.context("Travel-time provider did not answer in time").context(Error::OracleTimeout).into(),
        _ => e.context("Travel-time provider is unreachable").context(Error::OracleUnexpected).into(),
    }
}

fn duration_from_response(response: &Response) -> Result<f64, FailureError> {
    let status = response.status.clone();
    match status {
        StatusCode::Unauthorized | StatusCode::Forbidden => {
            error!("Travel-time provider rejected the api key (status {})", status);
            return Err(format_err!("Travel-time api key is invalid or expired: {}", response.body)
                .context(Error::OracleAuth)
                .into());
        }
        StatusCode::RequestTimeout | StatusCode::GatewayTimeout => {
            return Err(format_err!("Travel-time provider timed out upstream (status {})", status)
                .context(Error::OracleTimeout)
                .into());
        }
        _ if !status.is_success() => {
            return Err(format_err!("Travel-time provider answered {}: {}", status, response.body)
                .context(Error::OracleUnexpected)
                .into());
        }
        _ => {}
    }

    let matrix = response
        .parse::<MatrixResponse>()
        .map_err(|e| FailureError::from(e.context("Malformed matrix response").context(Error::OracleUnexpected)))?;
    let seconds = matrix
        .durations
        .get(0)
        .and_then(|row| row.get(1))
        .cloned()
        .and_then(|cell| cell)
        .ok_or_else(|| FailureError::from(format_err!("No route between hub and destination").context(Error::OracleUnexpected)))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(format_err!("Travel-time provider returned invalid duration {}", seconds)
            .context(Error::OracleUnexpected)
            .into());
    }
    Ok(seconds)
}
