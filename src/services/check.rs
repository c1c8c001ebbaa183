use std::sync::Arc;

use failure::Error as FailureError;
use futures::future;
use futures::prelude::*;

use geometry::haversine_km;
use microservice::Geocoder;
use models::*;
use services::delivery::DeliveryZoneEvaluator;
use services::types::ServiceFuture;

/// Answer to "do you deliver to this postcode".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeliveryCheck {
    pub postcode: String,
    pub location: GeocodedLocation,
    pub delivery: DeliveryDecision,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostcodeDistance {
    pub from: String,
    pub to: String,
    pub km: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeliveryQuote {
    pub check: DeliveryCheck,
    pub quote: OrderQuote,
}

pub struct DeliveryCheckService {
    geocoder: Arc<dyn Geocoder>,
    evaluator: Arc<DeliveryZoneEvaluator>,
}

impl DeliveryCheckService {
    pub fn new(geocoder: Arc<dyn Geocoder>, evaluator: Arc<DeliveryZoneEvaluator>) -> Self {
        Self { geocoder, evaluator }
    }

    pub fn evaluator(&self) -> &DeliveryZoneEvaluator {
        &self.evaluator
    }

    /// Parses, geocodes and evaluates a customer postcode.
    pub fn check(&self, raw_postcode: &str) -> ServiceFuture<DeliveryCheck> {
        let postcode = match Postcode::parse(raw_postcode) {
            Ok(postcode) => postcode,
            Err(e) => return Box::new(future::err(e)),
        };
        let evaluator = self.evaluator.clone();
        let formatted = postcode.to_string();
        Box::new(self.geocoder.geocode(&postcode).and_then(move |location| {
            evaluator.evaluate_target(&location.target()).map(move |delivery| DeliveryCheck {
                postcode: formatted,
                location,
                delivery,
            })
        }))
    }

    /// Checks the postcode and prices the order; out-of-area postcodes are refused.
    pub fn quote(&self, raw_postcode: &str, subtotal: f64) -> ServiceFuture<DeliveryQuote> {
        Box::new(self.check(raw_postcode).and_then(move |check| -> Result<DeliveryQuote, FailureError> {
            let quote = quote_order(subtotal, &check.delivery)?;
            Ok(DeliveryQuote { check, quote })
        }))
    }

    /// Straight-line distance between two postcodes.
    pub fn distance(&self, from: &str, to: &str) -> ServiceFuture<PostcodeDistance> {
        let parsed = Postcode::parse(from).and_then(|from| Postcode::parse(to).map(|to| (from, to)));
        let (from, to) = match parsed {
            Ok(pair) => pair,
            Err(e) => return Box::new(future::err(e)),
        };
        let lookups = self.geocoder.geocode(&from).join(self.geocoder.geocode(&to));
        Box::new(lookups.map(move |(a, b)| {
            let km = haversine_km(&a.point(), &b.point());
            debug!("Distance {} -> {}: {} km", from, to, km);
            PostcodeDistance {
                from: from.to_string(),
                to: to.to_string(),
                km,
            }
        }))
    }
}
