//! Delivery zone evaluation.
//!
//! `DeliveryZoneEvaluator` answers "can we deliver here and for how much".
//! The estate square around the hub is checked first and short-circuits
//! everything else; otherwise one `ZoneClassifier` decides, either by live
//! driving time from the hub or by containment in precomputed zone
//! polygons. Failures of the oracle or the zone store are returned as
//! errors and never turned into an "outside area" decision.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use failure::Error as FailureError;
use futures::future;
use futures::prelude::*;
use geo::{Point as GeoPoint, Polygon};

use config::Strategy;
use errors::{error_kind, Error};
use geometry::{polygon_contains, square_around};
use microservice::TravelTimeOracle;
use models::*;
use services::types::ServiceFuture;
use services::zones::ZoneStore;

/// What a classifier reports about itself for the status summary.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassifierInfo {
    pub strategy: Strategy,
    pub oracle_configured: bool,
    pub zone_count: usize,
    pub zones_generated_at: Option<DateTime<Utc>>,
}

pub trait ZoneClassifier {
    fn classify(&self, target: &DeliveryTarget) -> ServiceFuture<DeliveryDecision>;
    fn summaries(&self) -> ServiceFuture<Vec<ZoneSummary>>;
    fn info(&self) -> ServiceFuture<ClassifierInfo>;
}

/// Whole minutes, half a minute rounds up.
pub fn minutes_from_seconds(seconds: f64) -> u32 {
    (seconds / 60.0).round() as u32
}

/// Threshold comparison on already rounded minutes; lower tier wins ties.
pub fn classify_duration(settings: &DeliverySettings, minutes: u32, country: Option<&str>) -> DeliveryDecision {
    let free = settings.free_minutes();
    let max = settings.max_minutes();

    if minutes <= free {
        return DeliveryDecision::deliverable(
            FREE_ZONE_NAME,
            0.0,
            Some(free),
            Some(minutes),
            format!("{} min drive (<= {} min = free)", minutes, free),
        );
    }
    if minutes <= max {
        return DeliveryDecision::deliverable(
            STANDARD_ZONE_NAME,
            settings.standard_fee(),
            Some(max),
            Some(minutes),
            format!(
                "{} min drive ({}-{} min = {})",
                minutes,
                free + 1,
                max,
                format_fee(settings.standard_fee())
            ),
        );
    }

    match settings.uk() {
        Some(uk) if uk.qualifies(country) => DeliveryDecision::deliverable(
            UK_ZONE_NAME,
            uk.fee(),
            None,
            Some(minutes),
            format!(
                "{} min drive (> {} min, {} = {} UK delivery)",
                minutes,
                max,
                country.unwrap_or_default(),
                format_fee(uk.fee())
            ),
        ),
        Some(_) => DeliveryDecision::outside(
            Some(minutes),
            format!(
                "{} min drive (> {} min = outside area, {} not eligible for UK delivery)",
                minutes,
                max,
                country.unwrap_or("unknown country")
            ),
        ),
        None => DeliveryDecision::outside(Some(minutes), format!("{} min drive (> {} min = outside area)", minutes, max)),
    }
}

/// First zone, in ascending fee order, whose polygon holds the point.
pub fn classify_point(set: &ZoneSet, point: &GeoPoint<f64>) -> DeliveryDecision {
    if set.is_empty() {
        warn!("Delivery zones requested but none are configured");
        return DeliveryDecision::zones_not_configured();
    }
    match set.zones.iter().find(|zone| polygon_contains(&zone.polygon, point)) {
        Some(zone) => DeliveryDecision::deliverable(
            &zone.name,
            zone.fee,
            Some(zone.max_minutes),
            None,
            format!("inside {} (up to {} min = {})", zone.name, zone.max_minutes, format_fee(zone.fee)),
        ),
        None => DeliveryDecision::outside(None, format!("outside all {} delivery zones", set.zones.len())),
    }
}

fn describe(fee: f64, max_minutes: u32) -> String {
    if fee == 0.0 {
        format!("Free delivery within {} minutes drive", max_minutes)
    } else {
        format!("{} delivery within {} minutes drive", format_fee(fee), max_minutes)
    }
}

/// Live driving time from the hub against the configured thresholds.
pub struct TravelTimeClassifier {
    hub: HubLocation,
    settings: DeliverySettings,
    oracle: Arc<dyn TravelTimeOracle>,
}

impl TravelTimeClassifier {
    pub fn new(hub: HubLocation, settings: DeliverySettings, oracle: Arc<dyn TravelTimeOracle>) -> Self {
        Self { hub, settings, oracle }
    }
}

impl ZoneClassifier for TravelTimeClassifier {
    fn classify(&self, target: &DeliveryTarget) -> ServiceFuture<DeliveryDecision> {
        let settings = self.settings.clone();
        let country = target.country.clone();
        Box::new(
            self.oracle
                .duration_seconds(self.hub.location, target.location)
                .map(move |seconds| {
                    let minutes = minutes_from_seconds(seconds);
                    debug!("Driving time from hub: {}s, {} min", seconds, minutes);
                    classify_duration(&settings, minutes, country.as_ref().map(|c| c.as_str()))
                }),
        )
    }

    fn summaries(&self) -> ServiceFuture<Vec<ZoneSummary>> {
        let settings = &self.settings;
        let mut zones = vec![
            ZoneSummary {
                name: FREE_ZONE_NAME.to_string(),
                delivery_fee: 0.0,
                max_distance_minutes: Some(settings.free_minutes()),
                description: describe(0.0, settings.free_minutes()),
                has_polygon: false,
            },
            ZoneSummary {
                name: STANDARD_ZONE_NAME.to_string(),
                delivery_fee: settings.standard_fee(),
                max_distance_minutes: Some(settings.max_minutes()),
                description: describe(settings.standard_fee(), settings.max_minutes()),
                has_polygon: false,
            },
        ];
        if let Some(uk) = settings.uk() {
            zones.push(ZoneSummary {
                name: UK_ZONE_NAME.to_string(),
                delivery_fee: uk.fee(),
                max_distance_minutes: None,
                description: format!("{} delivery across {}", format_fee(uk.fee()), uk.countries().join(", ")),
                has_polygon: false,
            });
        }
        Box::new(future::ok(zones))
    }

    fn info(&self) -> ServiceFuture<ClassifierInfo> {
        Box::new(future::ok(ClassifierInfo {
            strategy: Strategy::TravelTime,
            oracle_configured: true,
            zone_count: if self.settings.uk().is_some() { 3 } else { 2 },
            zones_generated_at: None,
        }))
    }
}

/// Containment in stored zone polygons.
pub struct PolygonClassifier {
    store: Arc<dyn ZoneStore>,
}

impl PolygonClassifier {
    pub fn new(store: Arc<dyn ZoneStore>) -> Self {
        Self { store }
    }
}

impl ZoneClassifier for PolygonClassifier {
    fn classify(&self, target: &DeliveryTarget) -> ServiceFuture<DeliveryDecision> {
        let point = target.location;
        Box::new(self.store.zones().map(move |set| classify_point(&set, &point)))
    }

    fn summaries(&self) -> ServiceFuture<Vec<ZoneSummary>> {
        Box::new(self.store.zones().map(|set| {
            set.zones
                .iter()
                .map(|zone| ZoneSummary {
                    name: zone.name.clone(),
                    delivery_fee: zone.fee,
                    max_distance_minutes: Some(zone.max_minutes),
                    description: describe(zone.fee, zone.max_minutes),
                    has_polygon: true,
                })
                .collect()
        }))
    }

    fn info(&self) -> ServiceFuture<ClassifierInfo> {
        Box::new(self.store.zones().map(|set| ClassifierInfo {
            strategy: Strategy::Polygon,
            oracle_configured: false,
            zone_count: set.zones.len(),
            zones_generated_at: set.generated_at,
        }))
    }
}

pub struct DeliveryZoneEvaluator {
    hub: HubLocation,
    settings: DeliverySettings,
    estate: Option<Polygon<f64>>,
    classifier: Box<dyn ZoneClassifier>,
}

impl DeliveryZoneEvaluator {
    pub fn new(hub: HubLocation, settings: DeliverySettings, classifier: Box<dyn ZoneClassifier>) -> Self {
        let estate = settings
            .estate()
            .map(|estate| square_around(&hub.location, estate.radius_degrees()));
        Self {
            hub,
            settings,
            estate,
            classifier,
        }
    }

    pub fn travel_time(hub: HubLocation, settings: DeliverySettings, oracle: Arc<dyn TravelTimeOracle>) -> Self {
        let classifier = TravelTimeClassifier::new(hub.clone(), settings.clone(), oracle);
        Self::new(hub, settings, Box::new(classifier))
    }

    pub fn polygon(hub: HubLocation, settings: DeliverySettings, store: Arc<dyn ZoneStore>) -> Self {
        Self::new(hub, settings, Box::new(PolygonClassifier::new(store)))
    }

    pub fn hub(&self) -> &HubLocation {
        &self.hub
    }

    pub fn settings(&self) -> &DeliverySettings {
        &self.settings
    }

    pub fn is_in_free_estate(&self, latitude: f64, longitude: f64) -> bool {
        self.in_estate(&GeoPoint::new(longitude, latitude))
    }

    fn in_estate(&self, point: &GeoPoint<f64>) -> bool {
        match self.estate {
            Some(ref square) => polygon_contains(square, point),
            None => false,
        }
    }

    pub fn evaluate(&self, latitude: f64, longitude: f64) -> ServiceFuture<DeliveryDecision> {
        self.evaluate_target(&DeliveryTarget::new(latitude, longitude))
    }

    pub fn evaluate_target(&self, target: &DeliveryTarget) -> ServiceFuture<DeliveryDecision> {
        debug!("Evaluating delivery for {:?}", target);
        if self.in_estate(&target.location) {
            let max_minutes = self.settings.estate().map(|estate| estate.max_minutes());
            let decision = DeliveryDecision::deliverable(
                FREE_ZONE_NAME,
                0.0,
                max_minutes,
                None,
                "within the hub estate (free delivery)".to_string(),
            );
            info!("Delivery decision for {:?}: {}", target.location.x_y(), decision.reason);
            return Box::new(future::ok(decision));
        }

        let location = target.location.x_y();
        Box::new(
            self.classifier
                .classify(target)
                .map(move |decision| {
                    info!("Delivery decision for {:?}: {} ({})", location, decision.zone_name, decision.reason);
                    decision
                })
                .map_err(move |e| {
                    match error_kind(&e) {
                        Some(Error::OracleAuth) => error!("Delivery check for {:?} failed, travel-time credentials rejected", location),
                        Some(ref kind) if kind.is_transient() => warn!("Delivery check for {:?} timed out, caller may retry", location),
                        _ => warn!("Delivery check for {:?} failed: {}", location, e),
                    }
                    FailureError::from(e.context("Evaluating delivery zone failed"))
                }),
        )
    }

    pub fn delivery_zones(&self) -> ServiceFuture<Vec<ZoneSummary>> {
        self.classifier.summaries()
    }

    pub fn status(&self) -> ServiceFuture<DeliveryStatus> {
        let hub = self.hub.clone();
        let settings = self.settings.clone();
        Box::new(self.classifier.info().map(move |info| DeliveryStatus {
            strategy: info.strategy,
            hub,
            settings,
            oracle_configured: info.oracle_configured,
            zone_count: info.zone_count,
            zones_generated_at: info.zones_generated_at,
        }))
    }
}
