use chrono::{DateTime, Utc};

use super::{DeliverySettings, HubLocation};
use config::Strategy;

pub const FREE_ZONE_NAME: &str = "Free Delivery Zone";
pub const STANDARD_ZONE_NAME: &str = "Standard Delivery Zone";
pub const UK_ZONE_NAME: &str = "UK Delivery Zone";
pub const OUTSIDE_ZONE_NAME: &str = "Outside delivery area";
pub const UNCONFIGURED_ZONE_NAME: &str = "Delivery zones not configured";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionCode {
    ZonesNotConfigured,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeliveryDecision {
    pub in_delivery_area: bool,
    pub delivery_fee: Option<f64>,
    pub zone_name: String,
    pub max_distance_minutes: Option<u32>,
    pub actual_duration_minutes: Option<u32>,
    pub requires_enquiry: bool,
    pub code: Option<DecisionCode>,
    pub reason: String,
}

impl DeliveryDecision {
    pub fn deliverable(zone_name: &str, fee: f64, max_minutes: Option<u32>, duration: Option<u32>, reason: String) -> Self {
        Self {
            in_delivery_area: true,
            delivery_fee: Some(fee),
            zone_name: zone_name.to_string(),
            max_distance_minutes: max_minutes,
            actual_duration_minutes: duration,
            requires_enquiry: false,
            code: None,
            reason,
        }
    }

    pub fn outside(duration: Option<u32>, reason: String) -> Self {
        Self {
            in_delivery_area: false,
            delivery_fee: None,
            zone_name: OUTSIDE_ZONE_NAME.to_string(),
            max_distance_minutes: None,
            actual_duration_minutes: duration,
            requires_enquiry: true,
            code: None,
            reason,
        }
    }

    /// Operational gap rather than a real boundary, so it carries an explicit code.
    pub fn zones_not_configured() -> Self {
        Self {
            in_delivery_area: false,
            delivery_fee: None,
            zone_name: UNCONFIGURED_ZONE_NAME.to_string(),
            max_distance_minutes: None,
            actual_duration_minutes: None,
            requires_enquiry: true,
            code: Some(DecisionCode::ZonesNotConfigured),
            reason: "no delivery zones are configured".to_string(),
        }
    }
}

/// What a map or menu shows about one zone; polygons stay server side.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneSummary {
    pub name: String,
    pub delivery_fee: f64,
    pub max_distance_minutes: Option<u32>,
    pub description: String,
    pub has_polygon: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeliveryStatus {
    pub strategy: Strategy,
    pub hub: HubLocation,
    pub settings: DeliverySettings,
    pub oracle_configured: bool,
    pub zone_count: usize,
    pub zones_generated_at: Option<DateTime<Utc>>,
}

/// Pounds with pence, as shown to customers.
pub fn format_fee(fee: f64) -> String {
    format!("£{:.2}", fee)
}
