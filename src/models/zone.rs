use chrono::{DateTime, Utc};
use failure::Error as FailureError;
use geo::{LineString, Polygon};

use super::location::valid_coordinate;
use errors::Error;

/// Precomputed delivery area: a single ring, no holes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub name: String,
    pub fee: f64,
    pub max_minutes: u32,
    pub polygon: Polygon<f64>,
}

impl Zone {
    /// Builds a zone from (lng, lat) vertices; the ring is closed automatically.
    pub fn new(name: String, fee: f64, max_minutes: u32, ring: Vec<(f64, f64)>) -> Result<Self, FailureError> {
        if !fee.is_finite() || fee < 0.0 {
            return Err(format_err!("Zone {:?} has invalid fee {}", name, fee)
                .context(Error::Configuration)
                .into());
        }
        if ring.iter().any(|&(lng, lat)| !valid_coordinate(lng, lat)) {
            return Err(format_err!("Zone {:?} has a vertex outside lng/lat range", name)
                .context(Error::Configuration)
                .into());
        }
        let mut distinct: Vec<(f64, f64)> = Vec::with_capacity(ring.len());
        for vertex in &ring {
            if !distinct.contains(vertex) {
                distinct.push(*vertex);
            }
        }
        if distinct.len() < 3 {
            return Err(format_err!("Zone {:?} needs at least 3 distinct vertices", name)
                .context(Error::Configuration)
                .into());
        }
        Ok(Self {
            name,
            fee,
            max_minutes,
            polygon: Polygon::new(LineString::from(ring), vec![]),
        })
    }
}

/// Zone file entry written by the offline regeneration step.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ZoneDefinition {
    pub name: String,
    pub fee: f64,
    pub max_minutes: u32,
    pub ring: Vec<[f64; 2]>,
}

impl ZoneDefinition {
    pub fn into_zone(self) -> Result<Zone, FailureError> {
        let ring = self.ring.iter().map(|v| (v[0], v[1])).collect();
        Zone::new(self.name, self.fee, self.max_minutes, ring)
    }
}

/// Complete generation of zones; replaced whole, never edited in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneSet {
    pub zones: Vec<Zone>,
    pub generated_at: Option<DateTime<Utc>>,
}

impl ZoneSet {
    pub fn empty() -> Self {
        Self {
            zones: vec![],
            generated_at: None,
        }
    }

    /// Orders zones by ascending fee; ties keep their input order.
    pub fn new(mut zones: Vec<Zone>, generated_at: DateTime<Utc>) -> Self {
        zones.sort_by(|a, b| a.fee.partial_cmp(&b.fee).unwrap_or(::std::cmp::Ordering::Equal));
        Self {
            zones,
            generated_at: Some(generated_at),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}
