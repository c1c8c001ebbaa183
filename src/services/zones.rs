use std::fs;
use std::path::Path;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use failure::{Error as FailureError, Fail};
use futures::future;
use serde_json;

use errors::Error;
use models::{Zone, ZoneDefinition, ZoneSet};
use services::types::ServiceFuture;

/// Persisted delivery zones, read as whole generations.
pub trait ZoneStore {
    /// Current generation, ordered by ascending fee.
    fn zones(&self) -> ServiceFuture<Arc<ZoneSet>>;
    /// Swaps in a new generation; readers see either the old set or the new one.
    fn replace_all(&self, zones: Vec<Zone>) -> ServiceFuture<Arc<ZoneSet>>;
}

/// Copy-swap store: the lock only guards the pointer swap.
pub struct InMemoryZoneStore {
    current: RwLock<Arc<ZoneSet>>,
}

impl InMemoryZoneStore {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(ZoneSet::empty())),
        }
    }

    pub fn snapshot(&self) -> Result<Arc<ZoneSet>, FailureError> {
        self.current
            .read()
            .map(|current| current.clone())
            .map_err(|_| format_err!("Zone store lock poisoned").context(Error::ZoneStore).into())
    }

    pub fn replace(&self, zones: Vec<Zone>) -> Result<Arc<ZoneSet>, FailureError> {
        let next = Arc::new(ZoneSet::new(zones, Utc::now()));
        let mut current = self
            .current
            .write()
            .map_err(|_| FailureError::from(format_err!("Zone store lock poisoned").context(Error::ZoneStore)))?;
        *current = next.clone();
        info!("Replaced delivery zones, {} zones now active", next.zones.len());
        Ok(next)
    }
}

impl Default for InMemoryZoneStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ZoneStore for InMemoryZoneStore {
    fn zones(&self) -> ServiceFuture<Arc<ZoneSet>> {
        Box::new(future::result(self.snapshot()))
    }

    fn replace_all(&self, zones: Vec<Zone>) -> ServiceFuture<Arc<ZoneSet>> {
        Box::new(future::result(self.replace(zones)))
    }
}

/// Reads a zone file produced by the offline regeneration step. Any bad
/// entry rejects the whole file so a partial generation is never loaded.
pub fn load_zone_file<P: AsRef<Path>>(path: P) -> Result<Vec<Zone>, FailureError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .map_err(|e| FailureError::from(e.context(format!("Cannot read zone file {}", path.display())).context(Error::Configuration)))?;
    parse_zones(&raw)
}

pub fn parse_zones(raw: &str) -> Result<Vec<Zone>, FailureError> {
    let definitions: Vec<ZoneDefinition> = serde_json::from_str(raw)
        .map_err(|e| FailureError::from(e.context("Malformed zone file").context(Error::Configuration)))?;
    definitions.into_iter().map(ZoneDefinition::into_zone).collect()
}

#[cfg(test)]
mod tests {
    use std::thread;

    use futures::Future;

    use super::*;
    use errors::error_kind;

    fn zone(name: &str, fee: f64) -> Zone {
        Zone::new(name.to_string(), fee, 10, vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]).unwrap()
    }

    #[test]
    fn starts_empty() {
        let store = InMemoryZoneStore::new();
        let set = store.zones().wait().unwrap();
        assert!(set.is_empty());
        assert!(set.generated_at.is_none());
    }

    #[test]
    fn replace_all_sorts_and_stamps() {
        let store = InMemoryZoneStore::new();
        store.replace_all(vec![zone("standard", 3.0), zone("free", 0.0)]).wait().unwrap();
        let set = store.zones().wait().unwrap();
        assert_eq!(set.zones[0].name, "free");
        assert_eq!(set.zones[1].name, "standard");
        assert!(set.generated_at.is_some());
    }

    #[test]
    fn held_snapshot_is_not_mutated_by_replace() {
        let store = InMemoryZoneStore::new();
        store.replace(vec![zone("old-a", 0.0), zone("old-b", 3.0)]).unwrap();
        let held = store.snapshot().unwrap();
        store.replace(vec![zone("new", 1.0)]).unwrap();
        assert_eq!(held.zones.len(), 2);
        assert!(held.zones.iter().all(|z| z.name.starts_with("old")));
        assert_eq!(store.snapshot().unwrap().zones.len(), 1);
    }

    #[test]
    fn readers_never_see_mixed_generations() {
        let store = Arc::new(InMemoryZoneStore::new());
        store.replace(vec![zone("a1", 0.0), zone("a2", 1.0), zone("a3", 2.0)]).unwrap();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || {
                    for _ in 0..500 {
                        let set = store.snapshot().unwrap();
                        let prefix = &set.zones[0].name[..1];
                        assert!(set.zones.iter().all(|z| z.name.starts_with(prefix)));
                        let expected = if prefix == "a" { 3 } else { 2 };
                        assert_eq!(set.zones.len(), expected);
                    }
                })
            })
            .collect();

        for i in 0..200 {
            if i % 2 == 0 {
                store.replace(vec![zone("b1", 0.0), zone("b2", 1.0)]).unwrap();
            } else {
                store.replace(vec![zone("a1", 0.0), zone("a2", 1.0), zone("a3", 2.0)]).unwrap();
            }
        }

        for reader in readers {
            reader.join().unwrap();
        }
    }

    #[test]
    fn parses_zone_file() {
        let raw = r#"[
            {"name": "Standard Delivery Zone", "fee": 3.0, "max_minutes": 15,
             "ring": [[-1.60, 53.75], [-1.50, 53.75], [-1.50, 53.85], [-1.60, 53.85]]},
            {"name": "Free Delivery Zone", "fee": 0.0, "max_minutes": 7,
             "ring": [[-1.56, 53.79], [-1.54, 53.79], [-1.54, 53.81], [-1.56, 53.81]]}
        ]"#;
        let zones = parse_zones(raw).unwrap();
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[1].max_minutes, 7);
    }

    #[test]
    fn one_bad_zone_rejects_the_file() {
        let raw = r#"[
            {"name": "ok", "fee": 0.0, "max_minutes": 7, "ring": [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]},
            {"name": "bad", "fee": 1.0, "max_minutes": 9, "ring": [[0.0, 0.0], [1.0, 1.0]]}
        ]"#;
        assert_eq!(error_kind(&parse_zones(raw).unwrap_err()), Some(Error::Configuration));
        assert_eq!(error_kind(&parse_zones("{").unwrap_err()), Some(Error::Configuration));
    }

    #[test]
    fn sample_zone_file_loads() {
        let store = InMemoryZoneStore::new();
        store.replace(load_zone_file("config/zones.sample.json").unwrap()).unwrap();
        let set = store.snapshot().unwrap();
        assert_eq!(set.zones.len(), 2);
        assert_eq!(set.zones[0].fee, 0.0);
    }

    #[test]
    fn missing_zone_file_is_configuration_error() {
        let err = load_zone_file("/nonexistent/zones.json").unwrap_err();
        assert_eq!(error_kind(&err), Some(Error::Configuration));
    }
}
