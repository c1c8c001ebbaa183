use std::convert::TryFrom;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use config_crate::{Config as RawConfig, ConfigError, Environment, File};
use failure::Error as FailureError;

use errors::Error;
use models::{DeliverySettings, EstateSettings, HubLocation, UkDelivery};

enum Env {
    Development,
    Test,
    Production,
}

impl Env {
    fn new() -> Self {
        match env::var("RUN_MODE") {
            Ok(ref s) if s == "test" => Env::Test,
            Ok(ref s) if s == "production" => Env::Production,
            _ => Env::Development,
        }
    }

    fn to_string(&self) -> &'static str {
        match self {
            &Env::Development => "development",
            &Env::Production => "production",
            &Env::Test => "test",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    TravelTime,
    Polygon,
}

impl FromStr for Strategy {
    type Err = FailureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "travel_time" => Ok(Strategy::TravelTime),
            "polygon" => Ok(Strategy::Polygon),
            other => Err(format_err!("Unknown zone strategy {:?}, expected travel_time or polygon", other)
                .context(Error::Configuration)
                .into()),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub hub_longitude: f64,
    pub hub_latitude: f64,
    pub hub_postcode: Option<String>,
    pub strategy: String,
    pub free_minutes: i64,
    pub max_minutes: i64,
    pub standard_fee: f64,
    pub uk_fee: Option<f64>,
    #[serde(default = "default_uk_countries")]
    pub uk_countries: Vec<String>,
    pub estate_radius_degrees: Option<f64>,
    pub estate_minutes: i64,
    pub oracle_url: String,
    pub oracle_api_key: Option<String>,
    pub oracle_profile: String,
    pub oracle_timeout_secs: i64,
    pub geocoder_url: String,
    pub geocoder_timeout_secs: i64,
    pub zones_file: Option<String>,
}

impl Config {
    /// Creates config from base.toml, which are overwritten by <env>.toml, where
    /// env is one of development, test, production. After that it could be overwritten
    /// by environment variables like DZE_HUB_LATITUDE (this will override `hub_latitude` field in config)
    pub fn new() -> Result<Self, ConfigError> {
        let env = Env::new();
        let mut s = RawConfig::new();

        s.set_default("strategy", "travel_time")?;
        s.set_default("free_minutes", 7i64)?;
        s.set_default("max_minutes", 15i64)?;
        s.set_default("standard_fee", 3.0f64)?;
        s.set_default("estate_minutes", 5i64)?;
        s.set_default("oracle_url", "http://api.openrouteservice.org")?;
        s.set_default("oracle_profile", "driving-car")?;
        s.set_default("oracle_timeout_secs", 15i64)?;
        s.set_default("geocoder_url", "http://api.postcodes.io")?;
        s.set_default("geocoder_timeout_secs", 10i64)?;

        s.merge(File::with_name("config/base"))?;
        // Optional file specific for environment
        s.merge(File::with_name(&format!("config/{}", env.to_string())).required(false))?;

        // Add in settings from the environment (with a prefix of DZE)
        s.merge(Environment::with_prefix("DZE"))?;

        s.try_into()
    }

    pub fn strategy(&self) -> Result<Strategy, FailureError> {
        self.strategy.parse()
    }

    /// Hub coordinate, rejected when it is not a real lng/lat pair.
    pub fn hub(&self) -> Result<HubLocation, FailureError> {
        HubLocation::new(self.hub_longitude, self.hub_latitude, self.hub_postcode.clone())
    }

    pub fn delivery_settings(&self) -> Result<DeliverySettings, FailureError> {
        let uk = match self.uk_fee {
            Some(fee) => Some(UkDelivery::new(fee, self.uk_countries.clone())?),
            None => None,
        };
        let estate = match self.estate_radius_degrees {
            Some(radius) => Some(EstateSettings::new(radius, minutes("estate_minutes", self.estate_minutes)?)?),
            None => None,
        };
        DeliverySettings::new(
            minutes("free_minutes", self.free_minutes)?,
            minutes("max_minutes", self.max_minutes)?,
            self.standard_fee,
            uk,
            estate,
        )
    }

    /// Api key for the travel-time provider, required by the time strategy.
    pub fn oracle_api_key(&self) -> Result<String, FailureError> {
        match self.oracle_api_key {
            Some(ref key) if !key.trim().is_empty() => Ok(key.clone()),
            _ => Err(format_err!("oracle_api_key is not configured").context(Error::Configuration).into()),
        }
    }

    pub fn oracle_timeout(&self) -> Result<Duration, FailureError> {
        bounded_timeout("oracle_timeout_secs", self.oracle_timeout_secs)
    }

    pub fn geocoder_timeout(&self) -> Result<Duration, FailureError> {
        bounded_timeout("geocoder_timeout_secs", self.geocoder_timeout_secs)
    }
}

fn default_uk_countries() -> Vec<String> {
    vec!["England".to_string()]
}

// Integers are read as i64 so a negative value is reported instead of wrapping.
fn minutes(key: &str, value: i64) -> Result<u32, FailureError> {
    u32::try_from(value).map_err(|_| {
        format_err!("{} must be a non-negative number of minutes, got {}", key, value)
            .context(Error::Configuration)
            .into()
    })
}

fn bounded_timeout(key: &str, secs: i64) -> Result<Duration, FailureError> {
    if secs < 1 || secs > 60 {
        return Err(format_err!("{} must be between 1 and 60 seconds, got {}", key, secs)
            .context(Error::Configuration)
            .into());
    }
    Ok(Duration::from_secs(secs as u64))
}
