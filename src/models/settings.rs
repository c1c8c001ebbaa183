use failure::Error as FailureError;

use errors::Error;

/// Extended tier for addresses past `max_minutes` in an allowed country.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UkDelivery {
    fee: f64,
    countries: Vec<String>,
}

impl UkDelivery {
    pub fn new(fee: f64, countries: Vec<String>) -> Result<Self, FailureError> {
        check_fee("uk_fee", fee)?;
        let countries: Vec<String> = countries
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        if countries.is_empty() {
            return Err(format_err!("uk_fee is set but uk_countries is empty")
                .context(Error::Configuration)
                .into());
        }
        Ok(Self { fee, countries })
    }

    pub fn fee(&self) -> f64 {
        self.fee
    }

    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    pub fn qualifies(&self, country: Option<&str>) -> bool {
        match country {
            Some(country) => self.countries.iter().any(|allowed| allowed.eq_ignore_ascii_case(country.trim())),
            None => false,
        }
    }
}

/// Small square around the hub that always gets free delivery.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EstateSettings {
    radius_degrees: f64,
    max_minutes: u32,
}

impl EstateSettings {
    pub fn new(radius_degrees: f64, max_minutes: u32) -> Result<Self, FailureError> {
        if !radius_degrees.is_finite() || radius_degrees <= 0.0 || radius_degrees >= 1.0 {
            return Err(format_err!("estate_radius_degrees must be in (0, 1), got {}", radius_degrees)
                .context(Error::Configuration)
                .into());
        }
        Ok(Self { radius_degrees, max_minutes })
    }

    pub fn radius_degrees(&self) -> f64 {
        self.radius_degrees
    }

    pub fn max_minutes(&self) -> u32 {
        self.max_minutes
    }
}

/// Validated thresholds and fees. Only constructible through `new`, so an
/// evaluator holding one never sees `free_minutes >= max_minutes`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeliverySettings {
    free_minutes: u32,
    max_minutes: u32,
    standard_fee: f64,
    uk: Option<UkDelivery>,
    estate: Option<EstateSettings>,
}

impl DeliverySettings {
    pub fn new(
        free_minutes: u32,
        max_minutes: u32,
        standard_fee: f64,
        uk: Option<UkDelivery>,
        estate: Option<EstateSettings>,
    ) -> Result<Self, FailureError> {
        if free_minutes >= max_minutes {
            return Err(format_err!(
                "free_minutes ({}) must be less than max_minutes ({})",
                free_minutes,
                max_minutes
            ).context(Error::Configuration)
                .into());
        }
        check_fee("standard_fee", standard_fee)?;
        Ok(Self {
            free_minutes,
            max_minutes,
            standard_fee,
            uk,
            estate,
        })
    }

    pub fn free_minutes(&self) -> u32 {
        self.free_minutes
    }

    pub fn max_minutes(&self) -> u32 {
        self.max_minutes
    }

    pub fn standard_fee(&self) -> f64 {
        self.standard_fee
    }

    pub fn uk(&self) -> Option<&UkDelivery> {
        self.uk.as_ref()
    }

    pub fn estate(&self) -> Option<&EstateSettings> {
        self.estate.as_ref()
    }
}

fn check_fee(name: &str, fee: f64) -> Result<(), FailureError> {
    if !fee.is_finite() || fee < 0.0 {
        return Err(format_err!("{} must be a non-negative amount, got {}", name, fee)
            .context(Error::Configuration)
            .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_fee_is_rejected() {
        assert!(DeliverySettings::new(7, 15, -1.0, None, None).is_err());
        assert!(DeliverySettings::new(7, 15, ::std::f64::INFINITY, None, None).is_err());
        assert!(DeliverySettings::new(7, 15, 0.0, None, None).is_ok());
    }

    #[test]
    fn uk_countries_match_ignoring_case() {
        let uk = UkDelivery::new(9.99, vec!["England".to_string(), " ".to_string()]).unwrap();
        assert_eq!(uk.countries().len(), 1);
        assert!(uk.qualifies(Some("england")));
        assert!(uk.qualifies(Some(" ENGLAND ")));
        assert!(!uk.qualifies(Some("Scotland")));
        assert!(!uk.qualifies(Some("Wales")));
        assert!(!uk.qualifies(None));
    }

    #[test]
    fn estate_radius_must_be_small_and_positive() {
        assert!(EstateSettings::new(0.0, 5).is_err());
        assert!(EstateSettings::new(2.0, 5).is_err());
        assert_eq!(EstateSettings::new(0.005, 5).unwrap().max_minutes(), 5);
    }
}
