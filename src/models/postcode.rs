use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use failure::Error as FailureError;
use regex::Regex;

use errors::Error;

lazy_static! {
    static ref POSTCODE_PATTERN: Result<Regex, ::regex::Error> = Regex::new(r"^[A-Z]{1,2}[0-9][A-Z0-9]?[0-9][A-Z]{2}$");
}

/// UK postcode stored compact and uppercase ("SW1A1AA"); displays spaced ("SW1A 1AA").
/// Deserializing goes through `parse`, so every value has a valid inward code.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct Postcode(String);

impl Postcode {
    pub fn parse(raw: &str) -> Result<Self, FailureError> {
        let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_uppercase();
        let pattern = POSTCODE_PATTERN.as_ref().map_err(|e| format_err!("{}", e))?;
        if !pattern.is_match(&compact) {
            return Err(format_err!("{:?} is not a UK postcode", raw)
                .context(Error::InvalidPostcode)
                .into());
        }
        Ok(Postcode(compact))
    }

    pub fn compact(&self) -> &str {
        &self.0
    }

    /// Outward code, e.g. "SW1A".
    pub fn outward(&self) -> &str {
        &self.0[..self.0.len() - 3]
    }

    /// Inward code, e.g. "1AA".
    pub fn inward(&self) -> &str {
        &self.0[self.0.len() - 3..]
    }
}

impl fmt::Display for Postcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.outward(), self.inward())
    }
}

impl TryFrom<String> for Postcode {
    type Error = FailureError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Postcode::parse(&raw)
    }
}

impl FromStr for Postcode {
    type Err = FailureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Postcode::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use errors::error_kind;

    #[test]
    fn normalizes_spacing_and_case() {
        let postcode = Postcode::parse(" sw1a1aa ").unwrap();
        assert_eq!(postcode.compact(), "SW1A1AA");
        assert_eq!(postcode.to_string(), "SW1A 1AA");
        assert_eq!(Postcode::parse("ls1   4ap").unwrap().to_string(), "LS1 4AP");
    }

    #[test]
    fn accepts_every_outward_shape() {
        for raw in &["M1 1AE", "B33 8TH", "CR2 6XH", "DN55 1PT", "W1A 0AX", "EC1A 1BB"] {
            assert!(Postcode::parse(raw).is_ok(), "{} should parse", raw);
        }
    }

    #[test]
    fn rejects_non_postcodes() {
        for raw in &["12345", "", "SW1A", "SW1A 1A", "1SW 1AA", "SW1A-1AA"] {
            let err = Postcode::parse(raw).unwrap_err();
            assert_eq!(error_kind(&err), Some(Error::InvalidPostcode));
        }
    }

    #[test]
    fn deserializing_validates() {
        let postcode: Postcode = ::serde_json::from_str("\"ls1 4ap\"").unwrap();
        assert_eq!(postcode.to_string(), "LS1 4AP");
        assert_eq!(::serde_json::to_string(&postcode).unwrap(), "\"LS14AP\"");
        assert!(::serde_json::from_str::<Postcode>("\"AB\"").is_err());
        assert!(::serde_json::from_str::<Postcode>("\"\"").is_err());
    }

    #[test]
    fn splits_inward_code() {
        let postcode: Postcode = "DN551PT".parse().unwrap();
        assert_eq!(postcode.outward(), "DN55");
        assert_eq!(postcode.inward(), "1PT");
    }
}
