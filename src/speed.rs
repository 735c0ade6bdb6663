use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::patterns;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedUnit {
    Kmh,
    Mph,
}

/// A speed limit magnitude together with its unit.
///
/// Two speeds are only equal if both unit and magnitude match, there is no
/// conversion between km/h and mph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Speed {
    Kmh(u32),
    Mph(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a speed value: {0:?}")]
pub struct ParseSpeedError(pub String);

impl Speed {
    pub fn new(value: u32, unit: SpeedUnit) -> Self {
        match unit {
            SpeedUnit::Kmh => Speed::Kmh(value),
            SpeedUnit::Mph => Speed::Mph(value),
        }
    }

    pub fn value(&self) -> u32 {
        match *self {
            Speed::Kmh(v) | Speed::Mph(v) => v,
        }
    }

    pub fn unit(&self) -> SpeedUnit {
        match self {
            Speed::Kmh(_) => SpeedUnit::Kmh,
            Speed::Mph(_) => SpeedUnit::Mph,
        }
    }

    pub fn is_mph(&self) -> bool {
        self.unit() == SpeedUnit::Mph
    }
}

// Tag value form: "50" for km/h, "50 mph" for mph
impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speed::Kmh(v) => write!(f, "{}", v),
            Speed::Mph(v) => write!(f, "{} mph", v),
        }
    }
}

impl FromStr for Speed {
    type Err = ParseSpeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(mph) = patterns::mph_value(s) {
            return Ok(Speed::Mph(mph));
        }
        if patterns::is_plain_number(s) {
            return s
                .parse()
                .map(Speed::Kmh)
                .map_err(|_| ParseSpeedError(s.to_string()));
        }
        Err(ParseSpeedError(s.to_string()))
    }
}

impl Serialize for Speed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Speed {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kmh_and_mph() {
        assert_eq!("50".parse(), Ok(Speed::Kmh(50)));
        assert_eq!("20 mph".parse(), Ok(Speed::Mph(20)));
        assert_eq!("20mph".parse(), Ok(Speed::Mph(20)));
    }

    #[test]
    fn test_unsupported_units_are_rejected() {
        assert!("10 knots".parse::<Speed>().is_err());
        assert!("12.5".parse::<Speed>().is_err());
        assert!("walk".parse::<Speed>().is_err());
        assert!("".parse::<Speed>().is_err());
    }

    #[test]
    fn test_display_keeps_unit() {
        assert_eq!(Speed::Kmh(30).to_string(), "30");
        assert_eq!(Speed::Mph(20).to_string(), "20 mph");
        assert_ne!(Speed::Kmh(20), Speed::Mph(20));
    }

    #[test]
    fn test_serde_as_tag_string() {
        let json = serde_json::to_string(&Speed::Mph(15)).unwrap();
        assert_eq!(json, "\"15 mph\"");
        let speed: Speed = serde_json::from_str("\"70\"").unwrap();
        assert_eq!(speed, Speed::Kmh(70));
    }
}
