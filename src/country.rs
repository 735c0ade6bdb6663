use std::collections::HashSet;

use crate::config::MaxspeedConfig;
use crate::speed::SpeedUnit;

/// Country metadata needed to read zone values.
pub trait CountryInfo {
    /// Speed units in use, the first one is authoritative. An empty list
    /// means km/h.
    fn speed_units(&self, country_code: &str) -> Vec<SpeedUnit>;

    fn speed_unit(&self, country_code: &str) -> SpeedUnit {
        self.speed_units(country_code)
            .first()
            .copied()
            .unwrap_or(SpeedUnit::Kmh)
    }
}

/// Country table built from configuration. Regions ("US-CA") fall back to
/// their country.
pub struct StaticCountryInfo {
    mph: HashSet<String>,
}

impl StaticCountryInfo {
    pub fn new(config: &MaxspeedConfig) -> Self {
        StaticCountryInfo {
            mph: config.mph_countries.iter().cloned().collect(),
        }
    }
}

impl Default for StaticCountryInfo {
    fn default() -> Self {
        StaticCountryInfo::new(&MaxspeedConfig::default())
    }
}

impl CountryInfo for StaticCountryInfo {
    fn speed_units(&self, country_code: &str) -> Vec<SpeedUnit> {
        let country = country_code.split('-').next().unwrap_or(country_code);
        if self.mph.contains(country_code) || self.mph.contains(country) {
            vec![SpeedUnit::Mph]
        } else {
            vec![SpeedUnit::Kmh]
        }
    }
}
