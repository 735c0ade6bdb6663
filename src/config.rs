use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaxspeedConfig {
    /// `source:maxspeed` survey notes that may be dropped when the speed limit
    /// is answered anew. Any other non-type value there is kept as provenance.
    pub deletable_source_values: Vec<String>,
    /// Countries (or regions) whose speed signs are in mph.
    pub mph_countries: Vec<String>,
    pub check_date_key: String,
}

impl Default for MaxspeedConfig {
    fn default() -> Self {
        MaxspeedConfig {
            deletable_source_values: [
                "survey",
                "local_knowledge",
                "on_the_ground",
                "ground_truth",
                "markings",
                "observation",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            mph_countries: [
                "GB", "US", "LR", "MM", "GG", "IM", "JE", "AS", "GU", "MP", "PR", "VI", "BS",
                "BZ", "AG", "DM", "GD", "KN", "LC", "VC", "WS", "FK", "KY", "VG", "TC", "MS",
                "AI", "SH",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            check_date_key: "check_date:maxspeed".to_string(),
        }
    }
}

impl MaxspeedConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn is_deletable_source_value(&self, value: &str) -> bool {
        self.deletable_source_values.iter().any(|v| v == value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = MaxspeedConfig::from_json(r#"{"deletable_source_values": ["survey"]}"#).unwrap();
        assert_eq!(config.deletable_source_values, vec!["survey".to_string()]);
        assert_eq!(config.check_date_key, "check_date:maxspeed");
        assert!(config.mph_countries.contains(&"GB".to_string()));
    }

    #[test]
    fn test_deletable_source_values() {
        let config = MaxspeedConfig::default();
        assert!(config.is_deletable_source_value("survey"));
        assert!(!config.is_deletable_source_value("Stadt Hamburg, Verkehrsbehörde"));
    }
}
