//! The fixed key vocabulary of speed limit tagging.

use serde::{Deserialize, Serialize};

pub const MAXSPEED: &str = "maxspeed";
pub const MAXSPEED_ADVISORY: &str = "maxspeed:advisory";
pub const MAXSPEED_ADVISED: &str = "maxspeed:advised";

pub const MAXSPEED_TYPE: &str = "maxspeed:type";
pub const SOURCE_MAXSPEED: &str = "source:maxspeed";
pub const ZONE_MAXSPEED: &str = "zone:maxspeed";
pub const ZONE_TRAFFIC: &str = "zone:traffic";

pub const HIGHWAY: &str = "highway";
pub const LIVING_STREET: &str = "living_street";
pub const HAZARD: &str = "hazard";
pub const LIT: &str = "lit";

pub const SCHOOL_ZONE: &str = "school_zone";

/// Synonym keys holding a speed value, primary key first.
pub const SPEED_KEYS: [&str; 3] = [MAXSPEED, MAXSPEED_ADVISORY, MAXSPEED_ADVISED];

/// Keys holding a speed limit type, in order of preference.
pub const TYPE_KEYS: [&str; 4] = [MAXSPEED_TYPE, SOURCE_MAXSPEED, ZONE_MAXSPEED, ZONE_TRAFFIC];

/// Suffixes for restricted variants of a speed key, e.g. maxspeed:lanes.
pub const QUALIFIERS: [&str; 4] = ["", ":conditional", ":lanes", ":lanes:conditional"];

pub const VEHICLE_TYPES: [&str; 26] = [
    "agricultural",
    "atv",
    "bdouble",
    "bicycle",
    "bus",
    "caravan",
    "coach",
    "goods",
    "hazmat",
    "hgv",
    "hgv_articulated",
    "minibus",
    "mofa",
    "moped",
    "motor_vehicle",
    "motorcar",
    "motorcycle",
    "motorhome",
    "psv",
    "school_bus",
    "small_electric_vehicle",
    "snowmobile",
    "speed_pedelec",
    "tourist_bus",
    "trailer",
    "vehicle",
];

/// Older keys for the date the speed limit was last checked.
pub const CHECK_DATE_SYNONYMS: [&str; 4] = [
    "maxspeed:check_date",
    "lastcheck:maxspeed",
    "last_checked:maxspeed",
    "maxspeed:lastcheck",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Forward, Direction::Backward];

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
        }
    }
}

/// "maxspeed" + hgv -> "maxspeed:hgv"
pub fn with_vehicle(base: &str, vehicle: Option<&str>) -> String {
    match vehicle {
        Some(vehicle) => format!("{}:{}", base, vehicle),
        None => base.to_string(),
    }
}

/// A key family member such as `maxspeed:hgv` + `:conditional`, which can be
/// spelled bare, with `:both`, or per direction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScopedKey {
    pub base: String,
    pub qualifier: &'static str,
}

impl ScopedKey {
    pub fn new(base: impl Into<String>, qualifier: &'static str) -> Self {
        ScopedKey { base: base.into(), qualifier }
    }

    pub fn bare(&self) -> String {
        format!("{}{}", self.base, self.qualifier)
    }

    pub fn both(&self) -> String {
        self.with_direction_part("both")
    }

    pub fn directional(&self, direction: Direction) -> String {
        self.with_direction_part(direction.as_str())
    }

    // lanes keys put the direction after ":lanes", everything else before the qualifier
    fn with_direction_part(&self, part: &str) -> String {
        match self.qualifier.strip_prefix(":lanes") {
            Some(rest) => format!("{}:lanes:{}{}", self.base, part, rest),
            None => format!("{}:{}{}", self.base, part, self.qualifier),
        }
    }
}

/// Given bases with the vehicle scope applied. Without a vehicle every
/// vehicle class variant belongs to the scope as well.
fn scoped_bases(bases: &[&str], vehicle: Option<&str>) -> Vec<String> {
    let mut result = Vec::new();
    for base in bases {
        match vehicle {
            Some(vehicle) => result.push(with_vehicle(base, Some(vehicle))),
            None => {
                result.push(base.to_string());
                result.extend(VEHICLE_TYPES.iter().map(|v| with_vehicle(base, Some(*v))));
            }
        }
    }
    result
}

/// Every speed key variant (synonyms, vehicle classes, conditional and lane
/// restrictions) belonging to the given vehicle scope.
pub fn speed_key_family(vehicle: Option<&str>) -> Vec<ScopedKey> {
    scoped_bases(&SPEED_KEYS, vehicle)
        .into_iter()
        .flat_map(|base| QUALIFIERS.iter().map(move |q| ScopedKey::new(base.clone(), *q)))
        .collect()
}

pub fn type_key_family(vehicle: Option<&str>) -> Vec<ScopedKey> {
    scoped_bases(&TYPE_KEYS, vehicle)
        .into_iter()
        .map(|base| ScopedKey::new(base, ""))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoped_key_spellings() {
        let key = ScopedKey::new("maxspeed:hgv", ":conditional");
        assert_eq!(key.bare(), "maxspeed:hgv:conditional");
        assert_eq!(key.both(), "maxspeed:hgv:both:conditional");
        assert_eq!(key.directional(Direction::Forward), "maxspeed:hgv:forward:conditional");

        let lanes = ScopedKey::new("maxspeed", ":lanes:conditional");
        assert_eq!(lanes.directional(Direction::Backward), "maxspeed:lanes:backward:conditional");
        assert_eq!(lanes.both(), "maxspeed:lanes:both:conditional");
    }

    #[test]
    fn test_family_includes_vehicles_only_without_scope() {
        let unscoped = speed_key_family(None);
        assert!(unscoped.contains(&ScopedKey::new("maxspeed:bus", ":lanes")));
        assert!(unscoped.contains(&ScopedKey::new("maxspeed:advisory", "")));

        let hgv = speed_key_family(Some("hgv"));
        assert!(hgv.contains(&ScopedKey::new("maxspeed:hgv", "")));
        assert!(!hgv.iter().any(|k| k.base == "maxspeed"));
        assert_eq!(hgv.len(), SPEED_KEYS.len() * QUALIFIERS.len());
    }

    #[test]
    fn test_type_family() {
        let family = type_key_family(Some("bus"));
        let bases: Vec<_> = family.iter().map(|k| k.bare()).collect();
        assert_eq!(
            bases,
            vec!["maxspeed:type:bus", "source:maxspeed:bus", "zone:maxspeed:bus", "zone:traffic:bus"]
        );
    }
}
