use serde::{Deserialize, Serialize};

use crate::error::MaxspeedError;
use crate::speed::Speed;

// ** Road classification **

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadType {
    Rural,
    Urban,
    Motorway,
    Trunk,
    LivingStreet,
    BicycleRoad,
    NslSingle,
    NslDual,
    NslRestricted,
    /// A road type literal this crate does not know. It has no tag value of
    /// its own and can only be kept, never written.
    Unknown,
}

impl RoadType {
    pub fn from_tag_value(value: &str) -> Self {
        match value {
            "rural" => RoadType::Rural,
            "urban" => RoadType::Urban,
            "motorway" => RoadType::Motorway,
            "trunk" => RoadType::Trunk,
            "living_street" => RoadType::LivingStreet,
            "bicycle_road" => RoadType::BicycleRoad,
            "nsl_single" => RoadType::NslSingle,
            "nsl_dual" => RoadType::NslDual,
            "nsl_restricted" => RoadType::NslRestricted,
            _ => RoadType::Unknown,
        }
    }

    pub fn tag_value(&self) -> Option<&'static str> {
        match self {
            RoadType::Rural => Some("rural"),
            RoadType::Urban => Some("urban"),
            RoadType::Motorway => Some("motorway"),
            RoadType::Trunk => Some("trunk"),
            RoadType::LivingStreet => Some("living_street"),
            RoadType::BicycleRoad => Some("bicycle_road"),
            RoadType::NslSingle => Some("nsl_single"),
            RoadType::NslDual => Some("nsl_dual"),
            RoadType::NslRestricted => Some("nsl_restricted"),
            RoadType::Unknown => None,
        }
    }
}

// ** Answers **

/// One decoded (or user supplied) piece of speed limit information.
///
/// Explicit values (`SignedSpeed`, `AdvisorySpeedSign`, `WalkSpeed`,
/// `NoLimit`) live on the explicit side of a [`MaxspeedAndType`], the
/// classifications on its type side. A `Zone` may appear on the explicit side
/// when a zone is written into the speed key and additionally signed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MaxSpeedAnswer {
    SignedSpeed { speed: Speed },
    AdvisorySpeedSign { speed: Speed },
    Zone { speed: Speed, country_code: String, zone_label: String },
    ImplicitSpeed { country_code: String, road_type: RoadType, lit: Option<bool> },
    LivingStreet { country_code: Option<String> },
    SchoolZone,
    WalkSpeed,
    NoLimit,
    JustSign,
    /// Tagging is present but contradictory or unreadable
    Invalid,
}

impl MaxSpeedAnswer {
    pub fn zone(speed: Speed, country_code: &str) -> Self {
        MaxSpeedAnswer::Zone {
            speed,
            country_code: country_code.to_string(),
            zone_label: format!("zone{}", speed.value()),
        }
    }

    pub fn implicit(country_code: &str, road_type: RoadType) -> Self {
        MaxSpeedAnswer::ImplicitSpeed {
            country_code: country_code.to_string(),
            road_type,
            lit: None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, MaxSpeedAnswer::Invalid)
    }

    pub fn is_living_street(&self) -> bool {
        matches!(self, MaxSpeedAnswer::LivingStreet { .. })
    }

    pub fn is_school_zone(&self) -> bool {
        matches!(self, MaxSpeedAnswer::SchoolZone)
    }

    pub fn country_code(&self) -> Option<&str> {
        match self {
            MaxSpeedAnswer::Zone { country_code, .. }
            | MaxSpeedAnswer::ImplicitSpeed { country_code, .. } => Some(country_code),
            MaxSpeedAnswer::LivingStreet { country_code } => country_code.as_deref(),
            _ => None,
        }
    }

    /// The number a zone stands for.
    pub fn implied_speed(&self) -> Option<Speed> {
        match self {
            MaxSpeedAnswer::Zone { speed, .. } => Some(*speed),
            _ => None,
        }
    }

    /// Equality that ignores the `lit` companion of implicit speeds, which is
    /// kept in a tag of its own.
    pub fn same_classification(&self, other: &MaxSpeedAnswer) -> bool {
        match (self, other) {
            (
                MaxSpeedAnswer::ImplicitSpeed { country_code: a, road_type: ra, .. },
                MaxSpeedAnswer::ImplicitSpeed { country_code: b, road_type: rb, .. },
            ) => a == b && ra == rb,
            _ => self == other,
        }
    }

    /// Value to put into a speed key.
    pub fn speed_tag_value(&self) -> Result<String, MaxspeedError> {
        match self {
            MaxSpeedAnswer::SignedSpeed { speed } | MaxSpeedAnswer::AdvisorySpeedSign { speed } => {
                Ok(speed.to_string())
            }
            MaxSpeedAnswer::WalkSpeed => Ok("walk".to_string()),
            MaxSpeedAnswer::NoLimit => Ok("none".to_string()),
            MaxSpeedAnswer::Zone { country_code, zone_label, .. } => {
                Ok(format_zone(country_code, zone_label))
            }
            other => Err(MaxspeedError::InvalidAnswer(format!(
                "{:?} cannot be written as a speed",
                other
            ))),
        }
    }

    /// Value to put into a type key. `zone_key` selects the bare-number zone
    /// form used by `zone:maxspeed` ("DE:30" instead of "DE:zone30").
    /// Classifications without a type literal yield `None`.
    pub fn type_tag_value(&self, zone_key: bool) -> Result<Option<String>, MaxspeedError> {
        match self {
            MaxSpeedAnswer::JustSign => Ok(Some("sign".to_string())),
            MaxSpeedAnswer::Zone { speed, country_code, zone_label } => Ok(Some(if zone_key {
                format_zone_key_value(country_code, *speed)
            } else {
                format_zone(country_code, zone_label)
            })),
            MaxSpeedAnswer::ImplicitSpeed { country_code, road_type, .. } => match road_type.tag_value() {
                Some(road_type) => Ok(Some(format!("{}:{}", country_code, road_type))),
                None => Err(MaxspeedError::UnknownRoadType(country_code.clone())),
            },
            MaxSpeedAnswer::LivingStreet { country_code } => Ok(country_code
                .as_ref()
                .map(|country_code| format!("{}:living_street", country_code))),
            MaxSpeedAnswer::SchoolZone => Ok(None),
            other => Err(MaxspeedError::InvalidAnswer(format!(
                "{:?} cannot be written as a speed limit type",
                other
            ))),
        }
    }
}

pub fn format_zone(country_code: &str, zone_label: &str) -> String {
    format!("{}:{}", country_code, zone_label)
}

pub fn format_zone_key_value(country_code: &str, speed: Speed) -> String {
    format!("{}:{}", country_code, speed.value())
}

// ** Per direction state **

/// The resolved state of one travel direction. Never constructed with both
/// sides empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaxspeedAndType {
    pub explicit: Option<MaxSpeedAnswer>,
    pub r#type: Option<MaxSpeedAnswer>,
}

impl MaxspeedAndType {
    pub fn new(explicit: Option<MaxSpeedAnswer>, r#type: Option<MaxSpeedAnswer>) -> Option<Self> {
        if explicit.is_none() && r#type.is_none() {
            None
        } else {
            Some(MaxspeedAndType { explicit, r#type })
        }
    }

    pub fn invalid() -> Self {
        MaxspeedAndType {
            explicit: Some(MaxSpeedAnswer::Invalid),
            r#type: Some(MaxSpeedAnswer::Invalid),
        }
    }

    pub fn is_invalid(&self) -> bool {
        self.explicit.as_ref().is_some_and(MaxSpeedAnswer::is_invalid)
            || self.r#type.as_ref().is_some_and(MaxSpeedAnswer::is_invalid)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardAndBackwardMaxspeedAndType {
    pub forward: Option<MaxspeedAndType>,
    pub backward: Option<MaxspeedAndType>,
}

impl ForwardAndBackwardMaxspeedAndType {
    pub fn both(value: MaxspeedAndType) -> Self {
        ForwardAndBackwardMaxspeedAndType {
            forward: Some(value.clone()),
            backward: Some(value),
        }
    }

    pub fn sides(&self) -> impl Iterator<Item = &MaxspeedAndType> {
        self.forward.iter().chain(self.backward.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_road_type_literals() {
        assert_eq!(RoadType::from_tag_value("nsl_dual"), RoadType::NslDual);
        assert_eq!(RoadType::from_tag_value("nsl_dual").tag_value(), Some("nsl_dual"));
        assert_eq!(RoadType::from_tag_value("motorroad"), RoadType::Unknown);
        assert_eq!(RoadType::Unknown.tag_value(), None);
    }

    #[test]
    fn test_zone_formats() {
        let zone = MaxSpeedAnswer::zone(Speed::Kmh(30), "DE");
        assert_eq!(zone.type_tag_value(false), Ok(Some("DE:zone30".to_string())));
        assert_eq!(zone.type_tag_value(true), Ok(Some("DE:30".to_string())));
        assert_eq!(zone.speed_tag_value(), Ok("DE:zone30".to_string()));
        assert_eq!(zone.implied_speed(), Some(Speed::Kmh(30)));
    }

    #[test]
    fn test_unknown_road_type_cannot_be_written() {
        let answer = MaxSpeedAnswer::implicit("DE", RoadType::Unknown);
        assert_eq!(
            answer.type_tag_value(false),
            Err(MaxspeedError::UnknownRoadType("DE".to_string()))
        );
    }

    #[test]
    fn test_same_classification_ignores_lit() {
        let lit = MaxSpeedAnswer::ImplicitSpeed {
            country_code: "GB".to_string(),
            road_type: RoadType::NslRestricted,
            lit: Some(true),
        };
        let unlit = MaxSpeedAnswer::implicit("GB", RoadType::NslRestricted);
        assert!(lit.same_classification(&unlit));
        assert_ne!(lit, unlit);
    }

    #[test]
    fn test_empty_pair_is_not_constructed() {
        assert_eq!(MaxspeedAndType::new(None, None), None);
        assert!(MaxspeedAndType::new(Some(MaxSpeedAnswer::NoLimit), None).is_some());
    }

    #[test]
    fn test_answer_json_shape() {
        let answer = MaxSpeedAnswer::SignedSpeed { speed: Speed::Mph(20) };
        let json = serde_json::to_value(&answer).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "signed_speed", "speed": "20 mph"}));
    }
}
