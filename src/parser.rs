//! Reading speed limit tagging into [`ForwardAndBackwardMaxspeedAndType`].
//!
//! Every relevant key is first expanded into its `:forward`/`:backward`
//! spelling, then each direction is decoded on its own.

use crate::changes::Tags;
use crate::country::CountryInfo;
use crate::keys::{
    self, Direction, ScopedKey, HAZARD, HIGHWAY, LIT, LIVING_STREET, MAXSPEED, MAXSPEED_ADVISED,
    MAXSPEED_ADVISORY, SCHOOL_ZONE, SOURCE_MAXSPEED, SPEED_KEYS, TYPE_KEYS,
};
use crate::patterns;
use crate::speed::Speed;
use crate::types::{ForwardAndBackwardMaxspeedAndType, MaxSpeedAnswer, MaxspeedAndType, RoadType};
use crate::MaxspeedTagging;

/// Outcome of resolving the type keys of one direction.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ResolvedType {
    pub answer: Option<MaxSpeedAnswer>,
    /// Key (without direction or vehicle) the type was read from
    pub key: Option<&'static str>,
}

/// Decoded state of one direction plus which keys it was read from, so that
/// the encoder can write back into the same keys.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct DirectionState {
    pub result: Option<MaxspeedAndType>,
    pub type_key: Option<&'static str>,
    pub speed_key: Option<&'static str>,
}

/// Read access to one direction of expanded tags within a vehicle scope.
struct DirectionView<'a> {
    tags: &'a Tags,
    direction: Direction,
    vehicle: Option<&'a str>,
}

impl<'a> DirectionView<'a> {
    fn get(&self, base: &str) -> Option<&'a str> {
        let key = ScopedKey::new(keys::with_vehicle(base, self.vehicle), "");
        self.tags
            .get(&key.directional(self.direction))
            .map(String::as_str)
    }
}

fn relevant_keys(vehicle: Option<&str>) -> Vec<ScopedKey> {
    SPEED_KEYS
        .iter()
        .chain(TYPE_KEYS.iter())
        .map(|base| ScopedKey::new(keys::with_vehicle(base, vehicle), ""))
        .collect()
}

/// Copies bare and `:both` values into both directional keys. Values that
/// are already tagged per direction take precedence.
pub(crate) fn expand_directions(tags: &Tags, vehicle: Option<&str>) -> Tags {
    let mut expanded = tags.clone();
    for key in relevant_keys(vehicle) {
        let combined = tags.get(&key.bare()).or_else(|| tags.get(&key.both()));
        if let Some(value) = combined {
            for direction in Direction::ALL {
                expanded
                    .entry(key.directional(direction))
                    .or_insert_with(|| value.clone());
            }
        }
    }
    expanded
}

pub(crate) fn is_school_zone(tags: &Tags) -> bool {
    tags.get(HAZARD).map(String::as_str) == Some(SCHOOL_ZONE)
}

pub(crate) fn is_living_street(tags: &Tags) -> bool {
    tags.get(HIGHWAY).map(String::as_str) == Some(LIVING_STREET)
        || tags.get(LIVING_STREET).map(String::as_str) == Some("yes")
}

fn parse_lit(tags: &Tags) -> Option<bool> {
    match tags.get(LIT).map(String::as_str) {
        Some("yes") => Some(true),
        Some("no") => Some(false),
        _ => None,
    }
}

/// Reads the value of a speed key. Values that are no speed at all are
/// `Invalid` here, the caller may still reinterpret them as a type.
pub fn parse_explicit(value: &str) -> MaxSpeedAnswer {
    match value {
        "walk" => MaxSpeedAnswer::WalkSpeed,
        "none" => MaxSpeedAnswer::NoLimit,
        _ => match value.parse::<Speed>() {
            Ok(speed) => MaxSpeedAnswer::SignedSpeed { speed },
            Err(_) => MaxSpeedAnswer::Invalid,
        },
    }
}

impl<C: CountryInfo> MaxspeedTagging<C> {
    /// Classifies a type key value. `None` if the value is no type at all.
    pub fn classify_type(&self, value: &str) -> Option<MaxSpeedAnswer> {
        if value == "sign" {
            return Some(MaxSpeedAnswer::JustSign);
        }
        self.classify_country_value(value)
    }

    /// Zone or implicit speed written as "CC:..."
    fn classify_country_value(&self, value: &str) -> Option<MaxSpeedAnswer> {
        if let Some((country_code, number)) = patterns::zone(value) {
            let speed = Speed::new(number, self.countries.speed_unit(country_code));
            return Some(MaxSpeedAnswer::zone(speed, country_code));
        }
        if let Some(country_code) = patterns::living_street_country(value) {
            return Some(MaxSpeedAnswer::implicit(country_code, RoadType::LivingStreet));
        }
        let (country_code, road_type) = patterns::implicit(value)?;
        Some(MaxSpeedAnswer::implicit(
            country_code,
            RoadType::from_tag_value(road_type),
        ))
    }

    fn is_type_value(&self, value: &str) -> bool {
        self.classify_type(value).is_some()
    }

    /// Whether the value of a `source:maxspeed` key may be deleted when the
    /// type tagging is rewritten.
    pub(crate) fn is_deletable_source(&self, value: &str) -> bool {
        self.is_type_value(value) || self.config.is_deletable_source_value(value)
    }

    fn resolve_type(&self, view: &DirectionView) -> ResolvedType {
        let mut found: Vec<(&'static str, MaxSpeedAnswer)> = Vec::new();
        for key in TYPE_KEYS {
            let Some(value) = view.get(key) else {
                continue;
            };
            match self.classify_type(value) {
                Some(MaxSpeedAnswer::JustSign) if key == keys::ZONE_MAXSPEED || key == keys::ZONE_TRAFFIC => {
                    found.push((key, MaxSpeedAnswer::Invalid))
                }
                Some(answer) => found.push((key, answer)),
                // provenance text, not a type
                None if key == SOURCE_MAXSPEED => {}
                None => found.push((key, MaxSpeedAnswer::Invalid)),
            }
        }
        let Some((key, first)) = found.first().cloned() else {
            return ResolvedType { answer: None, key: None };
        };
        if found.iter().all(|(_, answer)| *answer == first) {
            ResolvedType {
                answer: Some(first),
                key: Some(key),
            }
        } else {
            log::warn!("Contradicting speed limit types: {:?}", found);
            ResolvedType {
                answer: Some(MaxSpeedAnswer::Invalid),
                key: None,
            }
        }
    }

    fn parse_direction(
        &self,
        tags: &Tags,
        expanded: &Tags,
        direction: Direction,
        vehicle: Option<&str>,
    ) -> DirectionState {
        let view = DirectionView { tags: expanded, direction, vehicle };
        let school_zone = vehicle.is_none() && is_school_zone(tags);
        let living_street = vehicle.is_none() && is_living_street(tags);

        let speed_value = view.get(MAXSPEED);
        let advisory = view
            .get(MAXSPEED_ADVISORY)
            .map(|v| (MAXSPEED_ADVISORY, v))
            .or_else(|| view.get(MAXSPEED_ADVISED).map(|v| (MAXSPEED_ADVISED, v)));
        let has_type_key = TYPE_KEYS.iter().any(|key| view.get(key).is_some());

        if speed_value.is_none() && advisory.is_none() && !has_type_key && !school_zone && !living_street {
            return DirectionState { result: None, type_key: None, speed_key: None };
        }

        let resolved = self.resolve_type(&view);
        let mut type_key = resolved.key;
        let mut r#type = resolved.answer;

        let (mut explicit, speed_key) = match (speed_value, advisory) {
            (Some(value), _) => (Some(parse_explicit(value)), Some(MAXSPEED)),
            (None, Some((key, value))) => {
                let answer = match value.parse::<Speed>() {
                    Ok(speed) => MaxSpeedAnswer::AdvisorySpeedSign { speed },
                    Err(_) => MaxSpeedAnswer::Invalid,
                };
                (Some(answer), Some(key))
            }
            (None, None) => (None, None),
        };

        // the speed key sometimes holds a type, e.g. maxspeed=DE:urban
        if let Some(value) = speed_value.filter(|_| explicit == Some(MaxSpeedAnswer::Invalid)) {
            if let Some(as_type) = self.classify_country_value(value) {
                if matches!(as_type, MaxSpeedAnswer::Zone { .. }) && r#type == Some(MaxSpeedAnswer::JustSign) {
                    // a zone that is additionally signed
                    let result = self.apply_overlays(Some(as_type), r#type, school_zone, living_street);
                    return DirectionState { result, type_key, speed_key };
                }
                explicit = None;
                r#type = match r#type {
                    None => {
                        type_key = Some(MAXSPEED);
                        Some(as_type)
                    }
                    Some(t) if t == as_type => Some(t),
                    Some(_) => Some(MaxSpeedAnswer::Invalid),
                };
            }
        }

        if r#type == Some(MaxSpeedAnswer::JustSign)
            && !matches!(
                explicit,
                Some(MaxSpeedAnswer::SignedSpeed { .. } | MaxSpeedAnswer::WalkSpeed | MaxSpeedAnswer::NoLimit)
            )
        {
            r#type = Some(MaxSpeedAnswer::Invalid);
        }

        if let Some(implied) = r#type.as_ref().and_then(MaxSpeedAnswer::implied_speed) {
            match &explicit {
                None => {}
                Some(MaxSpeedAnswer::SignedSpeed { speed }) if *speed == implied => explicit = None,
                Some(_) => {
                    // cannot tell which of the two is right
                    explicit = Some(MaxSpeedAnswer::Invalid);
                    r#type = Some(MaxSpeedAnswer::Invalid);
                }
            }
        }

        if let Some(MaxSpeedAnswer::ImplicitSpeed { lit, .. }) = r#type.as_mut() {
            *lit = parse_lit(tags);
        }

        let result = self.apply_overlays(explicit, r#type, school_zone, living_street);
        DirectionState { result, type_key, speed_key }
    }

    /// School zone and living street are reported as the type, and an
    /// `Invalid` on one side spreads to the other.
    fn apply_overlays(
        &self,
        explicit: Option<MaxSpeedAnswer>,
        r#type: Option<MaxSpeedAnswer>,
        school_zone: bool,
        living_street: bool,
    ) -> Option<MaxspeedAndType> {
        let r#type = if school_zone {
            Some(MaxSpeedAnswer::SchoolZone)
        } else if living_street {
            let country_code = r#type
                .as_ref()
                .and_then(MaxSpeedAnswer::country_code)
                .map(str::to_string);
            match r#type {
                Some(MaxSpeedAnswer::Invalid) => Some(MaxSpeedAnswer::Invalid),
                _ => Some(MaxSpeedAnswer::LivingStreet { country_code }),
            }
        } else {
            r#type
        };

        let explicit_invalid = explicit.as_ref().is_some_and(MaxSpeedAnswer::is_invalid);
        let type_invalid = r#type.as_ref().is_some_and(MaxSpeedAnswer::is_invalid);
        let (explicit, r#type) = if explicit_invalid || type_invalid {
            log::warn!("Unresolvable speed limit tagging: {:?} / {:?}", explicit, r#type);
            (
                explicit.map(|_| MaxSpeedAnswer::Invalid),
                r#type.map(|_| MaxSpeedAnswer::Invalid),
            )
        } else {
            (explicit, r#type)
        };
        MaxspeedAndType::new(explicit, r#type)
    }

    pub(crate) fn parse_states(&self, tags: &Tags, vehicle: Option<&str>) -> [DirectionState; 2] {
        let expanded = expand_directions(tags, vehicle);
        Direction::ALL.map(|direction| self.parse_direction(tags, &expanded, direction, vehicle))
    }

    /// A combined key next to per direction keys that both say something
    /// else.
    fn is_overtagged(&self, tags: &Tags, vehicle: Option<&str>) -> bool {
        relevant_keys(vehicle).iter().any(|key| {
            let Some(combined) = tags.get(&key.bare()).or_else(|| tags.get(&key.both())) else {
                return false;
            };
            let forward = tags.get(&key.directional(Direction::Forward));
            let backward = tags.get(&key.directional(Direction::Backward));
            match (forward, backward) {
                (Some(forward), Some(backward)) => forward != combined || backward != combined,
                _ => false,
            }
        })
    }

    /// Decodes the speed limit of a way, optionally for one vehicle class
    /// only (`maxspeed:hgv` etc.). `None` if there is no speed limit tagging.
    pub fn parse(&self, tags: &Tags, vehicle: Option<&str>) -> Option<ForwardAndBackwardMaxspeedAndType> {
        let [forward, backward] = self.parse_states(tags, vehicle);
        let (mut forward, mut backward) = (forward.result, backward.result);

        if forward.is_some() && forward == backward && self.is_overtagged(tags, vehicle) {
            log::warn!("Speed limit is tagged both combined and per direction");
            forward = Some(MaxspeedAndType::invalid());
            backward = Some(MaxspeedAndType::invalid());
        }

        log::debug!("Parsed speed limit forward {:?}, backward {:?}", forward, backward);
        if forward.is_none() && backward.is_none() {
            None
        } else {
            Some(ForwardAndBackwardMaxspeedAndType { forward, backward })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speed::Speed;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn parse(pairs: &[(&str, &str)]) -> Option<ForwardAndBackwardMaxspeedAndType> {
        MaxspeedTagging::default().parse(&tags(pairs), None)
    }

    fn both(explicit: Option<MaxSpeedAnswer>, r#type: Option<MaxSpeedAnswer>) -> Option<ForwardAndBackwardMaxspeedAndType> {
        Some(ForwardAndBackwardMaxspeedAndType::both(MaxspeedAndType { explicit, r#type }))
    }

    fn sign(speed: Speed) -> Option<MaxSpeedAnswer> {
        Some(MaxSpeedAnswer::SignedSpeed { speed })
    }

    fn invalid() -> Option<MaxSpeedAnswer> {
        Some(MaxSpeedAnswer::Invalid)
    }

    #[test]
    fn test_no_tagging() {
        assert_eq!(parse(&[]), None);
        assert_eq!(parse(&[("highway", "residential"), ("source:name", "survey")]), None);
    }

    #[test]
    fn test_explicit_speeds() {
        assert_eq!(parse(&[("maxspeed", "50")]), both(sign(Speed::Kmh(50)), None));
        assert_eq!(parse(&[("maxspeed", "20 mph")]), both(sign(Speed::Mph(20)), None));
        assert_eq!(parse(&[("maxspeed", "walk")]), both(Some(MaxSpeedAnswer::WalkSpeed), None));
        assert_eq!(parse(&[("maxspeed", "none")]), both(Some(MaxSpeedAnswer::NoLimit), None));
        assert_eq!(parse(&[("maxspeed", "10 knots")]), both(invalid(), None));
    }

    #[test]
    fn test_advisory_speed() {
        assert_eq!(
            parse(&[("maxspeed:advisory", "40")]),
            both(Some(MaxSpeedAnswer::AdvisorySpeedSign { speed: Speed::Kmh(40) }), None)
        );
        assert_eq!(parse(&[("maxspeed:advised", "fast")]), both(invalid(), None));
    }

    #[test]
    fn test_implicit_type_in_any_type_key() {
        let urban = Some(MaxSpeedAnswer::implicit("DE", RoadType::Urban));
        for key in ["maxspeed:type", "source:maxspeed", "zone:maxspeed", "zone:traffic", "maxspeed"] {
            assert_eq!(parse(&[(key, "DE:urban")]), both(None, urban.clone()), "{}", key);
        }
    }

    #[test]
    fn test_zone_forms_and_units() {
        let zone30 = Some(MaxSpeedAnswer::zone(Speed::Kmh(30), "DE"));
        assert_eq!(parse(&[("maxspeed:type", "DE:zone30")]), both(None, zone30.clone()));
        assert_eq!(parse(&[("zone:maxspeed", "DE:30")]), both(None, zone30.clone()));
        assert_eq!(parse(&[("maxspeed", "30"), ("zone:maxspeed", "DE:30")]), both(None, zone30));
        assert_eq!(
            parse(&[("maxspeed:type", "GB:zone20")]),
            both(None, Some(MaxSpeedAnswer::zone(Speed::Mph(20), "GB")))
        );
    }

    #[test]
    fn test_zone_conflicting_with_explicit_speed() {
        assert_eq!(parse(&[("maxspeed", "20"), ("zone:maxspeed", "DE:30")]), both(invalid(), invalid()));
        assert_eq!(parse(&[("maxspeed", "30 mph"), ("maxspeed:type", "DE:zone30")]), both(invalid(), invalid()));
    }

    #[test]
    fn test_contradicting_type_keys() {
        assert_eq!(
            parse(&[("maxspeed:type", "DE:urban"), ("source:maxspeed", "DE:rural")]),
            both(None, invalid())
        );
        assert_eq!(parse(&[("maxspeed", "50"), ("zone:traffic", "sign")]), both(invalid(), invalid()));
        assert_eq!(
            parse(&[("maxspeed:type", "DE:urban"), ("source:maxspeed", "DE:urban")]),
            both(None, Some(MaxSpeedAnswer::implicit("DE", RoadType::Urban)))
        );
    }

    #[test]
    fn test_source_provenance_is_not_a_type() {
        assert_eq!(
            parse(&[("maxspeed", "70"), ("source:maxspeed", "survey"), ("maxspeed:type", "sign")]),
            both(sign(Speed::Kmh(70)), Some(MaxSpeedAnswer::JustSign))
        );
        assert_eq!(parse(&[("maxspeed", "70"), ("source:maxspeed", "Straßenbauamt")]), both(sign(Speed::Kmh(70)), None));
    }

    #[test]
    fn test_just_sign_needs_a_signed_value() {
        assert_eq!(
            parse(&[("maxspeed", "none"), ("source:maxspeed", "sign")]),
            both(Some(MaxSpeedAnswer::NoLimit), Some(MaxSpeedAnswer::JustSign))
        );
        assert_eq!(parse(&[("maxspeed:type", "sign")]), both(None, invalid()));
        assert_eq!(
            parse(&[("maxspeed:advisory", "30"), ("maxspeed:type", "sign")]),
            both(invalid(), invalid())
        );
    }

    #[test]
    fn test_speed_key_holding_a_type() {
        assert_eq!(
            parse(&[("maxspeed", "DE:rural"), ("maxspeed:type", "DE:urban")]),
            both(None, invalid())
        );
        assert_eq!(
            parse(&[("maxspeed", "DE:zone30"), ("maxspeed:type", "sign")]),
            both(Some(MaxSpeedAnswer::zone(Speed::Kmh(30), "DE")), Some(MaxSpeedAnswer::JustSign))
        );
        assert_eq!(parse(&[("maxspeed", "fast")]), both(invalid(), None));
    }

    #[test]
    fn test_unknown_road_type() {
        assert_eq!(
            parse(&[("maxspeed:type", "DE:motorroad")]),
            both(None, Some(MaxSpeedAnswer::implicit("DE", RoadType::Unknown)))
        );
    }

    #[test]
    fn test_lit_is_read_for_implicit_speeds() {
        assert_eq!(
            parse(&[("maxspeed:type", "GB:nsl_restricted"), ("lit", "yes")]),
            both(
                None,
                Some(MaxSpeedAnswer::ImplicitSpeed {
                    country_code: "GB".to_string(),
                    road_type: RoadType::NslRestricted,
                    lit: Some(true),
                })
            )
        );
    }

    #[test]
    fn test_living_street_and_school_zone() {
        let living_street = |country: Option<&str>| {
            Some(MaxSpeedAnswer::LivingStreet { country_code: country.map(str::to_string) })
        };
        assert_eq!(parse(&[("highway", "living_street")]), both(None, living_street(None)));
        assert_eq!(
            parse(&[("highway", "residential"), ("living_street", "yes"), ("maxspeed", "20")]),
            both(sign(Speed::Kmh(20)), living_street(None))
        );
        assert_eq!(
            parse(&[("highway", "living_street"), ("maxspeed", "7"), ("maxspeed:type", "NL:living_street")]),
            both(sign(Speed::Kmh(7)), living_street(Some("NL")))
        );
        assert_eq!(
            parse(&[("highway", "living_street"), ("hazard", "school_zone"), ("maxspeed", "20 mph")]),
            both(sign(Speed::Mph(20)), Some(MaxSpeedAnswer::SchoolZone))
        );
        assert_eq!(parse(&[("highway", "living_street"), ("maxspeed", "fast")]), both(invalid(), invalid()));
    }

    #[test]
    fn test_vehicle_scope() {
        let tagging = MaxspeedTagging::default();
        let way = tags(&[("highway", "living_street"), ("maxspeed:hgv", "40"), ("maxspeed", "20")]);
        assert_eq!(
            tagging.parse(&way, Some("hgv")),
            both(sign(Speed::Kmh(40)), None)
        );
        assert_eq!(tagging.parse(&way, Some("bus")), None);
    }

    #[test]
    fn test_per_direction() {
        assert_eq!(
            parse(&[("maxspeed", "50"), ("maxspeed:forward", "30")]),
            Some(ForwardAndBackwardMaxspeedAndType {
                forward: MaxspeedAndType::new(sign(Speed::Kmh(30)), None),
                backward: MaxspeedAndType::new(sign(Speed::Kmh(50)), None),
            })
        );
        assert_eq!(
            parse(&[("maxspeed:backward", "60")]),
            Some(ForwardAndBackwardMaxspeedAndType {
                forward: None,
                backward: MaxspeedAndType::new(sign(Speed::Kmh(60)), None),
            })
        );
        assert_eq!(
            parse(&[("maxspeed:both", "50"), ("maxspeed:type", "sign")]),
            both(sign(Speed::Kmh(50)), Some(MaxSpeedAnswer::JustSign))
        );
    }

    #[test]
    fn test_overtagging() {
        assert_eq!(
            parse(&[("maxspeed", "50"), ("maxspeed:forward", "60"), ("maxspeed:backward", "60")]),
            both(invalid(), invalid())
        );
        // redundant but consistent
        assert_eq!(
            parse(&[("maxspeed", "60"), ("maxspeed:forward", "60"), ("maxspeed:backward", "60")]),
            both(sign(Speed::Kmh(60)), None)
        );
    }
}
