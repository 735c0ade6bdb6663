//! Writing an answer back as the smallest set of tag changes.
//!
//! Combined keys are split per direction first, each answered direction is
//! rewritten on its own, and keys that end up equal in both directions are
//! combined again at the end.

use chrono::NaiveDate;

use crate::changes::{TagChange, TagChangesBuilder, Tags};
use crate::country::CountryInfo;
use crate::error::MaxspeedError;
use crate::keys::{
    self, Direction, ScopedKey, CHECK_DATE_SYNONYMS, HAZARD, HIGHWAY, LIT, LIVING_STREET, MAXSPEED,
    MAXSPEED_ADVISED, MAXSPEED_ADVISORY, MAXSPEED_TYPE, SCHOOL_ZONE, SOURCE_MAXSPEED, SPEED_KEYS,
    ZONE_MAXSPEED, ZONE_TRAFFIC,
};
use crate::parser::{self, DirectionState};
use crate::types::{ForwardAndBackwardMaxspeedAndType, MaxSpeedAnswer, MaxspeedAndType};
use crate::MaxspeedTagging;

fn directional_key(base: &str, vehicle: Option<&str>, direction: Direction) -> String {
    ScopedKey::new(keys::with_vehicle(base, vehicle), "").directional(direction)
}

fn key_families(vehicle: Option<&str>) -> Vec<ScopedKey> {
    let mut families = keys::speed_key_family(vehicle);
    families.extend(keys::type_key_family(vehicle));
    families
}

/// Moves every bare or `:both` value into the directional keys, unless a
/// directional value is already there.
fn split_directions(builder: &mut TagChangesBuilder, families: &[ScopedKey]) {
    for key in families {
        let bare = key.bare();
        let both = key.both();
        let combined = builder
            .get(&bare)
            .or_else(|| builder.get(&both))
            .map(str::to_string);
        let Some(value) = combined else {
            continue;
        };
        for direction in Direction::ALL {
            let directional = key.directional(direction);
            if !builder.contains_key(&directional) {
                builder.set(directional, value.clone());
            }
        }
        builder.remove(&bare);
        builder.remove(&both);
    }
}

fn merge_directions(builder: &mut TagChangesBuilder, families: &[ScopedKey]) {
    for key in families {
        let forward_key = key.directional(Direction::Forward);
        let backward_key = key.directional(Direction::Backward);
        let forward = builder.get(&forward_key).map(str::to_string);
        let backward = builder.get(&backward_key).map(str::to_string);
        if let (Some(forward), Some(backward)) = (forward, backward) {
            if forward == backward && !builder.contains_key(&key.bare()) {
                builder.set(key.bare(), forward);
                builder.remove(&forward_key);
                builder.remove(&backward_key);
            }
        }
    }
}

/// Key to write the new type into: the key it was read from if that key can
/// hold the new type, otherwise `maxspeed:type`.
fn type_key_for(new: &MaxspeedAndType, previous_key: Option<&'static str>) -> &'static str {
    let (Some(new_type), Some(previous_key)) = (new.r#type.as_ref(), previous_key) else {
        return MAXSPEED_TYPE;
    };
    let speed_key_free = previous_key != MAXSPEED || new.explicit.is_none();
    let can_hold = match new_type {
        MaxSpeedAnswer::JustSign => matches!(previous_key, MAXSPEED_TYPE | SOURCE_MAXSPEED),
        MaxSpeedAnswer::Zone { .. } => previous_key != ZONE_TRAFFIC && speed_key_free,
        MaxSpeedAnswer::ImplicitSpeed { .. } | MaxSpeedAnswer::LivingStreet { .. } => speed_key_free,
        _ => false,
    };
    if can_hold {
        previous_key
    } else {
        MAXSPEED_TYPE
    }
}

fn value_key_for(explicit: Option<&MaxSpeedAnswer>, previous_key: Option<&'static str>) -> &'static str {
    match explicit {
        Some(MaxSpeedAnswer::AdvisorySpeedSign { .. }) if previous_key == Some(MAXSPEED_ADVISED) => MAXSPEED_ADVISED,
        Some(MaxSpeedAnswer::AdvisorySpeedSign { .. }) => MAXSPEED_ADVISORY,
        _ => MAXSPEED,
    }
}

fn is_classification(answer: &MaxSpeedAnswer) -> bool {
    answer.is_living_street() || answer.is_school_zone()
}

fn validate(answer: &ForwardAndBackwardMaxspeedAndType, vehicle: Option<&str>) -> Result<(), MaxspeedError> {
    for side in answer.sides() {
        if let Some(explicit) = &side.explicit {
            match explicit {
                MaxSpeedAnswer::SignedSpeed { .. }
                | MaxSpeedAnswer::AdvisorySpeedSign { .. }
                | MaxSpeedAnswer::WalkSpeed
                | MaxSpeedAnswer::NoLimit => {}
                MaxSpeedAnswer::Zone { .. } if side.r#type == Some(MaxSpeedAnswer::JustSign) => {}
                other => {
                    return Err(MaxspeedError::InvalidAnswer(format!("{:?} is no explicit speed", other)))
                }
            }
        }
        if let Some(r#type) = &side.r#type {
            match r#type {
                MaxSpeedAnswer::Zone { .. }
                | MaxSpeedAnswer::ImplicitSpeed { .. }
                | MaxSpeedAnswer::LivingStreet { .. }
                | MaxSpeedAnswer::SchoolZone
                | MaxSpeedAnswer::JustSign => {}
                other => {
                    return Err(MaxspeedError::InvalidAnswer(format!("{:?} is no speed limit type", other)))
                }
            }
            if let Some(vehicle) = vehicle.filter(|_| is_classification(r#type)) {
                return Err(MaxspeedError::VehicleClassification(vehicle.to_string()));
            }
        }
    }
    if let (Some(forward), Some(backward)) = (&answer.forward, &answer.backward) {
        let classified = forward.r#type.as_ref().is_some_and(is_classification)
            || backward.r#type.as_ref().is_some_and(is_classification);
        if classified && forward.r#type != backward.r#type {
            return Err(MaxspeedError::DirectionalClassification);
        }
    }
    Ok(())
}

impl<C: CountryInfo> MaxspeedTagging<C> {
    /// Computes the tag changes that make `tags` express `answer`. A `None`
    /// side of the answer leaves that direction alone. With a vehicle class
    /// only the keys of that class (`maxspeed:hgv` etc.) are touched.
    pub fn apply(
        &self,
        answer: &ForwardAndBackwardMaxspeedAndType,
        tags: &Tags,
        vehicle: Option<&str>,
        check_date: NaiveDate,
    ) -> Result<Vec<TagChange>, MaxspeedError> {
        if answer.forward.is_none() && answer.backward.is_none() {
            return Ok(Vec::new());
        }
        validate(answer, vehicle).inspect_err(|e| log::error!("Refusing to write speed limit: {}", e))?;

        let states = self.parse_states(tags, vehicle);
        let previous = self.parse(tags, vehicle);
        let families = key_families(vehicle);

        let mut builder = TagChangesBuilder::new(tags);
        split_directions(&mut builder, &families);

        for (direction, state) in Direction::ALL.into_iter().zip(states.iter()) {
            let (new, old) = match direction {
                Direction::Forward => (&answer.forward, previous.as_ref().and_then(|p| p.forward.as_ref())),
                Direction::Backward => (&answer.backward, previous.as_ref().and_then(|p| p.backward.as_ref())),
            };
            if let Some(new) = new {
                self.apply_direction(&mut builder, direction, new, old, state, vehicle)
                    .inspect_err(|e| log::error!("Refusing to write speed limit: {}", e))?;
            }
        }

        if vehicle.is_none() {
            apply_classification(&mut builder, answer);
        }
        merge_directions(&mut builder, &families);
        self.update_check_date(&mut builder, check_date);

        let changes = builder.create();
        log::debug!("Speed limit answer {:?} results in {:?}", answer, changes);
        Ok(changes)
    }

    fn apply_direction(
        &self,
        builder: &mut TagChangesBuilder,
        direction: Direction,
        new: &MaxspeedAndType,
        previous: Option<&MaxspeedAndType>,
        state: &DirectionState,
        vehicle: Option<&str>,
    ) -> Result<(), MaxspeedError> {
        let new_type = new.r#type.as_ref();

        // living street or school zone alone: no speed tagging at all
        if new_type.is_some_and(is_classification) && new.explicit.is_none() {
            self.remove_speed_tagging(builder, direction, vehicle);
            self.remove_type_tagging(builder, direction, vehicle);
            return Ok(());
        }

        let previous_type = previous.and_then(|p| p.r#type.as_ref());
        let type_key = type_key_for(new, state.type_key);
        let moved = state.type_key.is_some_and(|key| key != type_key);
        let type_changed = moved
            || match (new_type, previous_type) {
                (None, None) => false,
                (Some(new_type), Some(previous_type)) => !new_type.same_classification(previous_type),
                _ => true,
            };

        if type_changed {
            self.remove_speed_tagging(builder, direction, vehicle);
            self.remove_type_tagging(builder, direction, vehicle);
            if let Some(new_type) = new_type {
                if let Some(value) = new_type.type_tag_value(type_key == ZONE_MAXSPEED)? {
                    builder.set(directional_key(type_key, vehicle, direction), value);
                }
            }
        }

        if let Some(MaxSpeedAnswer::ImplicitSpeed { lit: Some(lit), .. }) = new_type {
            builder.set(LIT, if *lit { "yes" } else { "no" });
        }

        // maxspeed=DE:urban style, the speed key is taken by the type
        if type_key == MAXSPEED && new_type.is_some() && new.explicit.is_none() {
            return Ok(());
        }

        let speed_value = match &new.explicit {
            Some(explicit) => Some(explicit.speed_tag_value()?),
            None => new_type
                .and_then(MaxSpeedAnswer::implied_speed)
                .map(|speed| speed.to_string()),
        };
        let value_key = value_key_for(new.explicit.as_ref(), state.speed_key);
        let up_to_date = SPEED_KEYS.iter().all(|key| {
            let wanted = if *key == value_key { speed_value.as_deref() } else { None };
            builder.get(&directional_key(key, vehicle, direction)) == wanted
        });
        if !up_to_date {
            self.remove_speed_tagging(builder, direction, vehicle);
            if let Some(value) = speed_value {
                builder.set(directional_key(value_key, vehicle, direction), value);
            }
        }
        Ok(())
    }

    /// Removes every speed key variant of the direction, including vehicle
    /// classes (when no vehicle is given), conditional and lane variants.
    fn remove_speed_tagging(&self, builder: &mut TagChangesBuilder, direction: Direction, vehicle: Option<&str>) {
        for key in keys::speed_key_family(vehicle) {
            builder.remove(&key.directional(direction));
        }
    }

    /// Removes every type key of the direction, except for `source:maxspeed`
    /// values that are genuine provenance.
    fn remove_type_tagging(&self, builder: &mut TagChangesBuilder, direction: Direction, vehicle: Option<&str>) {
        for key in keys::type_key_family(vehicle) {
            let directional = key.directional(direction);
            if let Some(value) = builder.get(&directional) {
                if key.base.starts_with(SOURCE_MAXSPEED) && !self.is_deletable_source(value) {
                    continue;
                }
                builder.remove(&directional);
            }
        }
    }

    fn update_check_date(&self, builder: &mut TagChangesBuilder, check_date: NaiveDate) {
        let key = self.config.check_date_key.as_str();
        let existed = builder.contains_key(key) || CHECK_DATE_SYNONYMS.iter().any(|k| builder.contains_key(k));
        if builder.has_changes() || existed {
            builder.set(key, check_date.format("%Y-%m-%d").to_string());
            for synonym in CHECK_DATE_SYNONYMS {
                if synonym != key {
                    builder.remove(synonym);
                }
            }
        }
    }
}

/// Living street and school zone are properties of the whole way.
fn apply_classification(builder: &mut TagChangesBuilder, answer: &ForwardAndBackwardMaxspeedAndType) {
    let types: Vec<&MaxSpeedAnswer> = answer.sides().filter_map(|side| side.r#type.as_ref()).collect();
    let to_living_street = types.iter().any(|t| t.is_living_street());
    let to_school_zone = types.iter().any(|t| t.is_school_zone());

    if to_school_zone {
        builder.set(HAZARD, SCHOOL_ZONE);
    } else if builder.get(HAZARD) == Some(SCHOOL_ZONE) {
        builder.remove(HAZARD);
    }

    let current = builder.current();
    if to_living_street {
        if builder.get(HIGHWAY) != Some(LIVING_STREET) {
            builder.set(HIGHWAY, LIVING_STREET);
            builder.remove(LIVING_STREET);
        }
    } else if !to_school_zone && parser::is_living_street(&current) {
        if builder.get(LIVING_STREET) == Some("yes") {
            builder.remove(LIVING_STREET);
        }
        if builder.get(HIGHWAY) == Some(LIVING_STREET) {
            builder.set(HIGHWAY, "residential");
        }
    }
}
