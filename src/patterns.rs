//! Tag value patterns, compiled once.

use regex::Regex;
use std::sync::LazyLock;

const COUNTRY: &str = r"[A-Z]{2}(?:-[A-Z0-9]{1,3})?";

static PLAIN_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+$").unwrap());
static MPH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([0-9]+) ?mph$").unwrap());
/// "DE:zone30", "DE:zone:30" and the bare-number form "DE:30" used by zone:maxspeed
static ZONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^({COUNTRY}):(?:zone:?)?([0-9]+)$")).unwrap());
static IMPLICIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^({COUNTRY}):([a-z][a-z0-9_]*)$")).unwrap());
static LIVING_STREET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^({COUNTRY}):living_street$")).unwrap());
static TIME_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{1,2}:[0-9]{2} ?- ?[0-9]{1,2}:[0-9]{2}").unwrap());

pub fn is_plain_number(value: &str) -> bool {
    PLAIN_NUMBER.is_match(value)
}

pub fn mph_value(value: &str) -> Option<u32> {
    MPH.captures(value)?.get(1)?.as_str().parse().ok()
}

/// Country code and zone speed number of a zone value.
pub fn zone(value: &str) -> Option<(&str, u32)> {
    let caps = ZONE.captures(value)?;
    let country = caps.get(1)?.as_str();
    let speed = caps.get(2)?.as_str().parse().ok()?;
    Some((country, speed))
}

/// Country code and road type literal of an implicit value such as "DE:urban".
pub fn implicit(value: &str) -> Option<(&str, &str)> {
    let caps = IMPLICIT.captures(value)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

pub fn living_street_country(value: &str) -> Option<&str> {
    Some(LIVING_STREET.captures(value)?.get(1)?.as_str())
}

/// Contains an opening hours style time range such as "07:00-09:30".
pub fn has_time_range(value: &str) -> bool {
    TIME_RANGE.is_match(value)
}
