//! Conditional speed limits, `maxspeed:conditional=30 @ wet; 50 @ (22:00-06:00)`.

use serde::{Deserialize, Serialize};

use crate::parser::parse_explicit;
use crate::patterns;
use crate::types::MaxSpeedAnswer;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    #[serde(rename = "<")]
    Less,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = ">=")]
    GreaterOrEqual,
}

impl Comparison {
    /// Splits a leading comparison operator off `text`.
    fn split(text: &str) -> Option<(Comparison, &str)> {
        // two character operators first
        [
            ("<=", Comparison::LessOrEqual),
            (">=", Comparison::GreaterOrEqual),
            ("<", Comparison::Less),
            (">", Comparison::Greater),
        ]
        .into_iter()
        .find_map(|(op, comparison)| text.strip_prefix(op).map(|rest| (comparison, rest)))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    Wet,
    Snow,
    Flashing,
    Winter,
    /// The weight stays as written, e.g. "7.5" or "3.5 t".
    WeightComparison { operator: Comparison, value: String },
    TimeWindow { hours: String },
    NoCondition,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalSpeed {
    pub explicit: MaxSpeedAnswer,
    /// `None` if the condition is not understood
    pub condition: Option<Condition>,
}

pub fn parse_condition(text: &str) -> Option<Condition> {
    let text = text.trim();
    let text = text
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .unwrap_or(text)
        .trim();
    match text {
        "" => Some(Condition::NoCondition),
        "wet" => Some(Condition::Wet),
        "snow" => Some(Condition::Snow),
        "flashing" => Some(Condition::Flashing),
        "winter" => Some(Condition::Winter),
        _ => {
            if let Some(rest) = text.strip_prefix("weight") {
                let (operator, value) = Comparison::split(rest.trim_start())?;
                let value = value.trim();
                if value.is_empty() {
                    return None;
                }
                Some(Condition::WeightComparison { operator, value: value.to_string() })
            } else if patterns::has_time_range(text) {
                Some(Condition::TimeWindow { hours: text.to_string() })
            } else {
                None
            }
        }
    }
}

/// Splits on `;` outside of parentheses, opening hours contain `;` too.
fn split_entries(value: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in value.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => {
                entries.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    entries.push(&value[start..]);
    entries.into_iter().map(str::trim).filter(|e| !e.is_empty()).collect()
}

pub fn parse_conditional_speeds(value: &str) -> Vec<ConditionalSpeed> {
    split_entries(value)
        .into_iter()
        .map(|entry| match entry.split_once('@') {
            Some((speed, condition)) => ConditionalSpeed {
                explicit: parse_explicit(speed.trim()),
                condition: parse_condition(condition),
            },
            None => ConditionalSpeed {
                explicit: parse_explicit(entry),
                condition: None,
            },
        })
        .collect()
}
