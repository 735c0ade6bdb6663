use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tags of one map feature. Ordered so that every walk over them is
/// deterministic.
pub type Tags = BTreeMap<String, String>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TagChange {
    Add { key: String, value: String },
    Modify { key: String, old_value: String, value: String },
    Delete { key: String, old_value: String },
}

impl TagChange {
    pub fn key(&self) -> &str {
        match self {
            TagChange::Add { key, .. } | TagChange::Modify { key, .. } | TagChange::Delete { key, .. } => key,
        }
    }
}

/// Working copy over a tag snapshot. Edits are recorded in an overlay, the
/// snapshot stays untouched and `create` reports the net difference.
pub struct TagChangesBuilder<'a> {
    original: &'a Tags,
    // None = removed
    overlay: BTreeMap<String, Option<String>>,
}

impl<'a> TagChangesBuilder<'a> {
    pub fn new(original: &'a Tags) -> Self {
        TagChangesBuilder {
            original,
            overlay: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        match self.overlay.get(key) {
            Some(value) => value.as_deref(),
            None => self.original.get(key).map(String::as_str),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.overlay.insert(key.into(), Some(value.into()));
    }

    pub fn remove(&mut self, key: &str) {
        if self.contains_key(key) {
            self.overlay.insert(key.to_string(), None);
        }
    }

    /// Current state of all tags, snapshot with edits applied.
    pub fn current(&self) -> Tags {
        let mut tags = self.original.clone();
        for (key, value) in &self.overlay {
            match value {
                Some(value) => tags.insert(key.clone(), value.clone()),
                None => tags.remove(key),
            };
        }
        tags
    }

    pub fn has_changes(&self) -> bool {
        self.overlay
            .iter()
            .any(|(key, value)| self.original.get(key) != value.as_ref())
    }

    pub fn create(&self) -> Vec<TagChange> {
        self.overlay
            .iter()
            .filter_map(|(key, value)| match (self.original.get(key), value) {
                (None, Some(value)) => Some(TagChange::Add {
                    key: key.clone(),
                    value: value.clone(),
                }),
                (Some(old_value), Some(value)) if old_value != value => Some(TagChange::Modify {
                    key: key.clone(),
                    old_value: old_value.clone(),
                    value: value.clone(),
                }),
                (Some(old_value), None) => Some(TagChange::Delete {
                    key: key.clone(),
                    old_value: old_value.clone(),
                }),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_net_changes_only() {
        let original = tags(&[("maxspeed", "50"), ("name", "Hauptstraße")]);
        let mut builder = TagChangesBuilder::new(&original);
        builder.remove("maxspeed");
        builder.set("maxspeed", "50");
        builder.set("maxspeed:forward", "30");
        builder.remove("maxspeed:forward");
        builder.remove("not_there");
        assert!(!builder.has_changes());
        assert!(builder.create().is_empty());
    }

    #[test]
    fn test_add_modify_delete_in_key_order() {
        let original = tags(&[("maxspeed", "50"), ("source:maxspeed", "survey")]);
        let mut builder = TagChangesBuilder::new(&original);
        builder.set("maxspeed", "30");
        builder.remove("source:maxspeed");
        builder.set("maxspeed:type", "sign");
        assert_eq!(builder.get("maxspeed"), Some("30"));
        assert_eq!(builder.get("source:maxspeed"), None);
        assert_eq!(
            builder.create(),
            vec![
                TagChange::Modify {
                    key: "maxspeed".to_string(),
                    old_value: "50".to_string(),
                    value: "30".to_string()
                },
                TagChange::Add {
                    key: "maxspeed:type".to_string(),
                    value: "sign".to_string()
                },
                TagChange::Delete {
                    key: "source:maxspeed".to_string(),
                    old_value: "survey".to_string()
                },
            ]
        );
        assert_eq!(original.get("maxspeed").map(String::as_str), Some("50"));
    }

    #[test]
    fn test_current_view() {
        let original = tags(&[("highway", "residential")]);
        let mut builder = TagChangesBuilder::new(&original);
        builder.set("highway", "living_street");
        builder.set("maxspeed", "20");
        assert_eq!(builder.current(), tags(&[("highway", "living_street"), ("maxspeed", "20")]));
    }
}
