use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::picker::Candidate;
use crate::weight::Weight;

fn enabled_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub weight: Weight,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    /// Fields we don't know about, carried through save and export untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Restaurant {
    pub fn new(id: u64, name: impl Into<String>, weight: f64) -> Restaurant {
        Restaurant {
            id,
            name: name.into(),
            weight: Weight::from(weight),
            enabled: true,
            extra: Map::new(),
        }
    }

    ///
    /// Builds a restaurant from one untrusted JSON record.
    ///
    /// Returns `None` for records that aren't objects. Missing `enabled` means enabled,
    /// a usable `id` is kept (otherwise one is drawn from `ids`) and negative weights are
    /// clamped to 0.
    ///
    pub fn from_value(value: Value, ids: &mut IdGenerator) -> Option<Restaurant> {
        let mut fields = match value {
            Value::Object(fields) => fields,
            other => {
                warn!("Skipping restaurant record that is not an object: {}", other);
                return None;
            }
        };
        let id = match fields.remove("id").as_ref().and_then(Value::as_u64) {
            Some(id) => {
                ids.observe(id);
                id
            }
            None => ids.next_id(),
        };
        let name = match fields.remove("name") {
            Some(Value::String(name)) => name,
            None | Some(Value::Null) => String::new(),
            Some(other) => other.to_string(),
        };
        let mut weight = fields.remove("weight").map(Weight::from).unwrap_or_default();
        if weight.value() < 0.0 {
            warn!(
                "Restaurant {} ({}) has negative weight {}, clamping to 0",
                id,
                name,
                weight.raw()
            );
            weight = Weight::from(0.0);
        }
        let enabled = match fields.remove("enabled") {
            None | Some(Value::Null) => true,
            Some(Value::Bool(enabled)) => enabled,
            Some(other) => truthy(&other),
        };
        Some(Restaurant {
            id,
            name,
            weight,
            enabled,
            extra: fields,
        })
    }
}

impl Candidate for Restaurant {
    fn weight(&self) -> f64 {
        self.weight.value()
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

///
/// Normalizes a whole list of records, as read from storage or an import.
///
/// Ids that are missing, malformed, or already taken by an earlier record are replaced.
///
pub fn normalize_records(records: Vec<Value>, ids: &mut IdGenerator) -> Vec<Restaurant> {
    // Reserve every usable id first so fresh ones can't collide with a later record
    for record in &records {
        if let Some(id) = record.get("id").and_then(Value::as_u64) {
            ids.observe(id);
        }
    }
    let mut seen = HashSet::new();
    let mut restaurants = Vec::with_capacity(records.len());
    for record in records {
        let Some(mut restaurant) = Restaurant::from_value(record, ids) else {
            continue;
        };
        if !seen.insert(restaurant.id) {
            let fresh = ids.next_id();
            warn!(
                "Duplicate restaurant id {}, reassigning to {}",
                restaurant.id, fresh
            );
            restaurant.id = fresh;
            seen.insert(fresh);
        }
        restaurants.push(restaurant);
    }
    restaurants
}

/// Reads text that must hold a JSON array, returning its elements.
pub fn parse_records(text: &str) -> Result<Vec<Value>> {
    match serde_json::from_str::<Value>(text)? {
        Value::Array(records) => Ok(records),
        _ => Err(Error::InvalidFormat),
    }
}

/// Partial update; only the fields that are set get replaced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestaurantUpdate {
    pub name: Option<String>,
    pub weight: Option<f64>,
    pub enabled: Option<bool>,
}

impl RestaurantUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.weight.is_none() && self.enabled.is_none()
    }

    pub fn apply(&self, restaurant: &mut Restaurant) {
        if let Some(name) = &self.name {
            restaurant.name = name.clone();
        }
        if let Some(weight) = self.weight {
            restaurant.weight = Weight::from(weight);
        }
        if let Some(enabled) = self.enabled {
            restaurant.enabled = enabled;
        }
    }
}

///
/// Hands out restaurant ids.
///
/// Ids are creation timestamps in milliseconds, bumped past anything already handed out
/// or observed so two restaurants added in the same millisecond still differ.
///
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: u64,
}

impl IdGenerator {
    pub fn observe(&mut self, id: u64) {
        self.last = self.last.max(id);
    }

    pub fn next_id(&mut self) -> u64 {
        let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
        self.last = now.max(self.last.saturating_add(1));
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_enabled_defaults_to_true() {
        let mut ids = IdGenerator::default();
        let restaurant =
            Restaurant::from_value(json!({"id": 1, "name": "Pho", "weight": 2}), &mut ids).unwrap();
        assert!(restaurant.enabled);
        let restaurant = Restaurant::from_value(
            json!({"id": 1, "name": "Pho", "weight": 2, "enabled": null}),
            &mut ids,
        )
        .unwrap();
        assert!(restaurant.enabled);
    }

    #[test]
    fn test_enabled_flag_kept() {
        let mut ids = IdGenerator::default();
        let restaurant = Restaurant::from_value(
            json!({"id": 1, "name": "Pho", "enabled": false}),
            &mut ids,
        )
        .unwrap();
        assert!(!restaurant.enabled);
    }

    #[test]
    fn test_enabled_truthiness() {
        let test_cases = vec![
            (json!(0), false),
            (json!(1), true),
            (json!(""), false),
            (json!("no"), true),
            (json!([]), true),
        ];
        let mut ids = IdGenerator::default();
        for (enabled, expected) in test_cases {
            let restaurant = Restaurant::from_value(
                json!({"id": 1, "name": "X", "enabled": enabled.clone()}),
                &mut ids,
            )
            .unwrap();
            assert_eq!(
                restaurant.enabled, expected,
                "enabled {} should be {}",
                enabled, expected
            );
        }
    }

    #[test]
    fn test_raw_weight_kept() {
        let mut ids = IdGenerator::default();
        let restaurant =
            Restaurant::from_value(json!({"id": 1, "name": "A", "weight": "10"}), &mut ids)
                .unwrap();
        assert_eq!(restaurant.weight.raw(), &json!("10"));
        assert_eq!(Candidate::weight(&restaurant), 10.0);

        let restaurant =
            Restaurant::from_value(json!({"id": 2, "name": "B", "weight": "abc"}), &mut ids)
                .unwrap();
        assert_eq!(Candidate::weight(&restaurant), 0.0);

        let restaurant = Restaurant::from_value(json!({"id": 3, "name": "C"}), &mut ids).unwrap();
        assert_eq!(restaurant.weight.raw(), &Value::Null);
        assert_eq!(Candidate::weight(&restaurant), 0.0);
    }

    #[test]
    fn test_negative_weight_clamped() {
        let mut ids = IdGenerator::default();
        let restaurant =
            Restaurant::from_value(json!({"id": 1, "name": "A", "weight": -3}), &mut ids)
                .unwrap();
        assert_eq!(Candidate::weight(&restaurant), 0.0);
        let restaurant =
            Restaurant::from_value(json!({"id": 1, "name": "A", "weight": "-3"}), &mut ids)
                .unwrap();
        assert_eq!(Candidate::weight(&restaurant), 0.0);
    }

    #[test]
    fn test_unknown_fields_preserved() {
        let mut ids = IdGenerator::default();
        let restaurant = Restaurant::from_value(
            json!({"id": 1, "name": "A", "weight": 1, "cuisine": "thai"}),
            &mut ids,
        )
        .unwrap();
        assert_eq!(restaurant.extra.get("cuisine"), Some(&json!("thai")));
        let serialized = serde_json::to_value(&restaurant).unwrap();
        assert_eq!(serialized["cuisine"], json!("thai"));
        assert_eq!(serialized["enabled"], json!(true));
    }

    #[test]
    fn test_non_object_skipped() {
        let mut ids = IdGenerator::default();
        assert!(Restaurant::from_value(json!("Pho"), &mut ids).is_none());
        assert!(Restaurant::from_value(json!(3), &mut ids).is_none());
    }

    #[test]
    fn test_odd_names() {
        let mut ids = IdGenerator::default();
        let restaurant = Restaurant::from_value(json!({"id": 1, "name": 42}), &mut ids).unwrap();
        assert_eq!(restaurant.name, "42");
        let restaurant = Restaurant::from_value(json!({"id": 1}), &mut ids).unwrap();
        assert_eq!(restaurant.name, "");
    }

    #[test]
    fn test_normalize_assigns_missing_and_duplicate_ids() {
        let mut ids = IdGenerator::default();
        let restaurants = normalize_records(
            vec![
                json!({"name": "A"}),
                json!({"id": 5, "name": "B"}),
                json!({"id": 5, "name": "C"}),
                json!({"id": "seven", "name": "D"}),
                json!(null),
            ],
            &mut ids,
        );
        assert_eq!(restaurants.len(), 4);
        assert_eq!(restaurants[1].id, 5);
        let unique: HashSet<u64> = restaurants.iter().map(|r| r.id).collect();
        assert_eq!(unique.len(), 4);
    }

    #[test]
    fn test_update_merges_present_fields() {
        let mut restaurant = Restaurant::new(1, "A", 1.0);
        let update = RestaurantUpdate {
            weight: Some(4.0),
            ..Default::default()
        };
        update.apply(&mut restaurant);
        assert_eq!(restaurant.name, "A");
        assert_eq!(Candidate::weight(&restaurant), 4.0);
        assert!(restaurant.enabled);
        assert!(!update.is_empty());
        assert!(RestaurantUpdate::default().is_empty());
    }

    #[test]
    fn test_parse_records() {
        assert_eq!(parse_records(r#"[{"name": "A"}, 3]"#).unwrap().len(), 2);
        assert!(matches!(parse_records("{}"), Err(Error::InvalidFormat)));
        assert!(matches!(parse_records("lunch"), Err(Error::Parse(_))));
    }

    #[test]
    fn test_ids_unique_and_increasing() {
        let mut ids = IdGenerator::default();
        let first = ids.next_id();
        let second = ids.next_id();
        assert!(second > first);

        ids.observe(u64::MAX - 10);
        assert_eq!(ids.next_id(), u64::MAX - 9);
    }
}
