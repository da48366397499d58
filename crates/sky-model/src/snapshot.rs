//! Host entity snapshot
//!
//! A host push is a map of entity id to a string state plus free-form
//! attributes. Numbers arrive either as JSON numbers or as numeric strings.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::{ModelError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EntityState {
    pub state: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl EntityState {
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    /// The state itself read as a finite number
    pub fn numeric_state(&self) -> Option<f64> {
        parse_f64(&Value::String(self.state.clone()))
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Attribute read as a finite number
    pub fn attribute_f64(&self, key: &str) -> Option<f64> {
        self.attributes.get(key).and_then(parse_f64)
    }

    /// Attribute read as a boolean ("true", "on", 1...)
    pub fn attribute_bool(&self, key: &str) -> Option<bool> {
        self.attributes.get(key).and_then(parse_bool)
    }
}

/// Everything the host knows at one instant
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HostSnapshot {
    #[serde(default)]
    pub states: HashMap<String, EntityState>,
}

impl HostSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        // Accept both {"states": {...}} and a bare entity map
        if value.get("states").is_some() {
            Ok(serde_json::from_value(value)?)
        } else if value.is_object() {
            Ok(Self {
                states: serde_json::from_value(value)?,
            })
        } else {
            Err(ModelError::InvalidSnapshot(
                "expected an object of entities".to_string(),
            ))
        }
    }

    pub fn with_entity(mut self, id: &str, entity: EntityState) -> Self {
        self.states.insert(id.to_string(), entity);
        self
    }

    pub fn entity(&self, id: &str) -> Option<&EntityState> {
        self.states.get(id)
    }
}

pub(crate) fn parse_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

pub(crate) fn parse_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|v| v != 0.0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "on" | "yes" | "1" => Some(true),
            "false" | "off" | "no" | "0" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_parsing() {
        let sun = EntityState::new("above_horizon")
            .with_attribute("azimuth", 180.5)
            .with_attribute("elevation", "30")
            .with_attribute("bogus", "n/a")
            .with_attribute("huge", "inf");

        assert_eq!(sun.attribute_f64("azimuth"), Some(180.5));
        assert_eq!(sun.attribute_f64("elevation"), Some(30.0));
        assert_eq!(sun.attribute_f64("bogus"), None);
        assert_eq!(sun.attribute_f64("huge"), None);
        assert_eq!(sun.attribute_f64("missing"), None);
        assert_eq!(sun.numeric_state(), None);
        assert_eq!(EntityState::new(" 12.5 ").numeric_state(), Some(12.5));
    }

    #[test]
    fn test_boolish() {
        let e = EntityState::new("x")
            .with_attribute("a", true)
            .with_attribute("b", "on")
            .with_attribute("c", 0)
            .with_attribute("d", "maybe");
        assert_eq!(e.attribute_bool("a"), Some(true));
        assert_eq!(e.attribute_bool("b"), Some(true));
        assert_eq!(e.attribute_bool("c"), Some(false));
        assert_eq!(e.attribute_bool("d"), None);
    }

    #[test]
    fn test_snapshot_json_shapes() {
        let wrapped = json!({
            "states": {
                "weather.home": {"state": "rainy", "attributes": {"wind_speed": 12}}
            }
        })
        .to_string();
        let bare = json!({
            "sun.sun": {"state": "below_horizon"}
        })
        .to_string();

        let a = HostSnapshot::from_json(&wrapped).unwrap();
        assert_eq!(a.entity("weather.home").unwrap().state, "rainy");
        assert_eq!(
            a.entity("weather.home").unwrap().attribute_f64("wind_speed"),
            Some(12.0)
        );

        let b = HostSnapshot::from_json(&bare).unwrap();
        assert!(b.entity("sun.sun").unwrap().attributes.is_empty());

        assert!(matches!(
            HostSnapshot::from_json("[1, 2]"),
            Err(ModelError::InvalidSnapshot(_))
        ));
        assert!(matches!(
            HostSnapshot::from_json("{"),
            Err(ModelError::Json(_))
        ));
    }
}
