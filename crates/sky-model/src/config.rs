//! Card configuration
//!
//! Supplied once by the host as JSON. Every key is optional and falls back to
//! the defaults below; per-condition and cloud tables are merged over the
//! built-in ones entry by entry.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use sky_geometry::{OrbitConfig, Projector, DEFAULT_HOUSE_ANGLE};
use sky_weather::{CloudPreset, CloudShape, Condition, ConditionProfile, ConditionTable, Layer};

use crate::{ModelError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CardConfig {
    /// Weather entity
    #[serde(alias = "weather")]
    pub location: String,
    pub sun_entity: String,
    pub moon_azimuth_entity: String,
    pub moon_elevation_entity: String,
    pub moon_phase_entity: String,
    /// Optional lighting-angle sensor; the phase name is used when absent
    pub moon_phase_degrees_entity: Option<String>,
    pub house_angle: f64,
    pub invert_azimuth: bool,
    pub orbit: OrbitConfig,
    pub layers: Vec<Layer>,
    /// Widgets sharing an id share one sky
    pub singleton_id: Option<String>,
    pub demo_mode: bool,
    /// Start the demo automatically the first time a group sees a demo widget
    pub demo_autoplay: bool,
    pub conditions: HashMap<Condition, ConditionProfile>,
    pub clouds: HashMap<CloudPreset, CloudShape>,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            location: "weather.home".to_string(),
            sun_entity: "sun.sun".to_string(),
            moon_azimuth_entity: "sensor.luna_lunar_azimuth".to_string(),
            moon_elevation_entity: "sensor.luna_lunar_elevation".to_string(),
            moon_phase_entity: "sensor.luna_lunar_phase".to_string(),
            moon_phase_degrees_entity: None,
            house_angle: DEFAULT_HOUSE_ANGLE,
            invert_azimuth: false,
            orbit: OrbitConfig::default(),
            layers: Layer::DEFAULT_ORDER.to_vec(),
            singleton_id: None,
            demo_mode: false,
            demo_autoplay: true,
            conditions: HashMap::new(),
            clouds: HashMap::new(),
        }
    }
}

impl CardConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config.normalized())
    }

    pub fn validate(&self) -> Result<()> {
        if self.location.trim().is_empty() {
            return Err(ModelError::InvalidConfig(
                "weather entity must not be empty".to_string(),
            ));
        }
        if self.sun_entity.trim().is_empty() {
            return Err(ModelError::InvalidConfig(
                "sun entity must not be empty".to_string(),
            ));
        }
        if let Some(id) = &self.singleton_id {
            if id.trim().is_empty() {
                return Err(ModelError::InvalidConfig(
                    "singleton_id must not be blank".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Drop repeated layers, keeping the first occurrence
    fn normalized(mut self) -> Self {
        let mut seen = Vec::with_capacity(self.layers.len());
        self.layers.retain(|layer| {
            if seen.contains(layer) {
                warn!("Layer {} listed twice, keeping the first", layer);
                false
            } else {
                seen.push(*layer);
                true
            }
        });
        self
    }

    /// Projection settings with non-finite values replaced by defaults
    pub fn projector(&self) -> Projector {
        let orbit = self.orbit.sanitized();
        Projector::new(orbit, self.house_angle, self.invert_azimuth).unwrap_or_else(|e| {
            warn!("{}, using default house angle", e);
            Projector {
                orbit,
                house_angle: DEFAULT_HOUSE_ANGLE,
                invert_azimuth: self.invert_azimuth,
            }
        })
    }

    pub fn condition_table(&self) -> ConditionTable {
        ConditionTable::builtin().with_overrides(&self.conditions, &self.clouds)
    }

    pub fn has_layer(&self, layer: Layer) -> bool {
        self.layers.contains(&layer)
    }

    /// Demo simulation is on when asked for or when the controls layer is present
    pub fn demo_enabled(&self) -> bool {
        self.demo_mode || self.has_layer(Layer::DemoControls)
    }
}
