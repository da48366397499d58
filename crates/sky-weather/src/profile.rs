//! Condition Profiles
//!
//! Declarative table describing how each condition looks: cloud density,
//! which sky palette to use by day and by night, and which particle effects run.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::Condition;

/// Named cloud density preset
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CloudPreset {
    Heavy,
    Normal,
    Low,
    Minimal,
    None,
}

impl CloudPreset {
    pub const ALL: [CloudPreset; 5] = [
        CloudPreset::Heavy,
        CloudPreset::Normal,
        CloudPreset::Low,
        CloudPreset::Minimal,
        CloudPreset::None,
    ];
}

/// Cloud count, puffs per cloud and grey level for a preset
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CloudShape {
    pub count: u32,
    pub puffs: u32,
    pub grey: u32,
}

impl CloudShape {
    pub const fn new(count: u32, puffs: u32, grey: u32) -> Self {
        Self { count, puffs, grey }
    }

    fn builtin(preset: CloudPreset) -> Self {
        match preset {
            CloudPreset::Heavy => Self::new(15, 5, 4),
            CloudPreset::Normal => Self::new(10, 3, 2),
            CloudPreset::Low => Self::new(4, 2, 1),
            CloudPreset::Minimal => Self::new(2, 2, 0),
            CloudPreset::None => Self::new(0, 0, 0),
        }
    }
}

/// Daytime sky palette key
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum DaySky {
    #[default]
    Normal,
    Inter,
    Rainy,
    Dark,
    Snowy,
    Grey,
}

/// Night sky palette key
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum NightSky {
    Clear,
    #[default]
    Normal,
    Dark,
}

/// How one condition is drawn
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConditionProfile {
    pub clouds: CloudPreset,
    pub day_sky: DaySky,
    pub night_sky: NightSky,
    /// Rain drop count
    pub drops: u32,
    /// Snow flake count
    pub flakes: u32,
    pub lightning: bool,
    pub stars: bool,
    pub fog: bool,
}

impl Default for ConditionProfile {
    /// The "default" entry used for anything not in the table
    fn default() -> Self {
        Self {
            clouds: CloudPreset::Low,
            day_sky: DaySky::Normal,
            night_sky: NightSky::Normal,
            drops: 0,
            flakes: 0,
            lightning: false,
            stars: false,
            fog: false,
        }
    }
}

impl ConditionProfile {
    fn builtin(condition: Condition) -> Self {
        let base = Self::default();
        match condition {
            Condition::LightningRainy => Self {
                clouds: CloudPreset::Heavy,
                day_sky: DaySky::Dark,
                night_sky: NightSky::Dark,
                drops: 500,
                lightning: true,
                ..base
            },
            Condition::Pouring => Self {
                clouds: CloudPreset::Heavy,
                day_sky: DaySky::Dark,
                night_sky: NightSky::Dark,
                drops: 350,
                ..base
            },
            Condition::Rainy => Self {
                clouds: CloudPreset::Normal,
                day_sky: DaySky::Rainy,
                drops: 150,
                ..base
            },
            Condition::Snowy => Self {
                clouds: CloudPreset::Normal,
                day_sky: DaySky::Snowy,
                flakes: 120,
                ..base
            },
            Condition::Cloudy => Self {
                clouds: CloudPreset::Heavy,
                day_sky: DaySky::Grey,
                ..base
            },
            Condition::PartlyCloudy => Self {
                clouds: CloudPreset::Low,
                day_sky: DaySky::Inter,
                ..base
            },
            Condition::Sunny => Self {
                clouds: CloudPreset::Minimal,
                night_sky: NightSky::Clear,
                ..base
            },
            Condition::ClearNight => Self {
                clouds: CloudPreset::None,
                night_sky: NightSky::Clear,
                stars: true,
                ..base
            },
            Condition::Fog => Self {
                clouds: CloudPreset::None,
                day_sky: DaySky::Grey,
                fog: true,
                ..base
            },
        }
    }
}

/// Condition and cloud tables, built-ins merged with configuration overrides
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionTable {
    profiles: HashMap<Condition, ConditionProfile>,
    fallback: ConditionProfile,
    clouds: HashMap<CloudPreset, CloudShape>,
}

impl ConditionTable {
    pub fn builtin() -> Self {
        Self {
            profiles: Condition::ALL
                .into_iter()
                .map(|c| (c, ConditionProfile::builtin(c)))
                .collect(),
            fallback: ConditionProfile::default(),
            clouds: CloudPreset::ALL
                .into_iter()
                .map(|p| (p, CloudShape::builtin(p)))
                .collect(),
        }
    }

    /// Replace individual entries; anything not mentioned keeps its built-in value
    pub fn with_overrides(
        mut self,
        profiles: &HashMap<Condition, ConditionProfile>,
        clouds: &HashMap<CloudPreset, CloudShape>,
    ) -> Self {
        self.profiles.extend(profiles.iter().map(|(k, v)| (*k, *v)));
        self.clouds.extend(clouds.iter().map(|(k, v)| (*k, *v)));
        self
    }

    pub fn profile(&self, condition: Condition) -> &ConditionProfile {
        self.profiles.get(&condition).unwrap_or(&self.fallback)
    }

    pub fn fallback(&self) -> &ConditionProfile {
        &self.fallback
    }

    pub fn cloud_shape(&self, preset: CloudPreset) -> CloudShape {
        self.clouds
            .get(&preset)
            .copied()
            .unwrap_or_else(|| CloudShape::builtin(CloudPreset::Low))
    }

    /// Conditions eligible for a demo scenario, in canonical order
    pub fn scenario_conditions(&self) -> Vec<Condition> {
        Condition::ALL
            .into_iter()
            .filter(|c| self.profiles.contains_key(c))
            .collect()
    }
}

impl Default for ConditionTable {
    fn default() -> Self {
        Self::builtin()
    }
}
