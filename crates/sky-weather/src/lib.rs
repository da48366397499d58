//! Sky Weather
//!
//! Everything that turns a weather condition into something drawable:
//! - The 9-value condition enumeration and host keyword matching
//! - Declarative per-condition profiles (clouds, precipitation, fog, stars)
//! - Lunar phase names and their lighting fractions
//! - Sky palette selection (day/night/sunrise/sunset keys)
//! - Procedural decorative scene parameters per layer

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod matrix;
pub mod moon;
pub mod palette;
pub mod profile;
pub mod scene;

// Re-exports
pub use matrix::classify;
pub use moon::MoonPhase;
pub use palette::SkyPalette;
pub use profile::{CloudPreset, CloudShape, ConditionProfile, ConditionTable, DaySky, NightSky};
pub use scene::{CloudSpec, Layer, LayerContent, LayerScene, Scene, SceneBuilder};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WeatherError {
    #[error("Unknown condition: {0}")]
    UnknownCondition(String),
    #[error("Unknown moon phase: {0}")]
    UnknownMoonPhase(String),
    #[error("Unknown layer: {0}")]
    UnknownLayer(String),
}

pub type Result<T> = std::result::Result<T, WeatherError>;

/// Weather condition driving which decorative layers render
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Condition {
    #[serde(rename = "sunny")]
    Sunny,
    #[serde(rename = "partlycloudy")]
    PartlyCloudy,
    #[serde(rename = "cloudy")]
    Cloudy,
    #[serde(rename = "rainy")]
    Rainy,
    #[serde(rename = "pouring")]
    Pouring,
    #[serde(rename = "lightning-rainy")]
    LightningRainy,
    #[serde(rename = "snowy")]
    Snowy,
    #[serde(rename = "fog")]
    Fog,
    #[serde(rename = "clear-night")]
    ClearNight,
}

impl Condition {
    pub const ALL: [Condition; 9] = [
        Condition::LightningRainy,
        Condition::Pouring,
        Condition::Rainy,
        Condition::Snowy,
        Condition::Cloudy,
        Condition::PartlyCloudy,
        Condition::Sunny,
        Condition::ClearNight,
        Condition::Fog,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sunny => "sunny",
            Self::PartlyCloudy => "partlycloudy",
            Self::Cloudy => "cloudy",
            Self::Rainy => "rainy",
            Self::Pouring => "pouring",
            Self::LightningRainy => "lightning-rainy",
            Self::Snowy => "snowy",
            Self::Fog => "fog",
            Self::ClearNight => "clear-night",
        }
    }

    /// Clouds for these conditions sit behind the sun and moon
    pub fn clouds_in_background(&self) -> bool {
        matches!(self, Self::PartlyCloudy | Self::Sunny | Self::ClearNight)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Condition {
    type Err = WeatherError;

    /// Exact condition name (case-insensitive); use [`classify`] for free text
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Condition::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| WeatherError::UnknownCondition(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_names_round_trip() {
        for cond in Condition::ALL {
            assert_eq!(cond.as_str().parse::<Condition>().unwrap(), cond);
            let json = serde_json::to_string(&cond).unwrap();
            assert_eq!(json, format!("\"{}\"", cond.as_str()));
        }
    }

    #[test]
    fn test_unknown_condition_rejected() {
        assert_eq!(
            "hail".parse::<Condition>(),
            Err(WeatherError::UnknownCondition("hail".to_string()))
        );
        assert_eq!("  Clear-Night ".parse::<Condition>(), Ok(Condition::ClearNight));
    }

    #[test]
    fn test_background_cloud_conditions() {
        assert!(Condition::Sunny.clouds_in_background());
        assert!(Condition::ClearNight.clouds_in_background());
        assert!(!Condition::Rainy.clouds_in_background());
        assert!(!Condition::Cloudy.clouds_in_background());
    }
}
