//! Sky Model
//!
//! The data every widget agrees on:
//! - `SkyState`, the immutable snapshot a group renders
//! - `CardConfig`, the declarative card configuration
//! - Host snapshot types (entities with a state and attributes)
//! - The live reader that turns a host snapshot into a `SkyState`

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod config;
pub mod live;
pub mod snapshot;

// Re-exports
pub use config::CardConfig;
pub use live::{local_hour_of_day, read_live, LiveReader, PushFingerprint};
pub use snapshot::{EntityState, HostSnapshot};

use sky_geometry::ScreenPosition;
use sky_weather::{Condition, MoonPhase};

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid host snapshot: {0}")]
    InvalidSnapshot(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;

/// One complete picture of the sky
///
/// Recomputed wholesale on every update and never patched field by field, so
/// `is_night` always agrees with the sun reading it was derived from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SkyState {
    pub condition: Condition,
    pub is_night: bool,
    pub sun: ScreenPosition,
    pub moon: ScreenPosition,
    pub moon_phase: MoonPhase,
    /// Lighting angle, 0-360 (0 = new, 180 = full)
    pub moon_phase_degrees: f64,
    pub rising: bool,
    /// Fractional hour, 0-24
    pub simulated_hour: f64,
    pub wind_speed_kmh: f64,
}

impl Default for SkyState {
    /// Midday, clear, full moon below the horizon
    fn default() -> Self {
        Self {
            condition: Condition::Sunny,
            is_night: false,
            sun: ScreenPosition {
                left: 50.0,
                top: 50.0,
                elevation: 80.0,
                azimuth: 160.0,
            },
            moon: ScreenPosition {
                left: 50.0,
                top: 50.0,
                elevation: -25.0,
                azimuth: 340.0,
            },
            moon_phase: MoonPhase::FullMoon,
            moon_phase_degrees: MoonPhase::FullMoon.nominal_degrees(),
            rising: false,
            simulated_hour: 12.0,
            wind_speed_kmh: 25.0,
        }
    }
}

impl SkyState {
    pub fn sun_visible(&self) -> bool {
        self.sun.is_above_horizon()
    }

    pub fn moon_visible(&self) -> bool {
        self.moon.is_above_horizon()
    }

    /// "HH:MM" for the simulated hour
    pub fn clock_label(&self) -> String {
        let minutes = (self.simulated_hour.rem_euclid(24.0) * 60.0).floor() as u32;
        format!("{:02}:{:02}", (minutes / 60) % 24, minutes % 60)
    }
}
