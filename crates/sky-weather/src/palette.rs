//! Sky palette selection
//!
//! Picks which background gradient applies. Gradients themselves belong to the
//! renderer; this only decides the key.

use serde::{Deserialize, Serialize};

use crate::profile::{ConditionProfile, DaySky, NightSky};

/// Sun elevation band (exclusive) treated as golden hour
pub const GOLDEN_HOUR_MIN_ELEVATION: f64 = -0.5;
pub const GOLDEN_HOUR_MAX_ELEVATION: f64 = 12.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "key", rename_all = "lowercase")]
pub enum SkyPalette {
    Sunrise,
    Sunset,
    Day(DaySky),
    Night(NightSky),
}

impl SkyPalette {
    pub fn select(
        is_night: bool,
        sun_elevation: f64,
        rising: bool,
        profile: &ConditionProfile,
    ) -> Self {
        let golden = sun_elevation > GOLDEN_HOUR_MIN_ELEVATION
            && sun_elevation < GOLDEN_HOUR_MAX_ELEVATION;

        if !is_night && golden {
            if rising {
                Self::Sunrise
            } else {
                Self::Sunset
            }
        } else if is_night {
            Self::Night(profile.night_sky)
        } else {
            Self::Day(profile.day_sky)
        }
    }
}
