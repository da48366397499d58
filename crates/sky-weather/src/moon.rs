//! Lunar phases
//!
//! Eight named phases. Lighting is approximated from the name alone, which is
//! all most hosts report.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Result, WeatherError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum MoonPhase {
    #[serde(rename = "New Moon")]
    NewMoon,
    #[serde(rename = "Waxing Crescent")]
    WaxingCrescent,
    #[serde(rename = "First Quarter")]
    FirstQuarter,
    #[serde(rename = "Waxing Gibbous")]
    WaxingGibbous,
    #[default]
    #[serde(rename = "Full Moon")]
    FullMoon,
    #[serde(rename = "Waning Gibbous")]
    WaningGibbous,
    #[serde(rename = "Last Quarter")]
    LastQuarter,
    #[serde(rename = "Waning Crescent")]
    WaningCrescent,
}

impl MoonPhase {
    /// Lunation order starting at new moon
    pub const ALL: [MoonPhase; 8] = [
        MoonPhase::NewMoon,
        MoonPhase::WaxingCrescent,
        MoonPhase::FirstQuarter,
        MoonPhase::WaxingGibbous,
        MoonPhase::FullMoon,
        MoonPhase::WaningGibbous,
        MoonPhase::LastQuarter,
        MoonPhase::WaningCrescent,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::NewMoon => "New Moon",
            Self::WaxingCrescent => "Waxing Crescent",
            Self::FirstQuarter => "First Quarter",
            Self::WaxingGibbous => "Waxing Gibbous",
            Self::FullMoon => "Full Moon",
            Self::WaningGibbous => "Waning Gibbous",
            Self::LastQuarter => "Last Quarter",
            Self::WaningCrescent => "Waning Crescent",
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|p| p == self).unwrap_or(4)
    }

    /// Wraps, so any lunation count maps to a phase
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    /// Nominal phase angle, 45° per named phase
    pub fn nominal_degrees(&self) -> f64 {
        self.index() as f64 * 45.0
    }

    /// Nearest named phase for a phase angle (0 = new, 180 = full)
    pub fn from_degrees(degrees: f64) -> Self {
        if !degrees.is_finite() {
            return Self::default();
        }
        let wrapped = degrees.rem_euclid(360.0);
        Self::from_index(((wrapped + 22.5) / 45.0).floor() as usize)
    }

    /// Lit fraction of the disc, as drawn
    pub fn illumination(&self) -> f64 {
        match self {
            Self::NewMoon => 0.0,
            Self::WaxingCrescent | Self::WaningCrescent => 0.22,
            Self::FirstQuarter | Self::LastQuarter => 0.5,
            Self::WaxingGibbous | Self::WaningGibbous => 0.78,
            Self::FullMoon => 1.0,
        }
    }

    /// Lit limb is on the opposite side while waning
    pub fn is_waning(&self) -> bool {
        matches!(
            self,
            Self::WaningGibbous | Self::LastQuarter | Self::WaningCrescent
        )
    }
}

impl fmt::Display for MoonPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MoonPhase {
    type Err = WeatherError;

    /// Accepts "Waxing Crescent", "waxing_crescent", "WAXING-CRESCENT", "third quarter"...
    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '_' || c == '-' { ' ' } else { c })
            .collect();

        let waning = normalized.contains("waning");
        let phase = if normalized.contains("new") {
            Self::NewMoon
        } else if normalized.contains("full") {
            Self::FullMoon
        } else if normalized.contains("crescent") {
            if waning {
                Self::WaningCrescent
            } else {
                Self::WaxingCrescent
            }
        } else if normalized.contains("gibbous") {
            if waning {
                Self::WaningGibbous
            } else {
                Self::WaxingGibbous
            }
        } else if normalized.contains("first quarter") {
            Self::FirstQuarter
        } else if normalized.contains("last quarter") || normalized.contains("third quarter") {
            Self::LastQuarter
        } else {
            return Err(WeatherError::UnknownMoonPhase(s.to_string()));
        };

        Ok(phase)
    }
}
