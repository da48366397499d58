//! Sky Geometry
//!
//! Places celestial bodies on the widget canvas:
//! - Elliptical "orbit" overlay expressed in canvas percent
//! - Azimuth/elevation projection with house-angle and tilt
//! - Antipodal fallback for a missing moon sensor
//! - Per-instance memoization of projected positions
//!
//! Every position is in percent of the canvas (0-100), so the same numbers
//! apply at any rendered size.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

pub mod cache;
pub mod projection;

// Re-exports
pub use cache::{CachedProjector, SkyProjectors};
pub use projection::{antipode, project, Projector};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Invalid orbit parameter {field}: {value}")]
    InvalidOrbit { field: &'static str, value: f64 },
    #[error("Invalid house angle: {0}")]
    InvalidHouseAngle(f64),
}

pub type Result<T> = std::result::Result<T, GeometryError>;

/// Canvas bounds (percent)
pub const CANVAS_MIN: f64 = 0.0;
pub const CANVAS_MAX: f64 = 100.0;

/// Default house orientation offset (degrees)
pub const DEFAULT_HOUSE_ANGLE: f64 = 25.0;

/// Elliptical path the sun and moon travel along
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OrbitConfig {
    /// Horizontal radius (percent of canvas width)
    pub rx: f64,
    /// Vertical radius (percent of canvas height)
    pub ry: f64,
    /// Ellipse center, horizontal
    pub cx: f64,
    /// Ellipse center, vertical
    pub cy: f64,
    /// Rotation of the whole ellipse (degrees)
    pub tilt: f64,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            rx: 45.0,
            ry: 40.0,
            cx: 50.0,
            cy: 50.0,
            tilt: 0.0,
        }
    }
}

impl OrbitConfig {
    fn fields(&self) -> [(&'static str, f64); 5] {
        [
            ("rx", self.rx),
            ("ry", self.ry),
            ("cx", self.cx),
            ("cy", self.cy),
            ("tilt", self.tilt),
        ]
    }

    /// Reject non-finite parameters
    pub fn validate(&self) -> Result<()> {
        match self.fields().into_iter().find(|(_, v)| !v.is_finite()) {
            Some((field, value)) => Err(GeometryError::InvalidOrbit { field, value }),
            None => Ok(()),
        }
    }

    /// Replace every non-finite parameter with its default
    pub fn sanitized(self) -> Self {
        if self.validate().is_ok() {
            return self;
        }

        let defaults = Self::default();
        let pick = |field: &str, value: f64, fallback: f64| {
            if value.is_finite() {
                value
            } else {
                warn!("Orbit {} is not finite ({}), using {}", field, value, fallback);
                fallback
            }
        };

        Self {
            rx: pick("rx", self.rx, defaults.rx),
            ry: pick("ry", self.ry, defaults.ry),
            cx: pick("cx", self.cx, defaults.cx),
            cy: pick("cy", self.cy, defaults.cy),
            tilt: pick("tilt", self.tilt, defaults.tilt),
        }
    }
}

/// Projected position of a celestial body
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScreenPosition {
    /// Horizontal position, 0-100
    pub left: f64,
    /// Vertical position, 0-100
    pub top: f64,
    /// Elevation passthrough (degrees)
    pub elevation: f64,
    /// Azimuth after the invert step (degrees)
    pub azimuth: f64,
}

impl ScreenPosition {
    /// Returned whenever the inputs are not finite numbers
    pub const FALLBACK: ScreenPosition = ScreenPosition {
        left: 50.0,
        top: 50.0,
        elevation: 0.0,
        azimuth: 0.0,
    };

    /// Bodies are drawn only at or above the horizon
    pub fn is_above_horizon(&self) -> bool {
        self.elevation >= 0.0
    }
}

impl Default for ScreenPosition {
    fn default() -> Self {
        Self::FALLBACK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orbit_defaults() {
        let orbit = OrbitConfig::default();
        assert_eq!(orbit.rx, 45.0);
        assert_eq!(orbit.ry, 40.0);
        assert_eq!(orbit.cx, 50.0);
        assert_eq!(orbit.cy, 50.0);
        assert_eq!(orbit.tilt, 0.0);
        assert!(orbit.validate().is_ok());
    }

    #[test]
    fn test_orbit_partial_json_uses_defaults() {
        let orbit: OrbitConfig = serde_json::from_str(r#"{"rx": 30, "tilt": 10}"#).unwrap();
        assert_eq!(orbit.rx, 30.0);
        assert_eq!(orbit.ry, 40.0);
        assert_eq!(orbit.tilt, 10.0);
    }

    #[test]
    fn test_orbit_sanitize_replaces_non_finite() {
        let orbit = OrbitConfig {
            rx: f64::NAN,
            ry: 20.0,
            cx: f64::INFINITY,
            cy: 40.0,
            tilt: 5.0,
        };
        // NaN never compares equal, match on the field instead
        assert!(matches!(
            orbit.validate(),
            Err(GeometryError::InvalidOrbit { field: "rx", .. })
        ));

        let clean = orbit.sanitized();
        assert_eq!(clean.rx, 45.0);
        assert_eq!(clean.ry, 20.0);
        assert_eq!(clean.cx, 50.0);
        assert_eq!(clean.cy, 40.0);
        assert_eq!(clean.tilt, 5.0);
        assert!(clean.validate().is_ok());
    }

    #[test]
    fn test_fallback_sits_at_canvas_center() {
        let pos = ScreenPosition::FALLBACK;
        assert_eq!((pos.left, pos.top), (50.0, 50.0));
        assert!(pos.is_above_horizon());
    }
}
