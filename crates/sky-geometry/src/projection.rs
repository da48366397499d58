//! Orbit Projection
//!
//! Maps a body's azimuth/elevation to a point on the tilted orbit ellipse.
//! The projection ignores elevation for placement; elevation only decides
//! whether the body is drawn.

use nalgebra::{Rotation2, Vector2};
use serde::{Deserialize, Serialize};

use crate::{GeometryError, OrbitConfig, Result, ScreenPosition, CANVAS_MAX, CANVAS_MIN, DEFAULT_HOUSE_ANGLE};

/// Project a body onto the orbit.
///
/// Non-finite azimuth or elevation yields [`ScreenPosition::FALLBACK`].
/// With `invert_azimuth` the azimuth is rotated by 180° (mod 360) first;
/// that adjusted azimuth is what gets reported back.
pub fn project(
    azimuth: f64,
    elevation: f64,
    orbit: &OrbitConfig,
    house_angle: f64,
    invert_azimuth: bool,
) -> ScreenPosition {
    if !azimuth.is_finite() || !elevation.is_finite() {
        return ScreenPosition::FALLBACK;
    }

    let azimuth = if invert_azimuth {
        (azimuth + 180.0) % 360.0
    } else {
        azimuth
    };

    let theta = (azimuth - house_angle).to_radians();

    // Parametric ellipse, 0° at the top of the canvas
    let offset = Vector2::new(orbit.rx * theta.sin(), -orbit.ry * theta.cos());
    let rotated = Rotation2::new(orbit.tilt.to_radians()) * offset;

    let left = orbit.cx + rotated.x;
    let top = orbit.cy + rotated.y;
    if !left.is_finite() || !top.is_finite() {
        return ScreenPosition::FALLBACK;
    }

    ScreenPosition {
        left: left.clamp(CANVAS_MIN, CANVAS_MAX),
        top: top.clamp(CANVAS_MIN, CANVAS_MAX),
        elevation,
        azimuth,
    }
}

/// Point opposite a body: azimuth + 180 (mod 360), elevation negated
pub fn antipode(azimuth: f64, elevation: f64) -> (f64, f64) {
    ((azimuth + 180.0) % 360.0, -elevation)
}

/// Projection settings bound together, as configured on a widget
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Projector {
    pub orbit: OrbitConfig,
    pub house_angle: f64,
    pub invert_azimuth: bool,
}

impl Projector {
    pub fn new(orbit: OrbitConfig, house_angle: f64, invert_azimuth: bool) -> Result<Self> {
        orbit.validate()?;
        if !house_angle.is_finite() {
            return Err(GeometryError::InvalidHouseAngle(house_angle));
        }

        Ok(Self {
            orbit,
            house_angle,
            invert_azimuth,
        })
    }

    pub fn project(&self, azimuth: f64, elevation: f64) -> ScreenPosition {
        project(azimuth, elevation, &self.orbit, self.house_angle, self.invert_azimuth)
    }

    /// Moon placement when only the sun is known
    pub fn project_antipode(&self, sun_azimuth: f64, sun_elevation: f64) -> ScreenPosition {
        let (azimuth, elevation) = antipode(sun_azimuth, sun_elevation);
        self.project(azimuth, elevation)
    }
}

impl Default for Projector {
    fn default() -> Self {
        Self {
            orbit: OrbitConfig::default(),
            house_angle: DEFAULT_HOUSE_ANGLE,
            invert_azimuth: false,
        }
    }
}
