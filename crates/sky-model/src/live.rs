//! Live sensor reader
//!
//! Turns a host snapshot into a `SkyState`:
//! - weather and sun entities are required; without them there is no state
//! - out-of-range or non-numeric sun readings fall back to 0 with a warning
//! - each moon sensor falls back independently to the sun's antipode
//! - the moon phase falls back to Full Moon
//!
//! Nothing here fails; problems are logged and replaced by defaults.

use chrono::{Local, Timelike};
use tracing::{debug, warn};

use sky_geometry::{antipode, SkyProjectors};
use sky_weather::{classify, MoonPhase};

use crate::snapshot::{EntityState, HostSnapshot};
use crate::{CardConfig, SkyState};

/// Sun state reported while the sun is down
pub const BELOW_HORIZON: &str = "below_horizon";

const AZIMUTH_RANGE: (f64, f64) = (0.0, 360.0);
const ELEVATION_RANGE: (f64, f64) = (-180.0, 180.0);

/// Local wall-clock time as a fractional hour
pub fn local_hour_of_day() -> f64 {
    let now = Local::now();
    now.hour() as f64 + now.minute() as f64 / 60.0
}

fn in_range(value: Option<f64>, (min, max): (f64, f64)) -> Option<f64> {
    value.filter(|v| *v >= min && *v <= max)
}

fn sun_reading(sun: &EntityState, key: &str, range: (f64, f64)) -> f64 {
    match in_range(sun.attribute_f64(key), range) {
        Some(v) => v,
        None => {
            warn!(
                "Sun {} missing or outside [{}, {}] ({:?}), using 0",
                key,
                range.0,
                range.1,
                sun.attribute(key)
            );
            0.0
        }
    }
}

fn moon_reading(
    snapshot: &HostSnapshot,
    entity_id: &str,
    range: (f64, f64),
    fallback: f64,
) -> f64 {
    match snapshot.entity(entity_id) {
        Some(entity) => match in_range(entity.numeric_state(), range) {
            Some(v) => v,
            None => {
                warn!(
                    "Moon sensor {} reads {:?}, using sun antipode {:.1}",
                    entity_id, entity.state, fallback
                );
                fallback
            }
        },
        None => {
            debug!("Moon sensor {} absent, using sun antipode", entity_id);
            fallback
        }
    }
}

/// Build a `SkyState` from live data, `None` when a required entity is missing
pub fn read_live(
    snapshot: &HostSnapshot,
    config: &CardConfig,
    projectors: &mut SkyProjectors,
    hour_of_day: f64,
) -> Option<SkyState> {
    let Some(weather) = snapshot.entity(&config.location) else {
        warn!("Weather entity {} not found", config.location);
        return None;
    };
    let Some(sun) = snapshot.entity(&config.sun_entity) else {
        warn!("Sun entity {} not found", config.sun_entity);
        return None;
    };

    let condition = classify(&weather.state);
    let is_night = sun.state == BELOW_HORIZON;

    let sun_azimuth = sun_reading(sun, "azimuth", AZIMUTH_RANGE);
    let sun_elevation = sun_reading(sun, "elevation", ELEVATION_RANGE);
    let rising = sun.attribute_bool("rising").unwrap_or(false);

    let (anti_azimuth, anti_elevation) = antipode(sun_azimuth, sun_elevation);
    let moon_azimuth = moon_reading(
        snapshot,
        &config.moon_azimuth_entity,
        AZIMUTH_RANGE,
        anti_azimuth,
    );
    let moon_elevation = moon_reading(
        snapshot,
        &config.moon_elevation_entity,
        ELEVATION_RANGE,
        anti_elevation,
    );

    let moon_phase = match snapshot.entity(&config.moon_phase_entity) {
        Some(entity) => entity.state.parse::<MoonPhase>().unwrap_or_else(|e| {
            warn!("{}, using {}", e, MoonPhase::default());
            MoonPhase::default()
        }),
        None => MoonPhase::default(),
    };

    let moon_phase_degrees = config
        .moon_phase_degrees_entity
        .as_deref()
        .and_then(|id| match snapshot.entity(id).and_then(|e| e.numeric_state()) {
            Some(deg) => Some(deg.rem_euclid(360.0)),
            None => {
                warn!("Moon phase angle sensor {} unusable, using phase name", id);
                None
            }
        })
        .unwrap_or_else(|| moon_phase.nominal_degrees());

    let wind_speed_kmh = weather
        .attribute_f64("wind_speed")
        .map(|w| w.max(0.0))
        .unwrap_or(0.0);

    let state = SkyState {
        condition,
        is_night,
        sun: projectors.sun.project(sun_azimuth, sun_elevation),
        moon: projectors.moon.project(moon_azimuth, moon_elevation),
        moon_phase,
        moon_phase_degrees,
        rising,
        simulated_hour: hour_of_day,
        wind_speed_kmh,
    };
    debug!(
        "Live state: {} night={} sun=({:.1}, {:.1})",
        state.condition, state.is_night, sun_azimuth, sun_elevation
    );
    Some(state)
}

/// What a push is compared on to decide whether it changes anything
#[derive(Debug, Clone, PartialEq)]
pub struct PushFingerprint {
    pub weather_state: Option<String>,
    pub sun_azimuth: Option<serde_json::Value>,
}

impl PushFingerprint {
    pub fn of(snapshot: &HostSnapshot, config: &CardConfig) -> Self {
        Self {
            weather_state: snapshot.entity(&config.location).map(|e| e.state.clone()),
            sun_azimuth: snapshot
                .entity(&config.sun_entity)
                .and_then(|e| e.attribute("azimuth").cloned()),
        }
    }
}

/// Per-widget live reader with projection caches and push change detection
#[derive(Debug, Clone, Default)]
pub struct LiveReader {
    projectors: SkyProjectors,
    previous: Option<PushFingerprint>,
    skipped: u64,
}

impl LiveReader {
    pub fn new(config: &CardConfig) -> Self {
        Self {
            projectors: SkyProjectors::new(config.projector()),
            previous: None,
            skipped: 0,
        }
    }

    /// Re-apply projection settings after a reconfigure; forgets the last push
    pub fn reconfigure(&mut self, config: &CardConfig) {
        self.projectors.set_projector(config.projector());
        self.previous = None;
    }

    /// Record the push, returning false when weather and sun azimuth are unchanged
    pub fn accept_push(&mut self, snapshot: &HostSnapshot, config: &CardConfig) -> bool {
        let fingerprint = PushFingerprint::of(snapshot, config);
        if self.previous.as_ref() == Some(&fingerprint) {
            self.skipped += 1;
            return false;
        }
        self.previous = Some(fingerprint);
        true
    }

    /// Drop the remembered push so the next one is read in full
    pub fn forget(&mut self) {
        self.previous = None;
    }

    pub fn read(
        &mut self,
        snapshot: &HostSnapshot,
        config: &CardConfig,
        hour_of_day: f64,
    ) -> Option<SkyState> {
        read_live(snapshot, config, &mut self.projectors, hour_of_day)
    }

    pub fn projectors(&self) -> &SkyProjectors {
        &self.projectors
    }

    /// Pushes ignored as unchanged
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}
