//! Sky-domain generators for property-based testing
//!
//! Generators produce plain `f64`/`i64`/`String` values so any crate can use
//! them without depending on the widget types.

use proptest::prelude::*;

/// One simulated day of demo time (ms)
pub const DEMO_CYCLE_MS: i64 = 60_000;

// ============================================================================
// Angle Generators
// ============================================================================

/// Azimuth in [0, 360)
pub fn azimuth_deg() -> impl Strategy<Value = f64> {
    0.0f64..360.0
}

/// Azimuth well outside the nominal range, both signs
pub fn azimuth_any() -> impl Strategy<Value = f64> {
    -720.0f64..720.0
}

/// Elevation in [-180, 180]
pub fn elevation_deg() -> impl Strategy<Value = f64> {
    -180.0f64..=180.0
}

/// House orientation offset
pub fn house_angle_deg() -> impl Strategy<Value = f64> {
    -360.0f64..360.0
}

/// NaN or either infinity
pub fn non_finite() -> impl Strategy<Value = f64> {
    prop_oneof![
        Just(f64::NAN),
        Just(f64::INFINITY),
        Just(f64::NEG_INFINITY),
    ]
}

// ============================================================================
// Orbit Generators
// ============================================================================

/// Orbit shape (rx, ry, cx, cy, tilt), deliberately allowed to overflow the canvas
pub fn orbit_params() -> impl Strategy<Value = (f64, f64, f64, f64, f64)> {
    (
        0.0f64..150.0,
        0.0f64..150.0,
        -50.0f64..150.0,
        -50.0f64..150.0,
        -180.0f64..180.0,
    )
}

// ============================================================================
// Time Generators
// ============================================================================

/// Demo offset spanning up to ten simulated days (ms)
pub fn demo_offset_ms() -> impl Strategy<Value = i64> {
    0i64..10 * DEMO_CYCLE_MS
}

/// Wall-clock step between two ticks (ms)
pub fn tick_delta_ms() -> impl Strategy<Value = i64> {
    0i64..=2_000
}

/// Sequence of tick steps
pub fn tick_deltas(max_len: usize) -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(tick_delta_ms(), 1..=max_len)
}

/// Fractional hour of day
pub fn hour_of_day() -> impl Strategy<Value = f64> {
    0.0f64..24.0
}

// ============================================================================
// Host State Generators
// ============================================================================

/// Weather entity state strings as hosts report them, plus noise
pub fn weather_state() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("sunny".to_string()),
        Just("clear-night".to_string()),
        Just("partlycloudy".to_string()),
        Just("cloudy".to_string()),
        Just("rainy".to_string()),
        Just("pouring".to_string()),
        Just("lightning-rainy".to_string()),
        Just("snowy".to_string()),
        Just("fog".to_string()),
        Just("windy".to_string()),
        "[A-Za-z -]{0,24}",
    ]
}

/// Wind speed including negative sensor glitches
pub fn wind_speed_kmh() -> impl Strategy<Value = f64> {
    -50.0f64..200.0
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn test_azimuth_bounds(v in azimuth_deg()) {
            prop_assert!(v >= 0.0);
            prop_assert!(v < 360.0);
        }

        #[test]
        fn test_non_finite_is_never_finite(v in non_finite()) {
            prop_assert!(!v.is_finite());
        }

        #[test]
        fn test_tick_deltas_non_empty(v in tick_deltas(8)) {
            prop_assert!(!v.is_empty());
            prop_assert!(v.len() <= 8);
            prop_assert!(v.iter().all(|d| *d >= 0));
        }
    }
}
