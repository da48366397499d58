//! Demo sky simulation
//!
//! A closed-form function of the simulated-time offset. The only carried state
//! is the shuffled condition order, drawn again at every cycle boundary.
//!
//! Per cycle (one simulated day):
//! - sun azimuth sweeps 0-360, elevation is 35·sin((h-6)·π/12)
//! - the moon sits at the sun's antipode
//! - the eight named phases run four times (a deliberate dramatization)
//! - wind is 15 + |sin(2π·progress)|·65 km/h

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::f64::consts::PI;
use tracing::debug;

use sky_geometry::{antipode, Projector};
use sky_model::SkyState;
use sky_weather::{Condition, ConditionTable, MoonPhase};

/// One simulated day of wall clock (ms)
pub const CYCLE_MS: i64 = 60_000;

const PEAK_ELEVATION: f64 = 35.0;
const LUNATIONS_PER_DAY: f64 = 4.0;
const WIND_MIN_KMH: f64 = 15.0;
const WIND_MAX_KMH: f64 = 80.0;

#[derive(Debug, Clone)]
pub struct DemoSimulation {
    /// Conditions eligible for the shuffled scenario
    pool: Vec<Condition>,
    scenario: Vec<Condition>,
    cycle_id: Option<i64>,
    forced: Option<Condition>,
    rng: StdRng,
}

impl DemoSimulation {
    pub fn new(pool: Vec<Condition>, seed: u64) -> Self {
        Self {
            pool,
            scenario: Vec::new(),
            cycle_id: None,
            forced: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_table(table: &ConditionTable, seed: u64) -> Self {
        Self::new(table.scenario_conditions(), seed)
    }

    /// Unseeded; scenarios differ from run to run
    pub fn with_random_seed(table: &ConditionTable) -> Self {
        Self::from_table(table, rand::random::<u64>())
    }

    /// Pin a condition, or `None` for the shuffled scenario
    pub fn force(&mut self, condition: Option<Condition>) {
        if self.forced != condition {
            debug!("Demo condition override: {:?}", condition);
        }
        self.forced = condition;
    }

    pub fn forced(&self) -> Option<Condition> {
        self.forced
    }

    /// Condition order for the current cycle
    pub fn scenario(&self) -> &[Condition] {
        &self.scenario
    }

    /// Fraction of the current simulated day, in [0, 1)
    pub fn progress(offset_ms: i64) -> f64 {
        offset_ms.rem_euclid(CYCLE_MS) as f64 / CYCLE_MS as f64
    }

    fn roll_scenario(&mut self, offset_ms: i64) {
        let cycle_id = offset_ms.div_euclid(CYCLE_MS);
        if self.cycle_id != Some(cycle_id) {
            self.cycle_id = Some(cycle_id);
            self.scenario = self.pool.clone();
            self.scenario.shuffle(&mut self.rng);
            debug!("Demo cycle {} scenario: {:?}", cycle_id, self.scenario);
        }
    }

    fn scenario_condition(&self, progress: f64) -> Condition {
        if self.scenario.is_empty() {
            return Condition::Sunny;
        }
        let index = (progress * self.scenario.len() as f64).floor() as usize;
        self.scenario[index.min(self.scenario.len() - 1)]
    }

    /// Sky at a simulated-time offset
    pub fn state_at(&mut self, offset_ms: i64, projector: &Projector) -> SkyState {
        self.roll_scenario(offset_ms);

        let progress = Self::progress(offset_ms);
        let hour = progress * 24.0;

        let sun_azimuth = hour / 24.0 * 360.0;
        let sun_elevation = PEAK_ELEVATION * ((hour - 6.0) * PI / 12.0).sin();
        let (moon_azimuth, moon_elevation) = antipode(sun_azimuth, sun_elevation);

        let condition = self
            .forced
            .unwrap_or_else(|| self.scenario_condition(progress));

        let lunation = (progress * LUNATIONS_PER_DAY).fract();
        let phase_count = MoonPhase::ALL.len() as f64;
        let moon_phase = MoonPhase::from_index((lunation * phase_count).floor() as usize);

        let wind_speed_kmh =
            WIND_MIN_KMH + (progress * 2.0 * PI).sin().abs() * (WIND_MAX_KMH - WIND_MIN_KMH);

        SkyState {
            condition,
            is_night: sun_elevation <= 0.0,
            sun: projector.project(sun_azimuth, sun_elevation),
            moon: projector.project(moon_azimuth, moon_elevation),
            moon_phase,
            moon_phase_degrees: lunation * 360.0,
            rising: (6.0..12.0).contains(&hour),
            simulated_hour: hour,
            wind_speed_kmh,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fuzz_harness::prelude::*;

    fn sim() -> DemoSimulation {
        DemoSimulation::from_table(&ConditionTable::builtin(), 42)
    }

    fn at_hour(hour: f64) -> i64 {
        (hour / 24.0 * CYCLE_MS as f64).round() as i64
    }

    #[test]
    fn test_noon_and_midnight() {
        let mut sim = sim();
        let projector = Projector::default();

        let noon = sim.state_at(at_hour(12.0), &projector);
        assert!((noon.sun.elevation - 35.0).abs() < 1e-9);
        assert_eq!(noon.sun.azimuth, 180.0);
        assert!(!noon.is_night);
        assert!(!noon.rising);

        let midnight = sim.state_at(0, &projector);
        assert!((midnight.sun.elevation + 35.0).abs() < 1e-9);
        assert!(midnight.is_night);
        assert_eq!(midnight.moon.azimuth, 180.0);
        assert!((midnight.moon.elevation - 35.0).abs() < 1e-9);
    }

    #[test]
    fn test_sun_crosses_horizon_at_six_and_eighteen() {
        let mut sim = sim();
        let projector = Projector::default();

        assert!(sim.state_at(at_hour(5.9), &projector).sun.elevation < 0.0);
        assert!(sim.state_at(at_hour(6.1), &projector).sun.elevation > 0.0);
        assert!(sim.state_at(at_hour(17.9), &projector).sun.elevation > 0.0);
        assert!(sim.state_at(at_hour(18.1), &projector).sun.elevation < 0.0);

        let morning = sim.state_at(at_hour(8.0), &projector);
        assert!(morning.rising);
        assert!(!morning.is_night);
    }

    #[test]
    fn test_scenario_is_a_permutation_per_cycle() {
        let mut sim = sim();
        let projector = Projector::default();

        sim.state_at(0, &projector);
        let mut first = sim.scenario().to_vec();
        first.sort();
        let mut all = Condition::ALL.to_vec();
        all.sort();
        assert_eq!(first, all);

        // Same cycle, same order
        let before = sim.scenario().to_vec();
        sim.state_at(CYCLE_MS - 1, &projector);
        assert_eq!(sim.scenario(), before.as_slice());
    }

    #[test]
    fn test_scenario_walks_through_every_condition() {
        let mut sim = sim();
        let projector = Projector::default();
        let slot = CYCLE_MS / 9;

        sim.state_at(0, &projector);
        let scenario = sim.scenario().to_vec();
        for (i, expected) in scenario.iter().enumerate() {
            let state = sim.state_at(slot * i as i64 + slot / 2, &projector);
            assert_eq!(state.condition, *expected);
        }
    }

    #[test]
    fn test_same_seed_same_scenario() {
        let projector = Projector::default();
        let mut a = sim();
        let mut b = sim();
        for cycle in 0..5 {
            let offset = cycle * CYCLE_MS;
            assert_eq!(a.state_at(offset, &projector), b.state_at(offset, &projector));
            assert_eq!(a.scenario(), b.scenario());
        }
    }

    #[test]
    fn test_four_lunations_per_day() {
        let mut sim = sim();
        let projector = Projector::default();
        let quarter = CYCLE_MS / 4;

        for lunation in 0..4 {
            let start = sim.state_at(quarter * lunation, &projector);
            assert_eq!(start.moon_phase, MoonPhase::NewMoon);
            assert_eq!(start.moon_phase_degrees, 0.0);
        }
        let halfway = sim.state_at(quarter / 2, &projector);
        assert_eq!(halfway.moon_phase, MoonPhase::FullMoon);
        assert!((halfway.moon_phase_degrees - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_wind_extremes() {
        let mut sim = sim();
        let projector = Projector::default();
        assert_eq!(sim.state_at(0, &projector).wind_speed_kmh, 15.0);
        assert!((sim.state_at(CYCLE_MS / 4, &projector).wind_speed_kmh - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_pool_falls_back_to_sunny() {
        let mut sim = DemoSimulation::new(Vec::new(), 1);
        let state = sim.state_at(1_234, &Projector::default());
        assert_eq!(state.condition, Condition::Sunny);
    }

    proptest! {
        #[test]
        fn prop_forced_condition_never_changes(
            deltas in tick_deltas(128),
            pick in 0usize..9,
        ) {
            let forced = Condition::ALL[pick];
            let projector = Projector::default();
            let mut sim = sim();
            sim.force(Some(forced));

            let mut offset = 0i64;
            for d in deltas {
                offset += d * 50;
                prop_assert_eq!(sim.state_at(offset, &projector).condition, forced);
            }
        }

        #[test]
        fn prop_night_matches_sun_elevation(offset in demo_offset_ms()) {
            let state = sim().state_at(offset, &Projector::default());
            prop_assert_eq!(state.is_night, state.sun.elevation <= 0.0);
            prop_assert!((0.0..24.0).contains(&state.simulated_hour));
            prop_assert!((15.0..=80.0).contains(&state.wind_speed_kmh));
            prop_assert!((0.0..360.0).contains(&state.moon_phase_degrees));
            prop_assert_eq!(state.moon.elevation, -state.sun.elevation);
        }
    }
}
