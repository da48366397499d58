//! Render description
//!
//! What a widget hands to its renderer each frame. The scene only changes on
//! rebuilds; the dynamic view and readout change every update.

use serde::{Deserialize, Serialize};
use std::fmt;

use sky_demo::{DemoCommand, DemoRunState, AUTO};
use sky_geometry::ScreenPosition;
use sky_model::SkyState;
use sky_weather::{Condition, ConditionProfile, Layer, MoonPhase, Scene, SkyPalette};

use crate::InstanceId;

/// Moon opacity while the sun is up
pub const DAYTIME_MOON_OPACITY: f64 = 0.4;

/// Grid sizing hints for the host dashboard
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LayoutHints {
    pub card_size: u32,
    pub min_rows: u32,
    pub max_rows: u32,
    pub min_columns: u32,
    pub max_columns: u32,
}

impl LayoutHints {
    pub const CARD: LayoutHints = LayoutHints {
        card_size: 4,
        min_rows: 2,
        max_rows: 8,
        min_columns: 3,
        max_columns: 12,
    };
}

impl Default for LayoutHints {
    fn default() -> Self {
        Self::CARD
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BodyView {
    pub left: f64,
    pub top: f64,
    pub opacity: f64,
    /// Lit fraction of the disc
    pub illumination: f64,
    pub waning: bool,
}

/// Per-update values: palette, gradient focus and body placement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DynamicView {
    pub palette: SkyPalette,
    /// Gradient center (percent of canvas)
    pub focus_left: f64,
    pub focus_top: f64,
    /// `None` when hidden below the horizon or not in the layer list
    pub sun: Option<BodyView>,
    pub moon: Option<BodyView>,
}

impl DynamicView {
    pub fn compute(state: &SkyState, profile: &ConditionProfile, layers: &[Layer]) -> Self {
        let palette = SkyPalette::select(state.is_night, state.sun.elevation, state.rising, profile);
        let focus = if state.is_night { state.moon } else { state.sun };

        let sun = (layers.contains(&Layer::Sun) && state.sun_visible()).then(|| BodyView {
            left: state.sun.left,
            top: state.sun.top,
            opacity: 1.0,
            illumination: 1.0,
            waning: false,
        });
        let moon = (layers.contains(&Layer::Moon) && state.moon_visible()).then(|| BodyView {
            left: state.moon.left,
            top: state.moon.top,
            opacity: if state.is_night { 1.0 } else { DAYTIME_MOON_OPACITY },
            illumination: state.moon_phase.illumination(),
            waning: state.moon_phase.is_waning(),
        });

        Self {
            palette,
            focus_left: focus.left,
            focus_top: focus.top,
            sun,
            moon,
        }
    }
}

/// Text panel shown on demo widgets
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DemoReadout {
    pub clock: String,
    pub condition: Condition,
    pub wind_speed_kmh: f64,
    pub sun: ScreenPosition,
    pub moon: ScreenPosition,
    pub moon_phase: MoonPhase,
}

impl DemoReadout {
    pub fn from_state(state: &SkyState) -> Self {
        Self {
            clock: state.clock_label(),
            condition: state.condition,
            wind_speed_kmh: state.wind_speed_kmh,
            sun: state.sun,
            moon: state.moon,
            moon_phase: state.moon_phase,
        }
    }

    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("Time: {} | Weather: {}", self.clock, self.condition),
            format!("Wind Speed: {:.1} km/h", self.wind_speed_kmh),
            format!(
                "Sun: Alt: {:.1}° | Az: {:.1}°",
                self.sun.elevation, self.sun.azimuth
            ),
            format!(
                "Moon: Alt: {:.1}° | Az: {:.1}°",
                self.moon.elevation, self.moon.azimuth
            ),
            format!("Phase: {}", self.moon_phase),
        ]
    }
}

impl fmt::Display for DemoReadout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines().join("\n"))
    }
}

/// Transport and condition select, only on the UI master
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DemoControls {
    pub options: Vec<String>,
    pub selected: String,
    pub run_state: DemoRunState,
}

impl DemoControls {
    pub fn new(forced: Option<Condition>, run_state: DemoRunState) -> Self {
        Self {
            options: DemoCommand::condition_options(),
            selected: forced
                .map(|c| c.as_str().to_string())
                .unwrap_or_else(|| AUTO.to_string()),
            run_state,
        }
    }

    /// The play/pause toggle sends this
    pub fn toggle_command(&self) -> DemoCommand {
        match self.run_state {
            DemoRunState::Running => DemoCommand::Pause,
            DemoRunState::Paused | DemoRunState::Stopped => DemoCommand::Play,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderFrame {
    pub instance: InstanceId,
    /// Group version this frame was drawn from
    pub version: u64,
    pub state: SkyState,
    pub scene: Scene,
    /// The scene was regenerated for this frame
    pub scene_rebuilt: bool,
    pub view: DynamicView,
    pub readout: Option<DemoReadout>,
    pub controls: Option<DemoControls>,
}
