//! Decorative scene generation
//!
//! Expands a condition profile into per-layer particle counts and cloud
//! parameters. Randomness comes from the caller's RNG so a seeded RNG gives a
//! reproducible scene.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::profile::{CloudPreset, ConditionTable};
use crate::{Condition, Result, WeatherError};

/// Stars drawn on the night sky layer
pub const NIGHT_STARS: u32 = 100;
/// Shooting stars drawn on the night sky layer
pub const SHOOTING_STARS: u32 = 2;
/// Fog banks drawn for foggy conditions
pub const FOG_BANKS: u32 = 5;

/// Cloud drift speed reference: seconds to cross at 0 km/h divided by this
const CLOUD_DRIFT_BASE: f64 = 20.0;

/// Stacked visual layers, drawn in `z_index` order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Layer {
    Sky,
    Sun,
    Moon,
    Background,
    Foreground,
    #[serde(alias = "demo_controls")]
    DemoControls,
}

impl Layer {
    pub const DEFAULT_ORDER: [Layer; 5] = [
        Layer::Sky,
        Layer::Sun,
        Layer::Moon,
        Layer::Background,
        Layer::Foreground,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sky => "sky",
            Self::Sun => "sun",
            Self::Moon => "moon",
            Self::Background => "background",
            Self::Foreground => "foreground",
            Self::DemoControls => "demo-controls",
        }
    }

    pub fn z_index(&self) -> u32 {
        match self {
            Self::Sky => 1,
            Self::Sun | Self::Moon => 2,
            Self::Background => 3,
            Self::Foreground => 4,
            Self::DemoControls => 10,
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Layer {
    type Err = WeatherError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sky" => Ok(Self::Sky),
            "sun" => Ok(Self::Sun),
            "moon" => Ok(Self::Moon),
            "background" => Ok(Self::Background),
            "foreground" => Ok(Self::Foreground),
            "demo-controls" | "demo_controls" => Ok(Self::DemoControls),
            _ => Err(WeatherError::UnknownLayer(s.to_string())),
        }
    }
}

/// One drifting cloud
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CloudSpec {
    /// Puff base size (px)
    pub base_size: f64,
    pub width: f64,
    pub height: f64,
    /// Vertical placement, percent of canvas
    pub top_pct: f64,
    /// Seconds to drift across the canvas
    pub drift_secs: f64,
    /// Negative start offset so clouds don't enter in lockstep
    pub delay_secs: f64,
    pub puffs: u32,
    /// Grey channel of the cloud body (255 = white)
    pub shade: u8,
    pub opacity: f64,
    /// Day clouds are screen-blended, night clouds are not
    pub screen_blend: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerContent {
    Sky {
        stars: u32,
        shooting_stars: u32,
    },
    Sun,
    Moon,
    Background {
        clouds: Vec<CloudSpec>,
    },
    Foreground {
        lightning: bool,
        clouds: Vec<CloudSpec>,
        drops: u32,
        flakes: u32,
        fog_banks: u32,
    },
    DemoControls,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayerScene {
    pub layer: Layer,
    pub z_index: u32,
    pub content: LayerContent,
}

/// Full decorative description, rebuilt when the condition or day/night changes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scene {
    pub condition: Condition,
    pub is_night: bool,
    pub layers: Vec<LayerScene>,
}

impl Scene {
    pub fn layer(&self, layer: Layer) -> Option<&LayerScene> {
        self.layers.iter().find(|l| l.layer == layer)
    }

    pub fn cloud_count(&self) -> usize {
        self.layers
            .iter()
            .map(|l| match &l.content {
                LayerContent::Background { clouds } => clouds.len(),
                LayerContent::Foreground { clouds, .. } => clouds.len(),
                _ => 0,
            })
            .sum()
    }
}

pub struct SceneBuilder<'a> {
    table: &'a ConditionTable,
}

impl<'a> SceneBuilder<'a> {
    pub fn new(table: &'a ConditionTable) -> Self {
        Self { table }
    }

    pub fn build<R: Rng>(
        &self,
        layers: &[Layer],
        condition: Condition,
        is_night: bool,
        wind_speed_kmh: f64,
        rng: &mut R,
    ) -> Scene {
        let profile = self.table.profile(condition);
        let has_clouds = profile.clouds != CloudPreset::None;
        let background = condition.clouds_in_background();

        let layers = layers
            .iter()
            .map(|&layer| {
                let content = match layer {
                    Layer::Sky => LayerContent::Sky {
                        stars: if is_night { NIGHT_STARS } else { 0 },
                        shooting_stars: if is_night { SHOOTING_STARS } else { 0 },
                    },
                    Layer::Sun => LayerContent::Sun,
                    Layer::Moon => LayerContent::Moon,
                    Layer::Background => LayerContent::Background {
                        clouds: if background && has_clouds {
                            self.clouds(profile.clouds, is_night, wind_speed_kmh, rng)
                        } else {
                            Vec::new()
                        },
                    },
                    Layer::Foreground => LayerContent::Foreground {
                        lightning: profile.lightning,
                        clouds: if !background && has_clouds {
                            self.clouds(profile.clouds, is_night, wind_speed_kmh, rng)
                        } else {
                            Vec::new()
                        },
                        drops: profile.drops,
                        flakes: profile.flakes,
                        fog_banks: if profile.fog { FOG_BANKS } else { 0 },
                    },
                    Layer::DemoControls => LayerContent::DemoControls,
                };
                LayerScene {
                    layer,
                    z_index: layer.z_index(),
                    content,
                }
            })
            .collect();

        let scene = Scene {
            condition,
            is_night,
            layers,
        };
        debug!(
            "Built scene for {} (night={}): {} clouds",
            condition,
            is_night,
            scene.cloud_count()
        );
        scene
    }

    fn clouds<R: Rng>(
        &self,
        preset: CloudPreset,
        is_night: bool,
        wind_speed_kmh: f64,
        rng: &mut R,
    ) -> Vec<CloudSpec> {
        let shape = self.table.cloud_shape(preset);
        let shade = 255u32.saturating_sub(shape.grey.saturating_mul(25)) as u8;
        let wind = if wind_speed_kmh.is_finite() {
            wind_speed_kmh.max(0.0)
        } else {
            0.0
        };
        let base_drift = (CLOUD_DRIFT_BASE / (wind + 1.0)) * 60.0;
        let opacity = if preset == CloudPreset::Heavy { 0.9 } else { 0.7 };

        (0..shape.count)
            .map(|_| {
                let base_size = 60.0 + rng.random::<f64>() * 50.0;
                let factor = rng.random_range(60..=140) as f64 / 100.0;
                let drift_secs = base_drift * factor;
                CloudSpec {
                    base_size,
                    width: base_size * (2.5 + shape.puffs as f64 / 4.0),
                    height: base_size * 2.2,
                    top_pct: rng.random::<f64>() * 95.0,
                    drift_secs,
                    delay_secs: rng.random::<f64>() * drift_secs,
                    puffs: shape.puffs,
                    shade,
                    opacity,
                    screen_blend: !is_night,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn build(condition: Condition, is_night: bool, wind: f64) -> Scene {
        let table = ConditionTable::builtin();
        let mut rng = StdRng::seed_from_u64(7);
        SceneBuilder::new(&table).build(&Layer::DEFAULT_ORDER, condition, is_night, wind, &mut rng)
    }

    #[test]
    fn test_storm_scene() {
        let scene = build(Condition::LightningRainy, false, 30.0);

        match &scene.layer(Layer::Foreground).unwrap().content {
            LayerContent::Foreground {
                lightning,
                clouds,
                drops,
                flakes,
                fog_banks,
            } => {
                assert!(*lightning);
                assert_eq!(clouds.len(), 15);
                assert_eq!(*drops, 500);
                assert_eq!(*flakes, 0);
                assert_eq!(*fog_banks, 0);
                assert!(clouds.iter().all(|c| c.puffs == 5 && c.shade == 155));
                assert!(clouds.iter().all(|c| c.opacity == 0.9 && c.screen_blend));
            }
            other => panic!("unexpected content {:?}", other),
        }

        match &scene.layer(Layer::Background).unwrap().content {
            LayerContent::Background { clouds } => assert!(clouds.is_empty()),
            other => panic!("unexpected content {:?}", other),
        }
    }

    #[test]
    fn test_fair_weather_clouds_go_behind() {
        let scene = build(Condition::PartlyCloudy, false, 10.0);
        match &scene.layer(Layer::Background).unwrap().content {
            LayerContent::Background { clouds } => assert_eq!(clouds.len(), 4),
            other => panic!("unexpected content {:?}", other),
        }
        assert_eq!(scene.cloud_count(), 4);
    }

    #[test]
    fn test_night_sky_has_stars() {
        let night = build(Condition::ClearNight, true, 5.0);
        assert_eq!(
            night.layer(Layer::Sky).unwrap().content,
            LayerContent::Sky {
                stars: NIGHT_STARS,
                shooting_stars: SHOOTING_STARS
            }
        );
        assert_eq!(night.cloud_count(), 0);

        let day = build(Condition::ClearNight, false, 5.0);
        assert_eq!(
            day.layer(Layer::Sky).unwrap().content,
            LayerContent::Sky {
                stars: 0,
                shooting_stars: 0
            }
        );
    }

    #[test]
    fn test_fog_and_snow() {
        let fog = build(Condition::Fog, false, 5.0);
        match &fog.layer(Layer::Foreground).unwrap().content {
            LayerContent::Foreground { fog_banks, clouds, .. } => {
                assert_eq!(*fog_banks, FOG_BANKS);
                assert!(clouds.is_empty());
            }
            other => panic!("unexpected content {:?}", other),
        }

        let snow = build(Condition::Snowy, true, 5.0);
        match &snow.layer(Layer::Foreground).unwrap().content {
            LayerContent::Foreground { flakes, clouds, .. } => {
                assert_eq!(*flakes, 120);
                assert!(clouds.iter().all(|c| !c.screen_blend));
            }
            other => panic!("unexpected content {:?}", other),
        }
    }

    #[test]
    fn test_cloud_drift_follows_wind() {
        let calm = build(Condition::Cloudy, false, 0.0);
        let gale = build(Condition::Cloudy, false, 79.0);

        let bounds = |scene: &Scene, base: f64| match &scene.layer(Layer::Foreground).unwrap().content {
            LayerContent::Foreground { clouds, .. } => clouds.iter().all(|c| {
                c.drift_secs >= base * 0.6 - 1e-9
                    && c.drift_secs <= base * 1.4 + 1e-9
                    && c.delay_secs <= c.drift_secs
                    && (0.0..95.0).contains(&c.top_pct)
                    && (60.0..110.0).contains(&c.base_size)
            }),
            _ => false,
        };
        assert!(bounds(&calm, 1200.0));
        assert!(bounds(&gale, 15.0));
    }

    #[test]
    fn test_seeded_scene_is_reproducible() {
        assert_eq!(build(Condition::Rainy, false, 20.0), build(Condition::Rainy, false, 20.0));
    }

    #[test]
    fn test_layer_order_and_z() {
        let table = ConditionTable::builtin();
        let mut rng = StdRng::seed_from_u64(1);
        let scene = SceneBuilder::new(&table).build(
            &[Layer::Foreground, Layer::Sky, Layer::DemoControls],
            Condition::Sunny,
            false,
            10.0,
            &mut rng,
        );
        let order: Vec<Layer> = scene.layers.iter().map(|l| l.layer).collect();
        assert_eq!(order, vec![Layer::Foreground, Layer::Sky, Layer::DemoControls]);
        assert_eq!(scene.layers[2].z_index, 10);
        assert_eq!("demo_controls".parse::<Layer>(), Ok(Layer::DemoControls));
        assert!("stars".parse::<Layer>().is_err());
    }
}
