//! Widget instance lifecycle
//!
//! configure -> attach -> (receive_state_update | refresh)* -> detach -> drop
//!
//! Lifecycle entry points never fail outward: errors are logged and the
//! previous frame stays in place until the next update succeeds.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use sky_demo::{DemoCommand, DemoRunState};
use sky_model::{local_hour_of_day, CardConfig, HostSnapshot, LiveReader};
use sky_weather::{ConditionTable, Scene, SceneBuilder};

use crate::group::GroupUpdate;
use crate::store::{Registration, SkyStore};
use crate::view::{DemoControls, DemoReadout, DynamicView, LayoutHints, RenderFrame};
use crate::{CoordinatorError, GroupId, InstanceId, Result};

#[derive(Debug)]
pub struct WidgetInstance {
    id: InstanceId,
    store: SkyStore,
    config: Option<CardConfig>,
    group: Option<GroupId>,
    table: ConditionTable,
    live: LiveReader,
    updates: Option<watch::Receiver<GroupUpdate>>,
    attached: bool,
    scene: Option<Scene>,
    frame: Option<RenderFrame>,
    rng: StdRng,
    rebuilds: u64,
    /// Latest host time passed to any lifecycle call
    last_now_ms: i64,
}

impl WidgetInstance {
    pub fn new(store: SkyStore) -> Self {
        Self::with_seed(store, rand::random::<u64>())
    }

    /// Reproducible cloud layout
    pub fn with_seed(store: SkyStore, seed: u64) -> Self {
        Self {
            id: InstanceId::new(),
            store,
            config: None,
            group: None,
            table: ConditionTable::builtin(),
            live: LiveReader::default(),
            updates: None,
            attached: false,
            scene: None,
            frame: None,
            rng: StdRng::seed_from_u64(seed),
            rebuilds: 0,
            last_now_ms: 0,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn group(&self) -> Option<&GroupId> {
        self.group.as_ref()
    }

    pub fn config(&self) -> Option<&CardConfig> {
        self.config.as_ref()
    }

    pub fn frame(&self) -> Option<&RenderFrame> {
        self.frame.as_ref()
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Full scene regenerations so far
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    pub fn layout_hints(&self) -> LayoutHints {
        LayoutHints::CARD
    }

    fn observe(&mut self, now_ms: i64) {
        self.last_now_ms = self.last_now_ms.max(now_ms);
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Apply a configuration; moves the widget between groups if the id changes
    pub fn configure(&mut self, config: CardConfig, now_ms: i64) -> Result<()> {
        self.observe(now_ms);
        config.validate()?;

        let group = config
            .singleton_id
            .as_deref()
            .map(GroupId::new)
            .unwrap_or_else(|| GroupId::private(self.id));

        if let Some(old) = self.group.as_ref().filter(|old| **old != group) {
            self.store.deregister(old, self.id, now_ms);
        }

        let registration = Registration::from_config(self.id, &config);
        self.updates = Some(self.store.register(&group, registration, now_ms));
        self.table = config.condition_table();
        self.live.reconfigure(&config);
        self.scene = None;
        self.attached = true;

        info!(
            "Widget {} configured in group {} (demo={}, layers={:?})",
            self.id,
            group,
            config.demo_enabled(),
            config.layers
        );
        self.group = Some(group);
        self.config = Some(config);
        Ok(())
    }

    pub fn configure_json(&mut self, json: &str, now_ms: i64) -> Result<()> {
        let config = CardConfig::from_json(json)?;
        self.configure(config, now_ms)
    }

    /// Host push; returns whether a new frame was drawn
    pub fn receive_state_update(&mut self, snapshot: &HostSnapshot, now_ms: i64) -> bool {
        self.observe(now_ms);
        match self.try_receive(snapshot, now_ms) {
            Ok(drawn) => drawn,
            Err(e) => {
                error!("Widget {} state update failed: {}", self.id, e);
                false
            }
        }
    }

    fn try_receive(&mut self, snapshot: &HostSnapshot, now_ms: i64) -> Result<bool> {
        let config = self
            .config
            .as_ref()
            .ok_or(CoordinatorError::NotConfigured(self.id))?;
        let group = self
            .group
            .as_ref()
            .ok_or(CoordinatorError::NotConfigured(self.id))?;

        self.store.heartbeat(group, self.id, now_ms)?;

        if !config.demo_enabled() {
            if self.store.claim_data_master(group, self.id, now_ms) {
                if !self.live.accept_push(snapshot, config) {
                    debug!("Widget {} skipped unchanged push", self.id);
                    return Ok(false);
                }
                if let Some(state) = self.live.read(snapshot, config, local_hour_of_day()) {
                    self.store.publish_live(group, self.id, state, now_ms)?;
                }
            } else {
                // Followers remember nothing, so a handover reads the next push in full
                self.live.forget();
            }
        }

        Ok(self.refresh(now_ms))
    }

    pub fn attach(&mut self, now_ms: i64) {
        self.observe(now_ms);
        let Some(group) = self.group.clone() else {
            warn!("Widget {} attached before configuration", self.id);
            return;
        };
        match self.store.set_attached(&group, self.id, true, now_ms) {
            Ok(()) => {
                self.attached = true;
                self.render();
            }
            Err(e) => error!("Widget {} attach failed: {}", self.id, e),
        }
    }

    /// Stops counting as live; mastership passes on at the next check
    pub fn detach(&mut self, now_ms: i64) {
        self.observe(now_ms);
        self.attached = false;
        if let Some(group) = self.group.clone() {
            if let Err(e) = self.store.set_attached(&group, self.id, false, now_ms) {
                error!("Widget {} detach failed: {}", self.id, e);
            }
        }
    }

    /// Heartbeat, then redraw if the group changed; returns whether a frame was drawn
    pub fn refresh(&mut self, now_ms: i64) -> bool {
        self.observe(now_ms);
        if let (Some(group), true) = (self.group.as_ref(), self.attached) {
            if let Err(e) = self.store.heartbeat(group, self.id, now_ms) {
                warn!("Widget {} heartbeat rejected: {}", self.id, e);
            }
        }

        let changed = match self.updates.as_ref() {
            Some(rx) => rx.has_changed().unwrap_or(false),
            None => false,
        };
        if changed || self.frame.is_none() {
            self.render().is_some()
        } else {
            false
        }
    }

    /// Draw from the group's latest state, keeping the previous frame on failure
    pub fn render(&mut self) -> Option<&RenderFrame> {
        match self.try_render() {
            Ok(frame) => self.frame = Some(frame),
            Err(e) => error!("Widget {} render failed: {}", self.id, e),
        }
        self.frame.as_ref()
    }

    fn try_render(&mut self) -> Result<RenderFrame> {
        let config = self
            .config
            .as_ref()
            .ok_or(CoordinatorError::NotConfigured(self.id))?;
        let update = self
            .updates
            .as_mut()
            .ok_or(CoordinatorError::NotConfigured(self.id))?
            .borrow_and_update()
            .clone();
        let state = update.state;
        let demo = config.demo_enabled();

        // Full rebuild on first draw, condition change, or day/night flip in demo mode
        let (scene, scene_rebuilt) = match self.scene.take() {
            Some(scene)
                if scene.condition == state.condition
                    && (!demo || scene.is_night == state.is_night) =>
            {
                (scene, false)
            }
            _ => {
                let scene = SceneBuilder::new(&self.table).build(
                    &config.layers,
                    state.condition,
                    state.is_night,
                    state.wind_speed_kmh,
                    &mut self.rng,
                );
                self.rebuilds += 1;
                (scene, true)
            }
        };
        self.scene = Some(scene.clone());

        let view = DynamicView::compute(&state, self.table.profile(state.condition), &config.layers);
        let readout = demo.then(|| DemoReadout::from_state(&state));
        let controls = (demo && update.ui_master == Some(self.id))
            .then(|| DemoControls::new(update.forced, update.run_state));

        Ok(RenderFrame {
            instance: self.id,
            version: update.version,
            state,
            scene,
            scene_rebuilt,
            view,
            readout,
            controls,
        })
    }

    // ========================================================================
    // Demo controls
    // ========================================================================

    pub fn command(&mut self, command: DemoCommand, now_ms: i64) -> Result<DemoRunState> {
        self.observe(now_ms);
        let group = self
            .group
            .as_ref()
            .ok_or(CoordinatorError::NotConfigured(self.id))?;
        let run_state = self.store.demo_command(group, self.id, command, now_ms)?;
        self.refresh(now_ms);
        Ok(run_state)
    }

    /// Parse a control value ("play", "auto", "snowy"...) and send it
    pub fn command_str(&mut self, command: &str, now_ms: i64) -> Result<DemoRunState> {
        let command = command.parse::<DemoCommand>()?;
        self.command(command, now_ms)
    }
}

impl Drop for WidgetInstance {
    fn drop(&mut self) {
        if let Some(group) = self.group.take() {
            self.store.deregister(&group, self.id, self.last_now_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sky_model::EntityState;
    use sky_weather::{Condition, Layer};

    fn live_config(group: Option<&str>) -> CardConfig {
        CardConfig {
            singleton_id: group.map(str::to_string),
            ..CardConfig::default()
        }
    }

    fn demo_config(group: &str) -> CardConfig {
        CardConfig {
            singleton_id: Some(group.to_string()),
            demo_mode: true,
            ..CardConfig::default()
        }
    }

    fn snapshot(weather: &str, azimuth: f64) -> HostSnapshot {
        snapshot_at(weather, azimuth, 30.0)
    }

    fn snapshot_at(weather: &str, azimuth: f64, elevation: f64) -> HostSnapshot {
        HostSnapshot::new()
            .with_entity("weather.home", EntityState::new(weather))
            .with_entity(
                "sun.sun",
                EntityState::new("above_horizon")
                    .with_attribute("azimuth", azimuth)
                    .with_attribute("elevation", elevation),
            )
    }

    /// One scheduler period as the runner drives it
    fn step(store: &SkyStore, widgets: &mut [&mut WidgetInstance], now: i64) {
        for w in widgets.iter_mut() {
            w.refresh(now);
        }
        store.tick(now);
        for w in widgets.iter_mut() {
            w.refresh(now);
        }
    }

    #[test]
    fn test_live_widget_renders_push() {
        let store = SkyStore::new().with_seed(1);
        let mut w = WidgetInstance::with_seed(store, 1);
        w.configure(live_config(None), 0).unwrap();

        assert!(w.receive_state_update(&snapshot("rainy", 180.0), 10));
        let frame = w.frame().unwrap();
        assert_eq!(frame.state.condition, Condition::Rainy);
        assert!((frame.state.sun.left - 69.02).abs() < 0.01);
        assert!((frame.state.sun.top - 86.25).abs() < 0.01);
        assert!(frame.readout.is_none());
        assert!(frame.controls.is_none());
        assert!(frame.scene_rebuilt);

        let version = frame.version;
        assert!(!w.receive_state_update(&snapshot("rainy", 180.0), 20));
        assert_eq!(w.frame().unwrap().version, version);
    }

    #[test]
    fn test_private_group_without_singleton_id() {
        let store = SkyStore::new();
        let mut a = WidgetInstance::new(store.clone());
        let mut b = WidgetInstance::new(store.clone());
        a.configure(live_config(None), 0).unwrap();
        b.configure(live_config(None), 0).unwrap();

        assert_ne!(a.group(), b.group());
        assert_eq!(store.data_master(a.group().unwrap()), Some(a.id()));
        assert_eq!(store.data_master(b.group().unwrap()), Some(b.id()));
    }

    #[test]
    fn test_followers_mirror_data_master() {
        let store = SkyStore::new().with_seed(1);
        let mut master = WidgetInstance::with_seed(store.clone(), 1);
        let mut follower = WidgetInstance::with_seed(store.clone(), 2);
        master.configure(live_config(Some("hall")), 0).unwrap();
        follower.configure(live_config(Some("hall")), 0).unwrap();

        // The follower's own push is not published
        follower.receive_state_update(&snapshot("snowy", 90.0), 5);
        assert_eq!(
            store.snapshot(&GroupId::new("hall"), 5).state,
            sky_model::SkyState::default()
        );

        master.receive_state_update(&snapshot("fog", 90.0), 10);
        assert!(follower.refresh(10));
        assert_eq!(follower.frame().unwrap().state.condition, Condition::Fog);
    }

    #[test]
    fn test_only_ui_master_gets_controls() {
        let store = SkyStore::new().with_seed(4);
        let mut a = WidgetInstance::with_seed(store.clone(), 1);
        let mut b = WidgetInstance::with_seed(store.clone(), 2);
        a.configure(demo_config("demo"), 0).unwrap();
        b.configure(demo_config("demo"), 0).unwrap();
        step(&store, &mut [&mut a, &mut b], 100);

        let fa = a.frame().unwrap();
        let fb = b.frame().unwrap();
        assert!(fa.controls.is_some());
        assert!(fb.controls.is_none());
        assert!(fa.readout.is_some() && fb.readout.is_some());
        assert_eq!(fa.state, fb.state);

        assert!(matches!(
            b.command(DemoCommand::Pause, 150),
            Err(CoordinatorError::NotUiMaster(_))
        ));

        drop(a);
        step(&store, &mut [&mut b], 200);
        let controls = b.frame().unwrap().controls.clone().unwrap();
        assert_eq!(controls.run_state, DemoRunState::Running);
        assert_eq!(b.command_str("pause", 250).unwrap(), DemoRunState::Paused);
    }

    #[test]
    fn test_ui_master_reconfigured_to_live_passes_controls_on() {
        let store = SkyStore::new().with_seed(4);
        let mut a = WidgetInstance::with_seed(store.clone(), 1);
        let mut b = WidgetInstance::with_seed(store.clone(), 2);
        a.configure(demo_config("g"), 0).unwrap();
        b.configure(demo_config("g"), 0).unwrap();
        step(&store, &mut [&mut a, &mut b], 100);
        assert!(a.frame().unwrap().controls.is_some());

        a.configure(live_config(Some("g")), 150).unwrap();
        for now in [200, 300, 400] {
            step(&store, &mut [&mut a, &mut b], now);
        }

        let group = GroupId::new("g");
        assert_eq!(store.ui_master(&group), Some(b.id()));
        assert_eq!(store.data_master(&group), Some(b.id()));
        assert!(a.frame().unwrap().controls.is_none());
        assert!(b.frame().unwrap().controls.is_some());
        assert_eq!(b.command(DemoCommand::Pause, 450).unwrap(), DemoRunState::Paused);
    }

    #[test]
    fn test_new_data_master_reads_push_seen_as_follower() {
        let store = SkyStore::new().with_seed(1);
        let mut master = WidgetInstance::with_seed(store.clone(), 1);
        let mut follower = WidgetInstance::with_seed(store.clone(), 2);
        master.configure(live_config(Some("hall")), 0).unwrap();
        follower.configure(live_config(Some("hall")), 0).unwrap();

        master.receive_state_update(&snapshot_at("rainy", 180.0, 30.0), 10);
        follower.receive_state_update(&snapshot_at("rainy", 180.0, 30.0), 10);
        let group = GroupId::new("hall");
        assert_eq!(store.snapshot(&group, 10).state.sun.elevation, 30.0);

        drop(master);
        assert!(follower.receive_state_update(&snapshot_at("rainy", 180.0, 5.0), 20));
        assert_eq!(store.data_master(&group), Some(follower.id()));
        assert_eq!(store.snapshot(&group, 20).state.sun.elevation, 5.0);
        assert_eq!(follower.frame().unwrap().state.sun.elevation, 5.0);
    }

    #[test]
    fn test_drop_uses_host_clock() {
        let store = SkyStore::new().with_seed(4);
        let mut a = WidgetInstance::with_seed(store.clone(), 1);
        let mut b = WidgetInstance::with_seed(store.clone(), 2);
        a.configure(demo_config("g"), 0).unwrap();
        b.configure(demo_config("g"), 0).unwrap();
        step(&store, &mut [&mut a, &mut b], 100);
        step(&store, &mut [&mut a, &mut b], 200);

        drop(a);
        let group = GroupId::new("g");
        assert_eq!(store.ui_master(&group), Some(b.id()));

        // The demo keeps advancing on the host's time base
        step(&store, &mut [&mut b], 1_200);
        let hour = b.frame().unwrap().state.simulated_hour;
        assert!((hour - 0.48).abs() < 1e-9);
    }

    #[test]
    fn test_scene_rebuilds_on_condition_and_night_flip() {
        let store = SkyStore::new().with_seed(4);
        let mut w = WidgetInstance::with_seed(store.clone(), 1);
        w.configure(demo_config("economy"), 0).unwrap();
        w.command(DemoCommand::Force(Some(Condition::Fog)), 0).unwrap();
        assert_eq!(w.rebuilds(), 1);
        assert!(w.frame().unwrap().state.is_night);

        // 04:00 and 05:00 are still night
        step(&store, &mut [&mut w], 10_000);
        step(&store, &mut [&mut w], 12_500);
        assert_eq!(w.rebuilds(), 1);

        // 07:00 is day
        step(&store, &mut [&mut w], 17_500);
        assert_eq!(w.rebuilds(), 2);
        assert!(!w.frame().unwrap().state.is_night);

        step(&store, &mut [&mut w], 20_000);
        assert_eq!(w.rebuilds(), 2);

        w.command_str("cloudy", 20_000).unwrap();
        assert_eq!(w.rebuilds(), 3);
        assert_eq!(w.frame().unwrap().scene.condition, Condition::Cloudy);
    }

    #[test]
    fn test_detach_and_attach() {
        let store = SkyStore::new().with_seed(4);
        let mut a = WidgetInstance::with_seed(store.clone(), 1);
        let mut b = WidgetInstance::with_seed(store.clone(), 2);
        a.configure(demo_config("hall"), 0).unwrap();
        b.configure(demo_config("hall"), 0).unwrap();
        let group = GroupId::new("hall");

        a.detach(10);
        assert!(!a.is_attached());
        assert_eq!(store.ui_master(&group), Some(b.id()));

        a.attach(20);
        assert!(a.is_attached());
        assert_eq!(store.ui_master(&group), Some(b.id()));
    }

    #[test]
    fn test_reconfigure_moves_group() {
        let store = SkyStore::new();
        let mut w = WidgetInstance::new(store.clone());
        w.configure(live_config(Some("one")), 0).unwrap();
        w.configure(live_config(Some("two")), 1).unwrap();

        assert!(!store.is_live(&GroupId::new("one"), w.id(), 1));
        assert_eq!(store.data_master(&GroupId::new("two")), Some(w.id()));
    }

    #[test]
    fn test_unconfigured_widget_absorbs_errors() {
        let mut w = WidgetInstance::new(SkyStore::new());
        assert!(!w.receive_state_update(&snapshot("rainy", 1.0), 0));
        assert!(w.render().is_none());
        assert!(!w.refresh(0));
        w.attach(0);
        assert!(!w.is_attached());
        assert!(matches!(
            w.command(DemoCommand::Play, 0),
            Err(CoordinatorError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_layers_drive_scene() {
        let store = SkyStore::new();
        let mut w = WidgetInstance::with_seed(store, 3);
        let config = CardConfig {
            layers: vec![Layer::Sky, Layer::Foreground],
            ..CardConfig::default()
        };
        w.configure(config, 0).unwrap();
        w.receive_state_update(&snapshot("pouring", 120.0), 1);

        let frame = w.frame().unwrap();
        assert_eq!(frame.scene.layers.len(), 2);
        assert!(frame.scene.layer(Layer::Foreground).is_some());
        assert!(frame.view.sun.is_none());
        assert_eq!(w.layout_hints().card_size, 4);
    }
}
