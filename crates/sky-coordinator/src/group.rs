//! Shared group state
//!
//! One sky per group id: the demo transport and simulation, the two elected
//! masters, the member table and the latest `SkyState`. Every change that a
//! widget could see bumps the version and is pushed to subscribers.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info};

use sky_demo::{DemoClock, DemoCommand, DemoRunState, DemoSimulation};
use sky_geometry::Projector;
use sky_model::SkyState;
use sky_weather::Condition;

use crate::election::{claims, Role};
use crate::liveness::MemberTable;
use crate::{CoordinatorError, GroupId, InstanceId, Result};

/// What subscribers see after each change
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupUpdate {
    pub group: GroupId,
    pub version: u64,
    pub state: SkyState,
    pub run_state: DemoRunState,
    pub forced: Option<Condition>,
    pub ui_master: Option<InstanceId>,
    pub data_master: Option<InstanceId>,
    /// The demo simulation, not live data, is producing `state`
    pub demo_active: bool,
}

#[derive(Debug)]
pub struct SharedGroupState {
    id: GroupId,
    clock: DemoClock,
    simulation: DemoSimulation,
    ui_master: Option<InstanceId>,
    data_master: Option<InstanceId>,
    members: MemberTable,
    latest: SkyState,
    version: u64,
    /// Set once the demo has been played in this group
    ever_played: bool,
    /// `demo_active` as of the last refresh
    demo_active: bool,
    updates: watch::Sender<GroupUpdate>,
}

impl SharedGroupState {
    pub fn new(id: GroupId, simulation: DemoSimulation, timeout_ms: i64, now_ms: i64) -> Self {
        let initial = GroupUpdate {
            group: id.clone(),
            version: 0,
            state: SkyState::default(),
            run_state: DemoRunState::Stopped,
            forced: None,
            ui_master: None,
            data_master: None,
            demo_active: false,
        };
        let (updates, _) = watch::channel(initial);
        debug!("Created group {}", id);

        Self {
            id,
            clock: DemoClock::new(now_ms),
            simulation,
            ui_master: None,
            data_master: None,
            members: MemberTable::new(timeout_ms),
            latest: SkyState::default(),
            version: 0,
            ever_played: false,
            demo_active: false,
            updates,
        }
    }

    pub fn id(&self) -> &GroupId {
        &self.id
    }

    pub fn members(&self) -> &MemberTable {
        &self.members
    }

    pub fn latest(&self) -> &SkyState {
        &self.latest
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn ui_master(&self) -> Option<InstanceId> {
        self.ui_master
    }

    pub fn data_master(&self) -> Option<InstanceId> {
        self.data_master
    }

    pub fn run_state(&self) -> DemoRunState {
        self.clock.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<GroupUpdate> {
        self.updates.subscribe()
    }

    pub fn update(&self) -> GroupUpdate {
        GroupUpdate {
            group: self.id.clone(),
            version: self.version,
            state: self.latest,
            run_state: self.clock.state(),
            forced: self.simulation.forced(),
            ui_master: self.ui_master,
            data_master: self.data_master,
            demo_active: self.demo_active,
        }
    }

    // ========================================================================
    // Membership
    // ========================================================================

    pub fn register(
        &mut self,
        id: InstanceId,
        demo_enabled: bool,
        demo_autoplay: bool,
        projector: Projector,
        now_ms: i64,
    ) {
        let known = self.members.contains(id);
        self.members.register(id, demo_enabled, projector, now_ms);
        if !known {
            info!("Instance {} joined group {} (demo={})", id, self.id, demo_enabled);
        }

        if demo_enabled && demo_autoplay && !self.ever_played {
            self.clock.play(now_ms);
            self.ever_played = true;
        }
        self.refresh(now_ms);
    }

    pub fn deregister(&mut self, id: InstanceId, now_ms: i64) -> bool {
        if self.members.remove(id).is_none() {
            return false;
        }
        info!("Instance {} left group {}", id, self.id);
        self.refresh(now_ms);
        true
    }

    pub fn heartbeat(&mut self, id: InstanceId, now_ms: i64) -> Result<()> {
        if self.members.heartbeat(id, now_ms) {
            Ok(())
        } else {
            Err(self.unknown(id))
        }
    }

    pub fn set_attached(&mut self, id: InstanceId, attached: bool, now_ms: i64) -> Result<()> {
        if !self.members.set_attached(id, attached, now_ms) {
            return Err(self.unknown(id));
        }
        self.refresh(now_ms);
        Ok(())
    }

    fn unknown(&self, instance: InstanceId) -> CoordinatorError {
        CoordinatorError::UnknownInstance {
            group: self.id.clone(),
            instance,
        }
    }

    // ========================================================================
    // Election
    // ========================================================================

    /// Only demo-enabled instances have controls, so only they run for UI master
    pub fn claim_ui_master(&mut self, claimant: InstanceId, now_ms: i64) -> bool {
        self.vacate_ui_master();
        if !self.members.is_live(claimant, now_ms) || !self.members.is_demo_enabled(claimant) {
            return self.ui_master == Some(claimant);
        }
        if claims(Role::Ui, self.ui_master, claimant, &self.members, now_ms) {
            if self.ui_master != Some(claimant) {
                info!("Instance {} is now UI master of {}", claimant, self.id);
                self.ui_master = Some(claimant);
            }
            true
        } else {
            false
        }
    }

    /// A UI master whose card no longer runs the demo gives the role up
    fn vacate_ui_master(&mut self) {
        if let Some(master) = self
            .ui_master
            .filter(|id| !self.members.is_demo_enabled(*id))
        {
            info!("Instance {} is no longer UI master of {}", master, self.id);
            self.ui_master = None;
        }
    }

    pub fn claim_data_master(&mut self, claimant: InstanceId, now_ms: i64) -> bool {
        if !self.members.is_live(claimant, now_ms) {
            return self.data_master == Some(claimant);
        }
        if claims(Role::Data, self.data_master, claimant, &self.members, now_ms) {
            if self.data_master != Some(claimant) {
                info!("Instance {} is now data master of {}", claimant, self.id);
                self.data_master = Some(claimant);
            }
            true
        } else {
            false
        }
    }

    /// Every live member checks once, in registration order
    pub fn run_election(&mut self, now_ms: i64) {
        let live: Vec<InstanceId> = self.members.live(now_ms).map(|m| m.id).collect();
        for id in live {
            self.claim_ui_master(id, now_ms);
            self.claim_data_master(id, now_ms);
        }
    }

    fn live_master(&self, master: Option<InstanceId>, now_ms: i64) -> Option<InstanceId> {
        master.filter(|id| self.members.is_live(*id, now_ms))
    }

    /// The demo drives the group while its data master is a live demo instance
    pub fn is_demo_active(&self, now_ms: i64) -> bool {
        self.live_master(self.data_master, now_ms)
            .map(|id| self.members.is_demo_enabled(id))
            .unwrap_or(false)
    }

    // ========================================================================
    // State
    // ========================================================================

    /// Elect, advance the demo if it is driving, and notify on any change
    pub fn refresh(&mut self, now_ms: i64) -> bool {
        let before = self.update();

        self.run_election(now_ms);
        self.demo_active = self.is_demo_active(now_ms);

        if self.demo_active {
            let driver = self
                .live_master(self.ui_master, now_ms)
                .and_then(|id| self.members.get(id))
                .map(|m| m.projector);
            match driver {
                Some(projector) => {
                    self.clock.tick(now_ms);
                    self.latest = self.simulation.state_at(self.clock.offset_ms(), &projector);
                }
                None => {
                    // Nobody advances time without a UI master
                    self.clock.hold(now_ms);
                }
            }
        } else {
            self.clock.hold(now_ms);
        }

        self.notify_if_changed(before)
    }

    fn notify_if_changed(&mut self, before: GroupUpdate) -> bool {
        if self.update() == before {
            return false;
        }
        self.version += 1;
        self.updates.send_replace(self.update());
        debug!(
            "Group {} v{}: {} night={} {:?}",
            self.id,
            self.version,
            self.latest.condition,
            self.latest.is_night,
            self.clock.state()
        );
        true
    }

    /// Live data from the data master
    pub fn publish_live(&mut self, from: InstanceId, state: SkyState, now_ms: i64) -> Result<bool> {
        if self.data_master != Some(from) || !self.members.is_live(from, now_ms) {
            return Err(CoordinatorError::NotDataMaster(from));
        }
        if self.members.is_demo_enabled(from) {
            return Err(CoordinatorError::DemoDriving(self.id.clone()));
        }
        let before = self.update();
        self.latest = state;
        Ok(self.notify_if_changed(before))
    }

    /// Transport and condition-select actions from the UI master
    pub fn demo_command(
        &mut self,
        from: InstanceId,
        command: DemoCommand,
        now_ms: i64,
    ) -> Result<DemoRunState> {
        if !self.claim_ui_master(from, now_ms) {
            return Err(CoordinatorError::NotUiMaster(from));
        }

        match command {
            DemoCommand::Play => {
                self.clock.play(now_ms);
                self.ever_played = true;
            }
            DemoCommand::Pause => {
                self.clock.pause(now_ms);
            }
            DemoCommand::Stop => {
                self.clock.stop(now_ms);
            }
            DemoCommand::Reset => self.clock.reset(),
            DemoCommand::Force(condition) => self.simulation.force(condition),
        }
        info!("Group {} demo command {} from {}", self.id, command, from);

        self.refresh(now_ms);
        Ok(self.clock.state())
    }
}
