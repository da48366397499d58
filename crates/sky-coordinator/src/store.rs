//! Sky store
//!
//! Explicit registry of groups, owned by whatever composes the widgets. Groups
//! are created on first reference and live as long as the store. Cloning the
//! store shares the registry.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use sky_demo::{DemoCommand, DemoRunState, DemoSimulation};
use sky_geometry::Projector;
use sky_model::{CardConfig, SkyState};
use sky_weather::ConditionTable;

use crate::group::{GroupUpdate, SharedGroupState};
use crate::liveness::LIVENESS_TIMEOUT_MS;
use crate::{GroupId, InstanceId, Result};

/// What an instance tells the store when it joins a group
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Registration {
    pub instance: InstanceId,
    pub demo_enabled: bool,
    pub demo_autoplay: bool,
    pub projector: Projector,
}

impl Registration {
    pub fn from_config(instance: InstanceId, config: &CardConfig) -> Self {
        Self {
            instance,
            demo_enabled: config.demo_enabled(),
            demo_autoplay: config.demo_autoplay,
            projector: config.projector(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SkyStore {
    groups: Arc<RwLock<HashMap<GroupId, SharedGroupState>>>,
    /// Fixed demo scenario seed; random per group when unset
    seed: Option<u64>,
    timeout_ms: i64,
}

impl SkyStore {
    pub fn new() -> Self {
        Self {
            groups: Arc::new(RwLock::new(HashMap::new())),
            seed: None,
            timeout_ms: LIVENESS_TIMEOUT_MS,
        }
    }

    /// Reproducible demo scenarios
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_liveness_timeout(mut self, timeout_ms: i64) -> Self {
        self.timeout_ms = timeout_ms.max(0);
        self
    }

    /// Run `f` against a group, creating it first if needed
    fn with_group<T>(
        &self,
        group: &GroupId,
        now_ms: i64,
        f: impl FnOnce(&mut SharedGroupState) -> T,
    ) -> T {
        let mut groups = self.groups.write();
        let state = groups.entry(group.clone()).or_insert_with(|| {
            let table = ConditionTable::builtin();
            let simulation = match self.seed {
                Some(seed) => DemoSimulation::from_table(&table, seed),
                None => DemoSimulation::with_random_seed(&table),
            };
            SharedGroupState::new(group.clone(), simulation, self.timeout_ms, now_ms)
        });
        f(state)
    }

    pub fn group_ids(&self) -> Vec<GroupId> {
        let mut ids: Vec<GroupId> = self.groups.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn group_count(&self) -> usize {
        self.groups.read().len()
    }

    // ========================================================================
    // Membership
    // ========================================================================

    /// Join a group and subscribe to its updates
    pub fn register(
        &self,
        group: &GroupId,
        registration: Registration,
        now_ms: i64,
    ) -> watch::Receiver<GroupUpdate> {
        self.with_group(group, now_ms, |g| {
            g.register(
                registration.instance,
                registration.demo_enabled,
                registration.demo_autoplay,
                registration.projector,
                now_ms,
            );
            g.subscribe()
        })
    }

    /// The group entry itself stays
    pub fn deregister(&self, group: &GroupId, instance: InstanceId, now_ms: i64) -> bool {
        let removed = self.with_group(group, now_ms, |g| g.deregister(instance, now_ms));
        if removed {
            debug!("Deregistered {} from {}", instance, group);
        }
        removed
    }

    pub fn heartbeat(&self, group: &GroupId, instance: InstanceId, now_ms: i64) -> Result<()> {
        self.with_group(group, now_ms, |g| g.heartbeat(instance, now_ms))
    }

    pub fn set_attached(
        &self,
        group: &GroupId,
        instance: InstanceId,
        attached: bool,
        now_ms: i64,
    ) -> Result<()> {
        self.with_group(group, now_ms, |g| g.set_attached(instance, attached, now_ms))
    }

    pub fn is_live(&self, group: &GroupId, instance: InstanceId, now_ms: i64) -> bool {
        self.with_group(group, now_ms, |g| g.members().is_live(instance, now_ms))
    }

    // ========================================================================
    // Election
    // ========================================================================

    pub fn claim_ui_master(&self, group: &GroupId, instance: InstanceId, now_ms: i64) -> bool {
        self.with_group(group, now_ms, |g| g.claim_ui_master(instance, now_ms))
    }

    pub fn claim_data_master(&self, group: &GroupId, instance: InstanceId, now_ms: i64) -> bool {
        self.with_group(group, now_ms, |g| g.claim_data_master(instance, now_ms))
    }

    pub fn ui_master(&self, group: &GroupId) -> Option<InstanceId> {
        self.groups.read().get(group).and_then(|g| g.ui_master())
    }

    pub fn data_master(&self, group: &GroupId) -> Option<InstanceId> {
        self.groups.read().get(group).and_then(|g| g.data_master())
    }

    // ========================================================================
    // State
    // ========================================================================

    pub fn publish_live(
        &self,
        group: &GroupId,
        instance: InstanceId,
        state: SkyState,
        now_ms: i64,
    ) -> Result<bool> {
        self.with_group(group, now_ms, |g| g.publish_live(instance, state, now_ms))
    }

    pub fn demo_command(
        &self,
        group: &GroupId,
        instance: InstanceId,
        command: DemoCommand,
        now_ms: i64,
    ) -> Result<DemoRunState> {
        self.with_group(group, now_ms, |g| g.demo_command(instance, command, now_ms))
    }

    /// Current view of a group; an unknown group reads as a fresh one
    pub fn snapshot(&self, group: &GroupId, now_ms: i64) -> GroupUpdate {
        self.with_group(group, now_ms, |g| g.update())
    }

    pub fn subscribe(&self, group: &GroupId, now_ms: i64) -> watch::Receiver<GroupUpdate> {
        self.with_group(group, now_ms, |g| g.subscribe())
    }

    /// Elect and advance every group; returns how many changed
    pub fn tick(&self, now_ms: i64) -> usize {
        let mut groups = self.groups.write();
        groups
            .values_mut()
            .map(|g| g.refresh(now_ms))
            .filter(|changed| *changed)
            .count()
    }
}

impl Default for SkyStore {
    fn default() -> Self {
        Self::new()
    }
}
