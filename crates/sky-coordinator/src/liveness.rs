//! Heartbeat liveness
//!
//! A member is live while attached and heard from within the timeout. Members
//! keep registration order; elections walk them in that order but nothing
//! should depend on which of two equal claimants wins.

use serde::{Deserialize, Serialize};
use tracing::debug;

use sky_geometry::Projector;

use crate::InstanceId;

/// Silence after which a member stops counting as live (ms)
pub const LIVENESS_TIMEOUT_MS: i64 = 5_000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Member {
    pub id: InstanceId,
    pub registered_ms: i64,
    pub last_seen_ms: i64,
    pub attached: bool,
    /// Runs the demo simulation locally
    pub demo_enabled: bool,
    /// Projection settings used when this member drives the demo
    pub projector: Projector,
}

impl Member {
    pub fn is_live(&self, now_ms: i64, timeout_ms: i64) -> bool {
        self.attached && now_ms - self.last_seen_ms <= timeout_ms
    }
}

#[derive(Debug, Clone)]
pub struct MemberTable {
    members: Vec<Member>,
    timeout_ms: i64,
}

impl MemberTable {
    pub fn new(timeout_ms: i64) -> Self {
        Self {
            members: Vec::new(),
            timeout_ms,
        }
    }

    /// Add or refresh a member; registering counts as attached and seen
    pub fn register(
        &mut self,
        id: InstanceId,
        demo_enabled: bool,
        projector: Projector,
        now_ms: i64,
    ) {
        match self.members.iter_mut().find(|m| m.id == id) {
            Some(member) => {
                member.demo_enabled = demo_enabled;
                member.projector = projector;
                member.attached = true;
                member.last_seen_ms = now_ms;
            }
            None => self.members.push(Member {
                id,
                registered_ms: now_ms,
                last_seen_ms: now_ms,
                attached: true,
                demo_enabled,
                projector,
            }),
        }
    }

    pub fn remove(&mut self, id: InstanceId) -> Option<Member> {
        let index = self.members.iter().position(|m| m.id == id)?;
        Some(self.members.remove(index))
    }

    /// Returns false for unknown members
    pub fn heartbeat(&mut self, id: InstanceId, now_ms: i64) -> bool {
        match self.members.iter_mut().find(|m| m.id == id) {
            Some(member) => {
                member.last_seen_ms = member.last_seen_ms.max(now_ms);
                true
            }
            None => false,
        }
    }

    pub fn set_attached(&mut self, id: InstanceId, attached: bool, now_ms: i64) -> bool {
        match self.members.iter_mut().find(|m| m.id == id) {
            Some(member) => {
                if member.attached != attached {
                    debug!("Instance {} attached={}", id, attached);
                }
                member.attached = attached;
                member.last_seen_ms = member.last_seen_ms.max(now_ms);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: InstanceId) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.get(id).is_some()
    }

    pub fn is_live(&self, id: InstanceId, now_ms: i64) -> bool {
        self.get(id)
            .map(|m| m.is_live(now_ms, self.timeout_ms))
            .unwrap_or(false)
    }

    pub fn is_demo_enabled(&self, id: InstanceId) -> bool {
        self.get(id).map(|m| m.demo_enabled).unwrap_or(false)
    }

    /// Live members in registration order
    pub fn live(&self, now_ms: i64) -> impl Iterator<Item = &Member> + '_ {
        let timeout_ms = self.timeout_ms;
        self.members
            .iter()
            .filter(move |m| m.is_live(now_ms, timeout_ms))
    }

    pub fn ids(&self) -> Vec<InstanceId> {
        self.members.iter().map(|m| m.id).collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl Default for MemberTable {
    fn default() -> Self {
        Self::new(LIVENESS_TIMEOUT_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_liveness_window() {
        let mut table = MemberTable::default();
        let id = InstanceId::new();
        table.register(id, false, Projector::default(), 1_000);

        assert!(table.is_live(id, 1_000));
        assert!(table.is_live(id, 6_000));
        assert!(!table.is_live(id, 6_001));

        assert!(table.heartbeat(id, 6_500));
        assert!(table.is_live(id, 11_000));
    }

    #[test]
    fn test_detached_member_is_not_live() {
        let mut table = MemberTable::default();
        let id = InstanceId::new();
        table.register(id, true, Projector::default(), 0);

        assert!(table.set_attached(id, false, 10));
        assert!(!table.is_live(id, 10));
        assert!(table.contains(id));

        table.set_attached(id, true, 20);
        assert!(table.is_live(id, 20));
    }

    #[test]
    fn test_unknown_members() {
        let mut table = MemberTable::default();
        let ghost = InstanceId::new();
        assert!(!table.heartbeat(ghost, 0));
        assert!(!table.set_attached(ghost, true, 0));
        assert!(!table.is_live(ghost, 0));
        assert!(table.remove(ghost).is_none());
    }

    #[test]
    fn test_registration_order_and_reregister() {
        let mut table = MemberTable::default();
        let a = InstanceId::new();
        let b = InstanceId::new();
        table.register(a, false, Projector::default(), 0);
        table.register(b, true, Projector::default(), 5);
        table.register(a, true, Projector::default(), 10);

        assert_eq!(table.ids(), vec![a, b]);
        assert_eq!(table.len(), 2);
        assert!(table.is_demo_enabled(a));
        assert_eq!(table.get(a).unwrap().registered_ms, 0);

        let live: Vec<_> = table.live(10).map(|m| m.id).collect();
        assert_eq!(live, vec![a, b]);

        table.remove(a);
        assert_eq!(table.ids(), vec![b]);
    }

    #[test]
    fn test_heartbeat_never_moves_backwards() {
        let mut table = MemberTable::default();
        let id = InstanceId::new();
        table.register(id, false, Projector::default(), 10_000);
        table.heartbeat(id, 2_000);
        assert_eq!(table.get(id).unwrap().last_seen_ms, 10_000);
    }
}
