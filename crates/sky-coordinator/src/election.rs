//! Master election
//!
//! Idempotent claim rules, re-applied by every instance on every check:
//! - a claimant keeps mastership it already holds
//! - with no recorded master, the claimant takes it
//! - a recorded master that is no longer live loses it to the claimant
//!
//! For the data master, a demo-enabled claimant also displaces a live master
//! that is not demo-enabled.

use crate::liveness::MemberTable;
use crate::InstanceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Advances demo time and shows the transport controls
    Ui,
    /// Supplies live sensor data when no demo is driving
    Data,
}

/// Whether `claimant` ends up recorded as master for `role`
pub fn claims(
    role: Role,
    recorded: Option<InstanceId>,
    claimant: InstanceId,
    members: &MemberTable,
    now_ms: i64,
) -> bool {
    let base = match recorded {
        None => true,
        Some(master) if master == claimant => true,
        Some(master) => !members.is_live(master, now_ms),
    };

    match (role, recorded) {
        (Role::Data, Some(master)) if !base => {
            members.is_demo_enabled(claimant) && !members.is_demo_enabled(master)
        }
        _ => base,
    }
}
