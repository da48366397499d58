//! Sky Coordinator
//!
//! Lets several widgets show one sky:
//! - `SkyStore`: injectable registry of widget groups, created on first use
//! - Heartbeat liveness table per group
//! - UI-master and data-master election
//! - `WidgetInstance`: configure / receive-state-update / attach / detach lifecycle
//! - `Scheduler`: one tokio task per store ticking every group
//!
//! All group mutation happens under the store lock inside a single call, so a
//! tick never observes a half-updated group.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

pub mod election;
pub mod group;
pub mod liveness;
pub mod scheduler;
pub mod store;
pub mod view;
pub mod widget;

// Re-exports
pub use group::{GroupUpdate, SharedGroupState};
pub use liveness::{Member, MemberTable, LIVENESS_TIMEOUT_MS};
pub use scheduler::Scheduler;
pub use store::{Registration, SkyStore};
pub use view::{BodyView, DemoControls, DemoReadout, DynamicView, LayoutHints, RenderFrame};
pub use widget::WidgetInstance;

use sky_demo::DemoError;
use sky_model::ModelError;

#[derive(Error, Debug)]
pub enum CoordinatorError {
    #[error("Instance {instance} is not registered in group {group}")]
    UnknownInstance { group: GroupId, instance: InstanceId },
    #[error("Instance {0} is not the UI master")]
    NotUiMaster(InstanceId),
    #[error("Instance {0} is not the data master")]
    NotDataMaster(InstanceId),
    #[error("Group {0} is driven by the demo simulation")]
    DemoDriving(GroupId),
    #[error("Instance {0} has no configuration")]
    NotConfigured(InstanceId),
    #[error(transparent)]
    Config(#[from] ModelError),
    #[error(transparent)]
    Demo(#[from] DemoError),
}

pub type Result<T> = std::result::Result<T, CoordinatorError>;

/// Unique per widget instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(Uuid);

impl InstanceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key under which widgets share one sky
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(String);

impl GroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Group holding a single widget with no `singleton_id`
    pub fn private(instance: InstanceId) -> Self {
        Self(format!("instance-{}", instance))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wall clock in milliseconds since the Unix epoch
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
