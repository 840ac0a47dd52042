use serde::{Deserialize, Serialize};

use crate::model::Role;
use crate::sys::window_system::WindowId;

/// Notifications for the presentation layer. Nothing flows back.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[serde(tag = "type")]
pub enum BroadcastEvent {
    RoleChanged { window: WindowId, role: Role },
    ThemeSelected { name: String },
    /// The reactor was disabled and every window was handed back.
    LayoutCleared,
}

pub type BroadcastSender = crate::actor::Sender<BroadcastEvent>;
pub type BroadcastReceiver = crate::actor::Receiver<BroadcastEvent>;
