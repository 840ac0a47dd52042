//! The boundary to the windowing system.
//!
//! The reactor never talks to a compositor directly. Everything it needs to
//! know about windows, and every geometry change it makes, goes through the
//! [`WindowSystem`] trait. Notifications flow the other way as
//! [`crate::actor::reactor::Event`]s.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sys::geometry::Rect;

/// Stable identifier the window system assigns to a window.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct WindowId(u64);

impl WindowId {
    pub const fn new(id: u64) -> WindowId { WindowId(id) }

    pub fn as_u64(self) -> u64 { self.0 }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "#{}", self.0) }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    #[default]
    Normal,
    Dialog,
    Utility,
    Splash,
    Dock,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct WindowInfo {
    pub kind: WindowKind,
    pub skip_taskbar: bool,
    pub minimized: bool,
}

impl WindowInfo {
    /// Whether the window takes part in the TV layout at all.
    pub fn is_eligible(&self) -> bool {
        self.kind == WindowKind::Normal && !self.skip_taskbar && !self.minimized
    }
}

/// Per-window signals the reactor listens to on card windows.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SubscriptionKind {
    Focus,
    AppearsFocused,
}

/// Token for one live subscription.
///
/// Handles are neither `Clone` nor `Copy`, and [`WindowSystem::unsubscribe`]
/// consumes them, so the same subscription cannot be released twice.
#[derive(Debug, PartialEq, Eq, Hash)]
#[must_use = "dropping a listener handle leaks the subscription"]
pub struct ListenerHandle {
    id: u64,
    window: WindowId,
}

impl ListenerHandle {
    pub fn new(id: u64, window: WindowId) -> ListenerHandle { ListenerHandle { id, window } }

    pub fn id(&self) -> u64 { self.id }

    pub fn window(&self) -> WindowId { self.window }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WindowSystemError {
    #[error("window {0} is not known to the window system")]
    UnknownWindow(WindowId),
    #[error("window {wid} rejected frame {frame}: {reason}")]
    FrameRejected {
        wid: WindowId,
        frame: Rect,
        reason: String,
    },
    #[error("could not subscribe to {kind} on window {wid}")]
    SubscribeFailed { wid: WindowId, kind: SubscriptionKind },
}

pub trait WindowSystem {
    /// Normal, non-skip-taskbar, non-minimized windows on the active
    /// workspace, in the window system's enumeration order.
    fn eligible_windows(&self) -> Vec<WindowId>;

    fn focused_window(&self) -> Option<WindowId>;

    fn window_info(&self, wid: WindowId) -> Option<WindowInfo>;

    fn frame(&self, wid: WindowId) -> Option<Rect>;

    fn set_frame(&mut self, wid: WindowId, frame: Rect, animate: bool)
    -> Result<(), WindowSystemError>;

    /// Work area of the current monitor, or `None` when no monitor resolves.
    fn work_area(&self) -> Option<Rect>;

    fn focus(&mut self, wid: WindowId);

    fn unminimize(&mut self, wid: WindowId);

    fn subscribe(
        &mut self,
        wid: WindowId,
        kind: SubscriptionKind,
    ) -> Result<ListenerHandle, WindowSystemError>;

    fn unsubscribe(&mut self, handle: ListenerHandle);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eligibility_requires_normal_visible_taskbar_window() {
        assert!(WindowInfo::default().is_eligible());
        assert!(
            !WindowInfo {
                minimized: true,
                ..Default::default()
            }
            .is_eligible()
        );
        assert!(
            !WindowInfo {
                skip_taskbar: true,
                ..Default::default()
            }
            .is_eligible()
        );
        assert!(
            !WindowInfo {
                kind: WindowKind::Dialog,
                ..Default::default()
            }
            .is_eligible()
        );
    }

    #[test]
    fn window_ids_serialize_as_plain_integers() {
        assert_eq!(serde_json::to_string(&WindowId::new(7)).unwrap(), "7");
        assert_eq!(WindowId::new(7).to_string(), "#7");
    }
}
