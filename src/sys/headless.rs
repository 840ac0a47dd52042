//! An in-memory window system.
//!
//! Used to drive the reactor from scenario files and recordings, and as the
//! window system in tests. The world is shared behind a mutex so the driver
//! can keep mutating it (focus, minimize, new windows) while the reactor owns
//! the [`HeadlessWindowSystem`] handle.

mod scenario;

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

pub use scenario::{Scenario, Step};

use crate::common::collections::{HashMap, HashSet};
use crate::sys::geometry::Rect;
use crate::sys::window_system::{
    ListenerHandle, SubscriptionKind, WindowId, WindowInfo, WindowKind, WindowSystem,
    WindowSystemError,
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HeadlessWindow {
    pub id: WindowId,
    #[serde(default)]
    pub title: String,
    pub frame: Rect,
    #[serde(default)]
    pub info: WindowInfo,
}

impl HeadlessWindow {
    pub fn normal(id: u64, frame: Rect) -> HeadlessWindow {
        HeadlessWindow {
            id: WindowId::new(id),
            title: format!("window {id}"),
            frame,
            info: WindowInfo::default(),
        }
    }

    pub fn with_kind(mut self, kind: WindowKind) -> HeadlessWindow {
        self.info.kind = kind;
        self
    }

    pub fn skip_taskbar(mut self) -> HeadlessWindow {
        self.info.skip_taskbar = true;
        self
    }

    pub fn minimized(mut self) -> HeadlessWindow {
        self.info.minimized = true;
        self
    }
}

#[derive(Debug, Default)]
pub struct HeadlessWorld {
    windows: Vec<HeadlessWindow>,
    focused: Option<WindowId>,
    work_area: Option<Rect>,
    next_listener: u64,
    listeners: HashMap<u64, (WindowId, SubscriptionKind)>,
    double_releases: usize,
    rejecting: HashSet<WindowId>,
    frame_log: Vec<(WindowId, Rect)>,
    focus_requests: Vec<WindowId>,
    unminimize_requests: Vec<WindowId>,
}

impl HeadlessWorld {
    pub fn add_window(&mut self, window: HeadlessWindow) {
        self.remove_window(window.id);
        self.windows.push(window);
    }

    pub fn remove_window(&mut self, wid: WindowId) -> Option<HeadlessWindow> {
        let idx = self.windows.iter().position(|w| w.id == wid)?;
        if self.focused == Some(wid) {
            self.focused = None;
        }
        Some(self.windows.remove(idx))
    }

    pub fn window(&self, wid: WindowId) -> Option<&HeadlessWindow> {
        self.windows.iter().find(|w| w.id == wid)
    }

    fn window_mut(&mut self, wid: WindowId) -> Option<&mut HeadlessWindow> {
        self.windows.iter_mut().find(|w| w.id == wid)
    }

    pub fn windows(&self) -> &[HeadlessWindow] { &self.windows }

    pub fn frame_of(&self, wid: WindowId) -> Option<Rect> { self.window(wid).map(|w| w.frame) }

    pub fn focused(&self) -> Option<WindowId> { self.focused }

    pub fn set_focused(&mut self, wid: Option<WindowId>) { self.focused = wid; }

    pub fn set_minimized(&mut self, wid: WindowId, minimized: bool) {
        if let Some(window) = self.window_mut(wid) {
            window.info.minimized = minimized;
        }
    }

    pub fn set_work_area(&mut self, work_area: Option<Rect>) { self.work_area = work_area; }

    /// Makes every later `set_frame` on `wid` fail.
    pub fn reject_frames_for(&mut self, wid: WindowId) { self.rejecting.insert(wid); }

    pub fn accept_frames_for(&mut self, wid: WindowId) { self.rejecting.remove(&wid); }

    pub fn active_listener_count(&self) -> usize { self.listeners.len() }

    pub fn listeners_for(&self, wid: WindowId) -> usize {
        self.listeners.values().filter(|(w, _)| *w == wid).count()
    }

    pub fn has_listener(&self, wid: WindowId, kind: SubscriptionKind) -> bool {
        self.listeners.values().any(|&entry| entry == (wid, kind))
    }

    pub fn double_releases(&self) -> usize { self.double_releases }

    /// Every frame successfully applied, in order.
    pub fn frame_log(&self) -> &[(WindowId, Rect)] { &self.frame_log }

    pub fn take_frame_log(&mut self) -> Vec<(WindowId, Rect)> { std::mem::take(&mut self.frame_log) }

    pub fn focus_requests(&self) -> &[WindowId] { &self.focus_requests }

    pub fn unminimize_requests(&self) -> &[WindowId] { &self.unminimize_requests }
}

/// Handle to a shared [`HeadlessWorld`]. Clones share the same world.
#[derive(Debug, Clone, Default)]
pub struct HeadlessWindowSystem {
    world: Arc<Mutex<HeadlessWorld>>,
}

impl HeadlessWindowSystem {
    pub fn new(work_area: Option<Rect>) -> HeadlessWindowSystem {
        let ws = HeadlessWindowSystem::default();
        ws.world().set_work_area(work_area);
        ws
    }

    pub fn world(&self) -> MutexGuard<'_, HeadlessWorld> { self.world.lock() }
}

impl WindowSystem for HeadlessWindowSystem {
    fn eligible_windows(&self) -> Vec<WindowId> {
        self.world()
            .windows
            .iter()
            .filter(|w| w.info.is_eligible())
            .map(|w| w.id)
            .collect()
    }

    fn focused_window(&self) -> Option<WindowId> { self.world().focused }

    fn window_info(&self, wid: WindowId) -> Option<WindowInfo> {
        self.world().window(wid).map(|w| w.info)
    }

    fn frame(&self, wid: WindowId) -> Option<Rect> { self.world().frame_of(wid) }

    fn set_frame(
        &mut self,
        wid: WindowId,
        frame: Rect,
        animate: bool,
    ) -> Result<(), WindowSystemError> {
        let mut world = self.world();
        if world.rejecting.contains(&wid) {
            return Err(WindowSystemError::FrameRejected {
                wid,
                frame,
                reason: "rejected by headless world".to_string(),
            });
        }
        let Some(window) = world.window_mut(wid) else {
            return Err(WindowSystemError::UnknownWindow(wid));
        };
        trace!(?wid, %frame, animate, "headless set_frame");
        window.frame = frame;
        world.frame_log.push((wid, frame));
        Ok(())
    }

    fn work_area(&self) -> Option<Rect> { self.world().work_area }

    fn focus(&mut self, wid: WindowId) {
        let mut world = self.world();
        if world.window(wid).is_some() {
            world.focused = Some(wid);
            world.focus_requests.push(wid);
        } else {
            debug!(?wid, "focus request for unknown window");
        }
    }

    fn unminimize(&mut self, wid: WindowId) {
        let mut world = self.world();
        world.set_minimized(wid, false);
        world.unminimize_requests.push(wid);
    }

    fn subscribe(
        &mut self,
        wid: WindowId,
        kind: SubscriptionKind,
    ) -> Result<ListenerHandle, WindowSystemError> {
        let mut world = self.world();
        if world.window(wid).is_none() {
            return Err(WindowSystemError::SubscribeFailed { wid, kind });
        }
        world.next_listener += 1;
        let id = world.next_listener;
        world.listeners.insert(id, (wid, kind));
        Ok(ListenerHandle::new(id, wid))
    }

    fn unsubscribe(&mut self, handle: ListenerHandle) {
        let mut world = self.world();
        if world.listeners.remove(&handle.id()).is_none() {
            world.double_releases += 1;
        }
    }
}
