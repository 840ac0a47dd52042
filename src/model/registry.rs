//! Which windows the reactor knows about, and what it has done to them.

use std::mem;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::common::collections::{HashMap, hash_map};
use crate::sys::geometry::Rect;
use crate::sys::window_system::{ListenerHandle, WindowId, WindowSystem};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Main,
    Card,
    /// Known, but not part of the layout (yet, or any more).
    #[default]
    Untracked,
}

/// Subscriptions owned by one tracked window.
#[derive(Debug, Default)]
pub struct Listeners {
    handles: Vec<ListenerHandle>,
}

impl Listeners {
    pub fn push(&mut self, handle: ListenerHandle) { self.handles.push(handle); }

    pub fn len(&self) -> usize { self.handles.len() }

    pub fn is_empty(&self) -> bool { self.handles.is_empty() }

    /// Unsubscribes everything. The list is emptied before the first
    /// unsubscribe call, so releasing twice is a no-op the second time.
    pub fn release(&mut self, ws: &mut impl WindowSystem) -> usize {
        let handles = mem::take(&mut self.handles);
        let count = handles.len();
        for handle in handles {
            ws.unsubscribe(handle);
        }
        count
    }
}

impl Drop for Listeners {
    fn drop(&mut self) {
        if !self.handles.is_empty() {
            warn!(count = self.handles.len(), "dropping live listener handles");
        }
    }
}

#[derive(Debug)]
pub struct TrackedWindow {
    pub role: Role,
    /// Frame before we touched the window; restored on shutdown.
    pub original_geometry: Rect,
    pub listeners: Listeners,
    /// Card interaction listeners have been installed.
    pub has_click_handlers: bool,
}

impl TrackedWindow {
    fn new(original_geometry: Rect) -> TrackedWindow {
        TrackedWindow {
            role: Role::Untracked,
            original_geometry,
            listeners: Listeners::default(),
            has_click_handlers: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    windows: HashMap<WindowId, TrackedWindow>,
}

impl Registry {
    pub fn new() -> Registry { Registry::default() }

    /// Starts tracking `wid`, remembering `geometry` as its original frame.
    ///
    /// Returns false and leaves the entry untouched if the window is already
    /// tracked; the first captured geometry always wins.
    pub fn track(&mut self, wid: WindowId, geometry: Rect) -> bool {
        match self.windows.entry(wid) {
            hash_map::Entry::Occupied(_) => false,
            hash_map::Entry::Vacant(entry) => {
                entry.insert(TrackedWindow::new(geometry));
                true
            }
        }
    }

    /// Forgets `wid`. Its listeners must have been released already.
    pub fn untrack(&mut self, wid: WindowId) -> bool {
        match self.windows.remove(&wid) {
            Some(window) => {
                if !window.listeners.is_empty() {
                    warn!(?wid, "untracking window with live listeners");
                }
                true
            }
            None => false,
        }
    }

    /// Returns the previous role, or `None` if the window is not tracked.
    pub fn set_role(&mut self, wid: WindowId, role: Role) -> Option<Role> {
        let Some(window) = self.windows.get_mut(&wid) else {
            debug!(?wid, ?role, "set_role on untracked window - ignoring");
            return None;
        };
        Some(mem::replace(&mut window.role, role))
    }

    pub fn get(&self, wid: WindowId) -> Option<&TrackedWindow> { self.windows.get(&wid) }

    pub fn get_mut(&mut self, wid: WindowId) -> Option<&mut TrackedWindow> {
        self.windows.get_mut(&wid)
    }

    pub fn role(&self, wid: WindowId) -> Option<Role> { self.windows.get(&wid).map(|w| w.role) }

    pub fn contains(&self, wid: WindowId) -> bool { self.windows.contains_key(&wid) }

    pub fn len(&self) -> usize { self.windows.len() }

    pub fn is_empty(&self) -> bool { self.windows.is_empty() }

    pub fn all(&self) -> impl Iterator<Item = (WindowId, &TrackedWindow)> {
        self.windows.iter().map(|(wid, window)| (*wid, window))
    }

    pub fn all_mut(&mut self) -> impl Iterator<Item = (WindowId, &mut TrackedWindow)> {
        self.windows.iter_mut().map(|(wid, window)| (*wid, window))
    }

    pub fn ids(&self) -> Vec<WindowId> { self.windows.keys().copied().collect() }

    pub fn with_role(&self, role: Role) -> impl Iterator<Item = WindowId> + '_ {
        self.all().filter(move |(_, w)| w.role == role).map(|(wid, _)| wid)
    }

    pub fn main(&self) -> Option<WindowId> { self.with_role(Role::Main).next() }

    pub fn drain(&mut self) -> impl Iterator<Item = (WindowId, TrackedWindow)> + '_ {
        self.windows.drain()
    }
}
