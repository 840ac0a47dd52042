//! Role transitions between Main, Card and Untracked.
//!
//! Bookkeeping helpers (`enter_card`, `swap_main`, `exclude`) never touch
//! geometry. The public operations do the bookkeeping first and then apply the
//! frames that changed, so a failed frame leaves roles consistent.

use tracing::{debug, info, warn};

use super::{Reactor, ReactorError};
use crate::actor::broadcast::BroadcastEvent;
use crate::model::Role;
use crate::sys::window_system::{SubscriptionKind, WindowId, WindowSystem};

impl<W: WindowSystem> Reactor<W> {
    /// Makes `wid` the main window. The previous main goes to the end of the
    /// card row.
    pub fn promote_to_main(&mut self, wid: WindowId) -> Result<(), ReactorError> {
        if self.main == Some(wid) {
            return Ok(());
        }
        if !self.registry.contains(wid) {
            debug!(?wid, "promote of untracked window - ignoring");
            return Ok(());
        }
        let previous = self.swap_main(wid);
        info!(?wid, ?previous, "promoted to main");
        self.apply_main()?;
        self.layout_cards()
    }

    /// Moves `wid` to the end of the card row. Demoting the main window leaves
    /// the main slot empty; picking a replacement is up to the caller.
    pub fn demote_to_card(&mut self, wid: WindowId) -> Result<(), ReactorError> {
        if !self.registry.contains(wid) {
            debug!(?wid, "demote of untracked window - ignoring");
            return Ok(());
        }
        if self.main == Some(wid) {
            self.main = None;
        }
        self.enter_card(wid);
        debug!(?wid, "demoted to card");
        self.layout_cards()
    }

    /// Moves `wid` to the end of the card row, handing the main slot to the
    /// first other card if `wid` was main. Roles settle before any frame is
    /// applied, so a rejected frame never leaves the main slot empty.
    pub fn replace_with_card(&mut self, wid: WindowId) -> Result<(), ReactorError> {
        if self.main != Some(wid) {
            return self.demote_to_card(wid);
        }
        self.main = None;
        self.enter_card(wid);
        let next = self.card_order.iter().find(|&card| card != wid).unwrap_or(wid);
        self.swap_main(next);
        info!(?wid, main = ?next, "main sent to the card row");
        self.apply_main()?;
        self.layout_cards()
    }

    /// Forgets a window that no longer exists. If it was the main window the
    /// first card takes its place.
    pub fn evict(&mut self, wid: WindowId) -> Result<(), ReactorError> {
        let Some(window) = self.registry.get_mut(wid) else {
            debug!(?wid, "evict of untracked window - ignoring");
            return Ok(());
        };
        let role = window.role;
        window.listeners.release(&mut self.window_system);
        self.registry.untrack(wid);
        let was_card = self.card_order.remove(wid);
        if role != Role::Untracked {
            self.notify(BroadcastEvent::RoleChanged { window: wid, role: Role::Untracked });
        }
        info!(?wid, %role, "evicted");

        if self.main == Some(wid) {
            self.main = None;
            return match self.card_order.first() {
                Some(next) => self.promote_to_main(next),
                None => Ok(()),
            };
        }
        if was_card {
            self.layout_cards()?;
        }
        Ok(())
    }

    /// Rebuilds every role from the window system's current state and lays
    /// everything out again.
    pub fn redetermine_layout(&mut self) -> Result<(), ReactorError> {
        let Some(_pass) = self.layout_guard.try_enter() else {
            self.stats.dropped_layout_passes += 1;
            debug!("layout pass already in flight - dropping redetermine");
            return Ok(());
        };
        self.stats.layout_passes += 1;

        let eligible: Vec<WindowId> = self
            .window_system
            .eligible_windows()
            .into_iter()
            .filter(|&wid| self.ensure_tracked(wid))
            .collect();
        let main = self
            .window_system
            .focused_window()
            .filter(|wid| eligible.contains(wid))
            .or_else(|| eligible.first().copied());

        for wid in self.registry.ids() {
            if !eligible.contains(&wid) && self.registry.role(wid) != Some(Role::Untracked) {
                debug!(?wid, "no longer eligible");
                self.exclude(wid);
            }
        }

        self.card_order.clear();
        self.main = main;
        if let Some(main) = main {
            self.set_role(main, Role::Main);
        }
        for wid in eligible {
            if Some(wid) != main {
                self.enter_card(wid);
            }
        }
        info!(main = ?self.main, cards = self.card_order.len(), "layout redetermined");

        self.apply_full_layout()
    }

    /// Rotates `[main, cards...]` forward: the first card becomes main and
    /// the old main goes to the back of the row.
    pub fn cycle_next(&mut self) -> Result<(), ReactorError> {
        let Some(next) = self.card_order.first() else {
            debug!("cycle_next with no cards - ignoring");
            return Ok(());
        };
        self.promote_to_main(next)?;
        self.window_system.focus(next);
        Ok(())
    }

    /// Exact reverse of [`Self::cycle_next`]: the last card becomes main and
    /// the old main ends up at the front of the row.
    pub fn cycle_prev(&mut self) -> Result<(), ReactorError> {
        let Some(prev) = self.card_order.last() else {
            debug!("cycle_prev with no cards - ignoring");
            return Ok(());
        };
        if self.swap_main(prev).is_some() {
            self.card_order.rotate_right(1);
        }
        info!(wid = ?prev, "promoted to main");
        self.apply_main()?;
        self.layout_cards()?;
        self.window_system.focus(prev);
        Ok(())
    }

    /// Starts tracking `wid` if needed, capturing its current frame. Returns
    /// false if the window system no longer knows the window.
    pub(super) fn ensure_tracked(&mut self, wid: WindowId) -> bool {
        if self.registry.contains(wid) {
            return true;
        }
        let Some(frame) = self.window_system.frame(wid) else {
            debug!(?wid, "window vanished before it could be tracked");
            return false;
        };
        self.registry.track(wid, frame)
    }

    /// Puts `wid` in the main slot, sending the previous main to the end of
    /// the card row. Returns the previous main.
    fn swap_main(&mut self, wid: WindowId) -> Option<WindowId> {
        let previous = self.main.take().filter(|&old| old != wid);
        if let Some(old) = previous {
            self.enter_card(old);
        }
        self.card_order.remove(wid);
        self.set_role(wid, Role::Main);
        self.main = Some(wid);
        previous
    }

    fn enter_card(&mut self, wid: WindowId) {
        self.set_role(wid, Role::Card);
        self.card_order.push_back(wid);
        self.install_card_listeners(wid);
    }

    /// Takes `wid` out of the layout but keeps it tracked so its original
    /// frame is restored on shutdown.
    pub(super) fn exclude(&mut self, wid: WindowId) {
        if let Some(window) = self.registry.get_mut(wid) {
            window.listeners.release(&mut self.window_system);
            window.has_click_handlers = false;
        }
        self.card_order.remove(wid);
        if self.main == Some(wid) {
            self.main = None;
        }
        self.set_role(wid, Role::Untracked);
    }

    fn install_card_listeners(&mut self, wid: WindowId) {
        let Some(window) = self.registry.get_mut(wid) else { return };
        if window.has_click_handlers {
            return;
        }
        for kind in [SubscriptionKind::Focus, SubscriptionKind::AppearsFocused] {
            match self.window_system.subscribe(wid, kind) {
                Ok(handle) => window.listeners.push(handle),
                Err(e) => warn!(?wid, %kind, error = %e, "could not install card listener"),
            }
        }
        window.has_click_handlers = true;
    }
}
