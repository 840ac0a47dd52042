use std::time::Duration;

use tracing::{debug, trace};

use crate::actor::reactor::{Reactor, ReactorError};
use crate::sys::window_system::{WindowId, WindowSystem};

pub struct FocusEventHandler;

impl FocusEventHandler {
    /// Re-arms the debounce timer. Nothing else happens until it fires.
    pub fn handle_focus_changed<W: WindowSystem>(reactor: &mut Reactor<W>, wid: Option<WindowId>) {
        let delay = Duration::from_millis(reactor.config.settings.focus_debounce_ms);
        let generation = reactor.focus_debounce.schedule(delay, reactor.events_tx.as_ref());
        trace!(?wid, generation, "focus changed");
    }

    pub fn handle_focus_settled<W: WindowSystem>(
        reactor: &mut Reactor<W>,
        generation: u64,
    ) -> Result<(), ReactorError> {
        if !reactor.focus_debounce.settle(generation) {
            debug!(generation, "stale focus debounce - ignoring");
            return Ok(());
        }
        let Some(focused) = reactor.window_system.focused_window() else {
            trace!("nothing focused");
            return Ok(());
        };
        if reactor.main == Some(focused) {
            return Ok(());
        }
        if !reactor.window_system.window_info(focused).is_some_and(|info| info.is_eligible()) {
            debug!(wid = ?focused, "focused window is not eligible");
            return Ok(());
        }
        reactor.redetermine_layout()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use crate::actor::reactor::Event;
    use crate::actor::reactor::testing::*;
    use crate::sys::geometry::Rect;
    use crate::sys::headless::HeadlessWindow;

    #[test]
    fn settled_focus_redetermines_the_layout() {
        let ws = full_hd_world(3);
        let mut reactor = enabled_reactor(ws.clone());
        ws.world().set_focused(Some(w(3)));
        reactor.handle_event(Event::FocusChanged(Some(w(3))));
        assert_eq!(reactor.main(), Some(w(1)));

        let generation = reactor.pending_focus_generation().expect("timer armed");
        reactor.handle_event(Event::FocusSettled(generation));
        assert_eq!(reactor.main(), Some(w(3)));
        assert_eq!(reactor.card_order(), &[w(1), w(2)]);
        assert_eq!(ws.world().frame_of(w(3)), Some(Rect::new(20, 20, 1880, 660)));
    }

    #[test]
    fn only_the_latest_generation_counts() {
        let ws = full_hd_world(3);
        let mut reactor = enabled_reactor(ws.clone());
        ws.world().set_focused(Some(w(2)));
        reactor.handle_event(Event::FocusChanged(Some(w(2))));
        let stale = reactor.pending_focus_generation().unwrap();
        reactor.handle_event(Event::FocusChanged(Some(w(2))));
        let current = reactor.pending_focus_generation().unwrap();
        assert_ne!(stale, current);

        reactor.handle_event(Event::FocusSettled(stale));
        assert_eq!(reactor.main(), Some(w(1)));
        assert_eq!(reactor.pending_focus_generation(), Some(current));

        reactor.handle_event(Event::FocusSettled(current));
        assert_eq!(reactor.main(), Some(w(2)));
        reactor.handle_event(Event::FocusSettled(current));
        assert_eq!(reactor.stats().layout_passes, 2);
    }

    #[test]
    fn focus_on_main_or_ineligible_windows_changes_nothing() {
        let ws = full_hd_world(2);
        let mut reactor = enabled_reactor(ws.clone());
        ws.world().add_window(HeadlessWindow::normal(3, original(3)).skip_taskbar());

        for focused in [w(1), w(3)] {
            ws.world().set_focused(Some(focused));
            reactor.handle_event(Event::FocusChanged(Some(focused)));
            let generation = reactor.pending_focus_generation().unwrap();
            reactor.handle_event(Event::FocusSettled(generation));
        }
        assert_eq!(reactor.main(), Some(w(1)));
        assert_eq!(reactor.stats().layout_passes, 1);
    }
}
