use tracing::{debug, info};

use crate::actor::reactor::{Reactor, ReactorError};
use crate::model::Role;
use crate::sys::window_system::{SubscriptionKind, WindowId, WindowSystem};

pub struct WindowEventHandler;

impl WindowEventHandler {
    pub fn handle_window_created<W: WindowSystem>(
        reactor: &mut Reactor<W>,
        wid: WindowId,
        eligible: bool,
    ) -> Result<(), ReactorError> {
        if !eligible {
            debug!(?wid, "ignoring ineligible window");
            return Ok(());
        }
        if matches!(reactor.registry.role(wid), Some(Role::Main | Role::Card)) {
            debug!(?wid, "window already in the layout");
            return Ok(());
        }
        if !reactor.ensure_tracked(wid) {
            return Ok(());
        }
        info!(?wid, "window entered the layout");
        if reactor.main.is_none() {
            reactor.promote_to_main(wid)
        } else {
            reactor.demote_to_card(wid)
        }
    }

    pub fn handle_window_destroyed<W: WindowSystem>(
        reactor: &mut Reactor<W>,
        wid: WindowId,
    ) -> Result<(), ReactorError> {
        reactor.evict(wid)
    }

    pub fn handle_window_minimized<W: WindowSystem>(
        reactor: &mut Reactor<W>,
        wid: WindowId,
    ) -> Result<(), ReactorError> {
        match reactor.registry.role(wid) {
            None | Some(Role::Untracked) => {
                debug!(?wid, "minimize of a window outside the layout");
                return Ok(());
            }
            Some(_) => {}
        }
        let was_main = reactor.main == Some(wid);

        if reactor.config.settings.minimize_to_card {
            info!(?wid, "minimize redirected to the card row");
            reactor.window_system.unminimize(wid);
            return reactor.replace_with_card(wid);
        }

        info!(?wid, "minimized window leaves the layout");
        reactor.exclude(wid);
        if was_main {
            match reactor.card_order.first() {
                Some(next) => reactor.promote_to_main(next),
                None => Ok(()),
            }
        } else {
            reactor.layout_cards()
        }
    }

    pub fn handle_window_unminimized<W: WindowSystem>(
        reactor: &mut Reactor<W>,
        wid: WindowId,
    ) -> Result<(), ReactorError> {
        if matches!(reactor.registry.role(wid), Some(Role::Main | Role::Card)) {
            return Ok(());
        }
        let eligible = reactor.window_system.window_info(wid).is_some_and(|info| info.is_eligible());
        Self::handle_window_created(reactor, wid, eligible)
    }

    /// A card was clicked or otherwise activated.
    pub fn handle_card_interaction<W: WindowSystem>(
        reactor: &mut Reactor<W>,
        wid: WindowId,
        kind: SubscriptionKind,
    ) -> Result<(), ReactorError> {
        if reactor.registry.role(wid) != Some(Role::Card) {
            debug!(?wid, %kind, "interaction on a window that is not a card");
            return Ok(());
        }
        info!(?wid, %kind, "card activated");
        reactor.promote_to_main(wid)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use crate::actor::reactor::testing::*;
    use crate::actor::reactor::{Event, Reactor, ReactorCommand};
    use crate::model::Role;
    use crate::sys::geometry::Rect;
    use crate::sys::headless::HeadlessWindow;
    use crate::sys::window_system::{SubscriptionKind, WindowKind};

    #[test]
    fn first_window_becomes_main_and_the_rest_become_cards() {
        let ws = full_hd_world(0);
        let mut reactor = enabled_reactor(ws.clone());
        for n in 1..=3 {
            ws.world().add_window(HeadlessWindow::normal(n, original(n)));
            reactor.handle_event(Event::WindowCreated { wid: w(n), eligible: true });
        }
        assert_eq!(reactor.main(), Some(w(1)));
        assert_eq!(reactor.card_order(), &[w(2), w(3)]);
        assert_eq!(ws.world().frame_of(w(3)), Some(Rect::new(520, 700, 500, 360)));
        assert_eq!(reactor.registry().get(w(3)).unwrap().original_geometry, original(3));
    }

    #[test]
    fn ineligible_and_duplicate_creations_are_ignored() {
        let ws = full_hd_world(2);
        let mut reactor = enabled_reactor(ws.clone());
        ws.world()
            .add_window(HeadlessWindow::normal(3, original(3)).with_kind(WindowKind::Dialog));
        reactor.handle_event(Event::WindowCreated { wid: w(3), eligible: false });
        reactor.handle_event(Event::WindowCreated { wid: w(2), eligible: true });

        assert!(!reactor.registry().contains(w(3)));
        assert_eq!(reactor.card_order(), &[w(2)]);
    }

    #[test]
    fn destroyed_main_is_replaced_by_the_first_card() {
        let ws = full_hd_world(3);
        let mut reactor = enabled_reactor(ws.clone());
        ws.world().remove_window(w(1));
        reactor.handle_event(Event::WindowDestroyed(w(1)));
        assert_eq!(reactor.main(), Some(w(2)));
        assert_eq!(reactor.card_order(), &[w(3)]);

        reactor.handle_event(Event::WindowDestroyed(w(1)));
        assert_eq!(reactor.main(), Some(w(2)));
    }

    #[test]
    fn minimizing_main_sends_it_to_the_card_row() {
        let ws = full_hd_world(3);
        let mut reactor = enabled_reactor(ws.clone());
        ws.world().set_minimized(w(1), true);
        reactor.handle_event(Event::WindowMinimized(w(1)));

        assert_eq!(reactor.main(), Some(w(2)));
        assert_eq!(reactor.card_order(), &[w(3), w(1)]);
        let world = ws.world();
        assert_eq!(world.unminimize_requests(), &[w(1)]);
        assert!(!world.window(w(1)).unwrap().info.minimized);
        assert_eq!(world.frame_of(w(1)), Some(Rect::new(520, 700, 500, 360)));
    }

    #[test]
    fn a_rejected_card_frame_does_not_empty_the_main_slot() {
        let ws = full_hd_world(3);
        let mut reactor = enabled_reactor(ws.clone());
        ws.world().reject_frames_for(w(2));
        reactor.handle_event(Event::WindowMinimized(w(1)));

        assert_eq!(reactor.main(), Some(w(2)));
        assert_eq!(reactor.card_order(), &[w(3), w(1)]);
        assert_eq!(reactor.stats().aborted_passes, 1);
        reactor.assert_consistent();

        ws.world().accept_frames_for(w(2));
        reactor.handle_event(Event::Command(ReactorCommand::CycleNext));
        assert_eq!(reactor.main(), Some(w(3)));
        assert_eq!(ws.world().frame_of(w(1)), Some(Rect::new(10, 700, 500, 360)));
    }

    #[test]
    fn minimizing_the_only_window_keeps_it_main() {
        let ws = full_hd_world(1);
        let mut reactor = enabled_reactor(ws.clone());
        reactor.handle_event(Event::WindowMinimized(w(1)));
        assert_eq!(reactor.main(), Some(w(1)));
        assert!(reactor.card_order().is_empty());
        assert_eq!(ws.world().frame_of(w(1)), Some(Rect::new(20, 20, 1880, 660)));
    }

    #[test]
    fn minimizing_excludes_when_cards_are_disabled() {
        let ws = full_hd_world(3);
        let mut config = tv_config();
        config.settings.minimize_to_card = false;
        let mut reactor = Reactor::new(config, ws.clone());
        reactor.enable();

        ws.world().set_minimized(w(1), true);
        reactor.handle_event(Event::WindowMinimized(w(1)));
        assert_eq!(reactor.main(), Some(w(2)));
        assert_eq!(reactor.card_order(), &[w(3)]);
        assert_eq!(reactor.registry().role(w(1)), Some(Role::Untracked));
        assert!(ws.world().unminimize_requests().is_empty());

        ws.world().set_minimized(w(3), true);
        reactor.handle_event(Event::WindowMinimized(w(3)));
        assert!(reactor.card_order().is_empty());
        assert_eq!(ws.world().listeners_for(w(3)), 0);

        ws.world().set_minimized(w(1), false);
        reactor.handle_event(Event::WindowUnminimized(w(1)));
        assert_eq!(reactor.card_order(), &[w(1)]);
        assert_eq!(reactor.registry().get(w(1)).unwrap().original_geometry, original(1));
        reactor.assert_consistent();
    }

    #[test]
    fn unminimize_of_a_laid_out_window_is_a_noop() {
        let ws = full_hd_world(2);
        let mut reactor = enabled_reactor(ws.clone());
        ws.world().take_frame_log();
        reactor.handle_event(Event::WindowUnminimized(w(2)));
        assert!(ws.world().frame_log().is_empty());
    }

    #[test]
    fn unminimize_of_an_unknown_window_enters_the_layout() {
        let ws = full_hd_world(1);
        let mut reactor = enabled_reactor(ws.clone());
        ws.world().add_window(HeadlessWindow::normal(2, original(2)));
        reactor.handle_event(Event::WindowUnminimized(w(2)));
        assert_eq!(reactor.card_order(), &[w(2)]);
    }

    #[test]
    fn clicking_a_card_promotes_it() {
        let ws = full_hd_world(3);
        let mut reactor = enabled_reactor(ws.clone());
        reactor.handle_event(Event::CardInteraction(w(3), SubscriptionKind::Focus));
        assert_eq!(reactor.main(), Some(w(3)));
        assert_eq!(reactor.card_order(), &[w(2), w(1)]);

        reactor.handle_event(Event::CardInteraction(w(3), SubscriptionKind::AppearsFocused));
        assert_eq!(reactor.main(), Some(w(3)));
    }
}
