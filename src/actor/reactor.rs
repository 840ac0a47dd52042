//! The Reactor owns the TV layout.
//!
//! It takes window-system notifications and commands, decides which window is
//! the main viewport and which windows are cards, and pushes the resulting
//! geometry back out through the [`WindowSystem`]. All state lives in one
//! `Reactor` value that is created when the layout is enabled and consumed when
//! it is disabled; every event is handled to completion before the next one.

mod arbitration;
mod debounce;
mod error;
mod events;
mod guard;
mod replay;

#[cfg(test)]
mod testing;

use std::thread;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{debug, error, info, instrument, trace, warn};

pub use debounce::FocusDebounce;
pub use error::ReactorError;
use events::{CommandEventHandler, FocusEventHandler, WindowEventHandler};
pub use guard::{LayoutGuard, LayoutPass};
pub use replay::{Record, replay};

use crate::actor::broadcast::{BroadcastEvent, BroadcastSender};
use crate::actor;
use crate::common::config::Config;
use crate::layout_engine::utils::apply_padding;
use crate::layout_engine::{TvLayout, compute_card_rects, compute_main_rect};
use crate::model::{CardOrder, Registry, Role};
use crate::sys::geometry::Rect;
use crate::sys::window_system::{SubscriptionKind, WindowId, WindowSystem, WindowSystemError};

pub type Sender = actor::Sender<Event>;
pub type Receiver = actor::Receiver<Event>;

#[derive(Serialize, Deserialize, Debug)]
pub enum Event {
    /// A window appeared. Ineligible windows (dialogs, skip-taskbar,
    /// minimized) are ignored.
    WindowCreated { wid: WindowId, eligible: bool },
    WindowDestroyed(WindowId),
    /// Keyboard focus moved. The payload is informational only; the current
    /// focus is re-read once the debounce timer fires.
    FocusChanged(Option<WindowId>),
    WindowMinimized(WindowId),
    WindowUnminimized(WindowId),
    /// One of the per-card listeners fired.
    CardInteraction(WindowId, SubscriptionKind),
    /// The focus debounce timer armed with this generation fired.
    FocusSettled(u64),

    Command(ReactorCommand),

    ConfigUpdated(Config),

    #[serde(skip)]
    QueryLayout(oneshot::Sender<LayoutSnapshot>),

    /// Stop the event loop, restore every window and hand back the report.
    Disable,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReactorCommand {
    CycleNext,
    CyclePrev,
    Promote(WindowId),
    Redetermine,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReactorStats {
    /// Full recomputations of every role.
    pub layout_passes: u64,
    /// Full passes requested while another one was running.
    pub dropped_layout_passes: u64,
    /// Passes cut short by a window-system failure.
    pub aborted_passes: u64,
}

/// What the reactor currently believes, plus where windows actually are.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct LayoutSnapshot {
    pub main: Option<WindowId>,
    pub cards: Vec<WindowId>,
    pub untracked: Vec<WindowId>,
    pub frames: Vec<(WindowId, Rect)>,
    pub stats: ReactorStats,
}

/// Outcome of [`Reactor::disable`].
#[derive(Debug, Default)]
pub struct DisableReport {
    pub restored: Vec<WindowId>,
    pub failed: Vec<(WindowId, WindowSystemError)>,
}

pub struct Reactor<W> {
    config: Config,
    window_system: W,
    registry: Registry,
    card_order: CardOrder,
    main: Option<WindowId>,
    layout_guard: LayoutGuard,
    focus_debounce: FocusDebounce,
    events_tx: Option<Sender>,
    broadcast_tx: Option<BroadcastSender>,
    record: Record,
    stats: ReactorStats,
}

impl<W: WindowSystem + Send + 'static> Reactor<W> {
    /// Runs the reactor on its own thread with a single-threaded runtime.
    /// The join handle yields the restore report once `Event::Disable` is
    /// processed.
    pub fn spawn(reactor: Reactor<W>) -> (Sender, thread::JoinHandle<DisableReport>) {
        let (events_tx, events) = actor::channel();
        let own_tx = events_tx.clone();
        let handle = thread::Builder::new()
            .name("reactor".to_string())
            .spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .build()
                    .expect("failed to build reactor runtime");
                let mut reactor = reactor;
                reactor.events_tx = Some(own_tx);
                runtime.block_on(async move {
                    reactor.enable();
                    reactor.run(events).await
                })
            })
            .expect("failed to spawn reactor thread");
        (events_tx, handle)
    }
}

impl<W: WindowSystem> Reactor<W> {
    pub fn new(config: Config, window_system: W) -> Reactor<W> {
        Reactor {
            config,
            window_system,
            registry: Registry::new(),
            card_order: CardOrder::new(),
            main: None,
            layout_guard: LayoutGuard::default(),
            focus_debounce: FocusDebounce::default(),
            events_tx: None,
            broadcast_tx: None,
            record: Record::disabled(),
            stats: ReactorStats::default(),
        }
    }

    pub fn with_broadcast(mut self, broadcast_tx: BroadcastSender) -> Self {
        self.broadcast_tx = Some(broadcast_tx);
        self
    }

    pub fn with_record(mut self, record: Record) -> Self {
        self.record = record;
        self
    }

    /// Channel the debounce timer reports back on.
    pub fn set_events_tx(&mut self, events_tx: Sender) { self.events_tx = Some(events_tx); }

    /// Takes over every eligible window and lays them out.
    pub fn enable(&mut self) {
        info!("enabling tv layout");
        self.notify(BroadcastEvent::ThemeSelected {
            name: self.config.settings.theme.clone(),
        });
        let result = self.redetermine_layout();
        self.finish_pass(result);
    }

    pub async fn run(mut self, mut events: Receiver) -> DisableReport {
        while let Some((span, event)) = events.recv().await {
            let _guard = span.enter();
            if let Event::Disable = event {
                self.record.on_event(&event);
                break;
            }
            self.handle_event(event);
        }
        self.disable()
    }

    fn log_event(&self, event: &Event) {
        match event {
            Event::FocusChanged(..) | Event::FocusSettled(..) | Event::CardInteraction(..) => {
                trace!(?event, "Event")
            }
            _ => debug!(?event, "Event"),
        }
    }

    #[instrument(name = "reactor::handle_event", skip(self), fields(event=?event))]
    pub fn handle_event(&mut self, event: Event) {
        self.log_event(&event);
        self.record.on_event(&event);

        let result = match event {
            Event::WindowCreated { wid, eligible } => {
                WindowEventHandler::handle_window_created(self, wid, eligible)
            }
            Event::WindowDestroyed(wid) => WindowEventHandler::handle_window_destroyed(self, wid),
            Event::WindowMinimized(wid) => WindowEventHandler::handle_window_minimized(self, wid),
            Event::WindowUnminimized(wid) => {
                WindowEventHandler::handle_window_unminimized(self, wid)
            }
            Event::CardInteraction(wid, kind) => {
                WindowEventHandler::handle_card_interaction(self, wid, kind)
            }
            Event::FocusChanged(wid) => {
                FocusEventHandler::handle_focus_changed(self, wid);
                Ok(())
            }
            Event::FocusSettled(generation) => {
                FocusEventHandler::handle_focus_settled(self, generation)
            }
            Event::Command(cmd) => CommandEventHandler::handle_command(self, cmd),
            Event::ConfigUpdated(config) => {
                CommandEventHandler::handle_config_updated(self, config)
            }
            Event::QueryLayout(response) => {
                if response.send(self.snapshot()).is_err() {
                    debug!("layout query dropped before the answer arrived");
                }
                Ok(())
            }
            Event::Disable => {
                warn!("Disable must go through the event loop or Reactor::disable");
                Ok(())
            }
        };
        self.finish_pass(result);

        #[cfg(debug_assertions)]
        if let Err(violation) = self.check_invariants() {
            error!(%violation, "layout invariant violated");
        }
    }

    fn finish_pass(&mut self, result: Result<(), ReactorError>) {
        if let Err(e) = result {
            self.stats.aborted_passes += 1;
            error!(error = %e, "layout pass aborted");
        }
    }

    /// Tears everything down: pending timer, listeners, geometry, state, in
    /// that order. Restoring is best-effort; one window failing does not stop
    /// the others.
    pub fn disable(mut self) -> DisableReport {
        info!(windows = self.registry.len(), "disabling tv layout");
        if self.focus_debounce.cancel() {
            debug!("cancelled pending focus debounce");
        }

        for (_, window) in self.registry.all_mut() {
            window.listeners.release(&mut self.window_system);
            window.has_click_handlers = false;
        }

        let mut originals: Vec<(WindowId, Rect)> =
            self.registry.all().map(|(wid, w)| (wid, w.original_geometry)).collect();
        originals.sort_by_key(|(wid, _)| *wid);
        let mut report = DisableReport::default();
        for (wid, frame) in originals {
            match self.window_system.set_frame(wid, frame, self.config.settings.animate) {
                Ok(()) => {
                    trace!(?wid, %frame, "restored original geometry");
                    report.restored.push(wid);
                }
                Err(e) => {
                    warn!(?wid, error = %e, "could not restore original geometry");
                    report.failed.push((wid, e));
                }
            }
        }

        self.registry.drain().for_each(drop);
        self.card_order.clear();
        self.main = None;
        self.notify(BroadcastEvent::LayoutCleared);
        report
    }

    pub fn snapshot(&self) -> LayoutSnapshot {
        let mut untracked: Vec<WindowId> = self.registry.with_role(Role::Untracked).collect();
        untracked.sort();
        let frames = self
            .main
            .iter()
            .copied()
            .chain(self.card_order.iter())
            .filter_map(|wid| self.window_system.frame(wid).map(|frame| (wid, frame)))
            .collect();
        LayoutSnapshot {
            main: self.main,
            cards: self.card_order.as_slice().to_vec(),
            untracked,
            frames,
            stats: self.stats,
        }
    }

    /// Checks the bookkeeping invariants: one main at most, the main pointer
    /// agrees with the registry, and the card row holds exactly the cards.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mains: Vec<WindowId> = self.registry.with_role(Role::Main).collect();
        if mains.len() > 1 {
            return Err(format!("more than one main window: {mains:?}"));
        }
        if mains.first().copied() != self.main {
            return Err(format!(
                "main pointer {:?} disagrees with registry {:?}",
                self.main, mains
            ));
        }
        for (idx, wid) in self.card_order.iter().enumerate() {
            if self.card_order.position(wid) != Some(idx) {
                return Err(format!("{wid} appears twice in the card row"));
            }
            if self.registry.role(wid) != Some(Role::Card) {
                return Err(format!(
                    "{wid} is in the card row with role {:?}",
                    self.registry.role(wid)
                ));
            }
        }
        let cards = self.registry.with_role(Role::Card).count();
        if cards != self.card_order.len() {
            return Err(format!(
                "{cards} card windows but {} in the card row",
                self.card_order.len()
            ));
        }
        Ok(())
    }

    pub fn main(&self) -> Option<WindowId> { self.main }

    pub fn card_order(&self) -> &[WindowId] { self.card_order.as_slice() }

    pub fn registry(&self) -> &Registry { &self.registry }

    pub fn config(&self) -> &Config { &self.config }

    pub fn stats(&self) -> ReactorStats { self.stats }

    pub fn window_system(&self) -> &W { &self.window_system }

    pub fn window_system_mut(&mut self) -> &mut W { &mut self.window_system }

    pub fn pending_focus_generation(&self) -> Option<u64> { self.focus_debounce.pending() }

    pub(crate) fn layout_guard(&self) -> &LayoutGuard { &self.layout_guard }

    fn notify(&self, event: BroadcastEvent) {
        if let Some(tx) = &self.broadcast_tx {
            tx.send(event);
        }
    }

    /// Records a role change and tells the presentation layer about it.
    fn set_role(&mut self, wid: WindowId, role: Role) {
        match self.registry.set_role(wid, role) {
            Some(previous) if previous != role => {
                debug!(?wid, %previous, %role, "role changed");
                self.notify(BroadcastEvent::RoleChanged { window: wid, role });
            }
            _ => {}
        }
    }

    fn apply_frame(&mut self, wid: WindowId, frame: Rect) -> Result<(), ReactorError> {
        let frame = apply_padding(frame, self.config.settings.padding_inner);
        trace!(?wid, %frame, "applying frame");
        match self.window_system.set_frame(wid, frame, self.config.settings.animate) {
            Ok(()) => Ok(()),
            Err(WindowSystemError::UnknownWindow(_)) => {
                debug!(?wid, "window vanished before it could be moved - ignoring");
                Ok(())
            }
            Err(source) => Err(ReactorError::Geometry { wid, frame, source }),
        }
    }

    fn work_area(&self) -> Option<Rect> {
        let work_area = self.window_system.work_area();
        if work_area.is_none() {
            debug!("no work area available; skipping layout");
        }
        work_area
    }

    fn apply_main(&mut self) -> Result<(), ReactorError> {
        let Some(main) = self.main else { return Ok(()) };
        let Some(work_area) = self.work_area() else { return Ok(()) };
        let frame = compute_main_rect(work_area, &self.config.layout);
        self.apply_frame(main, frame)
    }

    fn layout_cards(&mut self) -> Result<(), ReactorError> {
        if self.card_order.is_empty() {
            return Ok(());
        }
        let Some(work_area) = self.work_area() else { return Ok(()) };
        let rects = compute_card_rects(work_area, &self.config.layout, self.card_order.len());
        let cards: Vec<(WindowId, Rect)> = self.card_order.iter().zip(rects).collect();
        for (wid, frame) in cards {
            self.apply_frame(wid, frame)?;
        }
        Ok(())
    }

    fn apply_full_layout(&mut self) -> Result<(), ReactorError> {
        let Some(work_area) = self.work_area() else { return Ok(()) };
        let layout = TvLayout::calculate(
            work_area,
            &self.config.layout,
            self.main,
            self.card_order.as_slice(),
        );
        trace!(?layout, "Layout");
        for (wid, frame) in layout.frames() {
            self.apply_frame(wid, frame)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::testing::*;
    use super::*;
    use crate::sys::headless::HeadlessWindow;

    #[test]
    fn it_lays_out_the_living_room_scenario() {
        let ws = full_hd_world(3);
        ws.world().set_focused(Some(w(2)));
        let reactor = enabled_reactor(ws.clone());

        assert_eq!(reactor.main(), Some(w(2)));
        assert_eq!(reactor.card_order(), &[w(1), w(3)]);

        let world = ws.world();
        assert_eq!(world.frame_of(w(2)), Some(Rect::new(20, 20, 1880, 660)));
        assert_eq!(world.frame_of(w(1)), Some(Rect::new(10, 700, 500, 360)));
        assert_eq!(world.frame_of(w(3)), Some(Rect::new(520, 700, 500, 360)));
    }

    #[test]
    fn it_picks_the_first_window_without_focus() {
        let ws = full_hd_world(3);
        let reactor = enabled_reactor(ws);
        assert_eq!(reactor.main(), Some(w(1)));
        assert_eq!(reactor.card_order(), &[w(2), w(3)]);
    }

    #[test]
    fn it_ignores_ineligible_windows_when_enabling() {
        let ws = full_hd_world(1);
        ws.world().add_window(HeadlessWindow::normal(2, original(2)).skip_taskbar());
        ws.world().add_window(HeadlessWindow::normal(3, original(3)).minimized());
        ws.world().set_focused(Some(w(2)));
        let reactor = enabled_reactor(ws.clone());

        assert_eq!(reactor.main(), Some(w(1)));
        assert!(reactor.card_order().is_empty());
        assert!(!reactor.registry().contains(w(2)));
        assert_eq!(ws.world().frame_of(w(3)), Some(original(3)));
    }

    #[test]
    fn it_captures_geometry_before_the_first_move() {
        let ws = full_hd_world(2);
        let reactor = enabled_reactor(ws.clone());
        for n in 1..=2 {
            assert_eq!(
                reactor.registry().get(w(n)).unwrap().original_geometry,
                original(n)
            );
            assert_ne!(ws.world().frame_of(w(n)), Some(original(n)));
        }
    }

    #[test]
    fn it_skips_geometry_without_a_work_area() {
        let ws = full_hd_world(2);
        ws.world().set_work_area(None);
        let mut reactor = enabled_reactor(ws.clone());

        assert_eq!(reactor.main(), Some(w(1)));
        assert_eq!(reactor.card_order(), &[w(2)]);
        assert!(ws.world().frame_log().is_empty());
        assert_eq!(reactor.stats().aborted_passes, 0);

        ws.world().set_work_area(Some(FULL_HD));
        reactor.handle_event(Event::Command(ReactorCommand::Redetermine));
        assert_eq!(ws.world().frame_of(w(1)), Some(Rect::new(20, 20, 1880, 660)));
    }

    #[test]
    fn it_aborts_a_pass_when_the_window_system_rejects_a_frame() {
        let ws = full_hd_world(3);
        ws.world().reject_frames_for(w(2));
        let reactor = enabled_reactor(ws.clone());

        assert_eq!(reactor.stats().aborted_passes, 1);
        let world = ws.world();
        // Main was applied before the failure; the card after it never was.
        assert_eq!(world.frame_of(w(1)), Some(Rect::new(20, 20, 1880, 660)));
        assert_eq!(world.frame_of(w(2)), Some(original(2)));
        assert_eq!(world.frame_of(w(3)), Some(original(3)));
        drop(world);
        reactor.assert_consistent();
    }

    #[test]
    fn it_applies_inner_padding() {
        let ws = full_hd_world(2);
        let mut config = tv_config();
        config.settings.padding_inner = 5;
        let mut reactor = Reactor::new(config, ws.clone());
        reactor.enable();

        let world = ws.world();
        assert_eq!(world.frame_of(w(1)), Some(Rect::new(25, 25, 1870, 650)));
        assert_eq!(world.frame_of(w(2)), Some(Rect::new(15, 705, 490, 350)));
    }

    #[test]
    fn it_restores_every_window_on_disable() {
        let ws = full_hd_world(2);
        let reactor = enabled_reactor(ws.clone());
        let report = reactor.disable();

        assert_eq!(report.restored.len(), 2);
        assert!(report.failed.is_empty());
        let world = ws.world();
        assert_eq!(world.frame_of(w(1)), Some(original(1)));
        assert_eq!(world.frame_of(w(2)), Some(original(2)));
        assert_eq!(world.active_listener_count(), 0);
        assert_eq!(world.double_releases(), 0);
    }

    #[test]
    fn it_keeps_restoring_after_one_window_fails() {
        let ws = full_hd_world(2);
        let reactor = enabled_reactor(ws.clone());
        ws.world().reject_frames_for(w(1));

        let report = reactor.disable();
        assert_eq!(report.restored, vec![w(2)]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, w(1));
        assert_eq!(ws.world().frame_of(w(2)), Some(original(2)));
    }

    #[test]
    fn it_restores_excluded_windows_too() {
        let ws = full_hd_world(2);
        let mut config = tv_config();
        config.settings.minimize_to_card = false;
        let mut reactor = Reactor::new(config, ws.clone());
        reactor.enable();

        ws.world().set_minimized(w(2), true);
        reactor.handle_event(Event::WindowMinimized(w(2)));
        assert_eq!(reactor.registry().role(w(2)), Some(Role::Untracked));

        let report = reactor.disable();
        assert_eq!(report.restored.len(), 2);
        assert_eq!(ws.world().frame_of(w(2)), Some(original(2)));
    }

    #[test]
    fn it_cancels_the_pending_debounce_on_disable() {
        let ws = full_hd_world(2);
        let mut reactor = enabled_reactor(ws);
        reactor.handle_event(Event::FocusChanged(Some(w(2))));
        assert!(reactor.pending_focus_generation().is_some());
        let report = reactor.disable();
        assert_eq!(report.restored.len(), 2);
    }

    #[test]
    fn it_broadcasts_role_changes() {
        let ws = full_hd_world(2);
        let (tx, mut rx) = crate::actor::channel();
        let mut reactor = Reactor::new(tv_config(), ws).with_broadcast(tx);
        reactor.enable();
        reactor.handle_event(Event::Command(ReactorCommand::CycleNext));
        let _ = reactor.disable();

        let mut events = Vec::new();
        while let Ok((_, event)) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(
            events,
            vec![
                BroadcastEvent::ThemeSelected { name: "default".to_string() },
                BroadcastEvent::RoleChanged { window: w(1), role: Role::Main },
                BroadcastEvent::RoleChanged { window: w(2), role: Role::Card },
                BroadcastEvent::RoleChanged { window: w(1), role: Role::Card },
                BroadcastEvent::RoleChanged { window: w(2), role: Role::Main },
                BroadcastEvent::LayoutCleared,
            ]
        );
    }

    #[test]
    fn it_answers_layout_queries() {
        let ws = full_hd_world(2);
        let mut reactor = enabled_reactor(ws);
        let (tx, mut rx) = oneshot::channel();
        reactor.handle_event(Event::QueryLayout(tx));
        let snapshot = rx.try_recv().expect("answered synchronously");

        assert_eq!(snapshot.main, Some(w(1)));
        assert_eq!(snapshot.cards, vec![w(2)]);
        assert_eq!(snapshot.frames[0], (w(1), Rect::new(20, 20, 1880, 660)));
        assert_eq!(snapshot.stats.layout_passes, 1);
    }

    #[test]
    fn it_relayouts_on_config_change_without_changing_roles() {
        let ws = full_hd_world(3);
        let mut reactor = enabled_reactor(ws.clone());
        let mut config = tv_config();
        config.layout.card_width = 400;
        config.settings.theme = "tv-futuristic".to_string();
        reactor.handle_event(Event::ConfigUpdated(config));

        assert_eq!(reactor.main(), Some(w(1)));
        assert_eq!(reactor.card_order(), &[w(2), w(3)]);
        assert_eq!(ws.world().frame_of(w(3)), Some(Rect::new(420, 700, 400, 360)));
        assert_eq!(reactor.config().settings.theme, "tv-futuristic");
    }

    #[test]
    fn it_survives_layout_constants_past_the_validated_range() {
        let ws = full_hd_world(3);
        let mut config = tv_config();
        config.layout.main_margin = 1_000_000_000;
        config.settings.padding_inner = i32::MAX;
        let mut reactor = Reactor::new(config, ws.clone());
        reactor.enable();
        reactor.handle_event(Event::Command(ReactorCommand::CycleNext));

        assert_eq!(reactor.main(), Some(w(2)));
        assert_eq!(reactor.card_order(), &[w(3), w(1)]);
        assert!(reactor.check_invariants().is_ok());
    }

    #[tokio::test]
    async fn it_runs_as_an_actor_with_a_real_debounce() {
        let ws = full_hd_world(3);
        let mut reactor = Reactor::new(tv_config(), ws.clone());
        let (tx, rx) = crate::actor::channel();
        reactor.set_events_tx(tx.clone());
        reactor.enable();
        let task = tokio::spawn(reactor.run(rx));

        // Focus lands on window 3 without going through its card listener.
        ws.world().set_focused(Some(w(3)));
        tx.send(Event::FocusChanged(Some(w(2))));
        tx.send(Event::FocusChanged(Some(w(3))));
        tokio::time::sleep(std::time::Duration::from_millis(300)).await;

        let (query_tx, query_rx) = oneshot::channel();
        tx.send(Event::QueryLayout(query_tx));
        let snapshot = query_rx.await.expect("reactor answers");
        assert_eq!(snapshot.main, Some(w(3)));
        assert_eq!(snapshot.cards, vec![w(1), w(2)]);
        assert_eq!(snapshot.stats.layout_passes, 2);

        tx.send(Event::Disable);
        let report = task.await.expect("reactor task");
        assert_eq!(report.restored.len(), 3);
        assert_eq!(ws.world().frame_of(w(3)), Some(original(3)));
    }
}
