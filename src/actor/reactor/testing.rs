use super::Reactor;
use crate::common::config::Config;
use crate::layout_engine::LayoutConstants;
use crate::sys::geometry::Rect;
use crate::sys::headless::{HeadlessWindow, HeadlessWindowSystem};
use crate::sys::window_system::{WindowId, WindowSystem};

pub const FULL_HD: Rect = Rect::new(0, 0, 1920, 1080);

pub fn w(n: u64) -> WindowId { WindowId::new(n) }

/// Large cards so the numbers in tests are easy to check by hand.
pub fn tv_config() -> Config {
    Config {
        layout: LayoutConstants {
            card_width: 500,
            card_height: 360,
            card_margin: 10,
            main_margin: 20,
        },
        ..Default::default()
    }
}

/// Where window `n` sits before the reactor touches it.
pub fn original(n: u64) -> Rect {
    let offset = 10 * n as i32;
    Rect::new(100 + offset, 50 + offset, 800, 600)
}

/// A 1920x1080 work area with windows 1..=count, none focused.
pub fn full_hd_world(count: u64) -> HeadlessWindowSystem {
    let ws = HeadlessWindowSystem::new(Some(FULL_HD));
    {
        let mut world = ws.world();
        for n in 1..=count {
            world.add_window(HeadlessWindow::normal(n, original(n)));
        }
    }
    ws
}

pub fn enabled_reactor(ws: HeadlessWindowSystem) -> Reactor<HeadlessWindowSystem> {
    let mut reactor = Reactor::new(tv_config(), ws);
    reactor.enable();
    reactor
}

impl<W: WindowSystem> Reactor<W> {
    #[track_caller]
    pub fn assert_consistent(&self) {
        if let Err(violation) = self.check_invariants() {
            panic!("layout invariant violated: {violation}");
        }
    }
}
