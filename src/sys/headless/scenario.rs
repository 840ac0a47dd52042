//! Scripted sessions for the headless window system.
//!
//! A scenario is a RON file describing the initial world and a list of steps.
//! Each step changes the world the way a user or application would, then
//! emits the notifications a real window system would emit for it.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{HeadlessWindow, HeadlessWindowSystem};
use crate::actor::reactor::{Event, ReactorCommand, Sender};
use crate::sys::geometry::Rect;
use crate::sys::window_system::{SubscriptionKind, WindowId};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Create(HeadlessWindow),
    Destroy(WindowId),
    /// The user focuses a window. Cards also see their focus listener fire.
    Focus(WindowId),
    Minimize(WindowId),
    Unminimize(WindowId),
    CycleNext,
    CyclePrev,
    Promote(WindowId),
    Redetermine,
    /// Panels or monitors changed. Followed by a full redetermine.
    SetWorkArea(Option<Rect>),
    /// Milliseconds to pause before the next step.
    Wait(u64),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub work_area: Option<Rect>,
    #[serde(default)]
    pub focused: Option<WindowId>,
    #[serde(default)]
    pub windows: Vec<HeadlessWindow>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn load(path: &Path) -> anyhow::Result<Scenario> {
        let buf = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        Self::parse(&buf).with_context(|| format!("parsing scenario {}", path.display()))
    }

    pub fn parse(buf: &str) -> anyhow::Result<Scenario> { Ok(ron::from_str(buf)?) }

    /// A fresh window system in the scenario's initial state.
    pub fn world(&self) -> HeadlessWindowSystem {
        let ws = HeadlessWindowSystem::new(self.work_area);
        {
            let mut world = ws.world();
            for window in &self.windows {
                world.add_window(window.clone());
            }
            world.set_focused(self.focused);
        }
        ws
    }

    /// Applies every step to `ws`, sending the resulting events to the
    /// reactor. `Wait` steps sleep on the tokio timer so focus debouncing
    /// runs for real.
    pub async fn drive(&self, ws: &HeadlessWindowSystem, events_tx: &Sender) {
        for (idx, step) in self.steps.iter().enumerate() {
            info!(idx, ?step, "scenario step");
            if let Step::Wait(ms) = step {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
                continue;
            }
            for event in step.apply(ws) {
                events_tx.send(event);
            }
        }
    }
}

impl Step {
    /// Changes the world for this step and returns the notifications it
    /// produces, in delivery order.
    pub fn apply(&self, ws: &HeadlessWindowSystem) -> Vec<Event> {
        let mut world = ws.world();
        match self {
            Step::Create(window) => {
                let wid = window.id;
                let eligible = window.info.is_eligible();
                world.add_window(window.clone());
                vec![Event::WindowCreated { wid, eligible }]
            }
            Step::Destroy(wid) => {
                if world.remove_window(*wid).is_none() {
                    debug!(?wid, "destroying a window that does not exist");
                }
                vec![Event::WindowDestroyed(*wid)]
            }
            Step::Focus(wid) => {
                if world.window(*wid).is_none() {
                    debug!(?wid, "focusing a window that does not exist");
                    return Vec::new();
                }
                world.set_focused(Some(*wid));
                let mut events = Vec::new();
                if world.has_listener(*wid, SubscriptionKind::Focus) {
                    events.push(Event::CardInteraction(*wid, SubscriptionKind::Focus));
                }
                events.push(Event::FocusChanged(Some(*wid)));
                events
            }
            Step::Minimize(wid) => {
                world.set_minimized(*wid, true);
                if world.focused() == Some(*wid) {
                    world.set_focused(None);
                }
                vec![Event::WindowMinimized(*wid)]
            }
            Step::Unminimize(wid) => {
                world.set_minimized(*wid, false);
                vec![Event::WindowUnminimized(*wid)]
            }
            Step::CycleNext => vec![Event::Command(ReactorCommand::CycleNext)],
            Step::CyclePrev => vec![Event::Command(ReactorCommand::CyclePrev)],
            Step::Promote(wid) => vec![Event::Command(ReactorCommand::Promote(*wid))],
            Step::Redetermine => vec![Event::Command(ReactorCommand::Redetermine)],
            Step::SetWorkArea(work_area) => {
                world.set_work_area(*work_area);
                vec![Event::Command(ReactorCommand::Redetermine)]
            }
            Step::Wait(_) => Vec::new(),
        }
    }
}
