//! Presentation side of the layout.
//!
//! Listens to what the reactor broadcasts and keeps the decorations in sync:
//! the active theme, the style classes on each laid out window, and a one-line
//! status summary. It never sends anything back to the reactor.

use tracing::{debug, info, warn};

use crate::actor::broadcast::{BroadcastEvent, BroadcastReceiver};
use crate::common::collections::BTreeMap;
use crate::model::Role;
use crate::sys::window_system::WindowId;
use crate::ui::theme::{DEFAULT_THEME, ThemeManager};

pub struct Presentation {
    themes: ThemeManager,
    windows: BTreeMap<WindowId, Role>,
    classes: BTreeMap<WindowId, Vec<&'static str>>,
    status: String,
}

impl Presentation {
    pub fn new(themes: ThemeManager) -> Presentation {
        let mut presentation = Presentation {
            themes,
            windows: BTreeMap::new(),
            classes: BTreeMap::new(),
            status: String::new(),
        };
        presentation.refresh_status();
        presentation
    }

    /// Handles broadcasts until the reactor goes away, then hands the final
    /// state back.
    pub async fn run(mut self, mut events: BroadcastReceiver) -> Presentation {
        while let Some((span, event)) = events.recv().await {
            let _guard = span.enter();
            self.handle_event(event);
        }
        self
    }

    pub fn handle_event(&mut self, event: BroadcastEvent) {
        debug!(?event, "presentation event");
        match event {
            BroadcastEvent::RoleChanged { window, role: Role::Untracked } => {
                self.windows.remove(&window);
                self.classes.remove(&window);
            }
            BroadcastEvent::RoleChanged { window, role } => {
                self.windows.insert(window, role);
                self.classes.insert(window, self.themes.style_classes(role));
            }
            BroadcastEvent::ThemeSelected { name } => {
                self.select_theme(&name);
                self.restyle();
            }
            BroadcastEvent::LayoutCleared => {
                self.themes.remove_current_theme();
                self.windows.clear();
                self.classes.clear();
            }
        }
        self.refresh_status();
    }

    fn select_theme(&mut self, name: &str) {
        if self.themes.current().is_some_and(|theme| theme.name == name) {
            return;
        }
        if let Err(e) = self.themes.apply_theme(name) {
            warn!(error = %e, "falling back to the default theme");
            if let Err(e) = self.themes.apply_theme(DEFAULT_THEME) {
                warn!(error = %e, "could not apply the default theme");
            }
        }
    }

    fn restyle(&mut self) {
        for (&wid, &role) in &self.windows {
            self.classes.insert(wid, self.themes.style_classes(role));
        }
    }

    fn refresh_status(&mut self) {
        let main = self.windows.iter().find(|(_, role)| **role == Role::Main).map(|(wid, _)| *wid);
        let cards = self.windows.values().filter(|role| **role == Role::Card).count();
        let theme = self.themes.current().map_or("none", |theme| theme.name);
        let status = match main {
            Some(main) => format!("main {main} | {cards} cards | theme {theme}"),
            None => format!("no main window | {cards} cards | theme {theme}"),
        };
        if status != self.status {
            info!(%status);
            self.status = status;
        }
    }

    pub fn status_line(&self) -> &str { &self.status }

    pub fn style_classes(&self, wid: WindowId) -> &[&'static str] {
        self.classes.get(&wid).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn themes(&self) -> &ThemeManager { &self.themes }
}
