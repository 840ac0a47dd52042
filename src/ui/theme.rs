//! Themes for the main viewport and the card row.
//!
//! A theme is a stylesheet plus a set of style classes attached to each laid
//! out window. The catalog is fixed; a theme is only offered when its
//! stylesheet is present in the themes directory.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::model::Role;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub name: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    /// Stylesheet inside the themes directory. The default theme has none.
    pub css_file: Option<&'static str>,
    pub author: &'static str,
    pub version: &'static str,
}

pub const DEFAULT_THEME: &str = "default";
pub const TV_FUTURISTIC: &str = "tv-futuristic";

static BUILTIN_THEMES: [Theme; 2] = [
    Theme {
        name: TV_FUTURISTIC,
        display_name: "TV Futuristic",
        description: "Futuristic blue theme with larger controls and text for viewing at a distance",
        css_file: Some("tv-futuristic.css"),
        author: "tvmode",
        version: "1.0.0",
    },
    Theme {
        name: DEFAULT_THEME,
        display_name: "Default",
        description: "Plain styling with standard sizing",
        css_file: None,
        author: "tvmode",
        version: "1.0.0",
    },
];

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeColors {
    pub primary: &'static str,
    pub secondary: &'static str,
    pub accent: &'static str,
}

const PLAIN_COLORS: ThemeColors = ThemeColors {
    primary: "#ffffff",
    secondary: "#cccccc",
    accent: "#0066cc",
};

const FUTURISTIC_COLORS: ThemeColors = ThemeColors {
    primary: "#00d4ff",
    secondary: "#00aaff",
    accent: "#00ffff",
};

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("unknown theme {0:?}")]
    Unknown(String),
    #[error("stylesheet for theme {theme:?} not found at {}", path.display())]
    MissingStylesheet { theme: String, path: PathBuf },
    #[error("reading stylesheet {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug)]
pub struct ThemeManager {
    themes_dir: PathBuf,
    current: Option<&'static Theme>,
    stylesheet: Option<String>,
}

impl ThemeManager {
    pub fn new(themes_dir: impl Into<PathBuf>) -> ThemeManager {
        ThemeManager {
            themes_dir: themes_dir.into(),
            current: None,
            stylesheet: None,
        }
    }

    pub fn themes_dir(&self) -> &Path { &self.themes_dir }

    pub fn catalog() -> &'static [Theme] { &BUILTIN_THEMES }

    /// Themes that can be applied right now: the default theme plus every
    /// theme whose stylesheet exists.
    pub fn available_themes(&self) -> Vec<&'static Theme> {
        BUILTIN_THEMES
            .iter()
            .filter(|theme| match theme.css_file {
                None => true,
                Some(file) => {
                    let exists = self.themes_dir.join(file).is_file();
                    debug!(theme = theme.name, exists, "checked theme stylesheet");
                    exists
                }
            })
            .collect()
    }

    pub fn current(&self) -> Option<&'static Theme> { self.current }

    /// Contents of the loaded stylesheet, if the current theme has one.
    pub fn stylesheet(&self) -> Option<&str> { self.stylesheet.as_deref() }

    /// Switches to `name`. The previous theme is removed first, so on error
    /// no theme is active.
    pub fn apply_theme(&mut self, name: &str) -> Result<&'static Theme, ThemeError> {
        let theme = BUILTIN_THEMES
            .iter()
            .find(|theme| theme.name == name)
            .ok_or_else(|| ThemeError::Unknown(name.to_string()))?;
        self.remove_current_theme();

        if let Some(file) = theme.css_file {
            let path = self.themes_dir.join(file);
            if !path.is_file() {
                return Err(ThemeError::MissingStylesheet { theme: name.to_string(), path });
            }
            let css = std::fs::read_to_string(&path)
                .map_err(|source| ThemeError::Io { path: path.clone(), source })?;
            debug!(path = %path.display(), len = css.len(), "loaded stylesheet");
            self.stylesheet = Some(css);
        }
        self.current = Some(theme);
        info!(theme = theme.display_name, "applied theme");
        Ok(theme)
    }

    pub fn remove_current_theme(&mut self) {
        if let Some(theme) = self.current.take() {
            debug!(theme = theme.name, "removed theme");
        }
        self.stylesheet = None;
    }

    /// Style classes for a window with `role` under the current theme.
    pub fn style_classes(&self, role: Role) -> Vec<&'static str> {
        let Some(theme) = self.current else { return Vec::new() };
        if theme.name == DEFAULT_THEME {
            return Vec::new();
        }
        let mut classes = vec!["commontv-themed"];
        match role {
            Role::Main => classes.push("commontv-main-window"),
            Role::Card => classes.push("commontv-card-window"),
            Role::Untracked => return Vec::new(),
        }
        if theme.name == TV_FUTURISTIC {
            classes.extend(["commontv-holographic", "commontv-grid-bg", "commontv-glow-pulse"]);
        }
        classes
    }

    pub fn colors(&self) -> ThemeColors {
        match self.current {
            Some(theme) if theme.name == TV_FUTURISTIC => FUTURISTIC_COLORS,
            _ => PLAIN_COLORS,
        }
    }
}
