use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::layout_engine::{LayoutConstants, MAX_LAYOUT_PX};

const DEFAULT_CONFIG: &str = include_str!("../../tvmode.default.toml");

const MAX_FOCUS_DEBOUNCE_MS: u64 = 5_000;

pub fn config_dir() -> Option<PathBuf> { dirs::config_dir().map(|dir| dir.join("tvmode")) }

pub fn config_file() -> Option<PathBuf> { config_dir().map(|dir| dir.join("config.toml")) }

/// Directory searched for theme stylesheets when `settings.themes_dir` is unset.
pub fn default_themes_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("tvmode").join("themes"))
        .unwrap_or_else(|| PathBuf::from("themes"))
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub layout: LayoutConstants,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Passed through to the window system with every frame change. The
    /// reactor itself never animates.
    #[serde(default = "no")]
    pub animate: bool,
    /// Inset applied to every computed rectangle before it is applied.
    #[serde(default)]
    pub padding_inner: i32,
    /// How long focus has to stay put before the layout is re-evaluated.
    #[serde(default = "default_focus_debounce_ms")]
    pub focus_debounce_ms: u64,
    /// Turn minimize into "send to the card row" instead of dropping the
    /// window from the layout.
    #[serde(default = "yes")]
    pub minimize_to_card: bool,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub themes_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            animate: false,
            padding_inner: 0,
            focus_debounce_ms: default_focus_debounce_ms(),
            minimize_to_card: true,
            theme: default_theme(),
            themes_dir: None,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.padding_inner < 0 {
            issues.push(format!(
                "padding_inner must be non-negative, got {}",
                self.padding_inner
            ));
        } else if self.padding_inner > MAX_LAYOUT_PX {
            issues.push(format!(
                "padding_inner should not exceed {} px, got {}",
                MAX_LAYOUT_PX, self.padding_inner
            ));
        }

        if self.focus_debounce_ms > MAX_FOCUS_DEBOUNCE_MS {
            issues.push(format!(
                "focus_debounce_ms should not exceed {} ms, got {}",
                MAX_FOCUS_DEBOUNCE_MS, self.focus_debounce_ms
            ));
        }

        if self.theme.trim().is_empty() {
            issues.push("theme must not be empty".to_string());
        }

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        if self.padding_inner < 0 || self.padding_inner > MAX_LAYOUT_PX {
            self.padding_inner = 0;
            fixes += 1;
        }

        if self.focus_debounce_ms > MAX_FOCUS_DEBOUNCE_MS {
            self.focus_debounce_ms = default_focus_debounce_ms();
            fixes += 1;
        }

        if self.theme.trim().is_empty() {
            self.theme = default_theme();
            fixes += 1;
        }

        fixes
    }

    pub fn themes_dir(&self) -> PathBuf {
        self.themes_dir.clone().unwrap_or_else(default_themes_dir)
    }
}

fn yes() -> bool { true }

fn no() -> bool { false }

fn default_focus_debounce_ms() -> u64 { 100 }

fn default_theme() -> String { "default".to_string() }

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::parse(&buf)
    }

    /// Reads `path` if it exists, falling back to the defaults otherwise.
    pub fn read_or_default(path: Option<&Path>) -> anyhow::Result<Config> {
        match path {
            Some(path) if path.exists() => Self::read(path),
            _ => Ok(Config::default()),
        }
    }

    /// The configuration shipped with the binary, as text.
    pub fn bundled() -> &'static str { DEFAULT_CONFIG }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, toml_string.as_bytes())?;

        Ok(())
    }

    /// Validates the entire configuration and returns a list of issues found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        issues.extend(self.settings.validate());
        issues.extend(self.layout.validate());
        issues
    }

    /// Attempts to fix configuration values automatically.
    /// Returns the number of fixes applied.
    pub fn auto_fix_values(&mut self) -> usize {
        self.settings.auto_fix_values() + self.layout.auto_fix_values()
    }

    pub fn parse(buf: &str) -> anyhow::Result<Config> {
        let config: Config = toml::from_str(buf)?;
        Ok(config)
    }
}
