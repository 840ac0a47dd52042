use serde::{Deserialize, Serialize};

/// Sizes that shape the layout. Read once per pass from the configuration.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(deny_unknown_fields)]
pub struct LayoutConstants {
    #[serde(default = "default_card_width")]
    pub card_width: i32,
    #[serde(default = "default_card_height")]
    pub card_height: i32,
    /// Horizontal space left of every card.
    #[serde(default = "default_card_margin")]
    pub card_margin: i32,
    /// Space around the main viewport and below the card row.
    #[serde(default = "default_main_margin")]
    pub main_margin: i32,
}

impl Default for LayoutConstants {
    fn default() -> Self {
        Self {
            card_width: default_card_width(),
            card_height: default_card_height(),
            card_margin: default_card_margin(),
            main_margin: default_main_margin(),
        }
    }
}

/// Largest size or margin, in pixels, the configuration may ask for.
pub const MAX_LAYOUT_PX: i32 = 10_000;

impl LayoutConstants {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        for (name, value) in [("card_width", self.card_width), ("card_height", self.card_height)] {
            if value <= 0 {
                issues.push(format!("{name} must be positive, got {value}"));
            } else if value > MAX_LAYOUT_PX {
                issues.push(format!("{name} should not exceed {MAX_LAYOUT_PX} px, got {value}"));
            }
        }
        for (name, value) in [("card_margin", self.card_margin), ("main_margin", self.main_margin)] {
            if value < 0 {
                issues.push(format!("{name} must be non-negative, got {value}"));
            } else if value > MAX_LAYOUT_PX {
                issues.push(format!("{name} should not exceed {MAX_LAYOUT_PX} px, got {value}"));
            }
        }

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        let sizes = [
            (&mut self.card_width, default_card_width()),
            (&mut self.card_height, default_card_height()),
        ];
        for (value, default) in sizes {
            if *value <= 0 || *value > MAX_LAYOUT_PX {
                *value = default;
                fixes += 1;
            }
        }
        let margins = [
            (&mut self.card_margin, default_card_margin()),
            (&mut self.main_margin, default_main_margin()),
        ];
        for (value, default) in margins {
            if *value < 0 || *value > MAX_LAYOUT_PX {
                *value = default;
                fixes += 1;
            }
        }

        fixes
    }
}

fn default_card_width() -> i32 { 320 }

fn default_card_height() -> i32 { 180 }

fn default_card_margin() -> i32 { 10 }

fn default_main_margin() -> i32 { 20 }
