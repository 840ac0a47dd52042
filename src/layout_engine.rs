//! Geometry for the TV layout: one main viewport above a row of cards.
//!
//! Everything here is a pure function of the work area, the layout constants
//! and the number of cards. The reactor decides *which* window gets which
//! rectangle.

mod constants;
pub mod tv;
pub mod utils;

pub use constants::{LayoutConstants, MAX_LAYOUT_PX};
pub use tv::{TvLayout, compute_card_rects, compute_main_rect};
