use serde::Serialize;

use super::LayoutConstants;
use crate::sys::geometry::Rect;
use crate::sys::window_system::WindowId;

/// The large viewport. It leaves room for the card row plus three margins:
/// above the viewport, between viewport and cards, and below the cards.
///
/// Arithmetic saturates, so out-of-range constants yield a degenerate rect
/// rather than a panic.
pub fn compute_main_rect(work_area: Rect, constants: &LayoutConstants) -> Rect {
    let margin = constants.main_margin;
    Rect {
        x: work_area.x.saturating_add(margin),
        y: work_area.y.saturating_add(margin),
        width: work_area.width.saturating_sub(margin.saturating_mul(2)),
        height: work_area
            .height
            .saturating_sub(constants.card_height)
            .saturating_sub(margin.saturating_mul(3)),
    }
}

/// One rectangle per card, left to right along the bottom of the work area.
///
/// There is a single row. With enough cards it runs past the right edge of the
/// work area; callers get the overflowing rectangles as-is.
pub fn compute_card_rects(work_area: Rect, constants: &LayoutConstants, count: usize) -> Vec<Rect> {
    let y = work_area
        .max_y()
        .saturating_sub(constants.card_height)
        .saturating_sub(constants.main_margin);
    let stride = constants.card_width.saturating_add(constants.card_margin);
    let left = work_area.x.saturating_add(constants.card_margin);
    (0..count)
        .map(|i| Rect {
            x: left.saturating_add(i32::try_from(i).unwrap_or(i32::MAX).saturating_mul(stride)),
            y,
            width: constants.card_width,
            height: constants.card_height,
        })
        .collect()
}

/// A fully resolved layout for one pass.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TvLayout {
    pub main: Option<(WindowId, Rect)>,
    pub cards: Vec<(WindowId, Rect)>,
}

impl TvLayout {
    pub fn calculate(
        work_area: Rect,
        constants: &LayoutConstants,
        main: Option<WindowId>,
        cards: &[WindowId],
    ) -> TvLayout {
        let main = main.map(|wid| (wid, compute_main_rect(work_area, constants)));
        let cards = cards
            .iter()
            .copied()
            .zip(compute_card_rects(work_area, constants, cards.len()))
            .collect();
        TvLayout { main, cards }
    }

    /// Main first, then cards in row order.
    pub fn frames(&self) -> impl Iterator<Item = (WindowId, Rect)> + '_ {
        self.main.iter().copied().chain(self.cards.iter().copied())
    }
}
