use thiserror::Error;

use crate::sys::geometry::Rect;
use crate::sys::window_system::{WindowId, WindowSystemError};

/// Failures that abort the current layout pass. Frames applied before the
/// failure stay applied.
#[derive(Debug, Error)]
pub enum ReactorError {
    #[error("applying {frame} to window {wid} failed: {source}")]
    Geometry {
        wid: WindowId,
        frame: Rect,
        #[source]
        source: WindowSystemError,
    },
}
