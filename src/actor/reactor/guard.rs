use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Single-flight flag for full layout passes.
///
/// Moving windows makes the window system emit focus and geometry
/// notifications, which can ask for another pass while one is running. Those
/// requests are dropped rather than queued.
#[derive(Debug, Default)]
pub struct LayoutGuard {
    in_flight: Arc<AtomicBool>,
}

/// Held for the duration of one pass; clears the flag when dropped, including
/// on early return.
#[derive(Debug)]
#[must_use = "the pass ends as soon as this is dropped"]
pub struct LayoutPass {
    in_flight: Arc<AtomicBool>,
}

impl LayoutGuard {
    pub fn try_enter(&self) -> Option<LayoutPass> {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some(LayoutPass { in_flight: self.in_flight.clone() })
    }

    pub fn is_in_flight(&self) -> bool { self.in_flight.load(Ordering::Acquire) }
}

impl Drop for LayoutPass {
    fn drop(&mut self) { self.in_flight.store(false, Ordering::Release); }
}
