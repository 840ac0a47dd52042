use crate::sys::window_system::WindowId;

/// Left-to-right order of the card row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardOrder(Vec<WindowId>);

impl CardOrder {
    pub fn new() -> CardOrder { CardOrder::default() }

    /// Appends `wid` unless it is already in the row.
    pub fn push_back(&mut self, wid: WindowId) -> bool {
        if self.contains(wid) {
            return false;
        }
        self.0.push(wid);
        true
    }

    pub fn remove(&mut self, wid: WindowId) -> bool {
        match self.position(wid) {
            Some(idx) => {
                self.0.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, wid: WindowId) -> bool { self.0.contains(&wid) }

    pub fn position(&self, wid: WindowId) -> Option<usize> {
        self.0.iter().position(|&w| w == wid)
    }

    pub fn first(&self) -> Option<WindowId> { self.0.first().copied() }

    pub fn last(&self) -> Option<WindowId> { self.0.last().copied() }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = WindowId> + '_ { self.0.iter().copied() }

    pub fn as_slice(&self) -> &[WindowId] { &self.0 }

    pub fn rotate_right(&mut self, n: usize) {
        if !self.0.is_empty() {
            let n = n % self.0.len();
            self.0.rotate_right(n);
        }
    }

    pub fn clear(&mut self) { self.0.clear(); }
}
