use crate::sys::geometry::Rect;

/// Applies the configured inner padding to a computed rectangle just before
/// it is handed to the window system.
pub fn apply_padding(rect: Rect, padding_inner: i32) -> Rect {
    if padding_inner <= 0 { rect } else { rect.inset(padding_inner) }
}
