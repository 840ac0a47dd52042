//! The window-system boundary and its in-memory implementation.

pub mod geometry;
pub mod headless;
pub mod window_system;
