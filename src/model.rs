pub mod card_order;
pub mod registry;

pub use card_order::CardOrder;
pub use registry::{Listeners, Registry, Role, TrackedWindow};
