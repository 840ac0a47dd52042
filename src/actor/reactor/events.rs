mod command;
mod focus;
mod window;

pub use command::CommandEventHandler;
pub use focus::FocusEventHandler;
pub use window::WindowEventHandler;
