pub mod app;
pub mod events;
pub mod screens;

pub use app::App;
pub use events::{Event, EventHandler};
