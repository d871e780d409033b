// Telegram control surface: status queries and remote maintenance

pub mod events;
pub mod render;
pub mod runtime;
pub mod surface;


pub use events::{BotCommand, BotEvent, CallbackAction};
pub use runtime::{run, spawn_update_poller};
pub use surface::{ChatChannel, ControlSurface, SurfaceState};
