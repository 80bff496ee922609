pub mod config;
pub mod room_actor;
pub mod room_registry;
pub mod session;

pub use config::{Config, ConfigError};
pub use room_actor::{Joined, RoomHandle};
pub use room_registry::RoomRegistry;
pub use session::GameSession;
