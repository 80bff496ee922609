pub mod room;
pub mod messages;
pub mod errors;

// Re-export all types
pub use room::*;
pub use messages::*;
pub use errors::*;

pub type PlayerId = uuid::Uuid;
pub type RoomId = uuid::Uuid;
