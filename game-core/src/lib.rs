pub mod room_state;
pub mod room_view;
pub mod scoring;
pub mod word_bank;
pub mod room_code;
pub mod hints;

// Re-export main components
pub use room_state::*;
pub use room_view::*;
pub use scoring::*;
pub use word_bank::*;
pub use room_code::*;
