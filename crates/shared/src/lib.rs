//! Reelwright Shared - Types exchanged between the engine and its clients.

pub mod messages;
pub mod requests;

pub use messages::{ClientMessage, ServerMessage};
pub use requests::{FrameInput, GenerateRequest};
