//! Reelwright Domain - Core types for the adaptive-film engine.
//!
//! Pure data and domain logic only: the story graph, per-session narrative
//! state, emotion accumulation, and the value types exchanged between the
//! decision policy and the asset pipeline. No I/O lives here.

pub mod assets;
pub mod decision;
pub mod emotion;
pub mod error;
pub mod session;
pub mod story;

pub use assets::{AssetKey, SceneAssets};
pub use decision::{Pacing, SceneDecision};
pub use emotion::{
    Attention, Emotion, EmotionAccumulator, EmotionReading, EmotionSummary, Trend,
};
pub use error::StoryError;
pub use session::{SessionId, SessionState};
pub use story::{SceneNode, StoryGraph};
