//! Session transport messages.
//!
//! These types are exchanged over the duplex session connection: the client
//! sends `ClientMessage`, the engine answers with `ServerMessage`. Variants
//! are tagged with a lowercase `type` field on the wire.

use serde::{Deserialize, Serialize};

use reelwright_domain::{EmotionReading, SceneAssets};

/// Messages from viewer client to engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Begin (or restart) the story, optionally choosing a genre.
    Start {
        #[serde(default)]
        genre: Option<String>,
    },
    /// Restart the story keeping the current genre.
    Reset,
    /// A raw webcam frame to classify, base64-encoded jpeg.
    Frame { data: String },
    /// A pre-classified reading from a client-side classifier.
    Emotion { data: EmotionReading },
}

/// Messages from engine to viewer client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The next scene's generated assets.
    Scene { assets: SceneAssets },
    /// Echo of a classified reading, for on-screen display.
    Emotion { data: EmotionReading },
    /// A branch decision is in flight.
    Deciding,
    /// The story reached an ending.
    Complete {
        ending: String,
        scenes_played: Vec<String>,
    },
    /// Something went wrong handling the session; the connection will close.
    Error { message: String },
}
