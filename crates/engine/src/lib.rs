//! Reelwright Engine library.
//!
//! Server-side core of the adaptive interactive film: session orchestration,
//! emotion accumulation, branch decisions, and asset generation.
//!
//! ## Structure
//!
//! - `use_cases/` - Emotion classification, decision policy, narration, and
//!   the asset pipeline
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `api/` - HTTP and WebSocket entry points
//! - `app` - Application composition
//! - `config` - Environment-driven settings

pub mod api;
pub mod app;
pub mod config;
pub mod infrastructure;
pub mod use_cases;

pub use app::App;
pub use config::EngineConfig;
