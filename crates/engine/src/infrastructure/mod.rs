//! External dependency implementations.

pub mod cache;
pub mod media;
pub mod ollama;
pub mod ports;
pub mod resilient_llm;
