//! Core services: emotion classification, decision policy, narration
//! adaptation, and the asset pipeline.

pub mod content;
pub mod director;
pub mod emotion;
pub mod narrator;

/// Strip a markdown code fence that chat models like to wrap JSON in.
///
/// Handles both ```json and bare ``` fences; anything else is returned
/// trimmed. The caller still runs a strict decode on the result.
pub(crate) fn strip_json_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let without_prefix = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_prefix
        .strip_suffix("```")
        .unwrap_or(without_prefix)
        .trim()
}
