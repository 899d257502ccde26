//! Process-lifetime cache of generated scene assets.
//!
//! Shared across all sessions and injected into the asset pipeline. Writes
//! are idempotent under concurrent duplicate requests for the same key (a
//! prefetch and a real decision racing to the same scene overwrite each
//! other with an equivalent value), so no per-key locking is needed.

use std::sync::Arc;

use dashmap::DashMap;

use reelwright_domain::{AssetKey, SceneAssets};

#[derive(Default)]
pub struct AssetCache {
    entries: DashMap<AssetKey, Arc<SceneAssets>>,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored value itself, not a copy, so repeated hits hand
    /// out the identical allocation.
    pub fn get(&self, key: &AssetKey) -> Option<Arc<SceneAssets>> {
        self.entries.get(key).map(|entry| Arc::clone(&entry))
    }

    pub fn insert(&self, key: AssetKey, assets: Arc<SceneAssets>) {
        self.entries.insert(key, assets);
    }

    /// Empty the cache. Invoked on story reset so replays regenerate.
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelwright_domain::SceneDecision;

    fn assets(scene_id: &str) -> Arc<SceneAssets> {
        Arc::new(SceneAssets {
            scene_id: scene_id.to_string(),
            video: None,
            image: Some("aW1n".to_string()),
            audio: None,
            narration_text: "line".to_string(),
            mood: "neutral".to_string(),
            chapter: String::new(),
            duration_seconds: 16,
        })
    }

    fn key(scene_id: &str) -> AssetKey {
        AssetKey::for_scene(scene_id, "mystery", &SceneDecision::linear(scene_id))
    }

    #[test]
    fn get_returns_identical_arc() {
        let cache = AssetCache::new();
        let stored = assets("foyer");
        cache.insert(key("foyer"), Arc::clone(&stored));

        let hit = cache.get(&key("foyer")).expect("cache hit");
        assert!(Arc::ptr_eq(&stored, &hit));
    }

    #[test]
    fn missing_key_returns_none() {
        let cache = AssetCache::new();
        assert!(cache.get(&key("foyer")).is_none());
    }

    #[test]
    fn overwrite_replaces_value() {
        let cache = AssetCache::new();
        cache.insert(key("foyer"), assets("foyer"));
        let replacement = assets("foyer");
        cache.insert(key("foyer"), Arc::clone(&replacement));

        let hit = cache.get(&key("foyer")).expect("cache hit");
        assert!(Arc::ptr_eq(&replacement, &hit));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_empties_cache() {
        let cache = AssetCache::new();
        cache.insert(key("foyer"), assets("foyer"));
        cache.insert(key("study"), assets("study"));
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }
}
