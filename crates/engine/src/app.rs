//! Application composition.
//!
//! `App` owns every piece of shared state explicitly: the story graph is
//! injected at construction, the asset cache is shared into the pipeline,
//! and sessions live in a registry keyed by stable ids.

use std::sync::Arc;

use tokio::sync::RwLock;

use reelwright_domain::{SessionState, StoryError, StoryGraph};

use crate::api::sessions::SessionRegistry;
use crate::config::EngineConfig;
use crate::infrastructure::cache::AssetCache;
use crate::infrastructure::ports::{LlmPort, MediaGenPort};
use crate::use_cases::content::{ContentPipeline, PipelineConfig};
use crate::use_cases::director::Director;
use crate::use_cases::emotion::EmotionClassifier;
use crate::use_cases::narrator::Narrator;

/// Composed application services and shared state.
pub struct App {
    pub config: EngineConfig,
    pub graph: Arc<StoryGraph>,
    pub classifier: EmotionClassifier,
    pub director: Director,
    pub narrator: Narrator,
    pub content: Arc<ContentPipeline>,
    /// Narrative state backing the stateless REST surface.
    pub rest_state: RwLock<SessionState>,
    pub registry: SessionRegistry,
}

impl App {
    pub fn new(
        graph: StoryGraph,
        llm: Arc<dyn LlmPort>,
        media: Arc<dyn MediaGenPort>,
        config: EngineConfig,
    ) -> Result<Self, StoryError> {
        let graph = Arc::new(graph);
        let cache = Arc::new(AssetCache::new());
        let content = Arc::new(ContentPipeline::new(
            Arc::clone(&graph),
            media,
            cache,
            PipelineConfig::from(&config),
        ));

        let entry_chapter = graph.get(graph.entry())?.chapter.clone();
        let rest_state = RwLock::new(SessionState::new(graph.entry(), entry_chapter, "mystery"));

        Ok(Self {
            classifier: EmotionClassifier::new(Arc::clone(&llm)),
            director: Director::new(Arc::clone(&llm)),
            narrator: Narrator::new(llm),
            content,
            graph,
            rest_state,
            registry: SessionRegistry::new(),
            config,
        })
    }

    /// A fresh session state positioned at the story entry.
    pub fn initial_session_state(&self, genre: Option<&str>) -> Result<SessionState, StoryError> {
        let entry = self.graph.get(self.graph.entry())?;
        Ok(SessionState::new(
            entry.id.clone(),
            entry.chapter.clone(),
            genre.unwrap_or("mystery"),
        ))
    }
}
