//! Assembles an [`Agent`] from configuration and its collaborators.

use crate::agent::{Agent, AgentParts};
use crate::queue::{FifoStimulusQueue, Inbox};
use crate::schedule::HeartbeatSchedule;
use chrono::Utc;
use recollect_config::AppConfig;
use recollect_core::core_memory::CoreMemory;
use recollect_core::error::{Error, Result};
use recollect_core::event::EventBus;
use recollect_core::inference::InferenceBackend;
use recollect_core::prompt::{PromptRenderer, templates};
use recollect_core::stimulus::StimulusQueue;
use recollect_core::tool::{Tool, ToolCatalog, ToolTier};
use recollect_memory::MemoryTiers;
use recollect_prompt::HandlebarsRenderer;
use recollect_tools::{Dispatcher, register_memory_tools};
use std::sync::Arc;
use tracing::info;

pub struct AgentBuilder {
    config: AppConfig,
    inference: Arc<dyn InferenceBackend>,
    memory: Option<MemoryTiers>,
    renderer: Option<Arc<dyn PromptRenderer>>,
    queue: Option<Arc<dyn StimulusQueue>>,
    events: Option<Arc<EventBus>>,
    tools: Vec<Arc<dyn Tool>>,
}

impl AgentBuilder {
    pub fn new(config: AppConfig, inference: Arc<dyn InferenceBackend>) -> Self {
        Self {
            config,
            inference,
            memory: None,
            renderer: None,
            queue: None,
            events: None,
            tools: Vec::new(),
        }
    }

    /// Use these tiers instead of the ones `[memory]` describes.
    pub fn memory(mut self, memory: MemoryTiers) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn PromptRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn queue(mut self, queue: Arc<dyn StimulusQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn event_bus(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    /// Register a user-tier tool. User tools shadow same-named backend and
    /// OS tools.
    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Load persisted core memory (or render a fresh one) and wire the agent.
    pub async fn build(self) -> Result<Agent> {
        self.config
            .validate()
            .map_err(|e| Error::Internal(format!("invalid configuration: {e}")))?;

        let instance_id = self
            .config
            .agent
            .instance_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let memory = match self.memory {
            Some(memory) => memory,
            None => MemoryTiers::from_config(&self.config.memory, &instance_id),
        };

        let renderer: Arc<dyn PromptRenderer> = match self.renderer {
            Some(renderer) => renderer,
            None => match &self.config.prompt.templates_dir {
                Some(dir) => Arc::new(HandlebarsRenderer::with_overrides(dir)?),
                None => Arc::new(HandlebarsRenderer::new()?),
            },
        };

        let core = match memory.core.load().await? {
            Some(core) => {
                info!(
                    instance_id = %instance_id,
                    history = core.history.len(),
                    "Loaded persisted core memory"
                );
                core
            }
            None => {
                let core = fresh_core(renderer.as_ref(), &instance_id)?;
                memory.core.save(&core).await?;
                info!(instance_id = %instance_id, "Initialized core memory from templates");
                core
            }
        };

        let mut catalog = ToolCatalog::new();
        for tool in self.tools {
            catalog.register(ToolTier::User, tool);
        }
        for tool in self.inference.tools() {
            catalog.register(ToolTier::Backend, tool);
        }
        register_memory_tools(
            &mut catalog,
            Arc::clone(&memory.recall),
            Arc::clone(&memory.archival),
        );

        let events = self.events.unwrap_or_default();
        let queue = self
            .queue
            .unwrap_or_else(|| Arc::new(FifoStimulusQueue::new()));

        info!(
            instance_id = %instance_id,
            inference = self.inference.name(),
            recall = memory.recall.name(),
            archival = memory.archival.name(),
            tools = catalog.len(),
            heartrate_secs = self.config.agent.heartrate_secs,
            "Agent assembled"
        );

        Ok(Agent::from_parts(AgentParts {
            instance_id,
            core,
            inference: self.inference,
            renderer,
            inbox: Inbox::new(queue, Arc::clone(&events)),
            memory,
            catalog,
            dispatcher: Dispatcher::new(
                self.config.tools.timeout(),
                self.config.tools.max_result_chars,
            ),
            schedule: HeartbeatSchedule::new(self.config.agent.heartrate()),
            inference_timeout: self.config.agent.inference_timeout(),
            events,
        }))
    }
}

fn fresh_core(renderer: &dyn PromptRenderer, instance_id: &str) -> Result<CoreMemory> {
    let params = serde_json::json!({
        "instance_id": instance_id,
        "started_at": Utc::now().to_rfc3339(),
    });
    Ok(CoreMemory::new(
        renderer.render(templates::BOOT, &params)?,
        renderer.render(templates::BIOS, &params)?,
        renderer.render(templates::PERSONA, &params)?,
        renderer.render(templates::HUMAN, &params)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use recollect_config::MemoryBackendKind;
    use recollect_core::memory::MemoryTierKind;

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.agent.instance_id = Some("builder-test".into());
        config
    }

    fn backend() -> Arc<SequentialMockBackend> {
        Arc::new(SequentialMockBackend::new(vec![]))
    }

    #[tokio::test]
    async fn defaults_come_from_config() {
        let agent = AgentBuilder::new(config(), backend()).build().await.unwrap();
        assert_eq!(agent.instance_id(), "builder-test");
        assert_eq!(agent.schedule().heartrate().as_secs(), 60);
        assert_eq!(agent.catalog().len(), 5);
    }

    #[tokio::test]
    async fn generated_instance_id_when_unset() {
        let agent = AgentBuilder::new(AppConfig::default(), backend())
            .memory(MemoryTiers::in_memory(10))
            .build()
            .await
            .unwrap();
        assert!(uuid::Uuid::parse_str(agent.instance_id()).is_ok());
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let mut config = config();
        config.agent.heartrate_secs = 0;
        let err = AgentBuilder::new(config, backend()).build().await.err().unwrap();
        assert!(err.to_string().contains("heartrate"));
    }

    #[tokio::test]
    async fn user_tools_shadow_builtins() {
        let agent = AgentBuilder::new(config(), backend())
            .tool(Arc::new(FailingTool))
            .build()
            .await
            .unwrap();
        let (tier, _) = agent.catalog().resolve("flaky_lookup").unwrap();
        assert_eq!(tier, ToolTier::User);
        assert_eq!(agent.catalog().resolve("search_recall").unwrap().0, ToolTier::Backend);
    }

    #[tokio::test]
    async fn fresh_core_is_saved_immediately() {
        let memory = MemoryTiers::in_memory(10);
        let store = Arc::clone(&memory.core);
        let agent = AgentBuilder::new(config(), backend())
            .memory(memory)
            .build()
            .await
            .unwrap();
        assert_eq!(store.load().await.unwrap().as_ref(), Some(agent.core()));
    }

    #[tokio::test]
    async fn file_backend_restores_core_across_builds() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config();
        config.memory.backend = MemoryBackendKind::File;
        config.memory.directory = dir.path().to_path_buf();

        let scripted = Arc::new(SequentialMockBackend::new(vec![reply("first words")]));
        let mut first = AgentBuilder::new(config.clone(), scripted)
            .build()
            .await
            .unwrap();
        first.run_thinking().await;
        drop(first);

        let second = AgentBuilder::new(config, backend()).build().await.unwrap();
        assert_eq!(second.core().history[0].content, "first words");
    }

    #[tokio::test]
    async fn template_overrides_shape_fresh_core() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("persona.hbs"), "I am {{instance_id}}'s gardener.").unwrap();
        let mut config = config();
        config.prompt.templates_dir = Some(dir.path().to_path_buf());

        let agent = AgentBuilder::new(config, backend())
            .memory(MemoryTiers::in_memory(10))
            .build()
            .await
            .unwrap();
        assert_eq!(agent.core().persona, "I am builder-test's gardener.");
    }

    #[tokio::test]
    async fn recording_tier_can_stand_in_for_recall() {
        let base = MemoryTiers::in_memory(10);
        let agent = AgentBuilder::new(config(), backend())
            .memory(MemoryTiers {
                recall: Arc::new(RecordingTier::new(MemoryTierKind::Recall)),
                ..base
            })
            .build()
            .await
            .unwrap();
        assert!(agent.catalog().resolve("search_recall").is_some());
    }
}
