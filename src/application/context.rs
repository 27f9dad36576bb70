//! Application context - explicit owner of the registries, stores and
//! collaborators a running orchestrator needs.
//!
//! Built once at startup. Registries are populated on the builder and frozen
//! behind `Arc` when the context is built, so turns only ever read them.

use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::adapters::agent_state::{AgentStateSweeper, InMemoryAgentStateStore, SweeperHandle};
use crate::adapters::storage::{create_domain_storage, InMemoryStateRepository};
use crate::config::{AppConfig, ConfigError};
use crate::domain::foundation::{Clock, SystemClock};
use crate::domain::plugin::{DomainRegistry, RegistryError};
use crate::domain::steering::SteeringRegistry;
use crate::ports::{AgentStateStore, ConversationStateRepository, DomainStorage, TextGenerator};

use super::pipeline::{
    ClassificationStage, CompositionStage, ExtractionStage, StagePipeline, SteeringStage,
};

pub struct AppContext {
    pub config: AppConfig,
    pub domains: Arc<DomainRegistry>,
    pub strategies: Arc<SteeringRegistry>,
    pub agent_state: Arc<dyn AgentStateStore>,
    pub repository: Arc<dyn ConversationStateRepository>,
    pub generator: Arc<dyn TextGenerator>,
    pub clock: Arc<dyn Clock>,
    sweeper: Mutex<Option<SweeperHandle>>,
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.config)
            .field("domains", &self.domains)
            .field("strategies", &self.strategies)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    pub fn builder(config: AppConfig, generator: Arc<dyn TextGenerator>) -> AppContextBuilder {
        AppContextBuilder::new(config, generator)
    }

    /// Classification, extraction, steering, composition.
    pub fn standard_pipeline(&self) -> StagePipeline {
        StagePipeline::new()
            .with_stage(Arc::new(ClassificationStage::default()))
            .with_stage(Arc::new(ExtractionStage::new(
                Arc::clone(&self.domains),
                Arc::clone(&self.agent_state),
            )))
            .with_stage(Arc::new(
                SteeringStage::new(Arc::clone(&self.strategies), Arc::clone(&self.domains))
                    .with_options(self.config.steering.merge_options())
                    .with_timeout(self.config.steering.strategy_timeout()),
            ))
            .with_stage(Arc::new(CompositionStage::new()))
    }

    /// Start the agent state sweeper. Returns false if it is already running.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start_sweeper(&self) -> bool {
        let mut slot = self.sweeper.lock().await;
        if slot.is_some() {
            return false;
        }

        let sweeper = AgentStateSweeper::with_config(
            Arc::clone(&self.agent_state),
            self.config.agent_state.sweeper_config(),
        );
        *slot = Some(sweeper.spawn());
        tracing::info!(
            sweep_interval_secs = self.config.agent_state.sweep_interval_secs,
            "Agent state sweeper started"
        );
        true
    }

    pub async fn is_sweeper_running(&self) -> bool {
        self.sweeper
            .lock()
            .await
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Stop background work and wait for it to finish.
    pub async fn shutdown(&self) {
        let handle = self.sweeper.lock().await.take();
        if let Some(handle) = handle {
            handle.shutdown().await;
            tracing::info!("Agent state sweeper stopped");
        }
    }

    /// Storage backend for a registered domain.
    ///
    /// # Errors
    ///
    /// - `UnknownDomain` if no domain has this id
    /// - `UnsupportedStorageType` if its configured backend is unknown
    pub fn domain_storage(&self, domain_id: &str) -> Result<Arc<dyn DomainStorage>, RegistryError> {
        let domain = self
            .domains
            .get_domain(domain_id)
            .ok_or_else(|| RegistryError::UnknownDomain(domain_id.to_string()))?;
        create_domain_storage(
            domain_id,
            &domain.config.storage,
            &self.config.conversation.data_dir,
        )
    }
}

/// Builder for [`AppContext`].
///
/// Stores default to their in-memory adapters and the clock to wall time.
pub struct AppContextBuilder {
    config: AppConfig,
    generator: Arc<dyn TextGenerator>,
    domains: DomainRegistry,
    strategies: SteeringRegistry,
    agent_state: Option<Arc<dyn AgentStateStore>>,
    repository: Option<Arc<dyn ConversationStateRepository>>,
    clock: Option<Arc<dyn Clock>>,
}

impl AppContextBuilder {
    pub fn new(config: AppConfig, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            config,
            generator,
            domains: DomainRegistry::new(),
            strategies: SteeringRegistry::new(),
            agent_state: None,
            repository: None,
            clock: None,
        }
    }

    pub fn with_domains(mut self, domains: DomainRegistry) -> Self {
        self.domains = domains;
        self
    }

    pub fn with_strategies(mut self, strategies: SteeringRegistry) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn with_agent_state_store(mut self, store: Arc<dyn AgentStateStore>) -> Self {
        self.agent_state = Some(store);
        self
    }

    pub fn with_repository(mut self, repository: Arc<dyn ConversationStateRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Clock used for snapshots and, unless a store is supplied, agent state expiry.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// # Errors
    ///
    /// `ConfigError::ValidationFailed` if the configuration is invalid.
    pub fn build(self) -> Result<AppContext, ConfigError> {
        self.config.validate()?;

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let agent_state = self
            .agent_state
            .unwrap_or_else(|| Arc::new(InMemoryAgentStateStore::with_clock(Arc::clone(&clock))));
        let repository = self
            .repository
            .unwrap_or_else(|| Arc::new(InMemoryStateRepository::new()));

        let stats = self.domains.get_stats();
        tracing::info!(
            domains = stats.total,
            enabled_domains = stats.enabled,
            strategies = self.strategies.len(),
            "Application context built"
        );

        Ok(AppContext {
            config: self.config,
            domains: Arc::new(self.domains),
            strategies: Arc::new(self.strategies),
            agent_state,
            repository,
            generator: self.generator,
            clock,
            sweeper: Mutex::new(None),
        })
    }
}
