//! Lazy, race-free agent registry.
//!
//! At most one agent per kind is ever constructed. The map's mutex is
//! held across construction, so concurrent first requests for the same
//! kind serialize and the first construction wins; a construction
//! failure inserts nothing, and the next caller starts from scratch.

use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use super::{Agent, AgentConfig, AgentKind, AgentReply, ChatAgent, SearchAgent};

/// One dispatched execution, paired with the handle's identity.
#[derive(Debug)]
pub struct AgentDispatch {
    pub kind: AgentKind,
    pub capabilities: Vec<String>,
    pub reply: AgentReply,
}

pub struct AgentRegistry {
    config: AgentConfig,
    http: reqwest::Client,
    agents: Mutex<HashMap<AgentKind, Arc<dyn Agent>>>,
}

impl AgentRegistry {
    pub fn new(config: AgentConfig, http: reqwest::Client) -> Self {
        Self {
            config,
            http,
            agents: Mutex::new(HashMap::new()),
        }
    }

    fn build_agent(&self, kind: AgentKind) -> Result<Arc<dyn Agent>> {
        let agent: Arc<dyn Agent> = match kind {
            AgentKind::Chat => Arc::new(ChatAgent::new(&self.config, self.http.clone())?),
            AgentKind::Search => Arc::new(SearchAgent::new(&self.config, self.http.clone())?),
        };
        Ok(agent)
    }

    /// Return the agent for `kind`, constructing it on first use.
    pub async fn get_or_create(&self, kind: AgentKind) -> Result<Arc<dyn Agent>> {
        let mut agents = self.agents.lock().await;
        if let Some(agent) = agents.get(&kind) {
            return Ok(agent.clone());
        }

        // Lock stays held through construction: first writer wins.
        let agent = self.build_agent(kind)?;
        agents.insert(kind, agent.clone());
        info!("Initialized {} agent", kind.as_str());
        Ok(agent)
    }

    /// Execute one message on the agent for `kind`.
    ///
    /// The reply passes through unchanged; the registry only pairs it
    /// with the kind and the handle's advertised capability list.
    pub async fn dispatch(
        &self,
        kind: AgentKind,
        message: &str,
        use_tools: bool,
    ) -> Result<AgentDispatch> {
        let agent = self.get_or_create(kind).await?;
        let capabilities = agent.capabilities();
        let reply = agent.execute(message, use_tools).await?;

        Ok(AgentDispatch {
            kind,
            capabilities,
            reply,
        })
    }

    /// Capability list for `kind`, via a transient handle if none is
    /// cached yet. The transient handle is not stored.
    pub async fn capabilities(&self, kind: AgentKind) -> Result<Vec<String>> {
        if let Some(agent) = self.agents.lock().await.get(&kind) {
            return Ok(agent.capabilities());
        }
        Ok(self.build_agent(kind)?.capabilities())
    }

    /// Whether a handle for `kind` is currently cached.
    pub async fn is_cached(&self, kind: AgentKind) -> bool {
        self.agents.lock().await.contains_key(&kind)
    }
}
