use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::interface::AgentGateway;
use crate::config::{AgentProfile, Settings};
use crate::letta::types::{AgentState, CreateAgentRequest, LettaResponse, MessageCreate, MessagesRequest};
use crate::letta::{LettaClient, LettaError};

/// Startup half of the gateway: a connected client with no agent yet.
pub struct LettaManager {
    client: LettaClient,
}

impl LettaManager {
    /// Build the client and wait for the Letta server to answer its health probe.
    ///
    /// The probe is attempted `settings.letta_connect_retries + 1` times.
    pub async fn connect(settings: &Settings) -> anyhow::Result<Self> {
        let client = LettaClient::new(
            &settings.letta_base_url,
            settings.letta_token.as_deref(),
            settings.letta_timeout(),
        )?;

        let attempts = probe_attempts(settings.letta_connect_retries);
        let mut attempt = 1;
        loop {
            match client.health().await {
                Ok(()) => break,
                Err(e) if attempt < attempts => {
                    warn!(
                        "Letta at {} not reachable (attempt {}/{}): {}",
                        client.base_url(),
                        attempt,
                        attempts,
                        e
                    );
                    attempt += 1;
                    tokio::time::sleep(settings.letta_retry_delay()).await;
                }
                Err(e) => {
                    anyhow::bail!(
                        "Letta at {} unreachable after {} attempts: {}",
                        client.base_url(),
                        attempts,
                        e
                    );
                }
            }
        }

        info!("Connected to Letta at {}", client.base_url());
        Ok(Self { client })
    }

    pub async fn list_tool_sources(&self) -> Result<Vec<String>, LettaError> {
        self.client.list_mcp_servers().await
    }

    /// Register every tool exposed by `source`, in listing order.
    ///
    /// The first failed registration aborts the whole call.
    pub async fn register_tools(&self, source: &str) -> Result<Vec<String>, LettaError> {
        let tools = self.client.list_mcp_tools_by_server(source).await?;
        info!("Registering {} tools from MCP server '{}'", tools.len(), source);

        let mut tool_ids = Vec::with_capacity(tools.len());
        for tool in tools {
            let added = self.client.add_mcp_tool(source, &tool.name).await?;
            debug!("Registered tool {} as {}", tool.name, added.id);
            tool_ids.push(added.id);
        }
        Ok(tool_ids)
    }

    /// Create the single agent for this process.
    pub async fn create_agent(
        self,
        profile: &AgentProfile,
        tool_ids: Vec<String>,
    ) -> Result<LettaAgent, LettaError> {
        let request = CreateAgentRequest {
            name: profile.name.clone(),
            system: profile.system.clone(),
            model: profile.model.clone(),
            embedding: profile.embedding.clone(),
            tool_ids,
            tool_rules: profile.tool_rules.clone(),
        };
        let agent = self.client.create_agent(&request).await?;
        info!("Created agent '{}' ({})", agent.name, agent.id);

        Ok(LettaAgent {
            client: self.client,
            agent,
        })
    }
}

/// Total health probes for a retry budget; never zero.
fn probe_attempts(retries: u32) -> u32 {
    retries.saturating_add(1)
}

/// A created Letta agent, shared by every request for the process lifetime.
#[derive(Debug)]
pub struct LettaAgent {
    client: LettaClient,
    agent: AgentState,
}

impl LettaAgent {
    pub fn id(&self) -> &str {
        &self.agent.id
    }
}

#[async_trait]
impl AgentGateway for LettaAgent {
    async fn send_turn(&self, messages: Vec<MessageCreate>) -> anyhow::Result<LettaResponse> {
        let request = MessagesRequest { messages };
        Ok(self.client.create_message(&self.agent.id, &request).await?)
    }
}
