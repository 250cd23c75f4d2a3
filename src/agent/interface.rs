use async_trait::async_trait;

use crate::letta::types::{LettaResponse, MessageCreate};

/// A created agent that can take one conversational turn.
#[async_trait]
pub trait AgentGateway: Send + Sync {
    /// Send the messages as one turn and return the raw upstream response.
    async fn send_turn(&self, messages: Vec<MessageCreate>) -> anyhow::Result<LettaResponse>;
}
