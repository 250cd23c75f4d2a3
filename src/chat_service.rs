use std::sync::Arc;

use tracing::{debug, info};

use crate::agent::AgentGateway;
use crate::error::ChatError;
use crate::letta::types::MessageCreate;
use crate::models::{ChatRequest, ChatResponse};

/// Relays one user message to the agent and returns its first assistant reply.
pub struct ChatService {
    gateway: Arc<dyn AgentGateway>,
}

impl ChatService {
    pub fn new(gateway: Arc<dyn AgentGateway>) -> Self {
        Self { gateway }
    }

    pub async fn process_message(&self, request: ChatRequest) -> Result<ChatResponse, ChatError> {
        let user_prompt = request.message.trim();
        if user_prompt.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        debug!("Forwarding {} chars to agent", user_prompt.len());
        let payload = vec![MessageCreate::user(user_prompt)];
        let response = self
            .gateway
            .send_turn(payload)
            .await
            .map_err(ChatError::Upstream)?;
        info!("Agent turn returned {} messages", response.messages.len());

        let first_assistant = response
            .messages
            .iter()
            .find(|msg| msg.is_assistant())
            .ok_or(ChatError::NoAssistantReply)?;

        let reply = first_assistant.text().ok_or_else(|| {
            ChatError::Upstream(anyhow::anyhow!("assistant message carried no content"))
        })?;

        Ok(ChatResponse { reply })
    }
}
