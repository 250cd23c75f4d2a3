use std::sync::Arc;

use crate::agent::AgentGateway;
use crate::chat_service::ChatService;

#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ChatService>,
}

impl AppState {
    pub fn new(gateway: Arc<dyn AgentGateway>) -> Self {
        Self {
            chat_service: Arc::new(ChatService::new(gateway)),
        }
    }
}
