use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::types::{
    AgentState, CreateAgentRequest, LettaResponse, McpServerListing, McpTool, MessagesRequest,
    Tool,
};

#[derive(Debug, Error)]
pub enum LettaError {
    #[error("invalid Letta base URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request to Letta failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Letta returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// HTTP client for the Letta REST API.
#[derive(Debug, Clone)]
pub struct LettaClient {
    client: Client,
    base_url: Url,
}

impl LettaClient {
    pub fn new(base_url: &str, token: Option<&str>, timeout: Duration) -> Result<Self, LettaError> {
        let invalid = |reason: String| LettaError::InvalidUrl {
            url: base_url.to_string(),
            reason,
        };
        let base_url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(invalid("not a base URL".to_string()));
        }

        let mut headers = HeaderMap::new();
        if let Some(token) = token.filter(|token| !token.is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| invalid(format!("bad token: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `/v1/<segments...>`, each segment percent-encoded. A trailing empty
    /// segment yields a trailing slash.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("v1").extend(segments);
        }
        url
    }

    pub async fn health(&self) -> Result<(), LettaError> {
        let response = self.client.get(self.endpoint(&["health", ""])).send().await?;
        check_status(response).await.map(|_| ())
    }

    pub async fn list_mcp_servers(&self) -> Result<Vec<String>, LettaError> {
        let url = self.endpoint(&["tools", "mcp", "servers"]);
        let listing: McpServerListing = self.get_json(url).await?;
        Ok(listing.into_names())
    }

    pub async fn list_mcp_tools_by_server(&self, server: &str) -> Result<Vec<McpTool>, LettaError> {
        let url = self.endpoint(&["tools", "mcp", "servers", server, "tools"]);
        self.get_json(url).await
    }

    pub async fn add_mcp_tool(&self, server: &str, tool: &str) -> Result<Tool, LettaError> {
        let url = self.endpoint(&["tools", "mcp", "servers", server, tool]);
        let response = self.client.post(url).send().await?;
        decode(response).await
    }

    pub async fn create_agent(&self, request: &CreateAgentRequest) -> Result<AgentState, LettaError> {
        self.post_json(self.endpoint(&["agents", ""]), request).await
    }

    pub async fn create_message(
        &self,
        agent_id: &str,
        request: &MessagesRequest,
    ) -> Result<LettaResponse, LettaError> {
        let url = self.endpoint(&["agents", agent_id, "messages"]);
        self.post_json(url, request).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, LettaError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        decode(response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, LettaError> {
        debug!("POST {}", url);
        let response = self.client.post(url).json(body).send().await?;
        decode(response).await
    }
}

async fn check_status(response: Response) -> Result<Response, LettaError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(LettaError::Status { status, body })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, LettaError> {
    let response = check_status(response).await?;
    Ok(response.json().await?)
}
