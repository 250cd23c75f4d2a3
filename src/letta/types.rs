//! Request and response bodies of the Letta REST API, limited to the fields the relay reads.

use serde::{Deserialize, Serialize};

/// One message sent to an agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageCreate {
    pub role: String,
    pub content: String,
}

impl MessageCreate {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessagesRequest {
    pub messages: Vec<MessageCreate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LettaResponse {
    #[serde(default)]
    pub messages: Vec<LettaMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LettaMessage {
    pub message_type: String,
    #[serde(default)]
    pub content: Option<MessageContent>,
}

pub const ASSISTANT_MESSAGE: &str = "assistant_message";

impl LettaMessage {
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            message_type: ASSISTANT_MESSAGE.to_string(),
            content: Some(MessageContent::Text(text.into())),
        }
    }

    pub fn is_assistant(&self) -> bool {
        self.message_type == ASSISTANT_MESSAGE
    }

    pub fn text(&self) -> Option<String> {
        self.content.as_ref().map(MessageContent::to_text)
    }
}

/// Message content is either a bare string or a list of typed parts.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ContentPart {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl MessageContent {
    /// Concatenates text parts; non-text parts are skipped.
    pub fn to_text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter(|part| part.kind == "text")
                .filter_map(|part| part.text.as_deref())
                .collect(),
        }
    }
}

/// Parent/child restriction on consecutive tool calls, enforced by the agent platform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolRule {
    ConstrainChildTools {
        tool_name: String,
        children: Vec<String>,
    },
}

#[derive(Debug, Serialize)]
pub struct CreateAgentRequest {
    pub name: String,
    pub system: String,
    pub model: String,
    pub embedding: String,
    pub tool_ids: Vec<String>,
    pub tool_rules: Vec<ToolRule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentState {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct McpTool {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tool {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Listing shape of `GET /v1/tools/mcp/servers`, which differs across server versions.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum McpServerListing {
    ByName(serde_json::Map<String, serde_json::Value>),
    List(Vec<McpServerEntry>),
}

#[derive(Debug, Deserialize)]
pub(crate) struct McpServerEntry {
    #[serde(alias = "server_name")]
    pub name: String,
}

impl McpServerListing {
    pub(crate) fn into_names(self) -> Vec<String> {
        match self {
            McpServerListing::ByName(map) => map.into_iter().map(|(name, _)| name).collect(),
            McpServerListing::List(entries) => entries.into_iter().map(|e| e.name).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn response_tolerates_extra_fields_and_missing_content() {
        let body = json!({
            "messages": [
                {"message_type": "reasoning_message", "reasoning": "thinking", "id": "m-1"},
                {"message_type": "tool_call_message", "tool_call": {"name": "use_tool"}},
                {"message_type": "assistant_message", "content": "Hi there", "id": "m-3"}
            ],
            "usage": {"total_tokens": 42}
        });
        let response: LettaResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.messages.len(), 3);
        assert!(response.messages[0].content.is_none());
        assert!(response.messages[2].is_assistant());
        assert_eq!(response.messages[2].text().as_deref(), Some("Hi there"));
    }

    #[test]
    fn content_parts_join_text_only() {
        let message: LettaMessage = serde_json::from_value(json!({
            "message_type": "assistant_message",
            "content": [
                {"type": "text", "text": "Hello, "},
                {"type": "image", "source": {}},
                {"type": "text", "text": "world"}
            ]
        }))
        .unwrap();
        assert_eq!(message.text().as_deref(), Some("Hello, world"));
    }

    #[test]
    fn tool_rule_serializes_with_type_tag() {
        let rule = ToolRule::ConstrainChildTools {
            tool_name: "use_tool".to_string(),
            children: vec!["send_message".to_string()],
        };
        assert_eq!(
            serde_json::to_value(&rule).unwrap(),
            json!({
                "type": "constrain_child_tools",
                "tool_name": "use_tool",
                "children": ["send_message"]
            })
        );
    }

    #[test]
    fn server_listing_accepts_map_and_list() {
        let by_name: McpServerListing = serde_json::from_value(json!({
            "toolbox": {"server_type": "sse"},
            "github": {"server_type": "stdio"}
        }))
        .unwrap();
        let mut names = by_name.into_names();
        names.sort();
        assert_eq!(names, vec!["github", "toolbox"]);

        let list: McpServerListing =
            serde_json::from_value(json!([{"server_name": "toolbox"}])).unwrap();
        assert_eq!(list.into_names(), vec!["toolbox"]);
    }
}
