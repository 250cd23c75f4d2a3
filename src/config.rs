use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::letta::types::ToolRule;

/// Runtime settings resolved from the environment.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub letta_base_url: String,
    #[serde(default)]
    pub letta_token: Option<String>,
    pub letta_timeout_secs: u64,
    pub letta_connect_retries: u32,
    pub letta_retry_delay_ms: u64,
    pub server_host: String,
    pub server_port: u16,
    #[serde(rename = "cors_origins")]
    pub cors_origins_raw: String,
    #[serde(default)]
    pub agent_config_path: Option<String>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_source(config::Environment::default().ignore_empty(true))
    }

    fn from_source(env: config::Environment) -> Result<Self> {
        let settings: Settings = config::Config::builder()
            .set_default("letta_base_url", "http://localhost:8283")?
            .set_default("letta_timeout_secs", 60)?
            .set_default("letta_connect_retries", 5)?
            .set_default("letta_retry_delay_ms", 1000)?
            .set_default("server_host", "0.0.0.0")?
            .set_default("server_port", 8000)?
            .set_default("cors_origins", "*")?
            .add_source(env)
            .build()
            .context("failed to build settings")?
            .try_deserialize()
            .context("failed to deserialize settings")?;
        Ok(settings)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn letta_timeout(&self) -> Duration {
        Duration::from_secs(self.letta_timeout_secs)
    }

    pub fn letta_retry_delay(&self) -> Duration {
        Duration::from_millis(self.letta_retry_delay_ms)
    }

    /// Allowed CORS origins. `["*"]` means any origin.
    pub fn cors_origins(&self) -> Vec<String> {
        parse_cors_origins(&self.cors_origins_raw)
    }
}

pub fn parse_cors_origins(raw: &str) -> Vec<String> {
    if raw.trim() == "*" {
        return vec!["*".to_string()];
    }
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

/// How the remote agent is created at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentProfile {
    #[serde(default = "default_agent_name")]
    pub name: String,

    #[serde(default = "default_system_prompt")]
    pub system: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_embedding")]
    pub embedding: String,

    /// MCP server whose tools get registered on the agent.
    #[serde(default = "default_tool_source")]
    pub tool_source: String,

    #[serde(default = "default_tool_rules")]
    pub tool_rules: Vec<ToolRule>,
}

fn default_agent_name() -> String {
    "universal_mcp_assistant".to_string()
}

fn default_system_prompt() -> String {
    "Temporary System Prompt".to_string()
}

fn default_model() -> String {
    "openai/gpt-4o".to_string()
}

fn default_embedding() -> String {
    "openai/text-embedding-3-small".to_string()
}

fn default_tool_source() -> String {
    "toolbox".to_string()
}

fn default_tool_rules() -> Vec<ToolRule> {
    vec![ToolRule::ConstrainChildTools {
        tool_name: "use_tool".to_string(),
        children: vec!["send_message".to_string()],
    }]
}

impl Default for AgentProfile {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            system: default_system_prompt(),
            model: default_model(),
            embedding: default_embedding(),
            tool_source: default_tool_source(),
            tool_rules: default_tool_rules(),
        }
    }
}

impl AgentProfile {
    /// Loads the profile from `path`, or the built-in defaults when no path is given.
    ///
    /// A sibling `<stem>.local.<ext>` file, when present, is read instead of `path`.
    pub fn resolve(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => {
                let local = local_override(Path::new(path));
                match local {
                    Some(local) if local.exists() => {
                        info!("Using local agent profile {}", local.display());
                        Self::load(&local.to_string_lossy())
                    }
                    _ => Self::load(path),
                }
            }
            None => Ok(Self::default()),
        }
    }

    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            anyhow::bail!("Agent profile not found: {}", path);
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read agent profile {}", path))?;
        let content = substitute_env_vars(&content);

        let path_lower = path.to_lowercase();
        let profile = if path_lower.ends_with(".json") || path_lower.ends_with(".jsonld") {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        Ok(profile)
    }
}

/// `agent.yaml` -> `agent.local.yaml`; `None` for paths without a file stem.
fn local_override(path: &Path) -> Option<PathBuf> {
    let stem = path.file_stem()?.to_str()?;
    let name = match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => format!("{}.local.{}", stem, ext),
        None => format!("{}.local", stem),
    };
    Some(path.with_file_name(name))
}

/// Replaces `${VAR_NAME}` with the variable's value; unknown variables stay as written.
fn substitute_env_vars(content: &str) -> String {
    let pattern = Regex::new(r"\$\{(\w+)\}").expect("static regex");
    pattern
        .replace_all(content, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn settings_from(vars: &[(&str, &str)]) -> Settings {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let env = config::Environment::default()
            .ignore_empty(true)
            .source(Some(map));
        Settings::from_source(env).unwrap()
    }

    #[test]
    fn defaults_apply_without_environment() {
        let settings = settings_from(&[]);
        assert_eq!(settings.letta_base_url, "http://localhost:8283");
        assert_eq!(settings.bind_address(), "0.0.0.0:8000");
        assert_eq!(settings.cors_origins(), vec!["*"]);
        assert_eq!(settings.letta_timeout(), Duration::from_secs(60));
        assert!(settings.letta_token.is_none());
        assert!(settings.agent_config_path.is_none());
    }

    #[test]
    fn environment_overrides_defaults() {
        let settings = settings_from(&[
            ("LETTA_BASE_URL", "http://letta.internal:9000"),
            ("SERVER_HOST", "127.0.0.1"),
            ("SERVER_PORT", "9100"),
            ("CORS_ORIGINS", "http://a.test, http://b.test"),
            ("LETTA_CONNECT_RETRIES", "2"),
        ]);
        assert_eq!(settings.letta_base_url, "http://letta.internal:9000");
        assert_eq!(settings.bind_address(), "127.0.0.1:9100");
        assert_eq!(settings.letta_connect_retries, 2);
        assert_eq!(
            settings.cors_origins(),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }

    #[test]
    fn cors_origins_drop_blank_entries() {
        assert_eq!(parse_cors_origins("*"), vec!["*"]);
        assert_eq!(parse_cors_origins(" * "), vec!["*"]);
        assert_eq!(parse_cors_origins("http://x.test,,"), vec!["http://x.test"]);
    }

    #[test]
    fn default_profile_constrains_use_tool() {
        let profile = AgentProfile::resolve(None).unwrap();
        assert_eq!(profile.name, "universal_mcp_assistant");
        assert_eq!(profile.model, "openai/gpt-4o");
        assert_eq!(profile.embedding, "openai/text-embedding-3-small");
        assert_eq!(profile.tool_source, "toolbox");
        assert_eq!(
            profile.tool_rules,
            vec![ToolRule::ConstrainChildTools {
                tool_name: "use_tool".to_string(),
                children: vec!["send_message".to_string()],
            }]
        );
    }

    #[test]
    fn yaml_profile_fills_missing_fields_and_substitutes_env() {
        std::env::set_var("LETTA_RELAY_TEST_PROMPT", "Be brief.");
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "system: \"${{LETTA_RELAY_TEST_PROMPT}} ${{LETTA_RELAY_UNSET_VAR}}\"").unwrap();
        writeln!(file, "model: anthropic/claude").unwrap();

        let profile = AgentProfile::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(profile.system, "Be brief. ${LETTA_RELAY_UNSET_VAR}");
        assert_eq!(profile.model, "anthropic/claude");
        assert_eq!(profile.tool_source, "toolbox");
    }

    #[test]
    fn json_profile_is_parsed_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"name": "support_bot", "tool_source": "github", "tool_rules": []}}"#
        )
        .unwrap();

        let profile = AgentProfile::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(profile.name, "support_bot");
        assert_eq!(profile.tool_source, "github");
        assert!(profile.tool_rules.is_empty());
    }

    #[test]
    fn token_is_kept_verbatim() {
        for token in ["000123", "1e3", "true", "sk-abc"] {
            let settings = settings_from(&[("LETTA_TOKEN", token)]);
            assert_eq!(settings.letta_token.as_deref(), Some(token));
        }
    }

    #[test]
    fn empty_token_is_unset() {
        let settings = settings_from(&[("LETTA_TOKEN", "")]);
        assert!(settings.letta_token.is_none());
    }

    #[test]
    fn local_profile_overrides_checked_in_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.yaml");
        std::fs::write(&path, "name: shared_agent\n").unwrap();

        let profile = AgentProfile::resolve(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(profile.name, "shared_agent");

        std::fs::write(dir.path().join("agent.local.yaml"), "name: local_agent\n").unwrap();
        let profile = AgentProfile::resolve(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(profile.name, "local_agent");
    }

    #[test]
    fn local_override_name_keeps_extension() {
        assert_eq!(
            local_override(Path::new("/etc/relay/agent.json")),
            Some(PathBuf::from("/etc/relay/agent.local.json"))
        );
        assert_eq!(
            local_override(Path::new("agent")),
            Some(PathBuf::from("agent.local"))
        );
    }

    #[test]
    fn missing_profile_is_an_error() {
        let err = AgentProfile::load("/nonexistent/agent.yaml").unwrap_err();
        assert!(err.to_string().contains("Agent profile not found"));
    }
}
