use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::chatbot::engine::{default_quote_plans, EngineSettings, QuotePlan};
use crate::chatbot::quoting::QuotingEndpoints;

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    ReadFile { path: PathBuf, source: std::io::Error },
    /// Failed to parse JSON.
    ParseJson { path: PathBuf, source: serde_json::Error },
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "failed to read config file '{}': {}", path.display(), source)
            }
            Self::ParseJson { path, source } => {
                write!(f, "failed to parse config file '{}': {}", path.display(), source)
            }
            Self::Validation(msg) => write!(f, "config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::ParseJson { source, .. } => Some(source),
            Self::Validation(_) => None,
        }
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    telegram_bot_token: String,
    /// Directory for state files (logs, profiles). Defaults to current directory.
    data_dir: Option<String>,
    #[serde(default = "default_bot_name")]
    bot_name: String,
    #[serde(default = "default_company_name")]
    company_name: String,
    #[serde(default = "default_developer_bot_name")]
    developer_bot_name: String,
    /// Inputs that open the assistant from any step
    #[serde(default = "default_assistant_keywords")]
    assistant_keywords: Vec<String>,
    #[serde(default = "default_model")]
    default_model: String,
    #[serde(default = "default_max_segment_length")]
    max_segment_length: usize,
    #[serde(default = "default_short_pause_ms")]
    short_pause_ms: u64,
    #[serde(default = "default_document_pause_ms")]
    document_pause_ms: u64,
    #[serde(default = "default_quote_plans")]
    quote_plans: Vec<QuotePlan>,
    #[serde(default = "default_http_timeout_secs")]
    http_timeout_secs: u64,
    quote_url: String,
    beneficiary_url: String,
    assign_url: String,
    /// Rendering trigger, with `{id}` for the quotation id
    render_url: String,
    /// Rendered document location, with `{id}` for the quotation id
    document_url: String,
    /// File-listing service of the document repository
    documents_list_url: String,
    /// URL prefix the listed paths are relative to
    document_root: String,
    #[serde(default = "default_document_extensions")]
    document_extensions: Vec<String>,
    #[serde(default = "default_insurers")]
    insurers: Vec<String>,
    advisor_url: String,
    gandalf_url: String,
    /// Profile key of the record holding the assistant's instructions
    #[serde(default = "default_operator_key")]
    operator_key: String,
}

fn default_bot_name() -> String {
    EngineSettings::default().bot_name
}

fn default_company_name() -> String {
    EngineSettings::default().company_name
}

fn default_developer_bot_name() -> String {
    EngineSettings::default().developer_bot_name
}

fn default_assistant_keywords() -> Vec<String> {
    EngineSettings::default().assistant_keywords
}

fn default_model() -> String {
    EngineSettings::default().default_model
}

fn default_max_segment_length() -> usize {
    1000
}

fn default_short_pause_ms() -> u64 {
    1000
}

fn default_document_pause_ms() -> u64 {
    15000
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_document_extensions() -> Vec<String> {
    vec!["pdf".to_string()]
}

fn default_insurers() -> Vec<String> {
    EngineSettings::default().insurers
}

fn default_operator_key() -> String {
    EngineSettings::default().operator_key
}

pub struct Config {
    /// Path to the config file
    pub config_path: PathBuf,
    pub telegram_bot_token: String,
    /// Directory for state files (logs, profiles).
    pub data_dir: PathBuf,
    pub http_timeout: Duration,
    pub quoting: QuotingEndpoints,
    pub documents_list_url: String,
    pub advisor_url: String,
    pub gandalf_url: String,
    settings: EngineSettings,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config_path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| ConfigError::ReadFile { path: config_path.clone(), source: e })?;
        let file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseJson { path: config_path.clone(), source: e })?;

        if file.telegram_bot_token.is_empty() {
            return Err(ConfigError::Validation("telegram_bot_token is required".into()));
        }
        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        let token_parts: Vec<&str> = file.telegram_bot_token.split(':').collect();
        if token_parts.len() != 2 || token_parts[0].parse::<u64>().is_err() || token_parts[1].is_empty() {
            return Err(ConfigError::Validation(
                "telegram_bot_token appears invalid (expected format: 123456789:ABCdefGHI...)".into()
            ));
        }

        let endpoints = [
            ("quote_url", &file.quote_url),
            ("beneficiary_url", &file.beneficiary_url),
            ("assign_url", &file.assign_url),
            ("render_url", &file.render_url),
            ("document_url", &file.document_url),
            ("documents_list_url", &file.documents_list_url),
            ("advisor_url", &file.advisor_url),
            ("gandalf_url", &file.gandalf_url),
        ];
        for (name, url) in endpoints {
            if url.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{name} is required")));
            }
        }
        for (name, url) in [("render_url", &file.render_url), ("document_url", &file.document_url)] {
            if !url.contains("{id}") {
                return Err(ConfigError::Validation(format!("{name} must contain {{id}}")));
            }
        }
        if file.max_segment_length == 0 {
            return Err(ConfigError::Validation("max_segment_length must be at least 1".into()));
        }
        if file.quote_plans.is_empty() {
            return Err(ConfigError::Validation("quote_plans must contain at least one plan".into()));
        }

        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let settings = EngineSettings {
            bot_name: file.bot_name,
            company_name: file.company_name,
            developer_bot_name: file.developer_bot_name,
            bot_user_id: None,
            assistant_keywords: file
                .assistant_keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            default_model: file.default_model,
            max_segment_length: file.max_segment_length,
            short_pause: Duration::from_millis(file.short_pause_ms),
            document_pause: Duration::from_millis(file.document_pause_ms),
            quote_plans: file.quote_plans,
            document_root: file.document_root,
            document_extensions: file
                .document_extensions
                .iter()
                .map(|e| e.trim().trim_start_matches('.').to_lowercase())
                .collect(),
            insurers: file.insurers,
            operator_key: file.operator_key,
        };

        Ok(Self {
            config_path,
            telegram_bot_token: file.telegram_bot_token,
            data_dir,
            http_timeout: Duration::from_secs(file.http_timeout_secs),
            quoting: QuotingEndpoints {
                quote_url: file.quote_url,
                beneficiary_url: file.beneficiary_url,
                assign_url: file.assign_url,
                render_url: file.render_url,
                document_url: file.document_url,
            },
            documents_list_url: file.documents_list_url,
            advisor_url: file.advisor_url,
            gandalf_url: file.gandalf_url,
            settings,
        })
    }

    /// Engine tunables, tagged with the bot's own user id once known.
    pub fn engine_settings(&self, bot_user_id: Option<String>) -> EngineSettings {
        EngineSettings {
            bot_user_id,
            ..self.settings.clone()
        }
    }

    pub fn profiles_path(&self) -> PathBuf {
        self.data_dir.join("profiles.db")
    }
}
