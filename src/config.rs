use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

const DEFAULT_CONFIG_PATH: &str = "config.json";
const DEFAULT_LOG_FILE: &str = "ollama-chat/logs/process_log.txt";
const DEFAULT_RUNNER: &str = "ollama";
const ERROR_LOG_FILE: &str = "error_log.txt";
const MEMORY_FILE: &str = "conversation_memory.json";
const DEFAULT_DIRECTORIES: [(&str, &str); 3] = [
    ("input_dir", "ollama-chat/input"),
    ("output_dir", "ollama-chat/output"),
    ("logs_dir", "ollama-chat/logs"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelBackend {
    Cli,
    Http,
}

impl ModelBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cli => "cli",
            Self::Http => "http",
        }
    }
}

/// How to reach the model backend. Built once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub base_url: String,
    pub api_key: Option<String>,
    pub models: Vec<String>,
}

impl ServiceDescriptor {
    /// First configured model. Validation guarantees the list is non-empty.
    pub fn default_model(&self) -> &str {
        self.models.first().map(String::as_str).unwrap_or_default()
    }

    pub fn has_model(&self, name: &str) -> bool {
        self.models.iter().any(|model| model == name)
    }

    pub fn bearer_token(&self) -> Option<String> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(|key| format!("Bearer {key}"))
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub service: ServiceDescriptor,
    pub backend: ModelBackend,
    pub runner: String,
    pub log_file: PathBuf,
    pub error_log_file: PathBuf,
    pub memory_file: PathBuf,
    pub directories: BTreeMap<String, PathBuf>,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(rename = "ollama-chat")]
    chat: ChatSection,
}

#[derive(Debug, Deserialize)]
struct ChatSection {
    #[serde(rename = "openAICompatible")]
    open_ai_compatible: OpenAiCompatibleSection,
    log_file: Option<String>,
    directories: Option<BTreeMap<String, String>>,
    backend: Option<String>,
    runner: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiCompatibleSection {
    #[serde(rename = "baseUrl")]
    base_url: String,
    #[serde(rename = "apiKey", default)]
    api_key: Option<String>,
    models: Vec<String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        Self::from_json_str(&raw)
            .with_context(|| format!("Invalid config file '{}'", path.display()))
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let file: ConfigFile =
            serde_json::from_str(raw).context("Failed to parse config JSON")?;
        let chat = file.chat;
        let section = chat.open_ai_compatible;

        if section.models.is_empty() {
            return Err(anyhow!(
                "'ollama-chat.openAICompatible.models' must list at least one model"
            ));
        }

        let service = ServiceDescriptor {
            base_url: section.base_url,
            api_key: section.api_key.filter(|key| !key.trim().is_empty()),
            models: section.models,
        };

        Ok(Self {
            service,
            backend: parse_backend(chat.backend.as_deref()),
            runner: non_empty_or(chat.runner, DEFAULT_RUNNER),
            log_file: PathBuf::from(non_empty_or(chat.log_file, DEFAULT_LOG_FILE)),
            error_log_file: PathBuf::from(ERROR_LOG_FILE),
            memory_file: PathBuf::from(MEMORY_FILE),
            directories: parse_directories(chat.directories),
        })
    }
}

pub fn config_path_from_env() -> PathBuf {
    config_path_with(|key| env::var(key).ok())
}

fn config_path_with(mut get_var: impl FnMut(&str) -> Option<String>) -> PathBuf {
    PathBuf::from(non_empty_or(
        get_var("OLLAMA_CHAT_CONFIG"),
        DEFAULT_CONFIG_PATH,
    ))
}

fn non_empty_or(raw: Option<String>, default: &str) -> String {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_backend(raw: Option<&str>) -> ModelBackend {
    match raw.unwrap_or("cli").trim().to_ascii_lowercase().as_str() {
        "cli" => ModelBackend::Cli,
        "http" => ModelBackend::Http,
        other => {
            warn!(backend = %other, "unknown model backend configured, using cli");
            ModelBackend::Cli
        }
    }
}

fn parse_directories(raw: Option<BTreeMap<String, String>>) -> BTreeMap<String, PathBuf> {
    match raw {
        Some(dirs) => dirs
            .into_iter()
            .map(|(name, path)| (name, PathBuf::from(path)))
            .collect(),
        None => DEFAULT_DIRECTORIES
            .iter()
            .map(|(name, path)| ((*name).to_string(), PathBuf::from(path)))
            .collect(),
    }
}
