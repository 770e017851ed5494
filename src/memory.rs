use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The most recent exchange, plus whatever page text was scraped last.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMemory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraped_content: Option<String>,
}

/// In-memory conversation record mirrored to a JSON file.
///
/// The store always starts empty; an existing file is overwritten on the first
/// save rather than loaded.
#[derive(Debug)]
pub struct MemoryStore {
    path: PathBuf,
    memory: ConversationMemory,
}

impl MemoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            memory: ConversationMemory::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn record_exchange(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        self.memory.last_prompt = Some(prompt.into());
        self.memory.last_response = Some(response.into());
    }

    pub fn record_scrape(&mut self, content: impl Into<String>) {
        self.memory.scraped_content = Some(content.into());
    }

    pub fn save(&self) -> Result<()> {
        let mut buf = Vec::new();
        let mut ser =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        self.memory
            .serialize(&mut ser)
            .context("Failed to serialize conversation memory")?;
        fs::write(&self.path, &buf).with_context(|| {
            format!("Failed to write memory file '{}'", self.path.display())
        })?;
        debug!(path = %self.path.display(), bytes = buf.len(), "saved conversation memory");
        Ok(())
    }

    pub fn display_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.memory).context("Failed to render conversation memory")
    }
}
