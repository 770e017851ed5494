use anyhow::{Context, Result};
use colored::Colorize;
use std::io::{BufRead, Write};
use tracing::debug;

use crate::config::ServiceDescriptor;
use crate::logging::OperationLog;
use crate::memory::MemoryStore;
use crate::model::ModelRequest;
use crate::model_gateway::ModelGateway;
use crate::scraper::{WebScraper, truncate_chars};

const PROMPT: &str = "👤: Enter a prompt (or type 'exit' to quit, '/model' to change model, '/memory' to view memory, '/scrape' to scrape a website): ";
const SCRAPE_PREVIEW_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exit,
    Model,
    Memory,
    Scrape,
    Query(String),
    Empty,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        match trimmed.to_lowercase().as_str() {
            "" => Self::Empty,
            "exit" => Self::Exit,
            "/model" => Self::Model,
            "/memory" => Self::Memory,
            "/scrape" => Self::Scrape,
            _ => Self::Query(trimmed.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

pub struct Repl<'a, G, S> {
    service: &'a ServiceDescriptor,
    gateway: &'a G,
    scraper: &'a S,
    oplog: &'a OperationLog,
    store: MemoryStore,
    selected_model: String,
}

impl<'a, G, S> Repl<'a, G, S>
where
    G: ModelGateway,
    S: WebScraper,
{
    pub fn new(
        service: &'a ServiceDescriptor,
        gateway: &'a G,
        scraper: &'a S,
        oplog: &'a OperationLog,
        store: MemoryStore,
    ) -> Self {
        Self {
            service,
            gateway,
            scraper,
            oplog,
            store,
            selected_model: service.default_model().to_string(),
        }
    }

    pub fn selected_model(&self) -> &str {
        &self.selected_model
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Runs until `exit` or end of input.
    pub async fn run(&mut self, input: &mut impl BufRead, out: &mut impl Write) -> Result<()> {
        loop {
            let Some(line) = read_line(input, out, &PROMPT.yellow().to_string())? else {
                debug!("input closed, leaving chat loop");
                return Ok(());
            };

            if self.dispatch(Command::parse(&line), input, out).await? == Flow::Exit {
                return Ok(());
            }
        }
    }

    async fn dispatch(
        &mut self,
        command: Command,
        input: &mut impl BufRead,
        out: &mut impl Write,
    ) -> Result<Flow> {
        match command {
            Command::Exit => {
                writeln!(out, "{}", "Goodbye! 👋".red())?;
                return Ok(Flow::Exit);
            }
            Command::Empty => {}
            Command::Model => self.choose_model(input, out)?,
            Command::Memory => {
                let json = self.store.display_json()?;
                writeln!(out, "{}", format!("Memory: {json}").cyan())?;
            }
            Command::Scrape => self.scrape(input, out).await?,
            Command::Query(prompt) => self.query(&prompt, out).await?,
        }
        Ok(Flow::Continue)
    }

    fn choose_model(&mut self, input: &mut impl BufRead, out: &mut impl Write) -> Result<()> {
        writeln!(out, "Available models: {}", self.service.models.join(", "))?;
        let Some(choice) = read_line(input, out, "Choose a model from the available options: ")?
        else {
            return Ok(());
        };
        let choice = choice.trim();

        if !self.service.has_model(choice) {
            writeln!(
                out,
                "Model '{choice}' is not available. Please select a valid model."
            )?;
            return Ok(());
        }

        self.selected_model = choice.to_string();
        writeln!(out, "{}", format!("Using model: {choice}").green())?;
        debug!(model = %choice, "selected model changed");
        Ok(())
    }

    async fn scrape(&mut self, input: &mut impl BufRead, out: &mut impl Write) -> Result<()> {
        let prompt = "Enter the URL to scrape: ".cyan().to_string();
        let Some(url) = read_line(input, out, &prompt)? else {
            return Ok(());
        };
        let url = url.trim();

        let content = match self.scraper.scrape(url).await {
            Ok(content) => content,
            Err(err) => {
                let message = format!("Error scraping website: {err:#}");
                self.oplog.error(&message);
                writeln!(out, "{}", message.red())?;
                return Ok(());
            }
        };
        if content.is_empty() {
            return Ok(());
        }

        let preview = truncate_chars(&content, SCRAPE_PREVIEW_CHARS);
        writeln!(out, "{}", format!("Scraped content: {preview}...").green())?;
        self.store.record_scrape(content);
        if let Err(err) = self.store.save() {
            let message = format!("Error saving memory: {err:#}");
            self.oplog.error(&message);
            writeln!(out, "{}", message.red())?;
        }
        Ok(())
    }

    async fn query(&mut self, prompt: &str, out: &mut impl Write) -> Result<()> {
        match self.store.memory().last_prompt.as_deref() {
            Some(last) if !last.is_empty() => {
                writeln!(out, "{}", format!("👤 Last prompt: {last}").magenta())?
            }
            _ => writeln!(out, "{}", "No previous memory available.".red())?,
        }

        let model = self.selected_model.clone();
        let outcome = match self
            .gateway
            .query(ModelRequest::new(model.as_str(), prompt))
            .await
        {
            Ok(response) => {
                writeln!(
                    out,
                    "{}",
                    format!("🤖 {model} says: {}", response.content).green()
                )?;
                self.store.record_exchange(prompt, response.content.as_str());
                self.oplog
                    .record(&format!("Model: {model}, Response: {}", response.content));
                self.store.save()
            }
            Err(err) => Err(err),
        };

        if let Err(err) = outcome {
            let message = format!("Error querying {model}: {err:#}");
            writeln!(out, "{message}")?;
            self.oplog.error(&message);
        }
        Ok(())
    }
}

fn read_line(input: &mut impl BufRead, out: &mut impl Write, prompt: &str) -> Result<Option<String>> {
    write!(out, "{prompt}")?;
    out.flush().context("Failed to flush stdout")?;

    let mut line = String::new();
    let read = input.read_line(&mut line).context("Failed to read stdin")?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}
