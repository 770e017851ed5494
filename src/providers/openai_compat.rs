use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ServiceDescriptor;
use crate::providers::http_errors::http_request_error;
use crate::providers::ollama_cli::extract_answer;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    stream: bool,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

pub async fn chat(
    client: &Client,
    service: &ServiceDescriptor,
    model: &str,
    prompt: &str,
) -> Result<String> {
    let api_url = completions_url(&service.base_url);
    let body = ChatCompletionRequest {
        model,
        stream: false,
        messages: vec![ChatMessage {
            role: "user",
            content: prompt,
        }],
    };
    debug!(api_url = %api_url, model = %model, "sending chat completion request");

    let mut request = client.post(&api_url).json(&body);
    if let Some(token) = service.bearer_token() {
        request = request.header(AUTHORIZATION, token);
    }

    let response = request.send().await.map_err(|err| {
        warn!(api_url = %api_url, model = %model, error = %err, "chat completion request failed");
        http_request_error(err, &api_url, "model API")
    })?;

    if !response.status().is_success() {
        let status = response.status();
        let response_body = response
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read response body>".to_string());
        warn!(
            api_url = %api_url,
            model = %model,
            status = %status,
            response_body_len = response_body.len(),
            "model API returned non-success status"
        );
        return Err(anyhow!(
            "Model request failed with status {}: {}",
            status,
            response_body
        ));
    }

    let parsed: ChatCompletionResponse = response
        .json()
        .await
        .context("Failed to parse chat completion response")?;
    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| anyhow!("Chat completion response contained no message"))?;
    Ok(extract_answer(&content))
}
