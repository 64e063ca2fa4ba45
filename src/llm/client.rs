use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::sse::{self, StreamEvent};

/// Client for an OpenAI-compatible chat completions endpoint.
///
/// Both upstreams (the extraction/analysis service and the web-augmented
/// answer service) speak the same wire shape, so one client parameterized by
/// base URL and credential covers both.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl ChatClient {
    pub fn new(api_key: &str, base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.to_string(),
            base_url: base_url.to_string(),
        }
    }

    fn build_request(
        model: &str,
        max_tokens: u32,
        system_prompt: Option<&str>,
        user_message: &str,
        stream: bool,
    ) -> ChatCompletionRequest {
        let mut messages = Vec::new();
        if let Some(system) = system_prompt {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: user_message.to_string(),
        });

        ChatCompletionRequest {
            model: model.to_string(),
            max_tokens,
            messages,
            stream: stream.then_some(true),
        }
    }

    /// Issue one completion request and return the full reply.
    pub async fn complete(
        &self,
        model: &str,
        max_tokens: u32,
        system_prompt: Option<&str>,
        user_message: &str,
    ) -> Result<LlmResponse> {
        let request = Self::build_request(model, max_tokens, system_prompt, user_message, false);

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", &self.api_key))
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to completion API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Completion API error ({}): {}", status, body);
        }

        let api_response: ChatCompletionResponse = response
            .json()
            .await
            .context("Failed to parse completion API response")?;

        let text = api_response
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .unwrap_or("")
            .to_string();

        let (input_tokens, output_tokens) = api_response
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or((0, 0));

        Ok(LlmResponse {
            text,
            input_tokens,
            output_tokens,
        })
    }

    /// Issue one streaming completion request, invoking `on_delta` for each
    /// incremental text fragment in arrival order.
    ///
    /// The response body is consumed chunk-by-chunk; records are re-split on
    /// newlines since a transport chunk can carry part of a line or several.
    /// Token usage is not reported on the streaming path.
    pub async fn complete_streaming(
        &self,
        model: &str,
        max_tokens: u32,
        system_prompt: Option<&str>,
        user_message: &str,
        mut on_delta: impl FnMut(&str),
    ) -> Result<()> {
        let request = Self::build_request(model, max_tokens, system_prompt, user_message, true);

        let mut response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", &self.api_key))
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send streaming request to completion API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Completion API error ({}): {}", status, body);
        }

        let mut buffer = String::new();
        let mut done = false;

        while !done {
            let Some(chunk) = response
                .chunk()
                .await
                .context("Failed to read streaming chunk")?
            else {
                break;
            };

            buffer.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(pos) = buffer.find('\n') {
                let line: String = buffer.drain(..=pos).collect();
                match sse::parse_line(line.trim_end_matches('\n')) {
                    StreamEvent::Delta(text) => on_delta(&text),
                    StreamEvent::Done => {
                        done = true;
                        break;
                    }
                    StreamEvent::Skip => {}
                }
            }
        }

        Ok(())
    }
}
