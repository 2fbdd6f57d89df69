use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::ModelConfig;

/// Longest page excerpt embedded in a prompt. Longer text is cut at a char
/// boundary with a trailing ellipsis.
const MAX_PAGE_TEXT_CHARS: usize = 10_000;

const MAX_TOKENS: u32 = 4000;
const TEMPERATURE: f32 = 0.1;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

const SYSTEM_PROMPT: &str = "You are a helpful assistant that extracts and categorizes rep firm \
line sheet information. Always answer with one line per product in the exact form \
Brand Carried|Product Covered|Space. Each individual product gets its own line, even when \
several products are mentioned together. Do not output a header, commentary, or any other text.";

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("model endpoint returned {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("model response contained no completion text")]
    EmptyCompletion,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Client for the Azure OpenAI chat deployment.
pub struct ModelClient {
    http: reqwest::Client,
    config: ModelConfig,
}

impl ModelClient {
    pub fn new(config: ModelConfig) -> Result<Self, ModelError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, config })
    }

    /// Send the page text through the chat deployment and return the raw
    /// reply. One call, no retries; any failure is fatal for the run.
    pub async fn categorize(
        &self,
        page_text: &str,
        rep_firm_name: &str,
    ) -> Result<String, ModelError> {
        let prompt = build_prompt(page_text, rep_firm_name);
        let request = ChatRequest {
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .http
            .post(self.config.completions_url())
            .header("api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Model endpoint returned {}: {}", status, body);
            return Err(ModelError::Api { status, body });
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(ModelError::EmptyCompletion)?;

        info!("Model returned {} characters", content.len());
        Ok(content)
    }
}

/// Fixed instruction template with the firm name and page excerpt embedded.
fn build_prompt(page_text: &str, rep_firm_name: &str) -> String {
    let excerpt = truncate_chars(page_text, MAX_PAGE_TEXT_CHARS);
    format!(
        "Extract the line sheet from this rep firm website as rows with three fields:\n\
         - Brand Carried: the official, properly capitalized brand/manufacturer name, never a \
         filename, abbreviation, or unclear string\n\
         - Product Covered: the exact products listed or mentioned on the page, as specific as \
         possible\n\
         - Space: broad water/wastewater treatment process steps, e.g. Flow Control, \
         Clarification, Disinfection, Aeration, Filtration, Chemical Feed. No model names or \
         chemicals; use 'Water Treatment' or 'Wastewater Treatment' only as a last resort\n\
         \n\
         Rep Firm Name: {rep_firm_name}\n\
         \n\
         Website content (select all and copy):\n\
         {excerpt}\n\
         \n\
         Output one line per product in the exact form Brand Carried|Product Covered|Space.\n\
         If a brand carries several products, emit one line per product.\n\
         Skip entries whose brand is not a proper, official, capitalized name.\n\
         No header line, no commentary, no markdown."
    )
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut)
}
