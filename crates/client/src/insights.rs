//! OpenAI-compatible chat-completions insight provider.
//!
//! The model is asked for a single JSON object matching [`RawInsights`]
//! (`response_format: json_object`). Fields the model omits stay `None`.

use std::fmt::Write as _;
use std::time::Duration;

use reqwest::header;
use serde::{Deserialize, Serialize};
use swingset_core::model::RawInsights;
use swingset_core::providers::InsightQuery;
use swingset_core::{AppConfig, InsightProvider, ProviderError};

use crate::ClientError;
use crate::error::check_status;

const API_KEY_VAR: &str = "SWINGSET_AI_API_KEY";

const SYSTEM_PROMPT: &str = "You research public playgrounds. Answer with one JSON object and nothing else. \
Keys: name (string), description (2-4 sentences about the playground itself), features (array of short strings), \
parking (string), sources (array of URLs you relied on, official park or city pages preferred), \
accessibility (string), images (array of image URLs), \
locationConfidence (\"high\", \"medium\" or \"low\": how sure you are the content describes this exact place), \
locationVerification (one sentence on how the location was confirmed). \
Use null for anything you cannot verify. Never describe a different park with the same name.";

#[derive(Debug, Clone)]
pub struct InsightConfig {
    pub api_key: String,
    /// Base URL (default: https://api.openai.com/v1).
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl InsightConfig {
    pub fn from_config(config: &AppConfig) -> Result<Self, ClientError> {
        let api_key = config.require_ai_api_key().map_err(|_| ClientError::MissingApiKey(API_KEY_VAR))?.to_string();

        Ok(Self {
            api_key,
            base_url: config.ai_base_url.clone(),
            model: config.ai_model.clone(),
            timeout: config.provider_timeout(),
            user_agent: config.user_agent.clone(),
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    response_format: ResponseFormat,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    /// Parse the first choice's content as insights.
    pub fn into_insights(self) -> Result<RawInsights, ClientError> {
        let content = self
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ClientError::Parse("response has no message content".to_string()))?;

        serde_json::from_str(strip_code_fence(&content)).map_err(|e| ClientError::Parse(e.to_string()))
    }
}

/// Some models wrap JSON in a markdown fence even in JSON mode.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Build the user prompt for one entity.
pub fn user_prompt(query: &InsightQuery) -> String {
    let mut prompt = String::from("Describe this playground.\n");

    if let Some(name) = &query.name {
        let _ = writeln!(prompt, "Name: {name}");
    }
    if let Some(coordinates) = &query.coordinates {
        let _ = writeln!(prompt, "Coordinates: {:.5}, {:.5}", coordinates.lat, coordinates.lon);
    }
    if let Some(place) = &query.place {
        let parts: Vec<&str> =
            [&place.city, &place.region, &place.country].into_iter().filter_map(|p| p.as_deref()).collect();
        if !parts.is_empty() {
            let _ = writeln!(prompt, "Location: {}", parts.join(", "));
        }
    }
    if query.name.is_none() && query.coordinates.is_none() {
        let _ = writeln!(prompt, "Identifier: {}", query.entity_id);
    }

    prompt
}

/// Insight provider over an OpenAI-compatible chat-completions API.
#[derive(Debug, Clone)]
pub struct ChatInsightClient {
    http: reqwest::Client,
    config: InsightConfig,
}

impl ChatInsightClient {
    pub fn new(config: InsightConfig) -> Result<Self, ClientError> {
        if config.api_key.is_empty() {
            return Err(ClientError::MissingApiKey(API_KEY_VAR));
        }

        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ClientError> {
        Self::new(InsightConfig::from_config(config)?)
    }

    pub async fn complete(&self, query: &InsightQuery) -> Result<RawInsights, ClientError> {
        let prompt = user_prompt(query);
        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: &prompt },
            ],
            response_format: ResponseFormat { kind: "json_object" },
            temperature: 0.2,
        };

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        tracing::debug!(entity_id = %query.entity_id, model = %self.config.model, "requesting insights");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .header(header::USER_AGENT, &self.config.user_agent)
            .json(&body)
            .send()
            .await?;

        check_status(response.status())?;

        let parsed: ChatResponse = response.json().await.map_err(|e| ClientError::Parse(e.to_string()))?;
        parsed.into_insights()
    }
}

#[async_trait::async_trait]
impl InsightProvider for ChatInsightClient {
    async fn fetch_insights(&self, query: &InsightQuery) -> Result<RawInsights, ProviderError> {
        Ok(self.complete(query).await?)
    }
}
