use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error, info, instrument, trace};

use crate::backend::{
    ContentRequest, GenerateResult, GenerativeModel, TokenUsage, check_response_status,
    handle_http_error,
};
use crate::error::{AnalysisError, LensError, Result};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini models known to handle inline images with a response schema.
///
/// Any other model name can be used via `Custom` or `FromStr`:
///
/// ```rust
/// use ayushlens::GeminiModel;
/// use std::str::FromStr;
///
/// let model = GeminiModel::from_str("gemini-custom").unwrap();
/// assert_eq!(model, GeminiModel::Custom("gemini-custom".to_string()));
/// assert_eq!(GeminiModel::from_string("gemini-2.5-flash"), GeminiModel::Gemini25Flash);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Model {
    /// Gemini 3 Pro Preview
    Gemini3ProPreview,
    /// Gemini 3 Flash Preview (default)
    Gemini3FlashPreview,
    /// Gemini 2.5 Pro
    Gemini25Pro,
    /// Gemini 2.5 Flash
    Gemini25Flash,
    /// Gemini 2.5 Flash Lite
    Gemini25FlashLite,
    /// Gemini 2.0 Flash
    Gemini20Flash,
    /// Custom model name (for new models or Gemini-compatible endpoints)
    Custom(String),
}

impl Model {
    pub fn as_str(&self) -> &str {
        match self {
            Model::Gemini3ProPreview => "gemini-3-pro-preview",
            Model::Gemini3FlashPreview => "gemini-3-flash-preview",
            Model::Gemini25Pro => "gemini-2.5-pro",
            Model::Gemini25Flash => "gemini-2.5-flash",
            Model::Gemini25FlashLite => "gemini-2.5-flash-lite",
            Model::Gemini20Flash => "gemini-2.0-flash",
            Model::Custom(name) => name,
        }
    }

    /// Create a model from a string. Unknown names become `Custom(name)`.
    pub fn from_string(name: impl Into<String>) -> Self {
        let name = name.into();
        match name.as_str() {
            "gemini-3-pro-preview" => Model::Gemini3ProPreview,
            "gemini-3-flash-preview" => Model::Gemini3FlashPreview,
            "gemini-2.5-pro" => Model::Gemini25Pro,
            "gemini-2.5-flash" => Model::Gemini25Flash,
            "gemini-2.5-flash-lite" => Model::Gemini25FlashLite,
            "gemini-2.0-flash" => Model::Gemini20Flash,
            _ => Model::Custom(name),
        }
    }
}

impl Default for Model {
    fn default() -> Self {
        Model::Gemini3FlashPreview
    }
}

impl FromStr for Model {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Model::from_string(s))
    }
}

impl From<&str> for Model {
    fn from(s: &str) -> Self {
        Model::from_string(s)
    }
}

/// Configuration for the Gemini client
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: Model,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub timeout: Option<Duration>,
    /// Custom base URL for Gemini-compatible APIs
    /// Defaults to "https://generativelanguage.googleapis.com/v1beta" if not set
    pub base_url: Option<String>,
}

/// Gemini client for structured generation
pub struct GeminiClient {
    config: GeminiConfig,
    client: reqwest::Client,
}

// Gemini API request and response structures
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: SystemInstruction,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    response_mime_type: &'static str,
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

impl GeminiClient {
    /// Create a new Gemini client with the provided API key.
    ///
    /// ```no_run
    /// # use ayushlens::GeminiClient;
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = GeminiClient::new("your-gemini-api-key")?;
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(name = "gemini_client_new", skip(api_key))]
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LensError::Config(
                "API key cannot be empty. Use GeminiClient::from_env() to read from GEMINI_API_KEY environment variable.".to_string(),
            ));
        }

        let config = GeminiConfig {
            api_key,
            model: Model::default(),
            temperature: 0.0,
            max_tokens: None,
            timeout: None,
            base_url: None,
        };

        info!(model = %config.model.as_str(), "Created Gemini client");

        Ok(Self {
            config,
            client: reqwest::Client::new(),
        })
    }

    /// Create a new Gemini client by reading the API key from `GEMINI_API_KEY`.
    #[instrument(name = "gemini_client_from_env")]
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| {
            LensError::Config("GEMINI_API_KEY environment variable is not set".to_string())
        })?;
        Self::new(api_key)
    }

    /// Set the model to use
    #[instrument(skip(self))]
    pub fn model(mut self, model: Model) -> Self {
        debug!(
            previous_model = ?self.config.model,
            new_model = ?model,
            "Setting Gemini model"
        );
        self.config.model = model;
        self
    }

    /// Set the temperature (0.0 to 1.0, lower = more deterministic)
    #[instrument(skip(self))]
    pub fn temperature(mut self, temp: f32) -> Self {
        debug!(
            previous_temp = self.config.temperature,
            new_temp = temp,
            "Setting temperature"
        );
        self.config.temperature = temp;
        self
    }

    /// Set the maximum tokens to generate
    #[instrument(skip(self))]
    pub fn max_tokens(mut self, max: u32) -> Self {
        // at least 1, the API rejects zero
        self.config.max_tokens = Some(max.max(1));
        self
    }

    /// Set the timeout for HTTP requests.
    ///
    /// The timeout covers connection and the entire request. Expiry is reported
    /// as [`AnalysisError::Timeout`].
    #[instrument(skip(self))]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        debug!(
            previous_timeout = ?self.config.timeout,
            new_timeout = ?timeout,
            "Setting timeout"
        );
        self.config.timeout = Some(timeout);

        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(
                    error = %e,
                    "Failed to build reqwest client with timeout, using default"
                );
                reqwest::Client::new()
            });

        self
    }

    /// Set a custom base URL for Gemini-compatible APIs.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL without trailing slash (e.g., "http://localhost:1234/v1beta")
    #[instrument(skip(self, base_url))]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url_str = base_url.into();
        debug!(
            previous_base_url = ?self.config.base_url,
            new_base_url = %base_url_str,
            "Setting custom base URL"
        );
        self.config.base_url = Some(base_url_str);
        self
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        let base_url = self
            .config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/');
        format!(
            "{}/models/{}:generateContent",
            base_url,
            self.config.model.as_str()
        )
    }

    fn build_request(&self, request: &ContentRequest) -> GenerateContentRequest {
        let mut parts = vec![Part::Text {
            text: request.prompt.clone(),
        }];
        if let Some(image) = &request.image {
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type.clone(),
                    data: image.data.clone(),
                },
            });
        }

        GenerateContentRequest {
            system_instruction: SystemInstruction {
                parts: vec![Part::Text {
                    text: request.system_instruction.clone(),
                }],
            },
            contents: vec![Content {
                role: "user",
                parts,
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_tokens,
                response_mime_type: "application/json",
                response_schema: request.response_schema.to_json().clone(),
            },
        }
    }
}

/// Concatenate the non-thought text parts of the first candidate.
///
/// Missing candidates or parts yield an empty payload rather than an error, so the
/// caller classifies them together with other unusable output.
fn collect_text(completion: GenerateContentResponse, fallback_model: &str) -> GenerateResult {
    let usage = completion.usage_metadata.map(|u| {
        TokenUsage::new(
            completion
                .model_version
                .clone()
                .unwrap_or_else(|| fallback_model.to_string()),
            u.prompt_token_count,
            u.candidates_token_count,
        )
    });

    let Some(candidate) = completion.candidates.into_iter().next() else {
        error!("Gemini API returned empty candidates array");
        return GenerateResult::new(String::new(), usage);
    };
    trace!(finish_reason = ?candidate.finish_reason, "Completion finish reason");

    let text: String = candidate
        .content
        .map(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter(|part| !part.thought)
        .filter_map(|part| part.text)
        .collect();

    GenerateResult::new(text, usage)
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    fn name(&self) -> &str {
        self.config.model.as_str()
    }

    #[instrument(
        name = "gemini_generate",
        skip(self, request),
        fields(
            model = %self.config.model.as_str(),
            prompt_len = request.prompt.len(),
            has_image = request.image.is_some()
        )
    )]
    async fn generate(&self, request: &ContentRequest) -> std::result::Result<GenerateResult, AnalysisError> {
        let body = self.build_request(request);
        let url = self.endpoint();
        debug!(url = %url, "Sending request to Gemini API");

        let response = self
            .client
            .post(&url)
            .query(&[("key", &self.config.api_key)])
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| handle_http_error(e, "Gemini", self.config.timeout))?;

        let response = check_response_status(response, "Gemini").await?;
        let raw = response
            .text()
            .await
            .map_err(|e| handle_http_error(e, "Gemini", self.config.timeout))?;

        debug!(body_len = raw.len(), "Successfully received response from Gemini API");
        let completion: GenerateContentResponse = serde_json::from_str(&raw).map_err(|e| {
            error!(error = %e, "Failed to parse JSON envelope from Gemini API");
            AnalysisError::InvalidResponse(format!("Malformed Gemini envelope: {}", e))
        })?;

        Ok(collect_text(completion, self.config.model.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InlineImage;
    use crate::schema::SchemaBuilder;
    use serde_json::json;

    fn request(image: Option<InlineImage>) -> ContentRequest {
        ContentRequest {
            system_instruction: "You are a test engine.".to_string(),
            prompt: "Symptoms described: cough.".to_string(),
            image,
            response_schema: SchemaBuilder::object()
                .property("summary", json!({ "type": "string" }), true)
                .build(),
        }
    }

    #[test]
    fn test_empty_api_key_is_rejected() {
        assert!(matches!(GeminiClient::new("  "), Err(LensError::Config(_))));
    }

    #[test]
    fn test_request_body_text_only() {
        let client = GeminiClient::new("key").unwrap();
        let body = serde_json::to_value(client.build_request(&request(None))).unwrap();

        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            "You are a test engine."
        );
        let parts = body["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0]["text"], "Symptoms described: cough.");
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(
            body["generationConfig"]["responseSchema"]["required"],
            json!(["summary"])
        );
        assert!(body["generationConfig"].get("maxOutputTokens").is_none());
    }

    #[test]
    fn test_request_body_with_image_part() {
        let client = GeminiClient::new("key").unwrap().max_tokens(0);
        let image = InlineImage::from_data_uri("data:image/jpeg;base64,YWJj");
        let body = serde_json::to_value(client.build_request(&request(image))).unwrap();

        let parts = body["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(parts[1]["inlineData"]["data"], "YWJj");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1);
    }

    #[test]
    fn test_endpoint_uses_model_and_base_url() {
        let client = GeminiClient::new("key")
            .unwrap()
            .model(Model::Gemini25Flash)
            .base_url("http://localhost:8080/v1beta/");
        assert_eq!(
            client.endpoint(),
            "http://localhost:8080/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_collect_text_skips_thoughts_and_reads_usage() {
        let completion: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "thinking...", "thought": true },
                    { "text": "{\"summary\":" },
                    { "text": "\"ok\"}" }
                ]},
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 10, "candidatesTokenCount": 5 },
            "modelVersion": "gemini-3-flash-preview-001"
        }))
        .unwrap();

        let result = collect_text(completion, "gemini-3-flash-preview");
        assert_eq!(result.text, "{\"summary\":\"ok\"}");
        let usage = result.usage.unwrap();
        assert_eq!(usage.model, "gemini-3-flash-preview-001");
        assert_eq!(usage.total_tokens(), 15);
    }

    #[test]
    fn test_collect_text_without_candidates_is_empty() {
        let completion: GenerateContentResponse =
            serde_json::from_value(json!({ "promptFeedback": { "blockReason": "SAFETY" } }))
                .unwrap();
        let result = collect_text(completion, "gemini-3-flash-preview");
        assert!(result.text.is_empty());
        assert!(result.usage.is_none());
    }
}
