use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use super::{GenerateRequest, GenerateResponse, Provider, ProviderError};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ERROR_BODY_LIMIT: usize = 500;

pub const EMPTY_RESPONSE_TEXT: &str = "No data returned from Claude.";

pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
}

impl AnthropicProvider {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.to_string(),
        }
    }
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Option<AnthropicContentField>,
    #[serde(default)]
    model: String,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
    stop_reason: Option<String>,
}

/// The messages API returns a list of blocks, but a bare string is accepted too.
#[derive(Deserialize)]
#[serde(untagged)]
enum AnthropicContentField {
    Blocks(Vec<AnthropicContent>),
    Text(String),
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[async_trait::async_trait]
impl Provider for AnthropicProvider {
    async fn generate(&self, req: &GenerateRequest) -> Result<GenerateResponse, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| ProviderError::InvalidRequest(format!("invalid API key header: {e}")))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let body = AnthropicRequest {
            model: &req.model,
            max_tokens: req.max_tokens,
            temperature: req.temperature,
            messages: vec![AnthropicMessage {
                role: "user",
                content: &req.prompt,
            }],
        };

        let response = self
            .client
            .post(MESSAGES_URL)
            .headers(headers)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() != 200 {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: error_body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        let raw = response.text().await?;
        parse_response(&raw, &req.model)
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

fn parse_response(raw: &str, requested_model: &str) -> Result<GenerateResponse, ProviderError> {
    let resp: AnthropicResponse =
        serde_json::from_str(raw).map_err(|e| ProviderError::Decode(e.to_string()))?;

    let content = match resp.content {
        Some(AnthropicContentField::Blocks(blocks)) => blocks
            .iter()
            .filter(|c| c.content_type == "text")
            .filter_map(|c| c.text.as_deref())
            .collect::<Vec<_>>()
            .join(""),
        Some(AnthropicContentField::Text(text)) => text,
        None => EMPTY_RESPONSE_TEXT.to_string(),
    };

    let (input_tokens, output_tokens) = resp
        .usage
        .map(|u| (u.input_tokens, u.output_tokens))
        .unwrap_or((0, 0));

    let model = if resp.model.is_empty() {
        requested_model.to_string()
    } else {
        resp.model
    };

    Ok(GenerateResponse {
        content,
        model,
        input_tokens,
        output_tokens,
        finish_reason: resp.stop_reason.unwrap_or_default(),
    })
}
