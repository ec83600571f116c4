use std::sync::Arc;
use std::time::Instant;

use opentelemetry::KeyValue;
use tracing::Instrument;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use super::{GenerateRequest, GenerateResponse, Provider, ProviderError};
use crate::config::Config;
use crate::error::AppError;
use crate::telemetry::metrics::{
    GEN_AI_ERROR_COUNT, GEN_AI_OPERATION_DURATION, GEN_AI_TOKEN_USAGE,
};

pub const MISSING_KEY_TEXT: &str = "API Error: Missing CLAUDE_API_KEY";

/// Text-generation front door for the pipeline.
///
/// Status failures come back as inline `API Error: ...` text so a case is
/// always displayable; only transport and decode faults surface as errors.
pub struct LlmClient {
    provider: Option<Arc<dyn Provider>>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl LlmClient {
    pub fn new(provider: Option<Arc<dyn Provider>>, config: &Config) -> Self {
        Self {
            provider,
            model: config.claude_model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let provider = config.claude_api_key.as_deref().map(|key| {
            Arc::new(super::anthropic::AnthropicProvider::new(key)) as Arc<dyn Provider>
        });
        Self::new(provider, config)
    }

    pub async fn complete(&self, stage: &str, prompt: String) -> Result<String, AppError> {
        let Some(provider) = self.provider.as_deref() else {
            tracing::warn!(stage, "text generation skipped, no API key configured");
            return Ok(MISSING_KEY_TEXT.to_string());
        };

        let req = GenerateRequest {
            model: self.model.clone(),
            prompt,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stage: stage.to_string(),
        };

        match self.generate_once(provider, &req).await {
            Ok(resp) => Ok(resp.content),
            Err(err @ ProviderError::Status { .. }) => Ok(format!("API Error: {err}")),
            Err(err) => Err(AppError::Llm(err.to_string())),
        }
    }

    async fn generate_once(
        &self,
        provider: &dyn Provider,
        req: &GenerateRequest,
    ) -> Result<GenerateResponse, ProviderError> {
        let provider_name = provider.name().to_string();
        let span_display_name = format!("gen_ai.chat {}", req.model);
        let start = Instant::now();

        let span = tracing::info_span!(
            "gen_ai.chat",
            otel.name = %span_display_name,
            gen_ai.operation.name = "chat",
            gen_ai.provider.name = %provider_name,
            gen_ai.request.model = %req.model,
            gen_ai.request.temperature = req.temperature,
            gen_ai.request.max_tokens = req.max_tokens as i64,
            gen_ai.response.model = tracing::field::Empty,
            gen_ai.usage.input_tokens = tracing::field::Empty,
            gen_ai.usage.output_tokens = tracing::field::Empty,
            gen_ai.response.finish_reasons = tracing::field::Empty,
            case.stage = %req.stage,
            otel.status_code = tracing::field::Empty,
            error.type = tracing::field::Empty,
        );

        span.add_event(
            "gen_ai.user.message",
            vec![KeyValue::new("gen_ai.prompt", truncate(&req.prompt, 1000))],
        );

        let result = provider.generate(req).instrument(span.clone()).await;
        let duration = start.elapsed().as_secs_f64();

        match result {
            Ok(resp) => {
                span.record("gen_ai.response.model", resp.model.as_str());
                span.record("gen_ai.usage.input_tokens", resp.input_tokens as i64);
                span.record("gen_ai.usage.output_tokens", resp.output_tokens as i64);
                if !resp.finish_reason.is_empty() {
                    span.record(
                        "gen_ai.response.finish_reasons",
                        resp.finish_reason.as_str(),
                    );
                }

                span.add_event(
                    "gen_ai.assistant.message",
                    vec![KeyValue::new(
                        "gen_ai.completion",
                        truncate(&resp.content, 2000),
                    )],
                );

                let op_kv = KeyValue::new("gen_ai.operation.name", "chat");
                let provider_kv = KeyValue::new("gen_ai.provider.name", provider_name.clone());
                let model_kv = KeyValue::new("gen_ai.request.model", resp.model.clone());

                GEN_AI_TOKEN_USAGE.record(
                    f64::from(resp.input_tokens),
                    &[
                        KeyValue::new("gen_ai.token.type", "input"),
                        op_kv.clone(),
                        provider_kv.clone(),
                        model_kv.clone(),
                    ],
                );
                GEN_AI_TOKEN_USAGE.record(
                    f64::from(resp.output_tokens),
                    &[
                        KeyValue::new("gen_ai.token.type", "output"),
                        op_kv.clone(),
                        provider_kv.clone(),
                        model_kv.clone(),
                    ],
                );
                GEN_AI_OPERATION_DURATION.record(duration, &[op_kv, provider_kv, model_kv]);

                Ok(resp)
            }
            Err(err) => {
                span.record("otel.status_code", "ERROR");
                span.record("error.type", classify_error(&err));

                GEN_AI_ERROR_COUNT.add(
                    1,
                    &[
                        KeyValue::new("gen_ai.provider.name", provider_name.clone()),
                        KeyValue::new("gen_ai.request.model", req.model.clone()),
                    ],
                );

                tracing::warn!(
                    provider = %provider_name,
                    model = %req.model,
                    stage = %req.stage,
                    error = %err,
                    "text generation failed"
                );

                Err(err)
            }
        }
    }
}

fn classify_error(err: &ProviderError) -> &'static str {
    match err {
        ProviderError::Status { status: 429, .. } => "rate_limit",
        ProviderError::Status {
            status: 401 | 403, ..
        } => "auth_error",
        ProviderError::Status {
            status: 400 | 404 | 413 | 422,
            ..
        } => "invalid_request",
        ProviderError::Status { status, .. } if *status >= 500 => "server_error",
        ProviderError::Status { .. } => "unknown_error",
        ProviderError::Transport(e) if e.is_timeout() => "timeout",
        ProviderError::Transport(_) => "network_error",
        ProviderError::Decode(_) => "decode_error",
        ProviderError::InvalidRequest(_) => "invalid_request",
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        s.char_indices()
            .take_while(|&(i, _)| i < max)
            .map(|(_, c)| c)
            .collect()
    }
}
