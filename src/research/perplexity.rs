use async_openai::{
    Client,
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessage,
        ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
    },
};

use super::{FactSource, MISSING_KEY_TEXT, NO_DATA_TEXT};

const PERPLEXITY_API_BASE: &str = "https://api.perplexity.ai";

/// Perplexity speaks the OpenAI chat-completions dialect, so the OpenAI
/// client is pointed at its base URL.
pub struct PerplexityResearcher {
    client: Option<Client<OpenAIConfig>>,
    model: String,
}

impl PerplexityResearcher {
    pub fn new(api_key: Option<&str>, model: &str) -> Self {
        let client = api_key.map(|key| {
            let config = OpenAIConfig::new()
                .with_api_key(key)
                .with_api_base(PERPLEXITY_API_BASE);
            Client::with_config(config)
        });
        Self {
            client,
            model: model.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl FactSource for PerplexityResearcher {
    #[tracing::instrument(
        name = "research perplexity",
        skip(self, query),
        fields(research.model = %self.model, research.answer_chars)
    )]
    async fn search(&self, query: &str) -> String {
        let Some(client) = &self.client else {
            tracing::warn!("fact research skipped, no API key configured");
            return MISSING_KEY_TEXT.to_string();
        };

        let messages = vec![ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(query.to_string()),
                name: None,
            },
        )];

        #[allow(deprecated)]
        let request = CreateChatCompletionRequest {
            model: self.model.clone(),
            messages,
            ..Default::default()
        };

        let answer = match client.chat().create(request).await {
            Ok(response) => response
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content),
            Err(err) => {
                tracing::warn!(error = %err, "fact research failed, continuing without facts");
                None
            }
        };

        let text = non_empty_or_sentinel(answer);
        tracing::Span::current().record("research.answer_chars", text.len());
        text
    }
}

fn non_empty_or_sentinel(answer: Option<String>) -> String {
    match answer {
        Some(text) if !text.trim().is_empty() => text,
        _ => NO_DATA_TEXT.to_string(),
    }
}
