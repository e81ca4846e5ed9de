//! OpenAI 兼容 API 客户端
//!
//! 通过 async_openai 调用任意 OpenAI 兼容端点（可配置 base_url）；Ollama 的 /v1 端点、自建代理等均可。
//! 任何传输或 API 错误都映射为 LlmError::Unavailable，由生成引擎本地回退。

use std::time::Duration;

use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;

use crate::config::LlmSection;
use crate::core::LlmError;
use crate::llm::{CompletionOptions, LlmClient, Message, Role};

/// OpenAI 兼容客户端：持有 Client、默认 model 与请求超时
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAiClient {
    pub fn new(base_url: &str, model: &str, api_key: Option<&str>, timeout_secs: u64) -> Self {
        // Ollama 不校验 key，但 async_openai 需要一个值
        let api_key = api_key.unwrap_or("ollama");
        let config = OpenAIConfig::new()
            .with_api_base(base_url)
            .with_api_key(api_key);

        Self {
            client: Client::with_config(config),
            model: model.to_string(),
            timeout: Duration::from_secs(timeout_secs.max(1)),
        }
    }

    pub fn from_config(cfg: &LlmSection) -> Self {
        Self::new(
            &cfg.base_url,
            &cfg.model,
            cfg.api_key.as_deref(),
            cfg.request_timeout_secs,
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn to_openai_messages(
        messages: &[Message],
    ) -> Result<Vec<ChatCompletionRequestMessage>, LlmError> {
        messages
            .iter()
            .map(|m| {
                let msg = match m.role {
                    Role::System => ChatCompletionRequestSystemMessageArgs::default()
                        .content(m.content.clone())
                        .build()
                        .map(ChatCompletionRequestMessage::System),
                    Role::User => ChatCompletionRequestUserMessageArgs::default()
                        .content(m.content.clone())
                        .build()
                        .map(ChatCompletionRequestMessage::User),
                    Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                        .content(m.content.clone())
                        .build()
                        .map(ChatCompletionRequestMessage::Assistant),
                };
                msg.map_err(|e| LlmError::Unavailable(e.to_string()))
            })
            .collect()
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<String, LlmError> {
        let model = options.model.as_deref().unwrap_or(&self.model);
        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .temperature(options.temperature)
            .messages(Self::to_openai_messages(messages)?)
            .build()
            .map_err(|e| LlmError::Unavailable(e.to_string()))?;

        tracing::debug!(
            model = %model,
            temperature = options.temperature,
            prompt_chars = messages.iter().map(|m| m.content.len()).sum::<usize>(),
            "calling model"
        );

        let response = tokio::time::timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| LlmError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| LlmError::Unavailable(e.to_string()))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(LlmError::EmptyContent);
        }
        Ok(content)
    }
}
