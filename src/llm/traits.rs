//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / Mock）实现 LlmClient::complete；temperature 与模型提示随每次调用传入。

use async_trait::async_trait;

use crate::core::LlmError;
use crate::llm::Message;

/// 单次调用参数
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    /// 覆盖默认模型；None 使用客户端配置的模型
    pub model: Option<String>,
}

impl CompletionOptions {
    pub fn with_temperature(temperature: f32) -> Self {
        Self {
            temperature,
            model: None,
        }
    }
}

/// LLM 客户端 trait
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 非流式完成
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<String, LlmError>;

    /// 单条 prompt 生成：generate(prompt, temperature) -> text
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String, LlmError> {
        self.complete(
            &[Message::user(prompt)],
            &CompletionOptions::with_temperature(temperature),
        )
        .await
    }
}
