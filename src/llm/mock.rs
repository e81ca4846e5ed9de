//! Mock LLM 客户端（用于测试，无需 API）
//!
//! 按顺序回放预设回复；脚本耗尽或 unavailable() 时返回 LlmError::Unavailable。
//! 每次调用都会记录 prompt 与 temperature，便于断言「调用了几次 / 是否调用」。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::LlmError;
use crate::llm::{CompletionOptions, LlmClient, Message};

/// 一次被记录的调用
#[derive(Debug, Clone)]
pub struct MockCall {
    /// 最后一条消息内容
    pub prompt: String,
    pub temperature: f32,
    pub message_count: usize,
}

/// Mock 客户端：回放脚本
#[derive(Debug, Default)]
pub struct MockLlmClient {
    replies: Mutex<VecDeque<String>>,
    unavailable: bool,
    calls: Mutex<Vec<MockCall>>,
}

impl MockLlmClient {
    /// 按顺序返回给定回复
    pub fn scripted<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            unavailable: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// 永远不可用的后端
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<String, LlmError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(MockCall {
                prompt: messages.last().map(|m| m.content.clone()).unwrap_or_default(),
                temperature: options.temperature,
                message_count: messages.len(),
            });
        }

        if self.unavailable {
            return Err(LlmError::Unavailable("mock backend offline".to_string()));
        }

        self.replies
            .lock()
            .ok()
            .and_then(|mut r| r.pop_front())
            .ok_or_else(|| LlmError::Unavailable("mock script exhausted".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_replies_in_order() {
        let llm = MockLlmClient::scripted(["first", "second"]);
        assert_eq!(llm.generate("a", 0.0).await.unwrap(), "first");
        assert_eq!(llm.generate("b", 0.3).await.unwrap(), "second");
        assert!(matches!(
            llm.generate("c", 0.0).await,
            Err(LlmError::Unavailable(_))
        ));

        let calls = llm.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1].prompt, "b");
        assert_eq!(calls[1].temperature, 0.3);
    }

    #[tokio::test]
    async fn test_unavailable_records_call() {
        let llm = MockLlmClient::unavailable();
        assert!(llm.generate("prompt", 0.0).await.is_err());
        assert_eq!(llm.call_count(), 1);
    }
}
