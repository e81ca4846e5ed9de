//! 错误恢复引擎
//!
//! 根据 AgentError 类型返回 RecoveryAction，供能力选择循环决定是重试还是终止。

use crate::core::{AgentError, RecoveryAction};

/// 语义化错误恢复：将错误映射为可执行动作（重试提示 / 终止）
#[derive(Debug, Default)]
pub struct RecoveryEngine;

impl RecoveryEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, err: &AgentError) -> RecoveryAction {
        match err {
            AgentError::JsonParseError(raw) => RecoveryAction::RetryWithPrompt(format!(
                "Your previous capability call was not valid JSON: {raw}. \
                To invoke a capability reply with exactly one JSON object and nothing else, \
                in the form {{\"capability\": \"<name>\", \"args\": {{...}}}}. \
                For example: {{\"capability\": \"tailor_resume\", \"args\": {{}}}}. \
                When you are done, reply with a plain-text summary instead."
            )),
            _ => RecoveryAction::Abort,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LlmError;

    #[test]
    fn test_recovery_json_parse_error() {
        let engine = RecoveryEngine::new();
        let err = AgentError::JsonParseError("invalid json".to_string());
        match engine.handle(&err) {
            RecoveryAction::RetryWithPrompt(msg) => {
                assert!(msg.contains("JSON"));
                assert!(msg.contains("invalid json"));
            }
            _ => panic!("Expected RetryWithPrompt"),
        }
    }

    #[test]
    fn test_recovery_llm_error_aborts() {
        let engine = RecoveryEngine::new();
        let err = AgentError::Llm(LlmError::Unavailable("connection refused".into()));
        assert!(matches!(engine.handle(&err), RecoveryAction::Abort));
    }

    #[test]
    fn test_recovery_iteration_limit_aborts() {
        let engine = RecoveryEngine::new();
        let err = AgentError::IterationLimit(12);
        assert!(matches!(engine.handle(&err), RecoveryAction::Abort));
    }
}
