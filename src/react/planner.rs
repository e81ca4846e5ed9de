//! Planner：能力调用规划与解析
//!
//! 调用 LLM 得到最终总结或 JSON 能力调用；parse_llm_output 从文本中提取 JSON 并解析为 CapabilityCall 或直接回复。

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::core::AgentError;
use crate::llm::{CompletionOptions, LlmClient, Message};

/// LLM 返回的能力调用：{"capability": "tailor_resume", "args": {...}}，兼容 "tool" 键
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CapabilityCall {
    #[serde(alias = "tool")]
    pub capability: String,
    #[serde(default)]
    pub args: Value,
}

/// Planner 输出
#[derive(Debug, Clone, PartialEq)]
pub enum PlannerOutput {
    /// 最终总结
    Response(String),
    /// 需要调用能力
    Call(CapabilityCall),
}

fn looks_like_call(json_str: &str) -> bool {
    json_str.contains("\"capability\"") || json_str.contains("\"tool\"")
}

/// 解析 LLM 输出：含 capability / tool 键的 JSON 为能力调用，其余为最终回复；
/// 形似调用但 JSON 非法时返回 JsonParseError
pub fn parse_llm_output(output: &str) -> Result<PlannerOutput, AgentError> {
    let trimmed = output.trim();

    // 提取 JSON 块（```json ... ``` 或首尾花括号之间）
    let json_str = if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        rest.find("```")
            .map(|end| rest[..end].trim())
            .unwrap_or(rest.trim())
    } else if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            &trimmed[start..=end]
        } else {
            return Ok(PlannerOutput::Response(trimmed.to_string()));
        }
    } else {
        return Ok(PlannerOutput::Response(trimmed.to_string()));
    };

    if !looks_like_call(json_str) {
        return Ok(PlannerOutput::Response(trimmed.to_string()));
    }

    let mut parsed: CapabilityCall = serde_json::from_str(json_str)
        .map_err(|e| AgentError::JsonParseError(format!("{e}: {json_str}")))?;

    if parsed.capability.trim().is_empty() {
        return Ok(PlannerOutput::Response(trimmed.to_string()));
    }
    if parsed.args.is_null() {
        parsed.args = Value::Object(Default::default());
    }
    Ok(PlannerOutput::Call(parsed))
}

/// Planner：持有 LLM、system prompt 与规划温度
pub struct Planner {
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
    temperature: f32,
}

impl Planner {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        system_prompt: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            llm,
            system_prompt: system_prompt.into(),
            temperature,
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// system + 对话历史 -> LLM
    pub async fn plan(&self, messages: &[Message]) -> Result<String, AgentError> {
        let mut full = Vec::with_capacity(messages.len() + 1);
        full.push(Message::system(self.system_prompt.clone()));
        full.extend_from_slice(messages);
        let reply = self
            .llm
            .complete(&full, &CompletionOptions::with_temperature(self.temperature))
            .await?;
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_plain_call() {
        let out = parse_llm_output(r#"{"capability": "tailor_resume", "args": {}}"#).unwrap();
        assert_eq!(
            out,
            PlannerOutput::Call(CapabilityCall {
                capability: "tailor_resume".into(),
                args: json!({}),
            })
        );
    }

    #[test]
    fn test_parse_fenced_call_with_tool_alias() {
        let out = parse_llm_output(
            "I'll start with the resume.\n```json\n{\"tool\": \"generate_cover_letter\", \"args\": {\"tailored_resume\": \"x\"}}\n```",
        )
        .unwrap();
        match out {
            PlannerOutput::Call(call) => {
                assert_eq!(call.capability, "generate_cover_letter");
                assert_eq!(call.args["tailored_resume"], "x");
            }
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_args_become_empty_object() {
        match parse_llm_output(r#"{"capability": "inspect_external_application"}"#).unwrap() {
            PlannerOutput::Call(call) => assert_eq!(call.args, json!({})),
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn test_plain_text_is_response() {
        let out = parse_llm_output("Done: tailored resume and cover letter generated.").unwrap();
        assert!(matches!(out, PlannerOutput::Response(_)));

        // 普通花括号不视为调用
        let out = parse_llm_output("Summary {resume: ok}").unwrap();
        assert!(matches!(out, PlannerOutput::Response(_)));
    }

    #[test]
    fn test_malformed_call_is_json_error() {
        let err = parse_llm_output(r#"{"capability": "tailor_resume", "args": {,}}"#).unwrap_err();
        assert!(matches!(err, AgentError::JsonParseError(_)));
    }
}
