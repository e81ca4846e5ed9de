//! 申请数据模型
//!
//! JobPosting / CandidateProfile / ApplicationQuestion 为调用方传入的只读输入；
//! GenerationResult、AnswerSet、ApplicationOutcome 每次调用新建，仅归该次调用所有。

use serde::{Deserialize, Serialize};

use crate::portal::{PortalRequirements, SubmissionResult};
use crate::react::TraceEntry;

/// 职位信息（只读输入）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobPosting {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    #[serde(rename = "type")]
    pub job_type: String,
    pub experience: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub benefits: Vec<String>,
    /// 外部申请门户地址；为空表示无需门户提交
    #[serde(alias = "external_apply_url")]
    pub external_url: Option<String>,
}

impl JobPosting {
    /// 非空的外部门户地址
    pub fn portal_url(&self) -> Option<&str> {
        self.external_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }
}

/// 候选人档案（只读输入）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateProfile {
    pub name: String,
    pub email: String,
    pub headline: String,
    pub summary: String,
    /// 有序技能列表
    pub skills: Vec<String>,
    pub resume_text: String,
    /// 简历引用：URL、相对路径或 file:// 本地路径
    #[serde(alias = "resume_url")]
    pub resume_ref: String,
}

/// 问题类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerKind {
    #[default]
    Text,
    Boolean,
    Choice,
}

/// 申请问题（只读输入）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationQuestion {
    pub question: String,
    #[serde(rename = "type")]
    pub kind: AnswerKind,
    /// 仅 choice 类型非空
    pub options: Vec<String>,
}

impl ApplicationQuestion {
    pub fn text(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            kind: AnswerKind::Text,
            options: Vec::new(),
        }
    }

    pub fn boolean(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            kind: AnswerKind::Boolean,
            options: Vec::new(),
        }
    }

    pub fn choice(question: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            question: question.into(),
            kind: AnswerKind::Choice,
            options,
        }
    }
}

/// 单个回答：question 原样回显输入问题文本
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question: String,
    pub answer: String,
}

/// 降级原因：模型不可用或输出无法使用
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FallbackReason {
    ModelUnavailable(String),
    UnusableOutput(String),
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackReason::ModelUnavailable(e) => write!(f, "model unavailable: {e}"),
            FallbackReason::UnusableOutput(e) => write!(f, "unusable model output: {e}"),
        }
    }
}

/// 三态结果：真实内容 / 降级内容 / 失败
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generated<T> {
    Ok(T),
    Degraded { value: T, reason: FallbackReason },
    Failed(String),
}

impl<T> Generated<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Generated::Ok(v) | Generated::Degraded { value: v, .. } => Some(v),
            Generated::Failed(_) => None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Generated::Degraded { .. })
    }
}

/// 文本产物（简历摘要 / 求职信）及其来源
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationResult {
    pub text: String,
    /// None 表示来自模型；Some 表示确定性回退
    pub fallback: Option<FallbackReason>,
}

impl GenerationResult {
    pub fn from_model(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fallback: None,
        }
    }

    pub fn fallback(text: impl Into<String>, reason: FallbackReason) -> Self {
        Self {
            text: text.into(),
            fallback: Some(reason),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

impl From<GenerationResult> for Generated<String> {
    fn from(r: GenerationResult) -> Self {
        match r.fallback {
            None => Generated::Ok(r.text),
            Some(reason) => Generated::Degraded {
                value: r.text,
                reason,
            },
        }
    }
}

/// 问答结果：每个输入问题恰好一个回答
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnswerSet {
    pub answers: Vec<Answer>,
    pub fallback: Option<FallbackReason>,
}

impl AnswerSet {
    pub fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

/// 一次申请处理的聚合结果
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplicationOutcome {
    pub success: bool,
    pub message: String,
    pub resume: Option<GenerationResult>,
    pub cover_letter: Option<GenerationResult>,
    pub answers: Vec<Answer>,
    /// 问答是否走了回退
    pub answers_fallback: Option<FallbackReason>,
    pub portal_requirements: Option<PortalRequirements>,
    pub portal_result: Option<SubmissionResult>,
    /// 仅 agentic 模式：最终总结
    pub reasoning: Option<String>,
    /// 仅 agentic 模式：完整轨迹
    pub trace: Vec<TraceEntry>,
}

impl ApplicationOutcome {
    pub fn resume_text(&self) -> &str {
        self.resume.as_ref().map(|r| r.text.as_str()).unwrap_or("")
    }

    pub fn cover_letter_text(&self) -> &str {
        self.cover_letter
            .as_ref()
            .map(|r| r.text.as_str())
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_posting_deserialize_original_field_names() {
        let job: JobPosting = serde_json::from_str(
            r#"{"title": "Backend Engineer", "company": "Acme", "type": "Full-time",
                "external_apply_url": "http://portal.local/apply?jobId=1"}"#,
        )
        .unwrap();
        assert_eq!(job.job_type, "Full-time");
        assert_eq!(job.portal_url(), Some("http://portal.local/apply?jobId=1"));
    }

    #[test]
    fn test_blank_portal_url_is_none() {
        let job = JobPosting {
            external_url: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(job.portal_url(), None);
    }

    #[test]
    fn test_question_kind_parses_lowercase() {
        let q: ApplicationQuestion =
            serde_json::from_str(r#"{"question": "Relocate?", "type": "boolean"}"#).unwrap();
        assert_eq!(q.kind, AnswerKind::Boolean);
        assert!(q.options.is_empty());
    }

    #[test]
    fn test_generation_result_into_generated() {
        let ok: Generated<String> = GenerationResult::from_model("text").into();
        assert_eq!(ok, Generated::Ok("text".to_string()));

        let degraded: Generated<String> = GenerationResult::fallback(
            "[mock-refined]",
            FallbackReason::ModelUnavailable("down".into()),
        )
        .into();
        assert!(degraded.is_degraded());
        assert_eq!(degraded.value().map(String::as_str), Some("[mock-refined]"));
    }
}
