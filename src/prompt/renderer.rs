//! PromptRenderer：把模板与职位 / 候选人 / 问题数据合成最终 prompt
//!
//! 占位符语法 `{{ name }}`，name 为点分标识符（job.title、profile.skills、questions 等）。
//! 兼容 `{{ profile.skills | join(", ") }}` 写法：管道后的过滤器被忽略，列表值本身已按 ", " 拼接。
//! 未知名字渲染为空串；未闭合或名字非法的占位符返回 TemplateError。

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::core::TemplateError;
use crate::types::{AnswerKind, ApplicationQuestion, CandidateProfile, JobPosting};

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
            .expect("static placeholder pattern")
    })
}

/// 渲染上下文：扁平化的 name -> 文本
#[derive(Debug, Clone, Default)]
pub struct PromptContext {
    values: BTreeMap<String, String>,
}

impl PromptContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn with_job(mut self, job: &JobPosting) -> Self {
        self.insert("job.id", job.id.as_str());
        self.insert("job.title", job.title.as_str());
        self.insert("job.company", job.company.as_str());
        self.insert("job.location", job.location.as_str());
        self.insert("job.type", job.job_type.as_str());
        self.insert("job.experience", job.experience.as_str());
        self.insert("job.description", job.description.as_str());
        self.insert("job.requirements", job.requirements.join(", "));
        self.insert("job.benefits", job.benefits.join(", "));
        self.insert("job.external_url", job.portal_url().unwrap_or(""));
        self
    }

    pub fn with_profile(mut self, profile: &CandidateProfile) -> Self {
        self.insert("profile.name", profile.name.as_str());
        self.insert("profile.email", profile.email.as_str());
        self.insert("profile.headline", profile.headline.as_str());
        self.insert("profile.summary", profile.summary.as_str());
        self.insert("profile.skills", profile.skills.join(", "));
        self.insert("profile.resume_text", profile.resume_text.as_str());
        self.insert("profile.resume_url", profile.resume_ref.as_str());
        self.insert("resume_text", profile.resume_text.as_str());
        self
    }

    pub fn with_questions(mut self, questions: &[ApplicationQuestion]) -> Self {
        self.insert("questions", render_question_list(questions));
        self.insert("question_count", questions.len().to_string());
        self
    }
}

/// 编号问题列表（从 1 开始）：boolean 追加 (Yes/No)，有选项的追加 (Options: a, b, c)
pub fn render_question_list(questions: &[ApplicationQuestion]) -> String {
    questions
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let annotation = match q.kind {
                AnswerKind::Boolean => " (Yes/No)".to_string(),
                _ if !q.options.is_empty() => format!(" (Options: {})", q.options.join(", ")),
                _ => String::new(),
            };
            format!("{}. {}{}", i + 1, q.question, annotation)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// 渲染模板
pub fn render(template: &str, ctx: &PromptContext) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut offset = 0;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let inner_start = open + 2;
        let close = rest[inner_start..]
            .find("}}")
            .ok_or(TemplateError::UnclosedPlaceholder(offset + open))?;
        let raw = &rest[inner_start..inner_start + close];

        let name = raw.split('|').next().unwrap_or("").trim();
        if name.is_empty() {
            return Err(TemplateError::EmptyPlaceholder(offset + open));
        }
        if !name_pattern().is_match(name) {
            return Err(TemplateError::InvalidName {
                name: name.to_string(),
                offset: offset + open,
            });
        }
        out.push_str(ctx.get(name).unwrap_or(""));

        let consumed = inner_start + close + 2;
        offset += consumed;
        rest = &rest[consumed..];
    }
    out.push_str(rest);
    Ok(out)
}
