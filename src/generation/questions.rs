//! 申请问答引擎（temperature 0.2）
//!
//! 输出必须解析为与问题数等长的 JSON 数组，否则逐题使用通用回答。
//! 解析成功后按输入顺序对齐：先按问题文本精确匹配，再按位置补齐，
//! 返回的每个 question 与输入问题文本逐字相同。

use std::sync::Arc;

use crate::core::TemplateError;
use crate::generation::{fallback, parse_answers};
use crate::llm::LlmClient;
use crate::prompt::{render, PromptContext};
use crate::types::{
    Answer, AnswerSet, ApplicationQuestion, CandidateProfile, FallbackReason, JobPosting,
};

pub struct QuestionAnsweringEngine {
    llm: Arc<dyn LlmClient>,
    template: String,
}

impl QuestionAnsweringEngine {
    pub const TEMPERATURE: f32 = 0.2;

    pub fn new(llm: Arc<dyn LlmClient>, template: impl Into<String>) -> Self {
        Self {
            llm,
            template: template.into(),
        }
    }

    pub fn render_prompt(
        &self,
        job: &JobPosting,
        profile: &CandidateProfile,
        questions: &[ApplicationQuestion],
    ) -> Result<String, TemplateError> {
        let ctx = PromptContext::new()
            .with_job(job)
            .with_profile(profile)
            .with_questions(questions);
        render(&self.template, &ctx)
    }

    pub async fn run(
        &self,
        job: &JobPosting,
        profile: &CandidateProfile,
        questions: &[ApplicationQuestion],
    ) -> Result<AnswerSet, TemplateError> {
        if questions.is_empty() {
            return Ok(AnswerSet::default());
        }
        let prompt = self.render_prompt(job, profile, questions)?;
        tracing::debug!(questions = questions.len(), "answer_application_questions");

        let raw = match self.llm.generate(&prompt, Self::TEMPERATURE).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "model unavailable, using stock answers");
                return Ok(stock(job, questions, FallbackReason::ModelUnavailable(e.to_string())));
            }
        };

        match parse_answers(&raw, questions.len()) {
            Ok(parsed) => Ok(AnswerSet {
                answers: align_answers(questions, parsed),
                fallback: None,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "unusable answers, using stock answers");
                Ok(stock(job, questions, FallbackReason::UnusableOutput(e.to_string())))
            }
        }
    }
}

fn stock(job: &JobPosting, questions: &[ApplicationQuestion], reason: FallbackReason) -> AnswerSet {
    AnswerSet {
        answers: fallback::stock_answers(job, questions),
        fallback: Some(reason),
    }
}

/// 将解析结果映射回输入问题；parsed 长度已与 questions 相同
pub fn align_answers(questions: &[ApplicationQuestion], parsed: Vec<Answer>) -> Vec<Answer> {
    let mut used = vec![false; parsed.len()];
    let mut slots: Vec<Option<usize>> = vec![None; questions.len()];

    for (qi, q) in questions.iter().enumerate() {
        let exact = (0..parsed.len()).find(|&pi| !used[pi] && parsed[pi].question == q.question);
        if let Some(pi) = exact {
            used[pi] = true;
            slots[qi] = Some(pi);
        }
    }

    for (qi, slot) in slots.iter_mut().enumerate() {
        if slot.is_some() {
            continue;
        }
        let pi = if qi < parsed.len() && !used[qi] {
            Some(qi)
        } else {
            used.iter().position(|u| !u)
        };
        if let Some(pi) = pi {
            used[pi] = true;
            *slot = Some(pi);
        }
    }

    questions
        .iter()
        .zip(slots)
        .map(|(q, slot)| Answer {
            question: q.question.clone(),
            answer: slot.map(|pi| parsed[pi].answer.clone()).unwrap_or_default(),
        })
        .collect()
}
