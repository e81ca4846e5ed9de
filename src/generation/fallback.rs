//! 确定性回退文本：模型不可用或输出不可用时使用

use crate::types::{Answer, AnswerKind, ApplicationQuestion, JobPosting};

/// 简历回退标记
pub const RESUME_FALLBACK_MARKER: &str = "[mock-refined]";
/// 求职信回退标记
pub const COVER_LETTER_FALLBACK_MARKER: &str = "[mock-cover-letter]";

/// 带标记的 prompt 回显，保证下游总能拿到非空文本
pub fn echo_prompt(marker: &str, prompt: &str) -> String {
    format!("{marker}\n{prompt}\n\n(model unavailable)")
}

fn non_empty<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.trim().is_empty() {
        default
    } else {
        value
    }
}

/// 单个问题的通用回答
pub fn stock_answer(job: &JobPosting, question: &ApplicationQuestion) -> String {
    match question.kind {
        AnswerKind::Boolean => format!(
            "Yes, I am interested in this {} role at {}.",
            non_empty(&job.title, "position"),
            non_empty(&job.company, "your company"),
        ),
        _ => "I am well-suited for this role based on my experience and skills.".to_string(),
    }
}

/// 逐题生成通用回答，顺序与输入一致
pub fn stock_answers(job: &JobPosting, questions: &[ApplicationQuestion]) -> Vec<Answer> {
    questions
        .iter()
        .map(|q| Answer {
            question: q.question.clone(),
            answer: stock_answer(job, q),
        })
        .collect()
}
