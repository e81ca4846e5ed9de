//! 生成引擎：简历定制、求职信、申请问答
//!
//! 三个引擎共用同一形状：渲染模板 → 以任务温度调用模型 → 解析 → 失败时确定性回退。
//! 模型与解析失败都在本层吸收，只有 TemplateError 会向上传播。

pub mod cover_letter;
pub mod fallback;
pub mod parser;
pub mod questions;
pub mod resume;

use std::sync::Arc;

use crate::llm::LlmClient;
use crate::prompt::{TemplateKind, TemplateLoader};
use crate::types::{FallbackReason, GenerationResult};

pub use cover_letter::CoverLetterEngine;
pub use parser::{parse_answers, strip_code_fence};
pub use questions::QuestionAnsweringEngine;
pub use resume::ResumeEngine;

/// 三个引擎共享同一模型客户端，模板在构建时加载一次
pub struct GenerationEngines {
    pub resume: ResumeEngine,
    pub cover_letter: CoverLetterEngine,
    pub questions: QuestionAnsweringEngine,
}

impl GenerationEngines {
    pub fn new(llm: Arc<dyn LlmClient>, templates: &TemplateLoader) -> Self {
        Self {
            resume: ResumeEngine::new(llm.clone(), templates.load(TemplateKind::Resume)),
            cover_letter: CoverLetterEngine::new(
                llm.clone(),
                templates.load(TemplateKind::CoverLetter),
            ),
            questions: QuestionAnsweringEngine::new(
                llm,
                templates.load(TemplateKind::QuestionAnswering),
            ),
        }
    }
}

/// 文本类任务的共用调用：模型失败或返回空白时回显带标记的 prompt
pub(crate) async fn generate_text(
    llm: &dyn LlmClient,
    task: &'static str,
    prompt: &str,
    temperature: f32,
    marker: &str,
) -> GenerationResult {
    tracing::debug!(task, prompt_chars = prompt.chars().count(), temperature, "generate");
    match llm.generate(prompt, temperature).await {
        Ok(text) if !text.trim().is_empty() => GenerationResult::from_model(text.trim()),
        Ok(_) => {
            tracing::warn!(task, "model returned blank text, using fallback");
            GenerationResult::fallback(
                fallback::echo_prompt(marker, prompt),
                FallbackReason::UnusableOutput("blank response".to_string()),
            )
        }
        Err(e) => {
            tracing::warn!(task, error = %e, "model unavailable, using fallback");
            GenerationResult::fallback(
                fallback::echo_prompt(marker, prompt),
                FallbackReason::ModelUnavailable(e.to_string()),
            )
        }
    }
}
