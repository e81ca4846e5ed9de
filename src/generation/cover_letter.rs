//! 求职信引擎（temperature 0.3）
//!
//! 若给出定制后的简历，取前 500 个字符附在候选人简历文本之后作为上下文。

use std::sync::Arc;

use crate::core::TemplateError;
use crate::generation::{fallback, generate_text};
use crate::llm::LlmClient;
use crate::prompt::{render, PromptContext};
use crate::types::{CandidateProfile, GenerationResult, JobPosting};

/// 附加的定制简历上下文上限（字符）
pub const TAILORED_CONTEXT_CHARS: usize = 500;

pub struct CoverLetterEngine {
    llm: Arc<dyn LlmClient>,
    template: String,
}

/// 候选人简历文本 + 截断后的定制简历要点
pub fn resume_context(profile: &CandidateProfile, tailored_resume: Option<&str>) -> String {
    match tailored_resume.map(str::trim).filter(|t| !t.is_empty()) {
        Some(tailored) => {
            let excerpt: String = tailored.chars().take(TAILORED_CONTEXT_CHARS).collect();
            format!(
                "{}\n\nKey points from tailored resume:\n{}",
                profile.resume_text, excerpt
            )
        }
        None => profile.resume_text.clone(),
    }
}

impl CoverLetterEngine {
    pub const TEMPERATURE: f32 = 0.3;

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
        tailored_resume: Option<&str>,
    ) -> Result<String, TemplateError> {
        let ctx = PromptContext::new()
            .with_job(job)
            .with_profile(profile)
            .with("resume_text", resume_context(profile, tailored_resume));
        render(&self.template, &ctx)
    }

    pub async fn run(
        &self,
        job: &JobPosting,
        profile: &CandidateProfile,
        tailored_resume: Option<&str>,
    ) -> Result<GenerationResult, TemplateError> {
        let prompt = self.render_prompt(job, profile, tailored_resume)?;
        Ok(generate_text(
            self.llm.as_ref(),
            "generate_cover_letter",
            &prompt,
            Self::TEMPERATURE,
            fallback::COVER_LETTER_FALLBACK_MARKER,
        )
        .await)
    }
}
