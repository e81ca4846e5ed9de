//! 简历定制引擎（temperature 0.0）

use std::sync::Arc;

use crate::core::TemplateError;
use crate::generation::{fallback, generate_text};
use crate::llm::LlmClient;
use crate::prompt::{render, PromptContext};
use crate::types::{CandidateProfile, GenerationResult, JobPosting};

pub struct ResumeEngine {
    llm: Arc<dyn LlmClient>,
    template: String,
}

impl ResumeEngine {
    pub const TEMPERATURE: f32 = 0.0;

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
    ) -> Result<String, TemplateError> {
        let ctx = PromptContext::new().with_job(job).with_profile(profile);
        render(&self.template, &ctx)
    }

    pub async fn run(
        &self,
        job: &JobPosting,
        profile: &CandidateProfile,
    ) -> Result<GenerationResult, TemplateError> {
        let prompt = self.render_prompt(job, profile)?;
        Ok(generate_text(
            self.llm.as_ref(),
            "tailor_resume",
            &prompt,
            Self::TEMPERATURE,
            fallback::RESUME_FALLBACK_MARKER,
        )
        .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;
    use crate::prompt::RESUME_TEMPLATE;

    fn job() -> JobPosting {
        JobPosting {
            title: "Backend Engineer".into(),
            company: "Acme".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_model_text_is_result() {
        let llm = Arc::new(MockLlmClient::scripted(["  Seasoned backend engineer.  "]));
        let engine = ResumeEngine::new(llm.clone(), RESUME_TEMPLATE);
        let result = engine.run(&job(), &CandidateProfile::default()).await.unwrap();

        assert_eq!(result.text, "Seasoned backend engineer.");
        assert!(!result.is_fallback());
        let calls = llm.calls();
        assert_eq!(calls[0].temperature, 0.0);
        assert!(calls[0].prompt.contains("Backend Engineer"));
    }

    #[tokio::test]
    async fn test_unavailable_model_falls_back_to_marker() {
        let engine = ResumeEngine::new(Arc::new(MockLlmClient::unavailable()), RESUME_TEMPLATE);
        let result = engine.run(&job(), &CandidateProfile::default()).await.unwrap();

        assert!(result.is_fallback());
        assert!(result.text.starts_with("[mock-refined]"));
        assert!(result.text.contains("Acme"));
    }

    #[tokio::test]
    async fn test_broken_template_is_error() {
        let llm = Arc::new(MockLlmClient::scripted(["unused"]));
        let engine = ResumeEngine::new(llm.clone(), "{{ job.title");
        assert!(engine.run(&job(), &CandidateProfile::default()).await.is_err());
        assert_eq!(llm.call_count(), 0);
    }
}
