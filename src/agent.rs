//! Headless 申请运行时
//!
//! 对外的四个逻辑操作：Apply、GenerateCoverLetter、AnswerQuestions、AutoApply，
//! 以及经 WorkerPool 限流的批量 AutoApply。请求 / 响应均可序列化，供 CLI 或其它传输层使用。

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::core::{AgentBuilder, Orchestrator, WorkerPool};
use crate::generation::GenerationEngines;
use crate::portal::SubmissionResult;
use crate::react::TraceEntry;
use crate::types::{
    Answer, ApplicationOutcome, ApplicationQuestion, CandidateProfile, FallbackReason, JobPosting,
};

/// 一次请求的输入；Apply / GenerateCoverLetter 忽略 questions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationRequest {
    pub job: JobPosting,
    pub profile: CandidateProfile,
    pub questions: Vec<ApplicationQuestion>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyResponse {
    pub success: bool,
    pub message: String,
    pub application_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackReason>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverLetterResponse {
    pub success: bool,
    pub cover_letter: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackReason>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerQuestionsResponse {
    pub success: bool,
    pub answers: Vec<Answer>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackReason>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoApplyResponse {
    pub success: bool,
    pub message: String,
    pub resume: String,
    pub cover_letter: String,
    pub answers: Vec<Answer>,
    pub application_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portal_result: Option<SubmissionResult>,
    pub resume_fallback: bool,
    pub cover_letter_fallback: bool,
    pub answers_fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<TraceEntry>,
}

impl AutoApplyResponse {
    fn from_outcome(outcome: ApplicationOutcome, application_id: String) -> Self {
        Self {
            success: outcome.success,
            message: outcome.message.clone(),
            resume: outcome.resume_text().to_string(),
            cover_letter: outcome.cover_letter_text().to_string(),
            resume_fallback: outcome.resume.as_ref().is_some_and(|r| r.is_fallback()),
            cover_letter_fallback: outcome
                .cover_letter
                .as_ref()
                .is_some_and(|r| r.is_fallback()),
            answers_fallback: outcome.answers_fallback.is_some(),
            answers: outcome.answers,
            application_id,
            portal_result: outcome.portal_result,
            reasoning: outcome.reasoning,
            trace: outcome.trace,
        }
    }
}

/// `app-<unix 毫秒>`
pub fn new_application_id() -> String {
    format!("app-{}", chrono::Utc::now().timestamp_millis())
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.trim().is_empty() {
        default
    } else {
        value
    }
}

pub struct ApplyAgent {
    engines: Arc<GenerationEngines>,
    orchestrator: Orchestrator,
    pool: WorkerPool,
}

impl ApplyAgent {
    pub fn new(
        engines: Arc<GenerationEngines>,
        orchestrator: Orchestrator,
        pool: WorkerPool,
    ) -> Self {
        Self {
            engines,
            orchestrator,
            pool,
        }
    }

    pub fn builder(config: AppConfig) -> AgentBuilder {
        AgentBuilder::new(config)
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// 只做简历定制，并生成确认消息
    pub async fn apply(&self, job: &JobPosting, profile: &CandidateProfile) -> ApplyResponse {
        let application_id = new_application_id();
        tracing::info!(application_id = %application_id, title = %job.title, "apply");

        match self.engines.resume.run(job, profile).await {
            Ok(resume) => ApplyResponse {
                success: true,
                message: format!(
                    "{} applied to {}. Refined resume:\n{}",
                    or_default(&profile.name, "Applicant"),
                    or_default(&job.title, "Unknown role"),
                    resume.text
                ),
                application_id,
                fallback: resume.fallback,
            },
            Err(e) => {
                tracing::error!(error = %e, "apply failed");
                ApplyResponse {
                    success: false,
                    message: format!("Apply failed: {e}"),
                    application_id,
                    fallback: None,
                }
            }
        }
    }

    pub async fn generate_cover_letter(
        &self,
        job: &JobPosting,
        profile: &CandidateProfile,
    ) -> CoverLetterResponse {
        match self.engines.cover_letter.run(job, profile, None).await {
            Ok(letter) => CoverLetterResponse {
                success: true,
                cover_letter: letter.text,
                message: "Cover letter generated".to_string(),
                fallback: letter.fallback,
            },
            Err(e) => {
                tracing::error!(error = %e, "cover letter failed");
                CoverLetterResponse {
                    success: false,
                    cover_letter: String::new(),
                    message: format!("Cover letter generation failed: {e}"),
                    fallback: None,
                }
            }
        }
    }

    pub async fn answer_questions(
        &self,
        job: &JobPosting,
        profile: &CandidateProfile,
        questions: &[ApplicationQuestion],
    ) -> AnswerQuestionsResponse {
        match self.engines.questions.run(job, profile, questions).await {
            Ok(set) => AnswerQuestionsResponse {
                success: true,
                answers: set.answers,
                message: "Questions answered successfully".to_string(),
                fallback: set.fallback,
            },
            Err(e) => {
                tracing::error!(error = %e, "answering questions failed");
                AnswerQuestionsResponse {
                    success: false,
                    answers: Vec::new(),
                    message: format!("Answering questions failed: {e}"),
                    fallback: None,
                }
            }
        }
    }

    /// 完整申请：模式由部署配置决定；经工作池限流
    pub async fn auto_apply(
        &self,
        job: &JobPosting,
        profile: &CandidateProfile,
        questions: &[ApplicationQuestion],
    ) -> AutoApplyResponse {
        let application_id = new_application_id();
        tracing::info!(
            application_id = %application_id,
            title = %job.title,
            questions = questions.len(),
            mode = ?self.orchestrator.mode(),
            "auto apply"
        );

        let outcome = match self
            .pool
            .run(self.orchestrator.process(job, profile, questions))
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => ApplicationOutcome {
                message: format!("Orchestration failed: {e}"),
                ..Default::default()
            },
        };
        tracing::info!(
            application_id = %application_id,
            success = outcome.success,
            "auto apply completed"
        );
        AutoApplyResponse::from_outcome(outcome, application_id)
    }

    /// 批量 AutoApply：同时进行的数量受 max_workers 限制，结果与输入同序
    pub async fn auto_apply_batch(
        &self,
        requests: &[ApplicationRequest],
    ) -> Vec<AutoApplyResponse> {
        tracing::info!(count = requests.len(), workers = self.pool.size(), "batch auto apply");
        let jobs = requests
            .iter()
            .map(|req| self.auto_apply(&req.job, &req.profile, &req.questions));
        futures_util::future::join_all(jobs).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrchestrationMode;
    use crate::llm::MockLlmClient;
    use crate::portal::{MockBrowser, MockPortal};

    fn agent(llm: Arc<MockLlmClient>, mode: OrchestrationMode) -> ApplyAgent {
        ApplyAgent::builder(AppConfig::default())
            .with_llm(llm)
            .with_browser(Arc::new(MockBrowser::new(MockPortal::default())))
            .with_mode(mode)
            .build()
    }

    fn job() -> JobPosting {
        JobPosting {
            title: "Backend Engineer".into(),
            company: "Acme".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_apply_message() {
        let llm = Arc::new(MockLlmClient::scripted(["Tailored"]));
        let profile = CandidateProfile {
            name: "Ada".into(),
            ..Default::default()
        };
        let response = agent(llm, OrchestrationMode::Pipeline)
            .apply(&job(), &profile)
            .await;

        assert!(response.success);
        assert_eq!(
            response.message,
            "Ada applied to Backend Engineer. Refined resume:\nTailored"
        );
        assert!(response.application_id.starts_with("app-"));
    }

    #[tokio::test]
    async fn test_apply_defaults_names() {
        let llm = Arc::new(MockLlmClient::scripted(["Tailored"]));
        let response = agent(llm, OrchestrationMode::Pipeline)
            .apply(&JobPosting::default(), &CandidateProfile::default())
            .await;
        assert!(response
            .message
            .starts_with("Applicant applied to Unknown role."));
    }

    #[tokio::test]
    async fn test_cover_letter_and_answers_messages() {
        let llm = Arc::new(MockLlmClient::scripted([
            "Dear Hiring Manager",
            r#"[{"question": "Why Acme?", "answer": "Mission"}]"#,
        ]));
        let agent = agent(llm, OrchestrationMode::Pipeline);

        let letter = agent
            .generate_cover_letter(&job(), &CandidateProfile::default())
            .await;
        assert_eq!(letter.message, "Cover letter generated");
        assert_eq!(letter.cover_letter, "Dear Hiring Manager");

        let answers = agent
            .answer_questions(
                &job(),
                &CandidateProfile::default(),
                &[ApplicationQuestion::text("Why Acme?")],
            )
            .await;
        assert_eq!(answers.message, "Questions answered successfully");
        assert_eq!(answers.answers[0].answer, "Mission");
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let llm = Arc::new(MockLlmClient::unavailable());
        let agent = agent(llm, OrchestrationMode::Pipeline);
        let requests: Vec<ApplicationRequest> = ["A", "B", "C"]
            .iter()
            .map(|title| ApplicationRequest {
                job: JobPosting {
                    title: title.to_string(),
                    ..Default::default()
                },
                ..Default::default()
            })
            .collect();

        let responses = agent.auto_apply_batch(&requests).await;
        assert_eq!(responses.len(), 3);
        assert!(responses.iter().all(|r| r.success && r.resume_fallback));
        assert!(responses[1].resume.contains("B"));
    }
}
