//! 能力执行器
//!
//! 每次调用新建一个，绑定本次的职位、候选人、问题与门户会话；
//! execute(capability, args) 分发到生成引擎或门户引擎，并输出结构化审计日志（JSON）。

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use crate::capabilities::{exposed, Capability, InvocationFacts};
use crate::core::{AgentError, ValidationError};
use crate::generation::{strip_code_fence, GenerationEngines};
use crate::portal::{
    PortalAutomationEngine, PortalRequirements, PortalSession, SubmissionRequest,
    SubmissionResult,
};
use crate::types::{
    Answer, ApplicationQuestion, CandidateProfile, FallbackReason, GenerationResult, JobPosting,
};

/// 能力结果：回传给规划模型的文本及其来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityOutput {
    pub text: String,
    pub fallback: Option<FallbackReason>,
}

impl From<GenerationResult> for CapabilityOutput {
    fn from(r: GenerationResult) -> Self {
        Self {
            text: r.text,
            fallback: r.fallback,
        }
    }
}

impl CapabilityOutput {
    fn json<T: serde::Serialize>(value: &T) -> Self {
        Self {
            text: serde_json::to_string(value).unwrap_or_default(),
            fallback: None,
        }
    }
}

pub struct CapabilityExecutor<'a> {
    engines: &'a GenerationEngines,
    job: &'a JobPosting,
    profile: &'a CandidateProfile,
    questions: &'a [ApplicationQuestion],
    portal: Option<PortalSession>,
    facts: InvocationFacts,
    exposed: Vec<Capability>,
}

impl<'a> CapabilityExecutor<'a> {
    pub fn new(
        engines: &'a GenerationEngines,
        portal_engine: Arc<PortalAutomationEngine>,
        job: &'a JobPosting,
        profile: &'a CandidateProfile,
        questions: &'a [ApplicationQuestion],
    ) -> Self {
        let portal = job
            .portal_url()
            .map(|url| PortalSession::new(portal_engine, url));
        let facts = InvocationFacts {
            has_portal: portal.is_some(),
            has_questions: !questions.is_empty(),
        };
        Self {
            engines,
            job,
            profile,
            questions,
            portal,
            facts,
            exposed: exposed(facts),
        }
    }

    pub fn facts(&self) -> InvocationFacts {
        self.facts
    }

    pub fn exposed(&self) -> &[Capability] {
        &self.exposed
    }

    pub fn is_exposed(&self, capability: Capability) -> bool {
        self.exposed.contains(&capability)
    }

    pub fn portal(&self) -> Option<&PortalSession> {
        self.portal.as_ref()
    }

    /// 执行能力；只有模板错误会返回 Err
    pub async fn execute(
        &mut self,
        capability: Capability,
        args: &Value,
    ) -> Result<CapabilityOutput, AgentError> {
        let start = Instant::now();
        let result = self.dispatch(capability, args).await;

        let audit = serde_json::json!({
            "event": "capability_audit",
            "capability": capability.name(),
            "ok": result.is_ok(),
            "fallback": result
                .as_ref()
                .ok()
                .and_then(|o| o.fallback.as_ref())
                .map(|f| f.to_string()),
            "duration_ms": start.elapsed().as_millis() as u64,
            "args_preview": args_preview(args),
        });
        tracing::info!(audit = %audit, "capability");

        result
    }

    async fn dispatch(
        &mut self,
        capability: Capability,
        args: &Value,
    ) -> Result<CapabilityOutput, AgentError> {
        match capability {
            Capability::TailorResume => {
                let result = self.engines.resume.run(self.job, self.profile).await?;
                Ok(result.into())
            }
            Capability::GenerateCoverLetter => {
                let tailored = args.get("tailored_resume").and_then(Value::as_str);
                let result = self
                    .engines
                    .cover_letter
                    .run(self.job, self.profile, tailored)
                    .await?;
                Ok(result.into())
            }
            Capability::AnswerQuestions => {
                let set = self
                    .engines
                    .questions
                    .run(self.job, self.profile, self.questions)
                    .await?;
                Ok(CapabilityOutput {
                    text: serde_json::to_string(&set.answers).unwrap_or_else(|_| "[]".into()),
                    fallback: set.fallback,
                })
            }
            Capability::InspectPortal => {
                let requirements = match self.portal.as_mut() {
                    Some(session) => session.inspect().await,
                    None => PortalRequirements::failed("Inspection failed: no external portal"),
                };
                Ok(CapabilityOutput::json(&requirements))
            }
            Capability::SubmitPortal => Ok(CapabilityOutput::json(&self.submit(args).await)),
        }
    }

    async fn submit(&mut self, args: &Value) -> SubmissionResult {
        let answers = match answers_from_arg(args.get("answers")) {
            Ok(answers) => answers,
            Err(e) => return SubmissionResult::failed(format!("Invalid JSON input: {}", e.0)),
        };
        let cover_letter = args
            .get("cover_letter")
            .and_then(Value::as_str)
            .unwrap_or("");
        let resume_ref = args
            .get("resume_url")
            .and_then(Value::as_str)
            .filter(|r| !r.trim().is_empty())
            .unwrap_or(&self.profile.resume_ref);

        match self.portal.as_mut() {
            Some(session) => {
                session
                    .submit(&SubmissionRequest {
                        profile: self.profile,
                        cover_letter,
                        answers: &answers,
                        resume_ref,
                    })
                    .await
            }
            None => SubmissionResult::failed("External apply failed: no external portal"),
        }
    }
}

/// 解析 submit 的 answers 参数：数组，或内容为 JSON 数组的字符串
pub fn answers_from_arg(value: Option<&Value>) -> Result<Vec<Answer>, ValidationError> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(Vec::new()),
        Some(Value::String(s)) => {
            let parsed: Value = serde_json::from_str(strip_code_fence(s))
                .map_err(|e| ValidationError(e.to_string()))?;
            answers_from_value(&parsed)
        }
        Some(other) => answers_from_value(other),
    }
}

fn answers_from_value(value: &Value) -> Result<Vec<Answer>, ValidationError> {
    let items = value
        .as_array()
        .ok_or_else(|| ValidationError("answers must be a JSON array".to_string()))?;
    Ok(items
        .iter()
        .filter_map(Value::as_object)
        .map(|obj| Answer {
            question: obj
                .get("question")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            answer: match obj.get("answer") {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            },
        })
        .collect())
}

fn args_preview(args: &Value) -> String {
    let s = args.to_string();
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PortalSection;
    use crate::llm::MockLlmClient;
    use crate::portal::{MockBrowser, MockPortal, PortalState, StaticResumeFetcher};
    use crate::prompt::TemplateLoader;
    use serde_json::json;

    fn portal_engine(browser: &MockBrowser) -> Arc<PortalAutomationEngine> {
        Arc::new(PortalAutomationEngine::new(
            Arc::new(browser.clone()),
            Arc::new(StaticResumeFetcher::new(b"pdf".to_vec())),
            PortalSection::default(),
        ))
    }

    #[test]
    fn test_answers_arg_forms() {
        let array = json!([{"question": "Q", "answer": "A"}]);
        assert_eq!(answers_from_arg(Some(&array)).unwrap()[0].answer, "A");

        let text = json!(r#"[{"question": "Q", "answer": true}]"#);
        assert_eq!(answers_from_arg(Some(&text)).unwrap()[0].answer, "true");

        assert!(answers_from_arg(None).unwrap().is_empty());
        assert!(answers_from_arg(Some(&json!("not json"))).is_err());
        assert!(answers_from_arg(Some(&json!({"q": 1}))).is_err());
    }

    #[tokio::test]
    async fn test_exposure_follows_job() {
        let llm = Arc::new(MockLlmClient::scripted(Vec::<String>::new()));
        let engines = GenerationEngines::new(llm, &TemplateLoader::default());
        let browser = MockBrowser::new(MockPortal::default());
        let job = JobPosting::default();
        let profile = CandidateProfile::default();

        let executor =
            CapabilityExecutor::new(&engines, portal_engine(&browser), &job, &profile, &[]);
        assert_eq!(
            executor.exposed(),
            &[Capability::TailorResume, Capability::GenerateCoverLetter]
        );
        assert!(executor.portal().is_none());
    }

    #[tokio::test]
    async fn test_invalid_answers_string_does_not_touch_portal() {
        let llm = Arc::new(MockLlmClient::scripted(Vec::<String>::new()));
        let engines = GenerationEngines::new(llm, &TemplateLoader::default());
        let browser = MockBrowser::new(MockPortal::default());
        let job = JobPosting {
            external_url: Some("http://portal.local/apply".into()),
            ..Default::default()
        };
        let profile = CandidateProfile::default();
        let mut executor =
            CapabilityExecutor::new(&engines, portal_engine(&browser), &job, &profile, &[]);

        let out = executor
            .execute(Capability::SubmitPortal, &json!({"answers": "{{broken"}))
            .await
            .unwrap();
        let result: SubmissionResult = serde_json::from_str(&out.text).unwrap();
        assert!(!result.success);
        assert!(result.message.starts_with("Invalid JSON input:"));
        assert_eq!(browser.log().opened, 0);
        assert_eq!(executor.portal().map(|p| p.state()), Some(PortalState::Idle));
    }

    #[tokio::test]
    async fn test_cover_letter_uses_tailored_arg() {
        let llm = Arc::new(MockLlmClient::scripted(["Dear Hiring Manager"]));
        let engines = GenerationEngines::new(llm.clone(), &TemplateLoader::default());
        let browser = MockBrowser::new(MockPortal::default());
        let job = JobPosting::default();
        let profile = CandidateProfile::default();
        let mut executor =
            CapabilityExecutor::new(&engines, portal_engine(&browser), &job, &profile, &[]);

        let out = executor
            .execute(
                Capability::GenerateCoverLetter,
                &json!({"tailored_resume": "Rust expert"}),
            )
            .await
            .unwrap();
        assert_eq!(out.text, "Dear Hiring Manager");
        assert!(llm.calls()[0].prompt.contains("Rust expert"));
    }
}
