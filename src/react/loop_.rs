//! 能力选择主循环
//!
//! Plan -> 调用能力 -> 回写 Observation -> 下一轮 Plan，直到模型给出纯文本总结；
//! JSON 格式错误经 RecoveryEngine 注入纠正提示后重试（计入轮数），达到 max_iterations 视为失败。
//! 轨迹写入调用方传入的 Vec，出错时已有条目保留。

use serde_json::json;

use crate::capabilities::{
    capability_call_schema_json, requirement, Capability, CapabilityExecutor, Requirement,
};
use crate::core::{AgentError, RecoveryAction, RecoveryEngine};
use crate::llm::Message;
use crate::prompt::{render, PromptContext};
use crate::react::{parse_llm_output, Planner, PlannerOutput, TraceEntry};
use crate::types::{ApplicationQuestion, CandidateProfile, JobPosting};

/// Observation 日志预览最大字符数
const OBSERVATION_PREVIEW_CHARS: usize = 200;

pub struct CapabilitySelectionLoop {
    planner: Planner,
    recovery: RecoveryEngine,
    max_iterations: usize,
}

/// system prompt 中的能力清单：名称、描述、参数 schema
pub fn describe_capabilities(capabilities: &[Capability]) -> String {
    capabilities
        .iter()
        .map(|c| {
            format!(
                "- {}: {}\n  args schema: {}",
                c.name(),
                c.spec().description,
                c.input_schema()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// 渲染 agent system prompt
pub fn render_system_prompt(
    template: &str,
    capabilities: &[Capability],
) -> Result<String, AgentError> {
    let ctx = PromptContext::new()
        .with("capabilities", describe_capabilities(capabilities))
        .with("call_schema", capability_call_schema_json());
    Ok(render(template, &ctx)?)
}

/// 任务描述：职位 / 候选人 / 问题摘要，加上按前置条件表生成的任务清单
pub fn task_description(
    job: &JobPosting,
    profile: &CandidateProfile,
    questions: &[ApplicationQuestion],
    executor: &CapabilityExecutor<'_>,
) -> String {
    let facts = executor.facts();
    let or_unknown = |s: &str| {
        if s.trim().is_empty() {
            "Unknown".to_string()
        } else {
            s.to_string()
        }
    };

    let mut tasks = Vec::new();
    for capability in Capability::ALL {
        let line = match requirement(capability, facts) {
            Requirement::Mandatory => format!("{} (REQUIRED)", capability.name()),
            Requirement::Conditional(when) => {
                format!("{} (CONDITIONAL: {when})", capability.name())
            }
            Requirement::NotExposed => continue,
        };
        tasks.push(format!("{}. {line}", tasks.len() + 1));
    }
    if !facts.has_questions {
        tasks.push("Skip questions (none provided)".to_string());
    }

    let portal = job
        .portal_url()
        .map(|u| format!("External application portal: {u}"))
        .unwrap_or_else(|| "External application portal: none".to_string());

    format!(
        "Process a job application for the following:\n\n\
         Job Title: {title}\n\
         Company: {company}\n\
         Candidate: {candidate}\n\
         {portal}\n\n\
         Job Information (JSON): {job_json}\n\
         Profile Information (JSON): {profile_json}\n\
         Questions (JSON): {questions_json}\n\n\
         Tasks to complete:\n{tasks}\n\n\
         Order: tailor the resume first. If there is an external portal, inspect it before deciding \
         whether the cover letter and answers are needed, and submit to it last, exactly once.\n\n\
         Return a final summary of what was generated.",
        title = or_unknown(&job.title),
        company = or_unknown(&job.company),
        candidate = or_unknown(&profile.name),
        job_json = json!(job),
        profile_json = json!(profile),
        questions_json = json!(questions),
        tasks = tasks.join("\n"),
    )
}

impl CapabilitySelectionLoop {
    pub fn new(planner: Planner, max_iterations: usize) -> Self {
        Self {
            planner,
            recovery: RecoveryEngine::new(),
            max_iterations: max_iterations.max(1),
        }
    }

    pub fn planner(&self) -> &Planner {
        &self.planner
    }

    /// 运行循环，返回模型的最终总结
    pub async fn run(
        &self,
        executor: &mut CapabilityExecutor<'_>,
        task: &str,
        trace: &mut Vec<TraceEntry>,
    ) -> Result<String, AgentError> {
        let mut messages = vec![Message::user(task)];
        let mut call_seq = 0usize;

        for step in 0..self.max_iterations {
            tracing::debug!(step, max_steps = self.max_iterations, "planning");
            let output = match self.planner.plan(&messages).await {
                Ok(output) => output,
                Err(e) => {
                    tracing::warn!(error = %e, "planner call failed");
                    return Err(e);
                }
            };

            match parse_llm_output(&output) {
                Ok(PlannerOutput::Response(summary)) => {
                    trace.push(TraceEntry::thought(summary.clone()));
                    tracing::info!(steps = step + 1, calls = call_seq, "agent finished");
                    return Ok(summary);
                }
                Ok(PlannerOutput::Call(call)) => {
                    messages.push(Message::assistant(output.clone()));
                    let capability = Capability::from_name(&call.capability)
                        .filter(|c| executor.is_exposed(*c));
                    let Some(capability) = capability else {
                        tracing::warn!(
                            capability = %call.capability,
                            "unavailable capability requested"
                        );
                        trace.push(TraceEntry::thought(format!(
                            "Requested unavailable capability '{}'",
                            call.capability
                        )));
                        let available: Vec<&str> =
                            executor.exposed().iter().map(|c| c.name()).collect();
                        messages.push(Message::user(format!(
                            "Observation: error: capability '{}' is not available. Available capabilities: {}",
                            call.capability,
                            available.join(", ")
                        )));
                        continue;
                    };

                    call_seq += 1;
                    let id = format!("call-{call_seq}");
                    trace.push(TraceEntry::CapabilityCall {
                        id: id.clone(),
                        capability,
                        args: call.args.clone(),
                    });

                    let observation = executor.execute(capability, &call.args).await?;
                    let preview: String = observation
                        .text
                        .chars()
                        .take(OBSERVATION_PREVIEW_CHARS)
                        .collect();
                    tracing::info!(
                        capability = %capability,
                        id = %id,
                        preview = %preview,
                        "observation"
                    );

                    messages.push(Message::user(format!(
                        "Observation from {capability} ({id}):\n{}",
                        observation.text
                    )));
                    trace.push(TraceEntry::CapabilityResult {
                        id,
                        text: observation.text,
                        fallback: observation.fallback,
                    });
                }
                Err(e) => match self.recovery.handle(&e) {
                    RecoveryAction::RetryWithPrompt(prompt) => {
                        tracing::warn!(error = %e, "malformed capability call, retrying");
                        messages.push(Message::assistant(output));
                        messages.push(Message::user(prompt));
                    }
                    RecoveryAction::Abort => return Err(e),
                },
            }
        }

        Err(AgentError::IterationLimit(self.max_iterations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::PortalSection;
    use crate::generation::GenerationEngines;
    use crate::llm::MockLlmClient;
    use crate::portal::{MockBrowser, MockPortal, PortalAutomationEngine, StaticResumeFetcher};
    use crate::prompt::{TemplateLoader, AGENT_SYSTEM_TEMPLATE};

    fn portal_engine() -> Arc<PortalAutomationEngine> {
        Arc::new(PortalAutomationEngine::new(
            Arc::new(MockBrowser::new(MockPortal::default())),
            Arc::new(StaticResumeFetcher::new(Vec::new())),
            PortalSection::default(),
        ))
    }

    fn job() -> JobPosting {
        JobPosting {
            title: "Backend Engineer".into(),
            company: "Acme".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_task_description_lists_required_capabilities() {
        let engines = GenerationEngines::new(
            Arc::new(MockLlmClient::unavailable()),
            &TemplateLoader::default(),
        );
        let job = job();
        let profile = CandidateProfile::default();
        let executor = CapabilityExecutor::new(&engines, portal_engine(), &job, &profile, &[]);

        let task = task_description(&job, &profile, &[], &executor);
        assert!(task.contains("Job Title: Backend Engineer"));
        assert!(task.contains("1. tailor_resume (REQUIRED)"));
        assert!(task.contains("2. generate_cover_letter (REQUIRED)"));
        assert!(task.contains("Skip questions (none provided)"));
        assert!(!task.contains("submit_external_application"));
    }

    #[test]
    fn test_system_prompt_renders_capabilities() {
        let prompt =
            render_system_prompt(AGENT_SYSTEM_TEMPLATE, &[Capability::TailorResume]).unwrap();
        assert!(prompt.contains("- tailor_resume:"));
        assert!(prompt.contains("\"capability\""));
    }

    #[tokio::test]
    async fn test_loop_runs_calls_then_finishes() {
        // planner 与生成引擎共用同一脚本
        let llm = Arc::new(MockLlmClient::scripted([
            r#"{"capability": "tailor_resume", "args": {}}"#,
            "Tailored resume text",
            "not json {\"capability\": oops}",
            r#"{"capability": "delete_account", "args": {}}"#,
            "All done: resume tailored.",
        ]));
        let engines = GenerationEngines::new(llm.clone(), &TemplateLoader::default());
        let job = job();
        let profile = CandidateProfile::default();
        let mut executor = CapabilityExecutor::new(&engines, portal_engine(), &job, &profile, &[]);

        let agent = CapabilitySelectionLoop::new(Planner::new(llm.clone(), "system", 0.1), 8);
        let mut trace = Vec::new();
        let summary = agent.run(&mut executor, "task", &mut trace).await.unwrap();

        assert_eq!(summary, "All done: resume tailored.");
        assert_eq!(trace.len(), 4);
        assert!(matches!(
            &trace[0],
            TraceEntry::CapabilityCall { capability: Capability::TailorResume, .. }
        ));
        assert!(matches!(
            &trace[1],
            TraceEntry::CapabilityResult { text, .. } if text == "Tailored resume text"
        ));
        assert!(matches!(
            &trace[2],
            TraceEntry::Thought { text } if text.contains("delete_account")
        ));

        // 第三次规划时对话里应有纠正提示
        let calls = llm.calls();
        assert_eq!(calls[0].temperature, 0.1);
        assert!(calls[3].prompt.contains("not valid JSON"));
    }

    #[tokio::test]
    async fn test_iteration_limit() {
        let llm = Arc::new(MockLlmClient::scripted([
            r#"{"capability": "nope"}"#,
            r#"{"capability": "nope"}"#,
        ]));
        let engines = GenerationEngines::new(llm.clone(), &TemplateLoader::default());
        let job = job();
        let profile = CandidateProfile::default();
        let mut executor = CapabilityExecutor::new(&engines, portal_engine(), &job, &profile, &[]);

        let agent = CapabilitySelectionLoop::new(Planner::new(llm, "system", 0.1), 2);
        let mut trace = Vec::new();
        let err = agent.run(&mut executor, "task", &mut trace).await.unwrap_err();
        assert!(matches!(err, AgentError::IterationLimit(2)));
        assert_eq!(trace.len(), 2);
    }

    #[tokio::test]
    async fn test_planner_unavailable_is_error() {
        let llm = Arc::new(MockLlmClient::unavailable());
        let engines = GenerationEngines::new(llm.clone(), &TemplateLoader::default());
        let job = job();
        let profile = CandidateProfile::default();
        let mut executor = CapabilityExecutor::new(&engines, portal_engine(), &job, &profile, &[]);

        let agent = CapabilitySelectionLoop::new(Planner::new(llm, "system", 0.1), 4);
        let mut trace = Vec::new();
        let err = agent.run(&mut executor, "task", &mut trace).await.unwrap_err();
        assert!(matches!(err, AgentError::Llm(_)));
    }
}
