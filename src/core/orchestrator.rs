//! 申请编排：固定流水线与能力选择循环两种模式
//!
//! 模式由配置 orchestrator.mode 在部署时决定。两种模式都只在编排逻辑本身出错时
//! 返回 success=false，且保留已经得到的部分结果。
//! 能力选择模式下规划模型不可用时，轨迹中缺失的字段由固定流水线补齐（各引擎自带回退）。

use std::sync::Arc;

use crate::capabilities::CapabilityExecutor;
use crate::config::{AppConfig, OrchestrationMode, OrchestratorSection};
use crate::core::AgentError;
use crate::generation::GenerationEngines;
use crate::llm::{LlmClient, OpenAiClient};
use crate::portal::PortalAutomationEngine;
use crate::react::{
    reconstruct_outcome, render_system_prompt, task_description, CapabilitySelectionLoop, Planner,
};
use crate::types::{
    ApplicationOutcome, ApplicationQuestion, CandidateProfile, Generated, JobPosting,
};

/// 按配置创建 OpenAI 兼容客户端
pub(crate) fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    tracing::info!(
        base_url = %cfg.llm.base_url,
        model = %cfg.llm.model,
        "Using OpenAI-compatible LLM"
    );
    Arc::new(OpenAiClient::from_config(&cfg.llm))
}

/// 固定三步：简历 → 求职信 → 问答（有问题时）
pub struct PipelineOrchestrator {
    engines: Arc<GenerationEngines>,
}

impl PipelineOrchestrator {
    pub fn new(engines: Arc<GenerationEngines>) -> Self {
        Self { engines }
    }

    pub async fn run(
        &self,
        job: &JobPosting,
        profile: &CandidateProfile,
        questions: &[ApplicationQuestion],
    ) -> ApplicationOutcome {
        let mut outcome = ApplicationOutcome::default();
        match self.steps(job, profile, questions, &mut outcome).await {
            Ok(()) => {
                outcome.success = true;
                outcome.message = "Application completed successfully".to_string();
            }
            Err(e) => {
                tracing::error!(error = %e, "Orchestration failed");
                outcome.success = false;
                outcome.message = "Orchestration failed".to_string();
            }
        }
        outcome
    }

    /// 依次补齐 outcome 中缺失的字段；已有的结果不重新生成
    pub(crate) async fn steps(
        &self,
        job: &JobPosting,
        profile: &CandidateProfile,
        questions: &[ApplicationQuestion],
        outcome: &mut ApplicationOutcome,
    ) -> Result<(), AgentError> {
        if outcome.resume.is_none() {
            tracing::info!("Step 1/3: tailoring resume");
            outcome.resume = Some(self.engines.resume.run(job, profile).await?);
        }

        // 只把模型生成的简历交给求职信；回退文本是 prompt 回显，不作为上下文
        let tailored = match outcome.resume.clone().map(Generated::from) {
            Some(Generated::Ok(text)) => Some(text),
            Some(Generated::Degraded { reason, .. }) => {
                tracing::warn!(%reason, "resume degraded, not forwarded to cover letter");
                None
            }
            Some(Generated::Failed(_)) | None => None,
        };

        if outcome.cover_letter.is_none() {
            tracing::info!("Step 2/3: generating cover letter");
            let cover_letter = self
                .engines
                .cover_letter
                .run(job, profile, tailored.as_deref())
                .await?;
            outcome.cover_letter = Some(cover_letter);
        }

        if questions.is_empty() {
            tracing::info!("Step 3/3: skipped (no questions)");
        } else if outcome.answers.is_empty() {
            tracing::info!(questions = questions.len(), "Step 3/3: answering questions");
            let set = self.engines.questions.run(job, profile, questions).await?;
            outcome.answers = set.answers;
            outcome.answers_fallback = set.fallback;
        }
        Ok(())
    }
}

/// 能力选择模式：每次调用新建执行器、Planner 与轨迹
pub struct AgenticOrchestrator {
    engines: Arc<GenerationEngines>,
    /// 规划模型不可用时补齐剩余字段
    fallback: PipelineOrchestrator,
    portal: Arc<PortalAutomationEngine>,
    llm: Arc<dyn LlmClient>,
    system_template: String,
    settings: OrchestratorSection,
}

impl AgenticOrchestrator {
    pub fn new(
        engines: Arc<GenerationEngines>,
        portal: Arc<PortalAutomationEngine>,
        llm: Arc<dyn LlmClient>,
        system_template: impl Into<String>,
        settings: OrchestratorSection,
    ) -> Self {
        Self {
            fallback: PipelineOrchestrator::new(Arc::clone(&engines)),
            engines,
            portal,
            llm,
            system_template: system_template.into(),
            settings,
        }
    }

    pub async fn run(
        &self,
        job: &JobPosting,
        profile: &CandidateProfile,
        questions: &[ApplicationQuestion],
    ) -> ApplicationOutcome {
        let mut executor = CapabilityExecutor::new(
            &self.engines,
            Arc::clone(&self.portal),
            job,
            profile,
            questions,
        );
        tracing::info!(
            title = %job.title,
            company = %job.company,
            capabilities = executor.exposed().len(),
            "starting agentic application processing"
        );

        let mut trace = Vec::new();
        let result = self
            .drive(&mut executor, job, profile, questions, &mut trace)
            .await;

        let mut outcome = ApplicationOutcome::default();
        reconstruct_outcome(&trace, &mut outcome);
        match result {
            Ok(summary) => {
                outcome.success = true;
                outcome.message = "Application processed successfully by agent".to_string();
                outcome.reasoning = Some(summary);
            }
            Err(AgentError::Llm(e)) => {
                tracing::warn!(error = %e, "planner unavailable, completing with fixed pipeline");
                match self
                    .fallback
                    .steps(job, profile, questions, &mut outcome)
                    .await
                {
                    Ok(()) => {
                        outcome.success = true;
                        outcome.message = format!(
                            "Application completed by fixed pipeline (agent planner unavailable: {e})"
                        );
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "agentic orchestration failed");
                        outcome.success = false;
                        outcome.message = format!("Agentic orchestration failed: {err}");
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "agentic orchestration failed");
                outcome.success = false;
                outcome.message = format!("Agentic orchestration failed: {e}");
            }
        }
        outcome.trace = trace;
        outcome
    }

    async fn drive(
        &self,
        executor: &mut CapabilityExecutor<'_>,
        job: &JobPosting,
        profile: &CandidateProfile,
        questions: &[ApplicationQuestion],
        trace: &mut Vec<crate::react::TraceEntry>,
    ) -> Result<String, AgentError> {
        let system = render_system_prompt(&self.system_template, executor.exposed())?;
        let planner = Planner::new(
            Arc::clone(&self.llm),
            system,
            self.settings.planner_temperature,
        );
        let agent = CapabilitySelectionLoop::new(planner, self.settings.max_iterations);
        let task = task_description(job, profile, questions, executor);
        agent.run(executor, &task, trace).await
    }
}

/// 按部署模式分派
pub struct Orchestrator {
    mode: OrchestrationMode,
    pipeline: PipelineOrchestrator,
    agentic: AgenticOrchestrator,
}

impl Orchestrator {
    pub fn new(
        mode: OrchestrationMode,
        pipeline: PipelineOrchestrator,
        agentic: AgenticOrchestrator,
    ) -> Self {
        Self {
            mode,
            pipeline,
            agentic,
        }
    }

    pub fn mode(&self) -> OrchestrationMode {
        self.mode
    }

    pub async fn process(
        &self,
        job: &JobPosting,
        profile: &CandidateProfile,
        questions: &[ApplicationQuestion],
    ) -> ApplicationOutcome {
        match self.mode {
            OrchestrationMode::Pipeline => self.pipeline.run(job, profile, questions).await,
            OrchestrationMode::Agentic => self.agentic.run(job, profile, questions).await,
        }
    }
}
