//! Agent 构建器：统一的 ApplyAgent 初始化逻辑
//!
//! 默认按配置创建 LLM 客户端、浏览器后端与简历下载器；测试可逐项注入替身。

use std::sync::Arc;

use crate::agent::ApplyAgent;
use crate::config::{AppConfig, OrchestrationMode};
use crate::core::orchestrator::{
    create_llm_from_config, AgenticOrchestrator, Orchestrator, PipelineOrchestrator,
};
use crate::core::WorkerPool;
use crate::generation::GenerationEngines;
use crate::llm::LlmClient;
use crate::portal::{
    default_browser, HttpResumeFetcher, PortalAutomationEngine, PortalBrowser, ResumeFetcher,
};
use crate::prompt::{TemplateKind, TemplateLoader};

pub struct AgentBuilder {
    config: AppConfig,
    llm: Option<Arc<dyn LlmClient>>,
    browser: Option<Arc<dyn PortalBrowser>>,
    fetcher: Option<Arc<dyn ResumeFetcher>>,
}

impl AgentBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            llm: None,
            browser: None,
            fetcher: None,
        }
    }

    pub fn with_llm(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn with_browser(mut self, browser: Arc<dyn PortalBrowser>) -> Self {
        self.browser = Some(browser);
        self
    }

    pub fn with_resume_fetcher(mut self, fetcher: Arc<dyn ResumeFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// 覆盖配置中的编排模式
    pub fn with_mode(mut self, mode: OrchestrationMode) -> Self {
        self.config.orchestrator.mode = mode;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn build(self) -> ApplyAgent {
        let cfg = self.config;
        let llm = self.llm.unwrap_or_else(|| create_llm_from_config(&cfg));
        let browser = self.browser.unwrap_or_else(default_browser);
        let fetcher = self.fetcher.unwrap_or_else(|| {
            Arc::new(HttpResumeFetcher::new(cfg.portal.download_timeout_secs))
        });

        let templates = TemplateLoader::new(cfg.templates.clone());
        let engines = Arc::new(GenerationEngines::new(Arc::clone(&llm), &templates));
        let portal = Arc::new(PortalAutomationEngine::new(
            browser,
            fetcher,
            cfg.portal.clone(),
        ));

        let orchestrator = Orchestrator::new(
            cfg.orchestrator.mode,
            PipelineOrchestrator::new(Arc::clone(&engines)),
            AgenticOrchestrator::new(
                Arc::clone(&engines),
                portal,
                llm,
                templates.load(TemplateKind::AgentSystem),
                cfg.orchestrator.clone(),
            ),
        );
        tracing::info!(
            mode = ?cfg.orchestrator.mode,
            max_workers = cfg.service.max_workers,
            "apply agent ready"
        );

        ApplyAgent::new(engines, orchestrator, WorkerPool::new(cfg.service.max_workers))
    }
}
