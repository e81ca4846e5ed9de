//! PortalSession：单次调用内的门户状态机
//!
//! Idle → Inspected → Submitted；提交失败进入 Failed。Submitted / Failed 为终态，
//! 之后的 inspect / submit 不再触碰浏览器，直接返回失败结果。
//! inspect 失败时状态保持不变（调用方可选择直接提交）。

use std::sync::Arc;

use crate::portal::engine::{PortalAutomationEngine, SubmissionRequest};
use crate::portal::{PortalRequirements, SubmissionResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalState {
    Idle,
    Inspected,
    Submitted,
    Failed,
}

impl PortalState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PortalState::Submitted | PortalState::Failed)
    }
}

pub struct PortalSession {
    engine: Arc<PortalAutomationEngine>,
    portal_url: String,
    state: PortalState,
    requirements: Option<PortalRequirements>,
}

impl PortalSession {
    pub fn new(engine: Arc<PortalAutomationEngine>, portal_url: impl Into<String>) -> Self {
        Self {
            engine,
            portal_url: portal_url.into(),
            state: PortalState::Idle,
            requirements: None,
        }
    }

    pub fn state(&self) -> PortalState {
        self.state
    }

    pub fn portal_url(&self) -> &str {
        &self.portal_url
    }

    /// 最近一次成功 inspect 的结果
    pub fn requirements(&self) -> Option<&PortalRequirements> {
        self.requirements.as_ref()
    }

    pub async fn inspect(&mut self) -> PortalRequirements {
        if self.state.is_terminal() {
            return PortalRequirements::failed(format!(
                "Inspection failed: portal session already {:?}",
                self.state
            ));
        }
        let requirements = self.engine.inspect(&self.portal_url).await;
        if requirements.success {
            self.state = PortalState::Inspected;
            self.requirements = Some(requirements.clone());
        }
        requirements
    }

    pub async fn submit(&mut self, request: &SubmissionRequest<'_>) -> SubmissionResult {
        if self.state.is_terminal() {
            return SubmissionResult::failed(format!(
                "External apply failed: portal session already {:?}",
                self.state
            ));
        }
        let result = self.engine.submit(&self.portal_url, request).await;
        self.state = if result.success {
            PortalState::Submitted
        } else {
            PortalState::Failed
        };
        tracing::info!(state = ?self.state, "portal session");
        result
    }
}
