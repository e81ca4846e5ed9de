//! 核心编排层：错误与恢复、编排器、构建器、工作池

pub mod builder;
pub mod error;
pub mod orchestrator;
pub mod recovery;
pub mod worker_pool;

pub use builder::AgentBuilder;
pub use error::{
    AgentError, LlmError, ParseFailure, PortalError, RecoveryAction, TemplateError,
    ValidationError,
};
pub use orchestrator::{AgenticOrchestrator, Orchestrator, PipelineOrchestrator};
pub use recovery::RecoveryEngine;
pub use worker_pool::WorkerPool;
