//! Apply Agent - 求职申请自动化
//!
//! 为一条职位 + 候选人资料生成定制简历、求职信与申请问题答案，
//! 并在存在外部门户时检查表单、完成提交。
//!
//! 模块划分：
//! - **agent**: 无头申请运行时（Apply / CoverLetter / Answer / AutoApply / 批量）
//! - **capabilities**: 能力注册表、前置条件与执行器
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误、恢复、编排器、构建器、工作池
//! - **generation**: 简历 / 求职信 / 问答三个生成引擎及本地回退
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Mock）
//! - **portal**: 外部申请门户的检查与提交
//! - **prompt**: 模板渲染与加载
//! - **react**: 能力选择循环（Planner、Trace）

pub mod agent;
pub mod capabilities;
pub mod config;
pub mod core;
pub mod generation;
pub mod llm;
pub mod observability;
pub mod portal;
pub mod prompt;
pub mod react;
pub mod types;

pub use agent::{ApplicationRequest, ApplyAgent, AutoApplyResponse};
pub use config::{load_config, AppConfig, OrchestrationMode};
pub use types::{ApplicationQuestion, CandidateProfile, JobPosting};
