//! 错误类型与恢复动作
//!
//! 每个边界一个错误枚举：模板、模型、响应解析、门户交互、输入校验；
//! AgentError 为编排层错误，只有它会让 ApplicationOutcome.success=false。

use thiserror::Error;

/// 模板结构错误（对当次调用是致命的）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Unclosed placeholder starting at byte {0}")]
    UnclosedPlaceholder(usize),

    #[error("Empty placeholder at byte {0}")]
    EmptyPlaceholder(usize),

    #[error("Invalid placeholder name '{name}' at byte {offset}")]
    InvalidName { name: String, offset: usize },
}

/// 模型调用错误；对生成引擎而言全部视为 ModelUnavailable 并本地回退
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    #[error("Model unavailable: {0}")]
    Unavailable(String),

    #[error("Model request timed out after {0}s")]
    Timeout(u64),

    #[error("Model returned empty content")]
    EmptyContent,
}

/// 结构化输出解析失败原因
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    #[error("Response is not JSON: {0}")]
    NotJson(String),

    #[error("Response is not a JSON array")]
    NotArray,

    #[error("Expected {expected} answers, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("Answer {index} is malformed: {reason}")]
    BadElement { index: usize, reason: String },
}

/// 门户交互错误（导航、超时、元素缺失、下载失败）；在门户引擎边界被转成结构化失败结果
#[derive(Error, Debug)]
pub enum PortalError {
    #[error("Browser launch failed: {0}")]
    Launch(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Timed out after {timeout_secs}s waiting for '{selector}'")]
    Timeout { selector: String, timeout_secs: u64 },

    #[error("Element not found: {0}")]
    MissingElement(String),

    #[error("Resume download failed: {0}")]
    Download(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Browser automation unsupported: {0}")]
    Unsupported(String),
}

/// 调用方或组件间传递的输入无法解析
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid input: {0}")]
pub struct ValidationError(pub String);

/// 编排层错误
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("JSON parse error: {0}")]
    JsonParseError(String),

    #[error("Iteration limit reached ({0}) without a final answer")]
    IterationLimit(usize),

    #[error("Worker pool closed")]
    PoolClosed,
}

/// 恢复引擎根据错误类型给出的建议动作
#[derive(Debug, Clone)]
pub enum RecoveryAction {
    /// 将提示注入下一轮，让 LLM 重试（如 JSON 格式错误）
    RetryWithPrompt(String),
    /// 终止当前任务
    Abort,
}
