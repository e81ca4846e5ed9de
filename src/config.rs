//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `APPLY__*` 覆盖（双下划线表示嵌套，如 `APPLY__LLM__MODEL=llama3.2`）。
//! 进程启动时构建一次，之后以不可变值传入各组件，调用过程中不再读取环境变量。

use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;

/// 应用配置根
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmSection,
    pub templates: TemplatesSection,
    pub portal: PortalSection,
    pub orchestrator: OrchestratorSection,
    pub service: ServiceSection,
}

/// [llm] 段：OpenAI 兼容端点与默认模型
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// 端点地址（Ollama 为 http://localhost:11434/v1）
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            model: "llama3.2".to_string(),
            api_key: None,
            request_timeout_secs: 120,
        }
    }
}

/// [templates] 段：各链路的模板覆盖文件；不存在时使用内置默认模板
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TemplatesSection {
    pub resume: Option<PathBuf>,
    pub cover_letter: Option<PathBuf>,
    pub question_answering: Option<PathBuf>,
    pub agent_system: Option<PathBuf>,
}

/// [portal] 段：简历相对地址的解析基址与各等待超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PortalSection {
    pub resume_base_url: String,
    pub form_timeout_secs: u64,
    pub success_timeout_secs: u64,
    pub download_timeout_secs: u64,
}

impl Default for PortalSection {
    fn default() -> Self {
        Self {
            resume_base_url: "http://localhost:5001".to_string(),
            form_timeout_secs: 15,
            success_timeout_secs: 20,
            download_timeout_secs: 30,
        }
    }
}

/// 编排模式：部署时选择，不随单次请求变化
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrchestrationMode {
    /// 固定三步流水线
    Pipeline,
    /// 自主能力选择循环
    #[default]
    Agentic,
}

impl FromStr for OrchestrationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pipeline" | "deterministic" => Ok(Self::Pipeline),
            "agentic" | "agent" => Ok(Self::Agentic),
            other => Err(format!("unknown orchestration mode: {other}")),
        }
    }
}

/// [orchestrator] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrchestratorSection {
    pub mode: OrchestrationMode,
    /// 能力选择循环的最大轮数，达到即视为失败
    pub max_iterations: usize,
    pub planner_temperature: f32,
}

impl Default for OrchestratorSection {
    fn default() -> Self {
        Self {
            mode: OrchestrationMode::default(),
            max_iterations: 12,
            planner_temperature: 0.1,
        }
    }
}

/// [service] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceSection {
    /// 同时处理的申请上限
    pub max_workers: usize,
}

impl Default for ServiceSection {
    fn default() -> Self {
        Self { max_workers: 10 }
    }
}

/// 从 config 目录加载配置，环境变量 APPLY__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 APPLY__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    for name in ["config/default", "../config/default"] {
        if std::path::Path::new(&format!("{name}.toml")).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("APPLY")
            .separator("__")
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}
