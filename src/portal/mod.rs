//! 外部申请门户自动化
//!
//! inspect：打开浏览器会话，读取表单必填项与问题字段；
//! submit：准备本地简历文件、填写表单、提交并等待成功标识。
//! 两者都把所有失败转成结构化结果返回，浏览器会话与临时文件在每条退出路径上释放。

pub mod browser;
#[cfg(feature = "browser")]
pub mod chrome;
pub mod engine;
pub mod mock;
pub mod resume;
pub mod session;

use serde::{Deserialize, Serialize};

pub use browser::{default_browser, PortalBrowser, PortalPage, QuestionField, UnavailableBrowser};
pub use engine::{PortalAutomationEngine, SubmissionRequest};
pub use mock::{MockBrowser, MockPortal, MockPortalLog};
pub use resume::{HttpResumeFetcher, LocalResume, ResumeFetcher, ResumeRef, StaticResumeFetcher};
pub use session::{PortalSession, PortalState};

/// 门户表单字段约定
pub mod selectors {
    pub const FORM: &str = "#application-form";
    pub const FULL_NAME: &str = "#fullName";
    pub const EMAIL: &str = "#email";
    pub const COVER_LETTER: &str = "#coverLetter";
    pub const COVER_LETTER_REQUIRED: &str = "#coverLetter[required]";
    pub const RESUME: &str = "#resume";
    pub const RESUME_REQUIRED: &str = "#resume[required]";
    pub const QUESTION_GROUPS: &str = "#questions-container .question-group";
    pub const SUBMIT: &str = "button.submit-btn";
    pub const SUCCESS: &str = "#success";
}

/// 门户上的一个问题及其输入框选择器
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalQuestion {
    pub question: String,
    pub selector: String,
}

/// inspect 结果；success=false 时 questions 为空
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalRequirements {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub requires_cover_letter: bool,
    #[serde(default)]
    pub requires_resume: bool,
    #[serde(default)]
    pub questions: Vec<PortalQuestion>,
}

impl PortalRequirements {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            ..Default::default()
        }
    }
}

/// submit 结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

impl SubmissionResult {
    pub fn submitted() -> Self {
        Self {
            success: true,
            message: "External application submitted successfully".to_string(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
