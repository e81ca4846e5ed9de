//! Mock 浏览器（用于测试，无需 Chrome）
//!
//! MockPortal 描述页面：哪些字段必填、有哪些问题、在哪个选择器上模拟超时。
//! 所有页面操作记录到共享的 MockPortalLog，测试据此断言填写内容与会话释放。

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::core::PortalError;
use crate::portal::browser::{PortalBrowser, PortalPage, QuestionField};
use crate::portal::selectors;

/// 模拟的门户页面
#[derive(Debug, Clone, Default)]
pub struct MockPortal {
    pub requires_cover_letter: bool,
    pub requires_resume: bool,
    /// 问题 label，按页面顺序
    pub questions: Vec<String>,
    /// 等待该选择器时模拟超时
    pub timeout_on: Option<String>,
    /// open 直接失败
    pub launch_fails: bool,
}

impl MockPortal {
    pub fn question_selector(index: usize) -> String {
        format!("#question-{index}")
    }
}

/// 上传时记录的文件
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub selector: String,
    pub path: PathBuf,
    /// 上传时文件是否存在
    pub existed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MockPortalLog {
    pub opened: usize,
    pub closed: usize,
    pub navigations: Vec<String>,
    pub fills: Vec<(String, String)>,
    pub uploads: Vec<UploadedFile>,
    pub clicks: Vec<String>,
}

impl MockPortalLog {
    pub fn filled(&self, selector: &str) -> Option<&str> {
        self.fills
            .iter()
            .rev()
            .find(|(s, _)| s == selector)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockBrowser {
    portal: MockPortal,
    log: Arc<Mutex<MockPortalLog>>,
}

impl MockBrowser {
    pub fn new(portal: MockPortal) -> Self {
        Self {
            portal,
            log: Arc::new(Mutex::new(MockPortalLog::default())),
        }
    }

    pub fn log(&self) -> MockPortalLog {
        self.log.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PortalBrowser for MockBrowser {
    async fn open(&self) -> Result<Box<dyn PortalPage>, PortalError> {
        if self.portal.launch_fails {
            return Err(PortalError::Launch("mock launch failure".to_string()));
        }
        self.record(|l| l.opened += 1);
        Ok(Box::new(MockPage {
            portal: self.portal.clone(),
            log: Arc::clone(&self.log),
            closed: Mutex::new(false),
        }))
    }
}

impl MockBrowser {
    fn record(&self, f: impl FnOnce(&mut MockPortalLog)) {
        if let Ok(mut log) = self.log.lock() {
            f(&mut log);
        }
    }
}

struct MockPage {
    portal: MockPortal,
    log: Arc<Mutex<MockPortalLog>>,
    closed: Mutex<bool>,
}

impl MockPage {
    fn record(&self, f: impl FnOnce(&mut MockPortalLog)) {
        if let Ok(mut log) = self.log.lock() {
            f(&mut log);
        }
    }

    fn is_question(&self, selector: &str) -> bool {
        (0..self.portal.questions.len()).any(|i| MockPortal::question_selector(i) == selector)
    }
}

#[async_trait]
impl PortalPage for MockPage {
    async fn navigate(&self, url: &str) -> Result<(), PortalError> {
        let url = url.to_string();
        self.record(|l| l.navigations.push(url));
        Ok(())
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), PortalError> {
        if self.portal.timeout_on.as_deref() == Some(selector) {
            return Err(PortalError::Timeout {
                selector: selector.to_string(),
                timeout_secs: timeout.as_secs(),
            });
        }
        Ok(())
    }

    async fn exists(&self, selector: &str) -> Result<bool, PortalError> {
        Ok(match selector {
            selectors::COVER_LETTER_REQUIRED => self.portal.requires_cover_letter,
            selectors::RESUME_REQUIRED => self.portal.requires_resume,
            _ => true,
        })
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), PortalError> {
        let known = matches!(
            selector,
            selectors::FULL_NAME | selectors::EMAIL | selectors::COVER_LETTER
        ) || self.is_question(selector);
        if !known {
            return Err(PortalError::MissingElement(selector.to_string()));
        }
        let entry = (selector.to_string(), value.to_string());
        self.record(|l| l.fills.push(entry));
        Ok(())
    }

    async fn set_input_files(&self, selector: &str, path: &Path) -> Result<(), PortalError> {
        let upload = UploadedFile {
            selector: selector.to_string(),
            path: path.to_path_buf(),
            existed: path.exists(),
        };
        self.record(|l| l.uploads.push(upload));
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), PortalError> {
        let selector = selector.to_string();
        self.record(|l| l.clicks.push(selector));
        Ok(())
    }

    async fn question_fields(&self) -> Result<Vec<QuestionField>, PortalError> {
        Ok(self
            .portal
            .questions
            .iter()
            .enumerate()
            .map(|(i, label)| QuestionField {
                label: label.clone(),
                selector: MockPortal::question_selector(i),
            })
            .collect())
    }

    async fn close(&self) {
        let first = self
            .closed
            .lock()
            .map(|mut c| !std::mem::replace(&mut *c, true))
            .unwrap_or(false);
        if first {
            self.record(|l| l.closed += 1);
        }
    }
}
