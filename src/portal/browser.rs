//! 浏览器自动化抽象
//!
//! PortalBrowser 每次 open 一个独立页面会话；PortalPage 提供导航、带超时等待、
//! 填写、上传文件、点击与问题字段枚举。实现：headless_chrome（feature "browser"）、
//! MockBrowser（测试）、UnavailableBrowser（未启用浏览器时）。

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::core::PortalError;

/// 问题容器中的一组 (label, 输入框选择器)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionField {
    pub label: String,
    pub selector: String,
}

#[async_trait]
pub trait PortalBrowser: Send + Sync {
    async fn open(&self) -> Result<Box<dyn PortalPage>, PortalError>;
}

#[async_trait]
pub trait PortalPage: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), PortalError>;

    /// 等待元素出现，超时返回 PortalError::Timeout
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), PortalError>;

    async fn exists(&self, selector: &str) -> Result<bool, PortalError>;

    async fn fill(&self, selector: &str, value: &str) -> Result<(), PortalError>;

    async fn set_input_files(&self, selector: &str, path: &Path) -> Result<(), PortalError>;

    async fn click(&self, selector: &str) -> Result<(), PortalError>;

    /// 按页面顺序枚举问题分组
    async fn question_fields(&self) -> Result<Vec<QuestionField>, PortalError>;

    /// 释放会话；重复调用无副作用
    async fn close(&self);
}

/// 未编译浏览器后端时使用：所有门户调用得到结构化失败
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableBrowser;

#[async_trait]
impl PortalBrowser for UnavailableBrowser {
    async fn open(&self) -> Result<Box<dyn PortalPage>, PortalError> {
        Err(PortalError::Unsupported(
            "built without the `browser` feature".to_string(),
        ))
    }
}

/// 当前构建可用的默认浏览器后端
pub fn default_browser() -> Arc<dyn PortalBrowser> {
    #[cfg(feature = "browser")]
    {
        Arc::new(crate::portal::chrome::ChromeBrowser::default())
    }
    #[cfg(not(feature = "browser"))]
    {
        Arc::new(UnavailableBrowser)
    }
}
