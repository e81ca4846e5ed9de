//! headless_chrome 后端（需启用 feature "browser" 且系统已安装 Chrome/Chromium）
//!
//! headless_chrome 为阻塞 API，每个操作都在 spawn_blocking 中执行。

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use headless_chrome::{Browser, Tab};
use serde_json::{json, Value};

use crate::core::PortalError;
use crate::portal::browser::{PortalBrowser, PortalPage, QuestionField};
use crate::portal::selectors;

/// 枚举问题分组：textarea 有 id 时用 `#id`，否则用分组序号定位
const QUESTION_FIELDS_JS: &str = r#"
JSON.stringify(Array.from(document.querySelectorAll('#questions-container .question-group'))
  .map((group, idx) => {
    const label = group.querySelector('label');
    const input = group.querySelector('textarea');
    if (!input) { return null; }
    const selector = input.id
      ? '#' + input.id
      : '#questions-container .question-group:nth-of-type(' + (idx + 1) + ') textarea';
    return { label: label ? label.innerText.trim() : '', selector };
  })
  .filter(Boolean))
"#;

const SET_VALUE_JS: &str = "function(v) { this.value = v; \
    this.dispatchEvent(new Event('input', { bubbles: true })); \
    this.dispatchEvent(new Event('change', { bubbles: true })); }";

#[derive(Debug, Default, Clone, Copy)]
pub struct ChromeBrowser;

#[async_trait]
impl PortalBrowser for ChromeBrowser {
    async fn open(&self) -> Result<Box<dyn PortalPage>, PortalError> {
        let (browser, tab) = tokio::task::spawn_blocking(|| {
            let browser = Browser::default()
                .map_err(|e| PortalError::Launch(format!("Chrome launch failed: {e}")))?;
            let tab = browser
                .new_tab()
                .map_err(|e| PortalError::Launch(format!("Browser tab failed: {e}")))?;
            Ok::<_, PortalError>((browser, tab))
        })
        .await
        .map_err(|e| PortalError::Launch(format!("Task join: {e}")))??;

        Ok(Box::new(ChromePage {
            _browser: browser,
            tab,
        }))
    }
}

/// 一个标签页会话；drop 时 Browser 随之关闭
pub struct ChromePage {
    _browser: Browser,
    tab: Arc<Tab>,
}

impl ChromePage {
    async fn blocking<T, F>(&self, f: F) -> Result<T, PortalError>
    where
        T: Send + 'static,
        F: FnOnce(&Tab) -> Result<T, PortalError> + Send + 'static,
    {
        let tab = Arc::clone(&self.tab);
        tokio::task::spawn_blocking(move || f(&tab))
            .await
            .map_err(|e| PortalError::Navigation(format!("Task join: {e}")))?
    }
}

fn missing(selector: &str, e: impl std::fmt::Display) -> PortalError {
    PortalError::MissingElement(format!("{selector}: {e}"))
}

#[async_trait]
impl PortalPage for ChromePage {
    async fn navigate(&self, url: &str) -> Result<(), PortalError> {
        let url = url.to_string();
        self.blocking(move |tab| {
            tab.navigate_to(&url)
                .and_then(|t| t.wait_until_navigated())
                .map_err(|e| PortalError::Navigation(format!("{url}: {e}")))?;
            Ok(())
        })
        .await
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), PortalError> {
        let selector = selector.to_string();
        self.blocking(move |tab| {
            tab.wait_for_element_with_custom_timeout(&selector, timeout)
                .map_err(|_| PortalError::Timeout {
                    selector: selector.clone(),
                    timeout_secs: timeout.as_secs(),
                })?;
            Ok(())
        })
        .await
    }

    async fn exists(&self, selector: &str) -> Result<bool, PortalError> {
        let selector = selector.to_string();
        self.blocking(move |tab| Ok(tab.find_element(&selector).is_ok()))
            .await
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), PortalError> {
        let selector = selector.to_string();
        let value = value.to_string();
        self.blocking(move |tab| {
            let el = tab.find_element(&selector).map_err(|e| missing(&selector, e))?;
            el.call_js_fn(SET_VALUE_JS, vec![json!(value)], false)
                .map_err(|e| missing(&selector, e))?;
            Ok(())
        })
        .await
    }

    async fn set_input_files(&self, selector: &str, path: &Path) -> Result<(), PortalError> {
        let selector = selector.to_string();
        let path = path.to_string_lossy().into_owned();
        self.blocking(move |tab| {
            let el = tab.find_element(&selector).map_err(|e| missing(&selector, e))?;
            el.set_input_files(&[path.as_str()])
                .map_err(|e| missing(&selector, e))?;
            Ok(())
        })
        .await
    }

    async fn click(&self, selector: &str) -> Result<(), PortalError> {
        let selector = selector.to_string();
        self.blocking(move |tab| {
            tab.find_element(&selector)
                .and_then(|el| el.click().map(|_| ()))
                .map_err(|e| missing(&selector, e))
        })
        .await
    }

    async fn question_fields(&self) -> Result<Vec<QuestionField>, PortalError> {
        let raw = self
            .blocking(|tab| {
                let remote = tab
                    .evaluate(QUESTION_FIELDS_JS, false)
                    .map_err(|e| missing(selectors::QUESTION_GROUPS, e))?;
                Ok(remote
                    .value
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_else(|| "[]".to_string()))
            })
            .await?;

        let items: Vec<Value> = serde_json::from_str(&raw)
            .map_err(|e| missing(selectors::QUESTION_GROUPS, e))?;
        Ok(items
            .iter()
            .map(|item| QuestionField {
                label: item["label"].as_str().unwrap_or_default().to_string(),
                selector: item["selector"].as_str().unwrap_or_default().to_string(),
            })
            .filter(|f| !f.selector.is_empty())
            .collect())
    }

    async fn close(&self) {
        let _ = self
            .blocking(|tab| {
                let _ = tab.close(true);
                Ok(())
            })
            .await;
    }
}
