//! 简历引用解析与本地化
//!
//! file:// 路径原地使用（不删除）；http(s) 地址下载；其它视为相对路径，拼接到配置的基址后下载。
//! 下载结果写入 tempfile 临时文件，后缀取自 URL 扩展名（无则 .bin），随 LocalResume drop 删除。

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::NamedTempFile;

use crate::core::PortalError;

/// 解析后的简历引用
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeRef {
    Local(PathBuf),
    Remote(String),
}

impl ResumeRef {
    /// 空引用返回 None
    pub fn resolve(reference: &str, base_url: &str) -> Option<Self> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }
        if let Some(path) = reference.strip_prefix("file://") {
            return Some(ResumeRef::Local(PathBuf::from(path)));
        }
        if reference.starts_with("http://") || reference.starts_with("https://") {
            return Some(ResumeRef::Remote(reference.to_string()));
        }
        let base = base_url.trim_end_matches('/');
        let path = reference.trim_start_matches('/');
        Some(ResumeRef::Remote(format!("{base}/{path}")))
    }
}

/// URL 路径最后一段的扩展名，作为临时文件后缀
pub fn suffix_for(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let last = path.rsplit('/').next().unwrap_or(path);
    match last.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= 8
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            format!(".{ext}")
        }
        _ => ".bin".to_string(),
    }
}

/// 可交给文件输入框的本地简历
#[derive(Debug)]
pub enum LocalResume {
    InPlace(PathBuf),
    /// drop 时删除
    Temp(NamedTempFile),
}

impl LocalResume {
    pub fn path(&self) -> &Path {
        match self {
            LocalResume::InPlace(path) => path,
            LocalResume::Temp(file) => file.path(),
        }
    }
}

/// 文件获取能力
#[async_trait]
pub trait ResumeFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, PortalError>;
}

/// 基于 reqwest 的下载
pub struct HttpResumeFetcher {
    client: reqwest::Client,
}

impl HttpResumeFetcher {
    pub fn new(timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

#[async_trait]
impl ResumeFetcher for HttpResumeFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, PortalError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| PortalError::Download(format!("{url}: {e}")))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| PortalError::Download(format!("{url}: {e}")))?;
        Ok(bytes.to_vec())
    }
}

/// 固定内容的获取器（测试用），记录请求过的 URL
#[derive(Debug)]
pub struct StaticResumeFetcher {
    body: Result<Vec<u8>, String>,
    requests: Mutex<Vec<String>>,
}

impl StaticResumeFetcher {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: Ok(body.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            body: Err(message.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ResumeFetcher for StaticResumeFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, PortalError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }
        self.body.clone().map_err(PortalError::Download)
    }
}

/// 将引用落到本地文件
pub async fn materialize(
    fetcher: &dyn ResumeFetcher,
    reference: &ResumeRef,
) -> Result<LocalResume, PortalError> {
    match reference {
        ResumeRef::Local(path) => {
            if !path.exists() {
                return Err(PortalError::Download(format!(
                    "local resume not found: {}",
                    path.display()
                )));
            }
            Ok(LocalResume::InPlace(path.clone()))
        }
        ResumeRef::Remote(url) => {
            let bytes = fetcher.fetch(url).await?;
            let mut file = tempfile::Builder::new()
                .prefix("resume-")
                .suffix(&suffix_for(url))
                .tempfile()?;
            file.write_all(&bytes)?;
            file.flush()?;
            tracing::debug!(
                url = %url,
                path = %file.path().display(),
                bytes = bytes.len(),
                "resume downloaded"
            );
            Ok(LocalResume::Temp(file))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_reference_kinds() {
        let base = "http://localhost:5001";
        assert_eq!(
            ResumeRef::resolve("/uploads/cv.pdf", base),
            Some(ResumeRef::Remote("http://localhost:5001/uploads/cv.pdf".into()))
        );
        assert_eq!(
            ResumeRef::resolve("https://cdn.example.com/cv.pdf", base),
            Some(ResumeRef::Remote("https://cdn.example.com/cv.pdf".into()))
        );
        assert_eq!(
            ResumeRef::resolve("file:///tmp/cv.pdf", base),
            Some(ResumeRef::Local(PathBuf::from("/tmp/cv.pdf")))
        );
        assert_eq!(ResumeRef::resolve("  ", base), None);
    }

    #[test]
    fn test_suffix_for() {
        assert_eq!(suffix_for("http://h/uploads/cv.pdf"), ".pdf");
        assert_eq!(suffix_for("http://h/uploads/cv.docx?token=1"), ".docx");
        assert_eq!(suffix_for("http://h/uploads/resume"), ".bin");
        assert_eq!(suffix_for("http://h.example.com/"), ".bin");
    }

    #[tokio::test]
    async fn test_remote_resume_is_temp_file() {
        let fetcher = StaticResumeFetcher::new(b"%PDF-1.4".to_vec());
        let reference = ResumeRef::Remote("http://h/cv.pdf".into());
        let local = materialize(&fetcher, &reference).await.unwrap();
        let path = local.path().to_path_buf();

        assert!(path.exists());
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("pdf"));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4");

        drop(local);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_local_resume_used_in_place() {
        let file = NamedTempFile::new().unwrap();
        let fetcher = StaticResumeFetcher::new(Vec::new());
        let reference = ResumeRef::Local(file.path().to_path_buf());

        let local = materialize(&fetcher, &reference).await.unwrap();
        assert_eq!(local.path(), file.path());
        drop(local);
        assert!(file.path().exists());
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn test_failed_download() {
        let fetcher = StaticResumeFetcher::failing("404");
        let reference = ResumeRef::Remote("http://h/cv.pdf".into());
        assert!(matches!(
            materialize(&fetcher, &reference).await,
            Err(PortalError::Download(_))
        ));
    }
}
