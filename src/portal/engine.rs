//! PortalAutomationEngine：inspect / submit
//!
//! 对调用方永不返回错误：任何 PortalError 都被转成 success=false 的结构化结果。
//! 页面会话在返回前 close；下载的临时简历随 LocalResume drop 删除。

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::PortalSection;
use crate::core::PortalError;
use crate::portal::browser::{PortalBrowser, PortalPage};
use crate::portal::resume::{materialize, ResumeFetcher, ResumeRef};
use crate::portal::{selectors, PortalQuestion, PortalRequirements, SubmissionResult};
use crate::types::{Answer, CandidateProfile};

/// 一次提交所需的数据
#[derive(Debug, Clone, Copy)]
pub struct SubmissionRequest<'a> {
    pub profile: &'a CandidateProfile,
    /// 为空时不填写求职信
    pub cover_letter: &'a str,
    pub answers: &'a [Answer],
    /// 为空时不上传简历
    pub resume_ref: &'a str,
}

pub struct PortalAutomationEngine {
    browser: Arc<dyn PortalBrowser>,
    fetcher: Arc<dyn ResumeFetcher>,
    settings: PortalSection,
}

impl PortalAutomationEngine {
    pub fn new(
        browser: Arc<dyn PortalBrowser>,
        fetcher: Arc<dyn ResumeFetcher>,
        settings: PortalSection,
    ) -> Self {
        Self {
            browser,
            fetcher,
            settings,
        }
    }

    fn form_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.form_timeout_secs)
    }

    fn success_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.success_timeout_secs)
    }

    pub async fn inspect(&self, portal_url: &str) -> PortalRequirements {
        tracing::info!(portal_url, "portal inspect");
        match self.try_inspect(portal_url).await {
            Ok(requirements) => requirements,
            Err(e) => {
                tracing::warn!(portal_url, error = %e, "portal inspection failed");
                PortalRequirements::failed(format!("Inspection failed: {e}"))
            }
        }
    }

    async fn try_inspect(&self, portal_url: &str) -> Result<PortalRequirements, PortalError> {
        let page = self.browser.open().await?;
        let result = self.read_requirements(page.as_ref(), portal_url).await;
        page.close().await;
        result
    }

    async fn read_requirements(
        &self,
        page: &dyn PortalPage,
        portal_url: &str,
    ) -> Result<PortalRequirements, PortalError> {
        page.navigate(portal_url).await?;
        page.wait_for(selectors::FORM, self.form_timeout()).await?;

        let requires_cover_letter = page.exists(selectors::COVER_LETTER_REQUIRED).await?;
        let requires_resume = page.exists(selectors::RESUME_REQUIRED).await?;
        let questions = page
            .question_fields()
            .await?
            .into_iter()
            .map(|f| PortalQuestion {
                question: f.label,
                selector: f.selector,
            })
            .collect();

        Ok(PortalRequirements {
            success: true,
            message: None,
            requires_cover_letter,
            requires_resume,
            questions,
        })
    }

    pub async fn submit(
        &self,
        portal_url: &str,
        request: &SubmissionRequest<'_>,
    ) -> SubmissionResult {
        tracing::info!(portal_url, answers = request.answers.len(), "portal submit");

        let resume = match ResumeRef::resolve(request.resume_ref, &self.settings.resume_base_url) {
            Some(reference) => match materialize(self.fetcher.as_ref(), &reference).await {
                Ok(local) => Some(local),
                Err(e) => {
                    tracing::warn!(portal_url, error = %e, "resume unavailable");
                    return SubmissionResult::failed(format!("External apply failed: {e}"));
                }
            },
            None => None,
        };

        let result = self
            .try_submit(portal_url, request, resume.as_ref().map(|r| r.path()))
            .await;
        drop(resume);

        match result {
            Ok(()) => SubmissionResult::submitted(),
            Err(e) => {
                tracing::warn!(portal_url, error = %e, "portal submission failed");
                SubmissionResult::failed(format!("External apply failed: {e}"))
            }
        }
    }

    async fn try_submit(
        &self,
        portal_url: &str,
        request: &SubmissionRequest<'_>,
        resume_path: Option<&Path>,
    ) -> Result<(), PortalError> {
        let page = self.browser.open().await?;
        let result = self
            .fill_form(page.as_ref(), portal_url, request, resume_path)
            .await;
        page.close().await;
        result
    }

    async fn fill_form(
        &self,
        page: &dyn PortalPage,
        portal_url: &str,
        request: &SubmissionRequest<'_>,
        resume_path: Option<&Path>,
    ) -> Result<(), PortalError> {
        page.navigate(portal_url).await?;
        page.wait_for(selectors::FORM, self.form_timeout()).await?;

        let name = match request.profile.name.trim() {
            "" => "Applicant",
            name => name,
        };
        page.fill(selectors::FULL_NAME, name).await?;
        page.fill(selectors::EMAIL, &request.profile.email).await?;

        if !request.cover_letter.trim().is_empty() {
            page.fill(selectors::COVER_LETTER, request.cover_letter).await?;
        }
        if let Some(path) = resume_path {
            page.set_input_files(selectors::RESUME, path).await?;
        }

        let by_question: HashMap<&str, &str> = request
            .answers
            .iter()
            .map(|a| (a.question.as_str(), a.answer.as_str()))
            .collect();
        for (idx, field) in page.question_fields().await?.iter().enumerate() {
            let value = by_question
                .get(field.label.as_str())
                .copied()
                .filter(|v| !v.is_empty())
                .or_else(|| request.answers.get(idx).map(|a| a.answer.as_str()))
                .unwrap_or("");
            if !value.is_empty() {
                page.fill(&field.selector, value).await?;
            }
        }

        page.click(selectors::SUBMIT).await?;
        page.wait_for(selectors::SUCCESS, self.success_timeout()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portal::mock::{MockBrowser, MockPortal};
    use crate::portal::resume::StaticResumeFetcher;

    const PORTAL: &str = "http://portal.local/apply?jobId=7";

    fn engine(browser: &MockBrowser, fetcher: StaticResumeFetcher) -> PortalAutomationEngine {
        PortalAutomationEngine::new(
            Arc::new(browser.clone()),
            Arc::new(fetcher),
            PortalSection::default(),
        )
    }

    fn profile() -> CandidateProfile {
        CandidateProfile {
            name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            resume_ref: "/uploads/ada.pdf".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_inspect_reads_requirements() {
        let browser = MockBrowser::new(MockPortal {
            requires_cover_letter: false,
            requires_resume: true,
            questions: vec!["Why Acme?".into()],
            ..Default::default()
        });
        let req = engine(&browser, StaticResumeFetcher::new(Vec::new()))
            .inspect(PORTAL)
            .await;

        assert!(req.success);
        assert!(!req.requires_cover_letter);
        assert!(req.requires_resume);
        assert_eq!(req.questions[0].question, "Why Acme?");
        assert_eq!(req.questions[0].selector, "#question-0");

        let log = browser.log();
        assert_eq!(log.navigations, vec![PORTAL.to_string()]);
        assert_eq!(log.opened, 1);
        assert_eq!(log.closed, 1);
    }

    #[tokio::test]
    async fn test_inspect_timeout_is_structured_failure() {
        let browser = MockBrowser::new(MockPortal {
            timeout_on: Some(selectors::FORM.into()),
            ..Default::default()
        });
        let req = engine(&browser, StaticResumeFetcher::new(Vec::new()))
            .inspect(PORTAL)
            .await;

        assert!(!req.success);
        assert!(req.questions.is_empty());
        assert!(req.message.unwrap().starts_with("Inspection failed:"));
        assert_eq!(browser.log().closed, 1);
    }

    #[tokio::test]
    async fn test_submit_fills_form_and_matches_answers() {
        let browser = MockBrowser::new(MockPortal {
            questions: vec!["Why Acme?".into(), "Start date?".into()],
            ..Default::default()
        });
        let answers = vec![
            Answer {
                question: "Start date?".into(),
                answer: "Next month".into(),
            },
            Answer {
                question: "Why do you want this job?".into(),
                answer: "Mission".into(),
            },
        ];
        let profile = profile();
        let result = engine(&browser, StaticResumeFetcher::new(b"pdf".to_vec()))
            .submit(
                PORTAL,
                &SubmissionRequest {
                    profile: &profile,
                    cover_letter: "Dear Hiring Manager,",
                    answers: &answers,
                    resume_ref: &profile.resume_ref,
                },
            )
            .await;

        assert_eq!(result, SubmissionResult::submitted());
        let log = browser.log();
        assert_eq!(log.filled(selectors::FULL_NAME), Some("Ada Lovelace"));
        assert_eq!(log.filled(selectors::COVER_LETTER), Some("Dear Hiring Manager,"));
        // 第一题无精确匹配，按位置取第一个回答
        assert_eq!(log.filled("#question-0"), Some("Next month"));
        assert_eq!(log.filled("#question-1"), Some("Next month"));
        assert_eq!(log.uploads.len(), 1);
        assert!(log.uploads[0].existed);
        assert!(!log.uploads[0].path.exists());
        assert_eq!(log.clicks, vec![selectors::SUBMIT.to_string()]);
    }

    #[tokio::test]
    async fn test_submit_timeout_releases_resources() {
        let browser = MockBrowser::new(MockPortal {
            timeout_on: Some(selectors::SUCCESS.into()),
            ..Default::default()
        });
        let profile = profile();
        let result = engine(&browser, StaticResumeFetcher::new(b"pdf".to_vec()))
            .submit(
                PORTAL,
                &SubmissionRequest {
                    profile: &profile,
                    cover_letter: "",
                    answers: &[],
                    resume_ref: &profile.resume_ref,
                },
            )
            .await;

        assert!(!result.success);
        assert!(result.message.starts_with("External apply failed:"));
        let log = browser.log();
        assert_eq!(log.closed, 1);
        assert!(log.filled(selectors::COVER_LETTER).is_none());
        assert!(!log.uploads[0].path.exists());
    }

    #[tokio::test]
    async fn test_download_failure_skips_browser() {
        let browser = MockBrowser::new(MockPortal::default());
        let profile = profile();
        let result = engine(&browser, StaticResumeFetcher::failing("connection refused"))
            .submit(
                PORTAL,
                &SubmissionRequest {
                    profile: &profile,
                    cover_letter: "",
                    answers: &[],
                    resume_ref: &profile.resume_ref,
                },
            )
            .await;

        assert!(!result.success);
        assert_eq!(browser.log().opened, 0);
    }

    #[tokio::test]
    async fn test_unavailable_browser_fails_softly() {
        let engine = PortalAutomationEngine::new(
            Arc::new(crate::portal::UnavailableBrowser),
            Arc::new(StaticResumeFetcher::new(Vec::new())),
            PortalSection::default(),
        );
        let req = engine.inspect(PORTAL).await;
        assert!(!req.success);
    }
}
