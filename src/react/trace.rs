//! 推理轨迹与结果重建
//!
//! 循环按顺序产出 TraceEntry；reconstruct_outcome 对每个变体穷尽匹配，
//! 按调用 id 找到能力名，把结果写入 ApplicationOutcome 对应字段（同一能力多次调用以最后一次为准）。

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::capabilities::Capability;
use crate::portal::{PortalRequirements, SubmissionResult};
use crate::types::{Answer, ApplicationOutcome, FallbackReason, GenerationResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraceEntry {
    Thought {
        text: String,
    },
    CapabilityCall {
        id: String,
        capability: Capability,
        args: Value,
    },
    CapabilityResult {
        id: String,
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        fallback: Option<FallbackReason>,
    },
}

impl TraceEntry {
    pub fn thought(text: impl Into<String>) -> Self {
        TraceEntry::Thought { text: text.into() }
    }
}

/// 将轨迹中的能力结果写入 outcome；未调用的能力保持默认空值
pub fn reconstruct_outcome(trace: &[TraceEntry], outcome: &mut ApplicationOutcome) {
    let mut calls: HashMap<&str, Capability> = HashMap::new();

    for entry in trace {
        match entry {
            TraceEntry::Thought { .. } => {}
            TraceEntry::CapabilityCall { id, capability, .. } => {
                calls.insert(id.as_str(), *capability);
            }
            TraceEntry::CapabilityResult { id, text, fallback } => {
                let Some(capability) = calls.get(id.as_str()) else {
                    tracing::warn!(id = %id, "capability result without a matching call");
                    continue;
                };
                apply_result(*capability, text, fallback.clone(), outcome);
            }
        }
    }
}

fn apply_result(
    capability: Capability,
    text: &str,
    fallback: Option<FallbackReason>,
    outcome: &mut ApplicationOutcome,
) {
    match capability {
        Capability::TailorResume => {
            outcome.resume = Some(GenerationResult {
                text: text.to_string(),
                fallback,
            });
        }
        Capability::GenerateCoverLetter => {
            outcome.cover_letter = Some(GenerationResult {
                text: text.to_string(),
                fallback,
            });
        }
        Capability::AnswerQuestions => {
            outcome.answers = serde_json::from_str::<Vec<Answer>>(text).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "could not parse answers observation");
                Vec::new()
            });
            outcome.answers_fallback = fallback;
        }
        Capability::InspectPortal => {
            outcome.portal_requirements = Some(
                serde_json::from_str::<PortalRequirements>(text).unwrap_or_else(|e| {
                    PortalRequirements::failed(format!("Unparseable inspection result: {e}"))
                }),
            );
        }
        Capability::SubmitPortal => {
            outcome.portal_result = Some(
                serde_json::from_str::<SubmissionResult>(text).unwrap_or_else(|e| {
                    SubmissionResult::failed(format!("Unparseable submission result: {e}"))
                }),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(id: &str, capability: Capability) -> TraceEntry {
        TraceEntry::CapabilityCall {
            id: id.into(),
            capability,
            args: json!({}),
        }
    }

    fn result(id: &str, text: &str) -> TraceEntry {
        TraceEntry::CapabilityResult {
            id: id.into(),
            text: text.into(),
            fallback: None,
        }
    }

    #[test]
    fn test_maps_results_by_call_id() {
        let trace = vec![
            TraceEntry::thought("start"),
            call("call-1", Capability::TailorResume),
            result("call-1", "Tailored"),
            call("call-2", Capability::AnswerQuestions),
            result("call-2", r#"[{"question": "Q", "answer": "A"}]"#),
            call("call-3", Capability::InspectPortal),
            result(
                "call-3",
                r#"{"success": true, "requires_cover_letter": false, "requires_resume": true, "questions": []}"#,
            ),
        ];
        let mut outcome = ApplicationOutcome::default();
        reconstruct_outcome(&trace, &mut outcome);

        assert_eq!(outcome.resume_text(), "Tailored");
        assert_eq!(outcome.answers.len(), 1);
        assert!(outcome.portal_requirements.unwrap().requires_resume);
        assert!(outcome.cover_letter.is_none());
        assert!(outcome.portal_result.is_none());
    }

    #[test]
    fn test_last_result_wins() {
        let trace = vec![
            call("call-1", Capability::GenerateCoverLetter),
            result("call-1", "Draft"),
            call("call-2", Capability::GenerateCoverLetter),
            result("call-2", "Final"),
        ];
        let mut outcome = ApplicationOutcome::default();
        reconstruct_outcome(&trace, &mut outcome);
        assert_eq!(outcome.cover_letter_text(), "Final");
    }

    #[test]
    fn test_unparseable_submission_is_failed_result() {
        let trace = vec![
            call("call-1", Capability::SubmitPortal),
            result("call-1", "browser crashed"),
            call("call-2", Capability::AnswerQuestions),
            result("call-2", "not json"),
        ];
        let mut outcome = ApplicationOutcome::default();
        reconstruct_outcome(&trace, &mut outcome);

        let submission = outcome.portal_result.unwrap();
        assert!(!submission.success);
        assert!(outcome.answers.is_empty());
    }

    #[test]
    fn test_orphan_result_is_ignored() {
        let mut outcome = ApplicationOutcome::default();
        reconstruct_outcome(&[result("call-9", "x")], &mut outcome);
        assert!(outcome.resume.is_none());
    }
}
