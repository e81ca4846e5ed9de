//! 能力注册表
//!
//! Capability 为封闭枚举；CAPABILITY_TABLE 把每个能力映射到线上名称、描述与参数 schema。
//! 哪些能力暴露、哪些必须调用由 requirement() 按 (是否有门户, 是否有问题) 查表决定。

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Capability {
    #[serde(rename = "tailor_resume")]
    TailorResume,
    #[serde(rename = "generate_cover_letter")]
    GenerateCoverLetter,
    #[serde(rename = "answer_application_questions")]
    AnswerQuestions,
    #[serde(rename = "inspect_external_application")]
    InspectPortal,
    #[serde(rename = "submit_external_application")]
    SubmitPortal,
}

/// 表项：能力的静态描述
pub struct CapabilitySpec {
    pub capability: Capability,
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: fn() -> Value,
}

fn no_args() -> Value {
    json!({ "type": "object", "properties": {}, "required": [] })
}

fn cover_letter_args() -> Value {
    json!({
        "type": "object",
        "properties": {
            "tailored_resume": {
                "type": "string",
                "description": "Output of tailor_resume, used as extra context"
            }
        },
        "required": []
    })
}

fn submit_args() -> Value {
    json!({
        "type": "object",
        "properties": {
            "cover_letter": {
                "type": "string",
                "description": "Cover letter text; omit or leave empty to skip the field"
            },
            "answers": {
                "type": "array",
                "description": "Output of answer_application_questions",
                "items": {
                    "type": "object",
                    "properties": {
                        "question": { "type": "string" },
                        "answer": { "type": "string" }
                    }
                }
            },
            "resume_url": {
                "type": "string",
                "description": "Resume reference; defaults to the candidate's resume"
            }
        },
        "required": []
    })
}

pub static CAPABILITY_TABLE: [CapabilitySpec; 5] = [
    CapabilitySpec {
        capability: Capability::TailorResume,
        name: "tailor_resume",
        description: "Tailor the candidate's resume summary to this job. Returns plain text.",
        input_schema: no_args,
    },
    CapabilitySpec {
        capability: Capability::GenerateCoverLetter,
        name: "generate_cover_letter",
        description: "Write a cover letter for this job, optionally using the tailored resume. Returns plain text.",
        input_schema: cover_letter_args,
    },
    CapabilitySpec {
        capability: Capability::AnswerQuestions,
        name: "answer_application_questions",
        description: "Answer the application questions. Returns a JSON array of {question, answer}.",
        input_schema: no_args,
    },
    CapabilitySpec {
        capability: Capability::InspectPortal,
        name: "inspect_external_application",
        description: "Open the external application portal and report which fields are required and which questions it asks. Returns JSON.",
        input_schema: no_args,
    },
    CapabilitySpec {
        capability: Capability::SubmitPortal,
        name: "submit_external_application",
        description: "Fill and submit the external application portal. Returns JSON {success, message}.",
        input_schema: submit_args,
    },
];

impl Capability {
    pub const ALL: [Capability; 5] = [
        Capability::TailorResume,
        Capability::GenerateCoverLetter,
        Capability::AnswerQuestions,
        Capability::InspectPortal,
        Capability::SubmitPortal,
    ];

    pub fn spec(self) -> &'static CapabilitySpec {
        // 表与 ALL 同序
        &CAPABILITY_TABLE[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        CAPABILITY_TABLE
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.capability)
    }

    pub fn input_schema(self) -> Value {
        (self.spec().input_schema)()
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// 决定能力暴露与否的调用属性
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvocationFacts {
    pub has_portal: bool,
    pub has_questions: bool,
}

/// 能力在本次调用中的地位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Mandatory,
    /// 视门户检查结果而定
    Conditional(&'static str),
    NotExposed,
}

/// 前置条件表
pub fn requirement(capability: Capability, facts: InvocationFacts) -> Requirement {
    use Capability::*;
    use Requirement::*;

    match (capability, facts.has_portal, facts.has_questions) {
        (TailorResume, _, _) => Mandatory,
        (GenerateCoverLetter, false, _) => Mandatory,
        (GenerateCoverLetter, true, _) => {
            Conditional("only if inspect_external_application reports requires_cover_letter")
        }
        (AnswerQuestions, _, false) => NotExposed,
        (AnswerQuestions, false, true) => Mandatory,
        (AnswerQuestions, true, true) => {
            Conditional("if the questions are needed for the portal or the candidate")
        }
        (InspectPortal | SubmitPortal, false, _) => NotExposed,
        (InspectPortal, true, _) => Mandatory,
        (SubmitPortal, true, _) => Mandatory,
    }
}

/// 本次调用暴露的能力，按表顺序
pub fn exposed(facts: InvocationFacts) -> Vec<Capability> {
    Capability::ALL
        .into_iter()
        .filter(|c| requirement(*c, facts) != Requirement::NotExposed)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN: InvocationFacts = InvocationFacts {
        has_portal: false,
        has_questions: false,
    };

    #[test]
    fn test_table_order_matches_enum() {
        for cap in Capability::ALL {
            assert_eq!(cap.spec().capability, cap);
            assert_eq!(Capability::from_name(cap.name()), Some(cap));
            let wire = serde_json::to_value(cap).unwrap();
            assert_eq!(wire, cap.name());
        }
        assert_eq!(Capability::from_name("delete_everything"), None);
    }

    #[test]
    fn test_minimal_job_exposes_two_capabilities() {
        assert_eq!(
            exposed(PLAIN),
            vec![Capability::TailorResume, Capability::GenerateCoverLetter]
        );
        assert_eq!(
            requirement(Capability::GenerateCoverLetter, PLAIN),
            Requirement::Mandatory
        );
    }

    #[test]
    fn test_questions_and_portal_expand_the_set() {
        let facts = InvocationFacts {
            has_portal: true,
            has_questions: true,
        };
        assert_eq!(exposed(facts).len(), 5);
        assert!(matches!(
            requirement(Capability::GenerateCoverLetter, facts),
            Requirement::Conditional(_)
        ));
        assert_eq!(
            requirement(Capability::SubmitPortal, facts),
            Requirement::Mandatory
        );
    }

    #[test]
    fn test_submit_schema_lists_answers() {
        let schema = Capability::SubmitPortal.input_schema();
        assert_eq!(schema["properties"]["answers"]["type"], "array");
    }
}
