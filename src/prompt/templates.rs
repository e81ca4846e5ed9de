//! 内置模板与模板加载
//!
//! load(kind)：配置了覆盖文件且可读时返回文件内容，否则返回内置默认模板。

use std::path::PathBuf;

use crate::config::TemplatesSection;

pub const RESUME_TEMPLATE: &str = r#"You are an expert resume writer helping a candidate tailor their resume for a specific job.

Job Information:
- Title: {{ job.title }}
- Company: {{ job.company }}
- Location: {{ job.location }}
- Type: {{ job.type }}
- Experience: {{ job.experience }}
- Description: {{ job.description }}
- Requirements: {{ job.requirements }}

Candidate Profile:
- Name: {{ profile.name }}
- Email: {{ profile.email }}
- Headline: {{ profile.headline }}
- Summary: {{ profile.summary }}
- Skills: {{ profile.skills }}
- Resume: {{ profile.resume_text }}

Task:
Create a tailored resume summary that:
1. Highlights the candidate's most relevant experience for this specific role
2. Uses keywords from the job description naturally
3. Is concise (3-5 sentences)
4. Includes a bullet list of the top 3-5 skill alignments

Return ONLY the tailored content, no preamble or explanation. Keep it plain text."#;

pub const COVER_LETTER_TEMPLATE: &str = r#"You are an expert cover letter writer helping a candidate apply for a job.

Job Information:
- Title: {{ job.title }}
- Company: {{ job.company }}
- Location: {{ job.location }}
- Type: {{ job.type }}
- Experience: {{ job.experience }}
- Description: {{ job.description }}

Candidate Profile:
- Name: {{ profile.name }}
- Email: {{ profile.email }}
- Headline: {{ profile.headline }}
- Summary: {{ profile.summary }}
- Skills: {{ profile.skills }}
- Resume: {{ resume_text }}

Write a professional cover letter that:
1. Shows genuine interest in the company and role
2. Highlights 2-3 relevant strengths from the resume
3. Closes with a confident call to action

Format:
- 3 short paragraphs maximum
- Start with "Dear Hiring Manager,"
- Sign off with "Sincerely, {{ profile.name }}"

Return ONLY the cover letter, no preamble or explanation."#;

pub const QUESTION_ANSWERING_TEMPLATE: &str = r#"You are helping a job candidate answer application questions.

Job:
- Title: {{ job.title }}
- Company: {{ job.company }}
- Location: {{ job.location }}
- Type: {{ job.type }}
- Description: {{ job.description }}

Candidate:
- Name: {{ profile.name }}
- Email: {{ profile.email }}
- Resume: {{ resume_text }}

Answer the following application questions on behalf of the candidate.
Base your answers on the candidate's resume and the job description.
Keep answers concise and professional (2-3 sentences maximum per question).
For yes/no questions give brief context; for multiple choice pick the most appropriate option.

Questions:
{{ questions }}

Return ONLY a JSON array with exactly {{ question_count }} entries in this format:
[
  {"question": "...", "answer": "..."},
  {"question": "...", "answer": "..."}
]

Copy each question text exactly. Do not include any other text or explanation, just the JSON array."#;

pub const AGENT_SYSTEM_TEMPLATE: &str = r#"You are an expert job application assistant that helps candidates apply to jobs.

You can invoke these capabilities:
{{ capabilities }}

To invoke a capability, reply with exactly one JSON object and nothing else:
{"capability": "<name>", "args": { ... } }
Its result will be sent back to you as an observation.

Call-format schema:
{{ call_schema }}

Guidelines:
- ALWAYS tailor the resume first; it provides context for the other tasks.
- If an external portal exists, inspect it before deciding whether a cover letter or answers are needed.
- Pass outputs of earlier capabilities (tailored resume, cover letter, answers) as arguments to later ones.
- Submit to the external portal last, exactly once, after everything it needs is ready.
- Do not invoke a capability that is not needed.

When all required work is done, reply with a short plain-text summary of what was generated (no JSON)."#;

/// 模板种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    Resume,
    CoverLetter,
    QuestionAnswering,
    AgentSystem,
}

impl TemplateKind {
    pub fn builtin(self) -> &'static str {
        match self {
            TemplateKind::Resume => RESUME_TEMPLATE,
            TemplateKind::CoverLetter => COVER_LETTER_TEMPLATE,
            TemplateKind::QuestionAnswering => QUESTION_ANSWERING_TEMPLATE,
            TemplateKind::AgentSystem => AGENT_SYSTEM_TEMPLATE,
        }
    }
}

/// 模板加载器：持有各链路的覆盖路径
#[derive(Debug, Clone, Default)]
pub struct TemplateLoader {
    overrides: TemplatesSection,
}

impl TemplateLoader {
    pub fn new(overrides: TemplatesSection) -> Self {
        Self { overrides }
    }

    fn override_path(&self, kind: TemplateKind) -> Option<&PathBuf> {
        match kind {
            TemplateKind::Resume => self.overrides.resume.as_ref(),
            TemplateKind::CoverLetter => self.overrides.cover_letter.as_ref(),
            TemplateKind::QuestionAnswering => self.overrides.question_answering.as_ref(),
            TemplateKind::AgentSystem => self.overrides.agent_system.as_ref(),
        }
    }

    pub fn load(&self, kind: TemplateKind) -> String {
        if let Some(path) = self.override_path(kind) {
            match std::fs::read_to_string(path) {
                Ok(text) => return text,
                Err(e) => tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "template override unreadable, using built-in"
                ),
            }
        }
        kind.builtin().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{render, PromptContext};

    #[test]
    fn test_builtin_templates_render() {
        let ctx = PromptContext::new()
            .with("capabilities", "- tailor_resume")
            .with("call_schema", "{}");
        for kind in [
            TemplateKind::Resume,
            TemplateKind::CoverLetter,
            TemplateKind::QuestionAnswering,
            TemplateKind::AgentSystem,
        ] {
            assert!(render(kind.builtin(), &ctx).is_ok(), "{kind:?}");
        }
    }

    #[test]
    fn test_load_prefers_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.txt");
        std::fs::write(&path, "Custom {{ job.title }}").unwrap();

        let loader = TemplateLoader::new(TemplatesSection {
            resume: Some(path),
            ..Default::default()
        });
        assert_eq!(loader.load(TemplateKind::Resume), "Custom {{ job.title }}");
        assert_eq!(loader.load(TemplateKind::CoverLetter), COVER_LETTER_TEMPLATE);
    }

    #[test]
    fn test_missing_override_falls_back_to_builtin() {
        let loader = TemplateLoader::new(TemplatesSection {
            question_answering: Some(PathBuf::from("/nonexistent/qa.txt")),
            ..Default::default()
        });
        assert_eq!(
            loader.load(TemplateKind::QuestionAnswering),
            QUESTION_ANSWERING_TEMPLATE
        );
    }
}
