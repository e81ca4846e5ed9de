//! Prompt 层：模板渲染与模板加载

pub mod renderer;
pub mod templates;

pub use renderer::{render, render_question_list, PromptContext};
pub use templates::{
    TemplateKind, TemplateLoader, AGENT_SYSTEM_TEMPLATE, COVER_LETTER_TEMPLATE,
    QUESTION_ANSWERING_TEMPLATE, RESUME_TEMPLATE,
};
