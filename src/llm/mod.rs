//! LLM 层：客户端抽象与实现（OpenAI 兼容端点 / Mock）

pub mod message;
pub mod mock;
pub mod openai;
pub mod traits;

pub use message::{Message, Role};
pub use mock::{MockCall, MockLlmClient};
pub use openai::OpenAiClient;
pub use traits::{CompletionOptions, LlmClient};
