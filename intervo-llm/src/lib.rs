//! # Intervo LLM Integration
//!
//! Unified interface over chat-completion providers for the interview
//! engine. `LlmInterviewer` implements the core `LanguageModel` port on top
//! of any [`ChatProvider`] (OpenAI, Azure OpenAI, or the mock); prompt
//! templates and JSON response parsing live here so the engine never sees
//! provider wire formats.

pub mod error;
pub mod interviewer;
pub mod mock_model;
pub mod prompts;
pub mod providers;

pub use error::{LlmError, Result};
pub use interviewer::LlmInterviewer;
pub use mock_model::MockLanguageModel;
pub use providers::{
  create_provider, AzureOpenAiProvider, ChatMessage, ChatProvider, ChatRequest, ChatResponse,
  MockChatProvider, OpenAiProvider, TokenUsage,
};
