//! Provider-agnostic LLM integration for the briefing pipeline.
//!
//! This crate exposes a common [`traits::LlmClient`] interface with concrete
//! OpenAI-compatible and Ollama implementations, the [`synthesize`] step
//! that turns query + context into a raw completion, and the [`briefing`]
//! parser that structures that completion into a [`briefing::Briefing`].

pub mod briefing;
pub mod ollama;
pub mod openai;
pub mod synthesize;
pub mod traits;

pub use briefing::{Briefing, Confidence, NOT_PROVIDED};
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
pub use synthesize::BriefingSynthesizer;
pub use traits::{LlmClient, LlmError, LlmResponse};

/// Default model recommendation for briefing synthesis.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2:3b";
