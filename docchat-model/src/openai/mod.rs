//! OpenAI-compatible chat provider.
//!
//! Built on `async-openai`, pointed at `{base_url}/chat/completions`. Works
//! against the OpenAI API and any server exposing the same shape (Ollama,
//! vLLM, LM Studio, ...). Failed requests are not retried.
//!
//! # Example
//!
//! ```rust,ignore
//! use docchat_model::openai::{OpenAIChatModel, OpenAIConfig};
//!
//! let model = OpenAIChatModel::new(OpenAIConfig::new(
//!     std::env::var("OPENAI_API_KEY").unwrap(),
//!     "gpt-4o-mini",
//! ))?;
//!
//! // Local OpenAI-compatible server
//! let local = OpenAIChatModel::compatible("unused", "http://localhost:11434/v1", "llama3.2")?;
//! ```

mod client;
mod config;

pub use client::OpenAIChatModel;
pub use config::{DEFAULT_CHAT_MODEL, OPENAI_API_BASE, OpenAIConfig};
