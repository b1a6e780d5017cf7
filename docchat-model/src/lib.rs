//! # docchat-model
//!
//! Chat model integrations for docchat.
//!
//! ## Overview
//!
//! Every provider implements [`ChatModel`], which offers a full completion and
//! a streaming completion over a list of role-tagged [`Message`]s, plus
//! prompt-only shortcuts. Two providers ship with the crate:
//!
//! - [`OpenAIChatModel`] - OpenAI and OpenAI-compatible servers (feature `openai`)
//! - [`MockChatModel`] - in-memory model for tests and offline runs
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docchat_model::{ChatModel, MockChatModel};
//!
//! let model = MockChatModel::new("Hello!");
//! let answer = model.complete("Say hello").await?;
//! assert_eq!(answer, "Hello!");
//! ```
//!
//! ## Streaming
//!
//! [`ChatModel::stream`] returns a [`ChatStream`], a boxed `futures::Stream`
//! of text fragments. Drop it to cancel: the HTTP response behind it is closed
//! with it.

pub mod error;
pub mod message;
pub mod mock;
pub mod model;
#[cfg(feature = "openai")]
pub mod openai;

pub use error::{ModelError, Result};
pub use message::{Message, Role};
pub use mock::MockChatModel;
pub use model::{ChatModel, ChatStream, collect_stream, single_fragment};
#[cfg(feature = "openai")]
pub use openai::{OpenAIChatModel, OpenAIConfig};
