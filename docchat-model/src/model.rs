//! The [`ChatModel`] trait shared by every provider.

use std::pin::Pin;

use async_trait::async_trait;
use futures::{Stream, StreamExt};

use crate::error::Result;
use crate::message::Message;

/// A lazy, finite stream of answer fragments.
///
/// Dropping the stream releases whatever the provider holds open for it
/// (for HTTP providers, the response body and its connection). Fragments that
/// were already yielded are not replayed.
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// A chat-completion backend.
///
/// Providers implement the message-based methods; the prompt-based
/// [`complete`](ChatModel::complete) and [`stream`](ChatModel::stream)
/// wrap the prompt into a single user message.
///
/// # Example
///
/// ```rust,ignore
/// use docchat_model::{ChatModel, MockChatModel};
///
/// let model = MockChatModel::new("Paris");
/// let answer = model.complete("What is the capital of France?").await?;
/// ```
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// The model identifier, used in logs and responses.
    fn name(&self) -> &str;

    /// Run a chat completion over the given messages and return the full answer.
    async fn complete_messages(&self, messages: &[Message]) -> Result<String>;

    /// Run a chat completion and return the answer as it is produced.
    async fn stream_messages(&self, messages: &[Message]) -> Result<ChatStream>;

    /// Complete a single user prompt.
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.complete_messages(&[Message::user(prompt)]).await
    }

    /// Stream the answer to a single user prompt.
    async fn stream(&self, prompt: &str) -> Result<ChatStream> {
        self.stream_messages(&[Message::user(prompt)]).await
    }
}

/// Collect a [`ChatStream`] into one string, failing on the first error.
pub async fn collect_stream(mut stream: ChatStream) -> Result<String> {
    let mut answer = String::new();
    while let Some(fragment) = stream.next().await {
        answer.push_str(&fragment?);
    }
    Ok(answer)
}

/// A stream that yields a single fragment.
pub fn single_fragment(text: impl Into<String>) -> ChatStream {
    Box::pin(futures::stream::once(futures::future::ready(Ok(text.into()))))
}
