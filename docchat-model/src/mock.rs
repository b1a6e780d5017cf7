//! In-memory chat model for tests and offline runs.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{ModelError, Result};
use crate::message::{Message, Role};
use crate::model::{ChatModel, ChatStream};

#[derive(Debug, Clone)]
enum Reply {
    Fixed(String),
    Echo,
}

/// A [`ChatModel`] that never leaves the process.
///
/// Replies with a fixed string (or echoes the last user message), streams the
/// reply word by word, and records every request so tests can assert on call
/// counts and prompt contents.
#[derive(Debug)]
pub struct MockChatModel {
    name: String,
    reply: Reply,
    failing: AtomicBool,
    calls: AtomicUsize,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl MockChatModel {
    /// A mock that always answers with `reply`.
    pub fn new(reply: impl Into<String>) -> Self {
        Self::with_reply(Reply::Fixed(reply.into()))
    }

    /// A mock that answers with the content of the last user message.
    pub fn echo() -> Self {
        Self::with_reply(Reply::Echo)
    }

    fn with_reply(reply: Reply) -> Self {
        Self {
            name: "mock".to_string(),
            reply,
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Make every subsequent call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of completion or stream calls received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request received, oldest first.
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// The user content of the most recent request.
    pub fn last_prompt(&self) -> Option<String> {
        let requests = self.requests.lock().unwrap_or_else(PoisonError::into_inner);
        requests.last().and_then(|messages| last_user_content(messages))
    }

    fn record(&self, messages: &[Message]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).push(messages.to_vec());

        if self.failing.load(Ordering::SeqCst) {
            return Err(ModelError::Api {
                provider: "Mock".into(),
                code: Some("unavailable".into()),
                message: "mock model configured to fail".into(),
            });
        }

        let reply = match &self.reply {
            Reply::Fixed(text) => text.clone(),
            Reply::Echo => last_user_content(messages).unwrap_or_default(),
        };
        debug!(provider = "Mock", message_count = messages.len(), "mock completion");
        Ok(reply)
    }
}

fn last_user_content(messages: &[Message]) -> Option<String> {
    messages.iter().rev().find(|m| m.role == Role::User).map(|m| m.content.clone())
}

#[async_trait]
impl ChatModel for MockChatModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete_messages(&self, messages: &[Message]) -> Result<String> {
        self.record(messages)
    }

    async fn stream_messages(&self, messages: &[Message]) -> Result<ChatStream> {
        let reply = self.record(messages)?;
        let fragments: Vec<Result<String>> =
            reply.split_inclusive(' ').map(|word| Ok(word.to_string())).collect();
        Ok(Box::pin(futures::stream::iter(fragments)))
    }
}
