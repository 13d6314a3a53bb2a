use std::sync::{Arc, Mutex, MutexGuard};

use log::error;
use serde::Deserialize;
use serde_json::json;

use crate::client::transport::Transport;
use crate::client::{endpoint, ClientError};
use crate::data::DataError;

/// Substituted when the backend answers without a usable reply.
pub const FALLBACK_REPLY: &str = "Sorry, I couldn't understand that.";

#[derive(Debug, Deserialize)]
struct WireReply {
    #[serde(default, alias = "response")]
    reply: Option<String>,
}

/// Relays chat messages to the backend.
#[derive(Debug, Clone)]
pub struct ChatClient<T> {
    transport: T,
    base_url: String,
}

impl<T: Transport> ChatClient<T> {
    pub fn new(transport: T, base_url: impl Into<String>) -> Self {
        ChatClient {
            transport,
            base_url: base_url.into(),
        }
    }

    pub async fn send_message(&self, text: &str) -> Result<String, ClientError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::EmptyInput);
        }
        let url = endpoint(&self.base_url, &["chat"])?;
        let reply = self
            .transport
            .post_json(&url, &json!({ "message": text }))
            .await?
            .error_for_status()?;
        let wire: WireReply = serde_json::from_str(&reply.body).map_err(DataError::from)?;
        Ok(wire
            .reply
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| FALLBACK_REPLY.to_string()))
    }
}

/// Visible chat log, oldest line first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    lines: Vec<String>,
}

impl Transcript {
    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// A chat client bound to a shared transcript.
///
/// The user's line is recorded before the request goes out; the reply line is
/// only recorded on success.
#[derive(Debug, Clone)]
pub struct ChatSession<T> {
    client: ChatClient<T>,
    transcript: Arc<Mutex<Transcript>>,
}

impl<T: Transport> ChatSession<T> {
    pub fn new(client: ChatClient<T>) -> Self {
        ChatSession {
            client,
            transcript: Arc::default(),
        }
    }

    pub fn transcript(&self) -> MutexGuard<'_, Transcript> {
        self.transcript.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub async fn send(&self, text: &str) -> Result<String, ClientError> {
        let message = self.record_user_line(text)?;
        self.relay(&message).await
    }

    /// Validates `text` and records the user's line. Returns the trimmed
    /// message to relay.
    pub fn record_user_line(&self, text: &str) -> Result<String, ClientError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::EmptyInput);
        }
        self.transcript().push(format!("You: {text}"));
        Ok(text.to_string())
    }

    /// Sends an already recorded message and records the reply.
    pub async fn relay(&self, message: &str) -> Result<String, ClientError> {
        match self.client.send_message(message).await {
            Ok(reply) => {
                self.transcript().push(format!("Chatbot: {reply}"));
                Ok(reply)
            }
            Err(e) => {
                error!("error communicating with chatbot: {e}");
                Err(e)
            }
        }
    }
}
