use std::time::Duration;

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ChatError;

/// Longest slice of a non-JSON error body kept in a [`ChatError::Status`]
const MAX_DETAIL_CHARS: usize = 200;

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct ChatReply {
    response: Option<String>,
    // Vague prompts are answered with a clarification under `message`
    message: Option<String>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    detail: String,
}

/// One entry of the server's thread memory
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ThreadEntry {
    #[serde(default)]
    pub author: String,
    pub message: String,
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Deserialize)]
struct MemoryResponse {
    messages: Vec<ThreadEntry>,
}

#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
}

impl ChatClient {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ChatError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| ChatError::Network {
            endpoint: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Post one message to `/chat` and return the assistant's reply text.
    ///
    /// `message` is sent exactly as given.
    pub async fn send(&self, message: &str) -> Result<String, ChatError> {
        let url = format!("{}/chat", self.base_url);
        debug!(%url, chars = message.chars().count(), "posting chat message");

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { message })
            .send()
            .await
            .map_err(|e| ChatError::from_transport(&url, e))?;

        let body = success_body(&url, response).await?;
        let reply: ChatReply = serde_json::from_str(&body)
            .map_err(|e| ChatError::MalformedBody(e.to_string()))?;

        reply.response.or(reply.message).ok_or_else(|| {
            ChatError::MalformedBody("reply has no `response` field".to_string())
        })
    }

    /// Fetch the server's thread memory
    pub async fn memory(&self) -> Result<Vec<ThreadEntry>, ChatError> {
        let url = format!("{}/memory", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ChatError::from_transport(&url, e))?;

        let body = success_body(&url, response).await?;
        let memory: MemoryResponse = serde_json::from_str(&body)
            .map_err(|e| ChatError::MalformedBody(e.to_string()))?;
        Ok(memory.messages)
    }

    /// Ask the server to forget its thread memory
    pub async fn clear_memory(&self) -> Result<(), ChatError> {
        let url = format!("{}/memory/clear", self.base_url);

        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|e| ChatError::from_transport(&url, e))?;

        success_body(&url, response).await?;
        Ok(())
    }
}

async fn success_body(url: &str, response: Response) -> Result<String, ChatError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ChatError::from_transport(url, e))?;

    if !status.is_success() {
        warn!(%url, status = status.as_u16(), "chat endpoint returned an error status");
        return Err(ChatError::Status {
            status: status.as_u16(),
            detail: error_detail(&body),
        });
    }

    Ok(body)
}

fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorDetail>(body) {
        Ok(parsed) => parsed.detail,
        Err(_) => body.trim().chars().take(MAX_DETAIL_CHARS).collect(),
    }
}
