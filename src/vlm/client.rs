//! VLM client seam — the trait the pipeline talks to, its Ollama-backed
//! production implementation, and a configurable mock for tests.
//!
//! Vision models are driven through Ollama `/api/chat`: chat-template
//! models expect the messages-based format when images are attached.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::VlmError;

/// One fully-assembled model call: system instruction, user task text,
/// and an optional base64-encoded JPEG attached to the user turn.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub image_base64: Option<String>,
}

impl ChatRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            image_base64: None,
        }
    }

    pub fn with_image(mut self, image_base64: impl Into<String>) -> Self {
        self.image_base64 = Some(image_base64.into());
        self
    }
}

/// Abstraction over the model server. One blocking call per invocation;
/// the per-call timeout is supplied by the invoker, not baked into the
/// client, so primary and fallback models can use different budgets.
pub trait VlmClient: Send + Sync {
    fn chat(&self, model: &str, request: &ChatRequest, timeout: Duration)
        -> Result<String, VlmError>;
}

// ──────────────────────────────────────────────
// Ollama wire types
// ──────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaChatMessage<'a>>,
    stream: bool,
    options: OllamaChatOptions,
}

#[derive(Debug, Serialize)]
struct OllamaChatMessage<'a> {
    role: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    images: Option<Vec<&'a str>>,
}

/// Deterministic judgments: temperature 0, as the original assessors run.
#[derive(Debug, Serialize)]
struct OllamaChatOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

// ──────────────────────────────────────────────
// OllamaClient
// ──────────────────────────────────────────────

/// Production client for a local Ollama instance.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl OllamaClient {
    pub fn new(base_url: &str) -> Self {
        // No client-level timeout: each call carries its own.
        let client = reqwest::blocking::Client::builder()
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl VlmClient for OllamaClient {
    fn chat(
        &self,
        model: &str,
        request: &ChatRequest,
        timeout: Duration,
    ) -> Result<String, VlmError> {
        let url = format!("{}/api/chat", self.base_url);

        let mut messages = Vec::with_capacity(2);
        if !request.system.is_empty() {
            messages.push(OllamaChatMessage {
                role: "system",
                content: &request.system,
                images: None,
            });
        }
        messages.push(OllamaChatMessage {
            role: "user",
            content: &request.user,
            images: request.image_base64.as_deref().map(|img| vec![img]),
        });

        let body = OllamaChatRequest {
            model,
            messages,
            stream: false,
            options: OllamaChatOptions { temperature: 0.0 },
        };

        let response = self
            .client
            .post(&url)
            .timeout(timeout)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    VlmError::Timeout(timeout.as_secs())
                } else if e.is_connect() {
                    VlmError::Connection(self.base_url.clone())
                } else {
                    VlmError::ResponseDecode(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(VlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaChatResponse = response
            .json()
            .map_err(|e| VlmError::ResponseDecode(e.to_string()))?;

        Ok(parsed.message.content)
    }
}

// ──────────────────────────────────────────────
// MockVlmClient
// ──────────────────────────────────────────────

/// Mock client for tests — replays a scripted sequence of outcomes and
/// records every prompt it receives.
pub struct MockVlmClient {
    script: Mutex<Vec<Result<String, VlmError>>>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockVlmClient {
    /// Every call returns the same response text.
    pub fn always(response: impl Into<String>) -> Self {
        Self {
            script: Mutex::new(vec![Ok(response.into())]),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with a connection error.
    pub fn failing() -> Self {
        Self {
            script: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Calls consume the given outcomes in order; the last entry repeats.
    pub fn sequence(outcomes: Vec<Result<String, VlmError>>) -> Self {
        Self {
            script: Mutex::new(outcomes),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Number of chat calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Full prompt text (system plus user turn) of every call, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl VlmClient for MockVlmClient {
    fn chat(
        &self,
        _model: &str,
        request: &ChatRequest,
        _timeout: Duration,
    ) -> Result<String, VlmError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .unwrap()
            .push(format!("{}\n{}", request.system, request.user));

        let script = self.script.lock().unwrap();
        if script.is_empty() {
            return Err(VlmError::Connection("mock".into()));
        }
        let outcome = script.get(index).unwrap_or_else(|| script.last().unwrap());
        match outcome {
            Ok(text) => Ok(text.clone()),
            Err(VlmError::Timeout(secs)) => Err(VlmError::Timeout(*secs)),
            Err(VlmError::Connection(url)) => Err(VlmError::Connection(url.clone())),
            Err(VlmError::Api { status, body }) => Err(VlmError::Api {
                status: *status,
                body: body.clone(),
            }),
            Err(e) => Err(VlmError::ResponseDecode(e.to_string())),
        }
    }
}

/// Test double that panics if the model is ever invoked. Used to prove
/// deterministic zero-cost paths really make no model calls.
pub struct PanicVlmClient;

impl VlmClient for PanicVlmClient {
    fn chat(
        &self,
        _model: &str,
        _request: &ChatRequest,
        _timeout: Duration,
    ) -> Result<String, VlmError> {
        panic!("model invoked on a path that must not call the model");
    }
}
