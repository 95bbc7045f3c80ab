//! HTTP Transport
//!
//! The leaf of the request pipeline: one [`ApiRequest`] in, one physical HTTP attempt
//! out. It knows nothing about tokens, retries or refresh. [`ReqwestTransport`] is the
//! production implementation; tests substitute scripted fakes through
//! [`HttpTransport`].

use crate::shared::config::ClientConfig;
use crate::shared::error::SharedError;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single physical attempt: no HTTP response was obtained.
///
/// `Build` means nothing was sent at all: the client or request could not be put
/// together locally and will fail the same way on every attempt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("could not build request: {0}")]
    Build(String),
}

impl TransportError {
    /// Whether another attempt could get a response
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Build(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else if err.is_builder() {
            Self::Build(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

/// One field of a multipart body
#[derive(Debug, Clone, PartialEq)]
pub struct MultipartPart {
    pub name: String,
    pub content: PartContent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PartContent {
    Text(String),
    File {
        file_name: String,
        mime: String,
        bytes: Bytes,
    },
}

impl MultipartPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: PartContent::Text(value.into()),
        }
    }

    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            content: PartContent::File {
                file_name: file_name.into(),
                mime: mime.into(),
                bytes: bytes.into(),
            },
        }
    }
}

/// Request body. Multipart parts are kept as plain data so the form can be rebuilt
/// for every physical attempt.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(Vec<MultipartPart>),
}

/// Per-call overrides
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Replaces the configured per-attempt timeout
    pub timeout: Option<Duration>,
    /// Extra headers sent with every attempt
    pub headers: HeaderMap,
    /// Never attach the Authorization header
    pub skip_auth: bool,
    /// Treat 401 as a plain client error instead of refreshing
    pub skip_refresh: bool,
}

impl RequestOptions {
    /// Options for unauthenticated auth endpoints (login, register, password reset)
    pub fn public() -> Self {
        Self {
            skip_auth: true,
            skip_refresh: true,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// A logical request, independent of any transport
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    pub options: RequestOptions,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            options: RequestOptions::default(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query = pairs;
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, SharedError> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn multipart(mut self, parts: Vec<MultipartPart>) -> Self {
        self.body = RequestBody::Multipart(parts);
        self
    }

    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Value of a header set on this request
    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.options.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// A received HTTP response, any status
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn json(status: StatusCode, value: &serde_json::Value) -> Self {
        Self::new(status, value.to_string())
    }

    /// Best-effort human-readable message from an error body.
    ///
    /// Uses a `message` or `error` string field when the body is JSON, the raw text
    /// when it is short, and the canonical reason phrase otherwise.
    pub fn error_message(&self) -> String {
        if let Ok(value) = serde_json::from_slice::<serde_json::Value>(&self.body) {
            for key in ["message", "error"] {
                if let Some(message) = value.get(key).and_then(|v| v.as_str()) {
                    return message.to_string();
                }
            }
        }
        let text = String::from_utf8_lossy(&self.body);
        let text = text.trim();
        if !text.is_empty() && text.len() <= 200 && !text.starts_with('{') {
            return text.to_string();
        }
        self.status
            .canonical_reason()
            .unwrap_or("Unknown status")
            .to_string()
    }
}

/// Sends one physical HTTP attempt
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, TransportError>;
}

/// `reqwest`-backed transport
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    config: ClientConfig,
}

impl ReqwestTransport {
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, TransportError> {
        let url = self.config.api_url(&request.path);
        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .headers(request.options.headers.clone());

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(timeout) = request.options.timeout {
            builder = builder.timeout(timeout);
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(parts) => builder.multipart(build_form(parts)?),
        };

        tracing::debug!("[API] {} {}", request.method, url);

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

fn build_form(parts: &[MultipartPart]) -> Result<reqwest::multipart::Form, TransportError> {
    let mut form = reqwest::multipart::Form::new();
    for part in parts {
        form = match &part.content {
            PartContent::Text(value) => form.text(part.name.clone(), value.clone()),
            PartContent::File {
                file_name,
                mime,
                bytes,
            } => {
                let file = reqwest::multipart::Part::bytes(bytes.to_vec())
                    .file_name(file_name.clone())
                    .mime_str(mime)
                    .map_err(|e| {
                        TransportError::Build(format!(
                            "invalid mime type '{}' for part '{}': {}",
                            mime, part.name, e
                        ))
                    })?;
                form.part(part.name.clone(), file)
            }
        };
    }
    Ok(form)
}
