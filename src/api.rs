//! # Analysis Service Client
//!
//! HTTP seam to the external analysis service. Each category has its own
//! endpoint, `POST {base}/analyze/{category}`, answering `{"result": "..."}`.

use crate::models::{AnalysisRequest, AnalyzeResponse, Category, ErrorResponse};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Version of the client, used in User-Agent header
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error types for analysis requests.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Nothing to analyze; the request is never sent
    #[error("No code provided")]
    EmptyCode,

    /// Could not reach the service (connection refused, DNS, TLS, ...)
    #[error("Network error: {message}")]
    Network { message: String },

    /// The request did not finish within the configured timeout
    #[error("Request timed out after {after:?}")]
    Timeout { after: Duration },

    /// 5xx from the service
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// 4xx from the service, e.g. `{"error": "No code provided"}`
    #[error("Request error ({status}): {message}")]
    ClientError { status: u16, message: String },

    /// The body was not the expected JSON
    #[error("Failed to parse response: {message}")]
    ParseError { message: String },
}

impl ApiError {
    pub fn is_network_error(&self) -> bool {
        matches!(self, ApiError::Network { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Timeout { .. })
    }

    pub fn is_server_error(&self) -> bool {
        matches!(self, ApiError::Server { .. })
    }
}

/// Anything that can answer an analysis request for one category.
pub trait AnalysisBackend: Send + Sync {
    fn analyze(
        &self,
        category: Category,
        request: &AnalysisRequest,
    ) -> impl Future<Output = Result<String, ApiError>> + Send;
}

/// reqwest-backed client for the analysis service
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    client: Client,
    timeout: Duration,
}

impl HttpBackend {
    /// Create a client with JSON headers and a per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let agent = HeaderValue::from_str(&format!("cognitia/{}", VERSION))
            .unwrap_or_else(|_| HeaderValue::from_static("cognitia"));
        headers.insert(USER_AGENT, agent);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network {
                message: e.to_string(),
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, category: Category) -> String {
        format!("{}/analyze/{}", self.base_url, category.endpoint())
    }

    fn map_transport_error(&self, error: reqwest::Error) -> ApiError {
        if error.is_timeout() {
            ApiError::Timeout {
                after: self.timeout,
            }
        } else {
            ApiError::Network {
                message: error.to_string(),
            }
        }
    }
}

impl AnalysisBackend for HttpBackend {
    async fn analyze(
        &self,
        category: Category,
        request: &AnalysisRequest,
    ) -> Result<String, ApiError> {
        if request.code.trim().is_empty() {
            return Err(ApiError::EmptyCode);
        }

        let url = self.endpoint(category);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request.body_for(category))
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(if status.is_server_error() {
                ApiError::Server {
                    status: status.as_u16(),
                    message,
                }
            } else {
                ApiError::ClientError {
                    status: status.as_u16(),
                    message,
                }
            });
        }

        serde_json::from_str::<AnalyzeResponse>(&body)
            .map(|r| r.result)
            .map_err(|e| ApiError::ParseError {
                message: e.to_string(),
            })
    }
}
