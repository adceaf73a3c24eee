//! HTTP executor kind: calls the action-executor service and reads discovered facts.

use crate::error::InvokeError;
use crate::types::{ExecutorSpec, FactMap};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, Url};
use std::time::Duration;
use tracing::{debug, info};

/// Per-call timeout for action executors.
pub const DEFAULT_ACTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Issues one HTTP request per action.
pub struct HttpExecutor {
    client: Client,
}

impl HttpExecutor {
    pub fn new(timeout: Duration) -> Result<Self, InvokeError> {
        let client = Client::builder()
            .no_proxy()
            .timeout(timeout)
            .build()
            .map_err(|e| InvokeError::BuildRequest(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub async fn execute(&self, spec: &ExecutorSpec) -> Result<FactMap, InvokeError> {
        let method = parse_method(&spec.method)?;
        let url = Url::parse(&spec.url)
            .map_err(|e| InvokeError::BuildRequest(format!("invalid url '{}': {}", spec.url, e)))?;
        let headers = build_headers(spec)?;

        info!(method = %method, url = %url, "Executing HTTP action");

        let mut request = self.client.request(method, url).headers(headers);
        if !spec.body.is_empty() {
            request = request.body(spec.body.clone());
        }

        let response = request.send().await.map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(InvokeError::Status(status.to_string()));
        }

        let facts = match response.bytes().await {
            Ok(body) => decode_discovered_facts(&body),
            Err(e) => {
                debug!(error = %e, "Failed to read action response body, no facts discovered");
                FactMap::new()
            }
        };

        if !facts.is_empty() {
            info!(facts = ?facts, "Facts discovered via HTTP");
        }
        Ok(facts)
    }
}

fn parse_method(method: &str) -> Result<Method, InvokeError> {
    if method.is_empty() {
        return Ok(Method::GET);
    }
    Method::from_bytes(method.as_bytes())
        .map_err(|e| InvokeError::BuildRequest(format!("invalid method '{}': {}", method, e)))
}

fn build_headers(spec: &ExecutorSpec) -> Result<HeaderMap, InvokeError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &spec.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| InvokeError::BuildRequest(format!("invalid header name '{}': {}", name, e)))?;
        let header_value = HeaderValue::from_str(value).map_err(|e| {
            InvokeError::BuildRequest(format!("invalid value for header '{}': {}", name, e))
        })?;
        headers.insert(header_name, header_value);
    }
    // A body always goes out as JSON, overriding any caller-supplied content type.
    if !spec.body.is_empty() {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }
    Ok(headers)
}

fn map_transport_error(error: reqwest::Error) -> InvokeError {
    if error.is_timeout() {
        InvokeError::Transport(format!("request timeout: {}", error))
    } else if error.is_connect() {
        InvokeError::Transport(format!("connection error: {}", error))
    } else if error.is_builder() {
        InvokeError::BuildRequest(error.to_string())
    } else {
        InvokeError::Transport(error.to_string())
    }
}

/// Decode a response body into discovered facts. Only the first JSON value is read and
/// anything after it is ignored. A first value that is not a JSON object (empty body,
/// array, scalar, garbage) yields no facts.
pub fn decode_discovered_facts(body: &[u8]) -> FactMap {
    serde_json::Deserializer::from_slice(body)
        .into_iter::<FactMap>()
        .next()
        .and_then(Result::ok)
        .unwrap_or_default()
}
