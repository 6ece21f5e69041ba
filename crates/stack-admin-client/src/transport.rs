// crates/stack-admin-client/src/transport.rs
// ============================================================================
// Module: Admin API Transport
// Description: Authenticated JSON transport shared by every service client.
// Purpose: Build endpoint URLs, send requests, and capture transcripts.
// Dependencies: reqwest, serde_json, url, tracing
// ============================================================================

//! ## Overview
//! [`ServiceTransport`] owns the base endpoint for one service (compute or
//! identity), the admin token, and a shared [`Transcript`]. Every exchange is
//! recorded, including failures, so reports can show exactly what was sent.
//! Invariants:
//! - Path segments are percent-encoded individually; identifiers never alter
//!   the route shape.
//! - Requests are sent once. There is no retry loop.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use reqwest::Client;
use reqwest::Method;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderName;
use reqwest::header::HeaderValue;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Map;
use serde_json::Value;
use url::Url;

use crate::error::ClientError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header carrying the pre-issued admin token.
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Header selecting the compute API microversion.
pub const COMPUTE_MICROVERSION_HEADER: &str = "x-openstack-nova-api-version";

// ============================================================================
// SECTION: Transcript
// ============================================================================

/// One recorded HTTP exchange.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptEntry {
    /// Monotonic sequence number starting at 1.
    pub sequence: u64,
    /// Service label (`compute` or `identity`).
    pub service: String,
    /// HTTP method.
    pub method: String,
    /// Full request URL.
    pub url: String,
    /// Request JSON body, if any.
    pub request: Option<Value>,
    /// Response status, when a response was received.
    pub status: Option<u16>,
    /// Response JSON body (or a string for non-JSON bodies).
    pub response: Value,
    /// Transport or status error message.
    pub error: Option<String>,
}

/// Shared, append-only log of HTTP exchanges.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    /// Recorded entries guarded for concurrent clients.
    entries: Arc<Mutex<Vec<TranscriptEntry>>>,
}

impl Transcript {
    /// Creates an empty transcript.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the recorded entries.
    #[must_use]
    pub fn snapshot(&self) -> Vec<TranscriptEntry> {
        self.entries.lock().map_or_else(|_| Vec::new(), |entries| entries.clone())
    }

    /// Appends an entry, assigning the next sequence number.
    fn record(&self, mut entry: TranscriptEntry) {
        let Ok(mut guard) = self.entries.lock() else {
            return;
        };
        entry.sequence = u64::try_from(guard.len()).unwrap_or(u64::MAX).saturating_add(1);
        guard.push(entry);
    }
}

// ============================================================================
// SECTION: Service Transport
// ============================================================================

/// Authenticated transport bound to one service endpoint.
#[derive(Debug, Clone)]
pub struct ServiceTransport {
    /// Service label used in logs and transcripts.
    service: &'static str,
    /// Base endpoint (for example `https://cloud/compute/v2.1`).
    base: Url,
    /// Shared HTTP client.
    http: Client,
    /// Headers attached to every request (token, microversion).
    headers: HeaderMap,
    /// Shared transcript sink.
    transcript: Transcript,
}

impl ServiceTransport {
    /// Creates a transport for the given endpoint and token.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidEndpoint`] when the endpoint is not an
    /// absolute hierarchical URL, or [`ClientError::Config`] when the token is
    /// not a valid header value.
    pub fn new(
        service: &'static str,
        endpoint: &str,
        token: &str,
        http: Client,
        transcript: Transcript,
    ) -> Result<Self, ClientError> {
        let base = Url::parse(endpoint).map_err(|err| ClientError::InvalidEndpoint {
            url: endpoint.to_string(),
            reason: err.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidEndpoint {
                url: endpoint.to_string(),
                reason: "endpoint cannot carry path segments".to_string(),
            });
        }
        let mut token_value = HeaderValue::from_str(token)
            .map_err(|_| ClientError::Config("token is not a valid header value".to_string()))?;
        token_value.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(AUTH_TOKEN_HEADER), token_value);
        Ok(Self {
            service,
            base,
            http,
            headers,
            transcript,
        })
    }

    /// Attaches an additional header to every request.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] when the value is not a valid header.
    pub fn with_header(mut self, name: &'static str, value: &str) -> Result<Self, ClientError> {
        let value = HeaderValue::from_str(value)
            .map_err(|_| ClientError::Config(format!("invalid value for header {name}")))?;
        self.headers.insert(HeaderName::from_static(name), value);
        Ok(self)
    }

    /// Returns the base endpoint.
    #[must_use]
    pub const fn base(&self) -> &Url {
        &self.base
    }

    /// Builds an endpoint URL from path segments and query pairs.
    pub(crate) fn url(&self, segments: &[&str], query: &[(&str, String)]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        url
    }

    /// Sends a request and decodes the named envelope from the response.
    pub(crate) async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
        envelope: &str,
    ) -> Result<T, ClientError> {
        let mut response = self.execute(method, url, body).await?;
        let inner = response.get_mut(envelope).map(Value::take).ok_or_else(|| {
            ClientError::Decode {
                context: envelope.to_string(),
                message: "envelope missing from response".to_string(),
            }
        })?;
        serde_json::from_value(inner).map_err(|err| ClientError::Decode {
            context: envelope.to_string(),
            message: err.to_string(),
        })
    }

    /// Sends a request whose response body is ignored.
    pub(crate) async fn call_empty(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
    ) -> Result<(), ClientError> {
        self.execute(method, url, body).await.map(|_| ())
    }

    /// Sends one request, records it, and maps non-success statuses to errors.
    async fn execute(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
    ) -> Result<Value, ClientError> {
        let method_label = method.as_str().to_string();
        let url_label = url.to_string();
        tracing::debug!(
            service = self.service,
            method = %method_label,
            url = %url_label,
            "sending admin api request"
        );
        let mut request = self.http.request(method, url).headers(self.headers.clone());
        if let Some(body) = &body {
            request = request.json(body);
        }
        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                let message = err.to_string();
                self.record(&method_label, &url_label, body, None, Value::Null, Some(&message));
                return Err(ClientError::Transport {
                    method: method_label,
                    url: url_label,
                    message,
                });
            }
        };
        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(err) => {
                let message = err.to_string();
                self.record(
                    &method_label,
                    &url_label,
                    body,
                    Some(status.as_u16()),
                    Value::Null,
                    Some(&message),
                );
                return Err(ClientError::Transport {
                    method: method_label,
                    url: url_label,
                    message,
                });
            }
        };
        let payload = parse_body(&text);
        if !status.is_success() {
            let message = format!("status {}", status.as_u16());
            self.record(
                &method_label,
                &url_label,
                body,
                Some(status.as_u16()),
                payload,
                Some(&message),
            );
            tracing::debug!(
                service = self.service,
                status = status.as_u16(),
                url = %url_label,
                "admin api request failed"
            );
            return Err(ClientError::Status {
                method: method_label,
                url: url_label,
                status: status.as_u16(),
                body: text,
            });
        }
        self.record(&method_label, &url_label, body, Some(status.as_u16()), payload.clone(), None);
        Ok(payload)
    }

    /// Appends an exchange to the shared transcript.
    fn record(
        &self,
        method: &str,
        url: &str,
        request: Option<Value>,
        status: Option<u16>,
        response: Value,
        error: Option<&str>,
    ) {
        self.transcript.record(TranscriptEntry {
            sequence: 0,
            service: self.service.to_string(),
            method: method.to_string(),
            url: url.to_string(),
            request,
            status,
            response,
            error: error.map(str::to_string),
        });
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Serializes a request body under its resource envelope, for example
/// `{"project": {...}}`.
pub(crate) fn envelope<T: Serialize>(name: &str, body: &T) -> Result<Value, ClientError> {
    let inner = serde_json::to_value(body).map_err(|err| ClientError::Encode {
        context: name.to_string(),
        message: err.to_string(),
    })?;
    let mut wrapped = Map::new();
    wrapped.insert(name.to_string(), inner);
    Ok(Value::Object(wrapped))
}

/// Parses a response body as JSON, keeping non-JSON text as a string value.
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
