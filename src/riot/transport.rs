//! HTTP transport seam for the Riot client.
//!
//! The raw GET lives behind a trait so tests can script status sequences
//! (429s, 500s, short pages) without a network.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use thiserror::Error;

/// Errors the transport itself can produce.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),
}

/// Minimal view of an HTTP response: status, retry hint, body.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    /// Parsed `Retry-After` header, in seconds.
    pub retry_after: Option<u64>,
    pub body: String,
}

impl ApiResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            retry_after: None,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            retry_after: None,
            body: String::new(),
        }
    }
}

/// Issues one GET and reports what came back. Implementations must not
/// retry; retry policy belongs to the client.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn get(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> Result<ApiResponse, TransportError>;
}

/// reqwest-backed transport with a per-request timeout and the
/// `X-Riot-Token` auth header on every call.
pub struct HttpTransport {
    client: reqwest::Client,
    api_key: String,
}

impl HttpTransport {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        Ok(Self { client, api_key })
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn get(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> Result<ApiResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .header("X-Riot-Token", &self.api_key)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::Connect(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok());
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        Ok(ApiResponse {
            status,
            retry_after,
            body,
        })
    }
}

/// Scripted transport for tests.
///
/// Routes match on a URL substring and repeat their response; the global
/// queue pops one response per unmatched call, repeating its last entry
/// once drained. Every call is recorded with the (tokio) instant it was
/// made, so paused-time tests can assert on waits between attempts.
#[cfg(test)]
pub mod mock {
    use std::sync::Mutex;

    use tokio::time::Instant;

    use super::*;

    #[derive(Debug, Clone)]
    pub struct RecordedCall {
        pub url: String,
        pub query: Vec<(String, String)>,
        pub at: Instant,
    }

    #[derive(Default)]
    pub struct MockTransport {
        routes: Mutex<Vec<(String, ApiResponse)>>,
        queue: Mutex<Vec<ApiResponse>>,
        fail_connect: Mutex<u32>,
        pub calls: Mutex<Vec<RecordedCall>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Respond with `response` whenever the URL contains `fragment`.
        pub fn route(self, fragment: impl Into<String>, response: ApiResponse) -> Self {
            self.routes.lock().unwrap().push((fragment.into(), response));
            self
        }

        /// Queue responses served in order to calls no route matches.
        pub fn respond_with(self, responses: Vec<ApiResponse>) -> Self {
            *self.queue.lock().unwrap() = responses;
            self
        }

        /// Fail the first `count` calls with a connection error.
        pub fn fail_connects(self, count: u32) -> Self {
            *self.fail_connect.lock().unwrap() = count;
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn call_instants(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().iter().map(|c| c.at).collect()
        }
    }

    #[async_trait]
    impl ApiTransport for MockTransport {
        async fn get(
            &self,
            url: &str,
            query: &[(String, String)],
        ) -> Result<ApiResponse, TransportError> {
            self.calls.lock().unwrap().push(RecordedCall {
                url: url.to_string(),
                query: query.to_vec(),
                at: Instant::now(),
            });

            {
                let mut failures = self.fail_connect.lock().unwrap();
                if *failures > 0 {
                    *failures -= 1;
                    return Err(TransportError::Connect("connection refused".to_string()));
                }
            }

            if let Some((_, response)) = self
                .routes
                .lock()
                .unwrap()
                .iter()
                .find(|(fragment, _)| url.contains(fragment.as_str()))
            {
                return Ok(response.clone());
            }

            let mut queue = self.queue.lock().unwrap();
            if queue.len() > 1 {
                Ok(queue.remove(0))
            } else {
                queue
                    .first()
                    .cloned()
                    .ok_or_else(|| TransportError::Connect("mock has no response".to_string()))
            }
        }
    }
}
