//! HTTP client wrapper.
//!
//! Provides a thin layer over reqwest with:
//! - Configurable timeouts and a fixed user agent
//! - Uniform mapping of transport failures to [`MigrateError`]
//! - Conversion of 429 responses into [`MigrateError::RateLimited`]
//!
//! All other statuses are returned to the caller, which decides what a
//! non-success status means for its store.

use crate::config::NetworkConfig;
use crate::{MigrateError, Result};
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::debug;

/// HTTP client shared by the store clients.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    default_timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_timeout(NetworkConfig::REQUEST_TIMEOUT)
    }

    /// Create a new HTTP client with a custom default timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(NetworkConfig::USER_AGENT)
            .build()
            .map_err(|e| MigrateError::Network {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(e),
            })?;

        Ok(Self {
            client,
            default_timeout: timeout,
        })
    }

    /// Make a GET request.
    pub async fn get(&self, url: &str) -> Result<Response> {
        self.send(Method::GET, url, self.client.get(url)).await
    }

    /// Make a GET request authorized with a bearer token.
    pub async fn get_bearer(&self, url: &str, token: &str) -> Result<Response> {
        self.send(Method::GET, url, self.client.get(url).bearer_auth(token))
            .await
    }

    /// Make a POST request with JSON body.
    pub async fn post_json<T: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<Response> {
        self.send(Method::POST, url, self.client.post(url).json(body))
            .await
    }

    /// Make a POST request with a URL-encoded form body.
    pub async fn post_form<T: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        form: &T,
    ) -> Result<Response> {
        self.send(Method::POST, url, self.client.post(url).form(form))
            .await
    }

    /// Make a PATCH request with JSON body, authorized with a bearer token.
    pub async fn patch_json_bearer<T: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        token: &str,
        body: &T,
    ) -> Result<Response> {
        let request = self.client.patch(url).bearer_auth(token).json(body);
        self.send(Method::PATCH, url, request).await
    }

    /// Make a PUT request with a raw body and custom headers.
    pub async fn put_bytes(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: Vec<u8>,
    ) -> Result<Response> {
        let mut request = self.client.put(url);
        for (key, value) in headers {
            request = request.header(key.as_str(), value.as_str());
        }
        self.send(Method::PUT, url, request.body(body)).await
    }

    async fn send(&self, method: Method, url: &str, request: RequestBuilder) -> Result<Response> {
        debug!("{} {}", method, redact_query(url));

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                MigrateError::Timeout(format!(
                    "{} {} exceeded {:?}",
                    method,
                    redact_query(url),
                    self.default_timeout
                ))
            } else {
                MigrateError::Network {
                    message: format!("{} {} failed: {}", method, redact_query(url), e),
                    source: Some(e),
                }
            }
        })?;

        check_response_status(response, url)
    }
}

fn check_response_status(response: Response, url: &str) -> Result<Response> {
    if response.status() == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());

        return Err(MigrateError::RateLimited {
            service: extract_domain(url),
            retry_after_secs: retry_after,
        });
    }

    // Return the response for other codes (caller may want to handle them)
    Ok(response)
}

/// Extract domain from a URL.
pub fn extract_domain(url: &str) -> String {
    url::Url::parse(url)
        .map(|u| u.host_str().unwrap_or("unknown").to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Drop the query string so API keys never reach the logs.
fn redact_query(url: &str) -> &str {
    url.split_once('?').map(|(base, _)| base).unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_domain() {
        assert_eq!(
            extract_domain("https://firestore.googleapis.com/v1/projects/p"),
            "firestore.googleapis.com"
        );
        assert_eq!(extract_domain("invalid-url"), "unknown");
    }

    #[test]
    fn test_redact_query() {
        assert_eq!(
            redact_query("https://id.example/v1/accounts:signInWithPassword?key=secret"),
            "https://id.example/v1/accounts:signInWithPassword"
        );
        assert_eq!(redact_query("https://a/b"), "https://a/b");
    }

    #[tokio::test]
    async fn test_client_with_timeout() {
        let client = HttpClient::with_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(client.default_timeout, Duration::from_secs(5));
    }
}
