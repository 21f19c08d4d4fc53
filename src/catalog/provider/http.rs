use crate::catalog::{CatalogError, Result};
use reqwest::{Client, header::HeaderMap};
use serde::de::DeserializeOwned;
use std::time::Duration;

const USER_AGENT: &str = concat!("sermon-catalog/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client wrapper for providers
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a new HTTP client with a request timeout
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Build full URL from endpoint
    #[must_use]
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Execute GET request with query parameters
    pub async fn get_with_params<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let (body, _) = self.get_with_headers(endpoint, params).await?;
        Ok(body)
    }

    /// Execute GET request, returning the parsed body and response headers
    pub async fn get_with_headers<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<(T, HeaderMap)> {
        let response = self.send(endpoint, params).await?;
        let headers = response.headers().clone();

        let body = response
            .json::<T>()
            .await
            .map_err(|e| CatalogError::Parse(format!("JSON parse error: {e}")))?;

        Ok((body, headers))
    }

    /// Execute GET request and return the raw body text
    pub async fn get_text(&self, endpoint: &str, params: &[(&str, String)]) -> Result<String> {
        let response = self.send(endpoint, params).await?;
        response.text().await.map_err(CatalogError::Network)
    }

    async fn send(&self, endpoint: &str, params: &[(&str, String)]) -> Result<reqwest::Response> {
        let url = self.url(endpoint);
        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(CatalogError::Network)?;

        Self::check_status(response).await
    }

    /// Map non-success statuses to `CatalogError::Api`
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if !status.is_success() {
            let status_code = status.as_u16();
            let message = response.text().await.unwrap_or_default();

            return Err(CatalogError::Api {
                status: status_code,
                message,
            });
        }

        Ok(response)
    }
}

/// Read an integer header such as `X-WP-TotalPages`
pub fn header_u32(headers: &HeaderMap, name: &str) -> Option<u32> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}
