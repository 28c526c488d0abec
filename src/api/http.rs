//! HTTP implementation of the twin API.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{HdtApi, HdtStatus, PropertyDescriptor};
use crate::error::ApiError;

/// Twin API client backed by `reqwest`.
///
/// No timeout or retry policy is applied; a failed request surfaces as an
/// [`ApiError`] and the caller decides what to keep on screen.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base_url: String,
    description: String,
}

impl HttpApi {
    /// Create a client for the API rooted at `base_url` (e.g. `http://localhost:3000`).
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let description = format!("api: {}", base_url);
        Self {
            client: Client::new(),
            base_url,
            description,
        }
    }

    /// Returns the base URL requests are issued against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/hdt{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().as_u16()));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl HdtApi for HttpApi {
    async fn list_twins(&self) -> Result<Vec<String>, ApiError> {
        self.get_json(&self.url("")).await
    }

    async fn twin_state(&self, id: &str) -> Result<HdtStatus, ApiError> {
        self.get_json(&self.url(&format!("/{}/state", urlencoded(id)))).await
    }

    async fn twin_properties(&self, id: &str) -> Result<Vec<String>, ApiError> {
        let descriptors: Vec<PropertyDescriptor> = self
            .get_json(&self.url(&format!("/{}/state/properties", urlencoded(id))))
            .await?;
        Ok(descriptors.into_iter().map(|d| d.value.id).collect())
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Percent-encode a path segment.
fn urlencoded(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let api = HttpApi::new("http://localhost:3000/");
        assert_eq!(api.base_url(), "http://localhost:3000");
        assert_eq!(api.description(), "api: http://localhost:3000");
    }

    #[test]
    fn endpoint_urls() {
        let api = HttpApi::new("http://twins.local");
        assert_eq!(api.url(""), "http://twins.local/api/hdt");
        assert_eq!(
            api.url(&format!("/{}/state", urlencoded("patient 7"))),
            "http://twins.local/api/hdt/patient%207/state"
        );
    }

    #[test]
    fn urlencoded_keeps_unreserved() {
        assert_eq!(urlencoded("dt-01_a.b~c"), "dt-01_a.b~c");
        assert_eq!(urlencoded("a/b"), "a%2Fb");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_error() {
        let api = HttpApi::new("http://127.0.0.1:1");
        assert!(api.list_twins().await.is_err());
    }
}
