use std::time::Duration;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use reccy_core::config::CatalogConfig;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to build the catalog HTTP client: {0}")]
    Build(#[source] reqwest::Error),
    #[error("catalog request to `{url}` failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("catalog request to `{url}` returned status {status}")]
    Status { url: String, status: StatusCode },
    #[error("catalog response from `{url}` could not be decoded: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Authenticated JSON client for the catalog's REST surface. Endpoint paths
/// and pagination live in the fetch layer; this type only knows how to issue
/// one bearer-authenticated GET and decode the body.
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
    access_token: SecretString,
    page_size: u32,
}

impl CatalogClient {
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(CatalogError::Build)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            access_token: config.access_token.clone(),
            page_size: config.page_size,
        })
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Issues a GET against `path` (relative to the configured base URL) and
    /// decodes the JSON body. Any non-2xx response is an error; there are no
    /// retries, a failed fetch fails the whole run.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, CatalogError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(event_name = "catalog.request", url = %url, "issuing catalog request");

        let response = self
            .http
            .get(&url)
            .bearer_auth(self.access_token.expose_secret())
            .query(query)
            .send()
            .await
            .map_err(|source| CatalogError::Transport { url: url.clone(), source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status { url, status });
        }

        let body = response
            .text()
            .await
            .map_err(|source| CatalogError::Transport { url: url.clone(), source })?;
        serde_json::from_str(&body).map_err(|source| CatalogError::Decode { url, source })
    }
}

#[cfg(test)]
mod tests {
    use reccy_core::config::CatalogConfig;

    use super::CatalogClient;

    #[test]
    fn trailing_slash_on_the_base_url_is_normalized() {
        let config = CatalogConfig {
            base_url: "https://shop.example.com/".to_owned(),
            access_token: "token".to_owned().into(),
            page_size: 100,
            timeout_secs: 10,
        };

        let client = CatalogClient::new(&config).expect("client");
        assert_eq!(client.base_url, "https://shop.example.com");
        assert_eq!(client.page_size(), 100);
    }
}
