//! HTTP client for a json-server style search endpoint
//!
//! Requests `GET <endpoint>?_page={page}&_limit={page_size}&label_like={query}`
//! and expects a JSON array of `{ id, label }` objects.

use std::future::Future;
use std::time::Duration;

use reqwest::Url;

use crate::client::{parse_body, FetchError, PageRequest, SearchClient};
use crate::config::{ConfigError, SearchConfig};
use crate::token::RequestToken;
use crate::SearchResult;

#[derive(Clone, Debug)]
pub struct HttpSearchClient {
    client: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
}

impl HttpSearchClient {
    /// Create a client for `config.endpoint`
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not an absolute URL.
    pub fn new(config: &SearchConfig) -> Result<Self, ConfigError> {
        Self::with_client(reqwest::Client::new(), &config.endpoint, config.request_timeout())
    }

    /// Create a client that shares an existing connection pool
    pub fn with_client(
        client: reqwest::Client,
        endpoint: &str,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let endpoint = Url::parse(endpoint).map_err(|e| ConfigError::InvalidValue {
            name: "endpoint",
            value: endpoint.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    /// URL for one page of one query
    ///
    /// The query is percent-encoded, so a space is sent as `%20`. Parameters
    /// already on the endpoint are kept.
    pub fn request_url(&self, request: &PageRequest) -> Url {
        let params = format!(
            "_page={}&_limit={}&label_like={}",
            request.page,
            request.page_size,
            urlencoding::encode(&request.query)
        );
        let query = match self.endpoint.query() {
            Some(existing) if !existing.is_empty() => format!("{existing}&{params}"),
            _ => params,
        };
        let mut url = self.endpoint.clone();
        url.set_query(Some(&query));
        url
    }
}

impl SearchClient for HttpSearchClient {
    fn fetch_page(
        &self,
        request: PageRequest,
        token: RequestToken,
    ) -> impl Future<Output = Result<Vec<SearchResult>, FetchError>> + Send {
        let client = self.client.clone();
        let url = self.request_url(&request);
        let timeout = self.timeout;

        async move {
            tracing::debug!("GET {} (request {})", url, token.id());
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(FetchError::Cancelled),
                result = execute_http_io(&client, url, timeout) => result,
            }
        }
    }
}

async fn execute_http_io(
    client: &reqwest::Client,
    url: Url,
    timeout: Duration,
) -> Result<Vec<SearchResult>, FetchError> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|error| FetchError::Network(error.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::from_status(status.as_u16()));
    }

    let body = response
        .bytes()
        .await
        .map_err(|error| FetchError::Network(error.to_string()))?;
    parse_body(&body)
}
