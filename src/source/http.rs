//! [`Fetcher`] backed by `reqwest`.

use super::{Credentials, FetchError, Fetcher, Response, SourceFuture};
use std::time::Duration;

/// HTTP client with basic authentication and a per-request deadline.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    async fn get(
        &self,
        url: &str,
        credentials: &Credentials,
        timeout: Duration,
    ) -> Result<Response, FetchError> {
        let response = self
            .client
            .get(url)
            .basic_auth(&credentials.username, Some(&credentials.password))
            .timeout(timeout)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify)?;
        Ok(Response { status, body })
    }
}

fn classify(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Transport(error.to_string())
    }
}

impl Fetcher for HttpFetcher {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
        credentials: &'a Credentials,
        timeout: Duration,
    ) -> SourceFuture<'a, Result<Response, FetchError>> {
        Box::pin(self.get(url, credentials, timeout))
    }
}
