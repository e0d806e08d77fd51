//! HTTP transport for the CSV feeds.
//!
//! The [`HttpClient`] trait keeps the pipeline testable with a stub
//! transport; [`BasicClient`] is the plain reqwest implementation used by
//! the CLI.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::{Request, Response};

#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

pub struct BasicClient(reqwest::Client);

impl BasicClient {
    pub fn new() -> Self {
        Self(reqwest::Client::new())
    }
}

impl Default for BasicClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: Request) -> reqwest::Result<Response> {
        self.0.execute(req).await
    }
}

/// Fetches a feed URL and returns the response body as text.
///
/// # Errors
///
/// Returns an error for an invalid URL, a transport failure, or a non-2xx
/// status.
pub async fn fetch_text<C: HttpClient>(client: &C, url: &str) -> Result<String> {
    let req = Request::new(
        reqwest::Method::GET,
        url.parse().with_context(|| format!("invalid feed URL {url:?}"))?,
    );

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        bail!("feed request to {url} returned status {status}");
    }

    Ok(resp.text().await?)
}
