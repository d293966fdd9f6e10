// src/fetch.rs

use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Page the report is built from unless configured otherwise.
pub static DEFAULT_SOURCE_URL: &str =
    "https://en.wikipedia.org/wiki/List_of_largest_companies_by_revenue";

static USER_AGENT: &str = concat!(
    "Mozilla/5.0 (compatible; rankscrape/",
    env!("CARGO_PKG_VERSION"),
    ")"
);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// HTTP client with the scraper's User-Agent and request timeout.
pub fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .gzip(true)
        .build()
        .context("building HTTP client")
}

/// GET `url` and return the body as text. Non-2xx statuses are errors.
#[tracing::instrument(level = "info", skip(client))]
pub async fn fetch_html(client: &Client, url: &str) -> Result<String> {
    let url = Url::parse(url).with_context(|| format!("parsing source URL {}", url))?;

    let html = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("GET {}", url))?
        .error_for_status()
        .with_context(|| format!("bad status from {}", url))?
        .text()
        .await
        .with_context(|| format!("reading body from {}", url))?;

    tracing::debug!(bytes = html.len(), "fetched page");
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_builds() -> Result<()> {
        build_client()?;
        Ok(())
    }

    #[tokio::test]
    async fn invalid_url_is_rejected_before_request() -> Result<()> {
        let client = build_client()?;
        let err = fetch_html(&client, "not a url").await.unwrap_err();
        assert!(err.to_string().contains("parsing source URL"), "{err}");
        Ok(())
    }
}
