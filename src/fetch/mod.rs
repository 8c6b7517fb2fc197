// src/fetch/mod.rs

use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Build the HTTP client used for all archive downloads. The timeout bounds
/// the whole request; there is no retry, a failed year is simply skipped by
/// the caller.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("building HTTP client")
}

/// Download one year's archive and return its bytes in memory. Any transport
/// failure or non-success HTTP status is an error for the caller to handle.
pub async fn download_archive(client: &Client, url_str: &str) -> Result<Vec<u8>> {
    let url = Url::parse(url_str).with_context(|| format!("invalid source URL {url_str}"))?;
    debug!(%url, "requesting archive");
    let resp = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("GET {url} failed"))?
        .error_for_status()
        .with_context(|| format!("non-success status from {url}"))?;
    let bytes = resp
        .bytes()
        .await
        .with_context(|| format!("reading response body from {url}"))?;
    debug!(%url, size = bytes.len(), "archive downloaded");
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_unparseable_url() {
        let client = build_client(Duration::from_secs(1)).unwrap();
        let err = download_archive(&client, "not a url").await.unwrap_err();
        assert!(err.to_string().contains("invalid source URL"));
    }
}
