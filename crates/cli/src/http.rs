use std::time::Duration;

use anyhow::Context;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_LENGTH;

use webeco_core::source::{PageSource, SizeResolver};

const USER_AGENT: &str = concat!("webeco/", env!("CARGO_PKG_VERSION"));

pub fn client(timeout: Duration) -> anyhow::Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .context("build http client")
}

/// Fetches page text over HTTP. Failures are logged and yield empty text.
pub struct HttpPageSource {
    client: Client,
}

impl HttpPageSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn get(&self, url: &str) -> anyhow::Result<String> {
        let resp = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url}"))?;
        resp.text().with_context(|| format!("read body of {url}"))
    }
}

impl PageSource for HttpPageSource {
    fn fetch(&self, target: &str) -> String {
        match self.get(target) {
            Ok(text) => text,
            Err(e) => {
                log::error!("failed to fetch page: {e:#}");
                String::new()
            }
        }
    }
}

/// Resolves sizes with a `HEAD` request, falling back to a full `GET` when the
/// server sends no `Content-Length`.
pub struct HttpSizeResolver {
    client: Client,
}

impl HttpSizeResolver {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn content_length(resp: &reqwest::blocking::Response) -> Option<u64> {
    resp.headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

impl SizeResolver for HttpSizeResolver {
    fn resolve(&self, url: &str) -> anyhow::Result<Option<u64>> {
        let head = self
            .client
            .head(url)
            .send()
            .with_context(|| format!("HEAD {url}"))?
            .error_for_status()
            .with_context(|| format!("HEAD {url}"))?;
        if let Some(len) = content_length(&head) {
            return Ok(Some(len));
        }

        let body = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url}"))?
            .bytes()
            .with_context(|| format!("read body of {url}"))?;
        log::debug!("fallback GET for {url}, size: {}", body.len());
        Ok(Some(body.len() as u64))
    }
}
