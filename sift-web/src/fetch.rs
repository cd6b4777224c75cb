use sift_common::{Result, SiftError};
use sift_http::{HttpClient, HttpError, RequestOpts};
use std::time::Duration;

/// Plain GET of the target page.
///
/// No custom headers, cookies or retries. A non-2xx response still yields
/// its body; only transport failures and binary bodies are errors.
#[derive(Clone)]
pub struct Fetcher {
    client: HttpClient,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        let client = HttpClient::unanchored()
            .map_err(|e| SiftError::Config(format!("fetch client init failed: {e}")))?;
        Ok(Self { client })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = self.client.with_timeout(timeout);
        self
    }

    pub async fn fetch(&self, url: &str) -> Result<String> {
        let opts = RequestOpts {
            allow_absolute: true,
            ..Default::default()
        };
        let resp = self.client.get_text(url, opts).await.map_err(fetch_error)?;

        if !resp.status.is_success() {
            tracing::warn!(%url, status = %resp.status, "fetch.non_success_status");
        }
        tracing::debug!(
            %url,
            status = %resp.status,
            content_type = resp.content_type.as_deref().unwrap_or("-"),
            bytes = resp.body.len(),
            "fetch.done"
        );
        Ok(resp.body)
    }
}

fn fetch_error(e: HttpError) -> SiftError {
    SiftError::Fetch(e.to_string())
}
