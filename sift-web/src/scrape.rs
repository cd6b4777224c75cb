use crate::extract::{self, ExtractedRecord, ExtractionStrategy};
use crate::fetch::Fetcher;
use crate::normalize::RawDocument;
use serde::{Deserialize, Serialize};
use sift_common::{Result, SCRAPE_FAILED, SiftError};
use sift_llm::traits::LlmClient;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// A validated scrape: an http(s) URL and a non-empty, ordered, duplicate-free field list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeRequest {
    url: String,
    fields: Vec<String>,
}

impl ScrapeRequest {
    /// ```
    /// use sift_web::ScrapeRequest;
    ///
    /// let req = ScrapeRequest::new("https://example.com", [" title", "price ", "title"]).unwrap();
    /// assert_eq!(req.fields(), ["title", "price"]);
    /// assert!(ScrapeRequest::new("https://example.com", ["", " "]).is_err());
    /// ```
    pub fn new<I, S>(url: &str, fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let url = url.trim();
        if url.is_empty() {
            return Err(SiftError::InvalidRequest("URL is empty".into()));
        }
        let parsed = Url::parse(url)
            .map_err(|e| SiftError::InvalidRequest(format!("invalid URL {url:?}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SiftError::InvalidRequest(format!(
                "unsupported URL scheme {:?}",
                parsed.scheme()
            )));
        }

        let mut out: Vec<String> = Vec::new();
        for f in fields {
            let f = f.as_ref().trim();
            if !f.is_empty() && !out.iter().any(|seen| seen == f) {
                out.push(f.to_string());
            }
        }
        if out.is_empty() {
            return Err(SiftError::InvalidRequest("no fields requested".into()));
        }

        Ok(Self {
            url: url.to_string(),
            fields: out,
        })
    }

    /// Build from the raw form inputs; fields are comma separated.
    pub fn from_input(url: &str, fields: &str) -> Result<Self> {
        Self::new(url, fields.split(','))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

/// Outcome handed back to the caller.
///
/// Serializes as `{ "success", "extractedData", "text", "error" }` with the
/// absent parts omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_data: Option<Vec<ExtractedRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScrapeResult {
    pub fn success(records: Vec<ExtractedRecord>, text: Option<String>) -> Self {
        Self {
            success: true,
            extracted_data: Some(records),
            text,
            error: None,
        }
    }

    /// The only failure callers ever see.
    pub fn failure() -> Self {
        Self {
            success: false,
            extracted_data: None,
            text: None,
            error: Some(SCRAPE_FAILED.to_string()),
        }
    }

    pub fn records(&self) -> &[ExtractedRecord] {
        self.extracted_data.as_deref().unwrap_or_default()
    }
}

/// Fetch, normalize and extract for one request at a time.
#[derive(Clone)]
pub struct Scraper {
    fetcher: Fetcher,
    llm: Arc<dyn LlmClient + Send + Sync>,
    wrap_width: usize,
}

impl Scraper {
    pub fn new(fetcher: Fetcher, llm: Arc<dyn LlmClient + Send + Sync>) -> Self {
        Self {
            fetcher,
            llm,
            wrap_width: 130,
        }
    }

    pub fn with_wrap_width(mut self, width: usize) -> Self {
        self.wrap_width = width.max(1);
        self
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    /// Run one scrape. Every error is logged and collapsed into [`ScrapeResult::failure`].
    pub async fn scrape(&self, req: &ScrapeRequest, strategy: ExtractionStrategy) -> ScrapeResult {
        let started = Instant::now();
        tracing::info!(
            url = req.url(),
            fields = ?req.fields(),
            strategy = strategy.label(),
            model = self.llm.model_name(),
            "scrape.start"
        );

        match self.try_scrape(req, strategy).await {
            Ok((records, text)) => {
                tracing::info!(
                    url = req.url(),
                    records = records.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "scrape.done"
                );
                ScrapeResult::success(records, text)
            }
            Err(err) => {
                tracing::error!(
                    url = req.url(),
                    error = %err,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "scrape.failed"
                );
                ScrapeResult::failure()
            }
        }
    }

    async fn try_scrape(
        &self,
        req: &ScrapeRequest,
        strategy: ExtractionStrategy,
    ) -> Result<(Vec<ExtractedRecord>, Option<String>)> {
        let doc = RawDocument::new(self.fetcher.fetch(req.url()).await?);

        match strategy {
            ExtractionStrategy::TextBased => {
                let text = doc.plain_text(self.wrap_width)?;
                let records =
                    extract::text::extract_records(self.llm.as_ref(), &text, req.fields()).await?;
                Ok((records, Some(text)))
            }
            ExtractionStrategy::SelectorBased => {
                let records =
                    extract::selector::extract_records(self.llm.as_ref(), &doc, req.fields())
                        .await?;
                Ok((records, None))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn comma_input_is_split_trimmed_and_deduped() {
        let req = ScrapeRequest::from_input(" https://shop.test/items ", "name, price,,name , sku").unwrap();
        assert_eq!(req.url(), "https://shop.test/items");
        assert_eq!(req.fields(), ["name", "price", "sku"]);
    }

    #[test]
    fn empty_or_bad_urls_are_rejected() {
        for url in ["", "   ", "not a url", "ftp://files.test/x", "file:///etc/passwd"] {
            let err = ScrapeRequest::from_input(url, "title").unwrap_err();
            assert!(matches!(err, SiftError::InvalidRequest(_)), "{url}: {err}");
        }
    }

    #[test]
    fn blank_field_list_is_rejected() {
        let err = ScrapeRequest::from_input("https://a.test", " , ,").unwrap_err();
        assert!(matches!(err, SiftError::InvalidRequest(_)));
    }

    #[test]
    fn failure_serializes_without_data() {
        let v = serde_json::to_value(ScrapeResult::failure()).unwrap();
        assert_eq!(v, json!({ "success": false, "error": "Failed to scrape website" }));
    }

    #[test]
    fn success_serializes_camel_case() {
        let mut rec = ExtractedRecord::new();
        rec.insert("title".into(), json!("Hello"));
        let v = serde_json::to_value(ScrapeResult::success(vec![rec], Some("Hello".into()))).unwrap();
        assert_eq!(
            v,
            json!({ "success": true, "extractedData": [{ "title": "Hello" }], "text": "Hello" })
        );
    }
}
