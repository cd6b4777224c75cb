mod common;

use common::StubLlm;
use serde_json::json;
use sift_common::{NOT_FOUND, SCRAPE_FAILED};
use sift_llm::ResponseFormat;
use sift_llm::openai::OpenAiClient;
use sift_web::fetch::Fetcher;
use sift_web::{ExtractionStrategy, ScrapeRequest, ScrapeResult, Scraper};
use std::collections::BTreeSet;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE: &str = r#"<!doctype html>
<html>
  <head><title>Greeting</title><script>var tracking = 1;</script></head>
  <body>
    <h1>Hello</h1>
    <ul>
      <li class="item">A</li>
      <li class="item">B</li>
    </ul>
  </body>
</html>"#;

async fn serve(body: &str, content_type: &str, status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(status).set_body_raw(body.to_string(), content_type))
        .mount(&server)
        .await;
    server
}

fn scraper(llm: std::sync::Arc<StubLlm>) -> Scraper {
    Scraper::new(Fetcher::new().unwrap(), llm)
}

fn request(server: &MockServer, fields: &str) -> ScrapeRequest {
    ScrapeRequest::from_input(&format!("{}/page", server.uri()), fields).unwrap()
}

#[tokio::test]
async fn selector_hit_yields_matched_text() {
    let server = serve(PAGE, "text/html; charset=utf-8", 200).await;
    let llm = StubLlm::replying(r#"{"title": "h1"}"#);

    let result = scraper(llm.clone())
        .scrape(&request(&server, "title"), ExtractionStrategy::SelectorBased)
        .await;

    assert!(result.success);
    assert_eq!(result.records(), [json!({"title": "Hello"}).as_object().unwrap().clone()]);
    assert_eq!(llm.formats.lock().unwrap().as_slice(), [ResponseFormat::JsonObject]);
    // The model sees body markup without script blocks.
    let prompt = llm.last_prompt();
    assert!(prompt.contains("<h1>Hello</h1>"));
    assert!(!prompt.contains("tracking"));
}

#[tokio::test]
async fn selector_miss_yields_sentinel() {
    let server = serve(PAGE, "text/html", 200).await;
    let llm = StubLlm::replying(r#"{"price": ".missing"}"#);

    let result = scraper(llm)
        .scrape(&request(&server, "price"), ExtractionStrategy::SelectorBased)
        .await;

    assert!(result.success);
    assert_eq!(result.records().len(), 1);
    assert_eq!(result.records()[0]["price"], NOT_FOUND);
}

#[tokio::test]
async fn selector_miss_only_touches_first_record() {
    let server = serve(PAGE, "text/html", 200).await;
    let llm = StubLlm::replying(r#"{"item": "li.item", "price": ".missing"}"#);

    let result = scraper(llm)
        .scrape(&request(&server, "item, price"), ExtractionStrategy::SelectorBased)
        .await;

    let records = result.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["item"], "A");
    assert_eq!(records[0]["price"], NOT_FOUND);
    assert_eq!(records[1]["item"], "B");
    assert!(!records[1].contains_key("price"));
}

#[tokio::test]
async fn text_strategy_passes_model_records_through() {
    let server = serve(PAGE, "text/html", 200).await;
    let llm = StubLlm::replying(r#"{"records": [{"name": "A"}, {"name": "B"}]}"#);

    let result = scraper(llm.clone())
        .scrape(&request(&server, "name"), ExtractionStrategy::TextBased)
        .await;

    assert!(result.success);
    let records = result.records();
    assert_eq!(records.len(), 2);
    for rec in records {
        let keys: BTreeSet<_> = rec.keys().map(String::as_str).collect();
        assert_eq!(keys, BTreeSet::from(["name"]));
    }
    let text = result.text.as_deref().unwrap();
    assert!(text.contains("Hello"));
    assert!(llm.last_prompt().contains("Content:\n"));
    assert!(llm.last_prompt().contains("Hello"));
}

#[tokio::test]
async fn text_records_carry_every_requested_key() {
    let server = serve(PAGE, "text/html", 200).await;
    let llm = StubLlm::replying(
        r#"{"records": [
            {"name": "Widget", "price": "$5", "sku": "Not found"},
            {"name": "Gadget", "price": "Not found", "sku": "G-1"}
        ]}"#,
    );

    let req = request(&server, "name, price, sku");
    let result = scraper(llm).scrape(&req, ExtractionStrategy::TextBased).await;

    let wanted: BTreeSet<_> = req.fields().iter().map(String::as_str).collect();
    for rec in result.records() {
        let keys: BTreeSet<_> = rec.keys().map(String::as_str).collect();
        assert_eq!(keys, wanted);
    }
}

#[tokio::test]
async fn malformed_model_json_is_an_empty_success() {
    for strategy in [ExtractionStrategy::TextBased, ExtractionStrategy::SelectorBased] {
        let server = serve(PAGE, "text/html", 200).await;
        let llm = StubLlm::replying("{\"records\": [ oops");

        let result = scraper(llm).scrape(&request(&server, "title"), strategy).await;

        assert!(result.success, "{strategy:?}");
        assert!(result.records().is_empty(), "{strategy:?}");
        assert_eq!(result.error, None);
    }
}

#[tokio::test]
async fn unreachable_site_is_generic_failure() {
    let llm = StubLlm::replying(r#"{"records": []}"#);
    let req = ScrapeRequest::from_input("http://127.0.0.1:1/page", "title").unwrap();

    let result = scraper(llm.clone()).scrape(&req, ExtractionStrategy::TextBased).await;

    assert_eq!(result, ScrapeResult::failure());
    assert_eq!(result.error.as_deref(), Some(SCRAPE_FAILED));
    assert!(result.extracted_data.is_none());
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn model_failure_is_generic_failure() {
    let server = serve(PAGE, "text/html", 200).await;
    let llm = StubLlm::failing("401 invalid api key");

    let result = scraper(llm)
        .scrape(&request(&server, "title"), ExtractionStrategy::SelectorBased)
        .await;

    assert_eq!(result, ScrapeResult::failure());
}

#[tokio::test]
async fn binary_body_is_generic_failure() {
    let server = serve("\u{89}PNG", "image/png", 200).await;
    let llm = StubLlm::replying(r#"{"records": []}"#);

    let result = scraper(llm.clone())
        .scrape(&request(&server, "title"), ExtractionStrategy::TextBased)
        .await;

    assert!(!result.success);
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn error_status_pages_are_still_extracted() {
    let server = serve("<html><body><h1>Gone</h1></body></html>", "text/html", 404).await;
    let llm = StubLlm::replying(r#"{"title": "h1"}"#);

    let result = scraper(llm)
        .scrape(&request(&server, "title"), ExtractionStrategy::SelectorBased)
        .await;

    assert!(result.success);
    assert_eq!(result.records()[0]["title"], "Gone");
}

#[tokio::test]
async fn null_completion_content_is_an_empty_success() {
    let server = serve(PAGE, "text/html", 200).await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": null } }]
        })))
        .mount(&server)
        .await;
    let llm = OpenAiClient::with_endpoint(
        "sk-test".into(),
        "gpt-4o-mini".into(),
        &format!("{}/v1", server.uri()),
    )
    .unwrap();
    let scraper = Scraper::new(Fetcher::new().unwrap(), Arc::new(llm));

    for strategy in [ExtractionStrategy::TextBased, ExtractionStrategy::SelectorBased] {
        let result = scraper.scrape(&request(&server, "title"), strategy).await;
        assert!(result.success, "{strategy:?}");
        assert!(result.records().is_empty(), "{strategy:?}");
        assert_eq!(result.error, None);
    }
}
