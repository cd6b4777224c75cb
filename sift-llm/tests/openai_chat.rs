mod common;

use serde_json::json;
use sift_common::{LlmConfig, SiftError};
use sift_llm::openai::OpenAiClient;
use sift_llm::traits::{GenerateOptions, LlmClient};
use sift_llm::build_llm_client;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "model": "gpt-4o-mini-2024-07-18",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
    })
}

#[tokio::test]
async fn generate_json_requests_json_object_format() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "messages": [{ "role": "user", "content": "give me json" }],
            "response_format": { "type": "json_object" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(r#"{"ok":true}"#)))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAiClient::with_endpoint(
        "sk-test".into(),
        "gpt-4o-mini".into(),
        &format!("{}/v1", server.uri()),
    )
    .unwrap();

    let resp = client.generate_json("give me json").await.unwrap();
    assert_eq!(resp.text, r#"{"ok":true}"#);
    assert_eq!(resp.tokens_used, Some(15));
    assert_eq!(resp.model.as_deref(), Some("gpt-4o-mini-2024-07-18"));
}

#[tokio::test]
async fn system_prompt_and_sampling_are_forwarded() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [
                { "role": "system", "content": "be brief" },
                { "role": "user", "content": "hi" }
            ],
            "temperature": 0.5,
            "max_tokens": 7
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("hello")))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAiClient::with_endpoint(
        "sk-test".into(),
        "gpt-4o-mini".into(),
        &format!("{}/v1/", server.uri()),
    )
    .unwrap()
    .with_sampling(Some(0.5), Some(100));

    let opts = GenerateOptions {
        system_prompt: Some("be brief"),
        max_tokens: Some(7),
        ..Default::default()
    };
    let resp = client.generate("hi", &opts).await.unwrap();
    assert_eq!(resp.text, "hello");
}

#[tokio::test]
async fn api_errors_surface_as_model_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "message": "Incorrect API key provided", "type": "invalid_request_error" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAiClient::with_endpoint(
        "sk-wrong".into(),
        "gpt-4o-mini".into(),
        &format!("{}/v1", server.uri()),
    )
    .unwrap();

    let err = client.generate_json("x").await.unwrap_err();
    match err {
        SiftError::Model(msg) => assert!(msg.contains("Incorrect API key provided"), "{msg}"),
        other => panic!("expected model error, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_key_fails_at_request_time_without_calling_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("{}")))
        .expect(0)
        .mount(&server)
        .await;

    let cfg = LlmConfig::Openai {
        model: "gpt-4o-mini".into(),
        auth_token: String::new(),
        endpoint: format!("{}/v1", server.uri()),
        temperature: None,
        max_tokens: None,
        timeout_secs: None,
    };
    // Building never fails on a missing credential.
    let client = build_llm_client(&cfg).unwrap();

    let err = client.generate_json("x").await.unwrap_err();
    assert!(matches!(err, SiftError::Model(_)));
}

#[tokio::test]
async fn empty_choices_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let client = OpenAiClient::with_endpoint(
        "sk-test".into(),
        "gpt-4o-mini".into(),
        &format!("{}/v1", server.uri()),
    )
    .unwrap();

    assert!(client.generate_json("x").await.is_err());
}

#[tokio::test]
async fn null_content_reads_as_empty_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": null, "refusal": "I can't help with that." },
                "finish_reason": "stop"
            }]
        })))
        .mount(&server)
        .await;

    let client = OpenAiClient::with_endpoint(
        "sk-test".into(),
        "gpt-4o-mini".into(),
        &format!("{}/v1", server.uri()),
    )
    .unwrap();

    let resp = client.generate_json("x").await.unwrap();
    assert_eq!(resp.text, "");
    assert_eq!(resp.tokens_used, None);
}
