mod common;

use std::time::{Duration, Instant};

use common::Reply;
use keydex_core::keywords::RetryPolicy;
use keydex_core::{Generator, KeywordClient, KeywordExtractor, LLMConfig, LLMError, OllamaClient};

fn client(base_url: &str) -> KeywordClient<OllamaClient> {
    KeywordClient::new(OllamaClient::new(base_url, "gemma:2b"))
        .with_retry(RetryPolicy::new(3, Duration::from_millis(10)))
}

#[tokio::test]
async fn test_generate_request_contract() {
    let (url, service) = common::spawn(Reply::Text("- alpha".into())).await;
    let ollama = OllamaClient::new(&url, "gemma:2b").with_temperature(0.3);

    let text = ollama.generate("list things").await.unwrap();
    assert_eq!(text, "- alpha");

    let bodies = service.bodies();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["model"], "gemma:2b");
    assert_eq!(bodies[0]["prompt"], "list things");
    assert_eq!(bodies[0]["stream"], false);
    let temperature = bodies[0]["options"]["temperature"].as_f64().unwrap();
    assert!((temperature - 0.3).abs() < 1e-6);
}

#[tokio::test]
async fn test_keywords_parsed_from_dash_lines() {
    let (url, service) = common::spawn(Reply::Text(
        "Here are your keywords:\n- Hello\n- world\n- hello\nThanks!".into(),
    ))
    .await;

    let keywords = client(&url).extract_keywords("hello world").await.unwrap();
    assert_eq!(keywords, vec!["hello", "world"]);
    assert_eq!(service.requests(), 1);
}

#[tokio::test]
async fn test_prompt_carries_the_text() {
    let (url, service) = common::spawn(Reply::Text("- topic".into())).await;

    client(&url).extract_keywords("distinctive body").await.unwrap();
    let prompt = service.bodies()[0]["prompt"].as_str().unwrap().to_string();
    assert!(prompt.ends_with("distinctive body"));
}

#[tokio::test]
async fn test_status_500_retried_then_unavailable() {
    let (url, service) = common::spawn(Reply::Status(500)).await;

    let err = client(&url).extract_keywords("text").await.unwrap_err();
    assert!(matches!(err, LLMError::ServiceUnavailable(_)), "got {err:?}");
    assert_eq!(service.requests(), 3);
}

#[tokio::test]
async fn test_error_field_is_service_error() {
    let (url, service) = common::spawn(Reply::ErrorField("model not found".into())).await;

    let err = client(&url).extract_keywords("text").await.unwrap_err();
    assert!(matches!(err, LLMError::ServiceError(ref m) if m == "model not found"));
    assert_eq!(service.requests(), 3);
}

#[tokio::test]
async fn test_undecodable_body_is_service_error() {
    let (url, _service) = common::spawn(Reply::Garbage).await;

    let err = OllamaClient::new(&url, "gemma:2b").generate("text").await.unwrap_err();
    assert!(matches!(err, LLMError::ServiceError(_)));
}

#[tokio::test]
async fn test_no_markers_is_not_retried() {
    let (url, service) = common::spawn(Reply::Text("I cannot help with that.".into())).await;

    let err = client(&url).extract_keywords("text").await.unwrap_err();
    assert!(matches!(err, LLMError::NoKeywordsExtracted));
    assert_eq!(service.requests(), 1);
}

#[tokio::test]
async fn test_unreachable_service() {
    let url = common::closed_port().await;

    let err = OllamaClient::new(&url, "gemma:2b")
        .with_timeout(Duration::from_secs(2))
        .generate("text")
        .await
        .unwrap_err();
    assert!(matches!(err, LLMError::ServiceUnavailable(_)));
}

#[tokio::test]
async fn test_configured_timeout_bounds_each_attempt() {
    let (url, service) =
        common::spawn(Reply::Slow(Duration::from_secs(10), "- late".into())).await;
    let config = LLMConfig {
        base_url: url,
        timeout_secs: 1,
        ..Default::default()
    };
    let ollama = OllamaClient::from_config(&config).unwrap();
    assert_eq!(ollama.timeout(), Duration::from_secs(1));

    let started = Instant::now();
    let err = ollama.generate("text").await.unwrap_err();
    assert!(matches!(err, LLMError::ServiceUnavailable(_)), "got {err:?}");
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(service.requests(), 1);
}
