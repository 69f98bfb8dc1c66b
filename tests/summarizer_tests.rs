mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{MockProvider, openai_config, test_config};
use slack_recap::ai::ProviderConfig;
use slack_recap::ai::prompt::{MAX_INPUT_CHARS, SUMMARY_INSTRUCTION};
use slack_recap::errors::JobError;
use slack_recap::worker::summarize::{SUMMARY_MAX_TOKENS, Summarizer};

#[tokio::test]
async fn test_summary_is_trimmed_provider_output() {
    let provider = Arc::new(MockProvider::replying("  Summary text\n"));
    let summarizer = Summarizer::with_default_timeout(provider.clone());

    let summary = summarizer
        .summarize("alice: hi\nbob: hello", &openai_config("http://unused"))
        .await
        .unwrap();
    assert_eq!(summary, "Summary text");

    let seen = provider.seen();
    assert_eq!(seen.len(), 1);
    let (_, request) = &seen[0];
    assert_eq!(request.model, "gpt-4o-mini");
    assert_eq!(request.max_tokens, SUMMARY_MAX_TOKENS);
    assert!(request.prompt.starts_with(SUMMARY_INSTRUCTION));
}

#[tokio::test]
async fn test_blank_text_never_reaches_provider() {
    let provider = Arc::new(MockProvider::replying("unused"));
    let summarizer = Summarizer::with_default_timeout(provider.clone());

    let err = summarizer
        .summarize(" \n\t", &openai_config("http://unused"))
        .await
        .unwrap_err();
    assert_eq!(err, JobError::EmptyInput);
    assert!(provider.seen().is_empty());
}

#[tokio::test]
async fn test_prompt_input_is_bounded() {
    let provider = Arc::new(MockProvider::replying("ok"));
    let summarizer = Summarizer::with_default_timeout(provider.clone());

    let long = "word ".repeat(5_000);
    summarizer
        .summarize(&long, &openai_config("http://unused"))
        .await
        .unwrap();

    let (_, request) = &provider.seen()[0];
    assert!(request.prompt.chars().count() <= MAX_INPUT_CHARS + SUMMARY_INSTRUCTION.chars().count());
}

#[tokio::test]
async fn test_slow_provider_times_out() {
    let provider = Arc::new(MockProvider::replying("late summary").with_delay(Duration::from_millis(500)));
    let summarizer = Summarizer::new(provider, Duration::from_millis(50));

    let started = Instant::now();
    let err = summarizer
        .summarize("something happened", &openai_config("http://unused"))
        .await
        .unwrap_err();
    assert_eq!(err, JobError::Timeout { budget_ms: 50 });
    assert!(started.elapsed() < Duration::from_millis(400));
}

#[tokio::test]
async fn test_provider_failure_is_provider_error() {
    let provider = Arc::new(MockProvider::failing("HTTP 401 Unauthorized: invalid api key"));
    let summarizer = Summarizer::with_default_timeout(provider);

    let err = summarizer
        .summarize("something happened", &openai_config("http://unused"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "provider_error");
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_empty_completion_renders_placeholder_text() {
    let provider = Arc::new(MockProvider::empty());
    let summarizer = Summarizer::with_default_timeout(provider);
    let summary = summarizer
        .summarize("something happened", &openai_config("http://unused"))
        .await
        .unwrap();
    assert_eq!(summary, "(empty)");
}

#[tokio::test]
async fn test_provider_switch_changes_endpoint_and_model() {
    let provider = Arc::new(MockProvider::replying("ok"));
    let summarizer = Summarizer::with_default_timeout(provider.clone());

    for selector in ["openai", "groq"] {
        let config = test_config(&[("MODEL_PROVIDER", selector), ("GROQ_API_KEY", "gsk_test")]);
        let resolved = ProviderConfig::resolve(&config).unwrap();
        summarizer.summarize("hello", &resolved).await.unwrap();
    }

    let seen = provider.seen();
    assert_eq!(seen[0].0.base_url, "https://api.openai.com/v1");
    assert_eq!(seen[0].1.model, "gpt-4o-mini");
    assert_eq!(seen[1].0.base_url, "https://api.groq.com/openai/v1");
    assert_eq!(seen[1].1.model, "llama3-8b-8192");
    assert_eq!(seen[1].0.api_key, "gsk_test");
}
