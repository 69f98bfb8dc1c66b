use std::error::Error;
use slack_recap::errors::{JobError, SlackError};

#[test]
fn test_slack_error_implements_error_trait() {
    fn assert_error<T: Error>(_: &T) {}

    let error = SlackError::ParseError("test error".to_string());
    assert_error(&error);
    assert_error(&JobError::EmptyInput);
}

#[test]
fn test_slack_error_display() {
    let error = SlackError::ApiError("API failed".to_string());
    assert_eq!(format!("{error}"), "Failed to access Slack API: API failed");

    let error = SlackError::ProviderError("Model unavailable".to_string());
    assert_eq!(
        format!("{error}"),
        "Failed to access model provider: Model unavailable"
    );

    let error = SlackError::HttpError("Connection error".to_string());
    assert_eq!(
        format!("{error}"),
        "Failed to send HTTP request: Connection error"
    );
}

#[test]
fn test_slack_error_from_conversions() {
    let err = anyhow::anyhow!("test error");
    let slack_err: SlackError = err.into();
    match slack_err {
        SlackError::ApiError(msg) => assert!(msg.contains("test error")),
        _ => panic!("Unexpected error type"),
    }

    let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    assert!(matches!(SlackError::from(parse_err), SlackError::ParseError(_)));
}

#[test]
fn test_job_error_codes_are_stable() {
    let cases = [
        (JobError::AckFailed("x".into()), "ack_failed"),
        (JobError::UpstreamFetch("x".into()), "upstream_fetch_error"),
        (JobError::EmptyInput, "empty_input"),
        (JobError::Timeout { budget_ms: 30_000 }, "timeout"),
        (JobError::Provider("x".into()), "provider_error"),
        (JobError::DispatchFailed("x".into()), "dispatch_failed"),
    ];
    for (error, code) in cases {
        assert_eq!(error.code(), code);
    }
}
