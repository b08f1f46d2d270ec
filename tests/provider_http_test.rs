// HTTP-level tests for the model providers against a mock server

use anyhow::Result;
use chrono::NaiveDate;
use mockito::{Matcher, Server};
use serde_json::json;
use std::fs;
use tempfile::TempDir;

use worldsim::config::{Config, ProviderKind};
use worldsim::errors::WorldSimError;
use worldsim::providers::{
    create_provider, ClaudeProvider, GeminiProvider, LlmProvider, ProviderRequest,
};
use worldsim::simulation::{RunOptions, Simulation};

fn gemini_body(text: &str) -> String {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
    .to_string()
}

fn find_api_error(err: &anyhow::Error) -> Option<&WorldSimError> {
    err.chain().find_map(|e| e.downcast_ref::<WorldSimError>())
}

#[tokio::test]
async fn test_gemini_generate_content() -> Result<()> {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/models/gemini-1.5-pro:generateContent")
        .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
        .match_body(Matcher::PartialJson(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "Hello" }] }]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(gemini_body("Hi there"))
        .create_async()
        .await;

    let provider = GeminiProvider::new("test-key".to_string())?.with_base_url(server.url());
    let response = provider.send_message(&ProviderRequest::new("Hello")).await?;

    assert_eq!(response.text, "Hi there");
    assert_eq!(response.provider, "gemini");
    assert_eq!(response.model, "gemini-1.5-pro");
    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_gemini_client_error_not_retried() -> Result<()> {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/models/gemini-1.5-pro:generateContent")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body(r#"{"error":{"message":"API key not valid"}}"#)
        .expect(1)
        .create_async()
        .await;

    let provider = GeminiProvider::new("bad-key".to_string())?.with_base_url(server.url());
    let err = provider
        .send_message(&ProviderRequest::new("Hello"))
        .await
        .unwrap_err();

    match find_api_error(&err) {
        Some(WorldSimError::Api { status, body, .. }) => {
            assert_eq!(*status, 400);
            assert!(body.contains("API key not valid"));
        }
        other => panic!("expected API error, got {:?}", other),
    }
    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_claude_messages() -> Result<()> {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/messages")
        .match_header("x-api-key", "sk-ant-test")
        .match_header("anthropic-version", "2023-06-01")
        .match_body(Matcher::PartialJson(json!({
            "system": "Be terse",
            "messages": [{ "role": "user", "content": "Hello" }]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "id": "msg_1",
                "type": "message",
                "role": "assistant",
                "model": "claude-sonnet-4-20250514",
                "content": [{ "type": "text", "text": "Hi" }],
                "stop_reason": "end_turn"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let provider = ClaudeProvider::new("sk-ant-test".to_string())?.with_base_url(server.url());
    let response = provider
        .send_message(&ProviderRequest::new("Hello").with_system("Be terse"))
        .await?;

    assert_eq!(response.text, "Hi");
    assert_eq!(response.stop_reason.as_deref(), Some("end_turn"));
    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_full_step_against_mock_gemini() -> Result<()> {
    let mut server = Server::new_async().await;

    let narrator = server
        .mock("POST", "/models/gemini-test:generateContent")
        .match_query(Matcher::Any)
        .match_body(Matcher::Regex("Narrate week 1".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(gemini_body(
            "Markets open.\n\n### Expert: Economy\nTrack prices.\n",
        ))
        .expect(1)
        .create_async()
        .await;

    let expert = server
        .mock("POST", "/models/gemini-test:generateContent")
        .match_query(Matcher::Any)
        .match_body(Matcher::Regex("Expert brief: Economy".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(gemini_body("Prices climb 3%."))
        .expect(1)
        .create_async()
        .await;

    let tmp = TempDir::new()?;
    let gt = tmp.path().join("gt");
    fs::create_dir_all(&gt)?;
    fs::write(gt.join("2025-06-01.txt"), "The market reopened.")?;

    let mut config = Config::new(ProviderKind::Gemini, "test-key");
    config.base_url = Some(server.url());
    config.model = Some("gemini-test".to_string());
    config.max_retries = 1;

    let provider = create_provider(&config)?;
    let output = Simulation::new(config, provider)
        .run(&RunOptions {
            output_dir: tmp.path().join("out"),
            snapshot: None,
            ground_truth_dir: gt,
            today: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
        })
        .await?;

    narrator.assert_async().await;
    expert.assert_async().await;

    let report = fs::read_to_string(&output.report_path)?;
    assert!(report.contains("Markets open."));
    assert!(report.contains("### Economy"));
    assert!(report.contains("Prices climb 3%."));
    assert!(report.contains("gemini-test (gemini)"));
    Ok(())
}
