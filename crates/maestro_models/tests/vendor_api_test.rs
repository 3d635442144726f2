//! Live vendor round trips.
//!
//! These tests spend real tokens. Run with:
//! `cargo test --package maestro_models --features api`
//! with `MAESTRO_API_KEY` (and friends) set.

use maestro_core::Message;
use maestro_models::{ClientConfig, Transport, Vendor, VendorClient};
use std::env;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

fn claude_config() -> ClientConfig {
    dotenvy::dotenv().ok();
    let api_key = env::var("MAESTRO_API_KEY").expect("MAESTRO_API_KEY must be set for API tests");
    ClientConfig::new(Transport::Direct, Vendor::Claude, "claude-sonnet-4-20250514")
        .with_endpoint("https://api.anthropic.com/v1")
        .with_credential(api_key)
        .with_max_tokens(64)
}

#[tokio::test]
#[cfg_attr(not(feature = "api"), ignore)]
async fn claude_simple_generation() -> Result<(), Box<dyn std::error::Error>> {
    let client = VendorClient::new(claude_config())?;

    let cancel = CancellationToken::new();
    let text = client
        .generate_text(
            &[Message::user("Say 'test' and nothing else.")],
            &cancel,
        )
        .await?;

    assert!(!text.trim().is_empty());
    println!("Response: {text}");
    Ok(())
}

#[tokio::test]
#[cfg_attr(not(feature = "api"), ignore)]
async fn claude_streaming_accumulates_deltas() -> Result<(), Box<dyn std::error::Error>> {
    let deltas = Arc::new(Mutex::new(Vec::new()));
    let sink_deltas = Arc::clone(&deltas);
    let client = VendorClient::new(claude_config().with_streaming(true))?.with_delta_sink(
        Arc::new(move |delta: &str| {
            sink_deltas.lock().expect("lock").push(delta.to_string());
        }),
    );

    let cancel = CancellationToken::new();
    let text = client
        .generate_text(&[Message::user("Count to 3.")], &cancel)
        .await?;

    let forwarded: String = deltas.lock().expect("lock").concat();
    assert_eq!(forwarded, text);
    println!("Streamed: {text}");
    Ok(())
}

#[tokio::test]
#[cfg_attr(not(feature = "api"), ignore)]
async fn probe_reports_success() -> Result<(), Box<dyn std::error::Error>> {
    let client = VendorClient::new(claude_config())?;
    let report = client.probe().await;
    assert!(report.ok, "probe failed: {}", report.detail);
    println!("Probe: {report:?}");
    Ok(())
}

#[tokio::test]
async fn probe_reports_failure_against_dead_endpoint() {
    let config = ClientConfig::new(Transport::Direct, Vendor::OpenAiCompatible, "test-model")
        .with_endpoint("http://127.0.0.1:9/v1")
        .with_credential("sk-test")
        .with_request_timeout(std::time::Duration::from_secs(2));
    let client = VendorClient::new(config).expect("valid config");

    let report = client.probe().await;
    assert!(!report.ok);
    assert_eq!(report.model, "test-model");
}
