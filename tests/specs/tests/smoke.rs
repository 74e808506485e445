// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end smoke tests that spawn the real `tokengate` binary against
//! in-process upstream and credential servers.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::Router;

use tokengate_specs::{tokengate_binary, GateBuilder};

const TIMEOUT: Duration = Duration::from_secs(10);

type SeenKeys = Arc<Mutex<Vec<String>>>;

async fn upstream_foo(State(seen): State<SeenKeys>, headers: HeaderMap) -> &'static str {
    let key = headers.get("api-key").and_then(|v| v.to_str().ok()).unwrap_or_default();
    if let Ok(mut seen) = seen.lock() {
        seen.push(key.to_owned());
    }
    "hello"
}

async fn token() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "access_token": "abc", "expires_in": 3600 }))
}

async fn serve(router: Router) -> anyhow::Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(format!("http://{addr}"))
}

async fn servers() -> anyhow::Result<(String, String, SeenKeys)> {
    let seen: SeenKeys = Arc::new(Mutex::new(Vec::new()));
    let upstream =
        serve(Router::new().route("/v1/foo", get(upstream_foo)).with_state(Arc::clone(&seen)))
            .await?;
    let auth = serve(Router::new().route("/oauth/token", post(token))).await?;
    Ok((upstream, format!("{auth}/oauth/token"), seen))
}

#[tokio::test]
async fn proxies_with_refreshed_credential() -> anyhow::Result<()> {
    let (upstream, endpoint, seen) = servers().await?;
    let gate = GateBuilder::new(&upstream, &endpoint).spawn()?;
    gate.wait_for_credential("valid", TIMEOUT).await?;

    let resp = reqwest::get(format!("{}/v1/foo", gate.base_url())).await?;
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert_eq!(resp.text().await?, "hello");

    let seen = seen.lock().map(|s| s.clone()).unwrap_or_default();
    assert_eq!(seen, vec!["abc".to_owned()]);
    Ok(())
}

#[tokio::test]
async fn basic_form_strategy_round_trip() -> anyhow::Result<()> {
    let (upstream, endpoint, seen) = servers().await?;
    let gate = GateBuilder::new(&upstream, &endpoint).strategy("basic-form").spawn()?;
    gate.wait_for_credential("valid", TIMEOUT).await?;

    let resp = reqwest::get(format!("{}/v1/foo", gate.base_url())).await?;
    assert_eq!(resp.text().await?, "hello");
    assert_eq!(seen.lock().map(|s| s.clone()).unwrap_or_default(), vec!["abc".to_owned()]);
    Ok(())
}

#[tokio::test]
async fn health_port_reports_running() -> anyhow::Result<()> {
    let (upstream, endpoint, _seen) = servers().await?;
    let gate = GateBuilder::new(&upstream, &endpoint).spawn()?;
    gate.wait_for_credential("valid", TIMEOUT).await?;

    let body: serde_json::Value =
        reqwest::get(format!("{}/api/v1/health", gate.health_url())).await?.json().await?;
    assert_eq!(body["status"], "running");
    assert_eq!(body["credential"]["consecutive_failures"], 0);
    Ok(())
}

#[tokio::test]
async fn missing_secret_exits_with_failure() -> anyhow::Result<()> {
    let mut gate = GateBuilder::new("http://127.0.0.1:1", "http://127.0.0.1:1/token")
        .without_upstream()
        .spawn()?;
    let status = gate.wait_exit(TIMEOUT).await?;
    assert_eq!(status.code(), Some(1));
    Ok(())
}

#[tokio::test]
async fn invalid_strategy_exits_with_usage_error() -> anyhow::Result<()> {
    let mut gate = GateBuilder::new("http://127.0.0.1:1", "http://127.0.0.1:1/token")
        .strategy("kerberos")
        .spawn()?;
    let status = gate.wait_exit(TIMEOUT).await?;
    assert_eq!(status.code(), Some(2));
    Ok(())
}

#[tokio::test]
async fn unknown_flag_exits_with_usage_error() -> anyhow::Result<()> {
    let mut gate = GateBuilder::new("http://127.0.0.1:1", "http://127.0.0.1:1/token")
        .arg("--no-such-flag")
        .spawn()?;
    let status = gate.wait_exit(TIMEOUT).await?;
    assert_eq!(status.code(), Some(2));
    Ok(())
}

#[tokio::test]
async fn unreachable_credential_endpoint_still_serves() -> anyhow::Result<()> {
    let (upstream, _endpoint, seen) = servers().await?;
    let dead = format!("http://127.0.0.1:{}/token", tokengate_specs::free_port()?);
    let gate = GateBuilder::new(&upstream, &dead).refresh_secs(1).spawn()?;

    let client = reqwest::Client::new();
    let url = format!("{}/v1/foo", gate.base_url());
    let deadline = tokio::time::Instant::now() + TIMEOUT;
    let resp = loop {
        anyhow::ensure!(tokio::time::Instant::now() < deadline, "proxy never came up");
        if let Ok(resp) = client.get(&url).send().await {
            break resp;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    };
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert_eq!(seen.lock().map(|s| s.clone()).unwrap_or_default(), vec![String::new()]);
    Ok(())
}

#[tokio::test]
async fn sigterm_shuts_down_cleanly() -> anyhow::Result<()> {
    let (upstream, endpoint, _seen) = servers().await?;
    let mut gate = GateBuilder::new(&upstream, &endpoint).spawn()?;
    gate.wait_for_credential("valid", TIMEOUT).await?;

    gate.terminate()?;
    let status = gate.wait_exit(TIMEOUT).await?;
    assert!(status.success(), "exit status {status}");
    Ok(())
}

#[test]
fn binary_path_points_at_workspace_target() {
    let path = tokengate_binary();
    assert!(path.ends_with("target/debug/tokengate"));
}
