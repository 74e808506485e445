// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test harness for end-to-end binary smoke tests.
//!
//! Spawns the real `tokengate` binary as a subprocess with a temporary
//! secrets directory and exercises it over HTTP.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

pub use tokengate::ensure_crypto;

/// Resolve the path to the compiled `tokengate` binary.
pub fn tokengate_binary() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    // tests/specs → tests → workspace root
    let workspace = manifest.parent().and_then(|p| p.parent()).unwrap_or(manifest);
    workspace.join("target").join("debug").join("tokengate")
}

/// Find a free TCP port by binding to :0 then releasing.
pub fn free_port() -> anyhow::Result<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

/// Write the four startup secrets into `dir`. `None` leaves a file out.
pub fn write_secrets(
    dir: &Path,
    upstream: Option<&str>,
    credential_endpoint: Option<&str>,
) -> anyhow::Result<()> {
    if let Some(url) = upstream {
        std::fs::write(dir.join("upstream-base-url"), format!("{url}\n"))?;
    }
    if let Some(url) = credential_endpoint {
        std::fs::write(dir.join("credential-endpoint"), format!("{url}\n"))?;
    }
    std::fs::write(dir.join("client-id"), "smoke-client\n")?;
    std::fs::write(dir.join("client-secret"), "smoke-secret\n")?;
    Ok(())
}

/// A running `tokengate` process that is killed on drop.
pub struct GateProcess {
    child: Child,
    port: u16,
    health_port: u16,
    _secrets_dir: tempfile::TempDir,
}

/// Builder for a [`GateProcess`].
pub struct GateBuilder {
    upstream: Option<String>,
    credential_endpoint: Option<String>,
    strategy: String,
    refresh_secs: u64,
    extra_args: Vec<String>,
}

impl GateBuilder {
    pub fn new(upstream: &str, credential_endpoint: &str) -> Self {
        Self {
            upstream: Some(upstream.to_owned()),
            credential_endpoint: Some(credential_endpoint.to_owned()),
            strategy: "json-bearer".to_owned(),
            refresh_secs: 60,
            extra_args: Vec::new(),
        }
    }

    /// Leave the upstream secret out of the secrets directory.
    pub fn without_upstream(mut self) -> Self {
        self.upstream = None;
        self
    }

    pub fn strategy(mut self, strategy: &str) -> Self {
        self.strategy = strategy.to_owned();
        self
    }

    pub fn refresh_secs(mut self, secs: u64) -> Self {
        self.refresh_secs = secs;
        self
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.extra_args.push(arg.to_owned());
        self
    }

    pub fn spawn(self) -> anyhow::Result<GateProcess> {
        ensure_crypto();
        let binary = tokengate_binary();
        anyhow::ensure!(binary.exists(), "tokengate binary not found at {}", binary.display());

        let secrets_dir = tempfile::tempdir()?;
        write_secrets(
            secrets_dir.path(),
            self.upstream.as_deref(),
            self.credential_endpoint.as_deref(),
        )?;

        let port = free_port()?;
        let health_port = free_port()?;

        let mut args: Vec<String> = vec![
            "--host".into(),
            "127.0.0.1".into(),
            "--port".into(),
            port.to_string(),
            "--health-port".into(),
            health_port.to_string(),
            "--secrets-dir".into(),
            secrets_dir.path().to_string_lossy().into_owned(),
            "--strategy".into(),
            self.strategy,
            "--refresh-secs".into(),
            self.refresh_secs.to_string(),
            "--log-format".into(),
            "text".into(),
            "--log-level".into(),
            "warn".into(),
        ];
        args.extend(self.extra_args);

        let child = Command::new(&binary)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        Ok(GateProcess { child, port, health_port, _secrets_dir: secrets_dir })
    }
}

impl GateProcess {
    /// Base URL of the proxy listener.
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Base URL of the health listener.
    pub fn health_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.health_port)
    }

    /// Poll the health port until the credential state matches `state`.
    pub async fn wait_for_credential(&self, state: &str, timeout: Duration) -> anyhow::Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        let client = reqwest::Client::new();
        let url = format!("{}/api/v1/health", self.health_url());
        loop {
            if tokio::time::Instant::now() > deadline {
                anyhow::bail!("tokengate credential never reached {state:?} within {timeout:?}");
            }
            if let Ok(resp) = client.get(&url).send().await {
                if let Ok(body) = resp.json::<serde_json::Value>().await {
                    if body["credential"]["state"] == state {
                        return Ok(());
                    }
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    /// Wait for the process to exit within `timeout`.
    pub async fn wait_exit(
        &mut self,
        timeout: Duration,
    ) -> anyhow::Result<std::process::ExitStatus> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if tokio::time::Instant::now() > deadline {
                anyhow::bail!("tokengate did not exit within {timeout:?}");
            }
            if let Some(status) = self.child.try_wait()? {
                return Ok(status);
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    /// Send SIGTERM to the process.
    pub fn terminate(&self) -> anyhow::Result<()> {
        let status = Command::new("kill").arg("-TERM").arg(self.child.id().to_string()).status()?;
        anyhow::ensure!(status.success(), "kill -TERM failed: {status}");
        Ok(())
    }
}

impl Drop for GateProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
