//! Integration tests for the shepherd-server binary.
//!
//! These start the real binary and exercise the `/api` text contract over
//! HTTP. `/bin/sh` stands in for both viewer tools: it rejects the `-http`
//! flag and exits at once, which is exactly a failed launch.

#![cfg(unix)]

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

fn binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_shepherd-server"))
}

struct ServerHandle {
    child: tokio::process::Child,
    port: u16,
}

impl ServerHandle {
    async fn stop(mut self) {
        let _ = self.child.kill().await;
        let _ = self.child.wait().await;
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _ = self.child.start_kill();
    }
}

/// Start the binary on an OS-assigned port and read the port it prints.
async fn start_server() -> Result<ServerHandle, String> {
    let mut child = tokio::process::Command::new(binary_path())
        .env_remove("GOROOT")
        .args(["--host", "127.0.0.1", "--port", "0"])
        .args(["--pprof", "/bin/sh", "--trace", "/bin/sh"])
        .args(["--launch-grace-ms", "500"])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| format!("failed to spawn server: {e}"))?;

    let stdout = child.stdout.take().ok_or("no stdout")?;
    let mut lines = BufReader::new(stdout).lines();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(15);
    while tokio::time::Instant::now() < deadline {
        match tokio::time::timeout(Duration::from_millis(250), lines.next_line()).await {
            Ok(Ok(Some(line))) => {
                if let Some(port) = line.strip_prefix("SHEPHERD_PORT=") {
                    let port = port.trim().parse().map_err(|e| format!("bad port line: {e}"))?;
                    return Ok(ServerHandle { child, port });
                }
            }
            Ok(Ok(None)) => return Err("server exited before printing its port".into()),
            Ok(Err(e)) => return Err(format!("failed reading stdout: {e}")),
            Err(_) => continue,
        }
    }
    Err("timed out waiting for SHEPHERD_PORT".into())
}

async fn api(port: u16, query: &str) -> String {
    reqwest::Client::new()
        .get(format!("http://127.0.0.1:{}/api?{}", port, query))
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .expect("request failed")
        .text()
        .await
        .expect("body")
}

#[tokio::test]
async fn test_api_contract_over_http() {
    let server = start_server().await.expect("server should start");
    let port = server.port;

    assert_eq!(api(port, "op=rmv&port=abc").await, "invalid port");
    assert_eq!(api(port, "op=rmv&port=0").await, "invalid port");
    assert_eq!(api(port, "op=rmv&port=8082").await, "ok");
    assert_eq!(api(port, "op=rmv&port=8082").await, "ok");
    assert_eq!(api(port, "op=add&name=A&tool=9&path1=/x").await, "invalid tool type");
    assert_eq!(api(port, "op=list").await, "op not support");

    // /bin/sh exits immediately on `-http=...`, so the launch fails with its output.
    let rsp = api(port, "op=add&name=A&tool=0&path1=/x").await;
    assert!(rsp.parse::<u16>().is_err(), "launch should fail, got {rsp:?}");
    assert!(!rsp.is_empty());

    let health: serde_json::Value = reqwest::get(format!("http://127.0.0.1:{}/health", port))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["viewers"], 0);

    let page = reqwest::get(format!("http://127.0.0.1:{}/", port))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("<table"));

    server.stop().await;
}

#[tokio::test]
async fn test_missing_tools_abort_startup() {
    let output = tokio::process::Command::new(binary_path())
        .env_remove("GOROOT")
        .args(["--port", "0", "--goroot", "/nonexistent/goroot"])
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .expect("binary should run");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Cannot find executable tool: pprof"), "{stderr}");
}
