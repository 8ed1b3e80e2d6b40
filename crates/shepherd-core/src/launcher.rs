//! Viewer process launching.
//!
//! A viewer is started and then watched for a short grace period. Viewers
//! that are serving block indefinitely, so the only thing that can happen
//! inside the window is an early exit, and an early exit always means the
//! launch failed. Even a clean exit with status 0 counts as a failure.
//!
//! The child is owned by a monitor task for its whole life. The monitor
//! drains stdout and stderr into one buffer, reports the first exit back
//! to the launching call, and later delivers kill requests and reaps the
//! exit status.

use crate::config::LaunchConfig;
use crate::tool::ToolCommand;
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Upper bound on waiting for the output pipes to close after an exit.
///
/// A grandchild that inherited the pipes can keep them open forever.
const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_millis(200);

/// Combined output of a launching viewer. `None` once nobody will read it;
/// the pipes are still drained so the viewer never blocks on a full pipe.
type OutputBuffer = Arc<Mutex<Option<Vec<u8>>>>;

fn stop_collecting(output: &OutputBuffer) {
    if let Ok(mut out) = output.lock() {
        *out = None;
    }
}

/// Result of launching a viewer.
#[derive(Debug)]
pub enum LaunchOutcome {
    /// The process survived the grace period and is assumed to be serving.
    Running(ViewerProcess),
    /// The process could not be spawned or exited early; carries the
    /// diagnostic text to show the operator.
    Failed(String),
}

/// Owning handle to a running viewer process.
///
/// There is exactly one handle per spawned viewer. Dropping it does not stop
/// the process; only [`kill`](Self::kill) or runtime shutdown does.
#[derive(Debug)]
pub struct ViewerProcess {
    pid: Option<u32>,
    program: String,
    kill_tx: Option<oneshot::Sender<()>>,
    exited: Arc<AtomicBool>,
}

impl ViewerProcess {
    /// OS process id, if the process had not already exited at spawn time.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Whether the monitor has reaped the process.
    pub fn has_exited(&self) -> bool {
        self.exited.load(Ordering::SeqCst)
    }

    /// Ask for the process to be killed and return immediately.
    ///
    /// Fire-and-forget: the process may still be alive when this returns.
    /// Killing an already-exited process, or killing twice, is a no-op.
    pub fn kill(&mut self) {
        match self.kill_tx.take() {
            Some(tx) => {
                if tx.send(()).is_err() {
                    debug!(
                        "{} (pid {:?}) already exited, nothing to kill",
                        self.program, self.pid
                    );
                }
            }
            None => debug!("Kill already requested for {} (pid {:?})", self.program, self.pid),
        }
    }
}

/// What the monitor saw when the process exited.
struct ExitReport {
    status: String,
    output: Vec<u8>,
}

impl ExitReport {
    fn diagnostic(self, program: &str) -> String {
        let output = String::from_utf8_lossy(&self.output).into_owned();
        if output.trim().is_empty() {
            format!("{} exited early: {}", program, self.status)
        } else {
            output
        }
    }
}

/// Starts viewer processes and applies the grace-period heuristic.
#[derive(Debug, Clone)]
pub struct Launcher {
    grace: Duration,
}

impl Default for Launcher {
    fn default() -> Self {
        Self::new(LaunchConfig::DEFAULT_LAUNCH_GRACE)
    }
}

impl Launcher {
    pub fn new(grace: Duration) -> Self {
        Self { grace }
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// Launch `command` followed by `args`.
    ///
    /// Blocks the caller for at most the grace period.
    pub async fn launch(&self, command: &ToolCommand, args: &[String]) -> LaunchOutcome {
        let program = command.display_name();

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        info!("Launching {} {:?}", program, args);

        let mut child = match cmd.spawn() {
            Ok(c) => c,
            Err(e) => {
                warn!("Failed to spawn {}: {}", program, e);
                return LaunchOutcome::Failed(format!(
                    "failed to spawn {}: {}",
                    command.program.display(),
                    e
                ));
            }
        };

        let pid = child.id();
        let output: OutputBuffer = Arc::new(Mutex::new(Some(Vec::new())));
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(tokio::spawn(drain_into(stdout, output.clone())));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(tokio::spawn(drain_into(stderr, output.clone())));
        }

        let (exit_tx, exit_rx) = oneshot::channel();
        let (kill_tx, kill_rx) = oneshot::channel();
        let exited = Arc::new(AtomicBool::new(false));

        tokio::spawn(monitor(
            child,
            readers,
            output.clone(),
            kill_rx,
            exit_tx,
            exited.clone(),
            program.clone(),
        ));

        match tokio::time::timeout(self.grace, exit_rx).await {
            Ok(Ok(report)) => {
                let diagnostic = report.diagnostic(&program);
                warn!("{} exited within {:?}: {}", program, self.grace, diagnostic.trim_end());
                LaunchOutcome::Failed(diagnostic)
            }
            Ok(Err(_)) => LaunchOutcome::Failed(format!("{} monitor stopped unexpectedly", program)),
            Err(_) => {
                stop_collecting(&output);
                info!("{} running with PID {:?}", program, pid);
                LaunchOutcome::Running(ViewerProcess {
                    pid,
                    program,
                    kill_tx: Some(kill_tx),
                    exited,
                })
            }
        }
    }
}

async fn drain_into<R: AsyncRead + Unpin>(mut reader: R, output: OutputBuffer) {
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if let Ok(mut guard) = output.lock() {
                    if let Some(out) = guard.as_mut() {
                        out.extend_from_slice(&buf[..n]);
                    }
                }
            }
        }
    }
}

async fn monitor(
    mut child: Child,
    readers: Vec<JoinHandle<()>>,
    output: OutputBuffer,
    mut kill_rx: oneshot::Receiver<()>,
    exit_tx: oneshot::Sender<ExitReport>,
    exited: Arc<AtomicBool>,
    program: String,
) {
    // A dropped kill sender disables the kill branch rather than killing.
    let (status, killed) = tokio::select! {
        status = child.wait() => (status, false),
        Ok(()) = &mut kill_rx => {
            if let Err(e) = child.start_kill() {
                debug!("Kill signal for {} not delivered: {}", program, e);
            }
            (child.wait().await, true)
        }
    };
    exited.store(true, Ordering::SeqCst);

    let status = describe_status(status);
    if killed {
        for reader in readers {
            reader.abort();
        }
        debug!("Reaped killed {}: {}", program, status);
        return;
    }

    let drain = join_readers(readers);
    if tokio::time::timeout(OUTPUT_DRAIN_TIMEOUT, drain).await.is_err() {
        debug!("Output pipes of {} still open after exit", program);
    }
    let output = output
        .lock()
        .ok()
        .and_then(|mut o| o.take())
        .unwrap_or_default();

    if exit_tx.send(ExitReport { status: status.clone(), output }).is_err() {
        // The launch already returned Running; this viewer stopped on its own.
        info!("{} exited: {}", program, status);
    }
}

async fn join_readers(readers: Vec<JoinHandle<()>>) {
    for reader in readers {
        let _ = reader.await;
    }
}

fn describe_status(status: std::io::Result<ExitStatus>) -> String {
    match status {
        Ok(s) => s.to_string(),
        Err(e) => format!("wait failed: {}", e),
    }
}
