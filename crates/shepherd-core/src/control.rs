//! The `/api` control operations.
//!
//! Requests arrive as query parameters and every response is one line of
//! plain text. The strings returned here are what the dashboard script
//! checks, so they are fixed:
//!
//! | op    | success          | failure                                            |
//! |-------|------------------|----------------------------------------------------|
//! | `add` | allocated port   | `invalid tool type`, `port resource exhausted`, or the viewer's output |
//! | `rmv` | `ok`             | `invalid port`                                     |
//! | other | -                | `op not support`                                   |

use crate::error::{Result, ShepherdError};
use crate::launcher::{LaunchOutcome, Launcher};
use crate::port::allocate_port;
use crate::registry::{ProcessRecord, ProcessRegistry};
use crate::tool::{sanitize_path, ToolKind, ToolPaths};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const OP_NOT_SUPPORTED: &str = "op not support";
pub const REMOVE_OK: &str = "ok";

/// Operations understood by the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Remove,
}

impl Op {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "add" => Some(Op::Add),
            "rmv" => Some(Op::Remove),
            _ => None,
        }
    }
}

/// Parse a removal port.
///
/// Only non-numeric text and zero are invalid. Any other integer is
/// accepted; values outside the `u16` range can never name a live viewer
/// and come back as `None`.
pub fn parse_port(raw: &str) -> Result<Option<u16>> {
    match raw.parse::<i64>() {
        Ok(0) | Err(_) => Err(ShepherdError::InvalidPort(raw.to_string())),
        Ok(port) => Ok(u16::try_from(port).ok()),
    }
}

/// Translates `/api` requests into registry operations.
pub struct ControlEndpoint {
    registry: Arc<ProcessRegistry>,
    tools: ToolPaths,
    launcher: Launcher,
}

impl ControlEndpoint {
    pub fn new(registry: Arc<ProcessRegistry>, tools: ToolPaths, launcher: Launcher) -> Self {
        Self {
            registry,
            tools,
            launcher,
        }
    }

    pub fn registry(&self) -> &Arc<ProcessRegistry> {
        &self.registry
    }

    /// Handle one request and produce its response line.
    pub async fn handle(&self, params: &HashMap<String, String>) -> String {
        let param = |key: &str| params.get(key).map(String::as_str).unwrap_or("");

        match Op::from_str(param("op")) {
            Some(Op::Add) => self
                .add(param("name"), param("tool"), param("path1"), param("path2"))
                .await
                .unwrap_or_else(|e| e.response_text()),
            Some(Op::Remove) => self
                .remove(param("port"))
                .map(|()| REMOVE_OK.to_string())
                .unwrap_or_else(|e| e.response_text()),
            None => OP_NOT_SUPPORTED.to_string(),
        }
    }

    /// Launch a viewer and register it. Returns the port as text.
    pub async fn add(&self, name: &str, tool: &str, path1: &str, path2: &str) -> Result<String> {
        let path1 = sanitize_path(path1);
        let path2 = sanitize_path(path2);

        let kind = ToolKind::parse(tool).inspect_err(|_| {
            warn!("Invalid tool type, got: {:?}", tool);
        })?;
        let port = allocate_port()?;

        let command = self.tools.command_for(kind);
        let args = kind.viewer_args(port, &path1, &path2);

        let process = match self.launcher.launch(command, &args).await {
            LaunchOutcome::Running(process) => process,
            LaunchOutcome::Failed(message) => {
                return Err(ShepherdError::LaunchFailed {
                    program: command.display_name(),
                    message,
                });
            }
        };

        self.registry
            .add_or_kill(ProcessRecord::new(name, path1, path2, port, process))?;
        info!("Opened {} viewer {:?} on port {}", kind, name, port);
        Ok(port.to_string())
    }

    /// Stop the viewer on `port`. Succeeds whether or not one was live.
    pub fn remove(&self, port: &str) -> Result<()> {
        let port = parse_port(port).inspect_err(|_| {
            warn!("Invalid port for removal: {:?}", port);
        })?;
        match port {
            Some(port) if self.registry.remove(port) => info!("Removed viewer on port {}", port),
            Some(_) => {}
            None => debug!("Removal port out of range, nothing to remove"),
        }
        Ok(())
    }
}
