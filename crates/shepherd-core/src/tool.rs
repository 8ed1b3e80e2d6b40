//! Viewer tool selection and command line construction.

use crate::config::ServerConfig;
use crate::error::{Result, ShepherdError};
use std::fmt;
use std::path::{Path, PathBuf};

/// Which viewer a request wants, as sent in the `tool` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    /// `0`: pprof on one profile.
    Profile,
    /// `1`: the execution trace viewer.
    Trace,
    /// `2`: pprof comparing a profile against a base profile.
    ProfileDiff,
}

impl ToolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolKind::Profile => "0",
            ToolKind::Trace => "1",
            ToolKind::ProfileDiff => "2",
        }
    }

    /// Parse the selector text. Anything but `0`, `1` or `2` is rejected.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "0" => Ok(ToolKind::Profile),
            "1" => Ok(ToolKind::Trace),
            "2" => Ok(ToolKind::ProfileDiff),
            other => Err(ShepherdError::InvalidToolType(other.to_string())),
        }
    }

    /// Arguments for a viewer serving on `127.0.0.1:<port>`.
    pub fn viewer_args(&self, port: u16, path1: &str, path2: &str) -> Vec<String> {
        let http = format!("-http={}:{}", ServerConfig::VIEWER_BIND_HOST, port);
        match self {
            ToolKind::Profile | ToolKind::Trace => vec![http, path1.to_string()],
            ToolKind::ProfileDiff => vec![
                http,
                "-base".to_string(),
                path1.to_string(),
                path2.to_string(),
            ],
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ToolKind::Profile => "pprof",
            ToolKind::Trace => "trace",
            ToolKind::ProfileDiff => "pprof -base",
        };
        write!(f, "{}", name)
    }
}

/// A program plus the arguments that always precede the viewer arguments.
///
/// Usually just the tool binary, but `go tool pprof` style wrappers fit too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args: vec![],
        }
    }

    /// Add a leading argument.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Short name used in logs and diagnostics.
    pub fn display_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }
}

/// The two viewer binaries the dashboard drives.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub pprof: ToolCommand,
    pub trace: ToolCommand,
}

impl ToolPaths {
    pub fn new(pprof: ToolCommand, trace: ToolCommand) -> Self {
        Self { pprof, trace }
    }

    /// The command a tool kind runs on.
    pub fn command_for(&self, kind: ToolKind) -> &ToolCommand {
        match kind {
            ToolKind::Profile | ToolKind::ProfileDiff => &self.pprof,
            ToolKind::Trace => &self.trace,
        }
    }
}

/// Strip quote characters that would break the viewer command line.
///
/// Double quotes and backticks become spaces, then surrounding whitespace
/// is trimmed, so a path pasted as `"C:\prof.out"` comes out clean.
pub fn sanitize_path(path: &str) -> String {
    path.replace(['"', '`'], " ").trim().to_string()
}
