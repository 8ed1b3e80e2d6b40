//! Centralized configuration for Shepherd.
//!
//! Constants for the launch heuristic, the dashboard listener, and tool
//! discovery. Runtime overrides come from the server's command line.

use std::time::Duration;

/// Configuration for launching viewer processes.
pub struct LaunchConfig;

impl LaunchConfig {
    /// How long a freshly spawned viewer must survive to count as serving.
    ///
    /// Viewers bind their HTTP port and block; bad arguments or paths make
    /// them exit almost immediately. Any exit inside this window, clean or
    /// not, is a failed launch.
    pub const DEFAULT_LAUNCH_GRACE: Duration = Duration::from_secs(1);
}

/// Dashboard HTTP server configuration.
pub struct ServerConfig;

impl ServerConfig {
    pub const DEFAULT_HOST: &'static str = "127.0.0.1";
    pub const DEFAULT_PORT: u16 = 7777;
    /// Address every viewer is told to serve on.
    pub const VIEWER_BIND_HOST: &'static str = "127.0.0.1";
}

/// Tool discovery configuration.
pub struct ToolConfig;

impl ToolConfig {
    pub const PPROF_PREFIX: &'static str = "pprof";
    pub const TRACE_PREFIX: &'static str = "trace";
    /// Path of the tool directory below `GOROOT`.
    pub const TOOL_SUBDIR: &'static str = "pkg/tool";
}
