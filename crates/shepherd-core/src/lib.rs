//! Shepherd Core - supervision of local profile and trace viewer processes.
//!
//! Viewers (`pprof -http`, `trace -http`) are launched on demand, each on its
//! own OS-allocated port, and tracked in a [`ProcessRegistry`] until the
//! operator removes them. The HTTP surface lives in `shepherd-server`; this
//! crate has no web dependencies.
//!
//! # Example
//!
//! ```rust,no_run
//! use shepherd_core::{ControlEndpoint, Launcher, ProcessRegistry, ToolCommand, ToolPaths};
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! # async fn run() {
//! let tools = ToolPaths::new(
//!     ToolCommand::new("/usr/local/go/pkg/tool/linux_amd64/pprof"),
//!     ToolCommand::new("/usr/local/go/pkg/tool/linux_amd64/trace"),
//! );
//! let registry = Arc::new(ProcessRegistry::new());
//! let endpoint = ControlEndpoint::new(registry.clone(), tools, Launcher::default());
//!
//! let mut params = HashMap::new();
//! params.insert("op".to_string(), "add".to_string());
//! params.insert("tool".to_string(), "0".to_string());
//! params.insert("path1".to_string(), "/tmp/cpu.out".to_string());
//! let port = endpoint.handle(&params).await;
//! println!("viewer on {port}, {} live", registry.len());
//! # }
//! ```

pub mod config;
pub mod control;
pub mod discovery;
pub mod error;
pub mod launcher;
pub mod port;
pub mod registry;
pub mod tool;

pub use config::{LaunchConfig, ServerConfig};
pub use control::ControlEndpoint;
pub use error::{Result, ShepherdError};
pub use launcher::{LaunchOutcome, Launcher, ViewerProcess};
pub use port::allocate_port;
pub use registry::{ProcessRecord, ProcessRegistry, ProcessSnapshot};
pub use tool::{ToolCommand, ToolKind, ToolPaths};
