//! Locate the pprof and trace binaries inside a Go installation.
//!
//! Go ships its tools under `$GOROOT/pkg/tool/<goos>_<goarch>/`. The
//! dashboard is useless without both, so a missing tool is a startup error.

use crate::config::ToolConfig;
use crate::error::{Result, ShepherdError};
use crate::tool::{ToolCommand, ToolPaths};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Go's name for the current operating system.
pub fn go_os() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

/// Go's name for the current architecture.
pub fn go_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        "powerpc64" => "ppc64",
        other => other,
    }
}

/// `<goroot>/pkg/tool/<goos>_<goarch>`, with Windows separators normalized.
pub fn tool_dir(goroot: &str) -> PathBuf {
    let root = goroot.replace('\\', "/");
    let root = root.trim_end_matches('/');
    PathBuf::from(format!(
        "{}/{}/{}_{}",
        root,
        ToolConfig::TOOL_SUBDIR,
        go_os(),
        go_arch()
    ))
}

/// Binaries found while scanning a tool directory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DiscoveredTools {
    pub pprof: Option<PathBuf>,
    pub trace: Option<PathBuf>,
}

impl DiscoveredTools {
    /// Both tools, or the name of the first missing one.
    pub fn into_paths(self) -> Result<ToolPaths> {
        let pprof = self
            .pprof
            .ok_or_else(|| ShepherdError::ToolNotFound(ToolConfig::PPROF_PREFIX.to_string()))?;
        let trace = self
            .trace
            .ok_or_else(|| ShepherdError::ToolNotFound(ToolConfig::TRACE_PREFIX.to_string()))?;
        Ok(ToolPaths::new(ToolCommand::new(pprof), ToolCommand::new(trace)))
    }
}

/// Walk `dir` for entries named `pprof*` and `trace*`.
///
/// Entries are visited in file-name order and the last match wins. A missing
/// or unreadable directory just finds nothing.
pub fn scan_tool_dir(dir: &Path) -> DiscoveredTools {
    let mut found = DiscoveredTools::default();

    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let name = entry.file_name().to_string_lossy();
        if name.starts_with(ToolConfig::PPROF_PREFIX) {
            debug!("Found pprof candidate {}", entry.path().display());
            found.pprof = Some(entry.path().to_path_buf());
        } else if name.starts_with(ToolConfig::TRACE_PREFIX) {
            debug!("Found trace candidate {}", entry.path().display());
            found.trace = Some(entry.path().to_path_buf());
        }
    }

    found
}

/// Resolve both tools, preferring explicit paths over a `GOROOT` scan.
pub fn resolve_tools(
    goroot: Option<&str>,
    pprof: Option<&Path>,
    trace: Option<&Path>,
) -> Result<ToolPaths> {
    let mut found = match goroot {
        Some(root) if pprof.is_none() || trace.is_none() => {
            let dir = tool_dir(root);
            info!("Searching for Go tools in {}", dir.display());
            scan_tool_dir(&dir)
        }
        _ => DiscoveredTools::default(),
    };

    if let Some(path) = pprof {
        found.pprof = Some(path.to_path_buf());
    }
    if let Some(path) = trace {
        found.trace = Some(path.to_path_buf());
    }

    for path in [&found.pprof, &found.trace].into_iter().flatten() {
        if !path.exists() {
            return Err(ShepherdError::io_with_path(
                std::io::Error::new(std::io::ErrorKind::NotFound, "tool binary does not exist"),
                path,
            ));
        }
    }

    found.into_paths()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fake_goroot() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let dir = tool_dir(temp_dir.path().to_str().unwrap());
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("pprof"), b"").unwrap();
        std::fs::write(dir.join("trace"), b"").unwrap();
        std::fs::write(dir.join("vet"), b"").unwrap();
        temp_dir
    }

    #[test]
    fn test_tool_dir_layout() {
        let dir = tool_dir("C:\\Go\\");
        let expected = format!("C:/Go/pkg/tool/{}_{}", go_os(), go_arch());
        assert_eq!(dir, PathBuf::from(expected));
    }

    #[test]
    fn test_scan_finds_both_tools() {
        let goroot = fake_goroot();
        let dir = tool_dir(goroot.path().to_str().unwrap());

        let found = scan_tool_dir(&dir);
        assert_eq!(found.pprof, Some(dir.join("pprof")));
        assert_eq!(found.trace, Some(dir.join("trace")));
    }

    #[test]
    fn test_scan_missing_dir_finds_nothing() {
        let found = scan_tool_dir(Path::new("/nonexistent/goroot/pkg/tool"));
        assert_eq!(found, DiscoveredTools::default());
    }

    #[test]
    fn test_missing_trace_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let dir = tool_dir(temp_dir.path().to_str().unwrap());
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("pprof.exe"), b"").unwrap();

        let err = resolve_tools(temp_dir.path().to_str(), None, None).unwrap_err();
        assert!(matches!(err, ShepherdError::ToolNotFound(ref name) if name == "trace"));
    }

    #[test]
    fn test_no_goroot_and_no_paths_is_fatal() {
        let err = resolve_tools(None, None, None).unwrap_err();
        assert!(matches!(err, ShepherdError::ToolNotFound(ref name) if name == "pprof"));
    }

    #[test]
    fn test_explicit_paths_override_scan() {
        let goroot = fake_goroot();
        let other = TempDir::new().unwrap();
        let custom_pprof = other.path().join("my-pprof");
        std::fs::write(&custom_pprof, b"").unwrap();

        let tools = resolve_tools(goroot.path().to_str(), Some(&custom_pprof), None).unwrap();
        assert_eq!(tools.pprof.program, custom_pprof);
        assert!(tools.trace.program.ends_with("trace"));
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let result = resolve_tools(
            None,
            Some(Path::new("/nonexistent/pprof")),
            Some(Path::new("/nonexistent/trace")),
        );
        assert!(matches!(result, Err(ShepherdError::Io { .. })));
    }
}
