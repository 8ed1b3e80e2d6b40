//! Dashboard page rendering and bundled assets.

use shepherd_core::ProcessSnapshot;
use std::fmt::Write;

const INDEX_TEMPLATE: &str = include_str!("static/index.html");
const ROWS_PLACEHOLDER: &str = "{{rows}}";

/// A file served under `/static/`.
pub struct StaticAsset {
    pub content_type: &'static str,
    pub body: &'static str,
}

/// Look up a bundled asset by its path below `/static/`.
pub fn static_asset(path: &str) -> Option<StaticAsset> {
    let body = match path {
        "index.js" => include_str!("static/index.js"),
        "index.css" => include_str!("static/index.css"),
        _ => return None,
    };
    Some(StaticAsset {
        content_type: content_type_for(path),
        body,
    })
}

fn content_type_for(path: &str) -> &'static str {
    match path.rsplit('.').next() {
        Some("js") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("html") => "text/html; charset=utf-8",
        _ => "application/octet-stream",
    }
}

/// Minimal HTML escaping for text and attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the dashboard with one table row per live viewer, in order.
pub fn render_index(viewers: &[ProcessSnapshot]) -> String {
    let mut rows = String::new();
    for v in viewers {
        let paths = if v.path2.is_empty() {
            escape_html(&v.path1)
        } else {
            format!("{}<br>{}", escape_html(&v.path1), escape_html(&v.path2))
        };
        let _ = write!(
            rows,
            "<tr data-port=\"{port}\">\
             <td>{name}</td>\
             <td><a href=\"http://localhost:{port}\" target=\"_blank\">http://localhost:{port}</a></td>\
             <td>{paths}</td>\
             <td>{started}</td>\
             <td><button type=\"button\" class=\"del-btn\" data-port=\"{port}\">remove</button></td>\
             </tr>\n",
            port = v.port,
            name = escape_html(&v.name),
            paths = paths,
            started = v.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        );
    }
    INDEX_TEMPLATE.replace(ROWS_PLACEHOLDER, &rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(name: &str, port: u16, path1: &str, path2: &str) -> ProcessSnapshot {
        ProcessSnapshot {
            name: name.to_string(),
            port,
            path1: path1.to_string(),
            path2: path2.to_string(),
            pid: Some(42),
            started_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
        assert_eq!(escape_html("/tmp/cpu.out"), "/tmp/cpu.out");
    }

    #[test]
    fn test_render_keeps_order() {
        let page = render_index(&[
            snapshot("first", 8083, "/a", ""),
            snapshot("second", 8081, "/b", "/c"),
        ]);
        let first = page.find("first").unwrap();
        let second = page.find("second").unwrap();
        assert!(first < second);
        assert!(page.contains("/b<br>/c"));
        assert!(!page.contains(ROWS_PLACEHOLDER));
    }

    #[test]
    fn test_render_empty() {
        let page = render_index(&[]);
        assert!(page.contains("<table"));
        assert!(!page.contains("<tr data-port"));
    }

    #[test]
    fn test_static_lookup() {
        assert!(static_asset("index.js").is_some());
        assert_eq!(static_asset("index.css").unwrap().content_type, "text/css; charset=utf-8");
        assert!(static_asset("../Cargo.toml").is_none());
    }
}
